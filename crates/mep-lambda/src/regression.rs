//! Regression lambda (§4.8): the interpreter's raw output *is* the meaningful answer for a
//! regression task, so this wrapper is a thin adapter over [`mep_genome::run`].
use mep_genome::{Genome, run};
use mep_ops::{SymbolSet, Value};

/// A single trained genome used as a numeric predictor.
#[derive(Clone)]
pub struct RegressionLambda {
    genome: Genome,
}

impl RegressionLambda {
    pub fn new(genome: Genome) -> Self {
        RegressionLambda { genome }
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn predict(&self, sset: &SymbolSet, input: &[Value]) -> Value {
        run(&self.genome, sset, input)
    }
}

/// A fixed-size team of regression lambdas (§4.8 Team aggregation, the regression case):
/// the prediction is the running mean over members whose output is not void.
pub struct RegressionTeam {
    members: Vec<RegressionLambda>,
}

impl RegressionTeam {
    pub fn new(members: Vec<RegressionLambda>) -> Self {
        RegressionTeam { members }
    }

    pub fn members(&self) -> &[RegressionLambda] {
        &self.members
    }

    pub fn predict(&self, sset: &SymbolSet, input: &[Value]) -> Value {
        let mut sum = 0.0;
        let mut count = 0u32;
        for member in &self.members {
            if let Some(v) = member.predict(sset, input).as_f64() {
                sum += v;
                count += 1;
            }
        }
        if count == 0 {
            Value::Void
        } else {
            Value::Double(sum / count as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mep_genome::Locus;
    use mep_ops::{Category, Primitive};

    fn identity_sset() -> SymbolSet {
        let mut set = SymbolSet::new(1);
        set.insert_default(Primitive::Var {
            name: "X0",
            category: Category(0),
            index: 0,
        })
        .unwrap();
        set
    }

    fn identity_genome(sset: &SymbolSet) -> Genome {
        use mep_genome::Gene;
        let x0 = sset.opcode_of("X0").unwrap();
        Genome::from_genes(vec![Gene::terminal(x0)], 1, 1, 1, Locus::new(0, Category(0)))
    }

    fn const_genome(sset: &SymbolSet, opcode_name: &str) -> Genome {
        use mep_genome::Gene;
        let op = sset.opcode_of(opcode_name).unwrap();
        Genome::from_genes(vec![Gene::terminal(op)], 1, 1, 1, Locus::new(0, Category(0)))
    }

    #[test]
    fn predict_matches_raw_interpreter_output() {
        let set = identity_sset();
        let lambda = RegressionLambda::new(identity_genome(&set));
        let out = lambda.predict(&set, &[Value::Double(3.5)]);
        assert_eq!(out, Value::Double(3.5));
    }

    #[test]
    fn team_predict_averages_nonvoid_members() {
        let mut set = SymbolSet::new(1);
        set.insert_default(Primitive::Const {
            name: "two",
            category: Category(0),
            value: Value::Double(2.0),
        })
        .unwrap();
        set.insert_default(Primitive::Const {
            name: "four",
            category: Category(0),
            value: Value::Double(4.0),
        })
        .unwrap();
        set.insert_default(Primitive::Const {
            name: "void",
            category: Category(0),
            value: Value::Void,
        })
        .unwrap();

        let team = RegressionTeam::new(vec![
            RegressionLambda::new(const_genome(&set, "two")),
            RegressionLambda::new(const_genome(&set, "four")),
            RegressionLambda::new(const_genome(&set, "void")),
        ]);

        let out = team.predict(&set, &[]);
        assert_eq!(out, Value::Double(3.0));
    }

    #[test]
    fn team_predict_is_void_when_every_member_is_void() {
        let mut set = SymbolSet::new(1);
        set.insert_default(Primitive::Const {
            name: "void",
            category: Category(0),
            value: Value::Void,
        })
        .unwrap();
        let team = RegressionTeam::new(vec![RegressionLambda::new(const_genome(&set, "void"))]);
        assert_eq!(team.predict(&set, &[]), Value::Void);
    }
}
