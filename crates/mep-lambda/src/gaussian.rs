//! Gaussian Distribution Classification (§4.8 "Gaussian classifier"): each class's program
//! output is modelled as a 1-D Gaussian (mean/variance over the training examples of that
//! class); a new example is tagged with the class whose Gaussian assigns it the highest
//! density.
use mep_error::{MepResult, mep_err};
use mep_eval::Dataset;
use mep_genome::{Genome, run};
use mep_ops::{SymbolSet, Value};

/// Program outputs are clamped to this range before being folded into a class's mean/variance
/// or compared against one (§4.8 "program outputs are clamped to +/-10^7").
const CUT: f64 = 1.0e7;

pub struct GaussianLambda {
    genome: Genome,
    means: Vec<f64>,
    variances: Vec<f64>,
}

impl GaussianLambda {
    pub fn fit(genome: Genome, sset: &SymbolSet, dataset: &Dataset) -> MepResult<Self> {
        let classes = dataset
            .class_count()
            .ok_or_else(|| mep_err!(InvalidConfig: "gaussian lambda requires a classification dataset"))?;
        if classes < 2 {
            return Err(mep_err!(InvalidConfig: "gaussian lambda requires at least 2 classes, got {classes}"));
        }

        let mut sum = vec![0.0f64; classes];
        let mut sum_sq = vec![0.0f64; classes];
        let mut count = vec![0u32; classes];

        for example in dataset.examples() {
            let output = run(&genome, sset, &example.input);
            let value = output.as_f64().unwrap_or(0.0).clamp(-CUT, CUT);
            let class = example.class();
            sum[class] += value;
            sum_sq[class] += value * value;
            count[class] += 1;
        }

        let mut means = vec![0.0f64; classes];
        let mut variances = vec![0.0f64; classes];
        for class in 0..classes {
            if count[class] > 0 {
                let n = count[class] as f64;
                means[class] = sum[class] / n;
                variances[class] = (sum_sq[class] / n - means[class] * means[class]).max(0.0);
            }
        }

        Ok(GaussianLambda {
            genome,
            means,
            variances,
        })
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// `argmax_c p_c` with confidence `p_c / sum p` (§4.8), where
    /// `p_c = exp(-(x-mean_c)^2 / variance_c)`, with the degenerate-variance guard: a
    /// zero-variance class assigns probability 1 only to an exact mean match, 0 otherwise.
    pub fn tag(&self, sset: &SymbolSet, input: &[Value]) -> (usize, f64) {
        let output = run(&self.genome, sset, input);
        let x = output.as_f64().unwrap_or(0.0).clamp(-CUT, CUT);

        let mut probs = Vec::with_capacity(self.means.len());
        for class in 0..self.means.len() {
            let distance = (x - self.means[class]).abs();
            let variance = self.variances[class];
            let p = if variance == 0.0 {
                if distance == 0.0 { 1.0 } else { 0.0 }
            } else {
                (-(distance * distance) / variance).exp()
            };
            probs.push(p);
        }

        let sum: f64 = probs.iter().sum();
        let (best, &best_p) = probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .expect("at least 2 classes, validated at fit time");
        let confidence = if sum > 0.0 { best_p / sum } else { 0.0 };
        (best, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mep_eval::Example;
    use mep_genome::{Gene, Locus};
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
        let x0 = sset.opcode_of("X0").unwrap();
        Genome::from_genes(vec![Gene::terminal(x0)], 1, 1, 1, Locus::new(0, Category(0)))
    }

    #[test]
    fn fit_rejects_fewer_than_two_classes() {
        let set = identity_sset();
        let examples = vec![Example::new(vec![Value::Double(1.0)], Value::Int(0))];
        let dataset = Dataset::classification(examples, 1);
        assert!(GaussianLambda::fit(identity_genome(&set), &set, &dataset).is_err());
    }

    #[test]
    fn well_separated_clusters_tag_correctly_with_high_confidence() {
        let set = identity_sset();
        let examples = vec![
            Example::new(vec![Value::Double(-10.0)], Value::Int(0)),
            Example::new(vec![Value::Double(-9.0)], Value::Int(0)),
            Example::new(vec![Value::Double(-11.0)], Value::Int(0)),
            Example::new(vec![Value::Double(10.0)], Value::Int(1)),
            Example::new(vec![Value::Double(9.0)], Value::Int(1)),
            Example::new(vec![Value::Double(11.0)], Value::Int(1)),
        ];
        let dataset = Dataset::classification(examples, 2);
        let lambda = GaussianLambda::fit(identity_genome(&set), &set, &dataset).unwrap();

        let (class, confidence) = lambda.tag(&set, &[Value::Double(10.5)]);
        assert_eq!(class, 1);
        assert!(confidence > 0.9);
    }

    #[test]
    fn degenerate_zero_variance_class_matches_only_exact_mean() {
        let set = identity_sset();
        let examples = vec![
            Example::new(vec![Value::Double(5.0)], Value::Int(0)),
            Example::new(vec![Value::Double(5.0)], Value::Int(0)),
            Example::new(vec![Value::Double(1.0)], Value::Int(1)),
            Example::new(vec![Value::Double(9.0)], Value::Int(1)),
        ];
        let dataset = Dataset::classification(examples, 2);
        let lambda = GaussianLambda::fit(identity_genome(&set), &set, &dataset).unwrap();

        let (class, confidence) = lambda.tag(&set, &[Value::Double(5.0)]);
        assert_eq!(class, 0);
        assert!(confidence > 0.0);
    }
}
