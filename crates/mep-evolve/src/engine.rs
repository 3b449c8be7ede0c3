//! The generation driver (§4.7): wires a [`crate::strategy::EvolutionStrategy`] to a
//! [`Population`], running tournament selection, crossover/mutation, optional brood
//! recombination, cache-aware evaluation, and age-bound insertion once per layer per generation,
//! then checking the three termination conditions.
use mep_alters::{crossover, mutate};
use mep_core::{Fitness, random_provider};
use mep_error::MepResult;
use mep_eval::{Dataset, Evaluator, dss};
use mep_genome::{EvalCache, Genome, Signature};
use mep_ops::SymbolSet;
use rayon::prelude::*;

use crate::config::ResolvedConfig;
use crate::population::{Coord, Individual, Population};
use crate::strategy::EvolutionStrategy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    GenerationsReached,
    ThresholdMet,
    Stuck,
}

pub struct Summary {
    pub best: Individual,
    pub generations_run: u64,
    pub stopped: StopReason,
}

pub struct Engine<'a> {
    sset: &'a SymbolSet,
    dataset: &'a Dataset,
    evaluator: Evaluator,
    cache: EvalCache,
    rc: ResolvedConfig,
    population: Population,
    /// This generation's DSS sample (§4.9), refreshed once per generation in [`Self::run`].
    /// `None` when `rc.dss` is off, in which case evaluation always sees the full dataset.
    subset: Option<Vec<usize>>,
}

impl<'a> Engine<'a> {
    pub fn new(
        sset: &'a SymbolSet,
        dataset: &'a Dataset,
        evaluator: Evaluator,
        rc: ResolvedConfig,
        strategy: &dyn EvolutionStrategy,
        output_category: mep_ops::Category,
    ) -> MepResult<Self> {
        let mut population = Population::new();
        for (allowed, max_age) in strategy.layer_plan(&rc) {
            population.add_layer(allowed, max_age);
        }
        for k in 0..population.layer_count() {
            population
                .layer_mut(k)
                .unwrap()
                .init(sset, rc.code_length, rc.patch_length, output_category)?;
        }

        let mut cache = EvalCache::new(rc.cache_bits);
        let subset = if rc.dss { Some(dss::select_subset(dataset)) } else { None };
        Self::evaluate_population(&mut population, sset, dataset, &evaluator, &mut cache, subset.as_deref());

        Ok(Engine {
            sset,
            dataset,
            evaluator,
            cache,
            rc,
            population,
            subset,
        })
    }

    /// Scores every individual in every layer. The interpreter pass genuinely dominates a
    /// generation's cost and is embarrassingly parallel across individuals (the teacher's engine
    /// parallelizes this same per-generation scoring step with rayon), so the expensive half runs
    /// on `rayon`'s pool; only `cache`'s own reads/writes stay on this thread, since
    /// `EvalCache::insert` takes `&mut self`. `cache.peek` (shared, non-mutating) is used from
    /// the parallel closures to skip recomputation of an already-cached signature without
    /// disturbing the hit/miss counters that `get_or_insert_with` updates in the sequential pass
    /// below.
    fn evaluate_population(
        population: &mut Population,
        sset: &SymbolSet,
        dataset: &Dataset,
        evaluator: &Evaluator,
        cache: &mut EvalCache,
        subset: Option<&[usize]>,
    ) {
        for k in 0..population.layer_count() {
            let layer = population.layer_mut(k).unwrap();
            let prepared: Vec<(Genome, Signature)> = layer
                .individuals()
                .iter()
                .map(|ind| {
                    let genome = ind.genome.clone();
                    let signature = genome.signature(sset);
                    (genome, signature)
                })
                .collect();

            let cache_ref: &EvalCache = cache;
            let evaluated: Vec<(Genome, Signature, Fitness)> = prepared
                .into_par_iter()
                .map(|(genome, signature)| {
                    let fitness = match cache_ref.peek(signature) {
                        Some(fitness) => fitness.clone(),
                        None => match subset {
                            Some(indices) => evaluator.evaluate_subset(&genome, sset, dataset, indices),
                            None => evaluator.evaluate(&genome, sset, dataset),
                        },
                    };
                    (genome, signature, fitness)
                })
                .collect();

            let scored: Vec<Individual> = evaluated
                .into_iter()
                .map(|(genome, signature, fitness)| {
                    let fitness = cache.get_or_insert_with(signature, || fitness);
                    Individual {
                        genome,
                        fitness: Some(fitness),
                    }
                })
                .collect();

            layer.clear();
            for ind in scored {
                layer.push(ind);
            }
        }
    }

    /// Runs generations until one of §4.7's three termination conditions fires.
    pub fn run(&mut self, strategy: &mut dyn EvolutionStrategy) -> MepResult<Summary> {
        let mut best = self.current_best();
        let mut stuck_for: usize = 0;

        for generation in 1..=self.rc.generations as u64 {
            if self.rc.dss {
                self.subset = Some(dss::select_subset(self.dataset));
            }
            for layer in 0..self.population.layer_count() {
                self.step_layer(layer)?;
            }
            strategy.on_generation_end(&mut self.population, self.sset, &self.rc, generation)?;

            let gen_best = self.current_best();
            let improved = match (&gen_best, &best) {
                (Some(gb), Some(b)) => gb.fitness.as_ref().unwrap().as_f32() > b.fitness.as_ref().unwrap().as_f32(),
                (Some(_), None) => true,
                _ => false,
            };
            if improved {
                best = gen_best;
                stuck_for = 0;
            } else {
                stuck_for += 1;
            }

            if let Some(b) = &best {
                let accuracy = self.evaluator.accuracy(&b.genome, self.sset, self.dataset);
                let fitness = b.fitness.as_ref().unwrap().as_f32();
                if fitness >= self.rc.threshold_fitness && accuracy >= self.rc.threshold_accuracy {
                    return Ok(Summary {
                        best: b.clone(),
                        generations_run: generation,
                        stopped: StopReason::ThresholdMet,
                    });
                }
            }

            if stuck_for >= self.rc.max_stuck_time && self.fitness_variance() < 1e-6 {
                return Ok(Summary {
                    best: best.expect("a run with at least one generation always has a best"),
                    generations_run: generation,
                    stopped: StopReason::Stuck,
                });
            }
        }

        Ok(Summary {
            best: best.expect("a run with at least one generation always has a best"),
            generations_run: self.rc.generations as u64,
            stopped: StopReason::GenerationsReached,
        })
    }

    fn step_layer(&mut self, layer: usize) -> MepResult<()> {
        let Some((p1, p2)) = self.select_for(layer) else {
            return Ok(());
        };
        let parent1 = self.population.get(p1)?.clone();
        let parent2 = self.population.get(p2)?.clone();

        let mut offspring_genome = if random_provider::bool(self.rc.crossover_rate) {
            crossover(&parent1.genome, &parent2.genome, self.sset)?
        } else {
            better_of(&parent1, &parent2).genome.clone()
        };
        mutate(&mut offspring_genome, self.sset, self.rc.mutation_rate)?;

        if self.rc.brood_recombination > 1 {
            offspring_genome = self.best_of_brood(offspring_genome, parent1.genome.clone(), parent2.genome.clone())?;
        }

        let fitness = match &self.subset {
            Some(indices) => {
                self.evaluator
                    .evaluate_cached_subset(&offspring_genome, self.sset, self.dataset, indices, &mut self.cache)
            }
            None => self
                .evaluator
                .evaluate_cached(&offspring_genome, self.sset, self.dataset, &mut self.cache),
        };
        let offspring = Individual {
            genome: offspring_genome,
            fitness: Some(fitness),
        };

        let target = self.target_layer_for_age(offspring.age());
        self.population.add_to_layer(target, offspring)
    }

    fn best_of_brood(
        &mut self,
        first: mep_genome::Genome,
        p1: mep_genome::Genome,
        p2: mep_genome::Genome,
    ) -> MepResult<mep_genome::Genome> {
        let mut best = first;
        let mut best_score = self.evaluator.fast_evaluate(&best, self.sset, self.dataset).as_f32();
        for _ in 1..self.rc.brood_recombination {
            let mut candidate = crossover(&p1, &p2, self.sset)?;
            mutate(&mut candidate, self.sset, self.rc.mutation_rate)?;
            let score = self.evaluator.fast_evaluate(&candidate, self.sset, self.dataset).as_f32();
            if score > best_score {
                best = candidate;
                best_score = score;
            }
        }
        Ok(best)
    }

    fn select_for(&self, layer: usize) -> Option<(Coord, Coord)> {
        let layer_ref = self.population.layer(layer)?;
        if layer_ref.len() < 2 {
            return None;
        }
        let anchor_offset = random_provider::range(0..layer_ref.len());
        let anchor = Coord::new(layer, anchor_offset);

        let mut candidates = vec![anchor];
        for _ in 1..self.rc.tournament_size.max(2) {
            if let Some(c) = self.population.pickup(anchor, self.rc.mate_zone, self.rc.p_same_layer) {
                candidates.push(c);
            }
        }

        let mut scored: Vec<(Coord, f32)> = candidates
            .into_iter()
            .filter_map(|c| {
                let ind = self.population.get(c).ok()?;
                Some((c, ind.fitness.as_ref()?.as_f32()))
            })
            .collect();
        if scored.len() < 2 {
            return None;
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Some((scored[0].0, scored[1].0))
    }

    /// The layer whose age bound is the first (lowest-index) one `age` fits under, matching
    /// §4.7 step 6 ("insert offspring into the layer whose age bound matches the offspring's
    /// age"). Falls back to the oldest layer if `age` exceeds every bound.
    fn target_layer_for_age(&self, age: u32) -> usize {
        for k in 0..self.population.layer_count() {
            if age <= self.population.layer(k).unwrap().max_age() {
                return k;
            }
        }
        self.population.layer_count().saturating_sub(1)
    }

    fn current_best(&self) -> Option<Individual> {
        self.population
            .layers()
            .iter()
            .flat_map(|l| l.individuals().iter())
            .filter(|ind| ind.fitness.is_some())
            .max_by(|a, b| {
                a.fitness
                    .as_ref()
                    .unwrap()
                    .as_f32()
                    .partial_cmp(&b.fitness.as_ref().unwrap().as_f32())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .cloned()
    }

    fn fitness_variance(&self) -> f32 {
        let values: Vec<f32> = self
            .population
            .layers()
            .iter()
            .flat_map(|l| l.individuals().iter())
            .filter_map(|ind| ind.fitness.as_ref().map(Fitness::as_f32))
            .filter(|v| v.is_finite())
            .collect();
        if values.len() < 2 {
            return 0.0;
        }
        let mean = values.iter().sum::<f32>() / values.len() as f32;
        values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32
    }
}

fn better_of(a: &Individual, b: &Individual) -> Individual {
    let a_fit = a.fitness.as_ref().map(Fitness::as_f32).unwrap_or(f32::NEG_INFINITY);
    let b_fit = b.fitness.as_ref().map(Fitness::as_f32).unwrap_or(f32::NEG_INFINITY);
    if a_fit >= b_fit { a.clone() } else { b.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::strategy::{AlpsStrategy, StandardStrategy};
    use crate::tune::resolve;
    use mep_eval::{Example, EvaluatorKind};
    use mep_ops::{Arity, Category, Primitive, Value};

    fn arithmetic_sset() -> SymbolSet {
        let mut set = SymbolSet::new(1);
        set.insert_default(Primitive::Var {
            name: "X0",
            category: Category(0),
            index: 0,
        })
        .unwrap();
        set.insert_default(Primitive::Ephemeral {
            name: "erc",
            category: Category(0),
            sample: || mep_core::random_provider::range(-5.0..5.0),
        })
        .unwrap();
        set.insert_default(Primitive::Fn {
            name: "add",
            category: Category(0),
            arity: Arity::Exact(2),
            arg_categories: vec![Category(0), Category(0)],
            func: |p| {
                let a = p.arg(0).as_f64().unwrap_or(0.0);
                let b = p.arg(1).as_f64().unwrap_or(0.0);
                Value::Double(a + b)
            },
        })
        .unwrap();
        set.insert_default(Primitive::Fn {
            name: "mul",
            category: Category(0),
            arity: Arity::Exact(2),
            arg_categories: vec![Category(0), Category(0)],
            func: |p| {
                let a = p.arg(0).as_f64().unwrap_or(0.0);
                let b = p.arg(1).as_f64().unwrap_or(0.0);
                Value::Double(a * b)
            },
        })
        .unwrap();
        set
    }

    fn quadratic_dataset() -> Dataset {
        let examples = (-10..=10)
            .map(|i| {
                let x = i as f64 * 0.5;
                Example::new(vec![Value::Double(x)], Value::Double(x * x + x))
            })
            .collect();
        Dataset::regression(examples)
    }

    #[test]
    fn engine_runs_to_generation_bound_without_error() {
        let set = arithmetic_sset();
        let dataset = quadratic_dataset();
        let mut config = Config::default();
        config.generations = 5;
        config.layers = Some(2);
        config.individuals_per_layer = Some(8);
        config.code_length = Some(16);
        let rc = resolve(&config, dataset.len(), false);

        let strategy = AlpsStrategy::new();
        let mut engine = Engine::new(
            &set,
            &dataset,
            Evaluator::new(EvaluatorKind::MeanAbsoluteError),
            rc,
            &strategy,
            Category(0),
        )
        .unwrap();

        let mut strategy = AlpsStrategy::new();
        let summary = engine.run(&mut strategy).unwrap();
        assert!(summary.generations_run <= 5);
        assert!(summary.best.fitness.is_some());
    }

    #[test]
    fn standard_strategy_single_layer_runs() {
        let set = arithmetic_sset();
        let dataset = quadratic_dataset();
        let mut config = Config::default();
        config.generations = 3;
        config.layers = Some(1);
        config.individuals_per_layer = Some(10);
        config.code_length = Some(16);
        let rc = resolve(&config, dataset.len(), false);

        let strategy = StandardStrategy::new();
        let mut engine = Engine::new(
            &set,
            &dataset,
            Evaluator::new(EvaluatorKind::MeanSquaredError),
            rc,
            &strategy,
            Category(0),
        )
        .unwrap();
        let mut strategy = StandardStrategy::new();
        let summary = engine.run(&mut strategy).unwrap();
        assert_eq!(engine_layer_count(&engine), 1);
        assert!(summary.best.fitness.is_some());
    }

    fn engine_layer_count(engine: &Engine) -> usize {
        engine.population.layer_count()
    }

    #[test]
    fn engine_with_dss_forced_on_runs_and_shrinks_subset() {
        let set = arithmetic_sset();
        let dataset = quadratic_dataset();
        let mut config = Config::default();
        config.generations = 4;
        config.layers = Some(1);
        config.individuals_per_layer = Some(8);
        config.code_length = Some(16);
        config.dss = Some(true);
        let rc = resolve(&config, dataset.len(), false);

        let strategy = StandardStrategy::new();
        let mut engine = Engine::new(
            &set,
            &dataset,
            Evaluator::new(EvaluatorKind::MeanAbsoluteError),
            rc,
            &strategy,
            Category(0),
        )
        .unwrap();
        assert!(engine.subset.as_ref().is_some_and(|s| !s.is_empty() && s.len() <= dataset.len()));

        let mut strategy = StandardStrategy::new();
        let summary = engine.run(&mut strategy).unwrap();
        assert!(summary.best.fitness.is_some());
        assert!(engine.subset.as_ref().is_some_and(|s| !s.is_empty()));
    }
}
