//! Evolution strategy abstraction (§4.7, §9 redesign note): a template-template parameterized
//! search driver becomes a small trait — `layer_plan`/`select`/`on_generation_end` —
//! with [`AlpsStrategy`] (age-layered, canonical per DESIGN.md's Open Question resolution) and
//! [`StandardStrategy`] (single-layer, legacy-equivalent) as its two implementations. The
//! generic per-generation recombination/replacement logic (crossover, mutation, brood, cache-aware
//! evaluation, eviction) is identical across both and lives in `crate::engine`, since nothing in
//! §4.7's per-generation step differs between the two strategies except layer shape and
//! end-of-generation promotion.
use mep_core::random_provider;
use mep_error::MepResult;
use mep_ops::SymbolSet;

use crate::config::ResolvedConfig;
use crate::population::{Coord, Population};

/// Selects, shapes, and promotes layers for one evolution strategy.
pub trait EvolutionStrategy {
    fn name(&self) -> &'static str;

    /// Capacity and initial age-bound for each layer, built once at run start (§4.6/§4.7).
    fn layer_plan(&self, rc: &ResolvedConfig) -> Vec<(usize, u32)>;

    /// Tournament selection within `layer` (§4.7 step 1): sample `rc.tournament_size`
    /// coordinates via [`Population::pickup`] and return the two best-fitness coordinates as
    /// parents. `None` if the layer has fewer than two scored individuals to draw from.
    fn select(&self, population: &Population, layer: usize, rc: &ResolvedConfig) -> Option<(Coord, Coord)> {
        let layer_ref = population.layer(layer)?;
        if layer_ref.len() < 2 {
            return None;
        }
        let anchor_offset = random_provider::range(0..layer_ref.len());
        let anchor = Coord::new(layer, anchor_offset);

        let mut candidates = vec![anchor];
        for _ in 1..rc.tournament_size.max(2) {
            if let Some(c) = population.pickup(anchor, rc.mate_zone, rc.p_same_layer) {
                candidates.push(c);
            }
        }

        let mut scored: Vec<(Coord, f32)> = candidates
            .into_iter()
            .filter_map(|c| {
                let ind = population.get(c).ok()?;
                let fitness = ind.fitness.as_ref()?.as_f32();
                Some((c, fitness))
            })
            .collect();
        if scored.len() < 2 {
            return None;
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Some((scored[0].0, scored[1].0))
    }

    /// End-of-generation hook (§4.7 ALPS promotion / periodic reset; no-op for the standard
    /// strategy).
    fn on_generation_end(
        &mut self,
        population: &mut Population,
        sset: &SymbolSet,
        rc: &ResolvedConfig,
        generation: u64,
    ) -> MepResult<()>;
}

/// Age-Layered Population Structure (§4.7): `layers` strata with a linear aging scheme
/// (`M_k = (k+1) * age_gap`); individuals older than their layer's bound migrate up, and layer 0
/// is periodically reset with fresh random blood to fight premature convergence.
pub struct AlpsStrategy;

impl AlpsStrategy {
    pub fn new() -> Self {
        AlpsStrategy
    }
}

impl Default for AlpsStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl EvolutionStrategy for AlpsStrategy {
    fn name(&self) -> &'static str {
        "alps"
    }

    fn layer_plan(&self, rc: &ResolvedConfig) -> Vec<(usize, u32)> {
        (0..rc.layers)
            .map(|k| (rc.individuals_per_layer, (k as u32 + 1) * rc.age_gap))
            .collect()
    }

    fn on_generation_end(
        &mut self,
        population: &mut Population,
        sset: &SymbolSet,
        rc: &ResolvedConfig,
        generation: u64,
    ) -> MepResult<()> {
        // Migrate individuals older than their layer's bound up one layer. Walk from the
        // bottom so a promoted individual isn't immediately re-examined this same pass.
        for k in 0..population.layer_count().saturating_sub(1) {
            let max_age = population.layer(k).map(|l| l.max_age()).unwrap_or(u32::MAX);
            let mut promote = Vec::new();
            if let Some(layer) = population.layer(k) {
                for (offset, ind) in layer.individuals().iter().enumerate() {
                    if ind.age() > max_age {
                        promote.push(offset);
                    }
                }
            }
            // Remove in descending offset order so earlier indices stay valid.
            promote.sort_unstable_by(|a, b| b.cmp(a));
            for offset in promote {
                let removed = match population.layer_mut(k) {
                    Some(layer) if offset < layer.len() => remove_at(layer, offset),
                    _ => continue,
                };
                population.add_to_layer(k + 1, removed)?;
            }
        }

        // Every `age_gap` generations, layer 0 is refilled with fresh random individuals
        // (§4.7: "the primary mechanism against premature convergence").
        if rc.age_gap > 0 && generation % rc.age_gap as u64 == 0 {
            let category = output_category(population);
            if let Some(layer) = population.layer_mut(0) {
                let allowed = layer.allowed();
                tracing::info!(generation, allowed, "resetting layer 0");
                layer.init(sset, rc.code_length, rc.patch_length, category)?;
            }
        }

        // Ages advance last so a just-reset layer 0 starts this generation at age 1, matching
        // the promotion check (which compares the *pre-increment* age against each layer's
        // bound) to the end-of-generation age-increment step (§4.7 step 7).
        population.inc_age();
        Ok(())
    }
}

fn output_category(population: &Population) -> mep_ops::Category {
    population
        .layer(0)
        .and_then(|l| l.individuals().first())
        .map(|ind| ind.genome.category())
        .unwrap_or(mep_ops::Category(0))
}

fn remove_at(layer: &mut crate::population::Layer, offset: usize) -> crate::population::Individual {
    // `Layer` intentionally doesn't expose indexed removal publicly (callers should go through
    // `pop_random`/`push`); promotion is the one place that needs a specific offset, so we
    // rebuild the layer's contents minus that slot.
    let mut remaining: Vec<crate::population::Individual> = layer.individuals().to_vec();
    let removed = remaining.remove(offset);
    layer.clear();
    for ind in remaining {
        layer.push(ind);
    }
    removed
}

/// Standard (non-ALPS) single-layer strategy: no age bound, no promotion — the legacy driver's
/// behavior per §9's Open Question resolution (DESIGN.md).
pub struct StandardStrategy;

impl StandardStrategy {
    pub fn new() -> Self {
        StandardStrategy
    }
}

impl Default for StandardStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl EvolutionStrategy for StandardStrategy {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn layer_plan(&self, rc: &ResolvedConfig) -> Vec<(usize, u32)> {
        vec![(rc.individuals_per_layer * rc.layers.max(1), u32::MAX)]
    }

    fn on_generation_end(
        &mut self,
        population: &mut Population,
        _sset: &SymbolSet,
        _rc: &ResolvedConfig,
        _generation: u64,
    ) -> MepResult<()> {
        population.inc_age();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::tune::resolve;
    use mep_core::Fitness;
    use mep_ops::{Arity, Category, Primitive, Value};

    fn sample_sset() -> SymbolSet {
        let mut set = SymbolSet::new(1);
        set.insert_default(Primitive::Var {
            name: "X0",
            category: Category(0),
            index: 0,
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
        set
    }

    #[test]
    fn alps_layer_plan_ages_increase_linearly() {
        let mut config = Config::default();
        config.layers = Some(4);
        config.age_gap = 5;
        let rc = resolve(&config, 100, false);
        let plan = AlpsStrategy::new().layer_plan(&rc);
        assert_eq!(plan.len(), 4);
        for (k, (_, max_age)) in plan.iter().enumerate() {
            assert_eq!(*max_age, (k as u32 + 1) * 5);
        }
    }

    #[test]
    fn alps_promotion_after_age_gap_refills_layer_zero_at_age_one() {
        let set = sample_sset();
        let mut config = Config::default();
        config.layers = Some(2);
        config.age_gap = 5;
        config.individuals_per_layer = Some(6);
        let rc = resolve(&config, 100, false);

        let mut population = Population::new();
        let mut strategy = AlpsStrategy::new();
        for (allowed, max_age) in strategy.layer_plan(&rc) {
            population.add_layer(allowed, max_age);
        }
        population.layer_mut(0).unwrap().init(&set, rc.code_length, rc.patch_length, Category(0)).unwrap();

        for gen in 1..=5u64 {
            strategy
                .on_generation_end(&mut population, &set, &rc, gen)
                .unwrap();
        }

        for ind in population.layer(0).unwrap().individuals() {
            assert_eq!(ind.age(), 1);
        }
    }

    #[test]
    fn select_returns_two_best_scored_candidates() {
        let set = sample_sset();
        let mut population = Population::new();
        population.add_layer(5, 100);
        population
            .layer_mut(0)
            .unwrap()
            .init(&set, 8, 3, Category(0))
            .unwrap();
        for (i, ind) in population.layer_mut(0).unwrap().individuals().to_vec().into_iter().enumerate() {
            let mut ind = ind;
            ind.fitness = Some(Fitness::from(i as f32));
            *population.layer_mut(0).unwrap().get_mut(i).unwrap() = ind;
        }

        let config = Config::default();
        let rc = resolve(&config, 100, false);
        let strategy = AlpsStrategy::new();
        let parents = strategy.select(&population, 0, &rc);
        assert!(parents.is_some());
    }
}
