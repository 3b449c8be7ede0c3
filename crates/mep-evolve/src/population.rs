//! Layered population (§4.6): an ordered list of age-stratified layers, each holding a bounded
//! multiset of individuals. Layer 0 is the youngest stratum; higher layers hold progressively
//! older individuals per ALPS's age-bound scheme (§4.7).
use mep_core::{Fitness, random_provider};
use mep_error::{MepResult, mep_err};
use mep_genome::Genome;
use mep_ops::{Category, SymbolSet};

/// One evolvable program plus its last-computed fitness. `None` means "not yet evaluated this
/// generation" (e.g. a freshly inserted offspring before the evaluator has run).
#[derive(Clone)]
pub struct Individual {
    pub genome: Genome,
    pub fitness: Option<Fitness>,
}

impl Individual {
    pub fn new(genome: Genome) -> Self {
        Individual { genome, fitness: None }
    }

    pub fn age(&self) -> u32 {
        self.genome.age()
    }
}

/// `(layer, offset)` addressing into a [`Population`], per §4.6.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Coord {
    pub layer: usize,
    pub offset: usize,
}

impl Coord {
    pub fn new(layer: usize, offset: usize) -> Self {
        Coord { layer, offset }
    }
}

/// One age stratum: a capacity-bounded, unordered container of [`Individual`]s plus the
/// maximum age (in generations) an individual may reach before ALPS promotes it up a layer.
pub struct Layer {
    individuals: Vec<Individual>,
    allowed: usize,
    max_age: u32,
}

impl Layer {
    pub fn new(allowed: usize, max_age: u32) -> Self {
        Layer {
            individuals: Vec::with_capacity(allowed),
            allowed,
            max_age,
        }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn allowed(&self) -> usize {
        self.allowed
    }

    pub fn max_age(&self) -> u32 {
        self.max_age
    }

    pub fn set_max_age(&mut self, max_age: u32) {
        self.max_age = max_age;
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn get(&self, offset: usize) -> Option<&Individual> {
        self.individuals.get(offset)
    }

    pub fn get_mut(&mut self, offset: usize) -> Option<&mut Individual> {
        self.individuals.get_mut(offset)
    }

    /// Pushes `individual`, evicting the worst (lowest fitness, ties broken by greatest age) if
    /// the layer is at capacity (§4.6 eviction policy). Un-evaluated individuals (`fitness ==
    /// None`) are treated as maximally bad, so a freshly generated, not-yet-scored offspring is
    /// always the first eviction candidate.
    pub fn push(&mut self, individual: Individual) {
        self.individuals.push(individual);
        while self.individuals.len() > self.allowed.max(1) {
            self.evict_worst();
        }
    }

    fn evict_worst(&mut self) {
        let Some(worst) = self
            .individuals
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| worse_first(a, b))
            .map(|(i, _)| i)
        else {
            return;
        };
        self.individuals.remove(worst);
    }

    /// Removes and returns a uniformly random individual (§4.6 `pop_from_layer`).
    pub fn pop_random(&mut self) -> Option<Individual> {
        if self.individuals.is_empty() {
            return None;
        }
        let idx = random_provider::range(0..self.individuals.len());
        Some(self.individuals.remove(idx))
    }

    pub fn clear(&mut self) {
        self.individuals.clear();
    }

    /// Fills the layer with fresh random individuals up to `allowed` (§4.6 `init_layer`).
    pub fn init(
        &mut self,
        sset: &SymbolSet,
        code_length: usize,
        patch_length: usize,
        category: Category,
    ) -> MepResult<()> {
        self.individuals.clear();
        for _ in 0..self.allowed {
            let genome = Genome::random(sset, code_length, patch_length, category)?;
            self.individuals.push(Individual::new(genome));
        }
        Ok(())
    }
}

/// Worse-individual-first comparator: `None` fitness is worst-of-all, then lowest fitness
/// value, ties broken toward greater age (older individuals are evicted preferentially, since
/// §4.6 says eviction picks "worst fitness, ties broken by greatest age").
fn worse_first(a: &Individual, b: &Individual) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (&a.fitness, &b.fitness) {
        (None, None) => a.age().cmp(&b.age()),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(fa), Some(fb)) => fa
            .as_f32()
            .partial_cmp(&fb.as_f32())
            .unwrap_or(Ordering::Equal)
            .reverse()
            .then(a.age().cmp(&b.age())),
    }
}

/// The full layered population for one evolution run.
pub struct Population {
    layers: Vec<Layer>,
}

impl Population {
    pub fn new() -> Self {
        Population { layers: Vec::new() }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, k: usize) -> Option<&Layer> {
        self.layers.get(k)
    }

    pub fn layer_mut(&mut self, k: usize) -> Option<&mut Layer> {
        self.layers.get_mut(k)
    }

    /// Appends a new, empty top layer (§4.6 `add_layer`). The caller supplies the new layer's
    /// capacity and age bound (e.g. from the ALPS aging scheme).
    pub fn add_layer(&mut self, allowed: usize, max_age: u32) {
        self.layers.push(Layer::new(allowed, max_age));
    }

    pub fn add_to_layer(&mut self, k: usize, individual: Individual) -> MepResult<()> {
        self.layers
            .get_mut(k)
            .ok_or_else(|| mep_err!(InvalidParameter: "layer {k} does not exist"))?
            .push(individual);
        Ok(())
    }

    pub fn pop_from_layer(&mut self, k: usize) -> MepResult<Option<Individual>> {
        Ok(self
            .layers
            .get_mut(k)
            .ok_or_else(|| mep_err!(InvalidParameter: "layer {k} does not exist"))?
            .pop_random())
    }

    /// Every individual's genome age is incremented by one generation (§4.6 `inc_age`).
    pub fn inc_age(&mut self) {
        for layer in &mut self.layers {
            for individual in &mut layer.individuals {
                let age = individual.genome.age();
                individual.genome.set_age(age + 1);
            }
        }
    }

    pub fn get(&self, coord: Coord) -> MepResult<&Individual> {
        self.layers
            .get(coord.layer)
            .and_then(|l| l.get(coord.offset))
            .ok_or_else(|| mep_err!(InvalidParameter: "coordinate {:?} out of bounds", coord))
    }

    pub fn total_individuals(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Mate-zone sampling (§4.6 `pickup`): given an `anchor` coordinate, samples another
    /// coordinate to pair it with. With probability `p_same_layer` (always for layer 0) the
    /// sample stays within `anchor`'s layer; otherwise it comes from the previous layer. Within
    /// the chosen layer, the offset is drawn uniformly from a window of radius `mate_zone`
    /// around `anchor.offset` (panmictic — any offset in the layer — if `mate_zone` is `None`).
    pub fn pickup(&self, anchor: Coord, mate_zone: Option<usize>, p_same_layer: f32) -> Option<Coord> {
        let same_layer = anchor.layer == 0 || random_provider::bool(p_same_layer);
        let target_layer = if same_layer {
            anchor.layer
        } else {
            anchor.layer - 1
        };
        let layer = self.layers.get(target_layer)?;
        if layer.is_empty() {
            return None;
        }

        let offset = match mate_zone {
            Some(radius) if radius < layer.len() => {
                let low = anchor.offset.saturating_sub(radius);
                let high = (anchor.offset + radius + 1).min(layer.len());
                random_provider::range(low..high)
            }
            _ => random_provider::range(0..layer.len()),
        };
        Some(Coord::new(target_layer, offset))
    }
}

impl Default for Population {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mep_ops::{Arity, Primitive, Value};

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
    fn zero_layer_population_behaves_as_one_layer_after_add_layer() {
        let mut pop = Population::new();
        assert_eq!(pop.layer_count(), 0);
        pop.add_layer(4, 10);
        assert_eq!(pop.layer_count(), 1);

        let set = sample_sset();
        let genome = Genome::random(&set, 8, 3, Category(0)).unwrap();
        pop.add_to_layer(0, Individual::new(genome)).unwrap();
        assert_eq!(pop.layer(0).unwrap().len(), 1);
    }

    #[test]
    fn layer_overflow_evicts_worst_fitness_individual() {
        let set = sample_sset();
        let mut layer = Layer::new(2, 100);
        for value in [10.0, 1.0, 5.0] {
            let genome = Genome::random(&set, 6, 2, Category(0)).unwrap();
            let mut ind = Individual::new(genome);
            ind.fitness = Some(Fitness::from(value));
            layer.push(ind);
        }
        assert_eq!(layer.len(), 2);
        let worst_surviving = layer
            .individuals()
            .iter()
            .map(|i| i.fitness.as_ref().unwrap().as_f32())
            .fold(f32::INFINITY, f32::min);
        assert!(worst_surviving >= 5.0);
    }

    #[test]
    fn inc_age_advances_every_individual() {
        let set = sample_sset();
        let mut pop = Population::new();
        pop.add_layer(3, 10);
        pop.layer_mut(0)
            .unwrap()
            .init(&set, 6, 2, Category(0))
            .unwrap();
        pop.inc_age();
        for ind in pop.layer(0).unwrap().individuals() {
            assert_eq!(ind.age(), 1);
        }
    }

    #[test]
    fn pickup_from_layer_zero_always_same_layer() {
        let set = sample_sset();
        let mut pop = Population::new();
        pop.add_layer(5, 10);
        pop.layer_mut(0)
            .unwrap()
            .init(&set, 6, 2, Category(0))
            .unwrap();
        let anchor = Coord::new(0, 2);
        for _ in 0..20 {
            let picked = pop.pickup(anchor, None, 0.0).unwrap();
            assert_eq!(picked.layer, 0);
        }
    }
}
