//! Bounded, direct-mapped evaluation cache (§4.3): maps a genome's [`Signature`] to its
//! previously computed [`Fitness`], guaranteeing at most one evaluation per distinct active
//! program. Collisions on the low-order bits of a signature replace the older entry outright —
//! no chaining, no tombstones (§9 Open Questions: out of scope by design).
use mep_core::Fitness;

use crate::fingerprint::Signature;

struct Slot {
    signature: Signature,
    fitness: Fitness,
}

/// A `2^k`-slot direct-mapped cache keyed by the low `k` bits of a [`Signature`].
pub struct EvalCache {
    slots: Vec<Option<Slot>>,
    mask: u64,
    occupied: usize,
    hits: u64,
    misses: u64,
}

impl EvalCache {
    pub fn new(k: u32) -> Self {
        let capacity = 1usize << k;
        EvalCache {
            slots: (0..capacity).map(|_| None).collect(),
            mask: (capacity as u64) - 1,
            occupied: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    fn slot_index(&self, signature: Signature) -> usize {
        (signature.0 & self.mask) as usize
    }

    /// Looks up `signature`, returning its previously stored fitness if this exact signature
    /// currently occupies its slot (a collision with a *different* signature reads as absent).
    pub fn get(&mut self, signature: Signature) -> Option<Fitness> {
        let idx = self.slot_index(signature);
        let hit = match &self.slots[idx] {
            Some(slot) if slot.signature == signature => Some(slot.fitness.clone()),
            _ => None,
        };
        if hit.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        hit
    }

    /// Looks up `signature` without affecting hit/miss counters — used by tests and metrics
    /// code that wants to inspect cache contents without skewing `hit_rate`.
    pub fn peek(&self, signature: Signature) -> Option<&Fitness> {
        let idx = self.slot_index(signature);
        match &self.slots[idx] {
            Some(slot) if slot.signature == signature => Some(&slot.fitness),
            _ => None,
        }
    }

    /// Stores `fitness` for `signature`, evicting whatever signature (if any) previously
    /// occupied the slot.
    pub fn insert(&mut self, signature: Signature, fitness: Fitness) {
        let idx = self.slot_index(signature);
        if self.slots[idx].is_none() {
            self.occupied += 1;
        }
        self.slots[idx] = Some(Slot { signature, fitness });
    }

    /// The at-most-one-evaluation contract from §4.3: returns the cached fitness if present,
    /// otherwise computes it with `compute`, caches it, and returns it.
    pub fn get_or_insert_with(
        &mut self,
        signature: Signature,
        compute: impl FnOnce() -> Fitness,
    ) -> Fitness {
        if let Some(fitness) = self.get(signature) {
            return fitness;
        }
        let fitness = compute();
        self.insert(signature, fitness.clone());
        fitness
    }

    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(a: u64, b: u64) -> Signature {
        Signature(a, b)
    }

    #[test]
    fn occupied_never_exceeds_capacity() {
        let mut cache = EvalCache::new(2); // 4 slots
        for i in 0..100u64 {
            cache.insert(sig(i, 0), Fitness::from(i as f32));
        }
        assert!(cache.occupied() <= cache.capacity());
    }

    #[test]
    fn collision_evicts_old_key() {
        let mut cache = EvalCache::new(1); // 2 slots, mask = 1
        let a = sig(0, 0); // slot 0
        let b = sig(2, 0); // also slot 0 (2 & 1 == 0)
        cache.insert(a, Fitness::from(1.0));
        assert_eq!(cache.get(a), Some(Fitness::from(1.0)));

        cache.insert(b, Fitness::from(2.0));
        assert_eq!(cache.get(a), None, "evicted key must read back as absent");
        assert_eq!(cache.get(b), Some(Fitness::from(2.0)));
    }

    #[test]
    fn get_or_insert_with_computes_at_most_once() {
        let mut cache = EvalCache::new(4);
        let mut calls = 0;
        let s = sig(42, 7);

        let f1 = cache.get_or_insert_with(s, || {
            calls += 1;
            Fitness::from(3.0)
        });
        let f2 = cache.get_or_insert_with(s, || {
            calls += 1;
            Fitness::from(99.0)
        });

        assert_eq!(calls, 1);
        assert_eq!(f1, f2);
    }
}
