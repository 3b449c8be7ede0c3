#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// A fixed-width fitness vector. Single-objective problems use a width-1 `Fitness`; the
/// same type serves multi-component fitness (e.g. error + program size) without a second
/// representation.
///
/// An "infinite penalty" fitness (all components `f32::NEG_INFINITY`, since every built-in
/// evaluator maximizes) represents a program that could not be evaluated (illegal values
/// propagated to the root, or a degenerate model).
#[derive(Clone, PartialEq, Default)]
#[repr(transparent)]
pub struct Fitness {
    pub values: Arc<[f32]>,
}

impl Fitness {
    pub fn from_vec(values: Vec<f32>) -> Self {
        for value in &values {
            if value.is_nan() {
                panic!("fitness value cannot be NaN");
            }
        }
        Fitness {
            values: Arc::from(values),
        }
    }

    /// The worst-possible-fitness sentinel used for programs that cannot be scored. Every
    /// built-in evaluator is maximize-oriented (higher is better), so the penalty has to be
    /// `-INFINITY`, not `+INFINITY` — a penalized individual must always lose a comparison.
    pub fn penalty(width: usize) -> Self {
        Fitness {
            values: Arc::from(vec![f32::NEG_INFINITY; width.max(1)]),
        }
    }

    pub fn is_penalty(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// The primary (first) fitness component, or `-INFINITY` for a width-0 `Fitness` — the same
    /// worst-possible convention [`Self::penalty`] uses, so an unscored individual never sorts
    /// as better than a scored one.
    pub fn as_f32(&self) -> f32 {
        self.values.first().copied().unwrap_or(f32::NEG_INFINITY)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(feature = "serde")]
impl Serialize for Fitness {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.values.as_ref().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Fitness {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values = Vec::<f32>::deserialize(deserializer)?;
        for value in &values {
            if value.is_nan() {
                return Err(serde::de::Error::custom("fitness value cannot be NaN"));
            }
        }
        Ok(Fitness {
            values: Arc::from(values),
        })
    }
}

impl AsRef<[f32]> for Fitness {
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.values.partial_cmp(&other.values)
    }
}

impl Debug for Fitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.values)
    }
}

impl Hash for Fitness {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let mut hash: usize = 0;
        for value in self.values.iter() {
            hash = hash.wrapping_add(value.to_bits() as usize);
        }
        hash.hash(state);
    }
}

impl From<f32> for Fitness {
    fn from(value: f32) -> Self {
        Fitness::from_vec(vec![value])
    }
}

impl From<Vec<f32>> for Fitness {
    fn from(value: Vec<f32>) -> Self {
        Fitness::from_vec(value)
    }
}

pub trait Scored {
    fn fitness(&self) -> Option<&Fitness>;
}

/// Dominance ordering for multi-component fitness: `a` dominates `b` if `a` is no worse than
/// `b` in every component and strictly better in at least one, under the given [`Optimize`]
/// per component.
pub fn dominates(a: &[f32], b: &[f32], directions: &[super::Optimize]) -> bool {
    let mut strictly_better = false;
    for ((av, bv), dir) in a.iter().zip(b.iter()).zip(directions.iter()) {
        if dir.is_better(bv, av) {
            return false;
        }
        if dir.is_better(av, bv) {
            strictly_better = true;
        }
    }
    strictly_better
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Optimize;

    #[test]
    fn penalty_is_worse_than_anything_finite() {
        let penalty = Fitness::penalty(1);
        let real = Fitness::from(-10000.0);
        assert!(penalty.is_penalty());
        assert!(real.as_f32() > penalty.as_f32(), "even a very bad real score must outrank the penalty");
    }

    #[test]
    #[cfg(feature = "serde")]
    fn fitness_can_serialize() {
        let fitness = Fitness::from(vec![1.0, -2.0, 3.0]);
        let serialized = serde_json::to_string(&fitness).expect("failed to serialize Fitness");
        let deserialized: Fitness =
            serde_json::from_str(&serialized).expect("failed to deserialize Fitness");
        assert_eq!(fitness, deserialized);
    }

    #[test]
    fn dominance_requires_no_worse_and_one_strictly_better() {
        let dirs = [Optimize::Minimize, Optimize::Minimize];
        assert!(dominates(&[1.0, 2.0], &[1.0, 3.0], &dirs));
        assert!(!dominates(&[1.0, 2.0], &[1.0, 2.0], &dirs));
        assert!(!dominates(&[1.0, 4.0], &[1.0, 3.0], &dirs));
    }
}
