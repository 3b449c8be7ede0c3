//! Team aggregation for classification lambdas (§4.8 "Team aggregation"): a fixed-size group
//! of classifiers votes, combined under one of two policies. Voting combines classification
//! *decisions* rather than raw outputs, so each member's confidence still carries into the
//! aggregate instead of being discarded.
use std::collections::HashMap;

use mep_ops::{SymbolSet, Value};

use crate::binary::BinaryLambda;
use crate::dyn_slot::DynSlotLambda;
use crate::gaussian::GaussianLambda;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeamComposition {
    /// Most-predicted class wins; confidence is the winning class's vote share.
    MajorityVoting,
    /// The single most-confident member's prediction and confidence are returned outright.
    WinnerTakesAll,
}

/// Any per-member classifier a [`Team`] can aggregate over.
pub trait ClassLambda {
    fn tag(&self, sset: &SymbolSet, input: &[Value]) -> (usize, f64);
}

impl ClassLambda for DynSlotLambda {
    fn tag(&self, sset: &SymbolSet, input: &[Value]) -> (usize, f64) {
        DynSlotLambda::tag(self, sset, input)
    }
}

impl ClassLambda for GaussianLambda {
    fn tag(&self, sset: &SymbolSet, input: &[Value]) -> (usize, f64) {
        GaussianLambda::tag(self, sset, input)
    }
}

impl ClassLambda for BinaryLambda {
    fn tag(&self, sset: &SymbolSet, input: &[Value]) -> (usize, f64) {
        BinaryLambda::tag(self, sset, input)
    }
}

pub struct Team<L: ClassLambda> {
    members: Vec<L>,
    composition: TeamComposition,
}

impl<L: ClassLambda> Team<L> {
    pub fn new(members: Vec<L>, composition: TeamComposition) -> Self {
        Team { members, composition }
    }

    pub fn members(&self) -> &[L] {
        &self.members
    }

    pub fn tag(&self, sset: &SymbolSet, input: &[Value]) -> (usize, f64) {
        let votes: Vec<(usize, f64)> = self.members.iter().map(|m| m.tag(sset, input)).collect();
        aggregate(&votes, self.composition)
    }
}

/// The pure aggregation rule behind [`Team::tag`], exposed standalone so it can be exercised
/// directly against synthetic `(class, confidence)` votes (§8 scenario 5).
pub fn aggregate(votes: &[(usize, f64)], composition: TeamComposition) -> (usize, f64) {
    match composition {
        TeamComposition::WinnerTakesAll => *votes
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .expect("a team always has at least one member"),
        TeamComposition::MajorityVoting => {
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for &(class, _) in votes {
                *counts.entry(class).or_insert(0) += 1;
            }
            let (&winner, &winner_count) = counts
                .iter()
                .max_by_key(|(_, &count)| count)
                .expect("a team always has at least one member");
            (winner, winner_count as f64 / votes.len() as f64)
        }
    }
}
