/// Per-component optimization direction for a [`crate::Fitness`] vector. `Single` covers the
/// scalar-fitness case used by every built-in evaluator (§4.4); `Multi` supports lexicographic
/// ordering across components when an evaluator reports more than one (e.g. error, then size).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Objective {
    Single(Optimize),
    Multi(Vec<Optimize>),
}

impl Objective {
    pub fn cmp(&self, a: &[f32], b: &[f32]) -> std::cmp::Ordering {
        match self {
            Objective::Single(opt) => {
                if opt.is_better(&a[0], &b[0]) {
                    std::cmp::Ordering::Less
                } else if opt.is_better(&b[0], &a[0]) {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            }
            Objective::Multi(opts) => {
                for ((av, bv), opt) in a.iter().zip(b.iter()).zip(opts) {
                    if opt.is_better(av, bv) {
                        return std::cmp::Ordering::Less;
                    } else if opt.is_better(bv, av) {
                        return std::cmp::Ordering::Greater;
                    }
                }
                std::cmp::Ordering::Equal
            }
        }
    }

    pub fn is_better(&self, a: &[f32], b: &[f32]) -> bool {
        self.cmp(a, b) == std::cmp::Ordering::Less
    }

    pub fn directions(&self) -> &[Optimize] {
        match self {
            Objective::Single(opt) => std::slice::from_ref(opt),
            Objective::Multi(opts) => opts.as_slice(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Optimize {
    Minimize,
    Maximize,
}

impl Optimize {
    pub fn is_better<T: PartialOrd>(&self, a: &T, b: &T) -> bool {
        match self {
            Optimize::Minimize => a < b,
            Optimize::Maximize => a > b,
        }
    }

    pub fn sort_key(&self, value: f32) -> f32 {
        match self {
            Optimize::Minimize => value,
            Optimize::Maximize => -value,
        }
    }
}
