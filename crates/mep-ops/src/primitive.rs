use crate::Value;
use std::fmt;
use std::fmt::Debug;

/// A category tags the output (and, for functions, each argument) of a primitive. The
/// interpreter and genome builder only ever connect slots whose categories match — this is
/// the strongly-typed-GP enforcement required of this representation (§3).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Category(pub u16);

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cat{}", self.0)
    }
}

/// How many inputs a primitive consumes. A terminal always has `Zero`; a function has
/// `Exact(n)`. There is no variable-arity variant — strongly-typed MEP primitives always have
/// a fixed signature.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Arity {
    #[default]
    Zero,
    Exact(usize),
}

impl Arity {
    pub fn as_usize(&self) -> usize {
        match self {
            Arity::Zero => 0,
            Arity::Exact(n) => *n,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Arity::Zero)
    }
}

impl From<usize> for Arity {
    fn from(value: usize) -> Self {
        match value {
            0 => Arity::Zero,
            n => Arity::Exact(n),
        }
    }
}

/// Opcode assigned by the `SymbolSet` at insertion time: a dense integer identity distinct
/// from the primitive's position in any one category view.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Opcode(pub u32);

/// Evaluation context handed to a function primitive: fetches (and, per the lazy-evaluation
/// design note, only computes on demand) the value of the `index`-th argument.
pub trait Params {
    fn arg(&self, index: usize) -> Value;
}

impl Params for [Value] {
    fn arg(&self, index: usize) -> Value {
        self[index].clone()
    }
}

/// A primitive operation: either a function (arity > 0) or a terminal (arity == 0). Modeled
/// as a tagged enum — one type, several shapes — rather than a trait-object hierarchy, so
/// primitive tables stay `Copy`/`Clone`-cheap and comparable by name.
#[derive(Clone)]
pub enum Primitive {
    /// A stateless function: reads `arity` arguments (in the categories given by
    /// `arg_categories`) and produces a value in `category`.
    Fn {
        name: &'static str,
        category: Category,
        arity: Arity,
        arg_categories: Vec<Category>,
        func: fn(&dyn Params) -> Value,
    },
    /// A variable terminal bound to dataset feature `index`.
    Var {
        name: &'static str,
        category: Category,
        index: usize,
    },
    /// A compile-time constant terminal.
    Const {
        name: &'static str,
        category: Category,
        value: Value,
    },
    /// A parametric terminal (an "ephemeral random constant"): each gene instance using this
    /// primitive draws its own scalar parameter at creation time (stored on the gene, not
    /// here) via `sample`, and evaluates to that parameter reinterpreted in `category`'s
    /// domain.
    Ephemeral {
        name: &'static str,
        category: Category,
        sample: fn() -> f64,
    },
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Fn { name, .. } => name,
            Primitive::Var { name, .. } => name,
            Primitive::Const { name, .. } => name,
            Primitive::Ephemeral { name, .. } => name,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Primitive::Fn { category, .. } => *category,
            Primitive::Var { category, .. } => *category,
            Primitive::Const { category, .. } => *category,
            Primitive::Ephemeral { category, .. } => *category,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Primitive::Fn { arity, .. } => *arity,
            _ => Arity::Zero,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.arity().is_terminal()
    }

    pub fn is_parametric(&self) -> bool {
        matches!(self, Primitive::Ephemeral { .. })
    }

    pub fn arg_category(&self, index: usize) -> Option<Category> {
        match self {
            Primitive::Fn { arg_categories, .. } => arg_categories.get(index).copied(),
            _ => None,
        }
    }

    /// Draws a fresh parameter for a gene referencing this primitive. Meaningful only when
    /// `is_parametric()`; `0.0` otherwise (the gene stores it regardless, but non-parametric
    /// primitives never read it back).
    pub fn draw_param(&self) -> f64 {
        match self {
            Primitive::Ephemeral { sample, .. } => sample(),
            _ => 0.0,
        }
    }

    /// Evaluates the primitive. `param` is the evaluating gene's own stored parameter (used
    /// only by `Ephemeral` terminals); `params` gives lazy access to the arguments (used only
    /// by `Fn`).
    pub fn eval(&self, params: &dyn Params, param: f64) -> Value {
        match self {
            Primitive::Fn { func, .. } => func(params),
            Primitive::Var { index, .. } => params.arg(*index),
            Primitive::Const { value, .. } => value.clone(),
            Primitive::Ephemeral { category, .. } => ephemeral_value(*category, param),
        }
    }
}

fn ephemeral_value(category: Category, param: f64) -> Value {
    // The category's domain is established by the SymbolSet at registration time; here we
    // simply reinterpret the drawn scalar both ways and let the caller's declared domain
    // decide which is meaningful (an ephemeral terminal only ever belongs to an Int or Double
    // category in the standard library, see `stdlib`).
    let _ = category;
    Value::Double(param)
}

impl Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Fn { name, arity, .. } => write!(f, "Fn({name}, {arity:?})"),
            Primitive::Var { name, index, .. } => write!(f, "Var({name}, {index})"),
            Primitive::Const { name, value, .. } => write!(f, "Const({name}, {value:?})"),
            Primitive::Ephemeral { name, .. } => write!(f, "Ephemeral({name})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_vs_function_arity() {
        let var = Primitive::Var {
            name: "X0",
            category: Category(0),
            index: 0,
        };
        assert!(var.is_terminal());

        let add = Primitive::Fn {
            name: "add",
            category: Category(0),
            arity: Arity::Exact(2),
            arg_categories: vec![Category(0), Category(0)],
            func: |p| {
                let a = p.arg(0).as_f64().unwrap_or(0.0);
                let b = p.arg(1).as_f64().unwrap_or(0.0);
                Value::Double(a + b)
            },
        };
        assert!(!add.is_terminal());
        assert_eq!(add.arity().as_usize(), 2);

        let args = [Value::Double(1.0), Value::Double(2.0)];
        assert_eq!(add.eval(&args as &[Value], 0.0), Value::Double(3.0));
    }
}
