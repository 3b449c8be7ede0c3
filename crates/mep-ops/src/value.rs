use compact_str::CompactString;
use std::fmt;

/// The coarse type tag every [`crate::Category`] maps to. Multiple categories may share a
/// domain (e.g. two distinct "kinds" of double-valued quantities that should not be mixed by
/// the interpreter even though both carry an `f64`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    Void,
    Int,
    Double,
    String,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Void => write!(f, "void"),
            Domain::Int => write!(f, "int"),
            Domain::Double => write!(f, "double"),
            Domain::String => write!(f, "string"),
        }
    }
}

/// A runtime value flowing through the interpreter. `Void` is the designated "could not be
/// computed" sentinel produced by illegal arithmetic (division underflow, NaN, overflow) and
/// propagated by any primitive that receives it as an argument (§4.2/§8).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Void,
    Int(i64),
    Double(f64),
    String(CompactString),
}

impl Value {
    pub fn domain(&self) -> Domain {
        match self {
            Value::Void => Domain::Void,
            Value::Int(_) => Domain::Int,
            Value::Double(_) => Domain::Double,
            Value::String(_) => Domain::String,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_propagation_domain() {
        assert_eq!(Value::Void.domain(), Domain::Void);
        assert!(Value::Void.is_void());
    }
}
