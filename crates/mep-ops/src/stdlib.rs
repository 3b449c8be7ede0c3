//! A concrete, non-exhaustive primitive library for arithmetic, comparison, and boolean
//! programs. Every primitive here follows the void-propagation rule (§4.2/§8): a non-finite
//! result becomes `Value::Void`, and any primitive that receives `Value::Void` as an argument
//! returns `Value::Void` rather than attempting to coerce it (see DESIGN.md for why this was
//! chosen over clamping results into a fixed range).
use crate::{Arity, Category, Params, Primitive, SymbolSet, Value};
use mep_error::MepResult;

fn arg_f64(params: &dyn Params, index: usize) -> Option<f64> {
    params.arg(index).as_f64()
}

fn void_propagating(inputs: &[Option<f64>]) -> bool {
    inputs.iter().any(|v| v.is_none())
}

fn finite_or_void(v: f64) -> Value {
    if v.is_finite() {
        Value::Double(v)
    } else {
        Value::Void
    }
}

fn eval_add(p: &dyn Params) -> Value {
    let (a, b) = (arg_f64(p, 0), arg_f64(p, 1));
    if void_propagating(&[a, b]) {
        return Value::Void;
    }
    finite_or_void(a.unwrap() + b.unwrap())
}

fn eval_sub(p: &dyn Params) -> Value {
    let (a, b) = (arg_f64(p, 0), arg_f64(p, 1));
    if void_propagating(&[a, b]) {
        return Value::Void;
    }
    finite_or_void(a.unwrap() - b.unwrap())
}

fn eval_mul(p: &dyn Params) -> Value {
    let (a, b) = (arg_f64(p, 0), arg_f64(p, 1));
    if void_propagating(&[a, b]) {
        return Value::Void;
    }
    finite_or_void(a.unwrap() * b.unwrap())
}

fn eval_div(p: &dyn Params) -> Value {
    let (a, b) = (arg_f64(p, 0), arg_f64(p, 1));
    if void_propagating(&[a, b]) {
        return Value::Void;
    }
    let (a, b) = (a.unwrap(), b.unwrap());
    if b.abs() < 1e-12 {
        return Value::Void;
    }
    finite_or_void(a / b)
}

fn eval_neg(p: &dyn Params) -> Value {
    match arg_f64(p, 0) {
        Some(a) => finite_or_void(-a),
        None => Value::Void,
    }
}

fn eval_abs(p: &dyn Params) -> Value {
    match arg_f64(p, 0) {
        Some(a) => finite_or_void(a.abs()),
        None => Value::Void,
    }
}

fn eval_sqrt(p: &dyn Params) -> Value {
    match arg_f64(p, 0) {
        Some(a) if a >= 0.0 => finite_or_void(a.sqrt()),
        _ => Value::Void,
    }
}

fn eval_gt(p: &dyn Params) -> Value {
    let (a, b) = (arg_f64(p, 0), arg_f64(p, 1));
    if void_propagating(&[a, b]) {
        return Value::Void;
    }
    Value::Int((a.unwrap() > b.unwrap()) as i64)
}

fn eval_lt(p: &dyn Params) -> Value {
    let (a, b) = (arg_f64(p, 0), arg_f64(p, 1));
    if void_propagating(&[a, b]) {
        return Value::Void;
    }
    Value::Int((a.unwrap() < b.unwrap()) as i64)
}

fn eval_if(p: &dyn Params) -> Value {
    let cond = p.arg(0);
    match cond {
        Value::Void => Value::Void,
        Value::Int(c) => {
            if c != 0 {
                p.arg(1)
            } else {
                p.arg(2)
            }
        }
        _ => Value::Void,
    }
}

/// Registers a standard arithmetic/comparison/conditional primitive set over the given
/// `category` (all functions and terminals share one category — suitable for pure numeric
/// regression problems). Returns the opcodes in insertion order for callers that want to
/// record them.
pub fn install_arithmetic(set: &mut SymbolSet, category: Category) -> MepResult<()> {
    set.insert_default(Primitive::Fn {
        name: "add",
        category,
        arity: Arity::Exact(2),
        arg_categories: vec![category, category],
        func: eval_add,
    })?;
    set.insert_default(Primitive::Fn {
        name: "sub",
        category,
        arity: Arity::Exact(2),
        arg_categories: vec![category, category],
        func: eval_sub,
    })?;
    set.insert_default(Primitive::Fn {
        name: "mul",
        category,
        arity: Arity::Exact(2),
        arg_categories: vec![category, category],
        func: eval_mul,
    })?;
    set.insert_default(Primitive::Fn {
        name: "div",
        category,
        arity: Arity::Exact(2),
        arg_categories: vec![category, category],
        func: eval_div,
    })?;
    set.insert_default(Primitive::Fn {
        name: "neg",
        category,
        arity: Arity::Exact(1),
        arg_categories: vec![category],
        func: eval_neg,
    })?;
    set.insert_default(Primitive::Fn {
        name: "abs",
        category,
        arity: Arity::Exact(1),
        arg_categories: vec![category],
        func: eval_abs,
    })?;
    set.insert_default(Primitive::Fn {
        name: "sqrt",
        category,
        arity: Arity::Exact(1),
        arg_categories: vec![category],
        func: eval_sqrt,
    })?;
    set.insert_default(Primitive::Ephemeral {
        name: "erc",
        category,
        sample: || mep_core::random_provider::range(-10.0..10.0),
    })?;
    Ok(())
}

pub fn install_comparison(set: &mut SymbolSet, numeric: Category, boolean: Category) -> MepResult<()> {
    set.insert_default(Primitive::Fn {
        name: "gt",
        category: boolean,
        arity: Arity::Exact(2),
        arg_categories: vec![numeric, numeric],
        func: eval_gt,
    })?;
    set.insert_default(Primitive::Fn {
        name: "lt",
        category: boolean,
        arity: Arity::Exact(2),
        arg_categories: vec![numeric, numeric],
        func: eval_lt,
    })?;
    set.insert_default(Primitive::Fn {
        name: "if",
        category: numeric,
        arity: Arity::Exact(3),
        arg_categories: vec![boolean, numeric, numeric],
        func: eval_if,
    })?;
    Ok(())
}

/// Installs one `Var` terminal per dataset feature, all sharing `category` — the minimal
/// requirement for `enough_terminals()` to hold before evolution starts.
pub fn install_variables(set: &mut SymbolSet, category: Category, feature_count: usize) -> MepResult<()> {
    for i in 0..feature_count {
        let name: &'static str = Box::leak(format!("X{i}").into_boxed_str());
        set.insert_default(Primitive::Var {
            name,
            category,
            index: i,
        })?;
    }
    Ok(())
}
