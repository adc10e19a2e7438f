//! Standard numeric functions.

use super::{flow, Arity, Function};

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

/// Rounds half-way cases towards positive infinity.
fn round(x: f64) -> f64 {
    (x + 0.5).floor()
}

fn random(scale: f64) -> f64 {
    rand::random::<f64>() * scale
}

pub(super) fn standard_functions() -> Vec<Function> {
    vec![
        // Trigonometry
        Function::unary("sin", f64::sin),
        Function::unary("cos", f64::cos),
        Function::unary("tan", f64::tan),
        Function::unary("asin", f64::asin),
        Function::unary("acos", f64::acos),
        Function::unary("atan", f64::atan),
        Function::binary("atan2", f64::atan2),
        Function::unary("sinh", f64::sinh),
        Function::unary("cosh", f64::cosh),
        Function::unary("tanh", f64::tanh),
        // Rounding
        Function::unary("round", round),
        Function::unary("floor", f64::floor),
        Function::unary("ceil", f64::ceil),
        // Exponentials and logarithms
        Function::unary("exp", f64::exp),
        Function::unary("ln", f64::ln),
        Function::unary("log", f64::log10),
        Function::binary("pow", f64::powf),
        Function::unary("sqrt", f64::sqrt),
        // Misc
        Function::unary("abs", f64::abs),
        Function::binary("min", f64::min),
        Function::binary("max", f64::max),
        Function::unary("rnd", random).impure(),
        Function::unary("sign", sign),
        Function::unary("deg", f64::to_degrees),
        Function::unary("rad", f64::to_radians),
        // Flow control and aggregation
        Function::lazy("if", Arity::Exact(3), flow::if_fn).impure(),
        Function::lazy("avg", Arity::Any, flow::avg),
    ]
}
