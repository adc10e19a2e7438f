//! Functions with lazily evaluated arguments.

use crate::{ast::Expr, error::EvalError, scope::Scope};

/// Conditional `if(condition, then, otherwise)`. Only the selected branch is evaluated;
/// a NaN condition yields NaN without evaluating either branch.
pub(super) fn if_fn(scope: &Scope<'_>, args: &[Expr]) -> Result<f64, EvalError> {
    let [condition, then_branch, else_branch] = args else {
        unreachable!("arity is checked by `Function::call`");
    };

    let condition = condition.evaluate(scope)?;
    if condition.is_nan() {
        Ok(f64::NAN)
    } else if condition == 0.0 {
        else_branch.evaluate(scope)
    } else {
        then_branch.evaluate(scope)
    }
}

/// Arithmetic mean of all arguments; NaN if there are no arguments.
#[allow(clippy::cast_precision_loss)]
pub(super) fn avg(scope: &Scope<'_>, args: &[Expr]) -> Result<f64, EvalError> {
    let mut sum = 0.0;
    for arg in args {
        sum += arg.evaluate(scope)?;
    }
    Ok(sum / args.len() as f64)
}
