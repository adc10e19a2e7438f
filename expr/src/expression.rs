//! Parsed expressions and one-shot evaluation.

use core::fmt;

use crate::{
    ast::Expr,
    error::{Error, EvalError},
    parser::parse,
    scope::{Scope, VarValue},
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VariableSpec {
    pub name: String,
    /// `None` for required variables.
    pub default_value: Option<f64>,
    /// The variable only occurs in arguments that may be left unevaluated.
    pub deferred: bool,
}

/// Expression produced by the [`Parser`](crate::Parser), together with the metadata
/// on the variables it references.
///
/// A parsed expression is immutable and can be evaluated any number of times
/// against different scopes.
#[derive(Debug, Clone)]
pub struct ParsedExpression {
    root: Expr,
    variables: Vec<VariableSpec>,
}

impl ParsedExpression {
    pub(crate) fn new(root: Expr, variables: Vec<VariableSpec>) -> Self {
        Self { root, variables }
    }

    /// Returns the root of the (simplified) expression tree.
    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Consumes this expression and returns the root of its tree.
    pub fn into_root(self) -> Expr {
        self.root
    }

    /// Returns distinct names of variables referenced in the expression, in the order
    /// of their first occurrence in the source text.
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|spec| spec.name.as_str()).collect()
    }

    /// Checks whether the variable is referenced by the expression and is optional.
    pub fn is_optional(&self, name: &str) -> bool {
        self.default_value(name).is_some()
    }

    /// Returns the value substituted for the specified optional variable if it is missing.
    /// Returns `None` for required variables and for names not referenced by the expression.
    pub fn default_value(&self, name: &str) -> Option<f64> {
        self.variables
            .iter()
            .find(|spec| spec.name == name)
            .and_then(|spec| spec.default_value)
    }

    /// Evaluates this expression.
    ///
    /// Evaluation takes place in a child of the provided `scope`. Optional variables missing
    /// from the scope chain are bound to their default values in the child scope.
    ///
    /// Required variables that only occur in lazily evaluated arguments (e.g., in a branch
    /// of `if`) are checked only if evaluation reaches them. Thus, `if(1, 5, x)` evaluates to 5
    /// even if `x` is not bound.
    ///
    /// # Errors
    ///
    /// - Returns [`EvalError::MissingVariables`] listing all required variables that are missing
    ///   from the scope chain. In this case, the expression is not evaluated.
    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<f64, EvalError> {
        let mut locals = scope.child();
        let mut missing = vec![];
        for spec in &self.variables {
            if scope.contains_variable(&spec.name) {
                continue;
            }
            if let Some(value) = spec.default_value {
                log::debug!("using default value {value} for variable `{}`", spec.name);
                locals.create(&spec.name).set_value(value)?;
            } else if !spec.deferred {
                missing.push(spec.name.clone());
            }
        }

        if !missing.is_empty() {
            return Err(EvalError::MissingVariables(missing));
        }
        self.root.evaluate(&locals).map_err(|err| match err {
            EvalError::Undefined(name) if self.is_declared(&name) => {
                EvalError::MissingVariables(vec![name])
            }
            other => other,
        })
    }

    fn is_declared(&self, name: &str) -> bool {
        self.variables.iter().any(|spec| spec.name == name)
    }

    /// Evaluates this expression. Currently, this has the same semantics
    /// as [`Self::evaluate()`].
    ///
    /// # Errors
    ///
    /// See [`Self::evaluate()`].
    pub fn strict_evaluate(&self, scope: &Scope<'_>) -> Result<f64, EvalError> {
        self.evaluate(scope)
    }
}

impl fmt::Display for ParsedExpression {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, formatter)
    }
}

/// Parses and evaluates an expression in a single call. Variables are bound in a fresh scope
/// derived from the [root scope](Scope::root()).
///
/// # Errors
///
/// Returns an error if the text cannot be parsed, if a variable value is invalid,
/// or if evaluation fails.
///
/// # Examples
///
/// ```
/// # use arithmetic_expr::calculate;
/// # fn main() -> anyhow::Result<()> {
/// let value = calculate("max(a, b) * 2", [("a", 1.5), ("b", -2.0)])?;
/// assert_eq!(value, 3.0);
/// let value = calculate("10k / x", [("x", "4")])?;
/// assert_eq!(value, 2_500.0);
/// # Ok(())
/// # }
/// ```
pub fn calculate<N, V>(text: &str, variables: impl IntoIterator<Item = (N, V)>) -> Result<f64, Error>
where
    N: AsRef<str>,
    V: Into<VarValue>,
{
    let expr = parse(text)?;
    let mut scope = Scope::new();
    for (name, value) in variables {
        scope.create_with_value(name.as_ref(), value)?;
    }
    Ok(expr.evaluate(&scope)?)
}
