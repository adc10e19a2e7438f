//! Parser and evaluator for numeric arithmetic expressions.
//!
//! Expressions consist of number literals (optionally with SI quantifiers, such as `10k`),
//! variables, function calls, and the following operations, from the loosest binding
//! to the tightest:
//!
//! | Operations | Description |
//! |------------|-------------|
//! | `&&`, `\|\|` | Logical conjunction and disjunction |
//! | `<`, `<=`, `=`, `>=`, `>`, `!=` | Comparisons |
//! | `+`, `-` | Addition and subtraction |
//! | `*`, `/`, `%` | Multiplication, division and remainder |
//! | `^` or `**` | Power |
//!
//! Additionally, `|x|` denotes the absolute value, and a trailing `%` (as in `50%`)
//! multiplies the preceding value by 0.01. All values are `f64`; comparisons and logical
//! operations yield 1.0 for truth and 0.0 for falsehood. Comparisons tolerate
//! absolute differences up to [`EPSILON`](ops::EPSILON).
//!
//! # Workflow
//!
//! 1. A [`Parser`] turns text into a [`ParsedExpression`], collecting all errors
//!    in the text into [`ParseErrors`](error::ParseErrors). The expression tree
//!    is simplified by folding constant subexpressions.
//! 2. The expression is evaluated against a [`Scope`], which binds variable names to values.
//!    Scopes form a chain ending in the [root scope](Scope::root()) with the constants
//!    `pi` and `euler`.
//!
//! Functions are resolved at parse time using a registry of [`Function`](fns::Function)s;
//! by default, the [standard functions](fns::Functions::standard()) are used.
//!
//! # Examples
//!
//! ```
//! use arithmetic_expr::{parse, Scope};
//!
//! # fn main() -> anyhow::Result<()> {
//! let expr = parse("if(x >= 0, sqrt(x), -1) + 2 * 3")?;
//! assert_eq!(expr.variable_names(), ["x"]);
//!
//! let mut scope = Scope::new();
//! scope.create_with_value("x", 16)?;
//! assert_eq!(expr.evaluate(&scope)?, 10.0);
//! scope.create_with_value("x", "-4")?;
//! assert_eq!(expr.evaluate(&scope)?, 5.0);
//! # Ok(())
//! # }
//! ```
//!
//! Quick evaluation with [`calculate()`]:
//!
//! ```
//! # use arithmetic_expr::calculate;
//! # fn main() -> anyhow::Result<()> {
//! let value = calculate("price * (1 + vat)", [("price", 200.0), ("vat", 0.2)])?;
//! assert!((value - 240.0).abs() < 1e-9);
//! assert_eq!(calculate::<&str, f64>("50% * 1k", [])?, 500.0);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub use crate::{
    ast::Expr,
    expression::{calculate, ParsedExpression},
    ops::{BinaryOp, OpPriority},
    parser::{parse, Features, Parser},
    scope::{Scope, VarValue, Variable},
};

mod ast;
pub mod error;
mod expression;
pub mod fns;
pub mod lexer;
pub mod ops;
mod parser;
mod scope;
pub mod spans;
