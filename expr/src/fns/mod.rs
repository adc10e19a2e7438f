//! Functions callable from expressions, and the registry used to resolve them.
//!
//! # Defining functions
//!
//! A [`Function`] has one of three shapes:
//!
//! - [`FnShape::Unary`] and [`FnShape::Binary`] wrap plain numeric functions. All arguments
//!   are evaluated before the call; a NaN argument short-circuits the call and yields NaN.
//! - [`FnShape::Lazy`] receives unevaluated argument expressions together with the evaluation
//!   scope. This allows evaluating only some of the arguments, as `if` does.
//!
//! Functions are *natural* by default, i.e., their output depends only on the arguments.
//! Calls to natural functions with constant arguments are folded when simplifying
//! expressions. Use [`Function::impure()`] to opt out.
//!
//! # Examples
//!
//! ```
//! use arithmetic_expr::{fns::{Function, Functions}, Parser, Scope};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut functions = Functions::standard().clone();
//! functions.register(Function::binary("hypot", f64::hypot));
//!
//! let expr = Parser::new().with_functions(&functions).parse("hypot(3, x)")?;
//! let mut scope = Scope::new();
//! scope.create_with_value("x", 4)?;
//! assert_eq!(expr.evaluate(&scope)?, 5.0);
//! # Ok(())
//! # }
//! ```

use hashbrown::HashMap;
use once_cell::sync::Lazy;

use core::fmt;
use std::sync::Arc;

use crate::{ast::Expr, error::EvalError, scope::Scope};

mod flow;
mod math;

/// Function processing unevaluated argument expressions.
pub type LazyFn = fn(&Scope<'_>, &[Expr]) -> Result<f64, EvalError>;

/// Number of arguments accepted by a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exact number of arguments.
    Exact(usize),
    /// Any number of arguments, including zero.
    Any,
}

impl Arity {
    /// Checks whether a call with `args_len` arguments is valid.
    pub fn accepts(self, args_len: usize) -> bool {
        match self {
            Self::Exact(len) => len == args_len,
            Self::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(len) => write!(formatter, "{len}"),
            Self::Any => formatter.write_str("any number of"),
        }
    }
}

/// Shape of a [`Function`] determining how it is invoked.
#[derive(Clone, Copy)]
pub enum FnShape {
    /// Function with a single eagerly evaluated argument.
    Unary(fn(f64) -> f64),
    /// Function with two eagerly evaluated arguments.
    Binary(fn(f64, f64) -> f64),
    /// Function receiving argument expressions.
    Lazy(LazyFn),
}

impl fmt::Debug for FnShape {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Unary(_) => "Unary",
            Self::Binary(_) => "Binary",
            Self::Lazy(_) => "Lazy",
        })
    }
}

/// Named function callable from expressions.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    arity: Arity,
    natural: bool,
    shape: FnShape,
}

impl Function {
    /// Creates a natural function with a single argument.
    pub fn unary(name: impl Into<String>, function: fn(f64) -> f64) -> Self {
        Self {
            name: name.into(),
            arity: Arity::Exact(1),
            natural: true,
            shape: FnShape::Unary(function),
        }
    }

    /// Creates a natural function with two arguments.
    pub fn binary(name: impl Into<String>, function: fn(f64, f64) -> f64) -> Self {
        Self {
            name: name.into(),
            arity: Arity::Exact(2),
            natural: true,
            shape: FnShape::Binary(function),
        }
    }

    /// Creates a natural function receiving unevaluated arguments.
    pub fn lazy(name: impl Into<String>, arity: Arity, function: LazyFn) -> Self {
        Self {
            name: name.into(),
            arity,
            natural: true,
            shape: FnShape::Lazy(function),
        }
    }

    /// Marks this function as impure, i.e., not eligible for constant folding.
    #[must_use]
    pub fn impure(mut self) -> Self {
        self.natural = false;
        self
    }

    /// Returns the function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of accepted arguments.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Checks whether the function output depends only on its arguments.
    pub fn is_natural(&self) -> bool {
        self.natural
    }

    /// Returns the function shape.
    pub fn shape(&self) -> FnShape {
        self.shape
    }

    /// Calls this function with the provided argument expressions.
    pub fn call(&self, scope: &Scope<'_>, args: &[Expr]) -> Result<f64, EvalError> {
        if !self.arity.accepts(args.len()) {
            return Err(EvalError::ArgsLenMismatch {
                function: self.name.clone(),
                expected: self.arity,
                actual: args.len(),
            });
        }

        match (self.shape, args) {
            (FnShape::Unary(function), [arg]) => {
                let arg = arg.evaluate(scope)?;
                Ok(if arg.is_nan() { f64::NAN } else { function(arg) })
            }
            (FnShape::Binary(function), [x, y]) => {
                let x = x.evaluate(scope)?;
                if x.is_nan() {
                    return Ok(f64::NAN);
                }
                let y = y.evaluate(scope)?;
                Ok(if y.is_nan() { f64::NAN } else { function(x, y) })
            }
            (FnShape::Lazy(function), args) => function(scope, args),
            _ => unreachable!("unary / binary function with non-matching arity"),
        }
    }
}

/// Registry of functions available to the parser.
///
/// The [standard registry](Self::standard()) is built once and shared by the whole process.
/// To extend it, clone the standard registry and [register](Self::register()) additional
/// functions; the extended registry is then passed to the [`Parser`](crate::Parser).
#[derive(Debug, Clone, Default)]
pub struct Functions {
    functions: HashMap<String, Arc<Function>>,
}

impl Functions {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the standard registry containing trigonometric, rounding, exponential
    /// and other functions, together with `if` and `avg`.
    pub fn standard() -> &'static Self {
        static STANDARD: Lazy<Functions> = Lazy::new(|| {
            let functions: Functions = math::standard_functions().into_iter().collect();
            log::debug!("initialized {} standard functions", functions.len());
            functions
        });
        &STANDARD
    }

    /// Registers a function, replacing a previously registered function with the same name.
    pub fn register(&mut self, function: Function) -> &mut Self {
        self.functions
            .insert(function.name.clone(), Arc::new(function));
        self
    }

    /// Gets a function by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Function>> {
        self.functions.get(name)
    }

    /// Checks if a function with the specified name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Returns the number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Checks if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Iterates over registered functions in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Function> + '_ {
        self.functions.values().map(AsRef::as_ref)
    }
}

impl Extend<Function> for Functions {
    fn extend<I: IntoIterator<Item = Function>>(&mut self, iter: I) {
        for function in iter {
            self.register(function);
        }
    }
}

impl FromIterator<Function> for Functions {
    fn from_iter<I: IntoIterator<Item = Function>>(iter: I) -> Self {
        let mut functions = Self::new();
        functions.extend(iter);
        functions
    }
}

/// Returns the `abs` function used for `|x|` expressions.
pub(crate) fn abs() -> Arc<Function> {
    static ABS: Lazy<Arc<Function>> = Lazy::new(|| Arc::new(Function::unary("abs", f64::abs)));
    Arc::clone(&ABS)
}
