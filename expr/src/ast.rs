//! Expression tree produced by the parser.

use hashbrown::HashMap;

use core::fmt;
use std::sync::Arc;

use crate::{
    error::EvalError,
    fns::{FnShape, Function},
    ops::BinaryOp,
    scope::{Scope, Variable},
};

/// Node of an arithmetic expression tree.
///
/// Trees are immutable; [simplification](Self::simplify()) consumes a tree and returns
/// a new one.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Expr {
    /// Numeric constant.
    Constant(f64),
    /// Reference to a variable by name.
    Variable(String),
    /// Binary operation.
    Binary {
        /// Operation.
        op: BinaryOp,
        /// Left-hand side operand.
        lhs: Box<Expr>,
        /// Right-hand side operand.
        rhs: Box<Expr>,
        /// Whether the operation is protected from re-association, e.g., because it was
        /// enclosed in parentheses.
        sealed: bool,
    },
    /// Function call.
    Call {
        /// Called function.
        function: Arc<Function>,
        /// Argument expressions.
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Creates an unsealed binary operation.
    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            sealed: false,
        }
    }

    /// Marks a binary operation as sealed. Other nodes are returned unchanged.
    #[must_use]
    pub fn sealed(self) -> Self {
        match self {
            Self::Binary { op, lhs, rhs, .. } => Self::Binary {
                op,
                lhs,
                rhs,
                sealed: true,
            },
            other => other,
        }
    }

    /// Checks whether this node is a [`Constant`](Self::Constant).
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// Evaluates this expression, resolving variables in the provided scope.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced variable is not defined anywhere in the scope chain,
    /// or if a function call fails.
    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<f64, EvalError> {
        match self {
            Self::Constant(value) => Ok(*value),
            Self::Variable(name) => scope
                .find_variable(name)
                .map(Variable::value)
                .ok_or_else(|| EvalError::Undefined(name.clone())),
            Self::Binary { op, lhs, rhs, .. } => {
                let lhs = lhs.evaluate(scope)?;
                let rhs = rhs.evaluate(scope)?;
                Ok(op.apply(lhs, rhs))
            }
            Self::Call { function, args } => function.call(scope, args),
        }
    }

    /// Folds constant subtrees.
    ///
    /// - Binary operations with constant operands are replaced with their value.
    /// - Chains of unsealed additions or multiplications are flattened, and constant operands
    ///   are combined into a single leading constant. Thus, `a + 2 + 3` becomes `5 + a`.
    /// - Calls of natural functions with constant arguments are replaced with their value.
    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Self::Binary {
                op,
                lhs,
                rhs,
                sealed,
            } => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();
                if let (Self::Constant(lhs), Self::Constant(rhs)) = (&lhs, &rhs) {
                    let value = op.apply(*lhs, *rhs);
                    log::trace!("folded `{lhs} {op} {rhs}` into {value}");
                    return Self::Constant(value);
                }

                if op.is_commutative() {
                    Self::fold_chain(op, lhs, rhs, sealed)
                } else {
                    Self::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        sealed,
                    }
                }
            }

            Self::Call { function, args } => {
                let args: Vec<_> = args.into_iter().map(Self::simplify).collect();
                if function.is_natural() && args.iter().all(Self::is_constant) {
                    if let Ok(value) = function.call(Scope::root(), &args) {
                        log::trace!("folded call to `{}` into {value}", function.name());
                        return Self::Constant(value);
                    }
                }
                Self::Call { function, args }
            }

            other => other,
        }
    }

    fn fold_chain(op: BinaryOp, lhs: Self, rhs: Self, sealed: bool) -> Self {
        let mut operands = vec![];
        lhs.flatten_into(op, &mut operands);
        rhs.flatten_into(op, &mut operands);

        let mut folded = None;
        let mut rest = Vec::with_capacity(operands.len());
        for operand in operands {
            match (operand, folded) {
                (Self::Constant(value), None) => folded = Some(value),
                (Self::Constant(value), Some(acc)) => folded = Some(op.apply(acc, value)),
                (operand, _) => rest.push(operand),
            }
        }

        let mut operands = folded.map(Self::Constant).into_iter().chain(rest);
        let Some(first) = operands.next() else {
            unreachable!("chains always contain at least one operand");
        };
        operands
            .fold(first, |acc, operand| Self::binary(op, acc, operand))
            .with_sealed(sealed)
    }

    fn flatten_into(self, op: BinaryOp, operands: &mut Vec<Self>) {
        match self {
            Self::Binary {
                op: child_op,
                lhs,
                rhs,
                sealed: false,
            } if child_op == op => {
                lhs.flatten_into(op, operands);
                rhs.flatten_into(op, operands);
            }
            other => operands.push(other),
        }
    }

    fn with_sealed(self, sealed: bool) -> Self {
        if sealed {
            self.sealed()
        } else {
            self
        }
    }

    /// Returns distinct names of variables referenced in this expression
    /// in the order of their first occurrence.
    pub fn free_variables(&self) -> Vec<&str> {
        self.variable_usages()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    /// Returns distinct variable names in the order of their first occurrence, each with a flag
    /// set if the variable only occurs in arguments of lazy functions. Such arguments
    /// (e.g., branches of `if`) may be skipped during evaluation.
    pub(crate) fn variable_usages(&self) -> Vec<(&str, bool)> {
        let mut usages: Vec<(&str, bool)> = vec![];
        let mut indices: HashMap<&str, usize> = HashMap::new();
        self.visit_variables(false, &mut |name, deferred| {
            if let Some(&idx) = indices.get(name) {
                usages[idx].1 &= deferred;
            } else {
                indices.insert(name, usages.len());
                usages.push((name, deferred));
            }
        });
        usages
    }

    fn visit_variables<'s>(&'s self, deferred: bool, visitor: &mut impl FnMut(&'s str, bool)) {
        match self {
            Self::Constant(_) => { /* no variables */ }
            Self::Variable(name) => visitor(name.as_str(), deferred),
            Self::Binary { lhs, rhs, .. } => {
                lhs.visit_variables(deferred, visitor);
                rhs.visit_variables(deferred, visitor);
            }
            Self::Call { function, args } => {
                let deferred = deferred || matches!(function.shape(), FnShape::Lazy(_));
                for arg in args {
                    arg.visit_variables(deferred, visitor);
                }
            }
        }
    }

    fn needs_parens(&self, parent: BinaryOp, is_rhs: bool) -> bool {
        match self {
            Self::Binary { op, sealed, .. } => {
                !sealed
                    && (op.priority() < parent.priority()
                        || (is_rhs && op.priority() == parent.priority()))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => fmt::Display::fmt(value, formatter),
            Self::Variable(name) => formatter.write_str(name),
            Self::Binary {
                op,
                lhs,
                rhs,
                sealed,
            } => {
                if *sealed {
                    formatter.write_str("(")?;
                }
                if lhs.needs_parens(*op, false) {
                    write!(formatter, "({lhs})")?;
                } else {
                    write!(formatter, "{lhs}")?;
                }
                write!(formatter, " {} ", op.as_str())?;
                if rhs.needs_parens(*op, true) {
                    write!(formatter, "({rhs})")?;
                } else {
                    write!(formatter, "{rhs}")?;
                }
                if *sealed {
                    formatter.write_str(")")?;
                }
                Ok(())
            }
            Self::Call { function, args } => {
                write!(formatter, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        formatter.write_str(", ")?;
                    }
                    write!(formatter, "{arg}")?;
                }
                formatter.write_str(")")
            }
        }
    }
}

/// Combines `lhs op rhs` into a left-associative tree. If `rhs` is an unsealed operation
/// with the same priority as `op`, `lhs` is spliced in at the leftmost position of its
/// operand chain; otherwise, this is a plain binary operation.
pub(crate) fn reorder(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
    match rhs {
        Expr::Binary {
            op: rhs_op,
            lhs: rhs_lhs,
            rhs: rhs_rhs,
            sealed: false,
        } if rhs_op.priority() == op.priority() => {
            log::trace!("re-associating `{op}` with `{rhs_op}`");
            Expr::Binary {
                op: rhs_op,
                lhs: Box::new(reorder(lhs, op, *rhs_lhs)),
                rhs: rhs_rhs,
                sealed: false,
            }
        }
        rhs => Expr::binary(op, lhs, rhs),
    }
}
