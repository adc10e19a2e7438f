//! Operation-related types.

use core::fmt;

/// Absolute tolerance used by equality and non-strict order comparisons.
pub const EPSILON: f64 = 1e-10;

/// Priority of a binary operation.
///
/// The priority is only consulted when re-ordering chains of operations; the precedence
/// of operations in the source text is encoded by the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpPriority {
    /// Boolean AND / OR (`&&`, `||`).
    Logical,
    /// Equality and order comparisons: `=`, `!=`, `>`, `<`, `>=`, `<=`.
    Comparison,
    /// Addition or subtraction: `+` or `-`.
    AddOrSub,
    /// Multiplication, division or remainder: `*`, `/` or `%`.
    MulOrDiv,
    /// Power (`^` or `**`).
    Power,
}

impl OpPriority {
    /// Returns the numeric priority, from 1 for logical ops up to 5 for power.
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Logical => 1,
            Self::Comparison => 2,
            Self::AddOrSub => 3,
            Self::MulOrDiv => 4,
            Self::Power => 5,
        }
    }
}

/// Binary arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Division (`/`).
    Div,
    /// Remainder (`%`).
    Rem,
    /// Power (`^`).
    Power,
    /// "Lesser than" comparison.
    Lt,
    /// "Lesser or equal" comparison.
    Le,
    /// Equality (`=`).
    Eq,
    /// "Greater or equal" comparison.
    Ge,
    /// "Greater than" comparison.
    Gt,
    /// Non-equality (`!=`).
    NotEq,
    /// Boolean AND (`&&`).
    And,
    /// Boolean OR (`||`).
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Add => "addition",
            Self::Sub => "subtraction",
            Self::Mul => "multiplication",
            Self::Div => "division",
            Self::Rem => "remainder",
            Self::Power => "exponentiation",
            Self::Lt => "lesser comparison",
            Self::Le => "lesser-or-equal comparison",
            Self::Eq => "equality comparison",
            Self::Ge => "greater-or-equal comparison",
            Self::Gt => "greater comparison",
            Self::NotEq => "non-equality comparison",
            Self::And => "AND",
            Self::Or => "OR",
        })
    }
}

impl BinaryOp {
    /// Returns the string representation of this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Power => "^",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::NotEq => "!=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// Returns the priority of this operation.
    pub fn priority(self) -> OpPriority {
        match self {
            Self::And | Self::Or => OpPriority::Logical,
            Self::Lt | Self::Le | Self::Eq | Self::Ge | Self::Gt | Self::NotEq => {
                OpPriority::Comparison
            }
            Self::Add | Self::Sub => OpPriority::AddOrSub,
            Self::Mul | Self::Div | Self::Rem => OpPriority::MulOrDiv,
            Self::Power => OpPriority::Power,
        }
    }

    /// Checks if operands of this operation may be freely re-associated and swapped
    /// during simplification.
    pub fn is_commutative(self) -> bool {
        matches!(self, Self::Add | Self::Mul)
    }

    /// Checks if this operation is a comparison.
    pub fn is_comparison(self) -> bool {
        self.priority() == OpPriority::Comparison
    }

    /// Checks if this operation is a Boolean AND / OR.
    pub fn is_logical(self) -> bool {
        self.priority() == OpPriority::Logical
    }

    /// Applies this operation to the provided operands.
    ///
    /// A NaN operand always produces NaN. Comparisons and logical operations return
    /// 1.0 for `true` and 0.0 for `false`; any non-zero operand of a logical operation
    /// is considered `true`.
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        if lhs.is_nan() || rhs.is_nan() {
            return f64::NAN;
        }

        let approx_eq = (lhs - rhs).abs() < EPSILON;
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
            Self::Rem => lhs % rhs,
            Self::Power => lhs.powf(rhs),

            Self::Lt => bool_to_f64(lhs < rhs && !approx_eq),
            Self::Le => bool_to_f64(lhs < rhs || approx_eq),
            Self::Eq => bool_to_f64(approx_eq),
            Self::Ge => bool_to_f64(lhs > rhs || approx_eq),
            Self::Gt => bool_to_f64(lhs > rhs && !approx_eq),
            Self::NotEq => bool_to_f64(!approx_eq),

            Self::And => bool_to_f64(lhs != 0.0 && rhs != 0.0),
            Self::Or => bool_to_f64(lhs != 0.0 || rhs != 0.0),
        }
    }
}

pub(crate) fn bool_to_f64(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
