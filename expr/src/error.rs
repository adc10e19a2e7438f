//! Error handling.

use core::{fmt, slice};

use crate::{
    fns::Arity,
    spans::{OwnedSpan, Spanned},
};

/// Category of a parsing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Error while splitting the input into tokens.
    Lexical,
    /// Error while matching tokens against the grammar.
    Syntax,
}

/// Parsing error kind.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No token starts with this character.
    UnexpectedChar,
    /// Number literal cannot be represented.
    InvalidNumber,
    /// Suffix after a number literal is not a known quantifier such as `k` or `m`.
    UnknownQuantifier(String),

    /// Token cannot be used at this position.
    UnexpectedToken {
        /// Description of what was expected.
        expected: &'static str,
    },
    /// Input has ended while more tokens were expected.
    UnexpectedEnd {
        /// Description of what was expected.
        expected: &'static str,
    },
    /// Tokens left over after a complete expression.
    Leftovers,
    /// Function with the enclosed name is not registered.
    UnknownFunction(String),
    /// Number of arguments at the call site differs from the function arity.
    ArgsLenMismatch {
        /// Function name.
        function: String,
        /// Number of arguments declared by the function.
        expected: usize,
        /// Number of arguments at the call site.
        actual: usize,
    },
    /// Syntax is switched off in the parser features.
    DisabledFeature(&'static str),
    /// Expression is nested deeper than the parser allows.
    NestingTooDeep {
        /// Maximum nesting depth.
        limit: usize,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedChar => formatter.write_str("Unexpected character"),
            Self::InvalidNumber => formatter.write_str("Invalid number literal"),
            Self::UnknownQuantifier(suffix) => {
                write!(formatter, "Unknown quantifier `{suffix}` after number")
            }
            Self::UnexpectedToken { expected } => {
                write!(formatter, "Unexpected token; expected {expected}")
            }
            Self::UnexpectedEnd { expected } => {
                write!(formatter, "Unexpected end of input; expected {expected}")
            }
            Self::Leftovers => formatter.write_str("Uninterpreted tokens after expression"),
            Self::UnknownFunction(name) => write!(formatter, "Unknown function `{name}`"),
            Self::ArgsLenMismatch {
                function,
                expected,
                actual,
            } => write!(
                formatter,
                "Function `{function}` expects {expected} argument(s), found {actual}"
            ),
            Self::DisabledFeature(feature) => {
                write!(formatter, "{feature} are switched off in parser features")
            }
            Self::NestingTooDeep { limit } => {
                write!(formatter, "Expression nesting exceeds the limit of {limit}")
            }
        }
    }
}

impl ErrorKind {
    /// Returns the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnexpectedChar | Self::InvalidNumber | Self::UnknownQuantifier(_) => {
                ErrorCategory::Lexical
            }
            _ => ErrorCategory::Syntax,
        }
    }

    pub(crate) fn with_span<T>(self, span: &Spanned<'_, T>) -> ParseError {
        ParseError {
            inner: span.copy_with_extra(self).map_fragment(str::to_owned),
        }
    }
}

/// Parsing error with the associated code span.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    inner: OwnedSpan<ErrorKind>,
}

impl ParseError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.extra
    }

    /// Returns the span of this error. The span fragment is the offending code snippet.
    pub fn span(&self) -> &OwnedSpan<ErrorKind> {
        &self.inner
    }

    /// Returns the offending code snippet.
    pub fn snippet(&self) -> &str {
        self.inner.fragment()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}:{}: {}",
            self.inner.location_line(),
            self.inner.get_column(),
            self.inner.extra
        )
    }
}

impl std::error::Error for ParseError {}

/// Aggregate of all errors collected while parsing an expression. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub(crate) fn new(errors: Vec<ParseError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self { errors }
    }

    /// Returns the first collected error.
    pub fn first(&self) -> &ParseError {
        &self.errors[0]
    }

    /// Returns the number of collected errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always returns `false`; provided for symmetry with [`Self::len()`].
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates over collected errors in the order of their occurrence.
    pub fn iter(&self) -> slice::Iter<'_, ParseError> {
        self.errors.iter()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Failed parsing expression: ")?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                formatter.write_str("; ")?;
            }
            fmt::Display::fmt(error, formatter)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.first())
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Errors that can occur when modifying a [`Scope`](crate::Scope).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ScopeError {
    /// Attempt to modify a constant.
    ConstantModification {
        /// Name of the constant.
        name: String,
    },
    /// Value cannot be interpreted as a number.
    BadValue {
        /// Name of the variable.
        name: String,
        /// Offending value.
        value: String,
    },
}

impl fmt::Display for ScopeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstantModification { name } => {
                write!(formatter, "Constant `{name}` cannot be modified")
            }
            Self::BadValue { name, value } => {
                write!(formatter, "Value `{value}` for variable `{name}` is not a number")
            }
        }
    }
}

impl std::error::Error for ScopeError {}

/// Errors that can occur when evaluating expressions.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EvalError {
    /// Required variables are not bound in the evaluation scope.
    MissingVariables(Vec<String>),
    /// Variable with the enclosed name is not defined.
    Undefined(String),
    /// Function is called with an unsupported number of arguments.
    ArgsLenMismatch {
        /// Function name.
        function: String,
        /// Number of arguments accepted by the function.
        expected: Arity,
        /// Number of arguments at the call site.
        actual: usize,
    },
    /// Error modifying the evaluation scope.
    Scope(ScopeError),
}

impl fmt::Display for EvalError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariables(names) => {
                formatter.write_str("Missing values for required variable(s): ")?;
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        formatter.write_str(", ")?;
                    }
                    write!(formatter, "`{name}`")?;
                }
                Ok(())
            }
            Self::Undefined(name) => write!(formatter, "Variable `{name}` is not defined"),
            Self::ArgsLenMismatch {
                function,
                expected,
                actual,
            } => write!(
                formatter,
                "Function `{function}` accepts {expected} argument(s), but was called with {actual}"
            ),
            Self::Scope(err) => fmt::Display::fmt(err, formatter),
        }
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scope(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ScopeError> for EvalError {
    fn from(err: ScopeError) -> Self {
        Self::Scope(err)
    }
}

/// Error returned by [`calculate()`](crate::calculate).
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Expression cannot be parsed.
    Parse(ParseErrors),
    /// Variable binding is invalid.
    Scope(ScopeError),
    /// Expression cannot be evaluated.
    Eval(EvalError),
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => fmt::Display::fmt(err, formatter),
            Self::Scope(err) => fmt::Display::fmt(err, formatter),
            Self::Eval(err) => fmt::Display::fmt(err, formatter),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Scope(err) => Some(err),
            Self::Eval(err) => Some(err),
        }
    }
}

impl From<ParseErrors> for Error {
    fn from(err: ParseErrors) -> Self {
        Self::Parse(err)
    }
}

impl From<ScopeError> for Error {
    fn from(err: ScopeError) -> Self {
        Self::Scope(err)
    }
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Self {
        Self::Eval(err)
    }
}
