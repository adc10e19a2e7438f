//! Recursive-descent parser transforming tokens into an [`Expr`] tree.
//!
//! # Grammar
//!
//! Rules are listed from the loosest binding to the tightest one:
//!
//! ```text
//! expression := relational (('&&' | '||') relational)*
//! relational := term (('<' | '<=' | '=' | '>=' | '>' | '!=') term)*
//! term       := product (('+' | '-') product)*
//! product    := percent (('*' | '/' | '%') percent)*
//! percent    := power '%'*
//! power      := atom (('^' | '**') atom)*
//! atom       := '-' atom | '+'? '(' expression ')' | '|' expression '|'
//!             | IDENT '(' args ')' | IDENT | literal
//! literal    := '+'? NUMBER QUANTIFIER?
//! ```
//!
//! Chains of operations with the same priority are evaluated left to right.
//! Thus, `10 - 2 - 3` is `(10 - 2) - 3`; the same holds for `^`, i.e., `2 ^ 3 ^ 2` is 64.
//! Operations enclosed in parentheses are *sealed*: they are never re-associated.
//!
//! Besides that:
//!
//! - `%` followed by the end of input or by a token other than a number literal
//!   is a postfix percent operation (multiplication by 0.01). Otherwise, it is the remainder.
//! - A negative number literal in place of a `+` / `-` operator is a subtraction
//!   of its magnitude; e.g., `5 -3` is 2, and `8-2^2` is 4.
//! - A number literal may be directly followed by an SI quantifier:
//!   `n` (1e-9), `u` (1e-6), `m` (1e-3), `k` or `K` (1e3), `M` (1e6), `G` (1e9).

use bitflags::bitflags;
use hashbrown::HashMap;

use std::{mem, sync::Arc};

use crate::{
    ast::{reorder, Expr},
    error::{ErrorKind, ParseError, ParseErrors},
    expression::{ParsedExpression, VariableSpec},
    fns::{self, Arity, Functions},
    lexer::{Symbol, Token, TokenKind, TokenStream},
    ops::{BinaryOp, OpPriority},
};

#[cfg(test)]
mod tests;

const DEFAULT_MAX_DEPTH: usize = 512;

bitflags! {
    /// Optional syntax recognized by the [`Parser`]. All features are enabled by default.
    ///
    /// Using disabled syntax results in a [`DisabledFeature`](ErrorKind::DisabledFeature) error.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u8 {
        /// SI quantifiers after number literals, e.g., `10k` or `2.5m`.
        const QUANTIFIERS = 1;
        /// Postfix percent operation, e.g., `50%`.
        const PERCENT = 2;
        /// Absolute value bars, e.g., `|x - 1|`.
        const ABS_BARS = 4;
        /// Constant folding after parsing. Unlike other features, disabling folding
        /// does not affect which inputs are accepted.
        const FOLD_CONSTANTS = 8;
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Requirement {
    Required,
    Optional(Option<f64>),
}

/// Configurable parser of arithmetic expressions.
///
/// # Examples
///
/// ```
/// use arithmetic_expr::{Features, Parser, Scope};
///
/// # fn main() -> anyhow::Result<()> {
/// let parser = Parser::new()
///     .with_features(Features::all() - Features::PERCENT)
///     .optional("rate", Some(0.25))
///     .required("x");
/// let expr = parser.parse("x * (1 + rate)")?;
/// assert_eq!(expr.variable_names(), ["x", "rate"]);
///
/// let mut scope = Scope::new();
/// scope.create_with_value("x", 8)?;
/// assert_eq!(expr.evaluate(&scope)?, 10.0);
///
/// // Percents are switched off.
/// assert!(parser.parse("x%").is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Parser<'f> {
    functions: &'f Functions,
    features: Features,
    optional_by_default: bool,
    default_value: f64,
    requirements: HashMap<String, Requirement>,
    max_depth: usize,
}

impl Default for Parser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser<'static> {
    /// Creates a parser with all [`Features`], the [standard functions](Functions::standard())
    /// and all variables required.
    pub fn new() -> Self {
        Self {
            functions: Functions::standard(),
            features: Features::all(),
            optional_by_default: false,
            default_value: 0.0,
            requirements: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl<'f> Parser<'f> {
    /// Sets the registry used to resolve function calls.
    pub fn with_functions<'g>(self, functions: &'g Functions) -> Parser<'g> {
        Parser {
            functions,
            features: self.features,
            optional_by_default: self.optional_by_default,
            default_value: self.default_value,
            requirements: self.requirements,
            max_depth: self.max_depth,
        }
    }

    /// Sets recognized syntax features.
    #[must_use]
    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Sets whether variables not mentioned in [`Self::optional()`] or [`Self::required()`]
    /// are optional.
    #[must_use]
    pub fn optional_by_default(mut self, optional: bool) -> Self {
        self.optional_by_default = optional;
        self
    }

    /// Sets the value substituted for optional variables without an explicit default value.
    /// The default is zero.
    #[must_use]
    pub fn default_value(mut self, value: f64) -> Self {
        self.default_value = value;
        self
    }

    /// Marks a variable as optional, i.e., substituted with `default_value`
    /// (or the global [default value](Self::default_value()) if `None`) when missing.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, default_value: Option<f64>) -> Self {
        self.requirements
            .insert(name.into(), Requirement::Optional(default_value));
        self
    }

    /// Marks a variable as required, i.e., its absence is an evaluation error.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.requirements.insert(name.into(), Requirement::Required);
        self
    }

    /// Sets the maximum nesting depth of grammar rules. The default is 512.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Parses the provided text.
    ///
    /// # Errors
    ///
    /// Returns all lexical and syntax errors found in the text.
    pub fn parse(&self, text: &str) -> Result<ParsedExpression, ParseErrors> {
        let mut rules = Rules {
            functions: self.functions,
            features: self.features,
            max_depth: self.max_depth,
            tokens: TokenStream::new(text),
            depth: 0,
            aborted: false,
            negate_literal: false,
        };
        let root = rules.expression();
        if rules.tokens.current().extra != TokenKind::End {
            rules.report_at_current(ErrorKind::Leftovers);
            rules.tokens.skip_to_end();
        }

        let mut errors = rules.tokens.into_errors();
        if !errors.is_empty() {
            errors.sort_by_key(|err| err.span().location_offset());
            log::debug!("failed parsing expression: {} error(s)", errors.len());
            return Err(ParseErrors::new(errors));
        }

        let variables: Vec<_> = root
            .variable_usages()
            .into_iter()
            .map(|(name, deferred)| self.variable_spec(name, deferred))
            .collect();
        let root = if self.features.contains(Features::FOLD_CONSTANTS) {
            root.simplify()
        } else {
            root
        };
        log::debug!(
            "parsed expression `{root}` with {} variable(s)",
            variables.len()
        );
        Ok(ParsedExpression::new(root, variables))
    }

    fn variable_spec(&self, name: &str, deferred: bool) -> VariableSpec {
        let requirement = self.requirements.get(name).copied();
        let default_value = match requirement {
            Some(Requirement::Required) => None,
            Some(Requirement::Optional(value)) => Some(value.unwrap_or(self.default_value)),
            None if self.optional_by_default => Some(self.default_value),
            None => None,
        };
        VariableSpec {
            name: name.to_owned(),
            default_value,
            deferred,
        }
    }
}

/// Parses an expression with the default [`Parser`] settings.
///
/// # Errors
///
/// Returns all lexical and syntax errors found in the text.
pub fn parse(text: &str) -> Result<ParsedExpression, ParseErrors> {
    Parser::new().parse(text)
}

fn binary_op(symbol: Symbol) -> Option<BinaryOp> {
    Some(match symbol {
        Symbol::Plus => BinaryOp::Add,
        Symbol::Minus => BinaryOp::Sub,
        Symbol::Star => BinaryOp::Mul,
        Symbol::Slash => BinaryOp::Div,
        Symbol::Percent => BinaryOp::Rem,
        Symbol::Caret => BinaryOp::Power,
        Symbol::Lt => BinaryOp::Lt,
        Symbol::Le => BinaryOp::Le,
        Symbol::Eq => BinaryOp::Eq,
        Symbol::Ge => BinaryOp::Ge,
        Symbol::Gt => BinaryOp::Gt,
        Symbol::NotEq => BinaryOp::NotEq,
        Symbol::And => BinaryOp::And,
        Symbol::Or => BinaryOp::Or,
        _ => return None,
    })
}

fn quantifier(suffix: &str) -> Option<f64> {
    Some(match suffix {
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" | "K" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        _ => return None,
    })
}

const ATOM: &str = "number, variable, function call, `(` or `|`";

/// State of a single parsing run.
#[derive(Debug)]
struct Rules<'f, 'a> {
    functions: &'f Functions,
    features: Features,
    max_depth: usize,
    tokens: TokenStream<'a>,
    depth: usize,
    /// Set once the nesting limit is exceeded; no further errors are recorded after that.
    aborted: bool,
    /// Set when the sign of the next number literal was consumed as a subtraction.
    negate_literal: bool,
}

impl<'a> Rules<'_, 'a> {
    fn report(&mut self, error: ParseError) {
        if !self.aborted {
            self.tokens.report(error);
        }
    }

    fn report_at_current(&mut self, kind: ErrorKind) {
        let error = kind.with_span(self.tokens.current());
        self.report(error);
    }

    /// Reports that the current token is unexpected. Tokens other than the end of input
    /// are consumed.
    fn unexpected(&mut self, expected: &'static str) -> Expr {
        if self.tokens.current().extra == TokenKind::End {
            self.report_at_current(ErrorKind::UnexpectedEnd { expected });
        } else {
            self.report_at_current(ErrorKind::UnexpectedToken { expected });
            self.tokens.consume();
        }
        Expr::Constant(f64::NAN)
    }

    fn expect(&mut self, symbol: Symbol, expected: &'static str) {
        if self.tokens.eat(symbol).is_some() {
            return;
        }
        let kind = if self.tokens.current().extra == TokenKind::End {
            ErrorKind::UnexpectedEnd { expected }
        } else {
            ErrorKind::UnexpectedToken { expected }
        };
        self.report_at_current(kind);
    }

    fn nested(&mut self, rule: impl FnOnce(&mut Self) -> Expr) -> Expr {
        if self.depth >= self.max_depth {
            if !self.aborted {
                self.report_at_current(ErrorKind::NestingTooDeep {
                    limit: self.max_depth,
                });
                self.aborted = true;
            }
            self.tokens.skip_to_end();
            return Expr::Constant(f64::NAN);
        }

        self.depth += 1;
        let expr = rule(self);
        self.depth -= 1;
        expr
    }

    fn current_op(&self, priority: OpPriority) -> Option<BinaryOp> {
        let TokenKind::Symbol(symbol) = self.tokens.current().extra else {
            return None;
        };
        binary_op(symbol).filter(|op| op.priority() == priority)
    }

    /// Parses a chain of operations with the same priority, such as `a - b + c`.
    /// Chains are parsed in a loop, so their length does not count towards the nesting depth.
    fn chain(&mut self, priority: OpPriority, operand: fn(&mut Self) -> Expr) -> Expr {
        let mut lhs = operand(self);
        while let Some(op) = self.current_op(priority) {
            self.tokens.consume();
            let rhs = operand(self);
            lhs = reorder(lhs, op, rhs);
        }
        lhs
    }

    fn expression(&mut self) -> Expr {
        self.nested(|this| this.chain(OpPriority::Logical, Self::relational))
    }

    fn relational(&mut self) -> Expr {
        self.nested(|this| this.chain(OpPriority::Comparison, Self::term))
    }

    fn term(&mut self) -> Expr {
        self.nested(|this| {
            let mut lhs = this.product();
            loop {
                let op = if let Some(op) = this.current_op(OpPriority::AddOrSub) {
                    this.tokens.consume();
                    op
                } else if this.at_negative_number() {
                    // `x -2` is `x - 2`: the sign glued to the literal acts as the operation.
                    this.negate_literal = true;
                    BinaryOp::Sub
                } else {
                    return lhs;
                };
                let rhs = this.product();
                lhs = reorder(lhs, op, rhs);
            }
        })
    }

    fn at_negative_number(&self) -> bool {
        let current = self.tokens.current();
        matches!(current.extra, TokenKind::Number(_)) && current.fragment().starts_with('-')
    }

    fn product(&mut self) -> Expr {
        self.nested(|this| {
            let mut lhs = this.percent_operand();
            while let Some(op) = this.current_op(OpPriority::MulOrDiv) {
                this.tokens.consume();
                let rhs = this.percent_operand();
                lhs = reorder(lhs, op, rhs);
            }
            lhs
        })
    }

    fn percent_operand(&mut self) -> Expr {
        let mut operand = self.power();
        while self.at_percent() {
            let percent = self.tokens.consume();
            if self.features.contains(Features::PERCENT) {
                operand = Expr::binary(BinaryOp::Mul, operand, Expr::Constant(0.01)).sealed();
            } else {
                self.report(ErrorKind::DisabledFeature("Percent operations").with_span(&percent));
            }
        }
        operand
    }

    fn at_percent(&self) -> bool {
        self.tokens.is_at(Symbol::Percent)
            && !matches!(self.tokens.next().extra, TokenKind::Number(_))
    }

    fn power(&mut self) -> Expr {
        self.nested(|this| this.chain(OpPriority::Power, Self::atom))
    }

    fn atom(&mut self) -> Expr {
        self.nested(|this| {
            let token = *this.tokens.current();
            match token.extra {
                TokenKind::Number(value) => this.literal(value),
                TokenKind::Ident => {
                    if this.tokens.next().extra == TokenKind::Symbol(Symbol::LeftParen) {
                        this.call()
                    } else {
                        this.tokens.consume();
                        Expr::Variable((*token.fragment()).to_owned())
                    }
                }
                TokenKind::Symbol(Symbol::Minus) => {
                    this.tokens.consume();
                    let operand = this.atom();
                    Expr::binary(BinaryOp::Sub, Expr::Constant(0.0), operand).sealed()
                }
                TokenKind::Symbol(Symbol::Plus) => {
                    this.tokens.consume();
                    match this.tokens.current().extra {
                        TokenKind::Number(value) => this.literal(value),
                        TokenKind::Symbol(Symbol::LeftParen) => this.parenthesized(),
                        _ => this.unexpected("number or `(`"),
                    }
                }
                TokenKind::Symbol(Symbol::LeftParen) => this.parenthesized(),
                TokenKind::Symbol(Symbol::Bar) => this.abs_value(),
                _ => this.unexpected(ATOM),
            }
        })
    }

    fn literal(&mut self, mut value: f64) -> Expr {
        let number = self.tokens.consume();
        if mem::take(&mut self.negate_literal) {
            value = -value;
        }
        let suffix = *self.tokens.current();
        if suffix.extra == TokenKind::Ident && suffix.location_offset() == number.end_offset() {
            self.tokens.consume();
            if !self.features.contains(Features::QUANTIFIERS) {
                self.report(ErrorKind::DisabledFeature("Quantifiers").with_span(&suffix));
            } else if let Some(factor) = quantifier(suffix.fragment()) {
                value *= factor;
            } else {
                let suffix_str = (*suffix.fragment()).to_owned();
                self.report(ErrorKind::UnknownQuantifier(suffix_str).with_span(&suffix));
            }
        }
        Expr::Constant(value)
    }

    fn parenthesized(&mut self) -> Expr {
        self.tokens.consume();
        let inner = self.expression();
        self.expect(Symbol::RightParen, "`)`");
        inner.sealed()
    }

    fn abs_value(&mut self) -> Expr {
        let bar = self.tokens.consume();
        if !self.features.contains(Features::ABS_BARS) {
            self.report(ErrorKind::DisabledFeature("Absolute value bars").with_span(&bar));
        }
        let inner = self.expression();
        self.expect(Symbol::Bar, "closing `|`");
        Expr::Call {
            function: fns::abs(),
            args: vec![inner],
        }
    }

    fn call(&mut self) -> Expr {
        let name = self.tokens.consume();
        self.tokens.consume(); // `(`

        let mut args = vec![];
        if self.tokens.eat(Symbol::RightParen).is_none() {
            loop {
                args.push(self.expression());
                if self.tokens.eat(Symbol::Comma).is_none() {
                    break;
                }
            }
            self.expect(Symbol::RightParen, "`,` or `)`");
        }
        self.resolve_call(&name, args)
    }

    fn resolve_call(&mut self, name: &Token<'a>, args: Vec<Expr>) -> Expr {
        let functions = self.functions;
        let Some(function) = functions.get(name.fragment()) else {
            let name_str = (*name.fragment()).to_owned();
            self.report(ErrorKind::UnknownFunction(name_str).with_span(name));
            return Expr::Constant(f64::NAN);
        };

        if let Arity::Exact(expected) = function.arity() {
            if expected != args.len() {
                let kind = ErrorKind::ArgsLenMismatch {
                    function: function.name().to_owned(),
                    expected,
                    actual: args.len(),
                };
                self.report(kind.with_span(name));
            }
        }
        Expr::Call {
            function: Arc::clone(function),
            args,
        }
    }
}
