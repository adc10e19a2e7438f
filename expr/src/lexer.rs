//! Tokenizer splitting the input into numbers, identifiers and symbols.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char as tag_char, digit1, multispace0, one_of, satisfy},
    combinator::{map, opt, recognize},
    sequence::{pair, tuple},
    Slice,
};

use core::{fmt, mem};

use crate::{
    error::{ErrorKind, ParseError},
    spans::{with_span, InputSpan, NomResult, Spanned},
};

/// Operator or punctuation symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `^` or `**`
    Caret,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `|`
    Bar,
    /// `,`
    Comma,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `=`
    Eq,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `!=`
    NotEq,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl Symbol {
    /// Returns the canonical string representation of this symbol.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Caret => "^",
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::Bar => "|",
            Self::Comma => ",",
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

    fn from_fragment(fragment: &str) -> Self {
        match fragment {
            "+" => Self::Plus,
            "-" => Self::Minus,
            "*" => Self::Star,
            "/" => Self::Slash,
            "%" => Self::Percent,
            "^" | "**" => Self::Caret,
            "(" => Self::LeftParen,
            ")" => Self::RightParen,
            "|" => Self::Bar,
            "," => Self::Comma,
            "<" => Self::Lt,
            "<=" => Self::Le,
            "=" => Self::Eq,
            ">=" => Self::Ge,
            ">" => Self::Gt,
            "!=" => Self::NotEq,
            "&&" => Self::And,
            "||" => Self::Or,
            _ => unreachable!(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// Number literal, possibly with a leading `-` sign. Literals that cannot be represented
    /// are reported as errors and carry NaN.
    Number(f64),
    /// Identifier: a variable, function or quantifier name.
    Ident,
    /// Operator or punctuation.
    Symbol(Symbol),
    /// End of input.
    End,
}

/// Lexical unit together with its location in the code.
pub type Token<'a> = Spanned<'a, TokenKind>;

#[derive(Debug, Clone, Copy)]
enum RawToken {
    Number,
    Ident,
    Symbol,
}

/// Number literal, like `12`, `-3.25` or `0.5`. The leading `-` is only recognized
/// if it is directly followed by a digit.
fn number(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    recognize(tuple((
        opt(tag_char('-')),
        digit1,
        opt(pair(tag_char('.'), digit1)),
    )))(input)
}

/// Identifier, like `x`, `atan2` or `max_value`.
fn ident(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn symbol(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    alt((
        tag("**"),
        tag("<="),
        tag(">="),
        tag("!="),
        tag("&&"),
        tag("||"),
        recognize(one_of("+-*/%^()|,<=>")),
    ))(input)
}

fn raw_token(input: InputSpan<'_>) -> NomResult<'_, Spanned<'_, RawToken>> {
    with_span(alt((
        map(number, |_| RawToken::Number),
        map(ident, |_| RawToken::Ident),
        map(symbol, |_| RawToken::Symbol),
    )))(input)
}

/// Stream of tokens with two tokens of lookahead.
///
/// Tokens are scanned lazily. Lexical errors do not stop scanning: they are recorded
/// in the stream together with syntax errors reported by the parser.
#[derive(Debug)]
pub struct TokenStream<'a> {
    rest: InputSpan<'a>,
    current: Token<'a>,
    next: Token<'a>,
    errors: Vec<ParseError>,
}

impl<'a> TokenStream<'a> {
    /// Starts scanning the provided code.
    pub fn new(code: &'a str) -> Self {
        let mut rest = InputSpan::new(code);
        let mut errors = vec![];
        let current = scan(&mut rest, &mut errors);
        let next = scan(&mut rest, &mut errors);
        Self {
            rest,
            current,
            next,
            errors,
        }
    }

    /// Returns the current token.
    pub fn current(&self) -> &Token<'a> {
        &self.current
    }

    /// Returns the token after the current one.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> &Token<'a> {
        &self.next
    }

    /// Consumes the current token and returns it.
    pub fn consume(&mut self) -> Token<'a> {
        let scanned = scan(&mut self.rest, &mut self.errors);
        let next = mem::replace(&mut self.next, scanned);
        mem::replace(&mut self.current, next)
    }

    /// Checks whether the current token is the specified symbol.
    pub fn is_at(&self, symbol: Symbol) -> bool {
        self.current.extra == TokenKind::Symbol(symbol)
    }

    /// Consumes the current token if it is the specified symbol.
    pub fn eat(&mut self, symbol: Symbol) -> Option<Token<'a>> {
        if self.is_at(symbol) {
            Some(self.consume())
        } else {
            None
        }
    }

    /// Consumes all remaining tokens without reporting errors.
    pub fn skip_to_end(&mut self) {
        while self.current.extra != TokenKind::End {
            self.consume();
        }
    }

    /// Records an error.
    pub fn report(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Returns errors recorded so far.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Returns all recorded errors, consuming the stream.
    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }
}

fn scan<'a>(rest: &mut InputSpan<'a>, errors: &mut Vec<ParseError>) -> Token<'a> {
    loop {
        if let Ok((after_ws, _)) = multispace0::<_, nom::error::Error<_>>(*rest) {
            *rest = after_ws;
        }
        if rest.fragment().is_empty() {
            return Spanned::new(*rest, TokenKind::End);
        }

        if let Ok((remaining, raw)) = raw_token(*rest) {
            *rest = remaining;
            let kind = match raw.extra {
                RawToken::Number => {
                    if let Ok(value) = raw.fragment().parse::<f64>() {
                        TokenKind::Number(value)
                    } else {
                        errors.push(ErrorKind::InvalidNumber.with_span(&raw));
                        TokenKind::Number(f64::NAN)
                    }
                }
                RawToken::Ident => TokenKind::Ident,
                RawToken::Symbol => TokenKind::Symbol(Symbol::from_fragment(raw.fragment())),
            };
            return raw.copy_with_extra(kind);
        }

        let char_len = rest.fragment().chars().next().map_or(1, char::len_utf8);
        let bogus = Spanned::new(rest.slice(..char_len), ());
        log::trace!("skipping unexpected char at offset {}", bogus.location_offset());
        errors.push(ErrorKind::UnexpectedChar.with_span(&bogus));
        *rest = rest.slice(char_len..);
    }
}

/// Splits the code into tokens. The returned tokens always end with [`TokenKind::End`].
pub fn tokenize(code: &str) -> (Vec<Token<'_>>, Vec<ParseError>) {
    let mut stream = TokenStream::new(code);
    let mut tokens = vec![];
    loop {
        let token = stream.consume();
        let is_end = token.extra == TokenKind::End;
        tokens.push(token);
        if is_end {
            break (tokens, stream.into_errors());
        }
    }
}
