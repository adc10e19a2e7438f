//! Locations of tokens and errors in the parsed text.

use nom::Slice;

/// Input of the tokenizer.
pub type InputSpan<'a> = nom_locate::LocatedSpan<&'a str, ()>;
/// Tokenizer outcome generalized by the type returned on success.
pub(crate) type NomResult<'a, T> = nom::IResult<InputSpan<'a>, T>;

/// Fragment of the parsed text together with its location and an attached payload.
///
/// Unlike spans from [`nom_locate`], this type does not give access to the surrounding text,
/// so the fragment can be replaced with an owned copy. That is how parse errors outlive
/// the text they were produced for.
///
/// [`nom_locate`]: https://crates.io/crates/nom_locate
#[derive(Debug, Clone, Copy)]
pub struct LocatedSpan<Span, T = ()> {
    offset: usize,
    line: u32,
    column: usize,
    fragment: Span,

    /// Payload attached to the fragment, e.g. a token kind.
    pub extra: T,
}

impl<Span: PartialEq, T> PartialEq for LocatedSpan<Span, T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.fragment == other.fragment
    }
}

impl<Span, T> LocatedSpan<Span, T> {
    /// Byte offset of the fragment start, starting from 0.
    pub fn location_offset(&self) -> usize {
        self.offset
    }

    /// Line of the fragment start, starting from 1.
    pub fn location_line(&self) -> u32 {
        self.line
    }

    /// Column of the fragment start in chars, starting from 1.
    pub fn get_column(&self) -> usize {
        self.column
    }

    /// Spanned text.
    pub fn fragment(&self) -> &Span {
        &self.fragment
    }

    pub(crate) fn map_fragment<U>(self, map_fn: impl FnOnce(Span) -> U) -> LocatedSpan<U, T> {
        LocatedSpan {
            offset: self.offset,
            line: self.line,
            column: self.column,
            fragment: map_fn(self.fragment),
            extra: self.extra,
        }
    }
}

impl<Span: Copy, T> LocatedSpan<Span, T> {
    /// Copies the location of this span, replacing the payload.
    pub fn copy_with_extra<U>(&self, extra: U) -> LocatedSpan<Span, U> {
        LocatedSpan {
            offset: self.offset,
            line: self.line,
            column: self.column,
            fragment: self.fragment,
            extra,
        }
    }
}

/// Fragment borrowed from the parsed text.
pub type Spanned<'a, T = ()> = LocatedSpan<&'a str, T>;

impl<'a, T> Spanned<'a, T> {
    pub(crate) fn new(span: InputSpan<'a>, extra: T) -> Self {
        Self {
            offset: span.location_offset(),
            line: span.location_line(),
            column: span.get_column(),
            fragment: *span.fragment(),
            extra,
        }
    }

    /// Offset of the first byte after this span.
    pub(crate) fn end_offset(&self) -> usize {
        self.offset + self.fragment.len()
    }
}

impl<'a> Spanned<'a> {
    /// Creates a span covering `range` of the provided `text`.
    pub fn from_str<R>(text: &'a str, range: R) -> Self
    where
        InputSpan<'a>: Slice<R>,
    {
        Self::new(InputSpan::new(text).slice(range), ())
    }
}

/// Span owning a copy of its fragment.
pub type OwnedSpan<T = ()> = LocatedSpan<String, T>;

/// Runs a tokenizer combinator and records the span of the consumed input.
pub(crate) fn with_span<'a, O>(
    mut tokenizer: impl FnMut(InputSpan<'a>) -> NomResult<'a, O>,
) -> impl FnMut(InputSpan<'a>) -> NomResult<'a, Spanned<'a, O>> {
    move |input: InputSpan<'a>| {
        let (rest, output) = tokenizer(input)?;
        let len = rest.location_offset() - input.location_offset();
        Ok((rest, Spanned::new(input.slice(..len), output)))
    }
}
