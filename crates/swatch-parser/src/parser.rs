//! Parser for JSONC token documents.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer) into
//! a [`Syntax`] value, which the [`tree`](super::tree) module lowers into the
//! arena-backed syntax tree. The public entry point is [`parse_document`].
//!
//! Trailing commas in objects and arrays are accepted.

use winnow::{
    Parser as _,
    combinator::{alt, opt, separated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    error::{Diagnostic, ErrorCode},
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// A parsed JSONC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Syntax {
    Object(Vec<SyntaxMember>),
    Array(Vec<Spanned<Syntax>>),
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
    Null,
}

/// How an object member's name was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    /// `"name": …`
    Quoted,
    /// `name: …`
    Bare,
}

/// One `name: value` pair of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxMember {
    pub name: Spanned<String>,
    pub style: NameStyle,
    pub value: Spanned<Syntax>,
}

impl SyntaxMember {
    /// Span from the name through the value.
    pub fn span(&self) -> Span {
        self.name.span().union(self.value.span())
    }
}

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) at error start position
    StartOffset(usize),
}

type Input<'t, 'src> = TokenSlice<'t, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

fn cut_err<'t, 'src, O, F>(input: &mut Input<'t, 'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'t, 'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

/// Parse a punctuation token, returning its span
fn punct<'t, 'src>(
    input: &mut Input<'t, 'src>,
    expected: fn(&Token<'_>) -> bool,
    label: &'static str,
) -> IResult<Span> {
    any.verify_map(|token: &PositionedToken<'_>| expected(&token.token).then_some(token.span))
        .context(Context::Label(label))
        .parse_next(input)
}

fn left_brace(input: &mut Input<'_, '_>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::LeftBrace), "`{`")
}

fn right_brace(input: &mut Input<'_, '_>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::RightBrace), "`}`")
}

fn left_bracket(input: &mut Input<'_, '_>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::LeftBracket), "`[`")
}

fn right_bracket(input: &mut Input<'_, '_>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::RightBracket), "`]`")
}

fn colon(input: &mut Input<'_, '_>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::Colon), "`:`")
}

fn comma(input: &mut Input<'_, '_>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::Comma), "`,`")
}

/// Parse a string, number, boolean or null
fn scalar(input: &mut Input<'_, '_>) -> IResult<Spanned<Syntax>> {
    any.verify_map(|token: &PositionedToken<'_>| {
        let syntax = match &token.token {
            Token::StringLiteral(s) => Syntax::String(s.clone()),
            Token::NumberLiteral(n) => Syntax::Number(n.parse().ok()?),
            Token::True => Syntax::Boolean(true),
            Token::False => Syntax::Boolean(false),
            Token::Null => Syntax::Null,
            _ => return None,
        };
        Some(Spanned::new(syntax, token.span))
    })
    .parse_next(input)
}

/// Parse a member name: a string literal or a bare identifier
fn member_name(input: &mut Input<'_, '_>) -> IResult<(Spanned<String>, NameStyle)> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::StringLiteral(s) => Some((Spanned::new(s.clone(), token.span), NameStyle::Quoted)),
        Token::Identifier(name) => Some((
            Spanned::new((*name).to_string(), token.span),
            NameStyle::Bare,
        )),
        // Keywords are valid bare names
        Token::True => Some((Spanned::new("true".to_string(), token.span), NameStyle::Bare)),
        Token::False => Some((Spanned::new("false".to_string(), token.span), NameStyle::Bare)),
        Token::Null => Some((Spanned::new("null".to_string(), token.span), NameStyle::Bare)),
        _ => None,
    })
    .context(Context::Label("member name"))
    .parse_next(input)
}

fn member(input: &mut Input<'_, '_>) -> IResult<SyntaxMember> {
    let (name, style) = member_name.parse_next(input)?;

    cut_err(input, |input| {
        colon.parse_next(input)?;
        let value = value.parse_next(input)?;
        Ok(SyntaxMember { name, style, value })
    })
}

fn object(input: &mut Input<'_, '_>) -> IResult<Spanned<Syntax>> {
    let open = left_brace.parse_next(input)?;

    cut_err(input, |input| {
        let members: Vec<SyntaxMember> = separated(0.., member, comma).parse_next(input)?;
        opt(comma).parse_next(input)?;
        let close = right_brace.parse_next(input)?;
        Ok(Spanned::new(Syntax::Object(members), open.union(close)))
    })
}

fn array(input: &mut Input<'_, '_>) -> IResult<Spanned<Syntax>> {
    let open = left_bracket.parse_next(input)?;

    cut_err(input, |input| {
        let elements: Vec<Spanned<Syntax>> = separated(0.., value, comma).parse_next(input)?;
        opt(comma).parse_next(input)?;
        let close = right_bracket.parse_next(input)?;
        Ok(Spanned::new(Syntax::Array(elements), open.union(close)))
    })
}

fn value(input: &mut Input<'_, '_>) -> IResult<Spanned<Syntax>> {
    alt((object, array, scalar))
        .context(Context::Label("value"))
        .parse_next(input)
}

/// Convert a winnow error into a diagnostic pointing at the offending token.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let end_offset = tokens.len() - current_remaining;

    let context = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    // Out of tokens: the document ended early
    let Some(found) = tokens.get(end_offset) else {
        let span = tokens.last().map(|t| t.span).unwrap_or_default();
        return Diagnostic::error("unexpected end of input")
            .with_code(ErrorCode::E006)
            .with_label(span, ErrorCode::E006.description())
            .with_help("the document ends before its last value is complete");
    };

    // The innermost label names what was expected at this position
    let expected = context.context().find_map(|ctx| match ctx {
        Context::Label(label) => Some(*label),
        Context::StartOffset(_) => None,
    });

    let message = match expected {
        Some(expected) => format!("unexpected token {}, expected {expected}", found.token),
        None => format!("unexpected token {}", found.token),
    };

    Diagnostic::error(message)
        .with_code(ErrorCode::E002)
        .with_label(found.span, ErrorCode::E002.description())
}

/// Parse a token stream into a single document value.
///
/// Whitespace and comment tokens are dropped first. The whole stream must
/// form exactly one value.
pub fn parse_document(tokens: &[PositionedToken<'_>]) -> Result<Spanned<Syntax>, Diagnostic> {
    let tokens: Vec<PositionedToken<'_>> = tokens
        .iter()
        .filter(|t| !t.token.is_trivia())
        .cloned()
        .collect();
    let mut token_slice = TokenSlice::new(&tokens);

    match value.parse_next(&mut token_slice) {
        Ok(document) => match token_slice.eof_offset() {
            0 => Ok(document),
            remaining => {
                let trailing = &tokens[tokens.len() - remaining];
                Err(Diagnostic::error(format!(
                    "unexpected token {} after the document value",
                    trailing.token
                ))
                .with_code(ErrorCode::E002)
                .with_label(trailing.span, ErrorCode::E002.description())
                .with_secondary_label(document.span(), "document ends here"))
            }
        },
        Err(e) => {
            let current_remaining = token_slice.eof_offset();
            Err(convert_error(e, &tokens, current_remaining))
        }
    }
}
