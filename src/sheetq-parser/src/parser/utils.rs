//! Shared parser helpers

use nom::{
    bytes::complete::tag_no_case,
    character::complete::{multispace0, satisfy},
    combinator::{map, not},
    sequence::terminated,
    IResult, Parser,
};

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Parse a keyword (case-insensitive), ensuring it's not followed by identifier characters
pub(crate) fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input| terminated(tag_no_case(word), not(satisfy(is_ident_char))).parse(input)
}

/// Parse optional whitespace including newlines
pub(crate) fn ws(input: &str) -> IResult<&str, ()> {
    map(multispace0, |_| ()).parse(input)
}
