//! Text-kernel (KPL) assignment parser.
//!
//! SPICE text kernels interleave free comment text with data blocks:
//!
//! ```text
//! KPL/FK
//!
//! Anything outside a data block is commentary.
//!
//! \begindata
//!
//!    FRAME_ROVER          = 1500001
//!    FRAME_1500001_NAME   = 'ROVER'
//!    FRAME_1500001_ANGLES = ( 30.0, 0.0, 0.0 )
//!
//! \begintext
//! ```
//!
//! This module extracts the assignments from the `\begindata` blocks. An
//! assignment is `NAME = value` or `NAME += value`; a value is a number, a
//! quoted string (with `''` escaping an embedded quote), or a parenthesized
//! vector of either, separated by commas and/or whitespace. Vectors may span
//! lines. Mixing numbers and strings in one vector is rejected.
//!
//! Parsing uses `nom` string combinators; block handling is line-oriented so
//! comment text never reaches the grammar.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map},
    multi::separated_list1,
    number::complete::double,
    IResult, Parser,
};

use crate::errors::SpiceError;
use crate::kernel_pool::PoolValue;

/// Assignment operator: plain set or `+=` append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Append,
}

/// One parsed text-kernel assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub op: AssignOp,
    pub value: PoolValue,
}

/// Extract every assignment from the `\begindata` blocks of `text`.
///
/// Return
/// ----------
/// * The assignments in file order, or [`SpiceError::NomParsingError`] /
///   [`SpiceError::InvalidArgument`] on malformed content.
pub fn parse_assignments(text: &str) -> Result<Vec<Assignment>, SpiceError> {
    let mut assignments = Vec::new();
    let mut in_data = false;
    let mut pending = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed == r"\begindata" {
            in_data = true;
            continue;
        }
        if trimmed == r"\begintext" {
            if !pending.is_empty() {
                return Err(SpiceError::NomParsingError(format!(
                    "unterminated assignment: {pending}"
                )));
            }
            in_data = false;
            continue;
        }
        if !in_data || trimmed.is_empty() {
            continue;
        }

        if !pending.is_empty() {
            pending.push(' ');
        }
        pending.push_str(trimmed);

        // Vectors continue on following lines until parens balance.
        if parens_balanced(&pending) {
            assignments.push(parse_assignment(&pending)?);
            pending.clear();
        }
    }

    if !pending.is_empty() {
        return Err(SpiceError::NomParsingError(format!(
            "unterminated assignment: {pending}"
        )));
    }
    Ok(assignments)
}

/// Count parenthesis nesting outside quoted strings.
fn parens_balanced(text: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_quote = false;
    for c in text.chars() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth -= 1,
            _ => {}
        }
    }
    depth == 0 && !in_quote
}

#[derive(Debug, Clone, PartialEq)]
enum TkElement {
    Numeric(f64),
    Text(String),
}

fn parse_assignment(input: &str) -> Result<Assignment, SpiceError> {
    let (_, (name, op, elements)) = all_consuming(assignment).parse(input)?;

    let value = if elements.iter().all(|e| matches!(e, TkElement::Numeric(_))) {
        PoolValue::Numeric(
            elements
                .into_iter()
                .map(|e| match e {
                    TkElement::Numeric(v) => v,
                    TkElement::Text(_) => unreachable!(),
                })
                .collect(),
        )
    } else if elements.iter().all(|e| matches!(e, TkElement::Text(_))) {
        PoolValue::Text(
            elements
                .into_iter()
                .map(|e| match e {
                    TkElement::Text(v) => v,
                    TkElement::Numeric(_) => unreachable!(),
                })
                .collect(),
        )
    } else {
        return Err(SpiceError::InvalidArgument(format!(
            "variable {name} mixes numeric and text values"
        )));
    };

    Ok(Assignment {
        name: name.to_string(),
        op,
        value,
    })
}

fn assignment(input: &str) -> IResult<&str, (&str, AssignOp, Vec<TkElement>)> {
    let (input, _) = multispace0(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, op) = alt((
        map(tag("+="), |_| AssignOp::Append),
        map(tag("="), |_| AssignOp::Set),
    ))
    .parse(input)?;
    let (input, _) = multispace0(input)?;
    let (input, elements) = alt((vector, map(element, |e| vec![e]))).parse(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, (name, op, elements)))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-').parse(input)
}

fn vector(input: &str) -> IResult<&str, Vec<TkElement>> {
    let (input, _) = char('(').parse(input)?;
    let (input, _) = multispace0(input)?;
    let (input, elements) = separated_list1(separator, element).parse(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')').parse(input)?;
    Ok((input, elements))
}

fn separator(input: &str) -> IResult<&str, ()> {
    alt((
        map((multispace0, char(','), multispace0), |_| ()),
        map(multispace1, |_| ()),
    ))
    .parse(input)
}

fn element(input: &str) -> IResult<&str, TkElement> {
    alt((
        map(quoted_string, TkElement::Text),
        map(double, TkElement::Numeric),
    ))
    .parse(input)
}

/// Single-quoted string; `''` escapes an embedded quote.
fn quoted_string(input: &str) -> IResult<&str, String> {
    let (mut rest, _) = char('\'').parse(input)?;
    let mut out = String::new();
    loop {
        match rest.find('\'') {
            None => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    rest,
                    nom::error::ErrorKind::Char,
                )))
            }
            Some(idx) => {
                out.push_str(&rest[..idx]);
                rest = &rest[idx + 1..];
                if let Some(stripped) = rest.strip_prefix('\'') {
                    out.push('\'');
                    rest = stripped;
                } else {
                    return Ok((rest, out));
                }
            }
        }
    }
}
