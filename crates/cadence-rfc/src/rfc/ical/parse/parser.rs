//! iCalendar document parser (RFC 5545).
//!
//! Builds the component tree from content lines. Property values stay raw;
//! the codec interprets the ones it needs.

use std::iter::Peekable;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{parse_content_line, split_lines};
use crate::rfc::ical::core::{Component, ComponentKind, Property};

/// Parses an iCalendar document into its root VCALENDAR component.
///
/// ## Errors
///
/// Returns an error if the input is not a well-formed VCALENDAR.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> ParseResult<Component> {
    tracing::debug!("Parsing iCalendar document");

    let lines = split_lines(input);

    if lines.is_empty() {
        tracing::warn!("Empty iCalendar input");
        return Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1));
    }

    tracing::trace!(count = lines.len(), "Split lines");

    let content_lines: Vec<(usize, Property)> = lines
        .into_iter()
        .map(|(line_num, line)| parse_content_line(&line, line_num).map(|cl| (line_num, cl)))
        .collect::<ParseResult<_>>()?;

    let mut iter = content_lines.into_iter().peekable();

    let (line_num, begin) = iter
        .next()
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingBegin, 1, 1))?;
    if begin.name != "BEGIN" {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, line_num, 1));
    }

    let root = parse_component(&mut iter, line_num, &begin.value)?;

    // Verify it's a VCALENDAR
    if root.kind != Some(ComponentKind::Calendar) {
        tracing::warn!(name = %root.name, "Root component is not VCALENDAR");
        return Err(
            ParseError::new(ParseErrorKind::MissingBegin, line_num, 1)
                .with_context("expected VCALENDAR"),
        );
    }

    if let Some((trailing, _)) = iter.next() {
        return Err(ParseError::new(ParseErrorKind::InvalidContentLine, trailing, 1)
            .with_context("content after END:VCALENDAR"));
    }

    tracing::debug!(events = root.events().len(), "iCalendar document parsed");

    Ok(root)
}

/// Parses the body of a component whose BEGIN line was already consumed.
fn parse_component(
    iter: &mut Peekable<impl Iterator<Item = (usize, Property)>>,
    begin_line_num: usize,
    name: &str,
) -> ParseResult<Component> {
    let mut component = Component::named(name);
    component.line = begin_line_num;
    let mut last_line_num = begin_line_num;

    loop {
        let Some((line_num, content_line)) = iter.next() else {
            return Err(
                ParseError::new(ParseErrorKind::MissingEnd, last_line_num, 1)
                    .with_context(format!("missing END:{}", component.name)),
            );
        };
        last_line_num = line_num;

        match content_line.name.as_str() {
            "BEGIN" => {
                let nested = parse_component(iter, line_num, &content_line.value)?;
                component.add_child(nested);
            }
            "END" => {
                let end_name = content_line.value.to_ascii_uppercase();
                if end_name != component.name {
                    return Err(
                        ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
                            .with_context(format!(
                                "expected END:{}, got END:{end_name}",
                                component.name
                            )),
                    );
                }
                return Ok(component);
            }
            _ => component.add_property(content_line),
        }
    }
}
