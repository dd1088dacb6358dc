//! Placeholder scanner.
//!
//! Turns a template string into a flat list of literal text and placeholder
//! segments. Placeholders borrow from the template; nothing is allocated per
//! segment.
//!
//! Accepted forms (first match wins):
//!
//! - `{baseline.<factor>.<agg>[:spec]}[unit]`
//! - `{<name>[:spec]}[unit]`
//! - `{<factor>.<field>[:spec]}[unit]`
//!
//! A bare name whose spec is not a valid format spec yields to the shock form
//! when that also matches, so factor names may contain `: `.
//!
//! Anything else between braces is kept as literal text.

use super::format_spec::FormatSpec;

/// Unit tokens recognised immediately after a placeholder's closing brace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Percent,
    Bps,
    Ppts,
    Pts,
}

impl Unit {
    // Order matters: `ppts` must be tried before `pts`.
    const ALL: [Unit; 4] = [Unit::Percent, Unit::Bps, Unit::Ppts, Unit::Pts];

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Percent => "%",
            Unit::Bps => "bps",
            Unit::Ppts => "ppts",
            Unit::Pts => "pts",
        }
    }

    fn strip_from(s: &str) -> Option<(Unit, &str)> {
        Self::ALL
            .into_iter()
            .find_map(|unit| s.strip_prefix(unit.as_str()).map(|rest| (unit, rest)))
    }
}

/// Namespace token for the secondary (baseline path) series.
pub const BASELINE_NAMESPACE: &str = "baseline";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// A field of a factor's shock result.
    Shock { factor: &'a str, field: &'a str },
    /// An aggregate over a factor's baseline path column.
    Baseline { factor: &'a str, agg: &'a str },
    /// A caller-supplied named value.
    Local { name: &'a str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub reference: Reference<'a>,
    pub spec: Option<&'a str>,
    pub unit: Option<Unit>,
    /// The exact source text, unit included.
    pub raw: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Placeholder(Placeholder<'a>),
}

/// Split a template into text and placeholder segments, left to right.
pub fn parse(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find('{') {
        let open = cursor + offset;
        match parse_placeholder(&template[open..]) {
            Some((placeholder, len)) => {
                if open > text_start {
                    segments.push(Segment::Text(&template[text_start..open]));
                }
                segments.push(Segment::Placeholder(placeholder));
                cursor = open + len;
                text_start = cursor;
            }
            None => cursor = open + 1,
        }
    }

    if text_start < template.len() {
        segments.push(Segment::Text(&template[text_start..]));
    }
    segments
}

/// Parse one placeholder at the start of `s` (which begins with `{`).
///
/// Returns the placeholder and the number of bytes it spans.
fn parse_placeholder(s: &str) -> Option<(Placeholder<'_>, usize)> {
    let body = s.strip_prefix('{')?;
    let (reference, after_ref) = parse_baseline(body)
        .or_else(|| match (parse_local(body), parse_shock(body)) {
            (Some(local), Some(shock)) if !has_valid_spec(local.1) => Some(shock),
            (local, shock) => local.or(shock),
        })?;

    let (spec, after_spec) = match after_ref.strip_prefix(':') {
        Some(rest) => {
            let close = rest.find('}')?;
            if close == 0 {
                return None;
            }
            (Some(&rest[..close]), &rest[close..])
        }
        None => (None, after_ref),
    };
    let after_close = after_spec.strip_prefix('}')?;

    let (unit, rest) = match Unit::strip_from(after_close) {
        Some((unit, rest)) => (Some(unit), rest),
        None => (None, after_close),
    };

    let len = s.len() - rest.len();
    Some((
        Placeholder {
            reference,
            spec,
            unit,
            raw: &s[..len],
        },
        len,
    ))
}

fn parse_baseline(body: &str) -> Option<(Reference<'_>, &str)> {
    let rest = body.strip_prefix(BASELINE_NAMESPACE)?.strip_prefix('.')?;
    let (factor, rest) = take_factor(rest)?;
    let rest = rest.strip_prefix('.')?;
    let (agg, rest) = take_field(rest)?;
    Some((Reference::Baseline { factor, agg }, rest))
}

fn parse_shock(body: &str) -> Option<(Reference<'_>, &str)> {
    let (factor, rest) = take_factor(body)?;
    let rest = rest.strip_prefix('.')?;
    let (field, rest) = take_field(rest)?;
    Some((Reference::Shock { factor, field }, rest))
}

/// A bare name must be followed directly by its spec or the closing brace.
fn parse_local(body: &str) -> Option<(Reference<'_>, &str)> {
    let (name, rest) = take_field(body)?;
    rest.starts_with([':', '}'])
        .then_some((Reference::Local { name }, rest))
}

/// `rest` starts right after a bare name: either `}` or `:<spec>}`.
fn has_valid_spec(rest: &str) -> bool {
    match rest.strip_prefix(':') {
        Some(spec) => spec
            .find('}')
            .is_some_and(|close| FormatSpec::parse(&spec[..close]).is_ok()),
        None => true,
    }
}

/// Factor names: anything except `.`, `{` and `}` (spaces and punctuation allowed).
fn take_factor(s: &str) -> Option<(&str, &str)> {
    let end = s.find(['.', '{', '}']).unwrap_or(s.len());
    (end > 0).then(|| s.split_at(end))
}

/// Field names: lowercase ASCII letters and underscores.
fn take_field(s: &str) -> Option<(&str, &str)> {
    let end = s
        .find(|c: char| !(c.is_ascii_lowercase() || c == '_'))
        .unwrap_or(s.len());
    (end > 0).then(|| s.split_at(end))
}
