//! JSON Pointer (RFC 6901) addressing for tree paths.

use thiserror::Error;

use crate::value::PathStep;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("pointer must be empty or start with '/'")]
    MissingLeadingSlash,
    #[error("invalid escape sequence in component {0:?}")]
    InvalidEscape(String),
}

/// Parses a pointer into key steps.
///
/// Every component becomes [`PathStep::Key`]; sequence nodes interpret
/// numeric keys as indices and `-` as append when the step is applied.
///
/// ```
/// use onstate::pointer::parse_pointer;
/// use onstate::PathStep;
///
/// let steps = parse_pointer("/b/x~1y/0").unwrap();
/// assert_eq!(steps, vec![
///     PathStep::Key("b".into()),
///     PathStep::Key("x/y".into()),
///     PathStep::Key("0".into()),
/// ]);
/// ```
pub fn parse_pointer(pointer: &str) -> Result<Vec<PathStep>, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(PointerError::MissingLeadingSlash);
    };
    rest.split('/')
        .map(|component| unescape(component).map(PathStep::Key))
        .collect()
}

/// Formats steps back into a pointer string.
pub fn format_pointer(path: &[PathStep]) -> String {
    let mut out = String::new();
    for step in path {
        out.push('/');
        out.push_str(&step.to_string().replace('~', "~0").replace('/', "~1"));
    }
    out
}

fn unescape(component: &str) -> Result<String, PointerError> {
    if !component.contains('~') {
        return Ok(component.to_string());
    }
    let mut out = String::with_capacity(component.len());
    let mut chars = component.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return Err(PointerError::InvalidEscape(component.to_string())),
        }
    }
    Ok(out)
}
