//! Parameter markers of declared and named query text.

use crate::{
    error::ContributionError,
    method::RepositoryMethodDescriptor,
    query::{BindingTarget, LikeKind, ParameterBinding},
};
use convert_case::{Case, Casing};

///
/// Marker
/// One `:name`, `?n` or bare `?` occurrence in query text.
///

#[derive(Clone, Debug, Eq, PartialEq)]
struct Marker {
    target: BindingTarget,
    like: Option<LikeKind>,
}

///
/// ScannedQuery
///
/// Query text with LIKE wildcards around markers removed, plus the markers
/// in order of first appearance.
///

#[derive(Debug)]
struct ScannedQuery {
    text: String,
    markers: Vec<Marker>,
}

/// Rewrite declared query text and bind its markers to method parameters.
pub(super) fn bind_declared(
    text: &str,
    method: &RepositoryMethodDescriptor,
) -> Result<(String, Vec<ParameterBinding>), ContributionError> {
    let scanned = scan(text);

    let named = scanned
        .markers
        .iter()
        .any(|m| matches!(m.target, BindingTarget::Named(_)));
    let positional = scanned
        .markers
        .iter()
        .any(|m| matches!(m.target, BindingTarget::Position(_)));
    if named && positional {
        return Err(ContributionError::query_invalid(format!(
            "query mixes named and positional parameters: '{text}'"
        )));
    }

    let bindable: Vec<_> = method.bindable_parameters().collect();
    let mut bindings: Vec<ParameterBinding> = Vec::new();

    for marker in scanned.markers {
        let origin = match &marker.target {
            BindingTarget::Named(name) => bindable
                .iter()
                .find(|(_, p)| parameter_matches(&p.name, name))
                .map(|(i, _)| *i)
                .ok_or_else(|| {
                    ContributionError::query_invalid(format!(
                        "no method parameter bound to ':{name}' in '{}'",
                        method.name
                    ))
                })?,
            BindingTarget::Position(position) => bindable
                .get(position.saturating_sub(1))
                .map(|(i, _)| *i)
                .ok_or_else(|| {
                    ContributionError::query_invalid(format!(
                        "positional parameter ?{position} exceeds the {} bindable parameter(s) of '{}'",
                        bindable.len(),
                        method.name
                    ))
                })?,
        };

        if let Some(existing) = bindings.iter().find(|b| b.target == marker.target) {
            if existing.like != marker.like {
                return Err(ContributionError::query_invalid(format!(
                    "parameter {} is used with conflicting LIKE patterns",
                    describe(&marker.target)
                )));
            }
            continue;
        }

        bindings.push(ParameterBinding {
            target: marker.target,
            origin,
            like: marker.like,
        });
    }

    Ok((scanned.text, bindings))
}

fn describe(target: &BindingTarget) -> String {
    match target {
        BindingTarget::Named(name) => format!(":{name}"),
        BindingTarget::Position(position) => format!("?{position}"),
    }
}

// Markers use the camelCase form; Rust parameters are snake_case.
fn parameter_matches(parameter: &str, marker: &str) -> bool {
    parameter == marker || parameter.to_case(Case::Camel) == marker
}

fn scan(text: &str) -> ScannedQuery {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut markers = Vec::new();
    let mut next_position = 0;
    let mut in_literal = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            in_literal = !in_literal;
            out.push(c);
            i += 1;
            continue;
        }
        if in_literal {
            out.push(c);
            i += 1;
            continue;
        }

        let leading = c == '%' && matches!(chars.get(i + 1), Some(':' | '?'));
        let start = if leading { i + 1 } else { i };

        let Some((target, end)) = read_marker(&chars, start, &mut next_position) else {
            out.push(c);
            i += 1;
            continue;
        };

        let trailing = chars.get(end) == Some(&'%');
        let like = match (leading, trailing) {
            (true, true) => Some(LikeKind::Containing),
            (true, false) => Some(LikeKind::EndingWith),
            (false, true) => Some(LikeKind::StartingWith),
            (false, false) => None,
        };

        out.extend(&chars[start..end]);
        markers.push(Marker { target, like });
        i = if trailing { end + 1 } else { end };
    }

    ScannedQuery { text: out, markers }
}

// Read a marker starting at `at`, returning it and the index just past it.
fn read_marker(
    chars: &[char],
    at: usize,
    next_position: &mut usize,
) -> Option<(BindingTarget, usize)> {
    match chars.get(at)? {
        // `::` is a native cast, not a marker.
        ':' if at > 0 && chars[at - 1] == ':' => None,
        ':' => {
            let first = *chars.get(at + 1)?;
            if !(first.is_ascii_alphabetic() || first == '_') {
                return None;
            }
            let end = (at + 1..chars.len())
                .find(|&j| !(chars[j].is_ascii_alphanumeric() || chars[j] == '_'))
                .unwrap_or(chars.len());
            let name: String = chars[at + 1..end].iter().collect();
            Some((BindingTarget::Named(name), end))
        }
        '?' => {
            let end = (at + 1..chars.len())
                .find(|&j| !chars[j].is_ascii_digit())
                .unwrap_or(chars.len());
            let position = if end == at + 1 {
                *next_position += 1;
                *next_position
            } else {
                chars[at + 1..end].iter().collect::<String>().parse().ok()?
            };
            Some((BindingTarget::Position(position), end))
        }
        _ => None,
    }
}
