use crate::error::ContributionError;
use convert_case::{Case, Casing};

const SELECT_PREFIXES: [&str; 6] = ["find", "read", "get", "query", "search", "stream"];

///
/// SubjectKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubjectKind {
    Select,
    Count,
    Exists,
    Delete,
}

///
/// Subject
///
/// Leading part of a derived method name: `find`, `countDistinct`,
/// `findFirst3`, ... up to the first `By`. The remainder is the predicate
/// source handed to `PartTree`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subject {
    pub kind: SubjectKind,
    pub distinct: bool,
    pub max_results: Option<u32>,
    pub predicate: String,
}

impl Subject {
    pub fn parse(method_name: &str) -> Result<Self, ContributionError> {
        let name = derived_method_name(method_name);

        let (kind, rest) = split_prefix(&name).ok_or_else(|| {
            ContributionError::query_invalid(format!(
                "cannot derive a query from method name '{method_name}': unknown subject prefix"
            ))
        })?;

        let (subject, predicate) = match find_by(rest) {
            Some(at) => (&rest[..at], &rest[at + 2..]),
            None => (rest, ""),
        };

        let distinct = subject.contains("Distinct");
        let max_results = parse_limit(subject).map_err(|digits| {
            ContributionError::query_invalid(format!(
                "invalid result limit '{digits}' in method name '{method_name}'"
            ))
        })?;

        if max_results.is_some() && !matches!(kind, SubjectKind::Select) {
            return Err(ContributionError::query_invalid(format!(
                "result limits are only supported on select methods, found '{method_name}'"
            )));
        }

        Ok(Self {
            kind,
            distinct,
            max_results,
            predicate: predicate.to_string(),
        })
    }
}

/// Normalize a method name to the camelCase form derivation works on.
#[must_use]
pub fn derived_method_name(method_name: &str) -> String {
    if method_name.contains('_') {
        method_name.to_case(Case::Camel)
    } else {
        method_name.to_string()
    }
}

fn split_prefix(name: &str) -> Option<(SubjectKind, &str)> {
    let candidates = SELECT_PREFIXES
        .iter()
        .map(|p| (SubjectKind::Select, *p))
        .chain([
            (SubjectKind::Count, "count"),
            (SubjectKind::Exists, "exists"),
            (SubjectKind::Delete, "delete"),
            (SubjectKind::Delete, "remove"),
        ]);

    for (kind, prefix) in candidates {
        if let Some(rest) = name.strip_prefix(prefix)
            && (rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_uppercase()))
        {
            return Some((kind, rest));
        }
    }

    None
}

// Position of the `By` that opens the predicate section.
fn find_by(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();

    (0..bytes.len().saturating_sub(1)).find(|&i| {
        bytes[i] == b'B'
            && bytes[i + 1] == b'y'
            && bytes.get(i + 2).is_none_or(u8::is_ascii_uppercase)
    })
}

// `First`/`Top` optionally followed by digits; no digits means one row.
fn parse_limit(subject: &str) -> Result<Option<u32>, String> {
    for keyword in ["First", "Top"] {
        if let Some(at) = subject.find(keyword) {
            let digits: String = subject[at + keyword.len()..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();

            if digits.is_empty() {
                return Ok(Some(1));
            }

            return match digits.parse::<u32>() {
                Ok(0) | Err(_) => Err(digits),
                Ok(n) => Ok(Some(n)),
            };
        }
    }

    Ok(None)
}
