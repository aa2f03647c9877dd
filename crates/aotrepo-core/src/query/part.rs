//! Predicate and ordering grammar of derived method names.
//!
//! `LastNameAndAgeGreaterThanOrEmailContainingIgnoreCaseOrderByAgeDesc`
//! parses into two OR-branches of AND-parts plus one sort order.

use crate::error::ContributionError;

// Longest keywords first so `LessThanEqual` wins over `LessThan`.
const OPERATOR_KEYWORDS: &[(&str, Operator)] = &[
    ("IsNotNull", Operator::IsNotNull),
    ("NotNull", Operator::IsNotNull),
    ("IsNull", Operator::IsNull),
    ("Null", Operator::IsNull),
    ("IsNotEmpty", Operator::IsNotEmpty),
    ("NotEmpty", Operator::IsNotEmpty),
    ("IsEmpty", Operator::IsEmpty),
    ("Empty", Operator::IsEmpty),
    ("IsLessThanEqual", Operator::LessThanEqual),
    ("LessThanEqual", Operator::LessThanEqual),
    ("IsLessThan", Operator::LessThan),
    ("LessThan", Operator::LessThan),
    ("IsBefore", Operator::LessThan),
    ("Before", Operator::LessThan),
    ("IsGreaterThanEqual", Operator::GreaterThanEqual),
    ("GreaterThanEqual", Operator::GreaterThanEqual),
    ("IsGreaterThan", Operator::GreaterThan),
    ("GreaterThan", Operator::GreaterThan),
    ("IsAfter", Operator::GreaterThan),
    ("After", Operator::GreaterThan),
    ("IsBetween", Operator::Between),
    ("Between", Operator::Between),
    ("IsNotLike", Operator::NotLike),
    ("NotLike", Operator::NotLike),
    ("IsLike", Operator::Like),
    ("Like", Operator::Like),
    ("IsStartingWith", Operator::StartingWith),
    ("StartingWith", Operator::StartingWith),
    ("StartsWith", Operator::StartingWith),
    ("IsEndingWith", Operator::EndingWith),
    ("EndingWith", Operator::EndingWith),
    ("EndsWith", Operator::EndingWith),
    ("IsNotContaining", Operator::NotContaining),
    ("NotContaining", Operator::NotContaining),
    ("IsContaining", Operator::Containing),
    ("Containing", Operator::Containing),
    ("Contains", Operator::Containing),
    ("IsNotIn", Operator::NotIn),
    ("NotIn", Operator::NotIn),
    ("IsIn", Operator::In),
    ("In", Operator::In),
    ("IsTrue", Operator::True),
    ("True", Operator::True),
    ("IsFalse", Operator::False),
    ("False", Operator::False),
    ("IsNot", Operator::NotEquals),
];

///
/// Operator
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operator {
    Equals,
    NotEquals,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Between,
    IsNull,
    IsNotNull,
    Like,
    NotLike,
    StartingWith,
    EndingWith,
    Containing,
    NotContaining,
    In,
    NotIn,
    True,
    False,
    IsEmpty,
    IsNotEmpty,
}

impl Operator {
    /// Number of method arguments the operator consumes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Between => 2,
            Self::IsNull
            | Self::IsNotNull
            | Self::True
            | Self::False
            | Self::IsEmpty
            | Self::IsNotEmpty => 0,
            _ => 1,
        }
    }

    #[must_use]
    pub const fn supports_ignore_case(self) -> bool {
        matches!(
            self,
            Self::Equals
                | Self::NotEquals
                | Self::Like
                | Self::NotLike
                | Self::StartingWith
                | Self::EndingWith
                | Self::Containing
                | Self::NotContaining
        )
    }

    fn split(source: &str) -> (&str, Self) {
        for &(keyword, op) in OPERATOR_KEYWORDS {
            if let Some(property) = source.strip_suffix(keyword)
                && !property.is_empty()
            {
                return (property, op);
            }
        }

        if let Some(property) = source.strip_suffix("Not")
            && !property.is_empty()
        {
            return (property, Self::NotEquals);
        }

        for keyword in ["Equals", "Is"] {
            if let Some(property) = source.strip_suffix(keyword)
                && !property.is_empty()
            {
                return (property, Self::Equals);
            }
        }

        (source, Self::Equals)
    }
}

///
/// Part
/// One predicate, e.g. `AgeGreaterThan`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Part {
    /// Property source in method-name form, e.g. `AddressCity`.
    pub property: String,
    pub operator: Operator,
    pub ignore_case: bool,
}

///
/// SortOrder
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortOrder {
    pub property: String,
    pub descending: bool,
}

///
/// PartTree
///
/// OR-branches of AND-parts, plus static ordering.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PartTree {
    pub branches: Vec<Vec<Part>>,
    pub orders: Vec<SortOrder>,
}

impl PartTree {
    pub fn parse(source: &str) -> Result<Self, ContributionError> {
        let (predicate, order) = match source.find("OrderBy") {
            Some(at) => (&source[..at], Some(&source[at + "OrderBy".len()..])),
            None => (source, None),
        };

        let (predicate, all_ignore_case) =
            strip_any_suffix(predicate, &["AllIgnoreCase", "AllIgnoringCase"]);

        let mut branches = Vec::new();
        if !predicate.is_empty() {
            for branch in split_keyword(predicate, "Or") {
                let parts = split_keyword(branch, "And")
                    .into_iter()
                    .map(|source| parse_part(source, all_ignore_case))
                    .collect::<Result<Vec<_>, _>>()?;
                branches.push(parts);
            }
        }

        let orders = match order {
            Some(order) => parse_orders(order)?,
            None => Vec::new(),
        };

        Ok(Self { branches, orders })
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.branches.iter().flatten()
    }

    /// Total number of method arguments the predicate consumes.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parts().map(|p| p.operator.arity()).sum()
    }
}

fn parse_part(source: &str, all_ignore_case: bool) -> Result<Part, ContributionError> {
    let (source, ignore_case) = strip_any_suffix(source, &["IgnoreCase", "IgnoringCase"]);
    if source.is_empty() {
        return Err(ContributionError::query_invalid(
            "empty predicate part in derived method name",
        ));
    }

    let (property, operator) = Operator::split(source);

    // An explicit IgnoreCase must apply; AllIgnoreCase skips parts it cannot.
    if ignore_case && !operator.supports_ignore_case() {
        return Err(ContributionError::query_invalid(format!(
            "IgnoreCase is not supported for '{source}'"
        )));
    }
    let ignore_case = (ignore_case || all_ignore_case) && operator.supports_ignore_case();

    Ok(Part {
        property: property.to_string(),
        operator,
        ignore_case,
    })
}

fn parse_orders(source: &str) -> Result<Vec<SortOrder>, ContributionError> {
    let mut orders = Vec::new();
    let mut rest = source;

    while !rest.is_empty() {
        let asc = find_keyword(rest, "Asc");
        let desc = find_keyword(rest, "Desc");

        let (at, len, descending) = match (asc, desc) {
            (Some(a), Some(d)) if d < a => (d, 4, true),
            (Some(a), _) => (a, 3, false),
            (None, Some(d)) => (d, 4, true),
            (None, None) => (rest.len(), 0, false),
        };

        let property = &rest[..at];
        if property.is_empty() {
            return Err(ContributionError::query_invalid(format!(
                "missing property in order clause 'OrderBy{source}'"
            )));
        }

        orders.push(SortOrder {
            property: property.to_string(),
            descending,
        });
        rest = &rest[at + len..];
    }

    Ok(orders)
}

// Split on `keyword` where it is followed by an uppercase letter and is not
// the first token, e.g. `NameOrEmail` splits but `Origin` does not.
fn split_keyword<'a>(source: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 1;

    while i < source.len() {
        if source.is_char_boundary(i)
            && source[i..].starts_with(keyword)
            && source[i + keyword.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_uppercase())
            && source[..i].ends_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            out.push(&source[start..i]);
            start = i + keyword.len();
            i = start + 1;
            continue;
        }
        i += 1;
    }
    out.push(&source[start..]);

    out
}

// Position of `keyword` when it ends the source or precedes an uppercase letter.
fn find_keyword(source: &str, keyword: &str) -> Option<usize> {
    source.match_indices(keyword).map(|(at, _)| at).find(|&at| {
        at > 0
            && source[at + keyword.len()..]
                .chars()
                .next()
                .is_none_or(|c| c.is_ascii_uppercase())
    })
}

fn strip_any_suffix<'a>(source: &'a str, suffixes: &[&str]) -> (&'a str, bool) {
    for suffix in suffixes {
        if let Some(stripped) = source.strip_suffix(suffix) {
            return (stripped, true);
        }
    }

    (source, false)
}
