use crate::error::{ContributionError, ErrorClass, ErrorOrigin};
use derive_more::Display;
use regex::Regex;
use std::sync::LazyLock;

type Pattern = LazyLock<Result<Regex, regex::Error>>;

static ORDER_BY: Pattern = LazyLock::new(|| Regex::new(r"(?is)\s+order\s+by\s+[^()']*$"));
static SELECT_FROM: Pattern =
    LazyLock::new(|| Regex::new(r"(?is)^\s*select\s+(distinct\s+)?(.+?)\s+(from\s+.*)$"));
static FROM_ALIAS: Pattern =
    LazyLock::new(|| Regex::new(r"(?is)\bfrom\s+[\w.$]+(?:\s+as)?\s+(\w+)"));

// Words that may follow an entity name in place of an alias.
const NON_ALIAS_KEYWORDS: [&str; 9] = [
    "where", "join", "left", "right", "inner", "outer", "order", "group", "having",
];

///
/// QueryEnhancerSelector
///
/// Strategy choosing a `QueryEnhancer` per query dialect. Selected once per
/// repository from configuration.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum QueryEnhancerSelector {
    /// JPQL queries get the alias-aware enhancer; native queries the regex one.
    #[default]
    #[display("default")]
    Default,
    /// Every query goes through the regex enhancer.
    #[display("regex")]
    Regex,
}

impl QueryEnhancerSelector {
    /// Parse a configured selector name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }

    #[must_use]
    pub const fn select(self, native: bool) -> QueryEnhancer {
        match self {
            Self::Default if !native => QueryEnhancer::Jpql,
            Self::Default | Self::Regex => QueryEnhancer::Regex,
        }
    }
}

///
/// QueryEnhancer
/// Rewrites declared query text, e.g. into the count query paging needs.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum QueryEnhancer {
    Jpql,
    Regex,
}

impl QueryEnhancer {
    /// Derive a count query from a result query.
    pub fn count_query(self, query: &str) -> Result<String, ContributionError> {
        let stripped = self.strip_order_by(query)?;

        match self {
            Self::Jpql => jpql_count(&stripped),
            Self::Regex => regex_count(&stripped),
        }
    }

    /// Remove a trailing top-level `ORDER BY` clause.
    pub fn strip_order_by(self, query: &str) -> Result<String, ContributionError> {
        let order_by = compiled(&ORDER_BY)?;

        Ok(order_by.replace(query.trim(), "").into_owned())
    }

    /// Alias of the primary entity in the `FROM` clause, if any.
    pub fn detect_alias(self, query: &str) -> Result<Option<String>, ContributionError> {
        let from_alias = compiled(&FROM_ALIAS)?;

        Ok(from_alias
            .captures(query)
            .map(|c| c[1].to_string())
            .filter(|alias| !NON_ALIAS_KEYWORDS.contains(&alias.to_ascii_lowercase().as_str())))
    }
}

fn jpql_count(query: &str) -> Result<String, ContributionError> {
    let alias = QueryEnhancer::Jpql.detect_alias(query)?.ok_or_else(|| {
        ContributionError::query_invalid(format!("cannot detect the entity alias of '{query}'"))
    })?;
    let select_from = compiled(&SELECT_FROM)?;

    if let Some(captures) = select_from.captures(query) {
        let distinct = if captures.get(1).is_some() {
            "distinct "
        } else {
            ""
        };
        return Ok(format!("select count({distinct}{alias}) {}", &captures[3]));
    }

    if starts_with_from(query) {
        return Ok(format!("select count({alias}) {query}"));
    }

    Err(ContributionError::query_invalid(format!(
        "cannot derive a count query from '{query}'"
    )))
}

fn regex_count(query: &str) -> Result<String, ContributionError> {
    let select_from = compiled(&SELECT_FROM)?;

    if let Some(captures) = select_from.captures(query) {
        let projection = captures[2].trim();
        let counted = if captures.get(1).is_some() && projection != "*" {
            format!("distinct {projection}")
        } else {
            "*".to_string()
        };
        return Ok(format!("select count({counted}) {}", &captures[3]));
    }

    if starts_with_from(query) {
        return Ok(format!("select count(*) {query}"));
    }

    Err(ContributionError::query_invalid(format!(
        "cannot derive a count query from '{query}'"
    )))
}

fn starts_with_from(query: &str) -> bool {
    query
        .trim_start()
        .get(..5)
        .is_some_and(|head| head.eq_ignore_ascii_case("from "))
}

fn compiled(pattern: &'static Pattern) -> Result<&'static Regex, ContributionError> {
    pattern.as_ref().map_err(|err| {
        ContributionError::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Query,
            format!("query pattern failed to compile: {err}"),
        )
    })
}
