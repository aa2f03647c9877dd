//! Module: query
//! Responsibility: resolve the `AotQueries` that answer a repository method.
//! Does not own: the decision between generated and metadata-only outcomes.
//! Boundary: `QueryResolver` is the contract; `QueriesFactory` is the
//! metamodel-backed reference resolver.

mod declared;
mod enhancer;
mod factory;
mod metadata;
mod part;
mod render;
mod subject;


pub use enhancer::{QueryEnhancer, QueryEnhancerSelector};
pub use factory::{QueriesFactory, QueryResolver, query_return_type};
pub use metadata::QueryMetadata;
pub use part::{Operator, Part, PartTree, SortOrder};
pub use subject::{Subject, SubjectKind, derived_method_name};

use serde_json::Value;

///
/// QuerySource
/// Where the query text of an `AotQuery` came from.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QuerySource {
    Declared,
    Named(String),
    Derived,
}

///
/// LikeKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LikeKind {
    StartingWith,
    EndingWith,
    Containing,
}

impl LikeKind {
    /// Wrap a bound value with the wildcard pattern this kind requires.
    #[must_use]
    pub fn pattern(self, value: &str) -> String {
        match self {
            Self::StartingWith => format!("{value}%"),
            Self::EndingWith => format!("%{value}"),
            Self::Containing => format!("%{value}%"),
        }
    }
}

///
/// BindingTarget
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BindingTarget {
    Named(String),
    /// 1-based positional marker `?n`.
    Position(usize),
}

///
/// ParameterBinding
///
/// Links one query marker to the method parameter supplying its value.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParameterBinding {
    pub target: BindingTarget,
    /// Index into the method's full parameter list.
    pub origin: usize,
    pub like: Option<LikeKind>,
}

///
/// AotQuery
///
/// One resolved query: text, dialect flag and parameter bindings.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AotQuery {
    pub source: QuerySource,
    pub text: String,
    pub native: bool,
    pub bindings: Vec<ParameterBinding>,
    /// Static row limit derived from `First<N>`/`Top<N>` or exists probes.
    pub limit: Option<u32>,
}

impl AotQuery {
    #[must_use]
    pub fn new(source: QuerySource, text: impl Into<String>, native: bool) -> Self {
        Self {
            source,
            text: text.into(),
            native,
            bindings: Vec::new(),
            limit: None,
        }
    }

    #[must_use]
    pub fn with_bindings(mut self, bindings: Vec<ParameterBinding>) -> Self {
        self.bindings = bindings;
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.source {
            QuerySource::Named(name) => Some(name),
            QuerySource::Declared | QuerySource::Derived => None,
        }
    }

    fn write_metadata(&self, metadata: QueryMetadata, key: &str) -> QueryMetadata {
        let mut metadata = metadata.with(key, self.text.as_str());
        if let Some(name) = self.name()
            && key == "query"
        {
            metadata = metadata.with("name", name);
        }
        if self.native && key == "query" {
            metadata = metadata.with("native", Value::Bool(true));
        }

        metadata
    }
}

///
/// AotQueries
///
/// The result query of a method plus the count query paging needs.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AotQueries {
    pub result: AotQuery,
    pub count: Option<AotQuery>,
}

impl AotQueries {
    #[must_use]
    pub const fn new(result: AotQuery) -> Self {
        Self {
            result,
            count: None,
        }
    }

    #[must_use]
    pub fn with_count(mut self, count: AotQuery) -> Self {
        self.count = Some(count);
        self
    }

    /// Metadata published for runtime fallback and diagnostics.
    /// The count query is included only when `paging` is set.
    #[must_use]
    pub fn to_metadata(&self, paging: bool) -> QueryMetadata {
        let metadata = self.result.write_metadata(QueryMetadata::new(), "query");

        match (&self.count, paging) {
            (Some(count), true) => count.write_metadata(metadata, "count-query"),
            _ => metadata,
        }
    }
}
