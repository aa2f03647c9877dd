//! Module: graph
//! Responsibility: resolve a method's entity-graph hint into an `AotEntityGraph`.
//! Does not own: applying the graph to a query (composer concern).
//! Boundary: an absent hint is `AotEntityGraph::Absent`, never an error.


use crate::{
    classify::{QueryMethodView, ReturnedType, named_query_name},
    error::ContributionError,
    metamodel::{Metamodel, PropertyPath},
    method::{EntityGraphHint, EntityGraphType, RepositoryInformation},
};
use std::sync::Arc;
use tracing::debug;

///
/// AotEntityGraph
/// Fetch graph applied to generated query code.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum AotEntityGraph {
    #[default]
    Absent,
    /// Named graph declared on the domain entity.
    Named {
        name: String,
        kind: EntityGraphType,
        attribute_paths: Vec<String>,
    },
    /// Ad-hoc graph built from the hint's attribute paths.
    Dynamic {
        kind: EntityGraphType,
        attribute_paths: Vec<String>,
    },
}

impl AotEntityGraph {
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub const fn kind(&self) -> Option<EntityGraphType> {
        match self {
            Self::Absent => None,
            Self::Named { kind, .. } | Self::Dynamic { kind, .. } => Some(*kind),
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } => Some(name),
            Self::Absent | Self::Dynamic { .. } => None,
        }
    }

    #[must_use]
    pub fn attribute_paths(&self) -> &[String] {
        match self {
            Self::Absent => &[],
            Self::Named {
                attribute_paths, ..
            }
            | Self::Dynamic {
                attribute_paths, ..
            } => attribute_paths,
        }
    }
}

///
/// EntityGraphResolver
///

pub trait EntityGraphResolver {
    fn find_entity_graph(
        &self,
        hint: Option<&EntityGraphHint>,
        repository: &RepositoryInformation,
        returned_type: &ReturnedType,
        view: &QueryMethodView<'_>,
    ) -> Result<AotEntityGraph, ContributionError>;
}

///
/// EntityGraphLookup
///
/// Resolves hints against the named graphs of the domain entity, falling
/// back to a dynamic graph from attribute paths.
///

#[derive(Clone, Debug)]
pub struct EntityGraphLookup {
    metamodel: Arc<Metamodel>,
}

impl EntityGraphLookup {
    #[must_use]
    pub const fn new(metamodel: Arc<Metamodel>) -> Self {
        Self { metamodel }
    }

    fn validate(&self, root: &str, paths: &[String]) -> Result<(), ContributionError> {
        for path in paths {
            PropertyPath::resolve(&self.metamodel, root, path).map_err(|err| {
                ContributionError::entity_graph_invalid(format!(
                    "invalid entity graph attribute path: {}",
                    err.message
                ))
            })?;
        }

        Ok(())
    }
}

impl EntityGraphResolver for EntityGraphLookup {
    fn find_entity_graph(
        &self,
        hint: Option<&EntityGraphHint>,
        repository: &RepositoryInformation,
        returned_type: &ReturnedType,
        view: &QueryMethodView<'_>,
    ) -> Result<AotEntityGraph, ContributionError> {
        let Some(hint) = hint else {
            return Ok(AotEntityGraph::Absent);
        };

        let root = &returned_type.domain_type;
        let entity = self.metamodel.required_entity(root)?;
        let name = hint
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map_or_else(
                || named_query_name(&entity.name, view.name()),
                str::to_string,
            );

        if let Some(graph) = entity.get_entity_graph(&name) {
            self.validate(root, &graph.attribute_paths)?;

            return Ok(AotEntityGraph::Named {
                name,
                kind: hint.kind,
                attribute_paths: graph.attribute_paths.clone(),
            });
        }

        if hint.attribute_paths.is_empty() {
            debug!(
                repository = %repository.name,
                method = view.name(),
                graph = %name,
                "entity graph not found, continuing without one"
            );
            return Ok(AotEntityGraph::Absent);
        }

        self.validate(root, &hint.attribute_paths)?;

        Ok(AotEntityGraph::Dynamic {
            kind: hint.kind,
            attribute_paths: hint.attribute_paths.clone(),
        })
    }
}
