//! Module: decide
//! Responsibility: choose the contribution outcome for one classified method.
//! Does not own: query derivation, entity-graph lookup, code emission.
//! Boundary: one ordered match over `QueryMethodView` facts; collaborators
//! are reached only through `QueryResolver`, `EntityGraphResolver` and
//! `CodeComposer`.


use crate::{
    classify::{QueryMethodView, ReturnedType, resolve_procedure_reference},
    error::ContributionError,
    graph::{AotEntityGraph, EntityGraphResolver},
    method::{ModifyingAnnotation, QueryHints, RepositoryInformation, RepositoryMethodDescriptor},
    obs::{ContributionEvent, sink},
    query::{AotQueries, QueryEnhancerSelector, QueryMetadata, QueryResolver, query_return_type},
    types::TypeRef,
};
use derive_more::Display;

///
/// DegradeReason
/// Why a method is registered for runtime execution instead of generated.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum DegradeReason {
    #[display("stored procedure")]
    StoredProcedure,
    #[display("scroll query")]
    ScrollQuery,
    #[display("dynamic projection")]
    DynamicProjection,
    #[display("modifying return type")]
    ModifyingReturn,
}

///
/// UnsupportedReason
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum UnsupportedReason {
    /// Procedure method with every reference source blank.
    #[display("unresolved procedure reference")]
    UnresolvedProcedure,
}

///
/// ContributionOutcome
///
/// Terminal artifact of one decision. `Unsupported` carries no metadata:
/// the method is skipped and left to the runtime path.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContributionOutcome<F> {
    Unsupported(UnsupportedReason),
    MetadataOnly {
        metadata: QueryMetadata,
        reason: DegradeReason,
    },
    Generated {
        metadata: QueryMetadata,
        body: F,
    },
}

impl<F> ContributionOutcome<F> {
    #[must_use]
    pub const fn metadata(&self) -> Option<&QueryMetadata> {
        match self {
            Self::Unsupported(_) => None,
            Self::MetadataOnly { metadata, .. } | Self::Generated { metadata, .. } => {
                Some(metadata)
            }
        }
    }

    #[must_use]
    pub const fn body(&self) -> Option<&F> {
        match self {
            Self::Generated { body, .. } => Some(body),
            Self::Unsupported(_) | Self::MetadataOnly { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_generated(&self) -> bool {
        matches!(self, Self::Generated { .. })
    }

    #[must_use]
    pub const fn is_metadata_only(&self) -> bool {
        matches!(self, Self::MetadataOnly { .. })
    }

    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

///
/// ConstructionInput
/// Everything the query-construction fragment binds.
///

#[derive(Clone, Copy, Debug)]
pub struct ConstructionInput<'a> {
    pub repository: &'a RepositoryInformation,
    pub view: &'a QueryMethodView<'a>,
    pub queries: &'a AotQueries,
    pub native: bool,
    pub hints: &'a QueryHints,
    pub entity_graph: &'a AotEntityGraph,
    pub query_rewriter: Option<&'a str>,
    pub query_return_type: &'a TypeRef,
}

///
/// ExecutionInput
/// Everything the query-execution fragment binds.
///

#[derive(Clone, Copy, Debug)]
pub struct ExecutionInput<'a> {
    pub repository: &'a RepositoryInformation,
    pub view: &'a QueryMethodView<'a>,
    pub queries: &'a AotQueries,
    pub modifying: Option<&'a ModifyingAnnotation>,
    pub returned_type: &'a ReturnedType,
}

///
/// CodeComposer
///
/// Emits the two ordered fragments of a generated method body. The
/// decider concatenates `construction` then `execution`.
///

pub trait CodeComposer {
    type Fragment: Default + Extend<Self::Fragment>;

    fn construction(
        &self,
        input: &ConstructionInput<'_>,
    ) -> Result<Self::Fragment, ContributionError>;

    fn execution(&self, input: &ExecutionInput<'_>) -> Result<Self::Fragment, ContributionError>;
}

///
/// ContributionDecider
///
/// Per-repository decision context. Shared collaborators are borrowed
/// read-only; no decision mutates them.
///

pub struct ContributionDecider<'a> {
    repository: &'a RepositoryInformation,
    selector: QueryEnhancerSelector,
    queries: &'a dyn QueryResolver,
    entity_graphs: &'a dyn EntityGraphResolver,
}

impl<'a> ContributionDecider<'a> {
    #[must_use]
    pub const fn new(
        repository: &'a RepositoryInformation,
        selector: QueryEnhancerSelector,
        queries: &'a dyn QueryResolver,
        entity_graphs: &'a dyn EntityGraphResolver,
    ) -> Self {
        Self {
            repository,
            selector,
            queries,
            entity_graphs,
        }
    }

    /// Decide the outcome for one method and record it.
    /// Hard errors carry the method's location.
    pub fn decide<C: CodeComposer>(
        &self,
        view: &QueryMethodView<'_>,
        composer: &C,
    ) -> Result<ContributionOutcome<C::Fragment>, ContributionError> {
        let repository = self.repository.name.clone();
        let method = view.name().to_string();

        match self.decide_inner(view, composer) {
            Ok(outcome) => {
                sink::record(&match &outcome {
                    ContributionOutcome::Unsupported(reason) => ContributionEvent::Unsupported {
                        repository,
                        method,
                        reason: *reason,
                    },
                    ContributionOutcome::MetadataOnly { reason, .. } => {
                        ContributionEvent::MetadataOnly {
                            repository,
                            method,
                            reason: *reason,
                        }
                    }
                    ContributionOutcome::Generated { .. } => {
                        ContributionEvent::Generated { repository, method }
                    }
                });

                Ok(outcome)
            }
            Err(err) => Err(self.fail(view.method(), err)),
        }
    }

    /// Record a hard error for `method` as a failed contribution and attach
    /// the method's location. Also used for errors raised before a view
    /// exists, such as classification failures.
    #[must_use]
    pub fn fail(
        &self,
        method: &RepositoryMethodDescriptor,
        err: ContributionError,
    ) -> ContributionError {
        sink::record(&ContributionEvent::Failed {
            repository: self.repository.name.clone(),
            method: method.name.clone(),
            class: err.class,
            origin: err.origin,
        });

        err.at(method.location(self.repository))
    }

    fn decide_inner<C: CodeComposer>(
        &self,
        view: &QueryMethodView<'_>,
        composer: &C,
    ) -> Result<ContributionOutcome<C::Fragment>, ContributionError> {
        let annotations = &view.method().annotations;

        // 1. stored procedures never reach query resolution
        if view.is_procedure_query() {
            let reference = annotations
                .procedure
                .as_ref()
                .and_then(resolve_procedure_reference);

            return Ok(match reference {
                Some(reference) => ContributionOutcome::MetadataOnly {
                    metadata: reference.to_metadata(),
                    reason: DegradeReason::StoredProcedure,
                },
                None => ContributionOutcome::Unsupported(UnsupportedReason::UnresolvedProcedure),
            });
        }

        // 2. every later terminal publishes the resolved queries
        let queries = self.queries.create_queries(
            self.repository,
            view.returned_type(),
            self.selector,
            annotations.query.as_ref(),
            view,
        )?;
        let metadata = queries.to_metadata(view.is_page_query());

        // 3-5. shapes the generator leaves to the runtime
        if let Some(reason) = degrade_reason(view) {
            return Ok(ContributionOutcome::MetadataOnly { metadata, reason });
        }

        // 6. full generation
        let entity_graph = self.entity_graphs.find_entity_graph(
            annotations.entity_graph.as_ref(),
            self.repository,
            view.returned_type(),
            view,
        )?;
        let return_type = query_return_type(view.returned_type());

        let construction = composer.construction(&ConstructionInput {
            repository: self.repository,
            view,
            queries: &queries,
            native: view.is_native_query(),
            hints: &annotations.query_hints,
            entity_graph: &entity_graph,
            query_rewriter: annotations
                .query
                .as_ref()
                .and_then(|q| q.query_rewriter.as_deref()),
            query_return_type: &return_type,
        })?;
        let execution = composer.execution(&ExecutionInput {
            repository: self.repository,
            view,
            queries: &queries,
            modifying: annotations.modifying.as_ref(),
            returned_type: view.returned_type(),
        })?;

        let mut body = C::Fragment::default();
        body.extend([construction, execution]);

        Ok(ContributionOutcome::Generated { metadata, body })
    }
}

/// Degrade reason for a non-procedure method, checked in precedence order.
/// Scroll detection dominates every other shape fact.
#[must_use]
pub fn degrade_reason(view: &QueryMethodView<'_>) -> Option<DegradeReason> {
    if view.has_scroll_position_parameter() || view.is_scroll_query() {
        return Some(DegradeReason::ScrollQuery);
    }

    if view.has_dynamic_projection() {
        return Some(DegradeReason::DynamicProjection);
    }

    if view.is_modifying_query() && !view.modifying_return().is_generatable() {
        return Some(DegradeReason::ModifyingReturn);
    }

    None
}
