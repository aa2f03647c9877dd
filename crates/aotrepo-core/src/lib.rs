//! Core of the aotrepo contribution pipeline: method classification, query
//! resolution, entity-graph lookup and the contribution decision, plus the
//! vocabulary exported via the `prelude`.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod classify;
pub mod decide;
pub mod error;
pub mod graph;
pub mod metamodel;
pub mod method;
pub mod obs;
pub mod query;
pub mod types;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Bean name of the default entity manager factory; a configured reference
/// equal to it is treated as unset.
pub const DEFAULT_ENTITY_MANAGER_FACTORY: &str = "entityManagerFactory";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, resolvers, sinks or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        metamodel::{AttributeModel, EntityModel, Metamodel, ProjectionKind, ProjectionModel},
        method::{
            EntityGraphHint, EntityGraphType, ModifyingAnnotation, ProcedureAnnotation,
            QueryAnnotation, RepositoryInformation, RepositoryMethodDescriptor,
        },
        types::TypeRef,
    };
}
