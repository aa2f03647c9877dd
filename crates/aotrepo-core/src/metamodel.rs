//! Domain metamodel.
//!
//! Build-scoped, read-only description of the persistent types known to one
//! persistence unit. It is constructed once per build, wrapped in an `Arc`,
//! and only ever borrowed by classification, query derivation and
//! entity-graph lookup.

use crate::{error::ContributionError, types::TypeRef};
use std::collections::BTreeMap;

///
/// Metamodel
///

#[derive(Clone, Debug, Default)]
pub struct Metamodel {
    persistence_unit: String,
    entities: BTreeMap<String, EntityModel>,
    projections: BTreeMap<String, ProjectionModel>,
    named_queries: BTreeMap<String, String>,
}

impl Metamodel {
    #[must_use]
    pub fn new(persistence_unit: impl Into<String>) -> Self {
        Self {
            persistence_unit: persistence_unit.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_entity(mut self, entity: EntityModel) -> Self {
        self.entities.insert(entity.ty.clone(), entity);
        self
    }

    #[must_use]
    pub fn with_projection(mut self, projection: ProjectionModel) -> Self {
        self.projections.insert(projection.ty.clone(), projection);
        self
    }

    /// Register a named query, keyed `{Entity}.{method}` by convention.
    #[must_use]
    pub fn with_named_query(mut self, name: impl Into<String>, query: impl Into<String>) -> Self {
        self.named_queries.insert(name.into(), query.into());
        self
    }

    #[must_use]
    pub fn persistence_unit(&self) -> &str {
        &self.persistence_unit
    }

    #[must_use]
    pub fn entity(&self, ty: &str) -> Option<&EntityModel> {
        self.entities
            .get(ty)
            .or_else(|| self.entities.values().find(|e| e.name == ty))
    }

    pub fn required_entity(&self, ty: &str) -> Result<&EntityModel, ContributionError> {
        self.entity(ty)
            .ok_or_else(|| ContributionError::metamodel_not_found("entity", ty))
    }

    #[must_use]
    pub fn projection(&self, ty: &str) -> Option<&ProjectionModel> {
        self.projections.get(ty)
    }

    #[must_use]
    pub fn named_query(&self, name: &str) -> Option<&str> {
        self.named_queries.get(name).map(String::as_str)
    }

    /// Introspect identifier and naming information for a domain type.
    pub fn entity_information(&self, domain_type: &str) -> Result<EntityInformation, ContributionError> {
        let entity = self.required_entity(domain_type)?;

        Ok(EntityInformation {
            domain_type: entity.ty.clone(),
            entity_name: entity.name.clone(),
            id_attribute: entity.id_attribute.clone(),
            id_type: entity.id_type.clone(),
        })
    }
}

///
/// EntityInformation
/// Persistence-unit view of one domain type.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityInformation {
    pub domain_type: String,
    pub entity_name: String,
    pub id_attribute: String,
    pub id_type: TypeRef,
}

///
/// EntityModel
///

#[derive(Clone, Debug)]
pub struct EntityModel {
    pub ty: String,
    pub name: String,
    pub id_attribute: String,
    pub id_type: TypeRef,
    pub attributes: Vec<AttributeModel>,
    pub entity_graphs: Vec<NamedEntityGraph>,
}

impl EntityModel {
    /// New entity whose query name equals its type name.
    #[must_use]
    pub fn new(ty: impl Into<String>, id_attribute: impl Into<String>, id_type: TypeRef) -> Self {
        let ty = ty.into();
        let id_attribute = id_attribute.into();

        Self {
            name: ty.clone(),
            attributes: vec![AttributeModel::basic(id_attribute.clone())],
            ty,
            id_attribute,
            id_type,
            entity_graphs: Vec::new(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn attribute(mut self, attribute: AttributeModel) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn basic(self, name: impl Into<String>) -> Self {
        self.attribute(AttributeModel::basic(name))
    }

    #[must_use]
    pub fn entity_graph<I, S>(mut self, name: impl Into<String>, attribute_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_graphs.push(NamedEntityGraph {
            name: name.into(),
            attribute_paths: attribute_paths.into_iter().map(Into::into).collect(),
        });
        self
    }

    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<&AttributeModel> {
        self.attributes.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn get_entity_graph(&self, name: &str) -> Option<&NamedEntityGraph> {
        self.entity_graphs.iter().find(|g| g.name == name)
    }
}

///
/// AttributeModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributeModel {
    pub name: String,
    pub kind: AttributeKind,
}

impl AttributeModel {
    #[must_use]
    pub fn basic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Basic,
        }
    }

    #[must_use]
    pub fn association(name: impl Into<String>, target: impl Into<String>, collection: bool) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Association {
                target: target.into(),
                collection,
            },
        }
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self.kind, AttributeKind::Association { collection: true, .. })
    }
}

///
/// AttributeKind
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttributeKind {
    Basic,
    Association { target: String, collection: bool },
}

///
/// NamedEntityGraph
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NamedEntityGraph {
    pub name: String,
    pub attribute_paths: Vec<String>,
}

///
/// ProjectionModel
///
/// A result type registered as a projection of some entity, listing the
/// properties it reads in declaration order.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectionModel {
    pub ty: String,
    pub kind: ProjectionKind,
    pub properties: Vec<String>,
}

impl ProjectionModel {
    #[must_use]
    pub fn new<I, S>(ty: impl Into<String>, kind: ProjectionKind, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ty: ty.into(),
            kind,
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }
}

///
/// ProjectionKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProjectionKind {
    /// Read through a tuple keyed by property alias.
    Interface,
    /// Instantiated through a constructor expression.
    Dto,
}

///
/// PropertyPath
///
/// Dotted attribute path resolved against the metamodel, e.g. `orders.items`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyPath {
    pub segments: Vec<String>,
}

impl PropertyPath {
    /// Resolve a dotted path segment by segment, following associations.
    pub fn resolve(metamodel: &Metamodel, root: &str, path: &str) -> Result<Self, ContributionError> {
        let mut entity = metamodel.required_entity(root)?;
        let mut segments = Vec::new();
        let mut parts = path.split('.').peekable();

        while let Some(part) = parts.next() {
            let attribute = entity.get_attribute(part).ok_or_else(|| {
                ContributionError::query_invalid(format!(
                    "no property '{part}' found on '{}' (path '{path}')",
                    entity.ty
                ))
            })?;
            segments.push(attribute.name.clone());

            if parts.peek().is_some() {
                match &attribute.kind {
                    AttributeKind::Association { target, .. } => {
                        entity = metamodel.required_entity(target)?;
                    }
                    AttributeKind::Basic => {
                        return Err(ContributionError::query_invalid(format!(
                            "property '{part}' on '{}' is not an association (path '{path}')",
                            entity.ty
                        )));
                    }
                }
            }
        }

        Ok(Self { segments })
    }

    #[must_use]
    pub fn dot_path(&self) -> String {
        self.segments.join(".")
    }
}
