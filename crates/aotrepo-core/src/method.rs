//! Declarative repository method input.
//!
//! These types are read once from a repository interface and never mutated
//! afterwards. Classification and decision logic only ever borrow them.

use crate::{error::MethodLocation, types::TypeRef};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// RepositoryInformation
///
/// Identity of the repository interface being contributed.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RepositoryInformation {
    pub name: String,
    pub domain_type: String,
    pub id_type: TypeRef,
}

impl RepositoryInformation {
    #[must_use]
    pub fn new(name: impl Into<String>, domain_type: impl Into<String>, id_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            domain_type: domain_type.into(),
            id_type,
        }
    }
}

///
/// ParameterRole
///
/// Source-position role of a method parameter. Only `Bindable` parameters
/// are bound into the query; the rest shape paging, sorting or projection.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum ParameterRole {
    Bindable,
    DynamicProjection,
    Limit,
    Pageable,
    ScrollPosition,
    Sort,
}

impl ParameterRole {
    /// Derive the role from the declared parameter type.
    #[must_use]
    pub fn of(ty: &TypeRef) -> Self {
        match ty.ident() {
            "Pageable" => Self::Pageable,
            "Sort" => Self::Sort,
            "Limit" => Self::Limit,
            "ScrollPosition" | "KeysetScrollPosition" | "OffsetScrollPosition" => {
                Self::ScrollPosition
            }
            "ProjectionType" | "Class" => Self::DynamicProjection,
            _ => Self::Bindable,
        }
    }

    #[must_use]
    pub const fn is_bindable(self) -> bool {
        matches!(self, Self::Bindable)
    }
}

///
/// ParameterDescriptor
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub role: ParameterRole,
}

impl ParameterDescriptor {
    /// Build a parameter whose role is derived from its type.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let role = ParameterRole::of(&ty);

        Self {
            name: name.into(),
            ty,
            role,
        }
    }
}

///
/// QueryAnnotation
/// Declared query text and its options.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct QueryAnnotation {
    pub value: Option<String>,
    pub count_query: Option<String>,
    pub native: bool,
    pub query_rewriter: Option<String>,
}

impl QueryAnnotation {
    #[must_use]
    pub fn jpql(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn native(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            native: true,
            ..Self::default()
        }
    }

    /// Declared query text, if non-blank.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        non_blank(self.value.as_deref())
    }

    #[must_use]
    pub fn count_text(&self) -> Option<&str> {
        non_blank(self.count_query.as_deref())
    }
}

///
/// ModifyingAnnotation
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ModifyingAnnotation {
    pub flush_automatically: bool,
    pub clear_automatically: bool,
}

///
/// EntityGraphType
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum EntityGraphType {
    #[default]
    Fetch,
    Load,
}

impl EntityGraphType {
    /// Parse the lowercase attribute spelling (`fetch` / `load`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fetch" => Some(Self::Fetch),
            "load" => Some(Self::Load),
            _ => None,
        }
    }

    /// Hint key under which the graph is applied to a query.
    #[must_use]
    pub const fn hint_key(self) -> &'static str {
        match self {
            Self::Fetch => "jakarta.persistence.fetchgraph",
            Self::Load => "jakarta.persistence.loadgraph",
        }
    }
}

///
/// EntityGraphHint
///
/// Fetch-graph hint declared on a method. An empty `name` means "use the
/// default graph name for this method".
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EntityGraphHint {
    pub name: Option<String>,
    pub kind: EntityGraphType,
    pub attribute_paths: Vec<String>,
}

impl EntityGraphHint {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attribute_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attribute_paths: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

///
/// ProcedureAnnotation
///
/// Raw stored-procedure reference fields. Any of them may be blank; see
/// `classify::resolve_procedure_reference` for precedence.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProcedureAnnotation {
    pub name: String,
    pub procedure_name: String,
    pub value: String,
}

///
/// QueryHint
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct QueryHint {
    pub name: String,
    pub value: String,
}

///
/// QueryHints
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct QueryHints {
    pub hints: Vec<QueryHint>,
    pub for_counting: bool,
}

impl QueryHints {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

///
/// MethodAnnotations
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MethodAnnotations {
    pub query: Option<QueryAnnotation>,
    pub modifying: Option<ModifyingAnnotation>,
    pub entity_graph: Option<EntityGraphHint>,
    pub procedure: Option<ProcedureAnnotation>,
    pub query_hints: QueryHints,
}

///
/// RepositoryMethodDescriptor
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RepositoryMethodDescriptor {
    pub name: String,
    pub parameters: Vec<ParameterDescriptor>,
    pub return_type: TypeRef,
    pub annotations: MethodAnnotations,
}

impl RepositoryMethodDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type,
            annotations: MethodAnnotations::default(),
        }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.parameters.push(ParameterDescriptor::new(name, ty));
        self
    }

    #[must_use]
    pub fn query(mut self, query: QueryAnnotation) -> Self {
        self.annotations.query = Some(query);
        self
    }

    #[must_use]
    pub const fn modifying(mut self) -> Self {
        self.annotations.modifying = Some(ModifyingAnnotation {
            flush_automatically: false,
            clear_automatically: false,
        });
        self
    }

    #[must_use]
    pub fn entity_graph(mut self, hint: EntityGraphHint) -> Self {
        self.annotations.entity_graph = Some(hint);
        self
    }

    #[must_use]
    pub fn procedure(mut self, procedure: ProcedureAnnotation) -> Self {
        self.annotations.procedure = Some(procedure);
        self
    }

    #[must_use]
    pub fn hint(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.query_hints.hints.push(QueryHint {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Parameters that are bound into the query, in declaration order,
    /// paired with their index in the full parameter list.
    pub fn bindable_parameters(&self) -> impl Iterator<Item = (usize, &ParameterDescriptor)> {
        self.parameters
            .iter()
            .enumerate()
            .filter(|(_, p)| p.role.is_bindable())
    }

    #[must_use]
    pub fn parameter_with_role(&self, role: ParameterRole) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.role == role)
    }

    /// Render `name(a: A, b: B) -> R` for diagnostics.
    #[must_use]
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ");

        format!("{}({params}) -> {}", self.name, self.return_type)
    }

    #[must_use]
    pub fn location(&self, repository: &RepositoryInformation) -> MethodLocation {
        MethodLocation {
            repository: repository.name.clone(),
            signature: self.signature(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
