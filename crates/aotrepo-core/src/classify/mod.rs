//! Module: classify
//! Responsibility: compute the `QueryMethodView` for one repository method.
//! Does not own: query derivation, contribution decisions.
//! Boundary: pure function of the descriptor, repository and metamodel.

mod procedure;
mod returned;

#[cfg(test)]
mod tests;

pub use procedure::{ProcedureReference, resolve_procedure_reference};
pub use returned::{ReturnedKind, ReturnedType};

use crate::{
    error::ContributionError,
    metamodel::Metamodel,
    method::{ParameterRole, RepositoryInformation, RepositoryMethodDescriptor},
    query::{Subject, SubjectKind, derived_method_name},
    types::TypeRef,
};
use derive_more::Display;

///
/// QueryKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum QueryKind {
    /// Stored-procedure call.
    Procedure,
    /// Query text declared on the method.
    Declared,
    /// Query registered in the metamodel under the method's conventional name.
    Named,
    /// Query derived from the method name.
    Derived,
}

///
/// ResultShape
/// Shape of the declared return type.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ResultShape {
    Single,
    Optional,
    Collection,
    Stream,
    Page,
    Slice,
    Window,
    Count,
    Exists,
    Unit,
}

impl ResultShape {
    // Wrapper idents whose first type argument carries the element type.
    fn of_wrapper(ident: &str) -> Option<Self> {
        match ident {
            "Vec" | "List" | "Set" | "HashSet" | "BTreeSet" | "Collection" => {
                Some(Self::Collection)
            }
            "Option" | "Optional" => Some(Self::Optional),
            "Stream" | "Iterator" => Some(Self::Stream),
            "Page" => Some(Self::Page),
            "Slice" => Some(Self::Slice),
            "Window" => Some(Self::Window),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_multi(self) -> bool {
        matches!(
            self,
            Self::Collection | Self::Stream | Self::Page | Self::Slice | Self::Window
        )
    }
}

///
/// ModifyingReturn
/// What a modifying method hands back to its caller.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ModifyingReturn {
    UpdateCount,
    Unit,
    Other,
}

impl ModifyingReturn {
    #[must_use]
    pub fn of(return_type: &TypeRef) -> Self {
        if return_type.is_update_count() {
            Self::UpdateCount
        } else if return_type.is_unit() {
            Self::Unit
        } else {
            Self::Other
        }
    }

    /// Whether generated code can map this return without fetching results.
    #[must_use]
    pub const fn is_generatable(self) -> bool {
        matches!(self, Self::UpdateCount | Self::Unit)
    }
}

///
/// QueryMethodView
///
/// Classification of one repository method. Computed once, read-only.
///

#[derive(Clone, Debug)]
pub struct QueryMethodView<'a> {
    method: &'a RepositoryMethodDescriptor,
    kind: QueryKind,
    shape: ResultShape,
    subject: Option<Subject>,
    returned_type: ReturnedType,
    modifying_return: ModifyingReturn,
    scroll_position_parameter: bool,
    dynamic_projection: bool,
}

impl<'a> QueryMethodView<'a> {
    #[must_use]
    pub const fn method(&self) -> &'a RepositoryMethodDescriptor {
        self.method
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.method.name
    }

    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        self.kind
    }

    #[must_use]
    pub const fn shape(&self) -> ResultShape {
        self.shape
    }

    /// Parsed method-name subject, present for derived queries only.
    #[must_use]
    pub const fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    #[must_use]
    pub const fn returned_type(&self) -> &ReturnedType {
        &self.returned_type
    }

    #[must_use]
    pub const fn modifying_return(&self) -> ModifyingReturn {
        self.modifying_return
    }

    #[must_use]
    pub const fn is_procedure_query(&self) -> bool {
        matches!(self.kind, QueryKind::Procedure)
    }

    #[must_use]
    pub const fn is_modifying_query(&self) -> bool {
        self.method.annotations.modifying.is_some()
    }

    #[must_use]
    pub const fn is_native_query(&self) -> bool {
        match &self.method.annotations.query {
            Some(query) => query.native,
            None => false,
        }
    }

    #[must_use]
    pub fn is_delete_query(&self) -> bool {
        self.subject
            .as_ref()
            .is_some_and(|s| matches!(s.kind, SubjectKind::Delete))
    }

    #[must_use]
    pub const fn is_scroll_query(&self) -> bool {
        matches!(self.shape, ResultShape::Window)
    }

    #[must_use]
    pub const fn is_page_query(&self) -> bool {
        matches!(self.shape, ResultShape::Page)
    }

    #[must_use]
    pub const fn is_slice_query(&self) -> bool {
        matches!(self.shape, ResultShape::Slice)
    }

    #[must_use]
    pub const fn is_stream_query(&self) -> bool {
        matches!(self.shape, ResultShape::Stream)
    }

    #[must_use]
    pub const fn is_collection_query(&self) -> bool {
        matches!(self.shape, ResultShape::Collection)
    }

    #[must_use]
    pub const fn has_scroll_position_parameter(&self) -> bool {
        self.scroll_position_parameter
    }

    #[must_use]
    pub const fn has_dynamic_projection(&self) -> bool {
        self.dynamic_projection
    }
}

/// Classify a repository method against its repository and the metamodel.
pub fn classify<'a>(
    method: &'a RepositoryMethodDescriptor,
    repository: &RepositoryInformation,
    metamodel: &Metamodel,
) -> Result<QueryMethodView<'a>, ContributionError> {
    let annotations = &method.annotations;
    let entity = metamodel.required_entity(&repository.domain_type)?;

    let kind = if annotations.procedure.is_some() {
        QueryKind::Procedure
    } else if annotations.query.as_ref().and_then(|q| q.text()).is_some() {
        QueryKind::Declared
    } else if metamodel
        .named_query(&named_query_name(&entity.name, &method.name))
        .is_some()
    {
        QueryKind::Named
    } else {
        QueryKind::Derived
    };

    let subject = match kind {
        QueryKind::Derived => Some(Subject::parse(&method.name)?),
        _ => None,
    };

    let scroll_position_parameter = method
        .parameter_with_role(ParameterRole::ScrollPosition)
        .is_some();
    let dynamic_projection = method
        .parameter_with_role(ParameterRole::DynamicProjection)
        .is_some();

    let shape = result_shape(&method.return_type, subject.as_ref());
    let returned_type = ReturnedType::new(
        &repository.domain_type,
        &method.return_type,
        shape,
        dynamic_projection,
        metamodel,
    );

    Ok(QueryMethodView {
        method,
        kind,
        shape,
        subject,
        returned_type,
        modifying_return: ModifyingReturn::of(&method.return_type),
        scroll_position_parameter,
        dynamic_projection,
    })
}

/// Conventional metamodel key for a named query: `{Entity}.{methodName}`.
#[must_use]
pub fn named_query_name(entity_name: &str, method_name: &str) -> String {
    format!("{entity_name}.{}", derived_method_name(method_name))
}

fn result_shape(return_type: &TypeRef, subject: Option<&Subject>) -> ResultShape {
    if let Some(shape) = ResultShape::of_wrapper(return_type.ident())
        && !return_type.args.is_empty()
    {
        return shape;
    }

    if return_type.is_unit() {
        return ResultShape::Unit;
    }

    match subject.map(|s| s.kind) {
        Some(SubjectKind::Count) if return_type.is_update_count() => ResultShape::Count,
        Some(SubjectKind::Exists) if return_type.is_bool() => ResultShape::Exists,
        _ => ResultShape::Single,
    }
}
