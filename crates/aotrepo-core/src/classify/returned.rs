use crate::{
    classify::ResultShape,
    metamodel::{Metamodel, ProjectionKind},
    types::TypeRef,
};

///
/// ReturnedKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReturnedKind {
    /// The repository's domain type itself.
    Domain,
    /// A registered interface projection, read through a tuple.
    InterfaceProjection,
    /// A class projection, instantiated through a constructor expression.
    DtoProjection,
    /// A single scalar column.
    Scalar,
}

///
/// ReturnedType
///
/// Element type a query hands back once the wrapper (`Vec`, `Page`, ...)
/// has been stripped, and how it relates to the domain type.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReturnedType {
    pub domain_type: String,
    pub element_type: TypeRef,
    pub kind: ReturnedKind,
    pub properties: Vec<String>,
}

impl ReturnedType {
    pub(crate) fn new(
        domain_type: &str,
        return_type: &TypeRef,
        shape: ResultShape,
        dynamic_projection: bool,
        metamodel: &Metamodel,
    ) -> Self {
        // The concrete projection type is unknown until invocation.
        if dynamic_projection {
            return Self::domain(domain_type);
        }

        let element_type = match shape {
            ResultShape::Collection
            | ResultShape::Optional
            | ResultShape::Stream
            | ResultShape::Page
            | ResultShape::Slice
            | ResultShape::Window => return_type.first_arg().unwrap_or(return_type).clone(),
            ResultShape::Count | ResultShape::Exists | ResultShape::Unit => {
                return Self::domain(domain_type);
            }
            ResultShape::Single => return_type.clone(),
        };

        let element = element_type.ident();
        let (kind, properties) = if element == domain_type
            || metamodel.entity(domain_type).is_some_and(|e| e.name == element)
        {
            (ReturnedKind::Domain, Vec::new())
        } else if let Some(projection) = metamodel.projection(element) {
            let kind = match projection.kind {
                ProjectionKind::Interface => ReturnedKind::InterfaceProjection,
                ProjectionKind::Dto => ReturnedKind::DtoProjection,
            };
            (kind, projection.properties.clone())
        } else if element_type.is_scalar() {
            (ReturnedKind::Scalar, Vec::new())
        } else {
            (ReturnedKind::DtoProjection, Vec::new())
        };

        Self {
            domain_type: domain_type.to_string(),
            element_type,
            kind,
            properties,
        }
    }

    fn domain(domain_type: &str) -> Self {
        Self {
            domain_type: domain_type.to_string(),
            element_type: TypeRef::named(domain_type),
            kind: ReturnedKind::Domain,
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_projecting(&self) -> bool {
        matches!(
            self.kind,
            ReturnedKind::InterfaceProjection | ReturnedKind::DtoProjection
        )
    }
}
