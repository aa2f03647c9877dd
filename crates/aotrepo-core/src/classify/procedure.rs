use crate::{method::ProcedureAnnotation, query::QueryMetadata};

///
/// ProcedureReference
///
/// Resolved stored-procedure identifier. `Named` refers to procedure
/// metadata registered under a name; `Plain` is the database procedure name.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProcedureReference {
    Named(String),
    Plain(String),
}

impl ProcedureReference {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) | Self::Plain(name) => name,
        }
    }

    #[must_use]
    pub fn to_metadata(&self) -> QueryMetadata {
        match self {
            Self::Named(name) => QueryMetadata::new().with("procedure-name", name.as_str()),
            Self::Plain(name) => QueryMetadata::new().with("procedure", name.as_str()),
        }
    }
}

/// Resolve the procedure reference: named procedure name, then procedure
/// name, then the generic value. The first non-blank source wins.
#[must_use]
pub fn resolve_procedure_reference(procedure: &ProcedureAnnotation) -> Option<ProcedureReference> {
    if has_text(&procedure.name) {
        return Some(ProcedureReference::Named(procedure.name.clone()));
    }

    if has_text(&procedure.procedure_name) {
        return Some(ProcedureReference::Plain(procedure.procedure_name.clone()));
    }

    if has_text(&procedure.value) {
        return Some(ProcedureReference::Plain(procedure.value.clone()));
    }

    None
}

fn has_text(s: &str) -> bool {
    !s.trim().is_empty()
}
