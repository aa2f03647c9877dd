//! Module: compose
//! Responsibility: emit the token fragments of a generated repository method.
//! Does not own: deciding whether a method is generated at all.
//! Boundary: implements `CodeComposer`; generated code targets the
//! `::aotrepo::runtime` surface and an `entity_manager` field on `self`.

mod execution;
mod query;

#[cfg(test)]
mod tests;

use aotrepo_core::{
    decide::{CodeComposer, ConstructionInput, ExecutionInput},
    error::ContributionError,
    method::{ParameterRole, RepositoryMethodDescriptor},
    query::{AotQuery, BindingTarget},
    types::TypeRef,
};
use proc_macro2::{Literal, TokenStream};
use quote::quote;
use syn::{Ident, Type};

///
/// TokenComposer
/// Composes method bodies as `proc_macro2` token streams.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct TokenComposer;

impl CodeComposer for TokenComposer {
    type Fragment = TokenStream;

    fn construction(&self, input: &ConstructionInput<'_>) -> Result<TokenStream, ContributionError> {
        query::QueryBlockBuilder::new(input).build()
    }

    fn execution(&self, input: &ExecutionInput<'_>) -> Result<TokenStream, ContributionError> {
        execution::ExecutionBlockBuilder::new(input).build()
    }
}

//
// ──────────────────────────
// SHARED HELPERS
// ──────────────────────────
//

// runtime
// Path of the support module generated code calls into.
fn runtime() -> TokenStream {
    quote!(::aotrepo::runtime)
}

/// Parse a `TypeRef` back into a Rust type; `Tuple` maps to the runtime
/// tuple used for interface projections.
pub(crate) fn rust_type(ty: &TypeRef) -> Result<TokenStream, ContributionError> {
    if ty.path == "Tuple" && ty.args.is_empty() {
        let rt = runtime();
        return Ok(quote!(#rt::Tuple));
    }

    let parsed = syn::parse_str::<Type>(&ty.to_string())
        .map_err(|err| ContributionError::compose_invalid(format!("invalid type '{ty}': {err}")))?;

    Ok(quote!(#parsed))
}

pub(crate) fn ident(name: &str) -> Result<Ident, ContributionError> {
    syn::parse_str::<Ident>(name).map_err(|err| {
        ContributionError::compose_invalid(format!("invalid identifier '{name}': {err}"))
    })
}

fn role_ident(
    method: &RepositoryMethodDescriptor,
    role: ParameterRole,
) -> Result<Option<Ident>, ContributionError> {
    method
        .parameter_with_role(role)
        .map(|param| ident(&param.name))
        .transpose()
}

// create_query
// Named queries are created by name; otherwise `create_query` /
// `create_native_query` for a typed row, or the untyped statement variants
// for modifying queries.
fn create_query(
    var: &Ident,
    text_var: &Ident,
    query: &AotQuery,
    row: Option<&TokenStream>,
) -> TokenStream {
    if let Some(name) = query.name() {
        return match row {
            Some(row) => quote! {
                let mut #var = self.entity_manager.create_named_query::<#row>(#name);
            },
            None => quote! {
                let mut #var = self.entity_manager.create_named_statement(#name);
            },
        };
    }

    match (query.native, row) {
        (false, Some(row)) => quote! {
            let mut #var = self.entity_manager.create_query::<#row>(&#text_var);
        },
        (true, Some(row)) => quote! {
            let mut #var = self.entity_manager.create_native_query::<#row>(&#text_var);
        },
        (false, None) => quote! {
            let mut #var = self.entity_manager.create_statement(&#text_var);
        },
        (true, None) => quote! {
            let mut #var = self.entity_manager.create_native_statement(&#text_var);
        },
    }
}

// bind_parameters
// One `set_parameter` call per binding. With `escape` set, LIKE values are
// escaped to match the `ESCAPE '\'` clause of a derived query.
fn bind_parameters(
    var: &Ident,
    query: &AotQuery,
    method: &RepositoryMethodDescriptor,
    escape: bool,
) -> Result<TokenStream, ContributionError> {
    let rt = runtime();

    let mut tokens = quote!();
    for binding in &query.bindings {
        let param = method.parameters.get(binding.origin).ok_or_else(|| {
            ContributionError::compose_invalid(format!(
                "binding refers to missing parameter #{} of '{}'",
                binding.origin, method.name
            ))
        })?;
        let param = ident(&param.name)?;

        let target = match &binding.target {
            BindingTarget::Named(name) => quote!(#name),
            BindingTarget::Position(position) => {
                let position = Literal::usize_unsuffixed(*position);
                quote!(#position)
            }
        };

        let value = match binding.like {
            Some(like) => {
                let pattern = like.pattern("{}");
                if escape {
                    quote!(::std::format!(#pattern, #rt::escape_like(&#param)))
                } else {
                    quote!(::std::format!(#pattern, #param))
                }
            }
            None => quote!(&#param),
        };

        tokens.extend(quote! {
            #var.set_parameter(#target, #value);
        });
    }

    Ok(tokens)
}
