use super::{bind_parameters, create_query, role_ident, runtime, rust_type};
use aotrepo_core::{
    classify::{QueryKind, ResultShape},
    decide::ConstructionInput,
    error::ContributionError,
    graph::AotEntityGraph,
    method::ParameterRole,
    types::TypeRef,
};
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

///
/// QueryBlockBuilder
///
/// Emits `query_string` and the configured `query` value: text, sorting,
/// rewriting, creation, bindings, hints, entity graph and row window.
///

pub(super) struct QueryBlockBuilder<'a> {
    input: &'a ConstructionInput<'a>,
}

impl<'a> QueryBlockBuilder<'a> {
    pub(super) const fn new(input: &'a ConstructionInput<'a>) -> Self {
        Self { input }
    }

    pub(super) fn build(&self) -> Result<TokenStream, ContributionError> {
        let mut tokens = quote!();

        tokens.extend(self.text()?);
        tokens.extend(self.create()?);
        tokens.extend(self.bindings()?);
        tokens.extend(self.hints());
        tokens.extend(self.entity_graph()?);
        tokens.extend(self.window()?);

        Ok(tokens)
    }

    // text
    // Named queries are created by name and carry no text here.
    fn text(&self) -> Result<TokenStream, ContributionError> {
        let result = &self.input.queries.result;
        if result.name().is_some() {
            return Ok(quote!());
        }

        let rt = runtime();
        let text = &result.text;
        let method = self.input.view.method();
        let mut tokens = quote! {
            let query_string = ::std::string::String::from(#text);
        };

        if let Some(sort) = role_ident(method, ParameterRole::Sort)? {
            tokens.extend(quote! {
                let query_string = #rt::apply_sort(&query_string, &#sort);
            });
        } else if let Some(pageable) = role_ident(method, ParameterRole::Pageable)? {
            tokens.extend(quote! {
                let query_string = #rt::apply_sort(&query_string, #pageable.sort());
            });
        }

        if let Some(rewriter) = self.input.query_rewriter {
            let rewriter = syn::parse_str::<syn::Path>(rewriter).map_err(|err| {
                ContributionError::compose_invalid(format!(
                    "invalid query rewriter path '{rewriter}': {err}"
                ))
            })?;

            tokens.extend(quote! {
                let query_string = <#rewriter as #rt::QueryRewriter>::rewrite(query_string);
            });
        }

        Ok(tokens)
    }

    fn create(&self) -> Result<TokenStream, ContributionError> {
        let view = self.input.view;
        let query = format_ident!("query");
        let text = format_ident!("query_string");

        if view.is_modifying_query() && !view.is_delete_query() {
            return Ok(create_query(&query, &text, &self.input.queries.result, None));
        }

        let row = rust_type(&self.row_type())?;

        Ok(create_query(
            &query,
            &text,
            &self.input.queries.result,
            Some(&row),
        ))
    }

    // row_type
    // Count and exists probes read a scalar, not the method's element type;
    // derived deletes load the entities they remove.
    fn row_type(&self) -> TypeRef {
        let view = self.input.view;
        if view.is_delete_query() {
            return TypeRef::named(view.returned_type().domain_type.as_str());
        }

        match view.shape() {
            ResultShape::Count if view.kind() == QueryKind::Derived => TypeRef::named("i64"),
            ResultShape::Exists if view.kind() == QueryKind::Derived => {
                self.input.repository.id_type.clone()
            }
            _ => self.input.query_return_type.clone(),
        }
    }

    fn bindings(&self) -> Result<TokenStream, ContributionError> {
        let view = self.input.view;

        bind_parameters(
            &format_ident!("query"),
            &self.input.queries.result,
            view.method(),
            view.kind() == QueryKind::Derived,
        )
    }

    fn hints(&self) -> TokenStream {
        let hints = self.input.hints.hints.iter().map(|hint| {
            let (name, value) = (&hint.name, &hint.value);
            quote! {
                query.set_hint(#name, #value);
            }
        });

        quote!(#(#hints)*)
    }

    fn entity_graph(&self) -> Result<TokenStream, ContributionError> {
        let graph = self.input.entity_graph;
        let Some(kind) = graph.kind() else {
            return Ok(quote!());
        };
        let key = kind.hint_key();

        Ok(match graph {
            AotEntityGraph::Absent => quote!(),
            AotEntityGraph::Named { name, .. } => quote! {
                query.set_hint(#key, self.entity_manager.get_entity_graph(#name));
            },
            AotEntityGraph::Dynamic {
                attribute_paths, ..
            } => {
                let domain = rust_type(&TypeRef::named(
                    self.input.view.returned_type().domain_type.as_str(),
                ))?;
                quote! {
                    let mut entity_graph = self.entity_manager.create_entity_graph::<#domain>();
                    #(entity_graph.add_attribute_path(#attribute_paths);)*
                    query.set_hint(#key, entity_graph);
                }
            }
        })
    }

    // window
    // Static limits first; a `Limit` or `Pageable` argument narrows at runtime.
    // Slices read one extra row to detect a following slice.
    fn window(&self) -> Result<TokenStream, ContributionError> {
        let view = self.input.view;
        let method = view.method();
        let mut tokens = quote!();

        if let Some(limit) = self.input.queries.result.limit {
            let limit = Literal::u32_unsuffixed(limit);
            tokens.extend(quote! {
                query.set_max_results(#limit);
            });
        }

        if let Some(limit) = role_ident(method, ParameterRole::Limit)? {
            tokens.extend(quote! {
                if #limit.is_limited() {
                    query.set_max_results(#limit.max());
                }
            });
        }

        if let Some(pageable) = role_ident(method, ParameterRole::Pageable)? {
            let page_size = if view.is_slice_query() {
                quote!(#pageable.page_size() + 1)
            } else {
                quote!(#pageable.page_size())
            };

            tokens.extend(quote! {
                if #pageable.is_paged() {
                    query.set_first_result(#pageable.offset());
                    query.set_max_results(#page_size);
                }
            });
        }

        Ok(tokens)
    }
}
