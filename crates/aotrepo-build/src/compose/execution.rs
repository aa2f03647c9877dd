use super::{bind_parameters, create_query, role_ident, runtime, rust_type};
use aotrepo_core::{
    classify::{ModifyingReturn, QueryKind, ResultShape, ReturnedKind},
    decide::ExecutionInput,
    error::ContributionError,
    method::ParameterRole,
    types::TypeRef,
};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

///
/// ExecutionBlockBuilder
///
/// Runs the configured `query` and converts its rows into the declared
/// return type.
///

pub(super) struct ExecutionBlockBuilder<'a> {
    input: &'a ExecutionInput<'a>,
}

impl<'a> ExecutionBlockBuilder<'a> {
    pub(super) const fn new(input: &'a ExecutionInput<'a>) -> Self {
        Self { input }
    }

    pub(super) fn build(&self) -> Result<TokenStream, ContributionError> {
        let view = self.input.view;

        if view.is_delete_query() {
            self.delete()
        } else if view.is_modifying_query() {
            self.modifying()
        } else {
            self.select()
        }
    }

    fn return_type(&self) -> Result<TokenStream, ContributionError> {
        rust_type(&self.input.view.method().return_type)
    }

    fn modifying(&self) -> Result<TokenStream, ContributionError> {
        let flags = self.input.modifying.copied().unwrap_or_default();
        let mut tokens = quote!();

        if flags.flush_automatically {
            tokens.extend(quote!(self.entity_manager.flush();));
        }
        tokens.extend(quote! {
            let updated = query.execute_update();
        });
        if flags.clear_automatically {
            tokens.extend(quote!(self.entity_manager.clear();));
        }

        match self.input.view.modifying_return() {
            ModifyingReturn::UpdateCount => {
                let ty = self.return_type()?;
                tokens.extend(quote!(updated as #ty));
            }
            ModifyingReturn::Unit => tokens.extend(quote!(let _ = updated;)),
            ModifyingReturn::Other => {
                return Err(ContributionError::compose_invalid(format!(
                    "modifying method '{}' returns '{}' which cannot be generated",
                    self.input.view.name(),
                    self.input.view.method().return_type
                )));
            }
        }

        Ok(tokens)
    }

    // delete
    // Derived deletes load the matching entities and remove them one by one,
    // also when marked modifying. Flush and clear still wrap the removal.
    fn delete(&self) -> Result<TokenStream, ContributionError> {
        let view = self.input.view;
        let return_type = &view.method().return_type;
        let flags = self.input.modifying.copied().unwrap_or_default();

        let mut tokens = quote!();
        if flags.flush_automatically {
            tokens.extend(quote!(self.entity_manager.flush();));
        }
        tokens.extend(quote! {
            let removed = query.get_result_list();
            for entity in &removed {
                self.entity_manager.remove(entity);
            }
        });
        if flags.clear_automatically {
            tokens.extend(quote!(self.entity_manager.clear();));
        }

        tokens.extend(match view.shape() {
            ResultShape::Unit => quote!(),
            ResultShape::Collection => quote!(removed.into_iter().collect()),
            ResultShape::Optional => quote!(removed.into_iter().next()),
            _ if return_type.is_update_count() => {
                let ty = self.return_type()?;
                quote!(removed.len() as #ty)
            }
            ResultShape::Single => {
                let rt = runtime();
                quote!(#rt::single_result(removed))
            }
            shape => {
                return Err(ContributionError::compose_invalid(format!(
                    "delete method '{}' cannot return a {shape} result",
                    view.name()
                )));
            }
        });

        Ok(tokens)
    }

    fn select(&self) -> Result<TokenStream, ContributionError> {
        let view = self.input.view;
        let rt = runtime();
        let convert = self.row_conversion()?;

        Ok(match view.shape() {
            ResultShape::Single => quote! {
                #convert(query.get_single_result())
            },
            ResultShape::Optional => quote! {
                query.get_result_list().into_iter().next().map(#convert)
            },
            ResultShape::Collection => quote! {
                query.get_result_list().into_iter().map(#convert).collect()
            },
            ResultShape::Stream => quote! {
                query.get_result_stream().map(#convert)
            },
            ResultShape::Page => {
                let pageable = self.pageable()?;
                let count = self.count_query()?;
                quote! {
                    let content = query.get_result_list().into_iter().map(#convert).collect::<::std::vec::Vec<_>>();
                    #count
                    #rt::Page::new(content, #pageable, move || count_query.get_single_result())
                }
            }
            ResultShape::Slice => {
                let pageable = self.pageable()?;
                quote! {
                    let content = query.get_result_list().into_iter().map(#convert).collect::<::std::vec::Vec<_>>();
                    #rt::Slice::new(content, #pageable)
                }
            }
            ResultShape::Count => {
                let ty = self.return_type()?;
                quote!(query.get_single_result() as #ty)
            }
            ResultShape::Exists => quote! {
                !query.get_result_list().is_empty()
            },
            ResultShape::Unit => quote! {
                let _ = query.get_result_list();
            },
            ResultShape::Window => {
                return Err(ContributionError::compose_invalid(format!(
                    "scroll method '{}' cannot be generated",
                    view.name()
                )));
            }
        })
    }

    // row_conversion
    // Interface projections are read as tuples and converted per row.
    fn row_conversion(&self) -> Result<TokenStream, ContributionError> {
        let returned = self.input.returned_type;

        match returned.kind {
            ReturnedKind::InterfaceProjection => {
                let element = rust_type(&returned.element_type)?;
                Ok(quote!(<#element as ::std::convert::From<_>>::from))
            }
            ReturnedKind::Domain | ReturnedKind::DtoProjection | ReturnedKind::Scalar => {
                Ok(quote!(::std::convert::identity))
            }
        }
    }

    fn pageable(&self) -> Result<TokenStream, ContributionError> {
        let rt = runtime();

        Ok(
            match role_ident(self.input.view.method(), ParameterRole::Pageable)? {
                Some(pageable) => quote!(#pageable),
                None => quote!(#rt::Pageable::unpaged()),
            },
        )
    }

    // count_query
    // Creates and binds `count_query`; hints are copied when they apply to
    // counting.
    fn count_query(&self) -> Result<TokenStream, ContributionError> {
        let view = self.input.view;
        let count = self.input.queries.count.as_ref().ok_or_else(|| {
            ContributionError::compose_invalid(format!(
                "page method '{}' has no count query",
                view.name()
            ))
        })?;

        let var = format_ident!("count_query");
        let text_var = format_ident!("count_query_string");
        let row = rust_type(&TypeRef::named("i64"))?;

        let mut tokens = quote!();
        if count.name().is_none() {
            let text = &count.text;
            tokens.extend(quote! {
                let #text_var = ::std::string::String::from(#text);
            });
        }
        tokens.extend(create_query(&var, &text_var, count, Some(&row)));
        tokens.extend(bind_parameters(
            &var,
            count,
            view.method(),
            view.kind() == QueryKind::Derived,
        )?);

        let hints = &view.method().annotations.query_hints;
        if hints.for_counting {
            for hint in &hints.hints {
                let (name, value) = (&hint.name, &hint.value);
                tokens.extend(quote! {
                    #var.set_hint(#name, #value);
                });
            }
        }

        Ok(tokens)
    }
}
