use crate::test_support::{contains, contributor, generic, method, ty};
use aotrepo_core::{
    method::{
        EntityGraphHint, EntityGraphType, ModifyingAnnotation, QueryAnnotation,
        RepositoryMethodDescriptor,
    },
    types::TypeRef,
};
use proc_macro2::TokenStream;
use quote::quote;

fn body(descriptor: &RepositoryMethodDescriptor) -> TokenStream {
    let contribution = contributor()
        .contribute_query_method(descriptor)
        .expect("contribution");

    contribution
        .outcome
        .body()
        .cloned()
        .expect("method is generated")
}

fn assert_contains(body: &TokenStream, fragment: &TokenStream) {
    assert!(
        contains(body, fragment),
        "expected `{fragment}` in generated body:\n{body}"
    );
}

#[test]
fn derived_collection_binds_positionally() {
    let body = body(
        &method("find_by_last_name", generic("Vec", "User")).param("last_name", ty("String")),
    );

    let text = "SELECT u FROM User u WHERE u.lastName = ?1";
    assert_contains(&body, &quote!(let query_string = ::std::string::String::from(#text);));
    assert_contains(
        &body,
        &quote!(let mut query = self.entity_manager.create_query::<User>(&query_string);),
    );
    assert_contains(&body, &quote!(query.set_parameter(1, &last_name);));
    assert_contains(
        &body,
        &quote!(query.get_result_list().into_iter().map(::std::convert::identity).collect()),
    );
}

#[test]
fn derived_like_values_are_escaped_and_wrapped() {
    let body = body(
        &method("find_by_email_containing", generic("Vec", "User")).param("email", ty("String")),
    );

    let pattern = "%{}%";
    assert_contains(
        &body,
        &quote!(query.set_parameter(1, ::std::format!(#pattern, ::aotrepo::runtime::escape_like(&email)));),
    );
}

#[test]
fn declared_like_marker_is_wrapped_without_escaping() {
    let body = body(
        &method("search", generic("Vec", "User"))
            .param("fragment", ty("String"))
            .query(QueryAnnotation::jpql(
                "select u from User u where u.email like %:fragment%",
            )),
    );

    let text = "select u from User u where u.email like :fragment";
    let pattern = "%{}%";
    assert_contains(&body, &quote!(::std::string::String::from(#text)));
    assert_contains(
        &body,
        &quote!(query.set_parameter("fragment", ::std::format!(#pattern, fragment));),
    );
}

#[test]
fn named_query_is_created_by_name() {
    let body = body(
        &method("find_active_by_city", generic("Vec", "User")).param("city", ty("String")),
    );

    let name = "User.findActiveByCity";
    assert_contains(
        &body,
        &quote!(let mut query = self.entity_manager.create_named_query::<User>(#name);),
    );
    assert!(!body.to_string().contains("query_string"));
}

#[test]
fn native_query_uses_native_creation() {
    let body = body(
        &method("find_all_raw", generic("Vec", "User"))
            .query(QueryAnnotation::native("select * from users")),
    );

    assert_contains(
        &body,
        &quote!(let mut query = self.entity_manager.create_native_query::<User>(&query_string);),
    );
}

#[test]
fn query_rewriter_is_applied_to_the_text() {
    let body = body(
        &method("find_all_rewritten", generic("Vec", "User")).query(QueryAnnotation {
            query_rewriter: Some("crate::rewrite::TenantRewriter".to_string()),
            ..QueryAnnotation::jpql("select u from User u")
        }),
    );

    assert_contains(
        &body,
        &quote!(let query_string = <crate::rewrite::TenantRewriter as ::aotrepo::runtime::QueryRewriter>::rewrite(query_string);),
    );
}

#[test]
fn page_query_windows_and_counts() {
    let mut descriptor = method("find_by_age_greater_than", generic("Page", "User"))
        .param("age", ty("i32"))
        .param("pageable", ty("Pageable"))
        .hint("org.hibernate.readOnly", "true");
    descriptor.annotations.query_hints.for_counting = true;

    let body = body(&descriptor);

    let count = "SELECT COUNT(u) FROM User u WHERE u.age > ?1";
    let (hint, value) = ("org.hibernate.readOnly", "true");

    assert_contains(
        &body,
        &quote!(let query_string = ::aotrepo::runtime::apply_sort(&query_string, pageable.sort());),
    );
    assert_contains(
        &body,
        &quote! {
            if pageable.is_paged() {
                query.set_first_result(pageable.offset());
                query.set_max_results(pageable.page_size());
            }
        },
    );
    assert_contains(&body, &quote!(let count_query_string = ::std::string::String::from(#count);));
    assert_contains(
        &body,
        &quote!(let mut count_query = self.entity_manager.create_query::<i64>(&count_query_string);),
    );
    assert_contains(&body, &quote!(count_query.set_parameter(1, &age);));
    assert_contains(&body, &quote!(count_query.set_hint(#hint, #value);));
    assert_contains(
        &body,
        &quote!(::aotrepo::runtime::Page::new(content, pageable, move || count_query.get_single_result())),
    );
}

#[test]
fn slice_reads_one_extra_row() {
    let body = body(
        &method("find_by_age_greater_than", generic("Slice", "User"))
            .param("age", ty("i32"))
            .param("pageable", ty("Pageable")),
    );

    assert_contains(&body, &quote!(query.set_max_results(pageable.page_size() + 1);));
    assert_contains(&body, &quote!(::aotrepo::runtime::Slice::new(content, pageable)));
    assert!(!body.to_string().contains("count_query"));
}

#[test]
fn top_subject_sets_a_static_limit() {
    let body = body(
        &method("find_top3_by_active", generic("Vec", "User")).param("active", ty("bool")),
    );

    assert_contains(&body, &quote!(query.set_max_results(3);));
}

#[test]
fn exists_probe_reads_ids() {
    let body = body(&method("exists_by_email", ty("bool")).param("email", ty("String")));

    assert_contains(
        &body,
        &quote!(let mut query = self.entity_manager.create_query::<i64>(&query_string);),
    );
    assert_contains(&body, &quote!(query.set_max_results(1);));
    assert_contains(&body, &quote!(!query.get_result_list().is_empty()));
}

#[test]
fn count_subject_converts_to_the_declared_type() {
    let body = body(&method("count_by_active", ty("i32")).param("active", ty("bool")));

    assert_contains(
        &body,
        &quote!(let mut query = self.entity_manager.create_query::<i64>(&query_string);),
    );
    assert_contains(&body, &quote!(query.get_single_result() as i32));
}

#[test]
fn modifying_query_flushes_and_clears() {
    let mut descriptor = method("deactivate", ty("i32"))
        .param("id", ty("i64"))
        .query(QueryAnnotation::jpql(
            "update User u set u.active = false where u.id = :id",
        ));
    descriptor.annotations.modifying = Some(ModifyingAnnotation {
        flush_automatically: true,
        clear_automatically: true,
    });

    let body = body(&descriptor);

    assert_contains(
        &body,
        &quote!(let mut query = self.entity_manager.create_statement(&query_string);),
    );
    assert_contains(
        &body,
        &quote! {
            self.entity_manager.flush();
            let updated = query.execute_update();
            self.entity_manager.clear();
            updated as i32
        },
    );
}

#[test]
fn modifying_unit_return_discards_the_count() {
    let body = body(
        &method("deactivate_all", TypeRef::unit())
            .query(QueryAnnotation::jpql("update User u set u.active = false"))
            .modifying(),
    );

    assert_contains(&body, &quote!(let _ = updated;));
    assert!(!body.to_string().contains("flush"));
}

#[test]
fn derived_delete_removes_each_entity() {
    let body = body(&method("delete_by_last_name", ty("i64")).param("last_name", ty("String")));

    assert_contains(
        &body,
        &quote! {
            let removed = query.get_result_list();
            for entity in &removed {
                self.entity_manager.remove(entity);
            }
            removed.len() as i64
        },
    );
}

#[test]
fn modifying_derived_delete_still_removes_each_entity() {
    let mut descriptor =
        method("delete_by_last_name", ty("i64")).param("last_name", ty("String"));
    descriptor.annotations.modifying = Some(ModifyingAnnotation {
        flush_automatically: true,
        clear_automatically: true,
    });

    let body = body(&descriptor);

    assert_contains(
        &body,
        &quote!(let mut query = self.entity_manager.create_query::<User>(&query_string);),
    );
    assert_contains(
        &body,
        &quote! {
            self.entity_manager.flush();
            let removed = query.get_result_list();
            for entity in &removed {
                self.entity_manager.remove(entity);
            }
            self.entity_manager.clear();
            removed.len() as i64
        },
    );
    assert!(!body.to_string().contains("execute_update"));
    assert!(!body.to_string().contains("create_statement"));
}

#[test]
fn named_entity_graph_is_applied_as_hint() {
    let body = body(
        &method("find_by_last_name", generic("Vec", "User"))
            .param("last_name", ty("String"))
            .entity_graph(EntityGraphHint {
                kind: EntityGraphType::Load,
                ..EntityGraphHint::named("User.withOrders")
            }),
    );

    let (key, name) = ("jakarta.persistence.loadgraph", "User.withOrders");
    assert_contains(
        &body,
        &quote!(query.set_hint(#key, self.entity_manager.get_entity_graph(#name));),
    );
}

#[test]
fn dynamic_entity_graph_adds_each_path() {
    let body = body(
        &method("find_by_last_name", generic("Vec", "User"))
            .param("last_name", ty("String"))
            .entity_graph(EntityGraphHint::attribute_paths(["orders", "address.city"])),
    );

    let key = "jakarta.persistence.fetchgraph";
    let (orders, city) = ("orders", "address.city");
    assert_contains(
        &body,
        &quote! {
            let mut entity_graph = self.entity_manager.create_entity_graph::<User>();
            entity_graph.add_attribute_path(#orders);
            entity_graph.add_attribute_path(#city);
            query.set_hint(#key, entity_graph);
        },
    );
}

#[test]
fn interface_projection_rows_are_converted() {
    let body = body(
        &method("find_by_active", generic("Vec", "NameOnly")).param("active", ty("bool")),
    );

    assert_contains(
        &body,
        &quote!(self.entity_manager.create_query::<::aotrepo::runtime::Tuple>(&query_string)),
    );
    assert_contains(&body, &quote!(.map(<NameOnly as ::std::convert::From<_>>::from)));
}

#[test]
fn optional_single_result_takes_first_row() {
    let body = body(&method("find_by_email", generic("Option", "User")).param("email", ty("str")));

    assert_contains(
        &body,
        &quote!(query.get_result_list().into_iter().next().map(::std::convert::identity)),
    );
}
