use crate::{
    Error, RepositoryContributor, RepositoryInterface, generate, read_repositories,
    test_support::{
        USER_REPOSITORY_SOURCE, contributor, generic, method, sample_metamodel, ty,
        user_repository,
    },
    type_ref,
};
use aotrepo_config_build::AotConfig;
use aotrepo_core::{
    decide::{ContributionOutcome, DegradeReason, UnsupportedReason},
    error::ErrorOrigin,
    method::{EntityGraphType, ParameterRole, QueryAnnotation, RepositoryInformation},
    obs::{contribution_report, contribution_reset_all},
    query::QueryEnhancerSelector,
    types::TypeRef,
};
use proptest::prelude::*;
use serde_json::Value;

fn user_interface() -> RepositoryInterface {
    let file = syn::parse_file(USER_REPOSITORY_SOURCE).expect("source parses");
    let mut interfaces = read_repositories(&file).expect("repositories");

    assert_eq!(interfaces.len(), 1, "only #[repository] traits are read");
    interfaces.remove(0)
}

//
// READER
//

#[test]
fn reader_maps_trait_attributes() {
    let interface = user_interface();

    assert_eq!(interface.information, user_repository());
    assert_eq!(interface.methods.len(), 10);

    let search = &interface.methods[4];
    assert_eq!(search.name, "search");
    assert_eq!(
        search
            .annotations
            .query
            .as_ref()
            .and_then(|q| q.text()),
        Some("select u from User u where u.email like %:fragment%")
    );

    let deactivate = &interface.methods[5];
    let modifying = deactivate.annotations.modifying.expect("modifying");
    assert!(!modifying.flush_automatically);
    assert!(modifying.clear_automatically);

    let paged = &interface.methods[6];
    let graph = paged.annotations.entity_graph.as_ref().expect("entity graph");
    assert_eq!(graph.name.as_deref(), Some("User.withOrders"));
    assert_eq!(graph.kind, EntityGraphType::Load);
    assert_eq!(paged.annotations.query_hints.hints.len(), 1);
    assert!(paged.annotations.query_hints.for_counting);
    assert_eq!(paged.parameters[1].role, ParameterRole::Pageable);

    let unnamed = &interface.methods[9];
    let procedure = unnamed.annotations.procedure.as_ref().expect("procedure");
    assert!(procedure.name.is_empty() && procedure.procedure_name.is_empty());
}

#[test]
fn reader_looks_through_references() {
    let email = &user_interface().methods[1];

    assert_eq!(email.parameters[0].ty, ty("str"));
    assert_eq!(email.return_type, generic("Option", "User"));
}

#[test]
fn type_ref_keeps_paths_and_generic_arguments() {
    let parsed: syn::Type = syn::parse_str("std::collections::BTreeMap<String, Vec<crate::User>>")
        .expect("type parses");

    assert_eq!(
        type_ref(&parsed).expect("type ref"),
        TypeRef::generic(
            "std::collections::BTreeMap",
            [
                ty("String"),
                TypeRef::generic("Vec", [ty("crate::User")]),
            ],
        )
    );
    assert_eq!(
        type_ref(&syn::parse_str("()").expect("unit")).expect("type ref"),
        TypeRef::unit()
    );
}

#[test]
fn reader_rejects_unknown_entity_graph_kind() {
    let source = r#"
        #[repository(domain = "User", id = "i64")]
        trait UserRepository {
            #[entity_graph(kind = "eager")]
            fn find_by_email(email: String) -> Option<User>;
        }
    "#;
    let file = syn::parse_file(source).expect("source parses");

    let err = read_repositories(&file).expect_err("unknown kind");
    assert!(matches!(err, Error::Darling(_)));
    assert!(err.to_string().contains("eager"));
}

#[test]
fn reader_rejects_pattern_parameters() {
    let source = r#"
        #[repository(domain = "User", id = "i64")]
        trait UserRepository {
            fn find_by_email((email, _): (String, i32)) -> Option<User>;
        }
    "#;
    let file = syn::parse_file(source).expect("source parses");

    assert!(matches!(read_repositories(&file), Err(Error::Syn(_))));
}

//
// CONTRIBUTOR
//

#[test]
fn contributor_rejects_unknown_domain_type() {
    let repository = RepositoryInformation::new("GhostRepository", "Ghost", ty("i64"));

    let err = RepositoryContributor::new(repository, sample_metamodel(), &AotConfig::default())
        .err()
        .expect("unknown domain");

    assert!(matches!(err, Error::Contribution(ref e) if e.origin == ErrorOrigin::Metamodel));
}

#[test]
fn contributor_reads_selector_and_factory_reference() {
    let config = AotConfig::from_toml_str(
        r#"
        [repositories]
        query-enhancer-selector = "regex"
        entity-manager-factory-ref = "reportingEntityManagerFactory"
        "#,
    )
    .expect("config");

    let contributor =
        RepositoryContributor::new(user_repository(), sample_metamodel(), &config).expect("ok");

    assert_eq!(contributor.selector(), QueryEnhancerSelector::Regex);
    assert_eq!(
        contributor.entity_manager_factory_ref(),
        Some("reportingEntityManagerFactory")
    );
    assert_eq!(contributor.entity_information().entity_name, "User");
}

#[test]
fn contribute_covers_every_outcome() {
    contribution_reset_all();

    let interface = user_interface();
    let contribution = contributor()
        .contribute(&interface.methods)
        .expect("contribution");

    let generated = [
        "find_by_last_name",
        "find_by_email",
        "count_by_active",
        "find_active_by_city",
        "search",
        "deactivate",
        "find_by_age_greater_than",
    ];
    for name in generated {
        let method = contribution.method(name).expect(name);
        assert!(method.outcome.is_generated(), "{name} is generated");
        assert!(method.item().is_some());
    }

    let scroll = contribution.method("find_by_first_name").expect("scroll");
    assert!(matches!(
        scroll.outcome,
        ContributionOutcome::MetadataOnly {
            reason: DegradeReason::ScrollQuery,
            ..
        }
    ));

    let procedure = contribution.method("plus_one").expect("procedure");
    assert_eq!(
        procedure.metadata().and_then(|m| m.get_str("procedure")),
        Some("plus1inout")
    );

    let unnamed = contribution.method("unnamed").expect("unnamed");
    assert!(matches!(
        unnamed.outcome,
        ContributionOutcome::Unsupported(
            UnsupportedReason::UnresolvedProcedure
        )
    ));
    assert!(unnamed.metadata().is_none());

    let report = contribution_report();
    assert_eq!(report.totals.generated, 7);
    assert_eq!(report.totals.metadata_only(), 2);
    assert_eq!(report.totals.unsupported, 1);
}

#[test]
fn hard_errors_carry_the_method_location() {
    let broken = method("find_by_nickname", generic("Vec", "User")).param("nickname", ty("String"));

    let err = contributor()
        .contribute_query_method(&broken)
        .expect_err("unknown property");

    let Error::Contribution(err) = err else {
        panic!("expected a contribution error, got {err:?}");
    };
    let location = err.method_location().expect("location");
    assert_eq!(location.repository, "UserRepository");
    assert!(location.signature.starts_with("find_by_nickname("));
}

#[test]
fn classification_errors_are_recorded_as_failures() {
    contribution_reset_all();

    let unknown = method("frobnicate_by_name", ty("i64")).param("name", ty("String"));

    let err = contributor()
        .contribute_query_method(&unknown)
        .expect_err("unknown subject");

    let Error::Contribution(err) = err else {
        panic!("expected a contribution error, got {err:?}");
    };
    assert!(err.method_location().is_some());

    let report = contribution_report();
    assert_eq!(report.totals.failed, 1);
    assert_eq!(report.repositories["UserRepository"].failed, 1);
    assert_eq!(report.totals.total(), 1);
}

#[test]
fn non_rust_update_count_spelling_is_not_generated() {
    let descriptor = method("deactivate_all", ty("Long"))
        .query(QueryAnnotation::jpql("update User u set u.active = false"))
        .modifying();

    let contribution = contributor()
        .contribute_query_method(&descriptor)
        .expect("contribution");

    assert!(matches!(
        contribution.outcome,
        ContributionOutcome::MetadataOnly {
            reason: DegradeReason::ModifyingReturn,
            ..
        }
    ));
    assert!(contribution.item().is_none());
}

#[test]
fn metadata_json_is_key_sorted_and_skips_unsupported_methods() {
    let interface = user_interface();
    let contribution = contributor()
        .contribute(&interface.methods)
        .expect("contribution");

    let value: Value =
        serde_json::from_str(&contribution.metadata_json().expect("json")).expect("valid json");

    assert_eq!(value["repository"], "UserRepository");
    assert_eq!(value["entity"], "User");
    assert!(value.get("entity-manager-factory-ref").is_none());

    let methods = value["methods"].as_object().expect("methods");
    assert!(methods.contains_key("find_by_first_name"));
    assert!(!methods.contains_key("unnamed"));
    assert_eq!(
        methods["find_by_last_name"]["query"],
        "SELECT u FROM User u WHERE u.lastName = ?1"
    );
    assert_eq!(
        methods["find_by_age_greater_than"]["count-query"],
        "SELECT COUNT(u) FROM User u WHERE u.age > ?1"
    );

    let keys: Vec<&String> = methods.keys().collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

//
// GENERATE
//

#[test]
fn generate_emits_metadata_and_generated_methods_only() {
    let code = generate(
        USER_REPOSITORY_SOURCE,
        sample_metamodel(),
        &AotConfig::default(),
    )
    .expect("generate");

    let file = syn::parse_file(&code).expect("generated code parses");
    assert_eq!(file.items.len(), 2);

    let syn::Item::Const(metadata) = &file.items[0] else {
        panic!("expected the metadata const first");
    };
    assert_eq!(metadata.ident, "USER_REPOSITORY_METADATA");

    let syn::Item::Impl(imp) = &file.items[1] else {
        panic!("expected the generated impl block");
    };
    let methods: Vec<String> = imp
        .items
        .iter()
        .filter_map(|item| match item {
            syn::ImplItem::Fn(f) => Some(f.sig.ident.to_string()),
            _ => None,
        })
        .collect();

    assert_eq!(methods.len(), 7);
    assert!(methods.contains(&"find_by_age_greater_than".to_string()));
    assert!(!methods.contains(&"find_by_first_name".to_string()));
    assert!(!methods.contains(&"plus_one".to_string()));
}

#[test]
fn generate_without_repositories_is_empty() {
    let code = generate("trait Plain { fn a(&self); }", sample_metamodel(), &AotConfig::default())
        .expect("generate");

    assert!(code.is_empty());
}

#[test]
fn generate_rejects_invalid_source() {
    let err = generate("trait {", sample_metamodel(), &AotConfig::default()).expect_err("syntax");

    assert!(matches!(err, Error::Syn(_)));
}

proptest! {
    #[test]
    fn generate_is_deterministic(selector in prop_oneof![Just("default"), Just("regex")]) {
        let config = AotConfig::from_toml_str(&format!(
            "[repositories]\nquery-enhancer-selector = \"{selector}\"\n"
        ))
        .expect("config");

        let first = generate(USER_REPOSITORY_SOURCE, sample_metamodel(), &config).expect("first");
        let second = generate(USER_REPOSITORY_SOURCE, sample_metamodel(), &config).expect("second");

        prop_assert_eq!(first, second);
    }
}
