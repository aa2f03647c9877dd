use super::*;
use crate::{
    error::{ErrorClass, ErrorOrigin},
    method::{ProcedureAnnotation, QueryAnnotation},
    test_support::{method, page_of, sample_metamodel, ty, user_repository, vec_of},
};
use proptest::prelude::*;

fn classify_ok(descriptor: &RepositoryMethodDescriptor) -> QueryMethodView<'_> {
    let metamodel = sample_metamodel();
    classify(descriptor, &user_repository(), &metamodel).expect("method should classify")
}

#[test]
fn derived_collection_method_classifies_as_derived() {
    let descriptor = method("find_by_last_name", vec_of("User")).param("last_name", ty("String"));
    let view = classify_ok(&descriptor);

    assert_eq!(view.kind(), QueryKind::Derived);
    assert_eq!(view.shape(), ResultShape::Collection);
    assert_eq!(view.returned_type().kind, ReturnedKind::Domain);
    assert_eq!(view.subject().map(|s| s.predicate.as_str()), Some("LastName"));
    assert!(!view.is_modifying_query());
    assert!(!view.is_scroll_query());
}

#[test]
fn procedure_is_recognized_even_when_every_field_is_blank() {
    let descriptor = method("archive", ty("()")).procedure(ProcedureAnnotation::default());
    let view = classify_ok(&descriptor);

    assert!(view.is_procedure_query());
    assert!(view.subject().is_none());
}

#[test]
fn blank_declared_query_falls_through_to_derivation() {
    let descriptor = method("find_by_email", ty("User"))
        .param("email", ty("String"))
        .query(QueryAnnotation::jpql("   "));
    let view = classify_ok(&descriptor);

    assert_eq!(view.kind(), QueryKind::Derived);
}

#[test]
fn declared_query_wins_over_named_and_derived() {
    let descriptor = method("find_active_by_city", vec_of("User"))
        .param("city", ty("String"))
        .query(QueryAnnotation::jpql("select u from User u"));
    let view = classify_ok(&descriptor);

    assert_eq!(view.kind(), QueryKind::Declared);
}

#[test]
fn metamodel_named_query_is_found_by_convention() {
    let descriptor = method("find_active_by_city", vec_of("User")).param("city", ty("String"));
    let view = classify_ok(&descriptor);

    assert_eq!(view.kind(), QueryKind::Named);
    assert!(view.subject().is_none());
    assert_eq!(
        named_query_name("User", "find_active_by_city"),
        "User.findActiveByCity"
    );
}

#[test]
fn modifying_flag_is_independent_of_query_kind() {
    let declared = method("deactivate", ty("i32"))
        .query(QueryAnnotation::jpql("update User u set u.active = false"))
        .modifying();
    let derived = method("delete_by_last_name", ty("()")).param("last_name", ty("String"));

    let declared = classify_ok(&declared);
    let derived = classify_ok(&derived);

    assert!(declared.is_modifying_query());
    assert_eq!(declared.modifying_return(), ModifyingReturn::UpdateCount);
    assert!(!derived.is_modifying_query());
    assert!(derived.is_delete_query());
}

#[test]
fn modifying_return_distinguishes_count_unit_and_other() {
    assert_eq!(ModifyingReturn::of(&ty("i64")), ModifyingReturn::UpdateCount);
    assert_eq!(ModifyingReturn::of(&ty("u32")), ModifyingReturn::UpdateCount);
    assert_eq!(ModifyingReturn::of(&ty("()")), ModifyingReturn::Unit);
    assert_eq!(ModifyingReturn::of(&ty("NameOnly")), ModifyingReturn::Other);
    assert_eq!(ModifyingReturn::of(&vec_of("User")), ModifyingReturn::Other);
    assert!(!ModifyingReturn::Other.is_generatable());
}

#[test]
fn scroll_facts_come_from_parameters_and_window_returns() {
    let by_param = method("find_by_age", page_of("User"))
        .param("age", ty("i32"))
        .param("position", ty("ScrollPosition"));
    let by_return = method("find_by_age", TypeRef::generic("Window", [ty("User")]))
        .param("age", ty("i32"));

    let by_param = classify_ok(&by_param);
    let by_return = classify_ok(&by_return);

    assert!(by_param.has_scroll_position_parameter());
    assert!(by_param.is_page_query());
    assert!(!by_param.is_scroll_query());
    assert!(by_return.is_scroll_query());
    assert!(!by_return.has_scroll_position_parameter());
}

#[test]
fn dynamic_projection_keeps_domain_as_returned_type() {
    let descriptor = method("find_by_last_name", vec_of("T"))
        .param("last_name", ty("String"))
        .param("projection", TypeRef::generic("Class", [ty("T")]));
    let view = classify_ok(&descriptor);

    assert!(view.has_dynamic_projection());
    assert_eq!(view.returned_type().kind, ReturnedKind::Domain);
    assert_eq!(view.method().bindable_parameters().count(), 1);
}

#[test]
fn count_and_exists_shapes_follow_subject_and_return_type() {
    let count = method("count_by_last_name", ty("i64")).param("last_name", ty("String"));
    let exists = method("exists_by_email", ty("bool")).param("email", ty("String"));
    let single = method("find_by_email", TypeRef::generic("Option", [ty("User")]))
        .param("email", ty("String"));

    assert_eq!(classify_ok(&count).shape(), ResultShape::Count);
    assert_eq!(classify_ok(&exists).shape(), ResultShape::Exists);
    assert_eq!(classify_ok(&single).shape(), ResultShape::Optional);
}

#[test]
fn projections_are_resolved_from_the_metamodel() {
    let interface = method("find_by_age", vec_of("NameOnly")).param("age", ty("i32"));
    let dto = method("find_by_age", page_of("UserSummary")).param("age", ty("i32"));

    let interface = classify_ok(&interface);
    let dto = classify_ok(&dto);

    assert_eq!(interface.returned_type().kind, ReturnedKind::InterfaceProjection);
    assert_eq!(
        interface.returned_type().properties,
        vec!["firstName".to_string(), "lastName".to_string()]
    );
    assert_eq!(dto.returned_type().kind, ReturnedKind::DtoProjection);
    assert!(dto.returned_type().is_projecting());
}

#[test]
fn unknown_domain_type_is_a_metamodel_error() {
    let metamodel = sample_metamodel();
    let repository = RepositoryInformation::new("GhostRepository", "Ghost", ty("i64"));
    let descriptor = method("find_by_name", vec_of("Ghost"));

    let err = classify(&descriptor, &repository, &metamodel).expect_err("unknown domain");

    assert_eq!(err.class, ErrorClass::NotFound);
    assert_eq!(err.origin, ErrorOrigin::Metamodel);
}

#[test]
fn unknown_subject_prefix_is_a_query_error() {
    let descriptor = method("frobnicate_by_age", vec_of("User")).param("age", ty("i32"));
    let metamodel = sample_metamodel();

    let err = classify(&descriptor, &user_repository(), &metamodel).expect_err("bad prefix");

    assert_eq!(err.origin, ErrorOrigin::Query);
}

#[test]
fn named_procedure_reference_wins() {
    let procedure = ProcedureAnnotation {
        name: "User.archive".to_string(),
        procedure_name: "archive_users".to_string(),
        value: "archive".to_string(),
    };

    assert_eq!(
        resolve_procedure_reference(&procedure),
        Some(ProcedureReference::Named("User.archive".to_string()))
    );
}

#[test]
fn blank_procedure_sources_resolve_to_nothing() {
    let procedure = ProcedureAnnotation {
        name: " ".to_string(),
        procedure_name: String::new(),
        value: "\t".to_string(),
    };

    assert_eq!(resolve_procedure_reference(&procedure), None);
}

fn source() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), Just("  ".to_string()), "[a-z_]{1,12}"]
}

proptest! {
    #[test]
    fn procedure_reference_is_first_non_blank_source(
        name in source(),
        procedure_name in source(),
        value in source(),
    ) {
        let procedure = ProcedureAnnotation {
            name: name.clone(),
            procedure_name: procedure_name.clone(),
            value: value.clone(),
        };

        let expected = if !name.trim().is_empty() {
            Some(ProcedureReference::Named(name))
        } else if !procedure_name.trim().is_empty() {
            Some(ProcedureReference::Plain(procedure_name))
        } else if !value.trim().is_empty() {
            Some(ProcedureReference::Plain(value))
        } else {
            None
        };

        prop_assert_eq!(resolve_procedure_reference(&procedure), expected);
    }
}
