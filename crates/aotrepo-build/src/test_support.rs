//! Shared fixtures for build tests.

use crate::RepositoryContributor;
use aotrepo_config_build::AotConfig;
use aotrepo_core::{
    metamodel::{AttributeModel, EntityModel, Metamodel, ProjectionKind, ProjectionModel},
    method::{RepositoryInformation, RepositoryMethodDescriptor},
    types::TypeRef,
};
use proc_macro2::TokenStream;
use std::sync::Arc;

pub(crate) fn sample_metamodel() -> Arc<Metamodel> {
    let user = EntityModel::new("User", "id", TypeRef::named("i64"))
        .basic("lastName")
        .basic("firstName")
        .basic("age")
        .basic("email")
        .basic("active")
        .attribute(AttributeModel::association("address", "Address", false))
        .attribute(AttributeModel::association("orders", "Order", true))
        .entity_graph("User.withOrders", ["orders"]);

    let address = EntityModel::new("Address", "id", TypeRef::named("i64")).basic("city");
    let order = EntityModel::new("Order", "id", TypeRef::named("i64")).basic("total");

    Arc::new(
        Metamodel::new("default")
            .with_entity(user)
            .with_entity(address)
            .with_entity(order)
            .with_projection(ProjectionModel::new(
                "NameOnly",
                ProjectionKind::Interface,
                ["firstName", "lastName"],
            ))
            .with_named_query(
                "User.findActiveByCity",
                "select u from User u where u.active = true and u.address.city = :city",
            ),
    )
}

pub(crate) fn user_repository() -> RepositoryInformation {
    RepositoryInformation::new("UserRepository", "User", TypeRef::named("i64"))
}

pub(crate) fn contributor() -> RepositoryContributor {
    RepositoryContributor::new(user_repository(), sample_metamodel(), &AotConfig::default())
        .expect("user repository contributor")
}

pub(crate) fn ty(path: &str) -> TypeRef {
    TypeRef::named(path)
}

pub(crate) fn generic(path: &str, arg: &str) -> TypeRef {
    TypeRef::generic(path, [TypeRef::named(arg)])
}

pub(crate) fn method(name: &str, return_type: TypeRef) -> RepositoryMethodDescriptor {
    RepositoryMethodDescriptor::new(name, return_type)
}

/// Whether `fragment` appears verbatim in the rendered `tokens`.
pub(crate) fn contains(tokens: &TokenStream, fragment: &TokenStream) -> bool {
    tokens.to_string().contains(&fragment.to_string())
}

pub(crate) const USER_REPOSITORY_SOURCE: &str = r#"
use crate::model::User;

#[repository(domain = "User", id = "i64")]
pub trait UserRepository {
    fn find_by_last_name(last_name: String) -> Vec<User>;

    fn find_by_email(email: &str) -> Option<User>;

    fn count_by_active(active: bool) -> i64;

    fn find_active_by_city(city: String) -> Vec<User>;

    #[query(value = "select u from User u where u.email like %:fragment%")]
    fn search(fragment: String) -> Vec<User>;

    #[query(value = "update User u set u.active = false where u.id = :id")]
    #[modifying(clear_automatically)]
    fn deactivate(id: i64) -> i32;

    #[entity_graph(name = "User.withOrders", kind = "load")]
    #[query_hints(hint(name = "org.hibernate.readOnly", value = "true"))]
    fn find_by_age_greater_than(age: i32, pageable: Pageable) -> Page<User>;

    fn find_by_first_name(first_name: String, position: ScrollPosition) -> Window<User>;

    #[procedure(procedure_name = "plus1inout")]
    fn plus_one(arg: i32) -> i32;

    #[procedure]
    fn unnamed(arg: i32) -> i32;
}

trait NotARepository {
    fn ignored(&self);
}
"#;
