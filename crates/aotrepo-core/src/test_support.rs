//! Shared fixtures for core tests: a small user/order metamodel and
//! descriptor shorthands.

use crate::{
    metamodel::{AttributeModel, EntityModel, Metamodel, ProjectionKind, ProjectionModel},
    method::{RepositoryInformation, RepositoryMethodDescriptor},
    types::TypeRef,
};
use std::sync::Arc;

pub(crate) const USER_REPOSITORY: &str = "UserRepository";

/// `User { id, lastName, firstName, age, email, active, address, orders }`,
/// `Address { id, city }` and `Order { id, total, customer }`.
pub(crate) fn sample_metamodel() -> Arc<Metamodel> {
    let user = EntityModel::new("User", "id", TypeRef::named("i64"))
        .basic("lastName")
        .basic("firstName")
        .basic("age")
        .basic("email")
        .basic("active")
        .basic("tags")
        .attribute(AttributeModel::association("address", "Address", false))
        .attribute(AttributeModel::association("orders", "Order", true))
        .entity_graph("User.withOrders", ["orders"])
        .entity_graph("User.findByEmail", ["address"]);

    let address = EntityModel::new("Address", "id", TypeRef::named("i64")).basic("city");

    let order = EntityModel::new("Order", "id", TypeRef::named("i64"))
        .named("PurchaseOrder")
        .basic("total")
        .attribute(AttributeModel::association("customer", "User", false));

    let metamodel = Metamodel::new("default")
        .with_entity(user)
        .with_entity(address)
        .with_entity(order)
        .with_projection(ProjectionModel::new(
            "NameOnly",
            ProjectionKind::Interface,
            ["firstName", "lastName"],
        ))
        .with_projection(ProjectionModel::new(
            "UserSummary",
            ProjectionKind::Dto,
            ["lastName", "age"],
        ))
        .with_named_query(
            "User.findActiveByCity",
            "select u from User u where u.active = true and u.address.city = :city",
        )
        .with_named_query(
            "User.pageActive",
            "select u from User u where u.active = true order by u.lastName",
        );

    Arc::new(metamodel)
}

pub(crate) fn user_repository() -> RepositoryInformation {
    RepositoryInformation::new(USER_REPOSITORY, "User", TypeRef::named("i64"))
}

pub(crate) fn ty(path: &str) -> TypeRef {
    TypeRef::named(path)
}

pub(crate) fn vec_of(path: &str) -> TypeRef {
    TypeRef::generic("Vec", [TypeRef::named(path)])
}

pub(crate) fn page_of(path: &str) -> TypeRef {
    TypeRef::generic("Page", [TypeRef::named(path)])
}

pub(crate) fn method(name: &str, return_type: TypeRef) -> RepositoryMethodDescriptor {
    RepositoryMethodDescriptor::new(name, return_type)
}
