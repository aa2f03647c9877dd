//! JPQL rendering of derived queries.

use crate::{
    classify::{ReturnedKind, ReturnedType},
    error::ContributionError,
    metamodel::{AttributeKind, EntityModel, Metamodel, PropertyPath},
    query::{
        LikeKind,
        part::{Operator, Part, PartTree},
        subject::{Subject, SubjectKind},
    },
};

///
/// DerivedQuery
/// Rendered result and count text of a derived query.
///

pub(super) struct DerivedQuery {
    pub(super) result: String,
    pub(super) count: String,
    /// Like-kind of each positional marker, in marker order.
    pub(super) markers: Vec<Option<LikeKind>>,
}

pub(super) fn render(
    metamodel: &Metamodel,
    entity: &EntityModel,
    subject: &Subject,
    tree: &PartTree,
    returned: &ReturnedType,
) -> Result<DerivedQuery, ContributionError> {
    let alias = alias_for(&entity.name);
    let from = format!("FROM {} {alias}", entity.name);

    let mut markers = Vec::new();
    let predicate = render_predicate(metamodel, entity, &alias, tree, &mut markers)?;
    let where_clause = if predicate.is_empty() {
        String::new()
    } else {
        format!(" WHERE {predicate}")
    };

    let select = match subject.kind {
        SubjectKind::Count => count_select(&alias, subject.distinct),
        SubjectKind::Exists => format!("SELECT {alias}.{}", entity.id_attribute),
        SubjectKind::Delete => format!("SELECT {alias}"),
        SubjectKind::Select => {
            select_clause(metamodel, entity, &alias, subject.distinct, returned)?
        }
    };

    let mut result = format!("{select} {from}{where_clause}");
    if !tree.orders.is_empty() && matches!(subject.kind, SubjectKind::Select) {
        let orders = tree
            .orders
            .iter()
            .map(|order| {
                let path = resolve(metamodel, entity, &order.property)?;
                let dir = if order.descending { "DESC" } else { "ASC" };
                Ok(format!("{alias}.{} {dir}", path.dot_path()))
            })
            .collect::<Result<Vec<_>, ContributionError>>()?;
        result.push_str(" ORDER BY ");
        result.push_str(&orders.join(", "));
    }

    let count = format!("{} {from}{where_clause}", count_select(&alias, subject.distinct));

    Ok(DerivedQuery {
        result,
        count,
        markers,
    })
}

/// Query alias for an entity name: its lowercased initial.
pub(super) fn alias_for(entity_name: &str) -> String {
    entity_name
        .chars()
        .next()
        .map_or_else(|| "e".to_string(), |c| c.to_ascii_lowercase().to_string())
}

fn count_select(alias: &str, distinct: bool) -> String {
    if distinct {
        format!("SELECT COUNT(DISTINCT {alias})")
    } else {
        format!("SELECT COUNT({alias})")
    }
}

fn select_clause(
    metamodel: &Metamodel,
    entity: &EntityModel,
    alias: &str,
    distinct: bool,
    returned: &ReturnedType,
) -> Result<String, ContributionError> {
    let distinct = if distinct { "DISTINCT " } else { "" };

    let projection = match returned.kind {
        ReturnedKind::Domain => alias.to_string(),
        ReturnedKind::InterfaceProjection | ReturnedKind::DtoProjection => {
            if returned.properties.is_empty() {
                return Err(ContributionError::query_invalid(format!(
                    "projection type '{}' is not registered in the metamodel",
                    returned.element_type
                )));
            }

            let paths = returned
                .properties
                .iter()
                .map(|p| PropertyPath::resolve(metamodel, &entity.ty, p))
                .collect::<Result<Vec<_>, _>>()?;

            if matches!(returned.kind, ReturnedKind::DtoProjection) {
                let args = paths
                    .iter()
                    .map(|p| format!("{alias}.{}", p.dot_path()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("new {}({args})", returned.element_type.path)
            } else {
                paths
                    .iter()
                    .zip(&returned.properties)
                    .map(|(p, name)| format!("{alias}.{} AS {name}", p.dot_path()))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
        ReturnedKind::Scalar => {
            return Err(ContributionError::query_unsupported(format!(
                "derived queries cannot select scalar type '{}'",
                returned.element_type
            )));
        }
    };

    Ok(format!("SELECT {distinct}{projection}"))
}

fn render_predicate(
    metamodel: &Metamodel,
    entity: &EntityModel,
    alias: &str,
    tree: &PartTree,
    markers: &mut Vec<Option<LikeKind>>,
) -> Result<String, ContributionError> {
    let mut branches = Vec::new();

    for branch in &tree.branches {
        let parts = branch
            .iter()
            .map(|part| render_part(metamodel, entity, alias, part, markers))
            .collect::<Result<Vec<_>, _>>()?;
        branches.push(parts.join(" AND "));
    }

    Ok(branches.join(" OR "))
}

fn render_part(
    metamodel: &Metamodel,
    entity: &EntityModel,
    alias: &str,
    part: &Part,
    markers: &mut Vec<Option<LikeKind>>,
) -> Result<String, ContributionError> {
    let path = resolve(metamodel, entity, &part.property)?;
    let property = format!("{alias}.{}", path.dot_path());

    let mut next = |like: Option<LikeKind>| {
        markers.push(like);
        format!("?{}", markers.len())
    };

    let (lhs, rhs) = if part.ignore_case {
        (format!("UPPER({property})"), "UPPER(".to_string())
    } else {
        (property.clone(), String::new())
    };
    let close = if part.ignore_case { ")" } else { "" };

    let rendered = match part.operator {
        Operator::Equals => format!("{lhs} = {rhs}{}{close}", next(None)),
        Operator::NotEquals => format!("{lhs} <> {rhs}{}{close}", next(None)),
        Operator::LessThan => format!("{property} < {}", next(None)),
        Operator::LessThanEqual => format!("{property} <= {}", next(None)),
        Operator::GreaterThan => format!("{property} > {}", next(None)),
        Operator::GreaterThanEqual => format!("{property} >= {}", next(None)),
        Operator::Between => {
            let low = next(None);
            let high = next(None);
            format!("{property} BETWEEN {low} AND {high}")
        }
        Operator::IsNull => format!("{property} IS NULL"),
        Operator::IsNotNull => format!("{property} IS NOT NULL"),
        Operator::Like => format!("{lhs} LIKE {rhs}{}{close}", next(None)),
        Operator::NotLike => format!("{lhs} NOT LIKE {rhs}{}{close}", next(None)),
        Operator::StartingWith => like(&lhs, &rhs, close, &next(Some(LikeKind::StartingWith))),
        Operator::EndingWith => like(&lhs, &rhs, close, &next(Some(LikeKind::EndingWith))),
        Operator::Containing if is_collection(metamodel, entity, &path) => {
            format!("{} MEMBER OF {property}", next(None))
        }
        Operator::Containing => like(&lhs, &rhs, close, &next(Some(LikeKind::Containing))),
        Operator::NotContaining if is_collection(metamodel, entity, &path) => {
            format!("{} NOT MEMBER OF {property}", next(None))
        }
        Operator::NotContaining => format!(
            "{lhs} NOT LIKE {rhs}{}{close} ESCAPE '\\'",
            next(Some(LikeKind::Containing))
        ),
        Operator::In => format!("{property} IN {}", next(None)),
        Operator::NotIn => format!("{property} NOT IN {}", next(None)),
        Operator::True => format!("{property} = TRUE"),
        Operator::False => format!("{property} = FALSE"),
        Operator::IsEmpty => format!("{property} IS EMPTY"),
        Operator::IsNotEmpty => format!("{property} IS NOT EMPTY"),
    };

    Ok(rendered)
}

fn like(lhs: &str, rhs: &str, close: &str, marker: &str) -> String {
    format!("{lhs} LIKE {rhs}{marker}{close} ESCAPE '\\'")
}

fn is_collection(metamodel: &Metamodel, entity: &EntityModel, path: &PropertyPath) -> bool {
    let mut current = entity;
    let mut segments = path.segments.iter().peekable();

    while let Some(segment) = segments.next() {
        let Some(attribute) = current.get_attribute(segment) else {
            return false;
        };
        if segments.peek().is_none() {
            return attribute.is_collection();
        }
        let AttributeKind::Association { target, .. } = &attribute.kind else {
            return false;
        };
        let Some(next) = metamodel.entity(target) else {
            return false;
        };
        current = next;
    }

    false
}

/// Resolve a method-name property source such as `AddressCity` or
/// `Address_City` into a dotted attribute path.
pub(super) fn resolve(
    metamodel: &Metamodel,
    entity: &EntityModel,
    source: &str,
) -> Result<PropertyPath, ContributionError> {
    if source.contains('_') {
        let dotted = source
            .split('_')
            .map(uncapitalize)
            .collect::<Vec<_>>()
            .join(".");
        return PropertyPath::resolve(metamodel, &entity.ty, &dotted);
    }

    resolve_camel(metamodel, entity, source)?.ok_or_else(|| {
        ContributionError::query_invalid(format!(
            "no property '{}' found on '{}'",
            uncapitalize(source),
            entity.ty
        ))
    })
}

// Try the whole source as one attribute, then split at each uppercase
// boundary from the right and descend into associations.
fn resolve_camel(
    metamodel: &Metamodel,
    entity: &EntityModel,
    source: &str,
) -> Result<Option<PropertyPath>, ContributionError> {
    let whole = uncapitalize(source);
    if entity.get_attribute(&whole).is_some() {
        return Ok(Some(PropertyPath {
            segments: vec![whole],
        }));
    }

    let boundaries: Vec<usize> = source
        .char_indices()
        .skip(1)
        .filter(|(_, c)| c.is_ascii_uppercase())
        .map(|(i, _)| i)
        .collect();

    for &at in boundaries.iter().rev() {
        let head = uncapitalize(&source[..at]);
        let Some(attribute) = entity.get_attribute(&head) else {
            continue;
        };
        let AttributeKind::Association { target, .. } = &attribute.kind else {
            continue;
        };
        let target = metamodel.required_entity(target)?;

        if let Some(mut tail) = resolve_camel(metamodel, target, &source[at..])? {
            tail.segments.insert(0, head);
            return Ok(Some(tail));
        }
    }

    Ok(None)
}

fn uncapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
