use crate::{
    classify::{QueryKind, QueryMethodView, ReturnedKind, ReturnedType, named_query_name},
    error::ContributionError,
    metamodel::{EntityModel, Metamodel},
    method::{QueryAnnotation, RepositoryInformation},
    query::{
        AotQueries, AotQuery, BindingTarget, ParameterBinding, QueryEnhancerSelector,
        QuerySource, SubjectKind, declared::bind_declared, part::PartTree, render,
    },
    types::TypeRef,
};
use std::sync::Arc;

///
/// QueryResolver
///
/// Produces the `AotQueries` answering one repository method. Must be
/// deterministic: the same method against the same metamodel yields the
/// same query text and shape.
///

pub trait QueryResolver {
    fn create_queries(
        &self,
        repository: &RepositoryInformation,
        returned_type: &ReturnedType,
        selector: QueryEnhancerSelector,
        declared_query: Option<&QueryAnnotation>,
        view: &QueryMethodView<'_>,
    ) -> Result<AotQueries, ContributionError>;
}

///
/// QueriesFactory
///
/// Metamodel-backed `QueryResolver` covering declared, named and
/// method-name-derived queries.
///

#[derive(Clone, Debug)]
pub struct QueriesFactory {
    metamodel: Arc<Metamodel>,
}

impl QueriesFactory {
    #[must_use]
    pub const fn new(metamodel: Arc<Metamodel>) -> Self {
        Self { metamodel }
    }

    fn declared(
        declared: &QueryAnnotation,
        selector: QueryEnhancerSelector,
        view: &QueryMethodView<'_>,
    ) -> Result<AotQueries, ContributionError> {
        let text = declared.text().ok_or_else(|| {
            ContributionError::query_invalid(format!(
                "method '{}' declares no query text",
                view.name()
            ))
        })?;

        let (text, bindings) = bind_declared(text, view.method())?;
        let result = AotQuery::new(QuerySource::Declared, text, declared.native)
            .with_bindings(bindings);

        if !view.is_page_query() {
            return Ok(AotQueries::new(result));
        }

        let count_text = match declared.count_text() {
            Some(count) => count.to_string(),
            None => selector.select(declared.native).count_query(&result.text)?,
        };
        let (count_text, count_bindings) = bind_declared(&count_text, view.method())?;
        let count = AotQuery::new(QuerySource::Declared, count_text, declared.native)
            .with_bindings(count_bindings);

        Ok(AotQueries::new(result).with_count(count))
    }

    fn named(
        &self,
        entity: &EntityModel,
        selector: QueryEnhancerSelector,
        view: &QueryMethodView<'_>,
    ) -> Result<AotQueries, ContributionError> {
        let name = named_query_name(&entity.name, view.name());
        let text = self
            .metamodel
            .named_query(&name)
            .ok_or_else(|| ContributionError::metamodel_not_found("named query", &name))?;

        let (text, bindings) = bind_declared(text, view.method())?;
        let result = AotQuery::new(QuerySource::Named(name.clone()), text, false)
            .with_bindings(bindings);

        if !view.is_page_query() {
            return Ok(AotQueries::new(result));
        }

        let count_name = format!("{name}.count");
        let (count_source, count_text) = match self.metamodel.named_query(&count_name) {
            Some(count) => (QuerySource::Named(count_name), count.to_string()),
            None => (
                QuerySource::Derived,
                selector.select(false).count_query(&result.text)?,
            ),
        };
        let (count_text, count_bindings) = bind_declared(&count_text, view.method())?;
        let count = AotQuery::new(count_source, count_text, false).with_bindings(count_bindings);

        Ok(AotQueries::new(result).with_count(count))
    }

    fn derived(
        &self,
        entity: &EntityModel,
        returned_type: &ReturnedType,
        view: &QueryMethodView<'_>,
    ) -> Result<AotQueries, ContributionError> {
        let subject = view.subject().ok_or_else(|| {
            ContributionError::query_invalid(format!(
                "method '{}' has no derivable subject",
                view.name()
            ))
        })?;
        let tree = PartTree::parse(&subject.predicate)?;

        let bindable: Vec<usize> = view.method().bindable_parameters().map(|(i, _)| i).collect();
        if tree.arity() != bindable.len() {
            return Err(ContributionError::query_invalid(format!(
                "method '{}' expects {} argument(s) but declares {} bindable parameter(s)",
                view.name(),
                tree.arity(),
                bindable.len()
            )));
        }

        let rendered = render::render(&self.metamodel, entity, subject, &tree, returned_type)?;
        let bindings: Vec<ParameterBinding> = rendered
            .markers
            .iter()
            .zip(&bindable)
            .enumerate()
            .map(|(i, (like, origin))| ParameterBinding {
                target: BindingTarget::Position(i + 1),
                origin: *origin,
                like: *like,
            })
            .collect();

        let limit = match subject.kind {
            SubjectKind::Exists => Some(1),
            _ => subject.max_results,
        };
        let result = AotQuery::new(QuerySource::Derived, rendered.result, false)
            .with_bindings(bindings.clone())
            .with_limit(limit);

        if !view.is_page_query() {
            return Ok(AotQueries::new(result));
        }

        let count = AotQuery::new(QuerySource::Derived, rendered.count, false)
            .with_bindings(bindings);

        Ok(AotQueries::new(result).with_count(count))
    }
}

impl QueryResolver for QueriesFactory {
    fn create_queries(
        &self,
        repository: &RepositoryInformation,
        returned_type: &ReturnedType,
        selector: QueryEnhancerSelector,
        declared_query: Option<&QueryAnnotation>,
        view: &QueryMethodView<'_>,
    ) -> Result<AotQueries, ContributionError> {
        let entity = self.metamodel.required_entity(&repository.domain_type)?;

        match view.kind() {
            QueryKind::Procedure => Err(ContributionError::query_invalid(format!(
                "stored procedure method '{}' has no query to resolve",
                view.name()
            ))),
            QueryKind::Declared => {
                let declared = declared_query.ok_or_else(|| {
                    ContributionError::query_invalid(format!(
                        "method '{}' declares no query",
                        view.name()
                    ))
                })?;
                Self::declared(declared, selector, view)
            }
            QueryKind::Named => self.named(entity, selector, view),
            QueryKind::Derived => self.derived(entity, returned_type, view),
        }
    }
}

/// Type the generated code asks the query to produce per row.
#[must_use]
pub fn query_return_type(returned_type: &ReturnedType) -> TypeRef {
    match returned_type.kind {
        ReturnedKind::Domain => TypeRef::named(returned_type.domain_type.as_str()),
        ReturnedKind::InterfaceProjection => TypeRef::named("Tuple"),
        ReturnedKind::DtoProjection | ReturnedKind::Scalar => returned_type.element_type.clone(),
    }
}
