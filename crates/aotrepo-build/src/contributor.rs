use crate::{Error, compose::TokenComposer, impl_ident};
use aotrepo_config_build::AotConfig;
use aotrepo_core::{
    classify::classify,
    decide::{ContributionDecider, ContributionOutcome},
    graph::EntityGraphLookup,
    metamodel::{EntityInformation, Metamodel},
    method::{RepositoryInformation, RepositoryMethodDescriptor},
    query::{QueriesFactory, QueryEnhancerSelector, QueryMetadata},
};
use proc_macro2::TokenStream;
use quote::quote;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info_span};

///
/// RepositoryContributor
///
/// Contributes the methods of one repository interface. Holds the
/// repository's entity information and the resolvers shared by every
/// method decision.
///

pub struct RepositoryContributor {
    repository: RepositoryInformation,
    entity: EntityInformation,
    metamodel: Arc<Metamodel>,
    selector: QueryEnhancerSelector,
    entity_manager_factory_ref: Option<String>,
    queries: QueriesFactory,
    entity_graphs: EntityGraphLookup,
}

impl RepositoryContributor {
    /// Fails when the repository's domain type is not a metamodel entity or
    /// the configured selector is unknown.
    pub fn new(
        repository: RepositoryInformation,
        metamodel: Arc<Metamodel>,
        config: &AotConfig,
    ) -> Result<Self, Error> {
        let entity = metamodel.entity_information(&repository.domain_type)?;
        let selector = config.query_enhancer_selector()?;

        Ok(Self {
            repository,
            entity,
            selector,
            entity_manager_factory_ref: config.entity_manager_factory_ref().map(str::to_string),
            queries: QueriesFactory::new(Arc::clone(&metamodel)),
            entity_graphs: EntityGraphLookup::new(Arc::clone(&metamodel)),
            metamodel,
        })
    }

    #[must_use]
    pub const fn repository(&self) -> &RepositoryInformation {
        &self.repository
    }

    #[must_use]
    pub const fn entity_information(&self) -> &EntityInformation {
        &self.entity
    }

    #[must_use]
    pub const fn selector(&self) -> QueryEnhancerSelector {
        self.selector
    }

    #[must_use]
    pub fn entity_manager_factory_ref(&self) -> Option<&str> {
        self.entity_manager_factory_ref.as_deref()
    }

    /// Classify and decide one method. Hard errors carry the method's
    /// location; unsupported and metadata-only outcomes are not errors.
    pub fn contribute_query_method(
        &self,
        descriptor: &RepositoryMethodDescriptor,
    ) -> Result<MethodContribution, Error> {
        let decider = ContributionDecider::new(
            &self.repository,
            self.selector,
            &self.queries,
            &self.entity_graphs,
        );
        let view = classify(descriptor, &self.repository, &self.metamodel)
            .map_err(|err| decider.fail(descriptor, err))?;
        let outcome = decider.decide(&view, &TokenComposer)?;

        let item = match outcome.body() {
            Some(body) => Some(method_item(descriptor, body)?),
            None => None,
        };

        Ok(MethodContribution {
            name: descriptor.name.clone(),
            outcome,
            item,
        })
    }

    /// Contribute every method, stopping at the first hard error.
    pub fn contribute(
        &self,
        methods: &[RepositoryMethodDescriptor],
    ) -> Result<RepositoryContribution, Error> {
        let span = info_span!("contribute", repository = %self.repository.name);
        let _enter = span.enter();

        let methods = methods
            .iter()
            .map(|method| self.contribute_query_method(method))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            methods = methods.len(),
            generated = methods.iter().filter(|m| m.outcome.is_generated()).count(),
            "repository contributed"
        );

        Ok(RepositoryContribution {
            repository: self.repository.clone(),
            entity: self.entity.clone(),
            entity_manager_factory_ref: self.entity_manager_factory_ref.clone(),
            methods,
        })
    }
}

///
/// MethodContribution
///

#[derive(Clone, Debug)]
pub struct MethodContribution {
    pub name: String,
    pub outcome: ContributionOutcome<TokenStream>,
    item: Option<TokenStream>,
}

impl MethodContribution {
    #[must_use]
    pub const fn metadata(&self) -> Option<&QueryMetadata> {
        self.outcome.metadata()
    }

    /// The complete `fn` item, present for generated methods only.
    #[must_use]
    pub const fn item(&self) -> Option<&TokenStream> {
        self.item.as_ref()
    }
}

///
/// RepositoryContribution
///

#[derive(Clone, Debug)]
pub struct RepositoryContribution {
    pub repository: RepositoryInformation,
    pub entity: EntityInformation,
    pub entity_manager_factory_ref: Option<String>,
    pub methods: Vec<MethodContribution>,
}

impl RepositoryContribution {
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodContribution> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Metadata document for the runtime fallback. Unsupported methods
    /// publish nothing.
    pub fn metadata_value(&self) -> Result<Value, serde_json::Error> {
        let mut methods = Map::new();
        for method in &self.methods {
            if let Some(metadata) = method.metadata() {
                methods.insert(method.name.clone(), serde_json::to_value(metadata)?);
            }
        }

        let mut document = Map::new();
        document.insert("repository".into(), self.repository.name.clone().into());
        document.insert("domain-type".into(), self.entity.domain_type.clone().into());
        document.insert("entity".into(), self.entity.entity_name.clone().into());
        if let Some(reference) = &self.entity_manager_factory_ref {
            document.insert("entity-manager-factory-ref".into(), reference.clone().into());
        }
        document.insert("methods".into(), Value::Object(methods));

        Ok(Value::Object(document))
    }

    /// Key-sorted JSON rendering of `metadata_value`.
    pub fn metadata_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.metadata_value()?)
    }

    /// `impl {Repository}Impl { .. }` holding the generated methods.
    pub fn to_tokens(&self) -> Result<TokenStream, Error> {
        let ident = impl_ident(&self.repository.name)?;
        let items = self.methods.iter().filter_map(MethodContribution::item);

        Ok(quote! {
            impl #ident {
                #(#items)*
            }
        })
    }
}

// method_item
// Generated parameters are owned; borrowed declarations lose their `&`.
fn method_item(
    descriptor: &RepositoryMethodDescriptor,
    body: &TokenStream,
) -> Result<TokenStream, Error> {
    let name = syn::parse_str::<syn::Ident>(&descriptor.name)?;

    let params = descriptor
        .parameters
        .iter()
        .map(|param| {
            let ident = syn::parse_str::<syn::Ident>(&param.name)?;
            let ty = syn::parse_str::<syn::Type>(&param.ty.to_string())?;
            Ok(quote!(#ident: #ty))
        })
        .collect::<Result<Vec<_>, syn::Error>>()?;

    let output = if descriptor.return_type.is_unit() {
        quote!()
    } else {
        let ty = syn::parse_str::<syn::Type>(&descriptor.return_type.to_string())?;
        quote!(-> #ty)
    };

    Ok(quote! {
        pub fn #name(&self, #(#params),*) #output {
            #body
        }
    })
}
