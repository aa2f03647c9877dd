//! Build-time entry point: reads `#[repository]` traits, runs every method
//! through the contribution decider and emits Rust source for the methods
//! that can be generated ahead of time.
#![warn(unreachable_pub)]

mod compose;
mod contributor;
mod parse;

// test
#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

pub use compose::TokenComposer;
pub use contributor::{MethodContribution, RepositoryContribution, RepositoryContributor};
pub use parse::{RepositoryInterface, read_repositories, type_ref};

use aotrepo_config_build::{AotConfig, ConfigError};
use aotrepo_core::{error::ContributionError, metamodel::Metamodel};
use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Contribution(#[from] ContributionError),

    #[error(transparent)]
    Darling(#[from] darling::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Syn(#[from] syn::Error),
}

/// Generate the AOT repository code for every `#[repository]` trait in
/// `source`. Intended to be called from `build.rs`.
pub fn generate(source: &str, metamodel: Arc<Metamodel>, config: &AotConfig) -> Result<String, Error> {
    let file = syn::parse_file(source)?;
    let mut tokens = quote!();

    for interface in read_repositories(&file)? {
        let contributor =
            RepositoryContributor::new(interface.information, Arc::clone(&metamodel), config)?;
        let contribution = contributor.contribute(&interface.methods)?;

        tokens.extend(metadata_const(&contribution)?);
        tokens.extend(contribution.to_tokens()?);
    }

    Ok(tokens.to_string())
}

// metadata_const
// `USER_REPOSITORY_METADATA` holding the repository's metadata document.
fn metadata_const(contribution: &RepositoryContribution) -> Result<TokenStream, Error> {
    let name = format!(
        "{}_METADATA",
        contribution.repository.name.to_case(Case::Constant)
    );
    let ident = syn::parse_str::<syn::Ident>(&name)?;
    let json = contribution.metadata_json()?;

    Ok(quote! {
        pub const #ident: &str = #json;
    })
}

/// Name of the struct the generated methods are implemented on.
fn impl_ident(repository: &str) -> Result<syn::Ident, syn::Error> {
    let ident = syn::parse_str::<syn::Ident>(repository)?;

    Ok(format_ident!("{}Impl", ident))
}
