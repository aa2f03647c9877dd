//! Reads `#[repository]` traits into repository and method descriptors.
//!
//! ```ignore
//! #[repository(domain = "User", id = "i64")]
//! pub trait UserRepository {
//!     #[query(value = "select u from User u where u.email = :email")]
//!     fn find_by_email(email: String) -> Option<User>;
//! }
//! ```

use crate::Error;
use aotrepo_core::{
    method::{
        EntityGraphHint, EntityGraphType, MethodAnnotations, ModifyingAnnotation,
        ParameterDescriptor, ProcedureAnnotation, QueryAnnotation, QueryHint, QueryHints,
        RepositoryInformation, RepositoryMethodDescriptor,
    },
    types::TypeRef,
};
use darling::{Error as DarlingError, FromMeta};
use syn::{
    Attribute, FnArg, GenericArgument, Item, ItemTrait, Meta, Pat, PathArguments, ReturnType,
    TraitItem, TraitItemFn, Type,
};

///
/// RepositoryInterface
/// One `#[repository]` trait and its declared methods.
///

#[derive(Clone, Debug)]
pub struct RepositoryInterface {
    pub information: RepositoryInformation,
    pub methods: Vec<RepositoryMethodDescriptor>,
}

//
// ──────────────────────────
// ATTRIBUTE ARGUMENTS
// ──────────────────────────
//

#[derive(Debug, FromMeta)]
struct RepositoryArgs {
    domain: String,
    id: String,
}

#[derive(Debug, Default, FromMeta)]
struct QueryArgs {
    #[darling(default)]
    value: Option<String>,

    #[darling(default)]
    count_query: Option<String>,

    #[darling(default)]
    native: bool,

    #[darling(default)]
    query_rewriter: Option<String>,
}

#[derive(Debug, Default, FromMeta)]
struct ModifyingArgs {
    #[darling(default)]
    flush_automatically: bool,

    #[darling(default)]
    clear_automatically: bool,
}

#[derive(Debug, Default, FromMeta)]
struct EntityGraphArgs {
    #[darling(default)]
    name: Option<String>,

    #[darling(default)]
    kind: Option<String>,

    #[darling(multiple)]
    attribute_path: Vec<String>,
}

#[derive(Debug, Default, FromMeta)]
struct ProcedureArgs {
    #[darling(default)]
    name: String,

    #[darling(default)]
    procedure_name: String,

    #[darling(default)]
    value: String,
}

#[derive(Debug, FromMeta)]
struct HintArgs {
    name: String,
    value: String,
}

#[derive(Debug, Default, FromMeta)]
struct QueryHintsArgs {
    #[darling(multiple, rename = "hint")]
    hints: Vec<HintArgs>,

    #[darling(default)]
    for_counting: Option<bool>,
}

//
// ──────────────────────────
// READER
// ──────────────────────────
//

/// Read every `#[repository]` trait declared at the top level of `file`.
pub fn read_repositories(file: &syn::File) -> Result<Vec<RepositoryInterface>, Error> {
    file.items
        .iter()
        .filter_map(|item| match item {
            Item::Trait(item) => find_attr(&item.attrs, "repository").map(|attr| (item, attr)),
            _ => None,
        })
        .map(|(item, attr)| read_repository(item, attr))
        .collect()
}

fn read_repository(item: &ItemTrait, attr: &Attribute) -> Result<RepositoryInterface, Error> {
    let args = RepositoryArgs::from_meta(&attr.meta)?;
    let id_type = type_ref(&syn::parse_str::<Type>(&args.id)?)?;

    let information = RepositoryInformation::new(item.ident.to_string(), args.domain, id_type);
    let methods = item
        .items
        .iter()
        .filter_map(|item| match item {
            TraitItem::Fn(method) => Some(read_method(method)),
            _ => None,
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RepositoryInterface {
        information,
        methods,
    })
}

fn read_method(method: &TraitItemFn) -> Result<RepositoryMethodDescriptor, Error> {
    let sig = &method.sig;

    let return_type = match &sig.output {
        ReturnType::Default => TypeRef::unit(),
        ReturnType::Type(_, ty) => type_ref(ty)?,
    };

    let parameters = sig
        .inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Receiver(_) => None,
            FnArg::Typed(arg) => Some(arg),
        })
        .map(|arg| match arg.pat.as_ref() {
            Pat::Ident(pat) => Ok(ParameterDescriptor::new(
                pat.ident.to_string(),
                type_ref(&arg.ty)?,
            )),
            other => Err(syn::Error::new_spanned(
                other,
                "repository method parameters must be plain identifiers",
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RepositoryMethodDescriptor {
        name: sig.ident.to_string(),
        parameters,
        return_type,
        annotations: read_annotations(&method.attrs)?,
    })
}

fn read_annotations(attrs: &[Attribute]) -> Result<MethodAnnotations, DarlingError> {
    let mut annotations = MethodAnnotations::default();

    if let Some(attr) = find_attr(attrs, "query") {
        let args: QueryArgs = read_args(attr)?;
        annotations.query = Some(QueryAnnotation {
            value: args.value,
            count_query: args.count_query,
            native: args.native,
            query_rewriter: args.query_rewriter,
        });
    }

    if let Some(attr) = find_attr(attrs, "modifying") {
        let args: ModifyingArgs = read_args(attr)?;
        annotations.modifying = Some(ModifyingAnnotation {
            flush_automatically: args.flush_automatically,
            clear_automatically: args.clear_automatically,
        });
    }

    if let Some(attr) = find_attr(attrs, "entity_graph") {
        let args: EntityGraphArgs = read_args(attr)?;
        let kind = match args.kind.as_deref() {
            None => EntityGraphType::default(),
            Some(kind) => EntityGraphType::parse(kind).ok_or_else(|| {
                DarlingError::custom(format!("unknown entity graph kind '{kind}'"))
                    .with_span(&attr.meta)
            })?,
        };
        annotations.entity_graph = Some(EntityGraphHint {
            name: args.name,
            kind,
            attribute_paths: args.attribute_path,
        });
    }

    if let Some(attr) = find_attr(attrs, "procedure") {
        let args: ProcedureArgs = read_args(attr)?;
        annotations.procedure = Some(ProcedureAnnotation {
            name: args.name,
            procedure_name: args.procedure_name,
            value: args.value,
        });
    }

    if let Some(attr) = find_attr(attrs, "query_hints") {
        let args: QueryHintsArgs = read_args(attr)?;
        annotations.query_hints = QueryHints {
            hints: args
                .hints
                .into_iter()
                .map(|hint| QueryHint {
                    name: hint.name,
                    value: hint.value,
                })
                .collect(),
            for_counting: args.for_counting.unwrap_or(true),
        };
    }

    Ok(annotations)
}

// read_args
// A bare attribute (`#[modifying]`) takes every default.
fn read_args<T: FromMeta + Default>(attr: &Attribute) -> Result<T, DarlingError> {
    match &attr.meta {
        Meta::Path(_) => Ok(T::default()),
        meta => T::from_meta(meta),
    }
}

fn find_attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(name))
}

/// Convert a Rust type into a `TypeRef`. References and parentheses are
/// looked through; only the last segment's type arguments are kept.
pub fn type_ref(ty: &Type) -> Result<TypeRef, syn::Error> {
    match ty {
        Type::Path(path) if path.qself.is_none() => {
            let segments = &path.path.segments;
            let joined = segments
                .iter()
                .map(|segment| segment.ident.to_string())
                .collect::<Vec<_>>()
                .join("::");

            let args = match segments.last().map(|segment| &segment.arguments) {
                Some(PathArguments::AngleBracketed(generic)) => generic
                    .args
                    .iter()
                    .filter_map(|arg| match arg {
                        GenericArgument::Type(ty) => Some(type_ref(ty)),
                        _ => None,
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };

            Ok(TypeRef::generic(joined, args))
        }
        Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(TypeRef::unit()),
        Type::Reference(reference) => type_ref(&reference.elem),
        Type::Paren(paren) => type_ref(&paren.elem),
        Type::Group(group) => type_ref(&group.elem),
        other => Err(syn::Error::new_spanned(
            other,
            "unsupported type in repository method signature",
        )),
    }
}
