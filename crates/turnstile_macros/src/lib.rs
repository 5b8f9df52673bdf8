//! Procedural macros for turnstile
//!
//! This crate provides procedural macros for the turnstile authorization
//! library:
//! - `#[permission]`: Attribute macro turning an async fn into a permission
//!   builder
//!
//! These macros are re-exported by the main `turnstile` crate and should
//! typically be used through that interface.
//!
//! # Examples
//!
//! ## Context and resource
//!
//! ```ignore
//! use turnstile::prelude::*;
//!
//! #[permission]
//! async fn is_owner(ctx: &AppCtx, post: &Post) -> bool {
//!     post.author_id == ctx.user_id
//! }
//!
//! // The generated builder returns a ready-to-compose permission
//! let can_edit = is_owner().or(is_admin());
//! ```
//!
//! ## Context only
//!
//! ```ignore
//! use turnstile::prelude::*;
//!
//! #[permission(name = "isAdmin")]
//! async fn is_admin(ctx: &AppCtx) -> bool {
//!     ctx.role == Role::Admin
//! }
//! ```
//!
//! ## Fallible checks
//!
//! ```ignore
//! use turnstile::prelude::*;
//!
//! #[permission]
//! async fn is_member(ctx: &AppCtx) -> Result<bool, PermissionError> {
//!     let member = ctx
//!         .store
//!         .lookup(ctx.user_id)
//!         .await
//!         .map_err(PermissionError::check_failed)?;
//!     Ok(member.active)
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{
    Attribute, Block, Expr, ExprLit, FnArg, Ident, ItemFn, Lit, Meta, Pat, PatType, ReturnType,
    Token, Type, Visibility, parse::Parser, parse_macro_input, punctuated::Punctuated,
};

/// Arguments parsed from the `#[permission(...)]` attribute
struct PermissionArgs {
    name: Option<String>,
}

impl PermissionArgs {
    /// Parse arguments from the attribute token stream
    fn parse(attr: TokenStream2) -> syn::Result<Self> {
        let mut name = None;

        if !attr.is_empty() {
            let parser = Punctuated::<Meta, Token![,]>::parse_terminated;
            let metas = parser.parse2(attr)?;

            for meta in metas {
                match meta {
                    Meta::NameValue(nv) => {
                        let ident = nv
                            .path
                            .get_ident()
                            .ok_or_else(|| {
                                syn::Error::new_spanned(&nv.path, "Expected simple identifier")
                            })?
                            .to_string();

                        match ident.as_str() {
                            "name" => {
                                if let Expr::Lit(ExprLit {
                                    lit: Lit::Str(lit), ..
                                }) = &nv.value
                                {
                                    name = Some(lit.value());
                                } else {
                                    return Err(syn::Error::new_spanned(
                                        &nv.value,
                                        "Expected string literal for name",
                                    ));
                                }
                            }
                            _ => {
                                return Err(syn::Error::new_spanned(
                                    &nv.path,
                                    format!("Unknown attribute '{}'", ident),
                                ));
                            }
                        }
                    }
                    _ => {
                        return Err(syn::Error::new_spanned(
                            &meta,
                            "Expected name = \"...\" format",
                        ));
                    }
                }
            }
        }

        Ok(Self { name })
    }
}

/// A parsed check parameter: the binding name and the type behind the `&`
struct CheckParam {
    name: Ident,
    ty: Type,
}

impl CheckParam {
    /// Parse check parameters from the function signature
    fn from_fn_args(inputs: &Punctuated<FnArg, Token![,]>) -> syn::Result<Vec<Self>> {
        let mut params = Vec::new();

        for input in inputs {
            match input {
                FnArg::Typed(PatType { pat, ty, .. }) => {
                    let name = match &**pat {
                        Pat::Ident(pat_ident) => pat_ident.ident.clone(),
                        _ => {
                            return Err(syn::Error::new_spanned(
                                pat,
                                "Only simple parameter names are supported",
                            ));
                        }
                    };

                    let ty = match &**ty {
                        Type::Reference(reference) if reference.mutability.is_none() => {
                            (*reference.elem).clone()
                        }
                        _ => {
                            return Err(syn::Error::new_spanned(
                                ty,
                                "#[permission] parameters must be shared references \
                                 (e.g. `ctx: &AppCtx`)",
                            ));
                        }
                    };

                    params.push(CheckParam { name, ty });
                }
                FnArg::Receiver(_) => {
                    return Err(syn::Error::new_spanned(
                        input,
                        "Self parameter not supported in #[permission]",
                    ));
                }
            }
        }

        Ok(params)
    }
}

/// Validate the function signature
fn validate_function(func: &ItemFn) -> syn::Result<()> {
    // Check for async
    if func.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            func.sig.fn_token,
            "#[permission] requires an async function",
        ));
    }

    // Generic checks cannot become a single trait object
    if !func.sig.generics.params.is_empty() || func.sig.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &func.sig.generics,
            "#[permission] does not support generic functions",
        ));
    }

    // Check return type
    match &func.sig.output {
        ReturnType::Type(_, ty) => {
            let is_valid = matches_type_name(ty, "bool")
                || (is_result_type(ty)
                    && result_ok_type(ty).is_some_and(|ok_ty| matches_type_name(ok_ty, "bool")));

            if !is_valid {
                return Err(syn::Error::new_spanned(
                    ty,
                    "#[permission] requires return type bool or Result<bool, E>",
                ));
            }
        }
        ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                &func.sig,
                "#[permission] requires return type bool or Result<bool, E>",
            ));
        }
    }

    Ok(())
}

/// Check if a type matches a specific type name
fn matches_type_name(ty: &Type, name: &str) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == name;
        }
    }
    false
}

/// Check if a type is Result<T, E>
fn is_result_type(ty: &Type) -> bool {
    matches_type_name(ty, "Result")
}

/// Extract the Ok type from Result<T, E>
fn result_ok_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Result" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(ok_ty)) = args.args.first() {
                        return Some(ok_ty);
                    }
                }
            }
        }
    }
    None
}

/// Create the check struct name: is_owner -> IsOwnerCheck
fn check_struct_name(fn_name: &Ident) -> Ident {
    let pascal = fn_name
        .to_string()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect::<String>()
        + "Check";

    Ident::new(&pascal, Span::call_site())
}

/// Generate the check struct and its Check implementation
fn generate_check(
    check_name: &Ident,
    params: &[CheckParam],
    fn_body: &Block,
    returns_result: bool,
) -> TokenStream2 {
    // A bare bool body gets Ok-wrapped; a Result body is used as-is
    let body = if returns_result {
        quote! { #fn_body }
    } else {
        quote! { Ok(#fn_body) }
    };

    let ctx_name = &params[0].name;
    let ctx_ty = &params[0].ty;

    match params.get(1) {
        Some(resource) => {
            let resource_name = &resource.name;
            let resource_ty = &resource.ty;
            quote! {
                struct #check_name;

                #[async_trait::async_trait]
                impl turnstile::Check<#ctx_ty, #resource_ty> for #check_name {
                    async fn check(
                        &self,
                        #ctx_name: &#ctx_ty,
                        #resource_name: &#resource_ty,
                    ) -> Result<bool, turnstile::PermissionError> {
                        #body
                    }
                }
            }
        }
        None => quote! {
            struct #check_name;

            #[async_trait::async_trait]
            impl turnstile::Check<#ctx_ty> for #check_name {
                async fn check(
                    &self,
                    #ctx_name: &#ctx_ty,
                    _resource: &(),
                ) -> Result<bool, turnstile::PermissionError> {
                    #body
                }
            }
        },
    }
}

/// Generate the builder function that returns the Permission
fn generate_builder(
    attrs: &[Attribute],
    vis: &Visibility,
    fn_name: &Ident,
    permission_name: &str,
    params: &[CheckParam],
    check_name: &Ident,
) -> TokenStream2 {
    let ctx_ty = &params[0].ty;
    let return_ty = match params.get(1) {
        Some(resource) => {
            let resource_ty = &resource.ty;
            quote! { turnstile::Permission<#ctx_ty, #resource_ty> }
        }
        None => quote! { turnstile::Permission<#ctx_ty> },
    };

    quote! {
        #(#attrs)*
        #vis fn #fn_name() -> #return_ty {
            turnstile::Permission::from_check(#permission_name, #check_name)
        }
    }
}

/// Attribute macro for defining permissions from async functions
///
/// The annotated function becomes the check body; the macro replaces it
/// with a builder function of the same name and visibility that returns a
/// `turnstile::Permission`. Doc comments carry over to the builder.
///
/// # Arguments
///
/// * `name` - Optional permission name (defaults to the function name)
///
/// # Requirements
///
/// * Function must be async and non-generic
/// * One or two parameters, both shared references: a context, then an
///   optional resource
/// * Return type must be `bool` or `Result<bool, E>`
///
/// # Example
///
/// ```ignore
/// use turnstile::prelude::*;
///
/// #[permission(name = "isOwner")]
/// async fn is_owner(ctx: &AppCtx, post: &Post) -> bool {
///     post.author_id == ctx.user_id
/// }
///
/// // Use the generated builder
/// let owner = is_owner();
/// assert_eq!(owner.name(), "isOwner");
/// ```
#[proc_macro_attribute]
pub fn permission(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(item as ItemFn);

    // Parse the function and generate the permission definition
    let result = expand_permission(attr.into(), input_fn);

    match result {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Core expansion logic for the permission macro
fn expand_permission(attr: TokenStream2, input_fn: ItemFn) -> syn::Result<TokenStream2> {
    // Validate function signature
    validate_function(&input_fn)?;

    // Parse macro arguments
    let args = PermissionArgs::parse(attr)?;

    // Extract function metadata
    let fn_name = &input_fn.sig.ident;
    let fn_body = &input_fn.block;

    // Determine the permission name (from attribute or function name)
    let permission_name = args.name.unwrap_or_else(|| fn_name.to_string());

    // Parse function parameters: a context plus an optional resource
    let params = CheckParam::from_fn_args(&input_fn.sig.inputs)?;
    if params.is_empty() || params.len() > 2 {
        return Err(syn::Error::new_spanned(
            &input_fn.sig,
            "#[permission] takes a context parameter and an optional resource parameter",
        ));
    }

    // Check if the function returns Result<bool, _> or bare bool
    let returns_result = if let ReturnType::Type(_, ty) = &input_fn.sig.output {
        is_result_type(ty)
    } else {
        false
    };

    let check_name = check_struct_name(fn_name);

    // Generate the check implementation and the builder that replaces the fn
    let check_impl = generate_check(&check_name, &params, fn_body, returns_result);
    let builder_fn = generate_builder(
        &input_fn.attrs,
        &input_fn.vis,
        fn_name,
        &permission_name,
        &params,
        &check_name,
    );

    Ok(quote! {
        #check_impl
        #builder_fn
    })
}
