use proc_macro::TokenStream;
use quote::quote;
use syn::parse::ParseStream;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Path, Token, Type};

/// Derive macro for row mapping targets.
///
/// Generates `impl rowmap_api::descriptor::MapTarget` whose descriptor lists
/// the constructors in declaration order:
///
/// 1. `fields`: one parameter per struct field, in field order
///    (omitted for unit structs or with `#[map_target(skip_fields)]`).
/// 2. Every `#[map_target(constructor(..))]` / `#[map_target(try_constructor(..))]`
///    attribute, in source order.
///
/// # Example
///
/// ```ignore
/// #[derive(MapTarget)]
/// #[map_target(name = "EmployeeTO")]
/// #[map_target(constructor(from_name, String))]
/// #[map_target(try_constructor(parse_id, String))]
/// pub struct Employee {
///     pub id: i32,
///     pub name: Option<String>,
/// }
/// ```
///
/// `constructor(f, T..)` calls `Self::f(T..) -> Self`; `try_constructor(f, T..)`
/// calls `Self::f(T..) -> Result<Self, E>`. A multi-segment path is called as
/// written. Parameter and field types must implement `FromValue`.
#[proc_macro_derive(MapTarget, attributes(map_target))]
pub fn derive_map_target(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

/// One `constructor(..)` / `try_constructor(..)` attribute.
struct ExtraConstructor {
    path: Path,
    params: Vec<Type>,
    fallible: bool,
}

impl ExtraConstructor {
    fn parse(input: ParseStream<'_>, fallible: bool) -> syn::Result<Self> {
        let content;
        syn::parenthesized!(content in input);
        let path: Path = content.parse()?;
        let mut params = Vec::new();
        if !content.is_empty() {
            content.parse::<Token![,]>()?;
            let types = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
            params.extend(types);
        }
        Ok(Self {
            path,
            params,
            fallible,
        })
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "MapTarget does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "MapTarget only supports structs",
            ))
        }
    };

    // Parse #[map_target(...)] attributes.
    let mut type_name = name.to_string();
    let mut skip_fields = false;
    let mut extras = Vec::new();

    for attr in &input.attrs {
        if !attr.path().is_ident("map_target") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                type_name = value.value();
            } else if meta.path.is_ident("skip_fields") {
                skip_fields = true;
            } else if meta.path.is_ident("constructor") {
                extras.push(ExtraConstructor::parse(meta.input, false)?);
            } else if meta.path.is_ident("try_constructor") {
                extras.push(ExtraConstructor::parse(meta.input, true)?);
            } else {
                return Err(meta.error(
                    "unknown map_target attribute (expected name, skip_fields, constructor, try_constructor)",
                ));
            }
            Ok(())
        })?;
    }

    let mut constructor_tokens = Vec::new();

    if !skip_fields {
        match fields {
            Fields::Named(named) => {
                let mut params = Vec::new();
                let mut inits = Vec::new();
                for field in &named.named {
                    let field_name = field.ident.as_ref().ok_or_else(|| {
                        syn::Error::new_spanned(field, "expected named field")
                    })?;
                    let ty = &field.ty;
                    params.push(quote! { <#ty as rowmap_api::descriptor::FromValue>::PARAM });
                    inits.push(quote! { #field_name: __args.take::<#ty>()? });
                }
                constructor_tokens.push(quote! {
                    .constructor(
                        "fields",
                        vec![#(#params),*],
                        |__args: &mut rowmap_api::descriptor::Args| Ok(Self { #(#inits),* }),
                    )
                });
            }
            Fields::Unnamed(unnamed) => {
                let mut params = Vec::new();
                let mut inits = Vec::new();
                for field in &unnamed.unnamed {
                    let ty = &field.ty;
                    params.push(quote! { <#ty as rowmap_api::descriptor::FromValue>::PARAM });
                    inits.push(quote! { __args.take::<#ty>()? });
                }
                constructor_tokens.push(quote! {
                    .constructor(
                        "fields",
                        vec![#(#params),*],
                        |__args: &mut rowmap_api::descriptor::Args| Ok(Self(#(#inits),*)),
                    )
                });
            }
            Fields::Unit => {}
        }
    }

    for extra in &extras {
        let ctor_name = extra
            .path
            .segments
            .iter()
            .map(|seg| seg.ident.to_string())
            .collect::<Vec<_>>()
            .join("::");
        let callee = if extra.path.segments.len() == 1 {
            let path = &extra.path;
            quote! { Self::#path }
        } else {
            let path = &extra.path;
            quote! { #path }
        };
        let params = extra
            .params
            .iter()
            .map(|ty| quote! { <#ty as rowmap_api::descriptor::FromValue>::PARAM });
        let args = extra
            .params
            .iter()
            .map(|ty| quote! { __args.take::<#ty>()? });
        let body = if extra.fallible {
            quote! {
                #callee(#(#args),*).map_err(rowmap_api::error::ConstructionFailure::rejected)
            }
        } else {
            quote! { Ok(#callee(#(#args),*)) }
        };
        constructor_tokens.push(quote! {
            .constructor(
                #ctor_name,
                vec![#(#params),*],
                |__args: &mut rowmap_api::descriptor::Args| #body,
            )
        });
    }

    if constructor_tokens.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "MapTarget needs at least one constructor (fields or #[map_target(constructor(..))])",
        ));
    }

    let expanded = quote! {
        impl rowmap_api::descriptor::MapTarget for #name {
            fn descriptor() -> rowmap_api::descriptor::TypeDescriptor<Self> {
                rowmap_api::descriptor::TypeDescriptor::builder(#type_name)
                    #(#constructor_tokens)*
                    .build()
            }
        }
    };

    Ok(TokenStream::from(expanded))
}
