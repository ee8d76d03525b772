//! Implementation of #[derive(Describe)] for named-field structs

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Fields, GenericParam};

pub fn derive_describe_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct FieldSpec {
    member: syn::Ident,
    key: String,
    ty: syn::Type,
    tags: Vec<(String, String)>,
}

fn expand(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = input.ident.clone();
    let type_name = name.unraw().to_string();

    // Validate: must be a struct with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .map(|field| {
                    // Named fields always carry an ident.
                    let member = field.ident.clone().ok_or_else(|| {
                        syn::Error::new_spanned(field, "Describe requires named fields")
                    })?;
                    Ok(FieldSpec {
                        key: member.unraw().to_string(),
                        member,
                        ty: field.ty.clone(),
                        tags: parse_tag_attrs(&field.attrs)?,
                    })
                })
                .collect::<syn::Result<Vec<_>>>()?,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Describe requires a struct with named fields: struct MyRecord { field: T }",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Describe only works on structs",
            ));
        }
    };

    // Every type parameter must itself be describable.
    for param in &mut input.generics.params {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::shapecast_core::Describe));
        }
    }
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let encode_fields = fields.iter().map(|f| {
        let member = &f.member;
        let key = &f.key;
        quote! { encoder.field(&mut record, #key, &self.#member); }
    });

    let field_shapes = fields.iter().map(|f| {
        let key = &f.key;
        let ty = &f.ty;
        let tags = f.tags.iter().map(|(ns, opts)| quote! { (#ns, #opts) });
        quote! {
            ::shapecast_core::FieldShape {
                ident: #key,
                tags: &[#(#tags),*],
                shape: <#ty as ::shapecast_core::Describe>::shape,
            }
        }
    });

    let assemble_fields = fields.iter().map(|f| {
        let member = &f.member;
        let key = &f.key;
        let ty = &f.ty;
        quote! { #member: reader.take::<#ty>(#key)?, }
    });

    Ok(quote! {
        impl #impl_generics ::shapecast_core::Encode for #name #ty_generics #where_clause {
            fn encode(
                &self,
                encoder: &mut ::shapecast_core::Encoder,
            ) -> ::std::result::Result<::shapecast_core::Value, ::shapecast_core::EncodeError> {
                let mut record = ::std::collections::BTreeMap::new();
                #(#encode_fields)*
                ::std::result::Result::Ok(::shapecast_core::Value::Mapping(record))
            }
        }

        impl #impl_generics ::shapecast_core::Describe for #name #ty_generics #where_clause {
            fn shape() -> ::shapecast_core::Shape {
                ::shapecast_core::Shape::Aggregate(::shapecast_core::AggregateShape {
                    name: #type_name,
                    fields: ::std::vec![#(#field_shapes),*],
                })
            }

            fn assemble(
                value: ::shapecast_core::Value,
            ) -> ::std::result::Result<Self, ::shapecast_core::AssembleError> {
                let mut reader = ::shapecast_core::RecordReader::new(value)?;
                ::std::result::Result::Ok(Self {
                    #(#assemble_fields)*
                })
            }
        }
    })
}

/// Collects `#[tag(ns = "options", ...)]` pairs in declaration order.
fn parse_tag_attrs(attrs: &[syn::Attribute]) -> syn::Result<Vec<(String, String)>> {
    let mut tags = Vec::new();

    for attr in attrs {
        if attr.path().is_ident("tag") {
            attr.parse_nested_meta(|meta| {
                let namespace = meta
                    .path
                    .get_ident()
                    .map(|ident| ident.unraw().to_string())
                    .ok_or_else(|| meta.error("expected a namespace identifier"))?;
                let value: syn::LitStr = meta.value()?.parse()?;
                tags.push((namespace, value.value()));
                Ok(())
            })?;
        }
    }

    Ok(tags)
}
