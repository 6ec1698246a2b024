extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::Data::Enum;
use syn::{DataEnum, DeriveInput, Expr, ExprLit, Ident, Lit, Meta, Variant};

/// Implement the `std::fmt::Display` trait for the given enum. Only supports enums which have only
/// fieldless variants.
///
/// Each variant is displayed as its identifier unless it carries a `#[display = "..."]` attribute,
/// in which case the attribute's string is used instead.
#[proc_macro_derive(EnumDisplay, attributes(display))]
pub fn enum_display(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");

    let name = &ast.ident;
    let data = fieldless_enum_data(&ast, "EnumDisplay");

    let match_arms: Vec<_> = data
        .variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            let display_name = display_name(variant);
            quote! {
                Self::#variant_name => f.write_str(#display_name)
            }
        })
        .collect();

    let gen = quote! {
        impl std::fmt::Display for #name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    #(#match_arms,)*
                }
            }
        }
    };

    gen.into()
}

/// Implement the `std::str::FromStr` trait for the given enum, with `FromStr::Err` set to `String`.
/// Only supports enums which have only fieldless variants.
///
/// Parsing is case-insensitive and accepts either the variant identifier or its
/// `#[display = "..."]` name. The error message lists every accepted spelling.
#[proc_macro_derive(EnumFromStr, attributes(display))]
pub fn enum_from_str(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");

    let name = &ast.ident;
    let data = fieldless_enum_data(&ast, "EnumFromStr");

    let mut accepted = Vec::new();
    let match_arms: Vec<_> = data
        .variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;

            let mut spellings = vec![variant_name.to_string().to_ascii_lowercase()];
            let display_lowercase = display_name(variant).to_ascii_lowercase();
            if !spellings.contains(&display_lowercase) {
                spellings.push(display_lowercase);
            }
            accepted.extend(spellings.iter().cloned());

            quote! {
                #(#spellings)|* => Ok(Self::#variant_name)
            }
        })
        .collect();

    let err_fmt_string = format!("invalid {name} string '{{}}', expected one of: {}", accepted.join(", "));
    let gen = quote! {
        impl std::str::FromStr for #name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    #(#match_arms,)*
                    _ => Err(format!(#err_fmt_string, s))
                }
            }
        }
    };

    gen.into()
}

/// Implement the `serde::Deserialize` trait for the given type by deserializing a string and
/// parsing it. This requires that the type implements `std::str::FromStr` with an error type that
/// implements `std::fmt::Display`.
#[proc_macro_derive(StrDeserialize)]
pub fn str_deserialize(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect("unable to parse input");

    let ident = &ast.ident;

    let gen = quote! {
        impl<'de> serde::Deserialize<'de> for #ident {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };

    gen.into()
}

fn fieldless_enum_data<'a>(ast: &'a DeriveInput, macro_name: &str) -> &'a DataEnum {
    let name = &ast.ident;

    let Enum(data) = &ast.data else {
        panic!("{macro_name} derive macro can only be applied to enums; {name} is not an enum");
    };

    if let Some(variant) = data.variants.iter().find(|variant| !variant.fields.is_empty()) {
        let variant_name: &Ident = &variant.ident;
        panic!("{macro_name} macro only supports enums with only fieldless variants; {name}::{variant_name} has fields");
    }

    data
}

fn display_name(variant: &Variant) -> String {
    for attr in &variant.attrs {
        if !attr.path().is_ident("display") {
            continue;
        }

        let Meta::NameValue(name_value) = &attr.meta else {
            panic!("display attribute must be of the form #[display = \"...\"]");
        };

        let Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) = &name_value.value else {
            panic!("display attribute value must be a string literal");
        };

        return s.value();
    }

    variant.ident.to_string()
}
