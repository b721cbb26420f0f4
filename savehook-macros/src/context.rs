//! `#[derive(DataContext)]`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, Path, parse_macro_input};

/// Implementation of the `DataContext` derive macro.
pub fn derive_data_context_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut base: Option<Path> = None;
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("context")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("base") {
                base = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unknown context attribute, expected `base = Type`"))
            }
        });
        if let Err(err) = parsed {
            return err.to_compile_error().into();
        }
    }

    let body = base.map(|base| {
        quote! {
            fn context_type() -> ::savehook::TypeKey {
                ::savehook::TypeKey::with_base::<Self>(
                    <#base as ::savehook::DataContext>::context_type,
                )
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics ::savehook::DataContext for #name #ty_generics #where_clause {
            #body
        }
    };

    TokenStream::from(expanded)
}
