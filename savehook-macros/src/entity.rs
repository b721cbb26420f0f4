//! `#[derive(Entity)]`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Ident, Type, parse_macro_input};

#[derive(Default)]
struct FieldRole {
    id: bool,
    base: bool,
    deleted: bool,
    skip: bool,
}

fn field_role(field: &Field) -> syn::Result<FieldRole> {
    let mut role = FieldRole::default();
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                role.id = true;
            } else if meta.path.is_ident("base") {
                role.base = true;
            } else if meta.path.is_ident("deleted") {
                role.deleted = true;
            } else if meta.path.is_ident("skip") {
                role.skip = true;
            } else {
                return Err(meta.error(
                    "unknown entity attribute, expected `id`, `base`, `deleted` or `skip`",
                ));
            }
            Ok(())
        })?;
    }
    if role.base && (role.id || role.deleted) {
        return Err(syn::Error::new_spanned(
            field,
            "`base` cannot be combined with `id` or `deleted`",
        ));
    }
    Ok(role)
}

/// Picks the single field carrying a role.
fn single<'a>(
    fields: &[(&'a Field, FieldRole)],
    has: impl Fn(&FieldRole) -> bool,
    what: &str,
) -> syn::Result<Option<&'a Field>> {
    let mut found = fields.iter().filter(|(_, role)| has(role)).map(|(field, _)| *field);
    let first = found.next();
    if let Some(extra) = found.next() {
        return Err(syn::Error::new_spanned(
            extra,
            format!("only one field may be marked `{what}`"),
        ));
    }
    Ok(first)
}

/// Implementation of the `Entity` derive macro.
pub fn derive_entity_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Entity can only be derived for structs",
            ));
        }
    };

    let fields = named
        .iter()
        .map(|field| Ok((field, field_role(field)?)))
        .collect::<syn::Result<Vec<_>>>()?;

    let id_field = single(&fields, |role| role.id, "id")?;
    let base_field = single(&fields, |role| role.base, "base")?;
    let deleted_field = single(&fields, |role| role.deleted, "deleted")?;

    let base = base_field.map(|field| (field_ident(field), &field.ty));

    let type_key = base.map(|(_, base_ty): (&Ident, &Type)| {
        quote! {
            fn type_key() -> ::savehook::TypeKey {
                ::savehook::TypeKey::with_base::<Self>(
                    <#base_ty as ::savehook::EntityDescriptor>::type_key,
                )
            }
        }
    });

    let id = match (id_field, base) {
        (Some(field), _) => {
            let ident = field_ident(field);
            quote! { ::savehook::AsEntityId::as_entity_id(&self.#ident) }
        }
        (None, Some((base, _))) => quote! { ::savehook::Entity::id(&self.#base) },
        (None, None) => quote! { ::core::option::Option::None },
    };

    let upcasts = base.map(|(base, _)| {
        quote! {
            fn upcast(
                &self,
                target: ::std::any::TypeId,
            ) -> ::core::option::Option<&dyn ::std::any::Any> {
                if target == ::std::any::TypeId::of::<Self>() {
                    ::core::option::Option::Some(self as &dyn ::std::any::Any)
                } else {
                    ::savehook::Entity::upcast(&self.#base, target)
                }
            }

            fn upcast_mut(
                &mut self,
                target: ::std::any::TypeId,
            ) -> ::core::option::Option<&mut dyn ::std::any::Any> {
                if target == ::std::any::TypeId::of::<Self>() {
                    ::core::option::Option::Some(self as &mut dyn ::std::any::Any)
                } else {
                    ::savehook::Entity::upcast_mut(&mut self.#base, target)
                }
            }
        }
    });

    let seed = match base {
        Some((base, _)) => quote! { ::savehook::Entity::properties(&self.#base) },
        None => quote! { ::savehook::PropertySnapshot::new() },
    };
    let inserts = fields
        .iter()
        .filter(|(_, role)| !role.base && !role.skip)
        .map(|(field, _)| {
            let ident = field_ident(field);
            let property = ident.to_string();
            quote! {
                snapshot.insert(
                    #property,
                    ::savehook::ToPropertyValue::to_property_value(&self.#ident),
                );
            }
        });

    let (soft_delete, soft_deletable) = match (deleted_field, base) {
        (Some(field), _) => {
            let ident = field_ident(field);
            let property = ident.to_string();
            (
                quote! {
                    fn soft_delete(
                        &self,
                    ) -> ::core::option::Option<&dyn ::savehook::SoftDeletable> {
                        ::core::option::Option::Some(self)
                    }
                },
                quote! {
                    impl #impl_generics ::savehook::SoftDeletable
                        for #name #ty_generics #where_clause
                    {
                        fn is_deleted(&self) -> bool {
                            self.#ident
                        }

                        fn deleted_property(&self) -> &'static str {
                            #property
                        }
                    }
                },
            )
        }
        (None, Some((base, _))) => (
            quote! {
                fn soft_delete(&self) -> ::core::option::Option<&dyn ::savehook::SoftDeletable> {
                    ::savehook::Entity::soft_delete(&self.#base)
                }
            },
            TokenStream2::new(),
        ),
        (None, None) => (TokenStream2::new(), TokenStream2::new()),
    };

    Ok(quote! {
        impl #impl_generics ::savehook::EntityDescriptor for #name #ty_generics #where_clause {
            #type_key
        }

        impl #impl_generics ::savehook::Entity for #name #ty_generics #where_clause {
            fn entity_type(&self) -> ::savehook::TypeKey {
                <Self as ::savehook::EntityDescriptor>::type_key()
            }

            fn id(&self) -> ::core::option::Option<::savehook::EntityId> {
                #id
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            #upcasts

            fn properties(&self) -> ::savehook::PropertySnapshot {
                #[allow(unused_mut)]
                let mut snapshot = #seed;
                #(#inserts)*
                snapshot
            }

            #soft_delete
        }

        #soft_deletable
    })
}

fn field_ident(field: &Field) -> &Ident {
    field
        .ident
        .as_ref()
        .unwrap_or_else(|| unreachable!("named fields always carry an ident"))
}
