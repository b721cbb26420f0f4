//! Derive macros for savehook.
//!
//! - `#[derive(Entity)]` - implements `Entity` and `EntityDescriptor`
//! - `#[derive(DataContext)]` - implements `DataContext`

use proc_macro::TokenStream;

mod context;
mod entity;

/// Derive `Entity` and `EntityDescriptor` for a struct with named fields.
///
/// Field attributes:
/// - `#[entity(id)]` - the persistent identity (any `AsEntityId` type)
/// - `#[entity(base)]` - an embedded base entity; the struct derives from
///   its type and delegates identity, upcasts, properties and soft delete to it
/// - `#[entity(deleted)]` - a `bool` soft-delete flag
/// - `#[entity(skip)]` - excluded from property snapshots
///
/// Every other field becomes a property via `ToPropertyValue`.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity_impl(input)
}

/// Derive `DataContext`, optionally declaring a base context with
/// `#[context(base = OtherContext)]`.
#[proc_macro_derive(DataContext, attributes(context))]
pub fn derive_data_context(input: TokenStream) -> TokenStream {
    context::derive_data_context_impl(input)
}
