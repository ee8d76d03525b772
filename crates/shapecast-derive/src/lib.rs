//! Procedural macros for shapecast
//!
//! This crate provides one macro:
//! - `#[derive(Describe)]` - Generate the static shape, encoder and assembler of a record

use proc_macro::TokenStream;

mod describe;

/// Derive macro for record types taking part in schema compilation.
///
/// Generates `shapecast_core::Encode` and `shapecast_core::Describe`. Every
/// field type must itself implement `Describe`.
///
/// # Attributes
///
/// - `#[tag(<namespace> = "<options>")]` - Annotation string for one
///   namespace. Several namespaces can be given in one attribute or spread
///   over several; the schema compiler reads the one it was asked for.
///
/// # Example
///
/// ```ignore
/// #[derive(Describe)]
/// pub struct User {
///     #[tag(cast = "name=user_name,required", api = "in=query")]
///     pub name: String,
///     #[tag(cast = "non_zero")]
///     pub age: u32,
/// }
/// ```
#[proc_macro_derive(Describe, attributes(tag))]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    describe::derive_describe_impl(input)
}
