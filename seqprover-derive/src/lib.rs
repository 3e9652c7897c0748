//! Derive macros for seqprover reasoner inputs.
//!
//! This crate provides the `#[derive(ReasonerInput)]` macro, which writes the
//! keyed serialization of a reasoner input from its fields.
//!
//! # Example
//!
//! ```ignore
//! use seqprover::formula::{Expression, Predicate};
//! use seqprover::reasoner::input::ReasonerInput;
//!
//! #[derive(Debug, ReasonerInput)]
//! struct CutInput {
//!     #[input(key = "pred")]
//!     lemma: Predicate,
//!
//!     witnesses: Vec<Expression>,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Error, Fields, LitStr};

/// Derive macro for the `ReasonerInput` and `DeserializeInput` traits.
///
/// # Attributes
///
/// ## Field-level
///
/// - `#[input(key = "...")]` - Store the field under another key than its name.
///
/// Every field type must implement `InputField`. Unit structs store nothing.
///
/// # Generated Code
///
/// The macro generates:
/// - `ReasonerInput` implementation writing each field under its key
/// - `DeserializeInput` implementation reading the fields back
#[proc_macro_derive(ReasonerInput, attributes(input))]
pub fn derive_reasoner_input(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_reasoner_input_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_reasoner_input_impl(input: DeriveInput) -> Result<TokenStream2, Error> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (fields, is_unit) = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => {
                let parsed = fields
                    .named
                    .iter()
                    .map(parse_field)
                    .collect::<Result<Vec<_>, _>>()?;
                (parsed, false)
            }
            Fields::Unit => (Vec::new(), true),
            Fields::Unnamed(_) => {
                return Err(Error::new(
                    input.ident.span(),
                    "ReasonerInput cannot be derived for tuple structs",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.ident.span(),
                "ReasonerInput can only be derived for structs",
            ))
        }
    };

    // Reject two fields stored under the same key
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|other| other.key == field.key) {
            return Err(Error::new(
                field.name.span(),
                format!("Key '{}' is used by more than one field", field.key),
            ));
        }
    }

    let writes = fields.iter().map(|f| {
        let field_name = &f.name;
        let key = &f.key;
        quote! {
            ::seqprover::reasoner::input::InputField::write_field(
                &self.#field_name, #key, writer,
            )?;
        }
    });

    let construct = if is_unit {
        quote! { Self }
    } else {
        let reads = fields.iter().map(|f| {
            let field_name = &f.name;
            let key = &f.key;
            quote! {
                #field_name: ::seqprover::reasoner::input::InputField::read_field(#key, reader)?
            }
        });
        quote! { Self { #(#reads),* } }
    };

    let expanded = quote! {
        impl #impl_generics ::seqprover::reasoner::input::ReasonerInput
            for #name #ty_generics #where_clause
        {
            fn serialize(
                &self,
                writer: &mut dyn ::seqprover::reasoner::input::ReasonerInputWriter,
            ) -> ::std::result::Result<(), ::seqprover::reasoner::input::SerializeError> {
                let _ = &writer;
                #(#writes)*
                ::std::result::Result::Ok(())
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl #impl_generics ::seqprover::reasoner::input::DeserializeInput
            for #name #ty_generics #where_clause
        {
            fn deserialize(
                reader: &dyn ::seqprover::reasoner::input::ReasonerInputReader,
            ) -> ::std::result::Result<Self, ::seqprover::reasoner::input::SerializeError> {
                let _ = reader;
                ::std::result::Result::Ok(#construct)
            }
        }
    };

    Ok(expanded)
}

/// A named field and the key it is stored under.
struct ParsedField {
    name: syn::Ident,
    key: String,
}

/// Parse a field and its `#[input(...)]` attribute.
fn parse_field(field: &syn::Field) -> Result<ParsedField, Error> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new(field.span(), "Expected a named field"))?;
    let mut key = None;

    for attr in &field.attrs {
        if !attr.path().is_ident("input") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(meta.error("key cannot be empty"));
                }
                key = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unknown input attribute, expected 'key'"))
            }
        })?;
    }

    let key = key.unwrap_or_else(|| name.to_string().trim_start_matches("r#").to_string());
    Ok(ParsedField { name, key })
}
