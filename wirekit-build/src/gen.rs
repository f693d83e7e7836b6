//! Token emission for messages, enums and service clients.
//!
//! The renderer walks the IR from [`crate::schema`] and produces
//! `proc_macro2::TokenStream`s, pretty-printed by the caller. Generated code
//! references `wirekit_core` and `wirekit_client` by fully qualified path so
//! the output needs no curated import list; a single `use super::*;` brings
//! sibling types of the same package into scope.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::error::GenError;
use crate::registry::TypeRegistry;
use crate::schema::ScalarKind;

mod message;
mod service;
#[cfg(test)]
mod tests;

pub use message::{render_enum, render_message};
pub use service::render_service;

/// Rendering context: the resolved registry plus the package the current
/// output file belongs to.
pub struct Context<'a> {
    pub registry: &'a TypeRegistry,
    pub package: &'a [String],
}

impl Context<'_> {
    /// Token path for a fully qualified proto type name: a bare ident for
    /// same-package types (in scope via `use super::*;`), a `crate::`-rooted
    /// path otherwise.
    pub fn type_path(&self, proto_name: &str) -> Result<TokenStream, GenError> {
        let entry = self.registry.resolve(proto_name)?;
        let ident = format_ident!("{}", entry.ident);
        if entry.package == self.package {
            Ok(quote!(#ident))
        } else {
            let segments = entry
                .package
                .iter()
                .map(|segment| format_ident!("{}", segment));
            Ok(quote!(crate::#(#segments::)*#ident))
        }
    }
}

/// The Rust container type for a scalar kind.
pub(crate) fn scalar_rust_type(kind: ScalarKind) -> TokenStream {
    match kind {
        ScalarKind::Double => quote!(f64),
        ScalarKind::Float => quote!(f32),
        ScalarKind::Int32 | ScalarKind::Sint32 | ScalarKind::Sfixed32 => quote!(i32),
        ScalarKind::Int64 | ScalarKind::Sint64 | ScalarKind::Sfixed64 => quote!(i64),
        ScalarKind::Uint32 | ScalarKind::Fixed32 => quote!(u32),
        ScalarKind::Uint64 | ScalarKind::Fixed64 => quote!(u64),
        ScalarKind::Bool => quote!(bool),
        ScalarKind::String => quote!(String),
        ScalarKind::Bytes => quote!(Vec<u8>),
    }
}

/// The zero-omitting `WireWriter` method for a scalar kind.
pub(crate) fn scalar_write_method(kind: ScalarKind) -> TokenStream {
    match kind {
        ScalarKind::Double => quote!(write_double),
        ScalarKind::Float => quote!(write_float),
        ScalarKind::Int32 => quote!(write_int32),
        ScalarKind::Int64 => quote!(write_int64),
        ScalarKind::Uint32 => quote!(write_uint32),
        ScalarKind::Uint64 => quote!(write_uint64),
        ScalarKind::Sint32 => quote!(write_sint32),
        ScalarKind::Sint64 => quote!(write_sint64),
        ScalarKind::Fixed32 => quote!(write_fixed32),
        ScalarKind::Fixed64 => quote!(write_fixed64),
        ScalarKind::Sfixed32 => quote!(write_sfixed32),
        ScalarKind::Sfixed64 => quote!(write_sfixed64),
        ScalarKind::Bool => quote!(write_bool),
        ScalarKind::String => quote!(write_string),
        ScalarKind::Bytes => quote!(write_bytes),
    }
}

/// The `WireReader` method for a scalar kind.
pub(crate) fn scalar_read_method(kind: ScalarKind) -> TokenStream {
    match kind {
        ScalarKind::Double => quote!(read_double),
        ScalarKind::Float => quote!(read_float),
        ScalarKind::Int32 => quote!(read_int32),
        ScalarKind::Int64 => quote!(read_int64),
        ScalarKind::Uint32 => quote!(read_uint32),
        ScalarKind::Uint64 => quote!(read_uint64),
        ScalarKind::Sint32 => quote!(read_sint32),
        ScalarKind::Sint64 => quote!(read_sint64),
        ScalarKind::Fixed32 => quote!(read_fixed32),
        ScalarKind::Fixed64 => quote!(read_fixed64),
        ScalarKind::Sfixed32 => quote!(read_sfixed32),
        ScalarKind::Sfixed64 => quote!(read_sfixed64),
        ScalarKind::Bool => quote!(read_bool),
        ScalarKind::String => quote!(read_string),
        ScalarKind::Bytes => quote!(read_bytes),
    }
}

/// Statements writing a scalar value unconditionally (no zero-value
/// omission), for repeated elements and populated oneof members.
///
/// `value` is an owned scalar expression for copy kinds, a `&str`-able
/// expression for strings and a byte-slice expression for bytes.
pub(crate) fn scalar_unconditional_write(
    kind: ScalarKind,
    number: u32,
    value: &TokenStream,
) -> TokenStream {
    match kind {
        ScalarKind::Double => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Fixed64);
            writer.write_fixed64_bits((#value).to_bits());
        },
        ScalarKind::Float => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Fixed32);
            writer.write_fixed32_bits((#value).to_bits());
        },
        ScalarKind::Int32 => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Varint);
            writer.write_varint((#value) as i64 as u64);
        },
        ScalarKind::Int64 | ScalarKind::Uint32 | ScalarKind::Bool => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Varint);
            writer.write_varint((#value) as u64);
        },
        ScalarKind::Uint64 => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Varint);
            writer.write_varint(#value);
        },
        ScalarKind::Sint32 => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Varint);
            writer.write_varint(wirekit_core::zigzag_encode32(#value) as u64);
        },
        ScalarKind::Sint64 => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Varint);
            writer.write_varint(wirekit_core::zigzag_encode64(#value));
        },
        ScalarKind::Fixed32 => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Fixed32);
            writer.write_fixed32_bits(#value);
        },
        ScalarKind::Sfixed32 => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Fixed32);
            writer.write_fixed32_bits((#value) as u32);
        },
        ScalarKind::Fixed64 => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Fixed64);
            writer.write_fixed64_bits(#value);
        },
        ScalarKind::Sfixed64 => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Fixed64);
            writer.write_fixed64_bits((#value) as u64);
        },
        ScalarKind::String => quote! {
            writer.write_len_prefixed(#number, (#value).as_bytes());
        },
        ScalarKind::Bytes => quote! {
            writer.write_len_prefixed(#number, #value);
        },
    }
}
