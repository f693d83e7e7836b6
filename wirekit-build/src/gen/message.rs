//! Message and enum rendering.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::error::GenError;
use crate::r#gen::{
    scalar_read_method, scalar_rust_type, scalar_unconditional_write, scalar_write_method, Context,
};
use crate::schema::{Cardinality, EnumIr, FieldIr, FieldKind, MessageIr, ScalarKind};

/// A Rust identifier for a schema field name, raw-escaped when the name
/// collides with a keyword.
fn field_ident(name: &str) -> Ident {
    syn::parse_str::<Ident>(name).unwrap_or_else(|_| format_ident!("r#{}", name))
}

/// Render one message: the struct, its oneof enums, the `Message` impl and
/// `default_instance`.
pub fn render_message(ctx: &Context<'_>, message: &MessageIr) -> Result<TokenStream, GenError> {
    let ident = format_ident!("{}", message.ident);

    // Synthetic oneofs (proto3 optional) have no members left after
    // lowering; only referenced declarations are rendered.
    let used_oneofs: Vec<usize> = (0..message.oneofs.len())
        .filter(|index| {
            message
                .fields
                .iter()
                .any(|field| field.oneof_index == Some(*index))
        })
        .collect();

    let mut struct_fields = Vec::new();
    for field in message.fields.iter().filter(|f| f.oneof_index.is_none()) {
        let name = field_ident(&field.name);
        let field_type = container_type(ctx, field)?;
        struct_fields.push(quote! { pub #name: #field_type });
    }
    for &index in &used_oneofs {
        let oneof = &message.oneofs[index];
        let name = field_ident(&oneof.name);
        let enum_ident = format_ident!("{}", oneof.enum_ident);
        struct_fields.push(quote! { pub #name: Option<#enum_ident> });
    }

    let mut oneof_enums = Vec::new();
    for &index in &used_oneofs {
        oneof_enums.push(render_oneof_enum(ctx, message, index)?);
    }

    let mut encode_stmts = Vec::new();
    for field in message.fields.iter().filter(|f| f.oneof_index.is_none()) {
        encode_stmts.push(encode_field(ctx, field)?);
    }
    for &index in &used_oneofs {
        encode_stmts.push(encode_oneof(message, index));
    }

    let mut decode_arms = Vec::new();
    for field in &message.fields {
        decode_arms.push(decode_arm(ctx, message, field)?);
    }

    Ok(quote! {
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct #ident {
            #(#struct_fields,)*
        }

        #(#oneof_enums)*

        impl #ident {
            pub fn default_instance() -> &'static Self {
                static INSTANCE: std::sync::OnceLock<#ident> = std::sync::OnceLock::new();
                INSTANCE.get_or_init(Self::default)
            }
        }

        impl wirekit_core::Message for #ident {
            fn encode_raw(&self, writer: &mut wirekit_core::WireWriter) {
                #(#encode_stmts)*
            }

            fn decode_from(
                reader: &mut wirekit_core::WireReader<'_>,
            ) -> Result<Self, wirekit_core::DecodeError> {
                let mut message = Self::default();
                while let Some((field, wire)) = reader.read_tag()? {
                    match field {
                        #(#decode_arms)*
                        _ => reader.skip(wire)?,
                    }
                }
                Ok(message)
            }
        }
    })
}

/// Render one enum with declared-number discriminants and the
/// fallback-to-zero-member `from_i32`.
pub fn render_enum(enum_ir: &EnumIr) -> TokenStream {
    let ident = format_ident!("{}", enum_ir.ident);

    if enum_ir.variants.is_empty() {
        return quote! {
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
            #[repr(i32)]
            pub enum #ident {}
        };
    }

    // The decode fallback is the zero-valued member, or the lowest number
    // when no zero member exists.
    let fallback = enum_ir
        .variants
        .iter()
        .position(|variant| variant.number == 0)
        .or_else(|| {
            enum_ir
                .variants
                .iter()
                .enumerate()
                .min_by_key(|(_, variant)| variant.number)
                .map(|(index, _)| index)
        })
        .unwrap_or(0);
    let fallback_ident = format_ident!("{}", enum_ir.variants[fallback].ident);

    let variants: Vec<TokenStream> = enum_ir
        .variants
        .iter()
        .enumerate()
        .map(|(index, variant)| {
            let variant_ident = format_ident!("{}", variant.ident);
            let number = variant.number;
            if index == fallback {
                quote! {
                    #[default]
                    #variant_ident = #number
                }
            } else {
                quote! { #variant_ident = #number }
            }
        })
        .collect();

    let from_arms: Vec<TokenStream> = enum_ir
        .variants
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != fallback)
        .map(|(_, variant)| {
            let variant_ident = format_ident!("{}", variant.ident);
            let number = variant.number;
            quote! { #number => #ident::#variant_ident, }
        })
        .collect();

    quote! {
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum #ident {
            #(#variants,)*
        }

        impl #ident {
            /// Map a wire integer to a member, falling back to the zero
            /// member for numbers this schema does not know.
            pub fn from_i32(value: i32) -> #ident {
                match value {
                    #(#from_arms)*
                    _ => #ident::#fallback_ident,
                }
            }

            /// The declared number of this member.
            pub fn number(self) -> i32 {
                self as i32
            }
        }
    }
}

/// The struct container type for one non-oneof field.
fn container_type(ctx: &Context<'_>, field: &FieldIr) -> Result<TokenStream, GenError> {
    let element = match &field.kind {
        FieldKind::Scalar(scalar) => scalar_rust_type(*scalar),
        FieldKind::Message(name) | FieldKind::Enum(name) => ctx.type_path(name)?,
    };
    Ok(match &field.cardinality {
        Cardinality::Singular => match &field.kind {
            FieldKind::Message(_) => quote!(Option<Box<#element>>),
            _ => element,
        },
        Cardinality::Repeated => quote!(Vec<#element>),
        Cardinality::Map { key, value } => {
            let key_type = scalar_rust_type(*key);
            let value_type = match value {
                FieldKind::Scalar(scalar) => scalar_rust_type(*scalar),
                FieldKind::Message(name) | FieldKind::Enum(name) => ctx.type_path(name)?,
            };
            quote!(std::collections::HashMap<#key_type, #value_type>)
        }
    })
}

fn render_oneof_enum(
    ctx: &Context<'_>,
    message: &MessageIr,
    index: usize,
) -> Result<TokenStream, GenError> {
    let oneof = &message.oneofs[index];
    let enum_ident = format_ident!("{}", oneof.enum_ident);

    let mut variants = Vec::new();
    for field in member_fields(message, index) {
        let variant = variant_ident(field);
        let payload = match &field.kind {
            FieldKind::Scalar(scalar) => scalar_rust_type(*scalar),
            FieldKind::Enum(name) => ctx.type_path(name)?,
            FieldKind::Message(name) => {
                let path = ctx.type_path(name)?;
                quote!(Box<#path>)
            }
        };
        variants.push(quote! { #variant(#payload) });
    }

    Ok(quote! {
        #[derive(Clone, Debug, PartialEq)]
        pub enum #enum_ident {
            #(#variants,)*
        }
    })
}

fn member_fields<'a>(message: &'a MessageIr, index: usize) -> impl Iterator<Item = &'a FieldIr> {
    message
        .fields
        .iter()
        .filter(move |field| field.oneof_index == Some(index))
}

fn variant_ident(field: &FieldIr) -> Ident {
    use convert_case::{Case, Casing};
    format_ident!("{}", field.name.to_case(Case::Pascal))
}

/// Encode statements for one plain (non-oneof) field.
fn encode_field(ctx: &Context<'_>, field: &FieldIr) -> Result<TokenStream, GenError> {
    let name = field_ident(&field.name);
    let number = field.number;

    Ok(match &field.cardinality {
        Cardinality::Singular => match &field.kind {
            FieldKind::Scalar(ScalarKind::String) => {
                quote! { writer.write_string(#number, &self.#name); }
            }
            FieldKind::Scalar(ScalarKind::Bytes) => {
                quote! { writer.write_bytes(#number, &self.#name); }
            }
            FieldKind::Scalar(scalar) => {
                let method = scalar_write_method(*scalar);
                quote! { writer.#method(#number, self.#name); }
            }
            FieldKind::Enum(_) => {
                quote! { writer.write_enum(#number, self.#name.number()); }
            }
            FieldKind::Message(_) => quote! {
                if let Some(value) = &self.#name {
                    writer.write_message(#number, value.as_ref());
                }
            },
        },
        Cardinality::Repeated => {
            let element = unconditional_element_write(field, number)?;
            quote! {
                for value in &self.#name {
                    #element
                }
            }
        }
        Cardinality::Map { key, value } => {
            let key_write = map_component_write(&FieldKind::Scalar(*key), 1, &quote!(key))?;
            let value_write = map_component_write(value, 2, &quote!(value))?;
            quote! {
                for (key, value) in &self.#name {
                    let mut entry = wirekit_core::WireWriter::new();
                    #key_write
                    #value_write
                    writer.write_len_prefixed(#number, entry.as_slice());
                }
            }
        }
    })
}

/// Unconditional write of one repeated element bound as `value: &T`.
fn unconditional_element_write(field: &FieldIr, number: u32) -> Result<TokenStream, GenError> {
    Ok(match &field.kind {
        FieldKind::Scalar(scalar) => {
            let value = match scalar {
                ScalarKind::String | ScalarKind::Bytes => quote!(value),
                _ => quote!(*value),
            };
            scalar_unconditional_write(*scalar, number, &value)
        }
        FieldKind::Enum(_) => quote! {
            writer.write_tag(#number, wirekit_core::WireType::Varint);
            writer.write_varint(value.number() as i64 as u64);
        },
        FieldKind::Message(_) => quote! {
            writer.write_len_prefixed(#number, &wirekit_core::Message::encode(value));
        },
    })
}

/// Zero-omitting write of a map key or value into the entry writer, bound
/// as a reference.
fn map_component_write(
    kind: &FieldKind,
    number: u32,
    binding: &TokenStream,
) -> Result<TokenStream, GenError> {
    Ok(match kind {
        FieldKind::Scalar(ScalarKind::String) => {
            quote! { entry.write_string(#number, #binding); }
        }
        FieldKind::Scalar(ScalarKind::Bytes) => {
            quote! { entry.write_bytes(#number, #binding); }
        }
        FieldKind::Scalar(scalar) => {
            let method = scalar_write_method(*scalar);
            quote! { entry.#method(#number, *#binding); }
        }
        FieldKind::Enum(_) => quote! { entry.write_enum(#number, #binding.number()); },
        FieldKind::Message(_) => quote! { entry.write_message(#number, #binding); },
    })
}

/// The oneof dispatch match for one declared oneof.
fn encode_oneof(message: &MessageIr, index: usize) -> TokenStream {
    let oneof = &message.oneofs[index];
    let oneof_name = field_ident(&oneof.name);
    let enum_ident = format_ident!("{}", oneof.enum_ident);

    let mut arms = Vec::new();
    for field in member_fields(message, index) {
        let variant = variant_ident(field);
        let number = field.number;
        // Set members are written unconditionally, default values included.
        let write = match &field.kind {
            FieldKind::Scalar(scalar) => {
                let value = match scalar {
                    ScalarKind::String | ScalarKind::Bytes => quote!(value),
                    _ => quote!(*value),
                };
                scalar_unconditional_write(*scalar, number, &value)
            }
            FieldKind::Enum(_) => quote! {
                writer.write_tag(#number, wirekit_core::WireType::Varint);
                writer.write_varint(value.number() as i64 as u64);
            },
            FieldKind::Message(_) => quote! {
                writer.write_len_prefixed(
                    #number,
                    &wirekit_core::Message::encode(value.as_ref()),
                );
            },
        };
        arms.push(quote! {
            Some(#enum_ident::#variant(value)) => {
                #write
            }
        });
    }

    quote! {
        match &self.#oneof_name {
            #(#arms)*
            None => {}
        }
    }
}

/// One `match field` arm of the decode loop.
fn decode_arm(
    ctx: &Context<'_>,
    message: &MessageIr,
    field: &FieldIr,
) -> Result<TokenStream, GenError> {
    let number = field.number;

    if let Some(index) = field.oneof_index {
        let oneof = &message.oneofs[index];
        let oneof_name = field_ident(&oneof.name);
        let enum_ident = format_ident!("{}", oneof.enum_ident);
        let variant = variant_ident(field);
        return Ok(match &field.kind {
            FieldKind::Scalar(scalar) => {
                let method = scalar_read_method(*scalar);
                quote! {
                    #number => message.#oneof_name = Some(#enum_ident::#variant(reader.#method()?)),
                }
            }
            FieldKind::Enum(name) => {
                let path = ctx.type_path(name)?;
                quote! {
                    #number => message.#oneof_name =
                        Some(#enum_ident::#variant(#path::from_i32(reader.read_enum()?))),
                }
            }
            FieldKind::Message(name) => {
                let path = ctx.type_path(name)?;
                quote! {
                    #number => {
                        let mut sub = reader.read_message()?;
                        message.#oneof_name = Some(#enum_ident::#variant(Box::new(
                            <#path as wirekit_core::Message>::decode_from(&mut sub)?,
                        )));
                    }
                }
            }
        });
    }

    let name = field_ident(&field.name);
    Ok(match &field.cardinality {
        Cardinality::Singular => match &field.kind {
            FieldKind::Scalar(scalar) => {
                let method = scalar_read_method(*scalar);
                quote! { #number => message.#name = reader.#method()?, }
            }
            FieldKind::Enum(type_name) => {
                let path = ctx.type_path(type_name)?;
                quote! { #number => message.#name = #path::from_i32(reader.read_enum()?), }
            }
            FieldKind::Message(type_name) => {
                let path = ctx.type_path(type_name)?;
                quote! {
                    #number => {
                        let mut sub = reader.read_message()?;
                        message.#name = Some(Box::new(
                            <#path as wirekit_core::Message>::decode_from(&mut sub)?,
                        ));
                    }
                }
            }
        },
        Cardinality::Repeated => match &field.kind {
            FieldKind::Scalar(scalar) => {
                let method = scalar_read_method(*scalar);
                quote! { #number => message.#name.push(reader.#method()?), }
            }
            FieldKind::Enum(type_name) => {
                let path = ctx.type_path(type_name)?;
                quote! {
                    #number => message.#name.push(#path::from_i32(reader.read_enum()?)),
                }
            }
            FieldKind::Message(type_name) => {
                let path = ctx.type_path(type_name)?;
                quote! {
                    #number => {
                        let mut sub = reader.read_message()?;
                        message.#name.push(
                            <#path as wirekit_core::Message>::decode_from(&mut sub)?,
                        );
                    }
                }
            }
        },
        Cardinality::Map { key, value } => {
            let key_read = map_component_read(ctx, &FieldKind::Scalar(*key), &quote!(key))?;
            let value_read = map_component_read(ctx, value, &quote!(value))?;
            quote! {
                #number => {
                    let mut entry = reader.read_message()?;
                    let mut key = Default::default();
                    let mut value = Default::default();
                    while let Some((entry_field, entry_wire)) = entry.read_tag()? {
                        match entry_field {
                            1u32 => #key_read,
                            2u32 => #value_read,
                            _ => entry.skip(entry_wire)?,
                        }
                    }
                    message.#name.insert(key, value);
                }
            }
        }
    })
}

/// Assignment of a map key or value inside the entry decode loop.
fn map_component_read(
    ctx: &Context<'_>,
    kind: &FieldKind,
    binding: &TokenStream,
) -> Result<TokenStream, GenError> {
    Ok(match kind {
        FieldKind::Scalar(scalar) => {
            let method = scalar_read_method(*scalar);
            quote! { #binding = entry.#method()? }
        }
        FieldKind::Enum(type_name) => {
            let path = ctx.type_path(type_name)?;
            quote! { #binding = #path::from_i32(entry.read_enum()?) }
        }
        FieldKind::Message(type_name) => {
            let path = ctx.type_path(type_name)?;
            quote! {
                {
                    let mut sub = entry.read_message()?;
                    #binding = <#path as wirekit_core::Message>::decode_from(&mut sub)?;
                }
            }
        }
    })
}
