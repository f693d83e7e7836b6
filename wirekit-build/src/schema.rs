//! Schema intermediate representation.
//!
//! Lowers `prost_types` file descriptors into a small IR that the renderer
//! walks. The IR is deliberately decoupled from token emission so the
//! renderer never touches descriptor protos directly.

use convert_case::{Case, Casing};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    ServiceDescriptorProto,
};

use crate::error::GenError;
use crate::registry::TypeRegistry;

/// Scalar protobuf field kinds, named after their schema-language spelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

/// What a field's payload is.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    /// Fully qualified proto name of a message type, e.g. `.pkg.Outer.Inner`.
    Message(String),
    /// Fully qualified proto name of an enum type.
    Enum(String),
}

/// How many values a field carries.
#[derive(Clone, Debug, PartialEq)]
pub enum Cardinality {
    Singular,
    Repeated,
    Map {
        key: ScalarKind,
        value: FieldKind,
    },
}

#[derive(Clone, Debug)]
pub struct FieldIr {
    /// snake_case Rust field name.
    pub name: String,
    pub number: u32,
    pub kind: FieldKind,
    pub cardinality: Cardinality,
    /// Index into the parent message's oneof list, for oneof members.
    pub oneof_index: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct OneofIr {
    /// snake_case field name holding the `Option<...>` in the struct.
    pub name: String,
    /// PascalCase name of the generated tagged union, prefixed with the
    /// owning message's identifier.
    pub enum_ident: String,
}

#[derive(Clone, Debug)]
pub struct MessageIr {
    /// Flattened Rust identifier, nested types joined as `OuterInner`.
    pub ident: String,
    /// Fully qualified proto name.
    pub proto_name: String,
    pub fields: Vec<FieldIr>,
    pub oneofs: Vec<OneofIr>,
}

#[derive(Clone, Debug)]
pub struct EnumVariantIr {
    /// PascalCase Rust variant identifier.
    pub ident: String,
    pub number: i32,
}

#[derive(Clone, Debug)]
pub struct EnumIr {
    pub ident: String,
    pub proto_name: String,
    pub variants: Vec<EnumVariantIr>,
}

#[derive(Clone, Debug)]
pub struct MethodIr {
    /// snake_case Rust method name.
    pub name: String,
    /// Fully qualified call path, `/<package>.<Service>/<Method>`.
    pub path: String,
    /// Fully qualified proto names of the request and response messages.
    pub input_type: String,
    pub output_type: String,
    pub server_streaming: bool,
}

#[derive(Clone, Debug)]
pub struct ServiceIr {
    /// PascalCase service identifier, without a client suffix.
    pub ident: String,
    pub methods: Vec<MethodIr>,
}

/// Everything generated from one schema file.
#[derive(Clone, Debug, Default)]
pub struct FileIr {
    /// Package path segments, e.g. `["com", "example"]`.
    pub package: Vec<String>,
    pub messages: Vec<MessageIr>,
    pub enums: Vec<EnumIr>,
    pub services: Vec<ServiceIr>,
}

/// Lower one file descriptor into IR.
///
/// Map-entry synthetic messages are folded into their owning field's
/// [`Cardinality::Map`] and never surface as messages of their own.
pub fn lower_file(file: &FileDescriptorProto, registry: &TypeRegistry) -> Result<FileIr, GenError> {
    let package = file.package.as_deref().unwrap_or("");
    let mut ir = FileIr {
        package: split_package(package),
        ..Default::default()
    };

    for message in &file.message_type {
        lower_message_tree(package, message, &[], registry, &mut ir)?;
    }
    for enum_type in &file.enum_type {
        ir.enums.push(lower_enum(enum_type, &[]));
    }
    for service in &file.service {
        ir.services.push(lower_service(package, service)?);
    }
    Ok(ir)
}

/// Split a dotted package into path segments; the empty package is no
/// segments at all.
pub fn split_package(package: &str) -> Vec<String> {
    if package.is_empty() {
        Vec::new()
    } else {
        package.split('.').map(str::to_owned).collect()
    }
}

fn lower_message_tree(
    package: &str,
    message: &DescriptorProto,
    parents: &[String],
    registry: &TypeRegistry,
    ir: &mut FileIr,
) -> Result<(), GenError> {
    let name = message.name.as_deref().unwrap_or("");
    if message
        .options
        .as_ref()
        .is_some_and(|options| options.map_entry())
    {
        return Ok(());
    }

    ir.messages
        .push(lower_message(package, message, parents, registry)?);

    let mut nested_parents = parents.to_vec();
    nested_parents.push(name.to_owned());
    for nested in &message.nested_type {
        lower_message_tree(package, nested, &nested_parents, registry, ir)?;
    }
    for nested_enum in &message.enum_type {
        ir.enums.push(lower_enum(nested_enum, &nested_parents));
    }
    Ok(())
}

fn lower_message(
    package: &str,
    message: &DescriptorProto,
    parents: &[String],
    registry: &TypeRegistry,
) -> Result<MessageIr, GenError> {
    let name = message.name.as_deref().unwrap_or("");
    let ident = flatten_ident(parents, name);
    let proto_name = qualify(package, parents, name);

    let oneofs: Vec<OneofIr> = message
        .oneof_decl
        .iter()
        .map(|decl| {
            let decl_name = decl.name.as_deref().unwrap_or("");
            OneofIr {
                name: decl_name.to_case(Case::Snake),
                enum_ident: format!("{}{}", ident, decl_name.to_case(Case::Pascal)),
            }
        })
        .collect();

    let mut fields = Vec::with_capacity(message.field.len());
    let mut seen_numbers = std::collections::BTreeSet::new();
    for field in &message.field {
        let lowered = lower_field(field, &proto_name, registry)?;
        if !seen_numbers.insert(lowered.number) {
            return Err(GenError::DuplicateFieldNumber {
                message: proto_name,
                number: lowered.number,
            });
        }
        fields.push(lowered);
    }

    Ok(MessageIr {
        ident,
        proto_name,
        fields,
        oneofs,
    })
}

fn lower_field(
    field: &FieldDescriptorProto,
    owner: &str,
    registry: &TypeRegistry,
) -> Result<FieldIr, GenError> {
    let name = field.name.as_deref().unwrap_or("");
    let number = field.number.unwrap_or(0);
    let number = u32::try_from(number)
        .ok()
        .filter(|n| (1..=wirekit_core::MAX_FIELD_NUMBER).contains(n))
        .ok_or_else(|| GenError::InvalidFieldNumber {
            message: owner.to_owned(),
            field: name.to_owned(),
            number,
        })?;

    let kind = lower_kind(field, owner)?;

    // A repeated message field whose element type is a synthetic map entry
    // is a map field.
    let cardinality = if field.label() == Label::Repeated {
        if let FieldKind::Message(type_name) = &kind {
            if let Some(entry) = registry.map_entry(type_name) {
                let key = match lower_kind(&entry.key, owner)? {
                    FieldKind::Scalar(scalar) => scalar,
                    _ => {
                        return Err(GenError::UnsupportedField {
                            message: owner.to_owned(),
                            field: name.to_owned(),
                            reason: "map key must be a scalar".to_owned(),
                        });
                    }
                };
                Cardinality::Map {
                    key,
                    value: lower_kind(&entry.value, owner)?,
                }
            } else {
                Cardinality::Repeated
            }
        } else {
            Cardinality::Repeated
        }
    } else {
        Cardinality::Singular
    };

    Ok(FieldIr {
        name: name.to_case(Case::Snake),
        number,
        kind,
        cardinality,
        oneof_index: field
            .oneof_index
            .filter(|_| !field.proto3_optional())
            .map(|index| index as usize),
    })
}

fn lower_kind(field: &FieldDescriptorProto, owner: &str) -> Result<FieldKind, GenError> {
    let name = field.name.as_deref().unwrap_or("");
    let kind = match field.r#type() {
        Type::Double => FieldKind::Scalar(ScalarKind::Double),
        Type::Float => FieldKind::Scalar(ScalarKind::Float),
        Type::Int32 => FieldKind::Scalar(ScalarKind::Int32),
        Type::Int64 => FieldKind::Scalar(ScalarKind::Int64),
        Type::Uint32 => FieldKind::Scalar(ScalarKind::Uint32),
        Type::Uint64 => FieldKind::Scalar(ScalarKind::Uint64),
        Type::Sint32 => FieldKind::Scalar(ScalarKind::Sint32),
        Type::Sint64 => FieldKind::Scalar(ScalarKind::Sint64),
        Type::Fixed32 => FieldKind::Scalar(ScalarKind::Fixed32),
        Type::Fixed64 => FieldKind::Scalar(ScalarKind::Fixed64),
        Type::Sfixed32 => FieldKind::Scalar(ScalarKind::Sfixed32),
        Type::Sfixed64 => FieldKind::Scalar(ScalarKind::Sfixed64),
        Type::Bool => FieldKind::Scalar(ScalarKind::Bool),
        Type::String => FieldKind::Scalar(ScalarKind::String),
        Type::Bytes => FieldKind::Scalar(ScalarKind::Bytes),
        Type::Message => FieldKind::Message(field.type_name.clone().unwrap_or_default()),
        Type::Enum => FieldKind::Enum(field.type_name.clone().unwrap_or_default()),
        Type::Group => {
            return Err(GenError::UnsupportedField {
                message: owner.to_owned(),
                field: name.to_owned(),
                reason: "proto2 groups are not supported".to_owned(),
            });
        }
    };
    Ok(kind)
}

fn lower_enum(enum_type: &EnumDescriptorProto, parents: &[String]) -> EnumIr {
    let name = enum_type.name.as_deref().unwrap_or("");
    EnumIr {
        ident: flatten_ident(parents, name),
        proto_name: name.to_owned(),
        variants: enum_type
            .value
            .iter()
            .map(|value| EnumVariantIr {
                ident: value
                    .name
                    .as_deref()
                    .unwrap_or("")
                    .to_case(Case::Pascal),
                number: value.number.unwrap_or(0),
            })
            .collect(),
    }
}

fn lower_service(
    package: &str,
    service: &ServiceDescriptorProto,
) -> Result<ServiceIr, GenError> {
    let service_name = service.name.as_deref().unwrap_or("");
    let mut methods = Vec::with_capacity(service.method.len());
    for method in &service.method {
        let method_name = method.name.as_deref().unwrap_or("");
        if method.client_streaming() {
            return Err(GenError::UnsupportedStreaming {
                service: service_name.to_owned(),
                method: method_name.to_owned(),
            });
        }
        let path = if package.is_empty() {
            format!("/{service_name}/{method_name}")
        } else {
            format!("/{package}.{service_name}/{method_name}")
        };
        methods.push(MethodIr {
            name: method_name.to_case(Case::Snake),
            path,
            input_type: method.input_type.clone().unwrap_or_default(),
            output_type: method.output_type.clone().unwrap_or_default(),
            server_streaming: method.server_streaming(),
        });
    }
    Ok(ServiceIr {
        ident: service_name.to_owned(),
        methods,
    })
}

/// Join nested type names into the flat Rust identifier, `Outer.Inner`
/// becoming `OuterInner`.
pub fn flatten_ident(parents: &[String], name: &str) -> String {
    let mut ident = parents.concat();
    ident.push_str(name);
    ident
}

/// Build the fully qualified proto name, `.pkg.Outer.Inner` style.
pub fn qualify(package: &str, parents: &[String], name: &str) -> String {
    let mut qualified = String::from(".");
    if !package.is_empty() {
        qualified.push_str(package);
        qualified.push('.');
    }
    for parent in parents {
        qualified.push_str(parent);
        qualified.push('.');
    }
    qualified.push_str(name);
    qualified
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_package() {
        assert_eq!(split_package(""), Vec::<String>::new());
        assert_eq!(split_package("library"), vec!["library"]);
        assert_eq!(split_package("com.example"), vec!["com", "example"]);
    }

    #[test]
    fn test_flatten_ident() {
        assert_eq!(flatten_ident(&[], "Shelf"), "Shelf");
        assert_eq!(
            flatten_ident(&["Outer".into(), "Middle".into()], "Inner"),
            "OuterMiddleInner"
        );
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("", &[], "Shelf"), ".Shelf");
        assert_eq!(qualify("library", &[], "Shelf"), ".library.Shelf");
        assert_eq!(
            qualify("library", &["Outer".into()], "Inner"),
            ".library.Outer.Inner"
        );
    }
}
