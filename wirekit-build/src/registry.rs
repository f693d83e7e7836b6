//! The shared type registry.
//!
//! Built in one pass over every descriptor file before any code is emitted,
//! and immutable from then on. Because registration is complete before
//! resolution starts, files may reference each other's types in any order.

use std::collections::BTreeMap;

use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto};

use crate::error::GenError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Message,
    Enum,
}

/// One registered message or enum type.
#[derive(Clone, Debug)]
pub struct RegisteredType {
    pub kind: TypeKind,
    /// Package path segments of the file that declared the type.
    pub package: Vec<String>,
    /// Flattened Rust identifier (`OuterInner` for nested types).
    pub ident: String,
}

/// Key and value field descriptors of a synthetic map-entry message.
#[derive(Clone, Debug)]
pub struct MapEntry {
    pub key: FieldDescriptorProto,
    pub value: FieldDescriptorProto,
}

/// Lookup table from fully qualified proto names to their generated types.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, RegisteredType>,
    map_entries: BTreeMap<String, MapEntry>,
}

impl TypeRegistry {
    /// Register every message and enum from every file.
    pub fn build(files: &[FileDescriptorProto]) -> Self {
        let mut registry = Self::default();
        for file in files {
            let package = file.package.as_deref().unwrap_or("");
            let segments = crate::schema::split_package(package);
            for message in &file.message_type {
                registry.register_message(package, &segments, message, &[]);
            }
            for enum_type in &file.enum_type {
                registry.register_enum(package, &segments, enum_type, &[]);
            }
        }
        registry
    }

    fn register_message(
        &mut self,
        package: &str,
        segments: &[String],
        message: &DescriptorProto,
        parents: &[String],
    ) {
        let name = message.name.as_deref().unwrap_or("");
        let qualified = crate::schema::qualify(package, parents, name);

        if message
            .options
            .as_ref()
            .is_some_and(|options| options.map_entry())
        {
            // Field 1 is the key, field 2 the value.
            let key = message.field.iter().find(|f| f.number == Some(1));
            let value = message.field.iter().find(|f| f.number == Some(2));
            if let (Some(key), Some(value)) = (key, value) {
                self.map_entries.insert(
                    qualified,
                    MapEntry {
                        key: key.clone(),
                        value: value.clone(),
                    },
                );
            }
            return;
        }

        self.types.insert(
            qualified,
            RegisteredType {
                kind: TypeKind::Message,
                package: segments.to_vec(),
                ident: crate::schema::flatten_ident(parents, name),
            },
        );

        let mut nested_parents = parents.to_vec();
        nested_parents.push(name.to_owned());
        for nested in &message.nested_type {
            self.register_message(package, segments, nested, &nested_parents);
        }
        for nested_enum in &message.enum_type {
            self.register_enum(package, segments, nested_enum, &nested_parents);
        }
    }

    fn register_enum(
        &mut self,
        package: &str,
        segments: &[String],
        enum_type: &EnumDescriptorProto,
        parents: &[String],
    ) {
        let name = enum_type.name.as_deref().unwrap_or("");
        self.types.insert(
            crate::schema::qualify(package, parents, name),
            RegisteredType {
                kind: TypeKind::Enum,
                package: segments.to_vec(),
                ident: crate::schema::flatten_ident(parents, name),
            },
        );
    }

    /// Look up a fully qualified type name. Unresolved references are fatal
    /// and the error lists everything the registry does know.
    pub fn resolve(&self, name: &str) -> Result<&RegisteredType, GenError> {
        self.types.get(name).ok_or_else(|| GenError::UnresolvedType {
            name: name.to_owned(),
            known: self.types.keys().cloned().collect(),
        })
    }

    /// The key/value shape of a synthetic map-entry message, if `name`
    /// refers to one.
    pub fn map_entry(&self, name: &str) -> Option<&MapEntry> {
        self.map_entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
