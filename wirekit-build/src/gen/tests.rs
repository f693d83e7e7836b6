use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, OneofDescriptorProto,
};

use crate::r#gen::{render_enum, render_message, render_service, Context};
use crate::registry::TypeRegistry;
use crate::schema::{lower_file, EnumIr, EnumVariantIr};

fn field(name: &str, number: i32, r#type: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        r#type: Some(r#type as i32),
        label: Some(Label::Optional as i32),
        ..Default::default()
    }
}

fn pretty(tokens: proc_macro2::TokenStream) -> String {
    prettyplease::unparse(&syn::parse2(tokens).unwrap())
}

fn render_first_message(file: FileDescriptorProto) -> String {
    let registry = TypeRegistry::build(std::slice::from_ref(&file));
    let ir = lower_file(&file, &registry).unwrap();
    let ctx = Context {
        registry: &registry,
        package: &ir.package,
    };
    pretty(render_message(&ctx, &ir.messages[0]).unwrap())
}

#[test]
fn test_scalar_message_uses_omitting_writers() {
    let file = FileDescriptorProto {
        package: Some("demo".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Person".to_owned()),
            field: vec![
                field("name", 1, Type::String),
                field("age", 2, Type::Int32),
            ],
            ..Default::default()
        }],
        ..Default::default()
    };
    let code = render_first_message(file);

    assert!(code.contains("pub struct Person"));
    assert!(code.contains("pub fn default_instance() -> &'static Self"));
    assert!(code.contains("writer.write_string(1u32, &self.name);"));
    assert!(code.contains("writer.write_int32(2u32, self.age);"));
    assert!(code.contains("1u32 => message.name = reader.read_string()?,"));
    assert!(code.contains("_ => reader.skip(wire)?,"));
}

#[test]
fn test_repeated_elements_written_unconditionally() {
    let file = FileDescriptorProto {
        package: Some("demo".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("TagList".to_owned()),
            field: vec![{
                let mut f = field("tags", 1, Type::String);
                f.label = Some(Label::Repeated as i32);
                f
            }],
            ..Default::default()
        }],
        ..Default::default()
    };
    let code = render_first_message(file);

    assert!(code.contains("pub tags: Vec<String>"));
    assert!(code.contains("for value in &self.tags"));
    // Repeated strings bypass the zero-omitting writer so empty elements
    // survive the round trip.
    assert!(code.contains("writer.write_len_prefixed(1u32, (value).as_bytes());"));
    assert!(code.contains("message.tags.push(reader.read_string()?)"));
}

#[test]
fn test_oneof_renders_tagged_union() {
    let file = FileDescriptorProto {
        package: Some("demo".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Event".to_owned()),
            oneof_decl: vec![OneofDescriptorProto {
                name: Some("payload".to_owned()),
                ..Default::default()
            }],
            field: vec![
                {
                    let mut f = field("text", 1, Type::String);
                    f.oneof_index = Some(0);
                    f
                },
                {
                    let mut f = field("count", 2, Type::Uint64);
                    f.oneof_index = Some(0);
                    f
                },
            ],
            ..Default::default()
        }],
        ..Default::default()
    };
    let code = render_first_message(file);

    assert!(code.contains("pub enum EventPayload"));
    assert!(code.contains("Text(String)"));
    assert!(code.contains("Count(u64)"));
    assert!(code.contains("pub payload: Option<EventPayload>"));
    assert!(code.contains("match &self.payload"));
    // A set member is written even at its zero value.
    assert!(code.contains("writer.write_len_prefixed(1u32, (value).as_bytes());"));
    // Decoding overwrites the whole Option, so the last member wins.
    assert!(code.contains("message.payload = Some(EventPayload::Text(reader.read_string()?))"));
    assert!(code.contains("message.payload = Some(EventPayload::Count(reader.read_uint64()?))"));
}

#[test]
fn test_nested_message_field_is_boxed_option() {
    let file = FileDescriptorProto {
        package: Some("demo".to_owned()),
        message_type: vec![
            DescriptorProto {
                name: Some("Node".to_owned()),
                field: vec![{
                    let mut f = field("next", 1, Type::Message);
                    f.type_name = Some(".demo.Node".to_owned());
                    f
                }],
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    let code = render_first_message(file);

    assert!(code.contains("pub next: Option<Box<Node>>"));
    assert!(code.contains("writer.write_message(1u32, value.as_ref());"));
    assert!(code.contains("let mut sub = reader.read_message()?;"));
}

#[test]
fn test_cross_package_reference_uses_crate_path() {
    let common = FileDescriptorProto {
        package: Some("common".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Meta".to_owned()),
            ..Default::default()
        }],
        ..Default::default()
    };
    let demo = FileDescriptorProto {
        package: Some("demo".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Record".to_owned()),
            field: vec![{
                let mut f = field("meta", 1, Type::Message);
                f.type_name = Some(".common.Meta".to_owned());
                f
            }],
            ..Default::default()
        }],
        ..Default::default()
    };

    let registry = TypeRegistry::build(&[common, demo.clone()]);
    let ir = lower_file(&demo, &registry).unwrap();
    let ctx = Context {
        registry: &registry,
        package: &ir.package,
    };
    let code = pretty(render_message(&ctx, &ir.messages[0]).unwrap());

    assert!(code.contains("Option<Box<crate::common::Meta>>"));
}

#[test]
fn test_enum_declared_numbers_and_fallback() {
    let enum_ir = EnumIr {
        ident: "Genre".to_owned(),
        proto_name: "Genre".to_owned(),
        variants: vec![
            EnumVariantIr {
                ident: "GenreUnspecified".to_owned(),
                number: 0,
            },
            EnumVariantIr {
                ident: "Fiction".to_owned(),
                number: 1,
            },
            EnumVariantIr {
                ident: "Reference".to_owned(),
                number: 5,
            },
        ],
    };
    let code = pretty(render_enum(&enum_ir));

    assert!(code.contains("#[repr(i32)]"));
    // Encoded numbers come from the declaration, not the variant position.
    assert!(code.contains("Reference = 5i32"));
    assert!(code.contains("5i32 => Genre::Reference,"));
    assert!(code.contains("_ => Genre::GenreUnspecified,"));
    assert!(code.contains("#[default]"));
}

#[test]
fn test_enum_fallback_without_zero_member_is_lowest() {
    let file = FileDescriptorProto {
        package: Some("demo".to_owned()),
        enum_type: vec![EnumDescriptorProto {
            name: Some("Level".to_owned()),
            value: vec![
                EnumValueDescriptorProto {
                    name: Some("HIGH".to_owned()),
                    number: Some(7),
                    ..Default::default()
                },
                EnumValueDescriptorProto {
                    name: Some("LOW".to_owned()),
                    number: Some(3),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }],
        ..Default::default()
    };
    let registry = TypeRegistry::build(std::slice::from_ref(&file));
    let ir = lower_file(&file, &registry).unwrap();
    let code = pretty(render_enum(&ir.enums[0]));

    assert!(code.contains("_ => Level::Low,"));
}

#[test]
fn test_service_client_builds_call_paths() {
    let file = FileDescriptorProto {
        package: Some("library".to_owned()),
        message_type: vec![
            DescriptorProto {
                name: Some("GetBookRequest".to_owned()),
                ..Default::default()
            },
            DescriptorProto {
                name: Some("Book".to_owned()),
                ..Default::default()
            },
        ],
        service: vec![prost_types::ServiceDescriptorProto {
            name: Some("BookService".to_owned()),
            method: vec![
                prost_types::MethodDescriptorProto {
                    name: Some("GetBook".to_owned()),
                    input_type: Some(".library.GetBookRequest".to_owned()),
                    output_type: Some(".library.Book".to_owned()),
                    ..Default::default()
                },
                prost_types::MethodDescriptorProto {
                    name: Some("ListBooks".to_owned()),
                    input_type: Some(".library.GetBookRequest".to_owned()),
                    output_type: Some(".library.Book".to_owned()),
                    server_streaming: Some(true),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }],
        ..Default::default()
    };
    let registry = TypeRegistry::build(std::slice::from_ref(&file));
    let ir = lower_file(&file, &registry).unwrap();
    let ctx = Context {
        registry: &registry,
        package: &ir.package,
    };
    let code = pretty(render_service(&ctx, &ir.services[0]).unwrap());

    assert!(code.contains("pub struct BookServiceClient"));
    assert!(code.contains("\"/library.BookService/GetBook\""));
    assert!(code.contains("pub async fn get_book"));
    assert!(code.contains("wirekit_core::Response<Book>"));
    // Server streaming yields a lazy stream instead of an awaited response.
    assert!(code.contains("pub fn list_books"));
    assert!(code.contains("wirekit_client::MessageStream<Book>"));
    assert!(code.contains("self.client.server_stream(\"/library.BookService/ListBooks\""));
}

#[test]
fn test_client_streaming_is_fatal() {
    let file = FileDescriptorProto {
        package: Some("library".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Book".to_owned()),
            ..Default::default()
        }],
        service: vec![prost_types::ServiceDescriptorProto {
            name: Some("BookService".to_owned()),
            method: vec![prost_types::MethodDescriptorProto {
                name: Some("UploadBooks".to_owned()),
                input_type: Some(".library.Book".to_owned()),
                output_type: Some(".library.Book".to_owned()),
                client_streaming: Some(true),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };
    let registry = TypeRegistry::build(std::slice::from_ref(&file));
    let err = lower_file(&file, &registry).unwrap_err();
    assert!(err.to_string().contains("client streaming"));
}

#[test]
fn test_map_field_renders_entry_loop() {
    let file = FileDescriptorProto {
        package: Some("demo".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Counter".to_owned()),
            field: vec![{
                let mut f = field("hits", 1, Type::Message);
                f.label = Some(Label::Repeated as i32);
                f.type_name = Some(".demo.Counter.HitsEntry".to_owned());
                f
            }],
            nested_type: vec![DescriptorProto {
                name: Some("HitsEntry".to_owned()),
                options: Some(prost_types::MessageOptions {
                    map_entry: Some(true),
                    ..Default::default()
                }),
                field: vec![
                    field("key", 1, Type::String),
                    field("value", 2, Type::Uint32),
                ],
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };
    let code = render_first_message(file);

    assert!(code.contains("pub hits: std::collections::HashMap<String, u32>"));
    // Entries are framed unconditionally, with omitting writes inside.
    assert!(code.contains("let mut entry = wirekit_core::WireWriter::new();"));
    assert!(code.contains("entry.write_string(1u32, key);"));
    assert!(code.contains("entry.write_uint32(2u32, *value);"));
    assert!(code.contains("writer.write_len_prefixed(1u32, entry.as_slice());"));
    assert!(code.contains("message.hits.insert(key, value);"));
}
