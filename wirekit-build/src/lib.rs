//! Descriptor-driven code generation for wirekit.
//!
//! [`Generator`] scans an input directory for compiled descriptor sets
//! (produced with `protoc --descriptor_set_out`), builds the type registry
//! over every file at once, and then emits one Rust source file per
//! message, enum and service under the output directory, organized by
//! package path. Each package directory gets a `mod.rs` re-exporting its
//! types, so the output tree plugs in as a module tree.
//!
//! ```ignore
//! wirekit_build::Generator::new("descriptors", "src/proto").generate()?;
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use convert_case::{Case, Casing};
use prost::Message as _;
use prost_types::{FileDescriptorProto, FileDescriptorSet};

mod error;
mod r#gen;
mod registry;
mod schema;

pub use error::GenError;
pub use registry::TypeRegistry;
pub use schema::{
    Cardinality, EnumIr, FieldIr, FieldKind, FileIr, MessageIr, MethodIr, OneofIr, ScalarKind,
    ServiceIr,
};

const GENERATED_HEADER: &str = "// This file is @generated by wirekit-gen. Do not edit.\n";

/// Extensions recognized as compiled descriptor sets.
const DESCRIPTOR_EXTENSIONS: [&str; 3] = ["binpb", "bin", "desc"];

/// Schema-to-Rust generator over a directory of compiled descriptor sets.
pub struct Generator {
    input: PathBuf,
    output: PathBuf,
}

impl Generator {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Run generation end to end.
    ///
    /// An input directory without any descriptor files is a no-op with a
    /// diagnostic, not an error. Every other failure aborts the whole run;
    /// no partial output tree is considered valid.
    pub fn generate(&self) -> Result<(), GenError> {
        let mut descriptor_paths = Vec::new();
        discover_descriptors(&self.input, &mut descriptor_paths)?;
        if descriptor_paths.is_empty() {
            tracing::warn!(
                input = %self.input.display(),
                "no descriptor sets found, nothing to generate"
            );
            return Ok(());
        }
        descriptor_paths.sort();

        let mut files: Vec<FileDescriptorProto> = Vec::new();
        for path in &descriptor_paths {
            let bytes = fs::read(path).map_err(|e| GenError::io(path.display().to_string(), e))?;
            let set = FileDescriptorSet::decode(bytes.as_slice()).map_err(|e| {
                GenError::Descriptor {
                    path: path.display().to_string(),
                    source: e,
                }
            })?;
            files.extend(set.file);
        }

        // Phase one: register every type from every file. The registry is
        // immutable from here on, so files can reference each other in any
        // order.
        let registry = registry::TypeRegistry::build(&files);
        tracing::debug!(types = registry.len(), "type registry built");

        let mut emitted = Emitted::default();
        for file in &files {
            let ir = schema::lower_file(file, &registry)?;
            let ctx = r#gen::Context {
                registry: &registry,
                package: &ir.package,
            };

            for message in &ir.messages {
                let tokens = r#gen::render_message(&ctx, message)?;
                self.write_type_file(&ir.package, &message.ident, tokens, &mut emitted)?;
            }
            for enum_ir in &ir.enums {
                let tokens = r#gen::render_enum(enum_ir);
                self.write_type_file(&ir.package, &enum_ir.ident, tokens, &mut emitted)?;
            }
            for service in &ir.services {
                let tokens = r#gen::render_service(&ctx, service)?;
                self.write_type_file(&ir.package, &service.ident, tokens, &mut emitted)?;
            }
        }

        self.write_module_files(&emitted)?;
        tracing::info!(
            files = emitted.modules.values().map(BTreeSet::len).sum::<usize>(),
            "generation complete"
        );
        Ok(())
    }

    fn write_type_file(
        &self,
        package: &[String],
        ident: &str,
        tokens: proc_macro2::TokenStream,
        emitted: &mut Emitted,
    ) -> Result<(), GenError> {
        let module = ident.to_case(Case::Snake);
        let file_tokens = quote::quote! {
            #[allow(unused_imports)]
            use super::*;

            #tokens
        };
        let parsed = syn::parse2(file_tokens).map_err(|e| GenError::Render {
            name: ident.to_owned(),
            source: e,
        })?;
        let mut content = String::from(GENERATED_HEADER);
        content.push_str(&prettyplease::unparse(&parsed));

        let mut dir = self.output.clone();
        for segment in package {
            dir.push(segment);
        }
        fs::create_dir_all(&dir).map_err(|e| GenError::io(dir.display().to_string(), e))?;
        let path = dir.join(format!("{module}.rs"));
        fs::write(&path, content).map_err(|e| GenError::io(path.display().to_string(), e))?;
        tracing::debug!(path = %path.display(), "wrote generated file");

        emitted
            .modules
            .entry(package.to_vec())
            .or_default()
            .insert(module);
        Ok(())
    }

    /// Write a `mod.rs` for every package directory: type modules are
    /// re-exported wholesale, child packages are plain submodules.
    fn write_module_files(&self, emitted: &Emitted) -> Result<(), GenError> {
        // Every package prefix needs a mod.rs, including intermediate
        // segments that hold no types of their own.
        let mut packages: BTreeSet<Vec<String>> = BTreeSet::new();
        for package in emitted.modules.keys() {
            for len in 0..=package.len() {
                packages.insert(package[..len].to_vec());
            }
        }

        for package in &packages {
            let mut lines = vec![GENERATED_HEADER.trim_end().to_owned(), String::new()];
            if let Some(modules) = emitted.modules.get(package) {
                for module in modules {
                    lines.push(format!("pub mod {module};"));
                    lines.push(format!("pub use {module}::*;"));
                }
            }
            for child in &packages {
                if child.len() == package.len() + 1 && child.starts_with(package) {
                    let segment = &child[package.len()];
                    lines.push(format!("pub mod {segment};"));
                }
            }
            lines.push(String::new());

            let mut dir = self.output.clone();
            for segment in package {
                dir.push(segment);
            }
            fs::create_dir_all(&dir).map_err(|e| GenError::io(dir.display().to_string(), e))?;
            let path = dir.join("mod.rs");
            fs::write(&path, lines.join("\n"))
                .map_err(|e| GenError::io(path.display().to_string(), e))?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Emitted {
    /// Package path -> snake_case module names emitted under it.
    modules: BTreeMap<Vec<String>, BTreeSet<String>>,
}

fn discover_descriptors(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), GenError> {
    if !dir.is_dir() {
        return Ok(());
    }
    let entries = fs::read_dir(dir).map_err(|e| GenError::io(dir.display().to_string(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| GenError::io(dir.display().to_string(), e))?;
        let path = entry.path();
        if path.is_dir() {
            discover_descriptors(&path, found)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| DESCRIPTOR_EXTENSIONS.contains(&ext))
        {
            found.push(path);
        }
    }
    Ok(())
}
