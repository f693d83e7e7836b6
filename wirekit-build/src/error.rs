//! Generation errors. All of them abort the whole run; the generator never
//! guesses its way past a malformed or unresolvable schema.

/// Errors raised while reading descriptors or generating code.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode descriptor set {path}: {source}")]
    Descriptor {
        path: String,
        #[source]
        source: prost::DecodeError,
    },

    /// A field references a type name the registry has never seen. The
    /// message lists every registered name so the typo is findable.
    #[error(
        "unresolved type reference `{name}`; registered types are: {}",
        known.join(", ")
    )]
    UnresolvedType { name: String, known: Vec<String> },

    #[error("field `{field}` of `{message}` is unsupported: {reason}")]
    UnsupportedField {
        message: String,
        field: String,
        reason: String,
    },

    #[error("field `{field}` of `{message}` has invalid field number {number}")]
    InvalidFieldNumber {
        message: String,
        field: String,
        number: i32,
    },

    #[error("message `{message}` declares field number {number} more than once")]
    DuplicateFieldNumber { message: String, number: u32 },

    #[error(
        "method `{method}` of service `{service}` uses client streaming, which is not supported"
    )]
    UnsupportedStreaming { service: String, method: String },

    /// Emitted tokens failed to parse back as a Rust file before
    /// pretty-printing. Always a generator bug, never a schema problem.
    #[error("generated code for `{name}` is not valid Rust: {source}")]
    Render {
        name: String,
        #[source]
        source: syn::Error,
    },
}

impl GenError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }
}
