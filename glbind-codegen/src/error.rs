// Error types for glbind-codegen.

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::WrapperTypes;

/// A specification defect that prevents one wrapper from being generated.
/// The run continues with the remaining functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    #[error("function `{function}` has {found} parameters but its delegate `{delegate}` has {expected}")]
    ParamCountMismatch {
        function: String,
        delegate: String,
        expected: usize,
        found: usize,
    },

    /// A parameter needs pinning but carries no pinnable category.
    #[error("parameter `{param}` has an unsupported wrapper combination {wrapper:?}")]
    UnknownWrapper { param: String, wrapper: WrapperTypes },

    #[error("parameter `{param}` has indirection depth {depth}, deeper than 4")]
    IndirectionTooDeep { param: String, depth: u8 },

    #[error("function `{function}` wraps unknown delegate `{delegate}`")]
    MissingDelegate { function: String, delegate: String },

    #[error("delegate `{delegate}` aliases `{target}`, which holds no slot")]
    UnresolvedAlias { delegate: String, target: String },
}

/// Failures that abort a whole generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("output verification failed:\n  - {}", .0.join("\n  - "))]
    Verify(Vec<String>),
}

impl GenerateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerateError::Io {
            path: path.into(),
            source,
        }
    }
}
