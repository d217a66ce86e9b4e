//! Failure taxonomy for the rollup pipeline.
//!
//! Structural problems (no manifest, no tests) abort immediately;
//! resolution-stage problems are routed through
//! [`crate::diagnostics::Diagnostics`] instead and only become a
//! [`RollupError::StrictMode`] after the full pipeline has run.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RollupError>;

#[derive(Debug, Error)]
pub enum RollupError {
    /// Missing manifest reference or zero input sources.
    #[error("{0}")]
    Configuration(String),

    /// The manifest discovery query matched nothing. The query text is
    /// included so callers can debug custom queries.
    #[error(
        "no tests found querying manifest.\n\
         Results are found using the following query, which can be \
         overridden with a custom query:\n{query}"
    )]
    Discovery { query: String },

    /// A value cannot be rendered in the chosen output form.
    #[error("cannot serialize {value:?} as {form}")]
    Serialization { value: String, form: String },

    /// Underlying graph store or parser failure.
    #[error("graph store error: {0}")]
    Graph(String),

    /// Strict mode: warnings were issued somewhere during the run.
    #[error("{warnings} warning(s) issued in strict mode")]
    StrictMode { warnings: u32 },
}

impl RollupError {
    pub fn config(message: impl Into<String>) -> Self {
        RollupError::Configuration(message.into())
    }
}

impl From<std::io::Error> for RollupError {
    fn from(err: std::io::Error) -> Self {
        RollupError::Graph(err.to_string())
    }
}

impl From<oxigraph::store::StorageError> for RollupError {
    fn from(err: oxigraph::store::StorageError) -> Self {
        RollupError::Graph(err.to_string())
    }
}

impl From<oxigraph::store::LoaderError> for RollupError {
    fn from(err: oxigraph::store::LoaderError) -> Self {
        RollupError::Graph(err.to_string())
    }
}

impl From<oxigraph::store::SerializerError> for RollupError {
    fn from(err: oxigraph::store::SerializerError) -> Self {
        RollupError::Graph(err.to_string())
    }
}

impl From<oxigraph::sparql::EvaluationError> for RollupError {
    fn from(err: oxigraph::sparql::EvaluationError) -> Self {
        RollupError::Graph(err.to_string())
    }
}

impl From<tera::Error> for RollupError {
    fn from(err: tera::Error) -> Self {
        RollupError::Serialization {
            value: err.to_string(),
            form: "html".to_string(),
        }
    }
}

impl From<serde_json::Error> for RollupError {
    fn from(err: serde_json::Error) -> Self {
        RollupError::Serialization {
            value: err.to_string(),
            form: "json".to_string(),
        }
    }
}
