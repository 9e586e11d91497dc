//! Recoverable conditions met while processing an article.
//!
//! Nothing in the pipeline is fatal: when a pattern finds nothing, a marker
//! cannot be resolved, or a template field is malformed, the stage keeps
//! going with a best-effort result and records one of these instead.

use serde::Serialize;
use thiserror::Error;

/// A condition that degraded a stage's output without failing it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A pattern found an opening but no usable match; the text was passed through unchanged.
    #[error("{stage}: no match, text passed through unchanged")]
    ParseNoop { stage: String },

    /// A marker token references a citation that does not exist; the occurrence was dropped.
    #[error("marker {marker} has no citation record")]
    LookupMiss { marker: String },

    /// A template field has no assignment character; the field was ignored.
    #[error("template field without '=' ignored: {field}")]
    AttributeMalformed { field: String },
}

impl Diagnostic {
    pub(crate) fn parse_noop(stage: &str) -> Self {
        let diagnostic = Diagnostic::ParseNoop {
            stage: stage.to_string(),
        };
        tracing::trace!(%diagnostic);
        diagnostic
    }

    pub(crate) fn lookup_miss(marker: &str) -> Self {
        let diagnostic = Diagnostic::LookupMiss {
            marker: marker.to_string(),
        };
        tracing::trace!(%diagnostic);
        diagnostic
    }

    pub(crate) fn attribute_malformed(field: &str) -> Self {
        let diagnostic = Diagnostic::AttributeMalformed {
            field: field.trim().to_string(),
        };
        tracing::trace!(%diagnostic);
        diagnostic
    }
}
