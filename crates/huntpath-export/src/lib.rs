//! huntpath-export: Pure format serializers (sans-IO)
//!
//! Converts routes into output formats: the JSON document the hunt
//! service returns, and SVG previews. Also parses the JSON point lists
//! the service stores clues as.

pub mod json;
pub mod svg;

pub use json::{JsonMetadata, RouteDocument, parse_points, route_document, to_json};
pub use self::svg::{SvgMetadata, build_path_data, to_diagnostic_svg, to_svg};

/// Errors raised while reading or writing export formats.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// JSON could not be parsed or produced.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
