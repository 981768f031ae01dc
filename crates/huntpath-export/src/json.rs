//! JSON export in the hunt service's response shape.
//!
//! A route serializes as
//! `{"clueIDs": [..], "length": <f64>, "closedLength": <f64>}`, optionally
//! followed by the [`RouteConfig`] that produced it. Clue point lists are
//! read as JSON arrays of `{"id", "lat", "long"}` records.

use huntpath_route::{ClueId, ClueNode, Route, RouteConfig};
use serde::{Deserialize, Serialize};

use crate::ExportError;

/// Serialized form of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDocument {
    /// Clue ids in visiting order.
    #[serde(rename = "clueIDs")]
    pub clue_ids: Vec<ClueId>,
    /// Open route length.
    pub length: f64,
    /// Closed tour length (open length plus the return leg).
    pub closed_length: f64,
    /// Configuration used to plan the route, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RouteConfig>,
}

/// Options for [`to_json`].
#[derive(Debug, Clone, Default)]
pub struct JsonMetadata<'a> {
    /// Configuration to embed alongside the route.
    pub config: Option<&'a RouteConfig>,
    /// Pretty-print with indentation.
    pub pretty: bool,
}

/// The response document for `route`, without a config.
#[must_use]
pub fn route_document(route: &Route) -> RouteDocument {
    RouteDocument {
        clue_ids: route.ids(),
        length: route.length(),
        closed_length: route.closed_length(),
        config: None,
    }
}

/// Serialize `route` as a JSON response document.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_json(route: &Route, metadata: &JsonMetadata<'_>) -> Result<String, ExportError> {
    let document = RouteDocument {
        config: metadata.config.cloned(),
        ..route_document(route)
    };
    let json = if metadata.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    Ok(json)
}

/// Parse a JSON array of `{"id", "lat", "long"}` records.
///
/// No validation beyond the JSON shape is done here; the route engine
/// rejects duplicate ids and non-finite coordinates.
///
/// # Errors
///
/// Returns [`ExportError::Json`] for malformed input.
pub fn parse_points(json: &str) -> Result<Vec<ClueNode>, ExportError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use huntpath_route::RouteStrategy;

    use super::*;

    fn line_route() -> Route {
        Route::new(vec![
            ClueNode::new(1, 0.0, 0.0),
            ClueNode::new(2, 0.0, 5.0),
            ClueNode::new(3, 0.0, 10.0),
        ])
    }

    #[test]
    fn document_uses_service_field_names() {
        let json = to_json(&line_route(), &JsonMetadata::default()).unwrap();
        assert_eq!(
            json,
            r#"{"clueIDs":[1,2,3],"length":10.0,"closedLength":20.0}"#
        );
    }

    #[test]
    fn empty_route_document() {
        let json = to_json(&Route::default(), &JsonMetadata::default()).unwrap();
        assert_eq!(json, r#"{"clueIDs":[],"length":0.0,"closedLength":0.0}"#);
    }

    #[test]
    fn config_is_embedded_when_given() {
        let config = RouteConfig {
            strategy: RouteStrategy::NearestNeighbor,
            ..RouteConfig::default()
        };
        let meta = JsonMetadata {
            config: Some(&config),
            pretty: true,
        };
        let json = to_json(&line_route(), &meta).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains(r#""strategy": "nearest-neighbor""#));

        let back: RouteDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.config, Some(config));
        assert_eq!(back.clue_ids, vec![1, 2, 3]);
    }

    #[test]
    fn parse_points_reads_records() {
        let points = parse_points(r#"[{"id": 4, "lat": 1.5, "long": -2.0}]"#).unwrap();
        assert_eq!(points, vec![ClueNode::new(4, 1.5, -2.0)]);
    }

    #[test]
    fn parse_points_rejects_bad_shape() {
        let err = parse_points(r#"{"id": 4}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid JSON"));
        assert!(parse_points(r#"[{"id": 4, "lat": 1.0}]"#).is_err());
    }
}
