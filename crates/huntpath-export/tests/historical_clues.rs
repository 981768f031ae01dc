//! Integration test: plan the historical clue set and export it as JSON and SVG.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;

use huntpath_export::{JsonMetadata, RouteDocument, SvgMetadata};
use huntpath_route::planner::PlannerStage;
use huntpath_route::{RouteConfig, RouteStrategy};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn load_fixture() -> Vec<huntpath_route::ClueNode> {
    let path = workspace_root().join("assets/fixtures/historical-clues.json");
    assert!(path.exists(), "fixture not found at {path:?}");
    let json = std::fs::read_to_string(&path).unwrap();
    huntpath_export::parse_points(&json).expect("fixture should parse")
}

#[test]
fn historical_clues_route_to_json() {
    let points = load_fixture();
    assert_eq!(points.len(), 15);

    for strategy in [RouteStrategy::Christofides, RouteStrategy::NearestNeighbor] {
        let config = RouteConfig {
            strategy,
            ..RouteConfig::default()
        };
        let route = huntpath_route::plan(&points, &config).expect("planning should succeed");

        let json = huntpath_export::to_json(
            &route,
            &JsonMetadata {
                config: Some(&config),
                pretty: false,
            },
        )
        .unwrap();
        let document: RouteDocument = serde_json::from_str(&json).unwrap();

        let mut ids = document.clue_ids.clone();
        ids.sort_unstable();
        assert_eq!(ids, (1..=15).collect::<Vec<_>>(), "{strategy}");
        assert!(document.length > 0.0);
        assert!(document.closed_length >= document.length);
        assert_eq!(document.config, Some(config));
    }
}

#[test]
fn historical_clues_to_svg() {
    let points = load_fixture();
    let staged = huntpath_route::Planner::new(points.clone(), RouteConfig::default())
        .validate()
        .unwrap()
        .complete()
        .unwrap();

    let meta = SvgMetadata {
        title: Some("historical-clues"),
        ..SvgMetadata::default()
    };
    let svg = huntpath_export::to_svg(&points, &staged.route, &meta);
    assert!(svg.contains("<svg"));
    assert!(svg.contains(r#"id="route""#));
    assert_eq!(svg.matches("<circle").count(), 15);
    assert!(svg.contains("</svg>"));

    let diagnostic = huntpath_export::to_diagnostic_svg(&staged, &meta);
    assert_eq!(diagnostic.matches("<line").count(), 14 + staged.matching.len());
    assert!(diagnostic.contains(r#"<g id="mst-edges""#));
    assert!(diagnostic.contains(r#"<g id="matching-edges""#));

    // Write the previews somewhere they can be inspected.
    let target = workspace_root().join("target");
    if std::fs::create_dir_all(&target).is_ok() {
        let _ = std::fs::write(target.join("historical-clues.svg"), &svg);
        let _ = std::fs::write(target.join("historical-clues-diagnostic.svg"), &diagnostic);
    }
}
