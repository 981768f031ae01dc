//! SVG export serializer.
//!
//! Renders a route over its clue points as an SVG string using the
//! [`svg`] crate for document construction, XML escaping, and path data
//! formatting.
//!
//! Coordinates stay in degree space: longitude maps to `x` and latitude
//! to `-y`, so north is up. The `viewBox` is the bounding box of all
//! points plus a small margin, and stroke widths and marker radii scale
//! with it.
//!
//! Optional [`SvgMetadata`] embeds `<title>`, `<desc>` and `<metadata>`
//! elements so exported previews are self-describing.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::collections::HashSet;

use huntpath_route::{ClueId, ClueNode, Edge, Route, StagedRoute};
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Group, Line, Path, Rectangle, Title};
use svg::node::{Node, Text, Value};

/// Rendered length of the longer document axis, in pixels.
const DOCUMENT_SIZE_PX: f64 = 800.0;
/// Margin on each side as a fraction of the longer extent.
const MARGIN_RATIO: f64 = 0.05;
/// Route stroke width as a fraction of the longer extent.
const STROKE_RATIO: f64 = 0.004;
/// Clue marker radius as a fraction of the longer extent.
const MARKER_RATIO: f64 = 0.01;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically by
/// the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized `RouteConfig`, emitted inside `<metadata>` wrapped in a
    /// namespaced `<huntpath:config>` element so previews carry the
    /// settings that produced them.
    pub config_json: Option<&'a str>,
}

/// Map a clue into drawing space: `(long, -lat)`.
fn project(node: ClueNode) -> (f64, f64) {
    // `0.0 - lat` rather than `-lat` keeps the equator at `0`, not `-0`.
    (node.long, 0.0 - node.lat)
}

/// Round to three decimals for compact attribute values.
fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Visible region in drawing space.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    min_x: f64,
    min_y: f64,
    width: f64,
    height: f64,
}

impl Frame {
    /// Bounding box of `nodes` plus margin. An empty set gets a unit frame
    /// around the origin; a single location gets a unit-sized one.
    fn around(nodes: impl IntoIterator<Item = ClueNode>) -> Self {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for node in nodes {
            let (x, y) = project(node);
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        let (x0, y0, x1, y1) = bounds.unwrap_or((0.0, 0.0, 0.0, 0.0));
        let base = (x1 - x0).max(y1 - y0);
        let base = if base > 0.0 { base } else { 1.0 };
        let margin = base * MARGIN_RATIO;
        Self {
            min_x: x0 - margin,
            min_y: y0 - margin,
            width: (x1 - x0) + 2.0 * margin,
            height: (y1 - y0) + 2.0 * margin,
        }
    }

    fn extent(&self) -> f64 {
        self.width.max(self.height)
    }

    fn view_box(&self) -> String {
        format!(
            "{} {} {} {}",
            round3(self.min_x),
            round3(self.min_y),
            round3(self.width),
            round3(self.height),
        )
    }

    /// Pixel size with the longer axis at [`DOCUMENT_SIZE_PX`].
    fn pixel_size(&self) -> (f64, f64) {
        let scale = DOCUMENT_SIZE_PX / self.extent();
        (round3(self.width * scale), round3(self.height * scale))
    }
}

/// Build an SVG path `d` attribute string from a route.
///
/// Uses `M` for the first stop and `L` for subsequent stops, in drawing
/// space. Returns an empty string for routes with fewer than 2 stops.
///
/// # Examples
///
/// ```
/// use huntpath_route::{ClueNode, Route};
/// use huntpath_export::build_path_data;
///
/// let route = Route::new(vec![
///     ClueNode::new(1, 10.0, 20.0),
///     ClueNode::new(2, 30.0, 40.0),
/// ]);
/// assert_eq!(build_path_data(&route), "M20,-10 L40,-30");
/// ```
#[must_use]
pub fn build_path_data(route: &Route) -> String {
    let stops = route.stops();
    if stops.len() < 2 {
        return String::new();
    }

    let mut data = Data::new().move_to(project(stops[0]));
    for &stop in &stops[1..] {
        data = data.line_to(project(stop));
    }
    String::from(Value::from(data))
}

/// Empty document sized to `frame` with the optional metadata elements.
fn document(frame: &Frame, metadata: &SvgMetadata<'_>) -> Document {
    let (width, height) = frame.pixel_size();
    let mut doc = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", frame.view_box());

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("huntpath:config");
        config_el.assign("xmlns:huntpath", "urn:huntpath:config");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    doc
}

/// `<path id="route">` for `route`, or `None` below two stops.
fn route_path(route: &Route, stroke: &str, frame: &Frame) -> Option<Path> {
    let d = build_path_data(route);
    if d.is_empty() {
        return None;
    }
    Some(
        Path::new()
            .set("id", "route")
            .set("d", d)
            .set("fill", "none")
            .set("stroke", stroke)
            .set("stroke-width", round3(frame.extent() * STROKE_RATIO))
            .set("stroke-linejoin", "round"),
    )
}

/// One `<circle>` per clue, grouped under `<g id="clues">`.
///
/// The route's first stop is tagged `data-start`, nodes in `odd` are
/// tagged `data-odd` and filled orange.
fn clue_markers(
    points: &[ClueNode],
    first_stop: Option<ClueId>,
    odd: &HashSet<ClueId>,
    frame: &Frame,
    fill: &str,
) -> Group {
    let radius = round3(frame.extent() * MARKER_RATIO);
    let mut group = Group::new().set("id", "clues");
    for &point in points {
        let (cx, cy) = project(point);
        let is_odd = odd.contains(&point.id);
        let mut circle = Circle::new()
            .set("cx", cx)
            .set("cy", cy)
            .set("r", radius)
            .set("fill", if is_odd { "orange" } else { fill })
            .set("data-id", point.id)
            .add(Title::new(format!("clue {}", point.id).as_str()));
        if first_stop == Some(point.id) {
            circle = circle.set("data-start", "true").set("stroke", "green");
        }
        if is_odd {
            circle = circle.set("data-odd", "true");
        }
        group = group.add(circle);
    }
    group
}

/// Edges as `<line>` elements grouped under `<g id={id}>`.
fn edge_group(id: &str, edges: &[Edge], stroke: &str, frame: &Frame) -> Group {
    let mut group = Group::new()
        .set("id", id)
        .set("stroke", stroke)
        .set("stroke-width", round3(frame.extent() * STROKE_RATIO * 1.5));
    for edge in edges {
        let (x1, y1) = project(edge.from);
        let (x2, y2) = project(edge.to);
        group = group.add(
            Line::new()
                .set("x1", x1)
                .set("y1", y1)
                .set("x2", x2)
                .set("y2", y2)
                .set("data-from", edge.from.id)
                .set("data-to", edge.to.id)
                .set("data-weight", round3(edge.weight)),
        );
    }
    group
}

/// Serialize a route and its clue points to an SVG string.
///
/// The route is drawn as a single black `<path id="route">`; every point
/// in `points` gets a marker. The frame covers both `points` and the
/// route's stops.
#[must_use]
pub fn to_svg(points: &[ClueNode], route: &Route, metadata: &SvgMetadata<'_>) -> String {
    let frame = Frame::around(points.iter().chain(route.stops()).copied());
    let mut doc = document(&frame, metadata);

    if let Some(path) = route_path(route, "black", &frame) {
        doc = doc.add(path);
    }
    let first_stop = route.stops().first().map(|n| n.id);
    doc = doc.add(clue_markers(
        points,
        first_stop,
        &HashSet::new(),
        &frame,
        "black",
    ));

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

/// Serialize a staged route into a diagnostic SVG.
///
/// On a dark background, draws the spanning tree edges in red under
/// `<g id="mst-edges">`, the matching edges in dashed blue under
/// `<g id="matching-edges">`, the final route in white, and the clue
/// markers with odd-degree tree nodes highlighted. Every `<line>` carries
/// `data-from`, `data-to` and `data-weight` attributes for programmatic
/// inspection.
#[must_use]
pub fn to_diagnostic_svg(staged: &StagedRoute, metadata: &SvgMetadata<'_>) -> String {
    let frame = Frame::around(staged.points.iter().copied());
    let mut doc = document(&frame, metadata);

    doc = doc.add(
        Rectangle::new()
            .set("x", round3(frame.min_x))
            .set("y", round3(frame.min_y))
            .set("width", round3(frame.width))
            .set("height", round3(frame.height))
            .set("fill", "#1a1a1a"),
    );

    if !staged.tree.is_empty() {
        doc = doc.add(edge_group("mst-edges", &staged.tree, "red", &frame).set("opacity", 0.9));
    }
    if !staged.matching.is_empty() {
        let dash = round3(frame.extent() * MARKER_RATIO);
        doc = doc.add(
            edge_group("matching-edges", &staged.matching, "dodgerblue", &frame)
                .set("stroke-dasharray", format!("{dash} {dash}")),
        );
    }
    if let Some(path) = route_path(&staged.route, "white", &frame) {
        doc = doc.add(path);
    }

    let odd: HashSet<ClueId> = staged.odd_nodes.iter().map(|n| n.id).collect();
    let first_stop = staged.route.stops().first().map(|n| n.id);
    doc = doc.add(clue_markers(&staged.points, first_stop, &odd, &frame, "white"));

    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
