//! Planner diagnostics: timing, counts, and lengths for each stage.
//!
//! [`plan_with_diagnostics`] runs the staged planner and records what each
//! stage did and how long it took. Time is read through the [`Clock`]
//! trait so the engine stays free of any particular time source; the bench
//! binary supplies one backed by `std::time::Instant`.
//!
//! Durations are serialized as fractional seconds (`f64`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::planner::{Planner, PlannerStage};
use crate::types::{ClueNode, RouteConfig, RouteError, StagedRoute};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single planner run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDiagnostics {
    /// Stage 1: input validation.
    pub validate: StageDiagnostics,
    /// Stage 2: fully connected graph construction.
    pub connect: StageDiagnostics,
    /// Stage 3: minimum spanning tree.
    pub span: StageDiagnostics,
    /// Stage 4: odd-degree matching.
    pub matching: StageDiagnostics,
    /// Stage 5: Eulerian circuit.
    pub circuit: StageDiagnostics,
    /// Stage 6: shortcut and orientation.
    pub order: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PlanSummary,
}

/// Diagnostics for a single planner stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: Option<StageMetrics>,
}

/// Stage-specific metrics that vary by planner stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Input validation metrics.
    Validate {
        /// Points supplied by the caller.
        input_count: usize,
        /// Distinct points after validation.
        point_count: usize,
        /// Exact duplicates dropped.
        collapsed: usize,
    },
    /// Candidate graph metrics.
    Connect {
        /// Nodes in the graph.
        node_count: usize,
        /// Candidate edges (`n * (n - 1) / 2`).
        edge_count: usize,
    },
    /// Spanning tree metrics.
    Span {
        /// Candidate edges considered.
        candidate_count: usize,
        /// Edges in the tree.
        edge_count: usize,
        /// Total tree weight.
        total_weight: f64,
    },
    /// Odd-degree matching metrics.
    Match {
        /// Which matching strategy was configured.
        strategy: String,
        /// Odd-degree tree nodes.
        odd_count: usize,
        /// Pairs formed.
        pair_count: usize,
        /// Total weight of the matching edges.
        matching_weight: f64,
    },
    /// Eulerian circuit metrics.
    Circuit {
        /// Multigraph edges (tree + matching).
        edge_count: usize,
        /// Nodes in the walk, first node counted twice.
        walk_count: usize,
        /// Length of the walk.
        circuit_length: f64,
    },
    /// Final ordering metrics.
    Order {
        /// Which route strategy was used.
        strategy: String,
        /// Stops in the route.
        stop_count: usize,
        /// Length of the Eulerian circuit before shortcutting.
        circuit_length: f64,
        /// Open route length.
        length: f64,
        /// Closed tour length.
        closed_length: f64,
    },
}

/// High-level summary for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Distinct points planned over.
    pub point_count: usize,
    /// Stops in the final route.
    pub stop_count: usize,
    /// Total spanning tree weight, a lower bound on any closed tour.
    pub tree_weight: f64,
    /// Open route length.
    pub route_length: f64,
    /// Closed tour length.
    pub closed_length: f64,
}

/// Run the staged planner, timing every stage with `clock`.
///
/// # Errors
///
/// Returns [`RouteError`] if any stage fails; see [`crate::planner`].
pub fn plan_with_diagnostics<C: Clock>(
    points: &[ClueNode],
    config: &RouteConfig,
    clock: &C,
) -> Result<(StagedRoute, PlanDiagnostics), RouteError> {
    let total_start = clock.now();
    let pending = Planner::new(points.to_vec(), config.clone());

    let t = clock.now();
    let validated = pending.validate()?;
    let validate = measure(clock, &t, &validated);

    let t = clock.now();
    let connected = validated.connect();
    let connect = measure(clock, &t, &connected);

    let t = clock.now();
    let spanned = connected.span();
    let span = measure(clock, &t, &spanned);
    let tree_weight = spanned.tree().total_weight();

    let t = clock.now();
    let matched = spanned.match_odd();
    let matching = measure(clock, &t, &matched);

    let t = clock.now();
    let circuited = matched.circuit()?;
    let circuit = measure(clock, &t, &circuited);

    let t = clock.now();
    let ordered = circuited.order()?;
    let order = measure(clock, &t, &ordered);

    let total_duration = clock.elapsed(&total_start);
    let staged = ordered.into_result();
    let summary = PlanSummary {
        point_count: staged.points.len(),
        stop_count: staged.route.len(),
        tree_weight,
        route_length: staged.route.length(),
        closed_length: staged.route.closed_length(),
    };

    tracing::debug!(
        points = summary.point_count,
        total_ms = duration_ms(total_duration),
        "planned route with diagnostics"
    );

    Ok((
        staged,
        PlanDiagnostics {
            validate,
            connect,
            span,
            matching,
            circuit,
            order,
            total_duration,
            summary,
        },
    ))
}

/// Stop the stage timer, then collect the stage's metrics.
fn measure<C: Clock, S: PlannerStage>(clock: &C, since: &C::Instant, stage: &S) -> StageDiagnostics {
    let duration = clock.elapsed(since);
    StageDiagnostics {
        duration,
        metrics: stage.metrics(),
    }
}

impl PlanDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Route Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Points: {}  |  Stops: {}",
            self.summary.point_count, self.summary.stop_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Validate", &self.validate),
            ("Connect", &self.connect),
            ("Span", &self.span),
            ("Match", &self.matching),
            ("Circuit", &self.circuit),
            ("Order", &self.order),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = diag
                .metrics
                .as_ref()
                .map_or_else(|| "-".to_string(), format_metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Tree weight: {:.3}  |  Route length: {:.3}  |  Closed: {:.3}",
            self.summary.tree_weight, self.summary.route_length, self.summary.closed_length,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Validate {
            input_count,
            point_count,
            collapsed,
        } => format!("{input_count} in -> {point_count} points ({collapsed} collapsed)"),
        StageMetrics::Connect {
            node_count,
            edge_count,
        } => format!("{node_count} nodes, {edge_count} edges"),
        StageMetrics::Span {
            candidate_count,
            edge_count,
            total_weight,
        } => format!("{candidate_count} -> {edge_count} edges, weight={total_weight:.3}"),
        StageMetrics::Match {
            strategy,
            odd_count,
            pair_count,
            matching_weight,
        } => format!("{strategy} {odd_count} odd -> {pair_count} pairs, weight={matching_weight:.3}"),
        StageMetrics::Circuit {
            edge_count,
            walk_count,
            circuit_length,
        } => format!("{edge_count} edges, walk of {walk_count}, length={circuit_length:.3}"),
        StageMetrics::Order {
            strategy,
            stop_count,
            circuit_length,
            length,
            closed_length,
        } => format!(
            "{strategy} {stop_count} stops, circuit {circuit_length:.3} -> closed {closed_length:.3}, open {length:.3}",
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Advances one millisecond every time it is read.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn points() -> Vec<ClueNode> {
        vec![
            ClueNode::new(1, 0.0, 0.0),
            ClueNode::new(2, 0.0, 5.0),
            ClueNode::new(3, 0.0, 10.0),
            ClueNode::new(2, 0.0, 5.0),
        ]
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        assert!((duration_ms(d) - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_cover_every_stage() {
        let clock = TickClock(Cell::new(0));
        let (staged, diag) =
            plan_with_diagnostics(&points(), &RouteConfig::default(), &clock).unwrap();
        assert_eq!(staged.route.ids(), vec![1, 2, 3]);
        assert_eq!(
            diag.validate.metrics,
            Some(StageMetrics::Validate {
                input_count: 4,
                point_count: 3,
                collapsed: 1,
            })
        );
        assert!(matches!(
            diag.connect.metrics,
            Some(StageMetrics::Connect { edge_count: 3, .. })
        ));
        assert!(diag.order.duration > Duration::ZERO);
        assert!(diag.total_duration >= diag.order.duration);
        assert_eq!(diag.summary.stop_count, 3);
        assert!((diag.summary.route_length - 10.0).abs() < 1e-9);
        assert!((diag.summary.tree_weight - 10.0).abs() < 1e-9);
    }

    #[test]
    fn diagnostics_propagate_errors() {
        let clock = TickClock(Cell::new(0));
        let bad = [ClueNode::new(1, f64::INFINITY, 0.0)];
        assert!(matches!(
            plan_with_diagnostics(&bad, &RouteConfig::default(), &clock),
            Err(RouteError::NonFiniteCoordinate { id: 1, .. })
        ));
    }

    #[test]
    fn report_lists_stages() {
        let clock = TickClock(Cell::new(0));
        let (_, diag) = plan_with_diagnostics(&points(), &RouteConfig::default(), &clock).unwrap();
        let report = diag.report();
        assert!(report.contains("Route Diagnostics Report"));
        for stage in ["Validate", "Connect", "Span", "Match", "Circuit", "Order"] {
            assert!(report.contains(stage), "missing {stage}");
        }
        assert!(report.contains("christofides"));
        assert!(report.contains("1 collapsed"));
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let diag = StageDiagnostics {
            duration: Duration::from_millis(1500),
            metrics: None,
        };
        let json = serde_json::to_value(&diag).unwrap();
        assert!((json["duration"].as_f64().unwrap() - 1.5).abs() < 1e-12);
        let back: StageDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.duration, Duration::from_millis(1500));
    }

    #[test]
    fn negative_duration_rejected() {
        let result: Result<StageDiagnostics, _> =
            serde_json::from_str(r#"{"duration": -1.0, "metrics": null}"#);
        assert!(result.is_err());
    }
}
