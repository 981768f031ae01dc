//! Incremental planner: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::plan`] which produces only the final route,
//! [`Planner`] lets the caller drive the work one step at a time:
//!
//! ```rust
//! # use huntpath_route::{ClueNode, Planner, RouteConfig, RouteError};
//! # fn run(points: Vec<ClueNode>) -> Result<(), RouteError> {
//! let ordered = Planner::new(points, RouteConfig::default())
//!     .validate()?
//!     .connect()
//!     .span()
//!     .match_odd()
//!     .circuit()?
//!     .order()?;
//!
//! let staged = ordered.into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next planner state
//! (or `Result` for fallible stages), carrying the intermediates later
//! stages need. The fully connected candidate graph is dropped once the
//! tree is built; it is the only `O(n^2)` structure.
//!
//! The stages always build the Christofides intermediates. With
//! [`RouteStrategy::NearestNeighbor`] the final stage replaces the
//! shortcut tour with a nearest-neighbour tour, so both routes can be
//! compared against the same tree and circuit.

use crate::degree::{DegreeMap, degrees, odd_degree_nodes};
use crate::diagnostics::StageMetrics;
use crate::graph::Graph;
use crate::mst::minimum_spanning_tree;
use crate::ordering::{RouteStrategy, nearest_neighbor_tour, orient};
use crate::tour::{build_multigraph, eulerian_circuit, match_odd_nodes, shortcut};
use crate::types::{
    ClueId, ClueNode, Edge, Route, RouteConfig, RouteError, StagedRoute, walk_length,
};
use crate::validation::{ValidatedPoints, validate_points};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Planner state before any processing has occurred.
///
/// Call [`validate`](Self::validate) to advance.
#[must_use = "planner stages are consumed by advancing; call .validate() to continue"]
pub struct Pending {
    config: RouteConfig,
    points: Vec<ClueNode>,
}

impl Pending {
    /// The raw input points.
    #[must_use]
    pub fn points(&self) -> &[ClueNode] {
        &self.points
    }

    /// Validate the input and advance to the [`Validated`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NonFiniteCoordinate`] or
    /// [`RouteError::DuplicateId`] for bad points, and
    /// [`RouteError::UnknownStart`] if the configured start is absent.
    pub fn validate(self) -> Result<Validated, RouteError> {
        let points = validate_points(&self.points)?;
        points.check_start(self.config.start)?;
        Ok(Validated {
            config: self.config,
            input_count: self.points.len(),
            points,
        })
    }
}

// ───────────────────────── Stage 1: Validated ────────────────────────

/// Planner state after validation: unique, finite points sorted by id.
#[must_use = "planner stages are consumed by advancing; call .connect() to continue"]
pub struct Validated {
    config: RouteConfig,
    input_count: usize,
    points: ValidatedPoints,
}

impl Validated {
    /// The validated points, sorted by id.
    #[must_use]
    pub fn points(&self) -> &[ClueNode] {
        self.points.points()
    }

    /// Build the fully connected candidate graph.
    pub fn connect(self) -> Connected {
        let graph = Graph::fully_connected(self.points.points());
        Connected {
            config: self.config,
            points: self.points,
            graph,
        }
    }
}

// ───────────────────────── Stage 2: Connected ────────────────────────

/// Planner state holding the complete weighted graph.
#[must_use = "planner stages are consumed by advancing; call .span() to continue"]
pub struct Connected {
    config: RouteConfig,
    points: ValidatedPoints,
    graph: Graph,
}

impl Connected {
    /// The fully connected candidate graph.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Extract the minimum spanning tree.
    pub fn span(self) -> Spanned {
        let tree = minimum_spanning_tree(&self.graph);
        Spanned {
            config: self.config,
            points: self.points,
            candidate_count: self.graph.edges().len(),
            tree,
        }
    }
}

// ───────────────────────── Stage 3: Spanned ──────────────────────────

/// Planner state holding the minimum spanning tree.
#[must_use = "planner stages are consumed by advancing; call .match_odd() to continue"]
pub struct Spanned {
    config: RouteConfig,
    points: ValidatedPoints,
    candidate_count: usize,
    tree: Graph,
}

impl Spanned {
    /// The minimum spanning tree.
    #[must_use]
    pub const fn tree(&self) -> &Graph {
        &self.tree
    }

    /// Find the odd-degree tree nodes and pair them up.
    pub fn match_odd(self) -> Matched {
        let degrees = degrees(&self.tree);
        let odd = odd_degree_nodes(&self.tree, &degrees);
        let matching = match_odd_nodes(&odd, self.config.matching);
        Matched {
            config: self.config,
            points: self.points,
            tree: self.tree,
            degrees,
            odd,
            matching,
        }
    }
}

// ───────────────────────── Stage 4: Matched ──────────────────────────

/// Planner state after pairing odd-degree nodes.
#[must_use = "planner stages are consumed by advancing; call .circuit() to continue"]
pub struct Matched {
    config: RouteConfig,
    points: ValidatedPoints,
    tree: Graph,
    degrees: DegreeMap,
    odd: Vec<ClueNode>,
    matching: Vec<Edge>,
}

impl Matched {
    /// Degree of every tree node.
    #[must_use]
    pub const fn degrees(&self) -> &DegreeMap {
        &self.degrees
    }

    /// Tree nodes with odd degree.
    #[must_use]
    pub fn odd_nodes(&self) -> &[ClueNode] {
        &self.odd
    }

    /// Edges pairing up the odd nodes.
    #[must_use]
    pub fn matching(&self) -> &[Edge] {
        &self.matching
    }

    /// Walk the Eulerian circuit of tree + matching.
    ///
    /// # Errors
    ///
    /// Propagates [`eulerian_circuit`] errors. They do not occur for a
    /// tree built from validated points.
    pub fn circuit(self) -> Result<Circuited, RouteError> {
        let circuit = match start_of(&self.config, &self.points) {
            Some(start) => {
                let mut edges = self.tree.edges().to_vec();
                edges.extend_from_slice(&self.matching);
                let multigraph = build_multigraph(self.tree.nodes(), &edges)?;
                eulerian_circuit(&multigraph, start)?
            }
            None => Vec::new(),
        };
        Ok(Circuited {
            config: self.config,
            points: self.points,
            tree: self.tree,
            odd: self.odd,
            matching: self.matching,
            circuit,
        })
    }
}

// ───────────────────────── Stage 5: Circuited ────────────────────────

/// Planner state holding the Eulerian circuit.
#[must_use = "planner stages are consumed by advancing; call .order() to continue"]
pub struct Circuited {
    config: RouteConfig,
    points: ValidatedPoints,
    tree: Graph,
    odd: Vec<ClueNode>,
    matching: Vec<Edge>,
    circuit: Vec<ClueNode>,
}

impl Circuited {
    /// The Eulerian circuit, first node repeated at the end.
    #[must_use]
    pub fn circuit(&self) -> &[ClueNode] {
        &self.circuit
    }

    /// Shortcut (or re-plan, for nearest-neighbour) and orient the route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::UnknownStart`] if the configured start is not
    /// part of the tour.
    pub fn order(self) -> Result<Ordered, RouteError> {
        let tour = match (self.config.strategy, start_of(&self.config, &self.points)) {
            (RouteStrategy::NearestNeighbor, Some(start)) => {
                nearest_neighbor_tour(self.points.points(), start)?
            }
            _ => shortcut(&self.circuit),
        };
        let route = orient(tour, &self.config)?;
        Ok(Ordered {
            config: self.config,
            points: self.points,
            tree: self.tree,
            odd: self.odd,
            matching: self.matching,
            circuit: self.circuit,
            route,
        })
    }
}

// ───────────────────────── Stage 6: Ordered ──────────────────────────

/// Final planner state.
///
/// Call [`into_result`](Self::into_result) to extract every intermediate.
#[must_use = "call .into_result() to extract the staged route"]
pub struct Ordered {
    config: RouteConfig,
    points: ValidatedPoints,
    tree: Graph,
    odd: Vec<ClueNode>,
    matching: Vec<Edge>,
    circuit: Vec<ClueNode>,
    route: Route,
}

impl Ordered {
    /// The final route.
    #[must_use]
    pub const fn route(&self) -> &Route {
        &self.route
    }

    /// Consume the planner and return the full [`StagedRoute`].
    #[must_use]
    pub fn into_result(self) -> StagedRoute {
        StagedRoute {
            points: self.points.into_points(),
            tree: self.tree.into_edges(),
            odd_nodes: self.odd,
            matching: self.matching,
            circuit: self.circuit,
            route: self.route,
        }
    }
}

/// Where the circuit and nearest-neighbour walks begin: the configured
/// start, else the smallest id. `None` only when there are no points.
fn start_of(config: &RouteConfig, points: &ValidatedPoints) -> Option<ClueId> {
    config
        .start
        .or_else(|| points.points().first().map(|p| p.id))
}

// ──────────────────── PlannerStage trait + Stage enum ────────────────

/// Total number of stages in the planner.
pub const STAGE_COUNT: usize = 7;

/// Common interface implemented by every planner stage.
pub trait PlannerStage: Sized {
    /// Human-readable name of this stage (e.g. `"input"`, `"span"`).
    const NAME: &str;

    /// Zero-based index of this stage (`0` for Pending through `6` for
    /// Ordered).
    const INDEX: usize;

    /// Stage-specific metrics for diagnostics.
    ///
    /// Returns `None` for the initial [`Pending`] stage which has not
    /// yet performed any processing.
    fn metrics(&self) -> Option<StageMetrics>;

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(stage))` on success, `Ok(None)` if already at
    /// the final stage, or `Err` if the stage transition fails.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when a fallible transition fails.
    fn next(self) -> Result<Option<Stage>, RouteError>;

    /// Run all remaining stages to completion and return the final
    /// [`StagedRoute`].
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if any remaining fallible stage fails.
    fn complete(self) -> Result<StagedRoute, RouteError>;
}

impl PlannerStage for Pending {
    const NAME: &str = "input";
    const INDEX: usize = 0;

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn next(self) -> Result<Option<Stage>, RouteError> {
        Ok(Some(Stage::Validated(self.validate()?)))
    }

    fn complete(self) -> Result<StagedRoute, RouteError> {
        self.validate()?.complete()
    }
}

impl PlannerStage for Validated {
    const NAME: &str = "validate";
    const INDEX: usize = 1;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Validate {
            input_count: self.input_count,
            point_count: self.points.len(),
            collapsed: self.points.collapsed(),
        })
    }

    fn next(self) -> Result<Option<Stage>, RouteError> {
        Ok(Some(Stage::Connected(self.connect())))
    }

    fn complete(self) -> Result<StagedRoute, RouteError> {
        self.connect().complete()
    }
}

impl PlannerStage for Connected {
    const NAME: &str = "connect";
    const INDEX: usize = 2;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Connect {
            node_count: self.graph.len(),
            edge_count: self.graph.edges().len(),
        })
    }

    fn next(self) -> Result<Option<Stage>, RouteError> {
        Ok(Some(Stage::Spanned(self.span())))
    }

    fn complete(self) -> Result<StagedRoute, RouteError> {
        self.span().complete()
    }
}

impl PlannerStage for Spanned {
    const NAME: &str = "span";
    const INDEX: usize = 3;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Span {
            candidate_count: self.candidate_count,
            edge_count: self.tree.edges().len(),
            total_weight: self.tree.total_weight(),
        })
    }

    fn next(self) -> Result<Option<Stage>, RouteError> {
        Ok(Some(Stage::Matched(self.match_odd())))
    }

    fn complete(self) -> Result<StagedRoute, RouteError> {
        self.match_odd().complete()
    }
}

impl PlannerStage for Matched {
    const NAME: &str = "match";
    const INDEX: usize = 4;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Match {
            strategy: self.config.matching.to_string(),
            odd_count: self.odd.len(),
            pair_count: self.matching.len(),
            matching_weight: self.matching.iter().map(|e| e.weight).fold(0.0, |acc, w| acc + w),
        })
    }

    fn next(self) -> Result<Option<Stage>, RouteError> {
        Ok(Some(Stage::Circuited(self.circuit()?)))
    }

    fn complete(self) -> Result<StagedRoute, RouteError> {
        self.circuit()?.complete()
    }
}

impl PlannerStage for Circuited {
    const NAME: &str = "circuit";
    const INDEX: usize = 5;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Circuit {
            edge_count: self.tree.edges().len() + self.matching.len(),
            walk_count: self.circuit.len(),
            circuit_length: walk_length(&self.circuit),
        })
    }

    fn next(self) -> Result<Option<Stage>, RouteError> {
        Ok(Some(Stage::Ordered(self.order()?)))
    }

    fn complete(self) -> Result<StagedRoute, RouteError> {
        Ok(self.order()?.into_result())
    }
}

impl PlannerStage for Ordered {
    const NAME: &str = "order";
    const INDEX: usize = 6;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Order {
            strategy: self.config.strategy.to_string(),
            stop_count: self.route.len(),
            circuit_length: walk_length(&self.circuit),
            length: self.route.length(),
            closed_length: self.route.closed_length(),
        })
    }

    fn next(self) -> Result<Option<Stage>, RouteError> {
        Ok(None)
    }

    fn complete(self) -> Result<StagedRoute, RouteError> {
        Ok(self.into_result())
    }
}

/// Enum wrapping all planner stages for uniform, loopable access.
///
/// ```rust
/// # use huntpath_route::{ClueNode, Planner, RouteConfig, RouteError};
/// # use huntpath_route::planner::{Advance, Stage};
/// # fn run(points: Vec<ClueNode>) -> Result<(), RouteError> {
/// let mut stage: Stage = Planner::new(points, RouteConfig::default()).into();
/// loop {
///     match stage.advance()? {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete()?;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`Validated`].
    Validated(Validated),
    /// See [`Connected`].
    Connected(Connected),
    /// See [`Spanned`].
    Spanned(Spanned),
    /// See [`Matched`].
    Matched(Matched),
    /// See [`Circuited`].
    Circuited(Circuited),
    /// See [`Ordered`].
    Ordered(Ordered),
}

/// Compile-time guard: adding a [`Stage`] variant makes this match
/// non-exhaustive, a reminder to bump [`STAGE_COUNT`].
#[allow(dead_code, clippy::match_same_arms)]
const fn _stage_count_guard(s: &Stage) {
    match s {
        Stage::Pending(_)
        | Stage::Validated(_)
        | Stage::Connected(_)
        | Stage::Spanned(_)
        | Stage::Matched(_)
        | Stage::Circuited(_)
        | Stage::Ordered(_) => {}
    }
}

/// Result of [`Stage::advance`]: either the next stage or the
/// completed final stage returned unchanged.
#[must_use]
pub enum Advance {
    /// The planner advanced to this next stage.
    Next(Stage),
    /// The planner was already at the final stage; returned unchanged.
    Complete(Stage),
}

/// Delegate a method call to whichever `Stage` variant is active.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::Validated(s) => s.$method($($arg),*),
            Self::Connected(s) => s.$method($($arg),*),
            Self::Spanned(s) => s.$method($($arg),*),
            Self::Matched(s) => s.$method($($arg),*),
            Self::Circuited(s) => s.$method($($arg),*),
            Self::Ordered(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Human-readable name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub fn index(&self) -> usize {
        delegate!(self, index)
    }

    /// Stage-specific metrics; `None` for `Pending`.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        delegate!(self, metrics)
    }

    /// Whether the planner is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Ordered(_))
    }

    /// Advance to the next stage.
    ///
    /// Returns `Ok(None)` if already complete (the `Ordered` value is
    /// consumed).
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if a fallible stage transition fails.
    pub fn next(self) -> Result<Option<Self>, RouteError> {
        delegate!(self, next)
    }

    /// Advance to the next stage, returning `self` unchanged if already
    /// complete.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if a fallible stage transition fails.
    pub fn advance(self) -> Result<Advance, RouteError> {
        if self.is_complete() {
            return Ok(Advance::Complete(self));
        }
        // Only `Ordered` returns `None`, and it is handled above.
        #[allow(clippy::unreachable)]
        let next = self
            .next()?
            .unwrap_or_else(|| unreachable!("non-complete stage returned None from next()"));
        Ok(Advance::Next(next))
    }

    /// Run all remaining stages to completion.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if any remaining fallible stage fails.
    pub fn complete(self) -> Result<StagedRoute, RouteError> {
        delegate!(self, complete)
    }
}

// Lets the macro call `.name()` / `.index()` on a stage value; associated
// constants are not reachable through `self`.
trait StageMetadata {
    fn name(&self) -> &'static str;
    fn index(&self) -> usize;
}

impl<T: PlannerStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn index(&self) -> usize {
        T::INDEX
    }
}

impl From<Pending> for Stage {
    fn from(s: Pending) -> Self {
        Self::Pending(s)
    }
}

impl From<Validated> for Stage {
    fn from(s: Validated) -> Self {
        Self::Validated(s)
    }
}

impl From<Connected> for Stage {
    fn from(s: Connected) -> Self {
        Self::Connected(s)
    }
}

impl From<Spanned> for Stage {
    fn from(s: Spanned) -> Self {
        Self::Spanned(s)
    }
}

impl From<Matched> for Stage {
    fn from(s: Matched) -> Self {
        Self::Matched(s)
    }
}

impl From<Circuited> for Stage {
    fn from(s: Circuited) -> Self {
        Self::Circuited(s)
    }
}

impl From<Ordered> for Stage {
    fn from(s: Ordered) -> Self {
        Self::Ordered(s)
    }
}

// ───────────────────── Planner entry point ───────────────────────────

/// Incremental route planner.
///
/// Created via [`Planner::new`], which stores the points and config
/// without doing any work. Each stage method consumes the current state
/// and returns the next, making it a compile-time error to skip stages or
/// call them out of order.
pub struct Planner;

impl Planner {
    /// Create a new planner from raw points and config.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(points: Vec<ClueNode>, config: RouteConfig) -> Pending {
        Pending { config, points }
    }
}
