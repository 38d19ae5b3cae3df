//! Bundle solvers

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use good_lp::ResolutionError;
use thiserror::Error;

use crate::{items::Item, request::BundleRequest, solution::Bundle};

pub mod brute_force;
pub mod greedy;
pub mod milp;

/// Which solver to run for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    /// Mixed-integer linear programming with diversity cuts
    Milp,

    /// Randomized greedy construction
    Greedy,

    /// Exhaustive backtracking
    BruteForce,
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolverKind::Milp => "MILP",
            SolverKind::Greedy => "GREEDY",
            SolverKind::BruteForce => "BRUTE_FORCE",
        })
    }
}

/// Solver Errors
#[derive(Debug, Error)]
pub enum SolverError {
    /// A cent or load amount cannot be represented exactly as a solver coefficient.
    #[error("amount cannot be represented exactly as a solver coefficient: {amount}")]
    CoefficientNotRepresentable {
        /// The amount that failed the round-trip check
        amount: i64,
    },

    /// Wrapped solver resolution error
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Internal solver invariant was violated (this is a bug).
    #[error("solver invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },
}

/// Why a solver produced no solutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSolutionReason {
    /// The constraints admit no bundle
    Infeasible,

    /// The per-solve wall cap was exceeded
    TimedOut,
}

/// A cancellation flag shared between the caller and a running solver.
///
/// Solvers check it between MILP iterations, between greedy runs, and at the
/// top of each backtracking recursion; cancelling returns the solutions
/// collected so far.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// The immutable inputs of one solve.
#[derive(Debug)]
pub struct SolveContext<'a> {
    /// Per-serving items with positive stock
    pub items: &'a [Item],

    /// The bundle request
    pub request: &'a BundleRequest,

    /// Kitchen preparation capacity
    pub kitchen_cap: i64,

    /// When the build call started; bundles stamp their finding time from it
    pub started: Instant,

    /// Cooperative cancellation flag
    pub cancel: CancelToken,
}

impl<'a> SolveContext<'a> {
    /// Creates a context starting its clock now.
    #[must_use]
    pub fn new(items: &'a [Item], request: &'a BundleRequest, kitchen_cap: i64) -> Self {
        Self {
            items,
            request,
            kitchen_cap,
            started: Instant::now(),
            cancel: CancelToken::new(),
        }
    }

    /// Milliseconds elapsed since the solve started.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// What a solver produced: zero or more bundles, and why the list is empty
/// when it is.
#[derive(Debug)]
pub struct SolverOutcome {
    /// Bundles found, unsorted
    pub bundles: Vec<Bundle>,

    /// Set when `bundles` is empty
    pub reason: Option<NoSolutionReason>,
}

impl SolverOutcome {
    /// An outcome carrying bundles; the reason is set only when there are none.
    #[must_use]
    pub fn found(bundles: Vec<Bundle>) -> Self {
        let reason = bundles.is_empty().then_some(NoSolutionReason::Infeasible);

        Self { bundles, reason }
    }

    /// An empty outcome with an explicit reason.
    #[must_use]
    pub fn empty(reason: NoSolutionReason) -> Self {
        Self {
            bundles: Vec::new(),
            reason: Some(reason),
        }
    }
}

/// Trait for producing bundles from a solve context.
pub trait BundleSolver {
    /// Produce up to `request.top_n` bundles for the context.
    ///
    /// Infeasibility is not an error: solvers return the bundles found so
    /// far (possibly none) with a [`NoSolutionReason`].
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] only for internal failures such as
    /// unrepresentable coefficients; never for a valid-but-hard request.
    fn solve(&self, ctx: &SolveContext<'_>) -> Result<SolverOutcome, SolverError>;
}
