//! Resolution run metrics.
//!
//! The resolver always counts, but only the verbose entry point
//! (`resolve_stack_verbose_with`) hands the numbers back to the caller. They
//! are meant for debugging large or deeply delegated stacks.
//!
//! `files_read` counts reads, not distinct files: a file included from every
//! phase is read once per phase.

use crate::Phase;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct ResolveMetrics {
    /// Total elapsed time for the whole resolution.
    pub total: Duration,
    /// Number of file reads performed.
    pub files_read: usize,
    /// Sum of the lengths of all file contents read.
    pub bytes_read: usize,
    /// Number of delegation directives replaced by their expansion.
    pub delegations_expanded: usize,
    /// Per-phase timings, in resolution order.
    pub phases: Vec<PhaseMetrics>,
}

/// Timing and output size for one phase.
#[derive(Debug, Clone)]
pub struct PhaseMetrics {
    pub phase: Phase,
    /// Elapsed time for the phase, including nested delegations.
    pub duration: Duration,
    /// Directives the phase contributed to the final stack.
    pub directives: usize,
}
