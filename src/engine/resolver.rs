//! Recursive per-phase resolution.
//!
//! Each phase is resolved on its own, starting from the root file:
//!
//! ```text
//! resolve_phase(root, auth)
//!   ├─ read + parse root, keep `auth` lines      [A, include(D), B]
//!   └─ walk the list
//!        include(D) ── resolve_phase(D, auth) ──▶ [X, Y]
//!        splice in place                          [A, X, Y, B]
//! ```
//!
//! ## Loop protection
//!
//! `VisitedFiles` records every file entered while resolving one phase, and
//! nothing is ever removed from it. Entering a file that is already recorded
//! is a `DelegationCycle`. The set is created fresh for every top-level phase,
//! so cycles are detected per phase, and it is passed by `&mut` through the
//! recursion so a repeat anywhere below the root is caught. Each file is thus
//! expanded at most once per phase: a file reached twice, even through two
//! sibling delegations, is rejected the same way as a true loop.
//!
//! ## Relative paths
//!
//! A relative delegation target is joined to the directory of the file that
//! contains the directive, not to the root. When that file path has no
//! directory component the target is used as a bare name.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use super::grammar::{is_ignorable_line, parse_line};
use super::metrics::{PhaseMetrics, ResolveMetrics};
use super::stack::DirectiveList;
use crate::{Options, Phase, ReadError, ResolveError, TextSource};

/// Append-only record of the files entered during one phase.
///
/// The set answers membership; `order` keeps visit order for diagnostics.
#[derive(Debug, Default)]
struct VisitedFiles {
    seen: HashSet<PathBuf>,
    order: Vec<PathBuf>,
}

impl VisitedFiles {
    /// Record `path`. Returns false if it was already recorded.
    fn insert(&mut self, path: &Path) -> bool {
        if !self.seen.insert(path.to_path_buf()) {
            return false;
        }
        self.order.push(path.to_path_buf());
        true
    }

    /// Visit order ending with the repeated `path`, e.g. `a -> b -> a`.
    fn repeated(&self, path: &Path) -> Vec<PathBuf> {
        let mut chain = self.order.clone();
        chain.push(path.to_path_buf());
        chain
    }
}

/// Resolves a stack file into a flat [`DirectiveList`].
///
/// Usage: create with `Resolver::new(&source, &options)` then call `run` or
/// `run_with_metrics` with the root path. A resolver is consumed by the run;
/// nothing is shared between runs.
pub(crate) struct Resolver<'a, S: TextSource + ?Sized> {
    source: &'a S,
    options: &'a Options,
    metrics: ResolveMetrics,
}

impl<'a, S: TextSource + ?Sized> Resolver<'a, S> {
    pub(crate) fn new(source: &'a S, options: &'a Options) -> Self {
        Resolver { source, options, metrics: ResolveMetrics::default() }
    }

    pub(crate) fn run(self, root: &Path) -> Result<DirectiveList, ResolveError> {
        self.run_with_metrics(root).map(|(stack, _)| stack)
    }

    /// Resolve every selected phase in order and concatenate the results.
    pub(crate) fn run_with_metrics(mut self, root: &Path) -> Result<(DirectiveList, ResolveMetrics), ResolveError> {
        let started = Instant::now();
        let root = normalize(root);
        let mut stack = DirectiveList::new();

        for phase in self.options.phases.phases() {
            let phase_started = Instant::now();
            let mut visited = VisitedFiles::default();

            let resolved = self.resolve_phase(&root, phase, &mut visited)?;

            self.metrics.phases.push(PhaseMetrics {
                phase,
                duration: phase_started.elapsed(),
                directives: resolved.len(),
            });
            stack.concatenate(resolved);
        }

        self.metrics.total = started.elapsed();
        log::debug!(
            "[resolve] {} -> {} directives ({} reads, {} delegations)",
            root.display(),
            stack.len(),
            self.metrics.files_read,
            self.metrics.delegations_expanded
        );

        Ok((stack, self.metrics))
    }

    fn resolve_phase(
        &mut self,
        path: &Path,
        phase: Phase,
        visited: &mut VisitedFiles,
    ) -> Result<DirectiveList, ResolveError> {
        if !visited.insert(path) {
            return Err(ResolveError::DelegationCycle {
                phase,
                path: path.to_path_buf(),
                chain: visited.repeated(path),
            });
        }

        self.expand_file(path, phase, visited)
    }

    fn expand_file(
        &mut self,
        path: &Path,
        phase: Phase,
        visited: &mut VisitedFiles,
    ) -> Result<DirectiveList, ResolveError> {
        let mut list = self.parse_file(path, phase)?;

        // Expanded content is already fully resolved, so the walk resumes
        // right after whatever was spliced in.
        let mut position = 0;
        while let Some(directive) = list.get(position) {
            let Some(kind) = directive.delegation_kind() else {
                position += 1;
                continue;
            };

            let target = delegation_target(path, directive.module_name());
            log::debug!("[expand] {} {}: {} -> {}", phase, kind.as_str(), path.display(), target.display());

            let expanded = self.resolve_phase(&target, phase, visited)?;
            let Some(next) = list.splice_replace(position, expanded) else {
                break;
            };
            position = next;
            self.metrics.delegations_expanded += 1;
        }

        Ok(list)
    }

    /// Read `path` and keep the directives of `phase`, in file order.
    fn parse_file(&mut self, path: &Path, phase: Phase) -> Result<DirectiveList, ResolveError> {
        let content = self.source.read_text(path, self.options.size_limit).map_err(|err| match err {
            ReadError::Io(source) => ResolveError::Io { path: path.to_path_buf(), source },
            ReadError::TooLarge { size, limit } => {
                ResolveError::SizeLimitExceeded { path: path.to_path_buf(), size, limit }
            }
        })?;

        self.metrics.files_read += 1;
        self.metrics.bytes_read += content.len();
        log::debug!("[read] {} ({} bytes) phase={}", path.display(), content.len(), phase);

        let mut list = DirectiveList::new();
        for (idx, raw) in content.lines().enumerate() {
            if is_ignorable_line(raw) {
                continue;
            }

            let directive = parse_line(raw).map_err(|err| ResolveError::MalformedLine {
                path: path.to_path_buf(),
                line_number: idx + 1,
                text: err.text,
            })?;

            if directive.phase() != phase {
                log::trace!("[skip] {}:{} phase={} (resolving {})", path.display(), idx + 1, directive.phase(), phase);
                continue;
            }

            list.append(directive);
        }

        Ok(list)
    }
}

/// Where a delegation written in `current` points to.
fn delegation_target(current: &Path, reference: &str) -> PathBuf {
    let reference = Path::new(reference);
    if reference.is_absolute() {
        return normalize(reference);
    }

    match current.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => normalize(&dir.join(reference)),
        _ => normalize(reference),
    }
}

/// Drop `.` components so `./a` and `a` name the same file. `..` is kept:
/// collapsing it lexically is wrong in the presence of symlinks.
fn normalize(path: &Path) -> PathBuf {
    path.components().filter(|c| !matches!(c, Component::CurDir)).collect()
}
