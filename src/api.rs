use crate::engine::{self, DirectiveList, ResolveMetrics};
use crate::{Directive, FsSource, Phase, PhaseSet, TextSource};
use once_cell::sync::Lazy;
use std::io;
use std::path::{Path, PathBuf};

/// Default upper bound for a single stack file: 1 MiB.
pub const DEFAULT_SIZE_LIMIT: u64 = 1024 * 1024;

static DEFAULT_OPTIONS: Lazy<Options> = Lazy::new(Options::default);

/// Options that affect resolution.
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum size, in bytes, of any single file read during resolution.
    pub size_limit: u64,
    /// Phases to resolve. Defaults to all four.
    pub phases: PhaseSet,
}

impl Default for Options {
    fn default() -> Self {
        Options { size_limit: DEFAULT_SIZE_LIMIT, phases: PhaseSet::all() }
    }
}

impl Options {
    pub fn with_size_limit(mut self, size_limit: u64) -> Self {
        self.size_limit = size_limit;
        self
    }

    pub fn with_phases(mut self, phases: PhaseSet) -> Self {
        self.phases = phases;
        self
    }
}

/// Why a stack could not be resolved.
///
/// Every variant aborts the whole resolution; no partial stack is returned.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A non-blank, non-comment line matched neither directive shape.
    #[error("{}:{line_number}: malformed stack line: {text:?}", .path.display())]
    MalformedLine { path: PathBuf, line_number: usize, text: String },

    /// A file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file is larger than [`Options::size_limit`].
    #[error("{} is {size} bytes, over the limit of {limit} bytes", .path.display())]
    SizeLimitExceeded { path: PathBuf, size: u64, limit: u64 },

    /// `path` is reached a second time within one phase.
    ///
    /// `chain` lists the files entered for `phase` in visit order, ending with
    /// the repeated `path`.
    #[error("circular delegation in {phase} phase: {}", display_chain(.chain))]
    DelegationCycle { phase: Phase, path: PathBuf, chain: Vec<PathBuf> },
}

impl ResolveError {
    /// The file the error was raised for.
    pub fn path(&self) -> &Path {
        match self {
            ResolveError::MalformedLine { path, .. }
            | ResolveError::Io { path, .. }
            | ResolveError::SizeLimitExceeded { path, .. }
            | ResolveError::DelegationCycle { path, .. } => path,
        }
    }
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(" -> ")
}

/// Result from [`resolve_stack_verbose_with`].
#[derive(Debug, Clone)]
pub struct ResolveResultVerbose {
    /// The resolved stack.
    pub stack: DirectiveList,
    /// Counters and timings for the run.
    pub metrics: ResolveMetrics,
}

/// Resolve the stack rooted at `root` from the filesystem, with default
/// [`Options`].
///
/// Phases are resolved in the order `account, auth, password, session`, and
/// every `include`/`substack` directive is replaced by the directives of the
/// file it names.
pub fn resolve_stack(root: impl AsRef<Path>) -> Result<DirectiveList, ResolveError> {
    resolve_stack_with(root, &FsSource, &DEFAULT_OPTIONS)
}

/// Resolve the stack rooted at `root`, reading files through `source`.
///
/// # Example
/// ```
/// use pamstack::{MemorySource, Options, resolve_stack_with};
///
/// let source = MemorySource::new()
///     .with_file("root", "account include other\nauth required pam_env.so")
///     .with_file("other", "account required pam_unix.so");
///
/// let stack = resolve_stack_with("root", &source, &Options::default()).unwrap();
/// assert_eq!(stack.lines(), vec!["account required pam_unix.so", "auth required pam_env.so"]);
/// ```
pub fn resolve_stack_with<S>(root: impl AsRef<Path>, source: &S, options: &Options) -> Result<DirectiveList, ResolveError>
where
    S: TextSource + ?Sized,
{
    engine::Resolver::new(source, options).run(root.as_ref())
}

/// Like [`resolve_stack_with`], and also return run metrics.
pub fn resolve_stack_verbose_with<S>(
    root: impl AsRef<Path>,
    source: &S,
    options: &Options,
) -> Result<ResolveResultVerbose, ResolveError>
where
    S: TextSource + ?Sized,
{
    let (stack, metrics) = engine::Resolver::new(source, options).run_with_metrics(root.as_ref())?;
    Ok(ResolveResultVerbose { stack, metrics })
}

/// First directive in `stack` whose phase is `phase` and whose module is
/// exactly `module`.
pub fn find<'a>(stack: &'a DirectiveList, phase: Phase, module: &str) -> Option<&'a Directive> {
    engine::find_directive(stack, phase, module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySource;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn resolve_stack_reads_from_the_filesystem() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("pam.d")).unwrap();
        fs::write(
            dir.path().join("pam.d/system-auth"),
            "# generated\nauth required pam_env.so\nauth include common\naccount required pam_unix.so\n",
        )
        .unwrap();
        fs::write(dir.path().join("pam.d/common"), "auth sufficient pam_unix.so nullok\n").unwrap();

        let stack = resolve_stack(dir.path().join("pam.d/system-auth")).unwrap();

        assert_eq!(
            stack.lines(),
            vec!["account required pam_unix.so", "auth required pam_env.so", "auth sufficient pam_unix.so nullok"]
        );
    }

    #[test]
    fn missing_root_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nope");

        let err = resolve_stack(&root).unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }));
        assert_eq!(err.path(), root.as_path());
    }

    #[test]
    fn verbose_reports_metrics() {
        let source = MemorySource::new()
            .with_file("root", "auth include other\nsession required pam_limits.so")
            .with_file("other", "auth required pam_deny.so");

        let res = resolve_stack_verbose_with("root", &source, &Options::default()).unwrap();

        assert_eq!(res.stack.len(), 2);
        assert_eq!(res.metrics.delegations_expanded, 1);
        // root once per phase, plus `other` for the auth phase
        assert_eq!(res.metrics.files_read, 5);
        assert_eq!(res.metrics.phases.iter().map(|p| p.phase).collect::<Vec<_>>(), Phase::ALL.to_vec());
        assert_eq!(res.metrics.phases.iter().map(|p| p.directives).collect::<Vec<_>>(), vec![0, 1, 0, 1]);
        assert!(res.metrics.total >= res.metrics.phases[1].duration);
    }

    #[test]
    fn cycle_error_message_shows_the_chain() {
        let source = MemorySource::new().with_file("a", "auth include b").with_file("b", "auth substack a");

        let err = resolve_stack_with("a", &source, &Options::default()).unwrap_err();
        assert_eq!(err.to_string(), "circular delegation in auth phase: a -> b -> a");
    }
}
