//! Probes: yes/no questions answered from a resolved system stack.
//!
//! A probe resolves the stack, looks up one module, and checks its
//! parameters. The only probe today asks whether `pam_unix.so` accepts empty
//! passwords (`nullok`) in the `auth` phase.

use crate::{FsSource, Options, Phase, ResolveError, TextSource, resolve_stack_with};
use std::path::Path;

/// Directory holding the system PAM stacks.
pub const DEFAULT_PAM_DIR: &str = "/etc/pam.d";

/// Stack file the probes inspect, relative to [`DEFAULT_PAM_DIR`].
pub const SYSTEM_AUTH: &str = "system-auth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// `auth ... pam_unix.so` carries the `nullok` parameter.
    PamUnixNullok,
}

impl Probe {
    /// Phase, module and parameter substring this probe checks.
    fn target(self) -> (Phase, &'static str, &'static str) {
        match self {
            Probe::PamUnixNullok => (Phase::Auth, "pam_unix.so", "nullok"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The probed module does not appear in the stack.
    #[error("{module} not found in {phase} phase")]
    ModuleNotFound { phase: Phase, module: &'static str },
}

/// Run `probe` against `/etc/pam.d/system-auth`.
pub fn probe_enabled(probe: Probe) -> Result<bool, ProbeError> {
    let root = Path::new(DEFAULT_PAM_DIR).join(SYSTEM_AUTH);
    probe_enabled_with(probe, root, &FsSource, &Options::default())
}

/// Run `probe` against the stack rooted at `root`.
///
/// The parameter check is a plain substring test, so `nullok` also matches
/// inside a longer word that contains it verbatim.
pub fn probe_enabled_with<S>(
    probe: Probe,
    root: impl AsRef<Path>,
    source: &S,
    options: &Options,
) -> Result<bool, ProbeError>
where
    S: TextSource + ?Sized,
{
    let (phase, module, needle) = probe.target();

    let stack = resolve_stack_with(root, source, options)?;
    let directive = stack.find(phase, module).ok_or(ProbeError::ModuleNotFound { phase, module })?;

    let enabled = directive.parameters().contains(needle);
    log::debug!("[probe] {:?}: {} -> {}", probe, directive, enabled);

    Ok(enabled)
}
