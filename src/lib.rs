//! Resolver for PAM-style authentication stack files.
//!
//! A stack file is a list of directives grouped by phase. Files can pull in
//! other files through `include` and `substack` directives; resolution expands
//! those recursively, rejects circular delegation, and yields one flat list
//! ordered exactly as if the delegated content had been written inline.
//!
//! ```text
//! system-auth ──parse_line──▶ [account …, auth include common, auth …]
//!                                          │
//!                                          └─ resolve "common" (auth only)
//!                                             and splice it in place
//! ```
//!
//! Most callers only need [`resolve_stack`] and [`find`].

mod api;
mod engine;
mod probe;
mod source;

use std::fmt;

pub use api::{
    DEFAULT_SIZE_LIMIT, Options, ResolveError, ResolveResultVerbose, find, resolve_stack, resolve_stack_verbose_with,
    resolve_stack_with,
};
pub use engine::{DirectiveList, MalformedLine, PhaseMetrics, ResolveMetrics, is_ignorable_line, parse_line};
pub use probe::{DEFAULT_PAM_DIR, Probe, ProbeError, SYSTEM_AUTH, probe_enabled, probe_enabled_with};
pub use source::{FsSource, MemorySource, ReadError, TextSource};

/// Suffix that terminates a module token, e.g. `pam_unix.so`.
pub const MODULE_SUFFIX: &str = ".so";

// --- Phases -----------------------------------------------------------------

/// One of the four stages an authentication stack is split into.
///
/// The declaration order is the order in which phases appear in a resolved
/// stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Account,
    Auth,
    Password,
    Session,
}

impl Phase {
    /// All phases in resolution order.
    pub const ALL: [Phase; 4] = [Phase::Account, Phase::Auth, Phase::Password, Phase::Session];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Account => "account",
            Phase::Auth => "auth",
            Phase::Password => "password",
            Phase::Session => "session",
        }
    }

    /// Parse a phase keyword. Matching is exact and case-sensitive.
    pub fn from_keyword(word: &str) -> Option<Phase> {
        match word {
            "account" => Some(Phase::Account),
            "auth" => Some(Phase::Auth),
            "password" => Some(Phase::Password),
            "session" => Some(Phase::Session),
            _ => None,
        }
    }

    /// The single-bit [`PhaseSet`] for this phase.
    pub fn flag(self) -> PhaseSet {
        match self {
            Phase::Account => PhaseSet::ACCOUNT,
            Phase::Auth => PhaseSet::AUTH,
            Phase::Password => PhaseSet::PASSWORD,
            Phase::Session => PhaseSet::SESSION,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags::bitflags! {
    /// Selection of phases to resolve.
    ///
    /// Resolution always visits the selected phases in [`Phase::ALL`] order,
    /// regardless of how the set was built.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PhaseSet: u8 {
        const ACCOUNT  = 1 << 0;
        const AUTH     = 1 << 1;
        const PASSWORD = 1 << 2;
        const SESSION  = 1 << 3;
    }
}

impl PhaseSet {
    /// Iterate the selected phases in resolution order.
    pub fn phases(self) -> impl Iterator<Item = Phase> {
        Phase::ALL.into_iter().filter(move |phase| self.contains(phase.flag()))
    }
}

impl Default for PhaseSet {
    fn default() -> Self {
        PhaseSet::all()
    }
}

impl FromIterator<Phase> for PhaseSet {
    fn from_iter<I: IntoIterator<Item = Phase>>(iter: I) -> Self {
        iter.into_iter().fold(PhaseSet::empty(), |set, phase| set | phase.flag())
    }
}

// --- Actions ----------------------------------------------------------------

/// Simple control-flow keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlFlag {
    Required,
    Requisite,
    Sufficient,
    Optional,
}

impl ControlFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlFlag::Required => "required",
            ControlFlag::Requisite => "requisite",
            ControlFlag::Sufficient => "sufficient",
            ControlFlag::Optional => "optional",
        }
    }

    pub fn from_keyword(word: &str) -> Option<ControlFlag> {
        match word {
            "required" => Some(ControlFlag::Required),
            "requisite" => Some(ControlFlag::Requisite),
            "sufficient" => Some(ControlFlag::Sufficient),
            "optional" => Some(ControlFlag::Optional),
            _ => None,
        }
    }
}

/// The two delegation keywords. Both expand identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delegation {
    Include,
    Substack,
}

impl Delegation {
    pub fn as_str(self) -> &'static str {
        match self {
            Delegation::Include => "include",
            Delegation::Substack => "substack",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Delegation> {
        match word {
            "include" => Some(Delegation::Include),
            "substack" => Some(Delegation::Substack),
            _ => None,
        }
    }
}

/// What a directive does when its module is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// `required`, `requisite`, `sufficient` or `optional`.
    Control(ControlFlag),
    /// Inline control specification, kept verbatim including the brackets,
    /// e.g. `[default=1 ignore=ignore success=ok]`.
    Bracketed(String),
    /// `include` or `substack`. Only present before expansion.
    Delegate(Delegation),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Control(flag) => flag.as_str(),
            Action::Bracketed(spec) => spec,
            Action::Delegate(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Directive --------------------------------------------------------------

/// One parsed stack line.
///
/// A directive is either a module invocation (`auth required pam_unix.so`)
/// or, before expansion, a delegation to another file
/// (`auth include system-auth`). Resolved stacks only ever hold module
/// directives.
///
/// `canonical_text` is rendered once at construction: a leading `-` when
/// silent, fields joined by single spaces, and parameters (with their own
/// spacing untouched) only when non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Directive {
    phase: Phase,
    action: Action,
    module: String,
    parameters: String,
    silent: bool,
    canonical_text: String,
}

impl Directive {
    /// Build a module directive.
    ///
    /// Returns `None` when `action` is a delegation or `module` is empty.
    pub fn module(
        phase: Phase,
        action: Action,
        module: impl Into<String>,
        parameters: impl Into<String>,
        silent: bool,
    ) -> Option<Self> {
        let module = module.into();
        if matches!(action, Action::Delegate(_)) || module.is_empty() || action.as_str().is_empty() {
            return None;
        }

        let parameters = parameters.into();
        let canonical_text = format!(
            "{}{} {} {}{}{}",
            if silent { "-" } else { "" },
            phase,
            action,
            module,
            if parameters.is_empty() { "" } else { " " },
            parameters
        );

        Some(Directive { phase, action, module, parameters, silent, canonical_text })
    }

    /// Build a delegation directive pointing at `path`.
    ///
    /// Returns `None` when `path` is empty.
    pub fn delegation(phase: Phase, kind: Delegation, path: impl Into<String>) -> Option<Self> {
        let module = path.into();
        if module.is_empty() {
            return None;
        }

        let action = Action::Delegate(kind);
        let canonical_text = format!("{} {} {}", phase, action, module);

        Some(Directive { phase, action, module, parameters: String::new(), silent: false, canonical_text })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Module name for module directives, target path for delegations.
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Trailing parameters, empty when the line had none.
    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    /// True when the line started with `-`.
    pub fn silent(&self) -> bool {
        self.silent
    }

    pub fn canonical_text(&self) -> &str {
        &self.canonical_text
    }

    /// Returns the delegation keyword if this directive still needs expanding.
    pub fn delegation_kind(&self) -> Option<Delegation> {
        match self.action {
            Action::Delegate(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_delegation(&self) -> bool {
        self.delegation_kind().is_some()
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_text)
    }
}

impl std::str::FromStr for Directive {
    type Err = MalformedLine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_line(s)
    }
}
