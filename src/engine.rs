//! Stack resolution engine.
//!
//! Resolving a stack file is a small pipeline, run once per phase:
//!
//! ```text
//! file text ── split lines ──▶ skip blank/comment lines
//!                                   │
//!                                   v
//!                     parse_line (grammar.rs)
//!                       - module directive, else
//!                       - delegation directive, else
//!                       - MalformedLine
//!                                   │  keep directives of this phase
//!                                   v
//!                     DirectiveList (stack.rs)
//!                                   │
//!                                   v
//!                     Resolver::resolve_phase (resolver.rs)
//!                       - recurse into include/substack targets
//!                       - splice results in place
//!                       - reject any file entered twice in one phase
//!                                   │
//!                                   v
//!          concatenate phases: account, auth, password, session
//! ```
//!
//! ## Responsibilities by module
//!
//! - `grammar.rs`: the line tokenizer and the two directive shapes.
//! - `stack.rs`: `DirectiveList`, the ordered sequence with splice semantics.
//! - `resolver.rs`: per-phase recursive expansion and loop protection.
//! - `lookup.rs`: first-match lookup by `(phase, module)`.
//! - `metrics.rs`: optional counters and timings for a resolution run.
//!
//! ## Debugging
//!
//! The engine logs through the `log` facade: file reads and expansions at
//! `debug`, per-line decisions at `trace`.

#[path = "engine/grammar.rs"]
mod grammar;
#[path = "engine/lookup.rs"]
mod lookup;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/resolver.rs"]
mod resolver;
#[path = "engine/stack.rs"]
mod stack;


pub use grammar::{MalformedLine, is_ignorable_line, parse_line};
pub(crate) use lookup::find_directive;
pub use metrics::{PhaseMetrics, ResolveMetrics};
pub(crate) use resolver::Resolver;
pub use stack::DirectiveList;
