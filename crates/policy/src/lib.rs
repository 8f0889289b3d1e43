//! # Access Policy
//!
//! Every directory may carry an override file ([`OVERRIDE_FILE_NAME`]).
//! The effective policy of a directory is the fold of all override files
//! from the root down to it, seeded with server-wide defaults:
//!
//! - `upload` / `delete`: the deepest declaration wins.
//! - `users` / `accessTables`: appended, shallower rules first.
//! - a matching user rule overrides `upload` / `delete` for that caller only.
//!
//! Nothing is cached between calls except compiled regexes, so edits to
//! override files take effect on the next resolution.

mod config;
mod error;
mod resolver;
mod visibility;

pub use config::{load_override, AccessOverride, UserRule, VisibilityRule, OVERRIDE_FILE_NAME};
pub use error::{PolicyError, Result};
pub use resolver::{
    Caller, EffectivePolicy, FoldedPolicy, PolicyDefaults, PolicyResolver, PolicySummary,
};
pub use visibility::{CompiledRule, RegexCache, VisibilityRules};
