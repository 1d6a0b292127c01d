//! Error taxonomy (tier 1 of spec.md §7 — fail-fast input errors).
//!
//! Tier 2 (resolution failures) and tier 3 (selection mismatches) are not
//! `Error` variants: they are accumulated into [`crate::Outcome`] and only
//! promote to a hard [`InputError::NoSolvablesMatched`] when every
//! specifier mismatches, per the tier-3 rule.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("unknown repository type {0:?}")]
    UnknownRepoType(String),

    #[error("repository {repo} is type 'modular' but has no path to a modulemd source")]
    MissingModuleSource { repo: String },

    #[error("could not read {path}: {source}")]
    RepoUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no solvables matched the requested input")]
    NoSolvablesMatched,

    #[error(transparent)]
    Selection(#[from] crate::selection::SelectionError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),
}
