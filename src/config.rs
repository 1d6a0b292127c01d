//! TOML/JSON-deserializable configuration, the counterpart `resolve`'s
//! plain-argument invocation doesn't need as a library call but every
//! standalone tool in front of it does.

use serde::Deserialize;

use crate::error::InputError;
use crate::repository::{RepoDescriptor, RepoDescriptorKind};
use crate::ResolveRequest;

/// One `[[repos]]` table entry: `id`, `type` (`"repo"` / `"lookaside"` /
/// `"modular"`), and `path`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
}

/// Top-level invocation configuration, loadable from TOML or JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveConfig {
    pub arch: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub repos: Vec<RepoConfig>,
    pub solvables: Vec<String>,
}

impl ResolveConfig {
    /// Parse the repo type strings and assemble the plain-struct
    /// [`ResolveRequest`] the core entry point takes.
    pub fn into_request(self) -> Result<ResolveRequest, InputError> {
        let repos = self
            .repos
            .into_iter()
            .map(|r| {
                Ok(RepoDescriptor {
                    id: r.id,
                    kind: RepoDescriptorKind::parse(&r.kind)?,
                    path: r.path,
                })
            })
            .collect::<Result<Vec<_>, InputError>>()?;

        Ok(ResolveRequest {
            arch: self.arch,
            platform: self.platform,
            excludes: self.excludes,
            repos,
            solvables: self.solvables,
        })
    }
}
