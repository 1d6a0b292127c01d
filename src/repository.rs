//! Repository descriptors and the narrow loading trait behind them.
//!
//! Repomd/primary/filelists and modulemd parsing are external
//! collaborators; this module only carries the descriptor shape the
//! driver needs (`id`, `type`, `path`) and a trait the CLI and tests back
//! with an in-memory implementation, matching the "in-memory reference
//! implementation of external traits" the ambient stack calls for.

use std::collections::HashMap;

use crate::error::InputError;
use crate::evr::Evr;
use crate::module::ModuleSpec;
use crate::pool::{Pool, RepoKind};

/// One `(id, type, path)` repository entry from the invocation.
#[derive(Debug, Clone)]
pub struct RepoDescriptor {
    pub id: String,
    pub kind: RepoDescriptorKind,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoDescriptorKind {
    Repo,
    Lookaside,
    Modular,
}

impl RepoDescriptorKind {
    pub fn parse(s: &str) -> Result<Self, InputError> {
        match s {
            "repo" => Ok(Self::Repo),
            "lookaside" => Ok(Self::Lookaside),
            "modular" => Ok(Self::Modular),
            other => Err(InputError::UnknownRepoType(other.to_string())),
        }
    }
}

/// A plain (non-modular) package prior to interning.
#[derive(Debug, Clone)]
pub struct PackageSpec {
    pub name: String,
    pub evr: Evr,
    pub arch: String,
    pub requires: Vec<String>,
    pub provides: Vec<String>,
}

/// Contents loaded for one descriptor: either ursine packages or modules.
#[derive(Debug, Clone)]
pub enum LoadedRepo {
    Packages(Vec<PackageSpec>),
    Modules(Vec<ModuleSpec>),
}

/// External collaborator: given a descriptor, produce its contents. A
/// real implementation would parse repomd/primary.xml or a modulemd YAML
/// document; [`InMemoryRepoLoader`] is the reference implementation used
/// by tests, demos, and the CLI's `--repo-file` fixtures.
pub trait RepoLoader {
    fn load(&self, descriptor: &RepoDescriptor) -> Result<LoadedRepo, InputError>;
}

#[derive(Debug, Default)]
pub struct InMemoryRepoLoader {
    contents: HashMap<String, LoadedRepo>,
}

impl InMemoryRepoLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_packages(&mut self, repo_id: impl Into<String>, packages: Vec<PackageSpec>) {
        self.contents.insert(repo_id.into(), LoadedRepo::Packages(packages));
    }

    pub fn add_modules(&mut self, repo_id: impl Into<String>, modules: Vec<ModuleSpec>) {
        self.contents.insert(repo_id.into(), LoadedRepo::Modules(modules));
    }
}

impl RepoLoader for InMemoryRepoLoader {
    fn load(&self, descriptor: &RepoDescriptor) -> Result<LoadedRepo, InputError> {
        self.contents
            .get(&descriptor.id)
            .cloned()
            .ok_or_else(|| InputError::RepoUnreadable {
                path: descriptor.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "repository not registered"),
            })
    }
}

/// Populate `pool` from every descriptor, in order, then synthesize the
/// platform module (if requested) into the reserved `@system` repo and
/// finish loading (deterministic provider ordering, per invariant 5).
pub fn populate_pool(
    pool: &mut Pool,
    loader: &dyn RepoLoader,
    descriptors: &[RepoDescriptor],
    platform: Option<&str>,
    arch: &str,
) -> Result<(), InputError> {
    for descriptor in descriptors {
        let kind = match descriptor.kind {
            RepoDescriptorKind::Repo => RepoKind::Repo,
            RepoDescriptorKind::Lookaside => RepoKind::Lookaside,
            RepoDescriptorKind::Modular => RepoKind::Modular,
        };
        let repo_id = pool.add_repo(descriptor.id.clone(), kind);
        match loader.load(descriptor)? {
            LoadedRepo::Packages(packages) => {
                for pkg in packages {
                    intern_package(pool, repo_id, &pkg);
                }
            }
            LoadedRepo::Modules(modules) => {
                if matches!(descriptor.kind, RepoDescriptorKind::Modular) {
                    for module in &modules {
                        crate::module::synthesize(pool, repo_id, module);
                    }
                } else {
                    return Err(InputError::MissingModuleSource {
                        repo: descriptor.id.clone(),
                    });
                }
            }
        }
    }

    if let Some(stream) = platform {
        let system_repo = pool.add_repo("@system", RepoKind::System);
        crate::module::synthesize_platform(pool, system_repo, stream, arch);
    }

    pool.finish_loading();
    Ok(())
}

fn intern_package(pool: &mut Pool, repo: crate::pool::RepoId, pkg: &PackageSpec) {
    let mut provides: Vec<_> = pkg.provides.iter().map(|p| pool.intern_str(p)).collect();
    provides.push(pool.intern_str(&pkg.name));
    let requires = pkg.requires.iter().map(|r| pool.intern_str(r)).collect();
    pool.add_solvable(crate::pool::Solvable {
        name: pkg.name.clone(),
        arch: pkg.arch.clone(),
        evr: pkg.evr.clone(),
        repo,
        provides,
        requires,
        conflicts: vec![],
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populate_pool_interns_packages_and_platform() {
        let mut loader = InMemoryRepoLoader::new();
        loader.add_packages(
            "repo",
            vec![PackageSpec {
                name: "foo".to_string(),
                evr: Evr::new(0, "1.0", "1"),
                arch: "x86_64".to_string(),
                requires: vec![],
                provides: vec![],
            }],
        );
        let descriptors = vec![RepoDescriptor {
            id: "repo".to_string(),
            kind: RepoDescriptorKind::Repo,
            path: "/fake".to_string(),
        }];

        let mut pool = Pool::new();
        populate_pool(&mut pool, &loader, &descriptors, Some("f29"), "x86_64").unwrap();

        assert_eq!(pool.providers_by_name("foo").len(), 1);
        let platform = pool.providers_by_name("module:platform:f29:0:00000000");
        assert_eq!(platform.len(), 1);
    }

    #[test]
    fn unregistered_repo_errors() {
        let loader = InMemoryRepoLoader::new();
        let descriptors = vec![RepoDescriptor {
            id: "missing".to_string(),
            kind: RepoDescriptorKind::Repo,
            path: "/fake".to_string(),
        }];
        let mut pool = Pool::new();
        let err = populate_pool(&mut pool, &loader, &descriptors, None, "x86_64");
        assert!(err.is_err());
    }

    #[test]
    fn repo_kind_rejects_unknown() {
        assert!(RepoDescriptorKind::parse("bogus").is_err());
    }
}
