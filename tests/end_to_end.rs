//! End-to-end scenarios, one per spec.md §8 fixture. Each builds its
//! fixture programmatically via `InMemoryRepoLoader` rather than on-disk
//! `packages.repo`/`modules.yaml`/`input` files.

use rpm_modular_resolve::evr::Evr;
use rpm_modular_resolve::module::{ModuleId, ModulePackageSpec, ModuleSpec};
use rpm_modular_resolve::repository::{InMemoryRepoLoader, PackageSpec, RepoDescriptor, RepoDescriptorKind};
use rpm_modular_resolve::{resolve, Error, InputError, ResolveRequest};

fn repo(id: &str, kind: RepoDescriptorKind) -> RepoDescriptor {
    RepoDescriptor {
        id: id.to_string(),
        kind,
        path: format!("/fixtures/{id}"),
    }
}

fn request(repos: Vec<RepoDescriptor>, solvables: Vec<&str>) -> ResolveRequest {
    ResolveRequest {
        arch: "x86_64".to_string(),
        platform: None,
        excludes: vec![],
        repos,
        solvables: solvables.into_iter().map(str::to_string).collect(),
    }
}

/// Scenario 1: simple ursine. `foo` requires `libbar`, both plain
/// packages.
#[test]
fn simple_ursine() {
    let mut loader = InMemoryRepoLoader::new();
    loader.add_packages(
        "repo",
        vec![
            PackageSpec {
                name: "foo".to_string(),
                evr: Evr::new(0, "1.0", "1.fc29"),
                arch: "x86_64".to_string(),
                requires: vec!["libbar".to_string()],
                provides: vec![],
            },
            PackageSpec {
                name: "libbar".to_string(),
                evr: Evr::new(0, "1.0", "1.fc29"),
                arch: "x86_64".to_string(),
                requires: vec![],
                provides: vec![],
            },
        ],
    );

    let req = request(vec![repo("repo", RepoDescriptorKind::Repo)], vec!["foo"]);
    let outcome = resolve(&req, &loader).unwrap();

    assert!(!outcome.partial_failure);
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.contains(&"foo-1.0-1.fc29.x86_64@repo".to_string()));
    assert!(outcome.results.contains(&"libbar-1.0-1.fc29.x86_64@repo".to_string()));
}

/// Scenario 2: default stream pull. `app` requires `libx`, which only a
/// default-stream module provides.
#[test]
fn default_stream_pull() {
    let mut loader = InMemoryRepoLoader::new();
    loader.add_packages(
        "repo",
        vec![PackageSpec {
            name: "app".to_string(),
            evr: Evr::new(0, "1.0", "1.fc29"),
            arch: "x86_64".to_string(),
            requires: vec!["libx".to_string()],
            provides: vec![],
        }],
    );
    loader.add_modules(
        "modular",
        vec![ModuleSpec {
            id: ModuleId::new("m", "1", "1", "c0"),
            arch: "x86_64".to_string(),
            is_default: true,
            packages: vec![ModulePackageSpec {
                name: "libx".to_string(),
                evr: Evr::new(0, "1.0", "1.fc29"),
                arch: "x86_64".to_string(),
                requires: vec![],
            }],
        }],
    );

    let req = request(
        vec![repo("repo", RepoDescriptorKind::Repo), repo("modular", RepoDescriptorKind::Modular)],
        vec!["app"],
    );
    let outcome = resolve(&req, &loader).unwrap();

    assert!(!outcome.partial_failure);
    assert!(outcome.results.iter().any(|l| l.starts_with("*libx-") && l.ends_with("@modular")));
    assert!(outcome.results.iter().any(|l| l.starts_with("module:m:1:1:c0-")));
    assert!(outcome.results.iter().any(|l| l == "app-1.0-1.fc29.x86_64@repo"));
    assert!(!outcome.results.iter().any(|l| l == "libx-1.0-1.fc29.x86_64@modular"));
}

/// Scenario 3: alternatives. Module `n` has non-default streams `a` and
/// `b`; requesting stream `a` directly must not explore `b`.
#[test]
fn alternatives_exact_stream_excludes_sibling() {
    let mut loader = InMemoryRepoLoader::new();
    let modules = ["a", "b"]
        .into_iter()
        .map(|stream| ModuleSpec {
            id: ModuleId::new("n", stream, "1", "c0"),
            arch: "x86_64".to_string(),
            is_default: false,
            packages: vec![ModulePackageSpec {
                name: format!("lib{stream}"),
                evr: Evr::new(0, "1.0", "1.fc29"),
                arch: "x86_64".to_string(),
                requires: vec![],
            }],
        })
        .collect();
    loader.add_modules("modular", modules);

    let req = request(vec![repo("modular", RepoDescriptorKind::Modular)], vec!["module:n:a:1:c0"]);
    let outcome = resolve(&req, &loader).unwrap();

    assert!(!outcome.partial_failure);
    assert!(outcome.results.iter().any(|l| l.starts_with("module:n:a:")));
    assert!(outcome.results.iter().any(|l| l.starts_with("liba-")));
    assert!(!outcome.results.iter().any(|l| l.contains("module:n:b:")));
    assert!(!outcome.results.iter().any(|l| l.starts_with("libb-")));
}

/// Scenario 4: masking by default. A bare `libz-2.0` coexists with a
/// default module providing `libz-1.5`; requesting `libz` must select
/// only the modular version.
#[test]
fn masking_by_default() {
    let mut loader = InMemoryRepoLoader::new();
    loader.add_packages(
        "repo",
        vec![PackageSpec {
            name: "libz".to_string(),
            evr: Evr::new(0, "2.0", "1.fc29"),
            arch: "x86_64".to_string(),
            requires: vec![],
            provides: vec![],
        }],
    );
    loader.add_modules(
        "modular",
        vec![ModuleSpec {
            id: ModuleId::new("m2", "1", "1", "c0"),
            arch: "x86_64".to_string(),
            is_default: true,
            packages: vec![ModulePackageSpec {
                name: "libz".to_string(),
                evr: Evr::new(0, "1.5", "1.fc29"),
                arch: "x86_64".to_string(),
                requires: vec![],
            }],
        }],
    );

    let req = request(
        vec![repo("repo", RepoDescriptorKind::Repo), repo("modular", RepoDescriptorKind::Modular)],
        vec!["libz"],
    );
    let outcome = resolve(&req, &loader).unwrap();

    assert!(outcome.results.iter().any(|l| l == "*libz-1.5-1.fc29.x86_64@modular"));
    assert!(!outcome.results.iter().any(|l| l.contains("libz-2.0")));
}

/// Scenario 5: explicit NEVRA bypass. Requesting the bare package's exact
/// NEVRA selects it even though the default module would otherwise mask
/// it.
#[test]
fn explicit_nevra_bypass() {
    let mut loader = InMemoryRepoLoader::new();
    loader.add_packages(
        "repo",
        vec![PackageSpec {
            name: "libz".to_string(),
            evr: Evr::new(0, "2.0", "1.fc29"),
            arch: "x86_64".to_string(),
            requires: vec![],
            provides: vec![],
        }],
    );
    loader.add_modules(
        "modular",
        vec![ModuleSpec {
            id: ModuleId::new("m2", "1", "1", "c0"),
            arch: "x86_64".to_string(),
            is_default: true,
            packages: vec![ModulePackageSpec {
                name: "libz".to_string(),
                evr: Evr::new(0, "1.5", "1.fc29"),
                arch: "x86_64".to_string(),
                requires: vec![],
            }],
        }],
    );

    let req = request(
        vec![repo("repo", RepoDescriptorKind::Repo), repo("modular", RepoDescriptorKind::Modular)],
        vec!["libz-2.0-1.fc29.x86_64"],
    );
    let outcome = resolve(&req, &loader).unwrap();

    assert!(outcome.results.iter().any(|l| l == "libz-2.0-1.fc29.x86_64@repo"));
    assert!(!outcome.results.iter().any(|l| l.starts_with('*')));
}

/// Scenario 6: broken modular dependency. Module `brk:1` requires a
/// nonexistent `module(missing)`; the module and its package still
/// appear via best-effort add, with the partial-failure flag set.
#[test]
fn broken_modular_dependency() {
    let mut loader = InMemoryRepoLoader::new();
    loader.add_modules(
        "modular",
        vec![ModuleSpec {
            id: ModuleId::new("brk", "1", "1", "c0"),
            arch: "x86_64".to_string(),
            is_default: false,
            packages: vec![ModulePackageSpec {
                name: "brkpkg".to_string(),
                evr: Evr::new(0, "1.0", "1.fc29"),
                arch: "x86_64".to_string(),
                requires: vec!["module(missing)".to_string()],
            }],
        }],
    );

    let req = request(vec![repo("modular", RepoDescriptorKind::Modular)], vec!["module:brk:1:1:c0"]);
    let outcome = resolve(&req, &loader).unwrap();

    assert!(outcome.partial_failure);
    assert!(outcome.warnings.iter().any(|w| w == "Can't resolve all solvables"));
    assert!(outcome.results.iter().any(|l| l.starts_with("module:brk:1:1:c0")));
    assert!(outcome.results.iter().any(|l| l.starts_with("brkpkg-")));
}

/// Boundary case: an empty solvables list is a hard tier-1 failure.
#[test]
fn empty_solvables_list_is_hard_failure() {
    let loader = InMemoryRepoLoader::new();
    let req = request(vec![], vec![]);
    let err = resolve(&req, &loader).unwrap_err();
    assert!(matches!(err, Error::Input(InputError::NoSolvablesMatched)));
}

/// Boundary case: a specifier matching nothing, alongside one that does,
/// is a warning, not a hard failure.
#[test]
fn mismatching_specifier_alongside_matching_one_is_soft() {
    let mut loader = InMemoryRepoLoader::new();
    loader.add_packages(
        "repo",
        vec![PackageSpec {
            name: "foo".to_string(),
            evr: Evr::new(0, "1.0", "1.fc29"),
            arch: "x86_64".to_string(),
            requires: vec![],
            provides: vec![],
        }],
    );

    let req = request(vec![repo("repo", RepoDescriptorKind::Repo)], vec!["foo", "nonexistent-pkg"]);
    let outcome = resolve(&req, &loader).unwrap();

    assert!(outcome.results.iter().any(|l| l == "foo-1.0-1.fc29.x86_64@repo"));
    assert!(outcome.warnings.iter().any(|w| w.contains("nonexistent-pkg")));
}
