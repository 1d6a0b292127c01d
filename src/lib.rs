//! Modular RPM dependency resolution driver.
//!
//! This crate bridges a pool of ursine and modular RPM solvables to an
//! external SAT solver ([`resolvo`]) and drives the fixed-point closure
//! implemented by the resolution driver (`driver`): resolve a set of
//! solvable specifiers to seed ids (honouring module stream masking and
//! the alternatives-exploration rules), then format the resulting pile as
//! `{prefix}{NEVRA}@{repo}` lines.
//!
//! Repository and modulemd parsing are external collaborators behind the
//! [`repository::RepoLoader`] trait; this crate only carries the
//! descriptor shape and an in-memory reference implementation.

pub mod alternatives;
pub mod config;
pub mod driver;
pub mod error;
pub mod evr;
pub mod mask;
pub mod module;
pub mod pool;
pub mod provider;
pub mod repository;
pub mod selection;
pub mod solve;

use std::collections::HashSet;
use std::rc::Rc;

use mask::Mask;
use pool::{Pool, SolvableId};
use repository::{populate_pool, RepoDescriptor, RepoLoader};
use selection::{expand_specifier, match_specifier, parse_specifier, select};

pub use error::{Error, InputError};

/// Everything needed to drive one resolution: arch, optional platform
/// stream, excludes, repository descriptors, and the requested solvable
/// specifiers (literal strings or `@file` references).
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub arch: String,
    pub platform: Option<String>,
    pub excludes: Vec<String>,
    pub repos: Vec<RepoDescriptor>,
    pub solvables: Vec<String>,
}

/// Result of one resolution: one formatted line per non-lookaside pile
/// entry, any accumulated tier-2/tier-3 diagnostics, and the
/// partial-failure flag.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub results: Vec<String>,
    pub warnings: Vec<String>,
    pub partial_failure: bool,
}

/// Run one resolution end to end: populate the pool, compute the
/// exclusion baseline, resolve every requested specifier to a seed set,
/// drive the fixed-point loop, then format the pile.
///
/// Tier-1 input errors (unknown repo type, unreadable `@file`, every
/// specifier mismatching) fail fast via `Err`. Tier-2 resolution
/// failures and tier-3 selection mismatches are folded into
/// `Outcome::warnings` and `Outcome::partial_failure`.
pub fn resolve(request: &ResolveRequest, loader: &dyn RepoLoader) -> Result<Outcome, Error> {
    let mut pool = Pool::new();
    populate_pool(&mut pool, loader, &request.repos, request.platform.as_deref(), &request.arch)?;

    let mut warnings = Vec::new();
    let excluded_ids = resolve_excludes(&mut pool, &request.excludes, &mut warnings);
    let baseline = Mask::baseline(&pool, &excluded_ids);
    // Step 2 of the selection pipeline needs the same default-module
    // shadowing the driver applies mid-resolution, not just the exclude
    // baseline, so a plain name request for a default-shadowed package
    // seeds the modular solvable rather than the higher-EVR bare one.
    let selection_mask = driver::selection_mask(&pool, &baseline);
    let masked: HashSet<SolvableId> = pool.ids().filter(|&id| !selection_mask.test(id)).collect();

    let mut seeds: Vec<SolvableId> = Vec::new();
    let mut any_matched = false;
    for raw in &request.solvables {
        for specifier in expand_specifier(raw).map_err(InputError::from)? {
            let spec = parse_specifier(&specifier);
            let matched = select(&mut pool, &spec, &masked);
            if matched.is_empty() {
                log::warn!("specifier {specifier} matched nothing");
                warnings.push(format!("specifier {specifier} matched nothing"));
                continue;
            }
            any_matched = true;
            seeds.extend(matched);
        }
    }

    if !any_matched {
        return Err(InputError::NoSolvablesMatched.into());
    }

    let pool = Rc::new(pool);
    let driver_result = driver::resolve_pile(&pool, &baseline, &seeds);
    warnings.extend(driver_result.warnings);
    let partial_failure = driver_result.partial_failure;
    if partial_failure {
        warnings.push("Can't resolve all solvables".to_string());
    }

    let results = format_pile(&pool, &driver_result.pile);
    Ok(Outcome {
        results,
        warnings,
        partial_failure,
    })
}

/// Resolve each exclude specifier (name / glob / name.arch) to solvable
/// ids. A mismatching exclude isn't an error — excludes are permissive by
/// construction — but is noted for operator visibility.
fn resolve_excludes(pool: &mut Pool, excludes: &[String], warnings: &mut Vec<String>) -> Vec<SolvableId> {
    let mut ids = Vec::new();
    for raw in excludes {
        let spec = parse_specifier(raw);
        let matched = match_specifier(pool, &spec);
        if matched.is_empty() {
            warnings.push(format!("exclude {raw} matched nothing"));
        }
        ids.extend(matched);
    }
    ids
}

/// Format the pile into `{prefix}{NEVRA}@{repo}` lines, dropping entries
/// whose repo is lookaside (never user-visible output), per spec.
fn format_pile(pool: &Pool, pile: &[SolvableId]) -> Vec<String> {
    pile.iter()
        .filter(|&&id| !pool.repo_is_lookaside(pool.solvable(id).repo))
        .map(|&id| {
            let s = pool.solvable(id);
            let prefix = if is_modular_package(pool, id) { "*" } else { "" };
            let nevra = evr::Nevra {
                name: s.name.clone(),
                evr: s.evr.clone(),
                arch: s.arch.clone(),
            };
            format!("{prefix}{nevra}@{}", pool.repo(s.repo).id)
        })
        .collect()
}

fn is_modular_package(pool: &Pool, id: SolvableId) -> bool {
    pool.solvable(id)
        .provides
        .iter()
        .any(|&dep| pool.resolve_str(dep) == "modular-package()")
}
