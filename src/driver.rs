//! Resolution driver (C6): the outer fixed-point loop.
//!
//! The spec's pseudocode repeats "scan the pile, stop when a full scan
//! adds nothing new" as an explicit outer loop around an inner per-entry
//! scan. A single forward cursor over a `Vec` that keeps growing while
//! iterated visits every newly appended entry exactly once it's reached,
//! which is the same fixed point without a second loop layer — the
//! cursor stalling at `pile.len()` *is* "a full scan added nothing new".
//!
//! Module solvables are marked outer-tested as soon as every one of
//! their transactions has been expanded into pile entries, which here
//! happens synchronously inside [`modular_path`] — the stricter
//! resolution of the open question in the design notes about module
//! tested-state, rather than relying on the source's iteration-order
//! accident.

use std::collections::HashSet;
use std::rc::Rc;

use crate::alternatives::gather;
use crate::mask::Mask;
use crate::pool::{DepId, Pool, SolvableId};
use crate::solve::{solve_job, Job, Outcome as SolveOutcome};

#[derive(Debug, Default)]
pub struct DriverResult {
    pub pile: Vec<SolvableId>,
    pub partial_failure: bool,
    pub warnings: Vec<String>,
}

fn push_pile(pile: &mut Vec<SolvableId>, pile_set: &mut HashSet<SolvableId>, id: SolvableId) {
    if pile_set.insert(id) {
        pile.push(id);
    }
}

fn is_default_module(pool: &Pool, id: SolvableId) -> bool {
    pool.solvable(id)
        .provides
        .iter()
        .any(|&dep| pool.resolve_str(dep) == "module-default()")
}

fn is_modular_package(pool: &Pool, id: SolvableId) -> bool {
    pool.solvable(id)
        .provides
        .iter()
        .any(|&dep| pool.resolve_str(dep) == "modular-package()")
}

/// The module's own `<name>.<arch>` capability, found among its already
/// interned `provides` rather than re-interning — every module carries it
/// because `module::synthesize` always adds it.
fn module_self_arch_dep(pool: &Pool, id: SolvableId) -> Option<DepId> {
    let s = pool.solvable(id);
    let text = format!("{}.{}", s.name, s.arch);
    s.provides.iter().copied().find(|&dep| pool.resolve_str(dep) == text)
}

/// Disable every non-default module (and its packages) not in `except`.
fn mask_non_default_modules(pool: &Pool, mask: &mut Mask, except: &HashSet<SolvableId>) {
    for id in pool.ids() {
        let s = pool.solvable(id);
        if !s.is_module() || except.contains(&id) || is_default_module(pool, id) {
            continue;
        }
        mask.clear(id);
        if let Some(dep) = module_self_arch_dep(pool, id) {
            for &pkg in pool.requirers_of(dep) {
                mask.clear(pkg);
            }
        }
    }
}

/// For every currently enabled modular package, clear any other solvable
/// sharing its name that is neither itself modular nor already piled.
fn mask_bare_rpms(pool: &Pool, mask: &mut Mask, pile_set: &HashSet<SolvableId>) {
    let enabled_modular: Vec<SolvableId> = pool
        .ids()
        .filter(|&id| mask.test(id) && is_modular_package(pool, id))
        .collect();
    for id in enabled_modular {
        let name = pool.solvable(id).name.clone();
        let cap = pool.lookup_capability(&name);
        for &other in pool.providers(cap) {
            if other == id || is_modular_package(pool, other) || pile_set.contains(&other) {
                continue;
            }
            mask.clear(other);
        }
    }
}

/// The same masking the inner paths apply mid-resolution, computed once
/// up front so initial selection (step 2 of the `selection` pipeline)
/// sees default-module shadowing before any pile exists: non-default
/// modules are hidden, and bare same-name packages shadowed by an
/// enabled default-stream modular package are hidden too.
pub(crate) fn selection_mask(pool: &Pool, baseline: &Mask) -> Mask {
    let mut mask = baseline.clone();
    mask_non_default_modules(pool, &mut mask, &HashSet::new());
    mask_bare_rpms(pool, &mut mask, &HashSet::new());
    mask
}

#[allow(clippy::too_many_arguments)]
fn ursine_path(
    pool: &Rc<Pool>,
    baseline: &Mask,
    id: SolvableId,
    pile: &mut Vec<SolvableId>,
    pile_set: &mut HashSet<SolvableId>,
    outer_tested: &mut HashSet<SolvableId>,
    partial_failure: &mut bool,
    warnings: &mut Vec<String>,
) {
    let mut mask = Mask::all(baseline.len());
    mask.clone_from(baseline);
    mask_non_default_modules(pool, &mut mask, &HashSet::new());
    mask_bare_rpms(pool, &mut mask, pile_set);

    match solve_job(pool, &mask, &Job::install([id])) {
        SolveOutcome::Solved { installed } => {
            for iid in installed {
                push_pile(pile, pile_set, iid);
                outer_tested.insert(iid);
            }
        }
        SolveOutcome::Unsolved { problems } => {
            *partial_failure = true;
            warnings.extend(problems);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn modular_path(
    pool: &Rc<Pool>,
    baseline: &Mask,
    module_id: SolvableId,
    pile: &mut Vec<SolvableId>,
    pile_set: &mut HashSet<SolvableId>,
    outer_tested: &mut HashSet<SolvableId>,
    partial_failure: &mut bool,
    warnings: &mut Vec<String>,
) {
    let job = Job::install([module_id]);
    let transactions = gather(pool, baseline, &job);

    if transactions.is_empty() {
        push_pile(pile, pile_set, module_id);
        outer_tested.insert(module_id);
        if let Some(dep) = module_self_arch_dep(pool, module_id) {
            for &pkg in pool.requirers_of(dep).to_vec().iter() {
                push_pile(pile, pile_set, pkg);
                outer_tested.insert(pkg);
            }
        }
        *partial_failure = true;
        warnings.push(format!(
            "module {} has no satisfiable transaction",
            pool.solvable(module_id).name
        ));
        return;
    }

    for transaction in transactions {
        let tx_set: HashSet<SolvableId> = transaction.iter().copied().collect();
        let mut tmask = Mask::all(baseline.len());
        tmask.clone_from(baseline);
        mask_non_default_modules(pool, &mut tmask, &tx_set);
        mask_bare_rpms(pool, &mut tmask, pile_set);

        for &id in &transaction {
            if pool.solvable(id).is_module() {
                push_pile(pile, pile_set, id);
                let Some(dep) = module_self_arch_dep(pool, id) else { continue };
                for &pkg in pool.requirers_of(dep).to_vec().iter() {
                    push_pile(pile, pile_set, pkg);
                    outer_tested.insert(pkg);
                    match solve_job(pool, &tmask, &Job::install([pkg])) {
                        SolveOutcome::Solved { installed } => {
                            for iid in installed {
                                push_pile(pile, pile_set, iid);
                                outer_tested.insert(iid);
                            }
                        }
                        SolveOutcome::Unsolved { problems } => {
                            *partial_failure = true;
                            warnings.extend(problems);
                        }
                    }
                }
            } else {
                push_pile(pile, pile_set, id);
                outer_tested.insert(id);
            }
        }
    }
}

/// Run the fixed-point loop from `seeds`, returning the final pile plus
/// any accumulated resolution warnings and the partial-failure flag.
pub fn resolve_pile(pool: &Rc<Pool>, baseline: &Mask, seeds: &[SolvableId]) -> DriverResult {
    let mut pile = Vec::new();
    let mut pile_set = HashSet::new();
    let mut outer_tested = HashSet::new();
    let mut partial_failure = false;
    let mut warnings = Vec::new();

    for &seed in seeds {
        push_pile(&mut pile, &mut pile_set, seed);
    }

    let mut cursor = 0;
    while cursor < pile.len() {
        let p = pile[cursor];
        cursor += 1;
        if outer_tested.contains(&p) {
            continue;
        }
        outer_tested.insert(p);

        if pool.solvable(p).is_module() {
            modular_path(
                pool,
                baseline,
                p,
                &mut pile,
                &mut pile_set,
                &mut outer_tested,
                &mut partial_failure,
                &mut warnings,
            );
        } else {
            ursine_path(
                pool,
                baseline,
                p,
                &mut pile,
                &mut pile_set,
                &mut outer_tested,
                &mut partial_failure,
                &mut warnings,
            );
        }
    }

    DriverResult {
        pile,
        partial_failure,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evr::Evr;
    use crate::module::{synthesize, ModulePackageSpec, ModuleSpec};
    use crate::pool::{RepoKind, Solvable};

    #[test]
    fn simple_ursine_chain_resolves() {
        let mut pool = Pool::new();
        let repo = pool.add_repo("repo", RepoKind::Repo);
        let bar_cap = pool.intern_str("libbar");
        pool.add_solvable(Solvable {
            name: "foo".to_string(),
            arch: "x86_64".to_string(),
            evr: Evr::new(0, "1.0", "1"),
            repo,
            provides: vec![],
            requires: vec![bar_cap],
            conflicts: vec![],
        });
        pool.add_solvable(Solvable {
            name: "libbar".to_string(),
            arch: "x86_64".to_string(),
            evr: Evr::new(0, "1.0", "1"),
            repo,
            provides: vec![],
            requires: vec![],
            conflicts: vec![],
        });
        pool.finish_loading();
        let pool = Rc::new(pool);
        let baseline = Mask::baseline(&pool, &[]);
        let foo = pool.providers(pool.lookup_capability("foo"))[0];

        let result = resolve_pile(&pool, &baseline, &[foo]);
        assert!(!result.partial_failure);
        let names: HashSet<String> = result.pile.iter().map(|&id| pool.solvable(id).name.clone()).collect();
        assert!(names.contains("foo"));
        assert!(names.contains("libbar"));
    }

    #[test]
    fn default_module_masks_bare_package() {
        let mut pool = Pool::new();
        let repo = pool.add_repo("repo", RepoKind::Repo);
        pool.add_solvable(Solvable {
            name: "libz".to_string(),
            arch: "x86_64".to_string(),
            evr: Evr::new(0, "2.0", "1"),
            repo,
            provides: vec![],
            requires: vec![],
            conflicts: vec![],
        });
        let modrepo = pool.add_repo("modular", RepoKind::Modular);
        let spec = ModuleSpec {
            id: crate::module::ModuleId::new("m2", "1", "1", "c0"),
            arch: "x86_64".to_string(),
            is_default: true,
            packages: vec![ModulePackageSpec {
                name: "libz".to_string(),
                evr: Evr::new(0, "1.5", "1"),
                arch: "x86_64".to_string(),
                requires: vec![],
            }],
        };
        synthesize(&mut pool, modrepo, &spec);
        pool.finish_loading();
        let pool = Rc::new(pool);
        let baseline = Mask::baseline(&pool, &[]);

        let libz_cap = pool.lookup_capability("libz");
        let module_id = pool.providers(pool.lookup_capability("module:m2:1:1:c0"))[0];

        let result = resolve_pile(&pool, &baseline, &[module_id]);
        assert!(!result.partial_failure);

        let piled_libz: Vec<SolvableId> = pool
            .providers(libz_cap)
            .iter()
            .copied()
            .filter(|id| result.pile.contains(id))
            .collect();
        assert_eq!(piled_libz.len(), 1);
        assert_eq!(pool.solvable(piled_libz[0]).evr, Evr::new(0, "1.5", "1"));
    }

    #[test]
    fn broken_modular_dependency_sets_partial_failure() {
        let mut pool = Pool::new();
        let modrepo = pool.add_repo("modular", RepoKind::Modular);
        let spec = ModuleSpec {
            id: crate::module::ModuleId::new("brk", "1", "1", "c0"),
            arch: "x86_64".to_string(),
            is_default: false,
            packages: vec![ModulePackageSpec {
                name: "brkpkg".to_string(),
                evr: Evr::new(0, "1.0", "1"),
                arch: "x86_64".to_string(),
                requires: vec!["module(missing)".to_string()],
            }],
        };
        synthesize(&mut pool, modrepo, &spec);
        // brkpkg requires module(missing), which no solvable ever provides.
        pool.finish_loading();
        let pool = Rc::new(pool);
        let baseline = Mask::baseline(&pool, &[]);
        let module_id = pool.providers(pool.lookup_capability("module:brk:1:1:c0"))[0];

        let result = resolve_pile(&pool, &baseline, &[module_id]);
        assert!(result.partial_failure);
        let names: HashSet<String> = result.pile.iter().map(|&id| pool.solvable(id).name.clone()).collect();
        assert!(names.contains("module:brk:1:1:c0"));
        assert!(names.contains("brkpkg"));
    }
}
