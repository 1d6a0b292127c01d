//! Bridge between the pool view and resolvo's [`DependencyProvider`] trait.
//!
//! [`ResolverIndex`] precomputes every solvable's [`KnownDependencies`]
//! once per pool. [`ResolverProvider`] wraps it together with the
//! per-attempt consideration mask and favor/disfavor hints; a fresh
//! provider (and a fresh `resolvo::Solver`) is built for every solve call
//! so stale `Candidates` from a previous attempt's mask are never reused
//! (see `solve.rs`).
//!
//! Requirements and conflicts are both plain capability matches — this
//! domain never needs an EVR range query at the SAT level, only the
//! module identity's exact-version pin, which is rendered into its own
//! capability string by `module::synthesize`. A conflict is modelled the
//! same way blocker dependencies were modelled in the portage bridge this
//! module descends from: the matched condition is inverted before
//! interning, so resolvo's own `inverse` flag (always applied to
//! `constrains`) ends up forbidding exactly the candidates that satisfy
//! the original, non-inverted condition.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use resolvo::{
    ArenaId, Candidates, Condition, ConditionId, ConditionalRequirement, Dependencies,
    HintDependenciesAvailable, KnownDependencies, NameId, Requirement, SolvableId as RSolvableId,
    SolverCache, StringId, VersionSetId, VersionSetUnionId,
};

use crate::mask::Mask;
use crate::pool::{ConstraintId, DepId, Pool, SolvableId};

fn to_name(dep: DepId) -> NameId {
    NameId::from_usize(dep.to_usize())
}

fn from_name(name: NameId) -> DepId {
    DepId::from_usize(name.to_usize())
}

fn to_rsolvable(id: SolvableId) -> RSolvableId {
    RSolvableId::from_usize(id.to_usize())
}

/// Used by `solve.rs` to translate a solved `resolvo::SolvableId` back to
/// our own pool id.
pub(crate) fn from_rsolvable(id: RSolvableId) -> SolvableId {
    SolvableId::from_usize(id.to_usize())
}

/// Used by `solve.rs` to build a job's root `Requirement` from a
/// `ConstraintId` looked up in the pool.
pub(crate) fn to_version_set(id: ConstraintId) -> VersionSetId {
    VersionSetId::from_usize(id.to_usize())
}

fn from_version_set(vs: VersionSetId) -> ConstraintId {
    ConstraintId::from_usize(vs.to_usize())
}

/// Static per-pool precomputation, shared (via `Rc`) across every
/// attempt's provider.
pub struct ResolverIndex {
    pool: Rc<Pool>,
    dependencies: HashMap<RSolvableId, KnownDependencies>,
}

impl ResolverIndex {
    pub fn build(pool: Rc<Pool>) -> Rc<Self> {
        let mut dependencies = HashMap::with_capacity(pool.len());
        for id in pool.ids() {
            let solvable = pool.solvable(id);
            let requirements = solvable
                .requires
                .iter()
                .filter_map(|&cap| pool.lookup_constraint(cap, false))
                .map(|cid| ConditionalRequirement {
                    condition: None,
                    requirement: Requirement::Single(to_version_set(cid)),
                })
                .collect();
            let constrains = solvable
                .conflicts
                .iter()
                .filter_map(|&cap| pool.lookup_constraint(cap, true))
                .map(to_version_set)
                .collect();
            dependencies.insert(
                to_rsolvable(id),
                KnownDependencies {
                    requirements,
                    constrains,
                },
            );
        }
        Rc::new(Self { pool, dependencies })
    }
}

/// Per-attempt view over a [`ResolverIndex`]: the consideration mask plus
/// favor/disfavor hints accumulated so far by the alternatives gatherer.
pub struct ResolverProvider {
    index: Rc<ResolverIndex>,
    mask: Mask,
    favor: HashMap<NameId, SolvableId>,
    disfavor: HashSet<SolvableId>,
}

impl ResolverProvider {
    pub fn new(index: Rc<ResolverIndex>, mask: Mask, favor: &[SolvableId], disfavor: &[SolvableId]) -> Self {
        let pool = &index.pool;
        let mut favor_map = HashMap::new();
        for &id in favor {
            let name = pool.lookup_capability(&pool.solvable(id).name);
            favor_map.insert(to_name(name), id);
        }
        Self {
            index,
            mask,
            favor: favor_map,
            disfavor: disfavor.iter().copied().collect(),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.index.pool
    }
}

struct DisplaySolvable<'a>(&'a Pool, SolvableId);

impl fmt::Display for DisplaySolvable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.solvable(self.1);
        write!(f, "{}-{}.{}", s.name, s.evr, s.arch)
    }
}

struct DisplayCapability<'a>(&'a Pool, DepId);

impl fmt::Display for DisplayCapability<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.resolve_str(self.1))
    }
}

struct DisplayConstraint<'a>(&'a Pool, DepId, bool);

impl fmt::Display for DisplayConstraint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.2 {
            write!(f, "!{}", self.0.resolve_str(self.1))
        } else {
            write!(f, "{}", self.0.resolve_str(self.1))
        }
    }
}

impl resolvo::Interner for ResolverProvider {
    fn display_solvable(&self, solvable: RSolvableId) -> impl fmt::Display + '_ {
        DisplaySolvable(self.pool(), from_rsolvable(solvable))
    }

    fn display_name(&self, name: NameId) -> impl fmt::Display + '_ {
        DisplayCapability(self.pool(), from_name(name))
    }

    fn display_version_set(&self, version_set: VersionSetId) -> impl fmt::Display + '_ {
        let (cap, inverted) = self.pool().resolve_constraint(from_version_set(version_set));
        DisplayConstraint(self.pool(), cap, inverted)
    }

    fn display_string(&self, string_id: StringId) -> impl fmt::Display + '_ {
        DisplayCapability(self.pool(), DepId::from_usize(string_id.to_usize()))
    }

    fn version_set_name(&self, version_set: VersionSetId) -> NameId {
        let (cap, _) = self.pool().resolve_constraint(from_version_set(version_set));
        to_name(cap)
    }

    fn solvable_name(&self, solvable: RSolvableId) -> NameId {
        let s = self.pool().solvable(from_rsolvable(solvable));
        to_name(self.pool().lookup_capability(&s.name))
    }

    fn version_sets_in_union(&self, _version_set_union: VersionSetUnionId) -> impl Iterator<Item = VersionSetId> {
        // Union requirements (`||`) aren't part of this domain's module
        // dependency graph; every requirement is a single capability.
        std::iter::empty()
    }

    fn resolve_condition(&self, _condition: ConditionId) -> Condition {
        unreachable!("this bridge never constructs conditional requirements")
    }
}

impl resolvo::DependencyProvider for ResolverProvider {
    async fn get_candidates(&self, name: NameId) -> Option<Candidates> {
        let cap = from_name(name);
        let pool = self.pool();
        let solvables: Vec<RSolvableId> = pool
            .providers(cap)
            .iter()
            .filter(|&&id| self.mask.test(id))
            .map(|&id| to_rsolvable(id))
            .collect();
        if solvables.is_empty() {
            return None;
        }
        Some(Candidates {
            candidates: solvables,
            favored: self.favor.get(&name).map(|&id| to_rsolvable(id)),
            locked: None,
            hint_dependencies_available: HintDependenciesAvailable::All,
            excluded: Vec::new(),
        })
    }

    async fn sort_candidates(&self, _solver: &SolverCache<Self>, solvables: &mut [RSolvableId]) {
        let pool = self.pool();
        solvables.sort_by(|&a, &b| {
            let (ida, idb) = (from_rsolvable(a), from_rsolvable(b));
            let da = self.disfavor.contains(&ida);
            let db = self.disfavor.contains(&idb);
            // Disfavored candidates sort last; among the rest, newest first.
            da.cmp(&db).then_with(|| pool.solvable(idb).evr.cmp(&pool.solvable(ida).evr))
        });
    }

    async fn filter_candidates(
        &self,
        candidates: &[RSolvableId],
        version_set: VersionSetId,
        inverse: bool,
    ) -> Vec<RSolvableId> {
        let (cap, inverted) = self.pool().resolve_constraint(from_version_set(version_set));
        let pool = self.pool();
        candidates
            .iter()
            .copied()
            .filter(|&sid| {
                let s = pool.solvable(from_rsolvable(sid));
                let mut matches = s.provides.contains(&cap);
                if inverted {
                    matches = !matches;
                }
                if inverse {
                    !matches
                } else {
                    matches
                }
            })
            .collect()
    }

    async fn get_dependencies(&self, solvable: RSolvableId) -> Dependencies {
        match self.index.dependencies.get(&solvable) {
            Some(deps) => Dependencies::Known(deps.clone()),
            None => Dependencies::Known(KnownDependencies {
                requirements: Vec::new(),
                constrains: Vec::new(),
            }),
        }
    }
}
