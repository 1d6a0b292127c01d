//! Pool view (C1): arena-interned solvables and the capability index.
//!
//! Every dependency relation — provides, requires, conflicts — is a plain
//! interned capability string (`DepId`). There is no separate relation
//! arena: composite relations built via [`Pool::make_rel`] are rendered to
//! their canonical capability text and interned like any other string, the
//! same way RPM/libsolv ultimately flattens `NAME.ARCH`, `module(n:s) = v`
//! and friends into whatprovides lookups. This keeps `providers`/`requirers`
//! a single string-keyed index instead of two parallel arenas.

use std::collections::HashMap;
use std::fmt;

use crate::evr::Evr;

/// Interned capability/name string. Doubles as the dependency id referred
/// to in provides/requires/conflicts arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DepId(u32);

impl DepId {
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

/// A requirement/conflict as handed to the external solver: a capability
/// plus whether the match sense is inverted. Plain requires use
/// `inverted = false` ("forbid candidates not providing this"); the
/// conflicts array uses `inverted = true` ("forbid candidates providing
/// this"), the same trick used for blocker deps in the teacher bridge
/// this module is descended from: flipping the match here means the
/// solver's own `inverse` flag (used uniformly for `constrains`) ends up
/// forbidding exactly the candidates that match the original condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintId(u32);

impl ConstraintId {
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }

    pub fn from_usize(i: usize) -> Self {
        ConstraintId(i as u32)
    }
}

/// Stable id of a solvable in the pool arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SolvableId(u32);

impl SolvableId {
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }

    pub fn from_usize(i: usize) -> Self {
        SolvableId(i as u32)
    }
}

impl fmt::Display for SolvableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Id of a repository descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepoId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoKind {
    Repo,
    Lookaside,
    Modular,
    /// The synthetic `@system` repo holding the platform module.
    System,
}

#[derive(Debug, Clone)]
pub struct Repo {
    pub id: String,
    pub kind: RepoKind,
}

/// Relational operators used by [`Pool::make_rel`] to compose capability
/// text, mirroring libsolv's `REL_*` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    And,
    Or,
    With,
    Without,
    Arch,
}

/// An immutable pool record: a package or a synthesized module.
#[derive(Debug, Clone)]
pub struct Solvable {
    pub name: String,
    pub arch: String,
    pub evr: Evr,
    pub repo: RepoId,
    pub provides: Vec<DepId>,
    pub requires: Vec<DepId>,
    pub conflicts: Vec<DepId>,
}

impl Solvable {
    pub fn is_module(&self) -> bool {
        self.name.starts_with("module:")
    }
}

/// Arena-backed, read-mostly index over solvables and their dependency
/// relations. Populated once per invocation by the repository loaders and
/// module synthesiser, then only ever read during resolution.
#[derive(Debug, Default)]
pub struct Pool {
    strings: Vec<String>,
    strings_rev: HashMap<String, DepId>,
    repos: Vec<Repo>,
    solvables: Vec<Solvable>,
    /// capability -> solvables that provide it (includes each solvable's
    /// implicit self-provide of its own name).
    providers: HashMap<DepId, Vec<SolvableId>>,
    /// capability -> solvables that require it.
    requirers: HashMap<DepId, Vec<SolvableId>>,
    constraints: Vec<(DepId, bool)>,
    constraints_rev: HashMap<(DepId, bool), ConstraintId>,
    finished: bool,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_repo(&mut self, id: impl Into<String>, kind: RepoKind) -> RepoId {
        let rid = RepoId(self.repos.len() as u32);
        self.repos.push(Repo { id: id.into(), kind });
        rid
    }

    pub fn repo(&self, id: RepoId) -> &Repo {
        &self.repos[id.0 as usize]
    }

    pub fn repo_is_lookaside(&self, id: RepoId) -> bool {
        matches!(self.repo(id).kind, RepoKind::Lookaside)
    }

    /// Intern a capability/name string, deduplicating by value.
    pub fn intern_str(&mut self, s: &str) -> DepId {
        if let Some(&id) = self.strings_rev.get(s) {
            return id;
        }
        let id = DepId(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.strings_rev.insert(s.to_string(), id);
        id
    }

    pub fn resolve_str(&self, id: DepId) -> &str {
        &self.strings[id.0 as usize]
    }

    /// Compose a relation of two already-interned terms into its canonical
    /// capability text, e.g. `make_rel(foo, x86_64, Arch)` -> `foo.x86_64`,
    /// `make_rel(module(n:s), 3, Eq)` -> `module(n:s) = 3`.
    pub fn make_rel(&mut self, a: DepId, b: DepId, op: RelOp) -> DepId {
        let (a, b) = (self.resolve_str(a).to_string(), self.resolve_str(b).to_string());
        let rendered = match op {
            RelOp::Eq => format!("{a} = {b}"),
            RelOp::And => format!("{a} {b}"),
            RelOp::Or => format!("{a} OR {b}"),
            RelOp::With => format!("{a}({b})"),
            RelOp::Without => format!("{a}(-{b})"),
            RelOp::Arch => format!("{a}.{b}"),
        };
        self.intern_str(&rendered)
    }

    pub fn add_solvable(&mut self, solvable: Solvable) -> SolvableId {
        let id = SolvableId(self.solvables.len() as u32);
        for &dep in &solvable.provides {
            self.providers.entry(dep).or_default().push(id);
        }
        for &dep in &solvable.requires {
            self.requirers.entry(dep).or_default().push(id);
            self.intern_constraint(dep, false);
        }
        for &dep in &solvable.conflicts {
            self.intern_constraint(dep, true);
        }
        // Implicit self-provide: every solvable provides its own name.
        let name_id = self.intern_str(&solvable.name.clone());
        self.providers.entry(name_id).or_default().push(id);
        self.solvables.push(solvable);
        id
    }

    /// Capability id for an already-interned name. Panics if `name` was
    /// never interned, which can't happen for a solvable's own name since
    /// [`Pool::add_solvable`] always interns it.
    pub fn lookup_capability(&self, name: &str) -> DepId {
        self.strings_rev[name]
    }

    /// Look up a previously interned `(capability, inverted)` constraint.
    /// Every requires/conflicts entry is pre-interned by
    /// [`Pool::add_solvable`], so this only returns `None` for a
    /// capability nothing ever required or conflicted with.
    pub fn lookup_constraint(&self, cap: DepId, inverted: bool) -> Option<ConstraintId> {
        self.constraints_rev.get(&(cap, inverted)).copied()
    }

    pub fn solvable(&self, id: SolvableId) -> &Solvable {
        &self.solvables[id.to_usize()]
    }

    pub fn len(&self) -> usize {
        self.solvables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solvables.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SolvableId> {
        (0..self.solvables.len()).map(SolvableId::from_usize)
    }

    /// Ordered list of solvables providing `dep`, empty if none. Stable
    /// because of the deterministic sort applied in
    /// [`Pool::finish_loading`].
    pub fn providers(&self, dep: DepId) -> &[SolvableId] {
        self.providers.get(&dep).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Solvables whose `requires` array contains `dep`.
    pub fn requirers_of(&self, dep: DepId) -> &[SolvableId] {
        self.requirers.get(&dep).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn providers_by_name(&mut self, name: &str) -> Vec<SolvableId> {
        let id = self.intern_str(name);
        self.providers(id).to_vec()
    }

    /// `noarch` is compatible with every requested arch; otherwise an exact
    /// match is required. Folds in the arch-compatibility filtering
    /// `fus.c` performs when restricting candidate providers.
    pub fn arch_compatible(&self, solvable: SolvableId, requested_arch: &str) -> bool {
        let arch = &self.solvable(solvable).arch;
        arch == "noarch" || arch == requested_arch
    }

    pub fn providers_for_arch(&self, dep: DepId, arch: &str) -> Vec<SolvableId> {
        self.providers(dep)
            .iter()
            .copied()
            .filter(|&id| self.arch_compatible(id, arch))
            .collect()
    }

    /// Sort every provider/requirer list by `(name, evr)` so lookups are
    /// stable across runs. Must be called once after all repos and
    /// synthesized modules are added, before any solve.
    pub fn finish_loading(&mut self) {
        let key = |id: &SolvableId| {
            let s = &self.solvables[id.to_usize()];
            (s.name.clone(), s.evr.clone())
        };
        for ids in self.providers.values_mut() {
            ids.sort_by_key(key);
            ids.dedup();
        }
        for ids in self.requirers.values_mut() {
            ids.sort_by_key(key);
            ids.dedup();
        }
        // Every providable capability gets an identity constraint so a
        // job can request it directly, even if no package ever names it
        // in a `requires`/`conflicts` array.
        let providable: Vec<DepId> = self.providers.keys().copied().collect();
        for cap in providable {
            self.intern_constraint(cap, false);
        }
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Intern a `(capability, inverted)` pair used as a requirement or
    /// conflict by the solver bridge, deduplicating by value.
    pub fn intern_constraint(&mut self, cap: DepId, inverted: bool) -> ConstraintId {
        if let Some(&id) = self.constraints_rev.get(&(cap, inverted)) {
            return id;
        }
        let id = ConstraintId::from_usize(self.constraints.len());
        self.constraints.push((cap, inverted));
        self.constraints_rev.insert((cap, inverted), id);
        id
    }

    pub fn resolve_constraint(&self, id: ConstraintId) -> (DepId, bool) {
        self.constraints[id.to_usize()]
    }
}
