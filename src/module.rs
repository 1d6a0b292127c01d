//! Module solvable synthesis.
//!
//! Turning modulemd YAML into module solvables is an external collaborator
//! per the purpose statement; this module provides the in-memory
//! equivalent used by the reference repository loader, the CLI's demo
//! fixtures, and the test suite: given a module's identity and its
//! contained packages, build the synthetic solvable plus the ordinary
//! package solvables wired to it exactly as the data model requires.

use crate::evr::Evr;
use crate::pool::{Pool, RelOp, RepoId, Solvable, SolvableId};

/// The `<n>:<s>:<v>:<c>` identity of a module build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId {
    pub name: String,
    pub stream: String,
    pub version: String,
    pub context: String,
}

impl ModuleId {
    pub fn new(
        name: impl Into<String>,
        stream: impl Into<String>,
        version: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            stream: stream.into(),
            version: version.into(),
            context: context.into(),
        }
    }

    /// Render the `module:<n>:<s>:<v>:<c>` solvable name.
    pub fn solvable_name(&self) -> String {
        format!("module:{}:{}:{}:{}", self.name, self.stream, self.version, self.context)
    }

    /// Parse a solvable name back into its module identity. Returns `None`
    /// if `name` doesn't start with `module:` or is malformed.
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix("module:")?;
        let mut parts = rest.splitn(4, ':');
        Some(Self::new(parts.next()?, parts.next()?, parts.next()?, parts.next()?))
    }
}

/// A plain package belonging to a module, prior to interning.
#[derive(Debug, Clone)]
pub struct ModulePackageSpec {
    pub name: String,
    pub evr: Evr,
    pub arch: String,
    /// Extra capabilities this package requires besides the implicit
    /// edge to its owning module.
    pub requires: Vec<String>,
}

/// A module build and its contents, prior to interning into the pool.
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    pub id: ModuleId,
    pub arch: String,
    pub is_default: bool,
    pub packages: Vec<ModulePackageSpec>,
}

/// Intern a module and its packages into `pool`, wiring up the identity
/// provides/conflicts described in the data model:
/// `module()`, `module(<n>)`, `module(<n>:<s>) = <v>`, the self-arch
/// dependency, `module-default()` when applicable, and a self-conflict on
/// `module(<n>)` so only one stream of a module is ever enabled at once.
/// Each package gets a `requires` edge back to the module's self-arch dep
/// and provides `modular-package()`.
pub fn synthesize(pool: &mut Pool, repo: RepoId, spec: &ModuleSpec) -> (SolvableId, Vec<SolvableId>) {
    let solvable_name = spec.id.solvable_name();

    let bare_module = pool.intern_str("module()");
    let module_n = pool.intern_str(&format!("module({})", spec.id.name));
    let n_id = pool.intern_str(&spec.id.name);
    let s_id = pool.intern_str(&spec.id.stream);
    let module_n_s = pool.make_rel(n_id, s_id, RelOp::With);
    let v_id = pool.intern_str(&spec.id.version);
    let module_n_s_eq_v = pool.make_rel(module_n_s, v_id, RelOp::Eq);

    let name_id = pool.intern_str(&solvable_name);
    let arch_id = pool.intern_str(&spec.arch);
    let self_arch = pool.make_rel(name_id, arch_id, RelOp::Arch);

    let mut provides = vec![bare_module, module_n, module_n_s_eq_v, self_arch];
    if spec.is_default {
        provides.push(pool.intern_str("module-default()"));
    }

    let module_solvable = Solvable {
        name: solvable_name,
        arch: spec.arch.clone(),
        evr: Evr::new(0, spec.id.version.clone(), spec.id.context.clone()),
        repo,
        provides,
        requires: vec![],
        conflicts: vec![module_n],
    };
    let module_id = pool.add_solvable(module_solvable);

    let modular_marker = pool.intern_str("modular-package()");
    let mut package_ids = Vec::with_capacity(spec.packages.len());
    for pkg in &spec.packages {
        let mut provides = vec![modular_marker];
        provides.push(pool.intern_str(&pkg.name));
        let mut requires = vec![self_arch];
        for req in &pkg.requires {
            requires.push(pool.intern_str(req));
        }
        let solvable = Solvable {
            name: pkg.name.clone(),
            arch: pkg.arch.clone(),
            evr: pkg.evr.clone(),
            repo,
            provides,
            requires,
            conflicts: vec![],
        };
        package_ids.push(pool.add_solvable(solvable));
    }

    (module_id, package_ids)
}

/// Build the synthetic `platform` module described in the `Platform`
/// external interface: a default-stream module named `platform:<stream>`
/// at version `0`, context `00000000`, with no packages of its own.
pub fn synthesize_platform(pool: &mut Pool, repo: RepoId, stream: &str, arch: &str) -> SolvableId {
    let spec = ModuleSpec {
        id: ModuleId::new("platform", stream, "0", "00000000"),
        arch: arch.to_string(),
        is_default: true,
        packages: vec![],
    };
    synthesize(pool, repo, &spec).0
}
