//! Selection engine (C3): resolve a textual specifier to a set of ids.
//!
//! The pipeline from the component design is a sequence of typed
//! operations rather than a bitfield of match flags: [`match_specifier`]
//! (`select`), then the caller subtracts a mask selection, then adds any
//! exact-NEVRA bypass matches, then [`best_of`] reduces to the highest EVR
//! per `name.arch`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::evr::{glob_match, Nevra};
use crate::pool::{Pool, SolvableId};

/// A parsed solvable specifier, tagged by kind so the pipeline never has
/// to re-sniff the string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier {
    Name(String),
    Glob(String),
    NameArch(String, String),
    Nevra(Nevra),
}

/// Parse in the order specified: exact NEVRA first (most specific), then
/// `name.arch`, then glob, then bare name/provides. A bare string with no
/// glob metacharacters and no embedded `.` is ambiguous between name and
/// provides, but [`match_specifier`]'s `providers_by_name` lookup already
/// indexes both a solvable's own name and everything it provides, so
/// `Name` covers both without a separate variant.
pub fn parse_specifier(raw: &str) -> Specifier {
    if let Some(nevra) = Nevra::parse(raw) {
        return Specifier::Nevra(nevra);
    }
    if raw.contains('*') || raw.contains('?') {
        return Specifier::Glob(raw.to_string());
    }
    if let Some((name, arch)) = raw.rsplit_once('.') {
        if !name.is_empty() && !arch.is_empty() && !arch.contains('-') {
            return Specifier::NameArch(name.to_string(), arch.to_string());
        }
    }
    Specifier::Name(raw.to_string())
}

/// Step 1 of the pipeline: match a specifier against the pool, without
/// regard to any mask. `providers_by_name` itself covers both a
/// solvable's own name and anything it provides, so a plain name and a
/// bare capability string resolve through the same arm.
pub fn match_specifier(pool: &mut Pool, spec: &Specifier) -> HashSet<SolvableId> {
    match spec {
        Specifier::Name(name) => pool.providers_by_name(name).into_iter().collect(),
        Specifier::Glob(pattern) => pool
            .ids()
            .filter(|&id| glob_match(pattern, &pool.solvable(id).name))
            .collect(),
        Specifier::NameArch(name, arch) => pool
            .ids()
            .filter(|&id| {
                let s = pool.solvable(id);
                &s.name == name && &s.arch == arch
            })
            .collect(),
        Specifier::Nevra(nevra) => pool
            .ids()
            .filter(|&id| {
                let s = pool.solvable(id);
                s.name == nevra.name && s.evr == nevra.evr && s.arch == nevra.arch
            })
            .collect(),
    }
}

/// Step 4: for each distinct `(name, arch)`, keep only the highest-EVR
/// solvable.
pub fn best_of(pool: &Pool, ids: HashSet<SolvableId>) -> HashSet<SolvableId> {
    let mut best: HashMap<(String, String), SolvableId> = HashMap::new();
    for id in ids {
        let s = pool.solvable(id);
        let key = (s.name.clone(), s.arch.clone());
        best.entry(key)
            .and_modify(|cur| {
                if s.evr > pool.solvable(*cur).evr {
                    *cur = id;
                }
            })
            .or_insert(id);
    }
    best.into_values().collect()
}

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("could not open specifier file {path}: {source}")]
    FileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load specifiers from an `@file` reference: one non-blank line per
/// specifier.
pub fn load_file_specifiers(path: &str) -> Result<Vec<String>, SelectionError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SelectionError::FileUnreadable {
        path: path.to_string(),
        source,
    })?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Expand a raw specifier string, resolving a leading `@` into the file's
/// non-blank lines; everything else passes through unchanged.
pub fn expand_specifier(raw: &str) -> Result<Vec<String>, SelectionError> {
    match raw.strip_prefix('@') {
        Some(path) => load_file_specifiers(path),
        None => Ok(vec![raw.to_string()]),
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Specifier::Name(s) | Specifier::Glob(s) => write!(f, "{s}"),
            Specifier::NameArch(n, a) => write!(f, "{n}.{a}"),
            Specifier::Nevra(n) => write!(f, "{n}"),
        }
    }
}

/// Run the full pipeline for one specifier: match, subtract the masked
/// set, add back exact-NEVRA bypass matches, then best-of reduce.
/// `masked` is the set of ids the caller wants hidden (non-default
/// modular packages and bare RPMs shadowed by default modules).
pub fn select(pool: &mut Pool, spec: &Specifier, masked: &HashSet<SolvableId>) -> HashSet<SolvableId> {
    let matched = match_specifier(pool, spec);
    let mut remaining: HashSet<SolvableId> = matched.difference(masked).copied().collect();
    if let Specifier::Nevra(_) = spec {
        remaining.extend(matched.iter().copied());
    }
    best_of(pool, remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evr::Evr;
    use crate::pool::{RepoKind, Solvable};

    fn pool_with(names: &[(&str, &str, &str)]) -> Pool {
        let mut pool = Pool::new();
        let repo = pool.add_repo("repo", RepoKind::Repo);
        for (name, evr, arch) in names {
            let provides = vec![pool.intern_str(name)];
            pool.add_solvable(Solvable {
                name: name.to_string(),
                arch: arch.to_string(),
                evr: Evr::parse(evr).unwrap(),
                repo,
                provides,
                requires: vec![],
                conflicts: vec![],
            });
        }
        pool.finish_loading();
        pool
    }

    #[test]
    fn parses_nevra() {
        let spec = parse_specifier("foo-1.0-1.fc29.x86_64");
        assert!(matches!(spec, Specifier::Nevra(_)));
    }

    #[test]
    fn parses_name_arch() {
        let spec = parse_specifier("foo.x86_64");
        assert_eq!(spec, Specifier::NameArch("foo".into(), "x86_64".into()));
    }

    #[test]
    fn parses_glob() {
        assert_eq!(parse_specifier("foo-*"), Specifier::Glob("foo-*".into()));
    }

    #[test]
    fn parses_bare_name() {
        assert_eq!(parse_specifier("foo"), Specifier::Name("foo".into()));
    }

    #[test]
    fn select_masks_then_bypasses_on_exact_nevra() {
        let mut pool = pool_with(&[("foo", "1.0-1", "x86_64")]);
        let id = pool.providers_by_name("foo")[0];
        let masked: HashSet<_> = [id].into_iter().collect();

        let by_name = select(&mut pool, &Specifier::Name("foo".into()), &masked);
        assert!(by_name.is_empty());

        let nevra = Specifier::Nevra(Nevra::parse("foo-1.0-1.x86_64").unwrap());
        let bypassed = select(&mut pool, &nevra, &masked);
        assert_eq!(bypassed, masked);
    }

    #[test]
    fn best_of_keeps_highest_evr() {
        let mut pool = pool_with(&[("foo", "1.0-1", "x86_64"), ("foo", "2.0-1", "x86_64")]);
        let newer = pool.providers_by_name("foo")[1];
        let result = select(&mut pool, &Specifier::Name("foo".into()), &HashSet::new());
        assert_eq!(result.len(), 1);
        assert!(result.contains(&newer));
    }

    #[test]
    fn load_file_specifiers_skips_blank_lines() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("selection-test-{:?}", std::thread::current().id()));
        std::fs::write(&path, "foo\n\nbar\n").unwrap();
        let specs = load_file_specifiers(path.to_str().unwrap()).unwrap();
        assert_eq!(specs, vec!["foo".to_string(), "bar".to_string()]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_file_specifiers_missing_file_errors() {
        let err = load_file_specifiers("/nonexistent/path/to/specifiers");
        assert!(err.is_err());
    }
}
