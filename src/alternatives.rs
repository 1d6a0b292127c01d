//! Alternatives gatherer (C5) — the algorithmic heart.
//!
//! The upstream contract assumes a SAT solver that exposes free choices as
//! *alternatives* with a nesting *level*. `resolvo` has no such concept, so
//! this module derives the same information from what a stream choice
//! actually *is* in this domain: contention on a bare `module(<n>)`
//! capability, i.e. more than one stream of the same module providing it.
//! The "level" of a contention point is its BFS depth in the solved
//! transaction's requires graph, measured from the job's own install
//! roots — this reproduces the outermost-first numbering the upstream
//! solver documents without inventing an API resolvo doesn't have. A
//! module name reachable at more than one depth is attributed to the
//! deepest one seen, per the resolved open question on alternative
//! de-duplication across levels.
//!
//! The two intertwined recursions the design notes call out (explore a
//! deeper level vs explore another pick at the same level) are expressed
//! as an explicit work-list of frames rather than call-stack recursion,
//! per the same design notes, so modular graphs of unexpected depth can't
//! overflow the stack.

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::mask::Mask;
use crate::module::ModuleId;
use crate::pool::{DepId, Pool, SolvableId};
use crate::solve::{solve_job, Job, JobFlag, Outcome as SolveOutcome};

struct Alternative {
    level: u32,
    choices: Vec<SolvableId>,
}

struct Frame {
    level: u32,
    favor: Vec<SolvableId>,
    tested: HashSet<SolvableId>,
}

/// BFS depth of every installed solvable, measured from `roots`, walking
/// only edges that stay inside the solved transaction.
fn transaction_levels(pool: &Pool, roots: &[SolvableId], installed: &[SolvableId]) -> HashMap<SolvableId, u32> {
    let installed_set: HashSet<SolvableId> = installed.iter().copied().collect();
    let mut levels = HashMap::new();
    let mut queue = VecDeque::new();
    for &root in roots {
        if installed_set.contains(&root) {
            levels.insert(root, 0);
            queue.push_back(root);
        }
    }
    while let Some(id) = queue.pop_front() {
        let depth = levels[&id];
        for &dep in &pool.solvable(id).requires {
            for &provider in pool.providers(dep) {
                if installed_set.contains(&provider) {
                    levels.entry(provider).or_insert_with(|| {
                        queue.push_back(provider);
                        depth + 1
                    });
                }
            }
        }
    }
    levels
}

/// One contention point per distinct module name present in the
/// transaction: its level and the full pool-wide set of streams competing
/// for it. A module that *is* one of the job's own install roots was
/// pinned explicitly by the caller, not freely chosen by the solver, so
/// depth-0 entries (the roots themselves) never produce an alternative —
/// only module solvables pulled in transitively are free choices. Module
/// names with only one pool-wide stream aren't reported either, since
/// there was nothing to choose between.
fn find_alternatives(pool: &Pool, installed: &[SolvableId], levels: &HashMap<SolvableId, u32>) -> Vec<Alternative> {
    let mut by_name: HashMap<String, (u32, DepId)> = HashMap::new();
    for &id in installed {
        let s = pool.solvable(id);
        if !s.is_module() {
            continue;
        }
        let Some(depth) = levels.get(&id).copied().filter(|&d| d > 0) else {
            continue;
        };
        let Some(module_id) = ModuleId::parse(&s.name) else {
            continue;
        };
        let cap = pool.lookup_capability(&format!("module({})", module_id.name));
        by_name
            .entry(module_id.name)
            .and_modify(|(d, _)| *d = (*d).max(depth))
            .or_insert((depth, cap));
    }
    by_name
        .into_values()
        .filter_map(|(level, cap)| {
            let choices = pool.providers(cap).to_vec();
            (choices.len() > 1).then_some(Alternative { level, choices })
        })
        .collect()
}

/// Enumerate every materially distinct stream-combination transaction for
/// `job`, per §4.5. Returns one entry per transaction; empty if `job` is
/// unsatisfiable at every level explored.
pub fn gather(pool: &Rc<Pool>, baseline: &Mask, job: &Job) -> Vec<Vec<SolvableId>> {
    let roots: Vec<SolvableId> = job.installs().collect();
    let mut accumulator = Vec::new();
    let mut stack = vec![Frame {
        level: 1,
        favor: Vec::new(),
        tested: HashSet::new(),
    }];

    while let Some(frame) = stack.pop() {
        let mut attempt = job.clone();
        for &id in &frame.favor {
            attempt.push(JobFlag::Favor, id);
        }
        for &id in &frame.tested {
            attempt.push(JobFlag::Disfavor, id);
        }

        let installed = match solve_job(pool, baseline, &attempt) {
            SolveOutcome::Unsolved { .. } => continue,
            SolveOutcome::Solved { installed } => installed,
        };
        accumulator.push(installed.clone());

        let levels = transaction_levels(pool, &roots, &installed);
        let alternatives = find_alternatives(pool, &installed, &levels);
        let max_level = alternatives.iter().map(|a| a.level).max().unwrap_or(frame.level);

        let mut next_favor = frame.favor.clone();
        let mut next_level_seed = HashSet::new();
        let mut current_choices: HashSet<SolvableId> = HashSet::new();
        let mut chosen_here = None;

        for alt in &alternatives {
            let Some(chosen) = alt.choices.iter().copied().find(|id| installed.contains(id)) else {
                continue;
            };
            if alt.level < frame.level {
                if !next_favor.contains(&chosen) {
                    next_favor.push(chosen);
                }
            } else if alt.level == frame.level + 1 {
                next_level_seed.insert(chosen);
            } else if alt.level == frame.level {
                current_choices.extend(alt.choices.iter().copied());
                chosen_here = Some(chosen);
            }
        }

        let mut tested = frame.tested.clone();
        let mut already_seen = false;
        if let Some(chosen) = chosen_here {
            already_seen = tested.contains(&chosen);
            tested.insert(chosen);
        }

        // Re-invoke at the current level only if an untested choice
        // remains and disfavoring the one just seen stands a chance of
        // changing the solver's pick; a repeat choice despite a fresh
        // disfavor means the branch is dry.
        if !already_seen && !current_choices.is_empty() && !current_choices.iter().all(|c| tested.contains(c)) {
            stack.push(Frame {
                level: frame.level,
                favor: frame.favor.clone(),
                tested: tested.clone(),
            });
        }

        if frame.level < max_level {
            stack.push(Frame {
                level: frame.level + 1,
                favor: next_favor,
                tested: next_level_seed,
            });
        }
    }

    accumulator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evr::Evr;
    use crate::module::{synthesize, ModulePackageSpec, ModuleSpec};
    use crate::pool::RepoKind;

    fn two_stream_pool() -> Pool {
        let mut pool = Pool::new();
        let repo = pool.add_repo("modular", RepoKind::Modular);
        for stream in ["a", "b"] {
            let spec = ModuleSpec {
                id: ModuleId::new("n", stream, "1", "c0"),
                arch: "x86_64".to_string(),
                is_default: false,
                packages: vec![ModulePackageSpec {
                    name: format!("lib{stream}"),
                    evr: Evr::new(0, "1.0", "1"),
                    arch: "x86_64".to_string(),
                    requires: vec![],
                }],
            };
            synthesize(&mut pool, repo, &spec);
        }
        pool.finish_loading();
        pool
    }

    #[test]
    fn exact_stream_request_has_no_alternatives() {
        let pool = Rc::new(two_stream_pool());
        let mask = Mask::all(pool.len());
        let id = pool.providers(pool.lookup_capability("module:n:a:1:c0"))[0];
        let job = Job::install([id]);

        let transactions = gather(&pool, &mask, &job);
        assert_eq!(transactions.len(), 1);
        assert!(transactions[0].contains(&id));
    }

    #[test]
    fn bare_module_capability_explores_every_stream() {
        let mut pool = two_stream_pool();
        let repo = pool.add_repo("repo", RepoKind::Repo);
        let module_n = pool.intern_str("module(n)");
        pool.add_solvable(crate::pool::Solvable {
            name: "app".to_string(),
            arch: "x86_64".to_string(),
            evr: Evr::new(0, "1.0", "1"),
            repo,
            provides: vec![],
            requires: vec![module_n],
            conflicts: vec![],
        });
        pool.finish_loading();
        let pool = Rc::new(pool);

        let mask = Mask::all(pool.len());
        let app_id = pool.providers(pool.lookup_capability("app"))[0];
        let job = Job::install([app_id]);

        let transactions = gather(&pool, &mask, &job);
        assert_eq!(transactions.len(), 2);
        assert_ne!(transactions[0], transactions[1]);
    }
}
