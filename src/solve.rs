//! Solve wrapper (C4): invoke the external SAT solver on a job queue.
//!
//! A fresh [`ResolverProvider`] and `resolvo::Solver` are built for every
//! call — cheap, since [`ResolverIndex`] (the expensive precomputation) is
//! shared via `Rc` — which sidesteps any question of whether resolvo
//! caches `Candidates` across `solve()` calls on a reused solver: there is
//! never a reused solver to begin with. This also gives `solve_job` an
//! honest read of the *current* mask and favor/disfavor hints every time,
//! matching the "reset before every solve" discipline the consideration
//! mask requires.

use std::rc::Rc;

use resolvo::{ConditionalRequirement, Problem, Requirement, Solver, UnsolvableOrCancelled};

use crate::mask::Mask;
use crate::pool::{Pool, SolvableId};
use crate::provider::{from_rsolvable, to_version_set, ResolverIndex, ResolverProvider};

/// One entry of a solve job queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFlag {
    Install,
    Favor,
    Disfavor,
}

#[derive(Debug, Clone, Default)]
pub struct Job {
    pub entries: Vec<(JobFlag, SolvableId)>,
}

impl Job {
    pub fn install(ids: impl IntoIterator<Item = SolvableId>) -> Self {
        Self {
            entries: ids.into_iter().map(|id| (JobFlag::Install, id)).collect(),
        }
    }

    pub fn push(&mut self, flag: JobFlag, id: SolvableId) {
        self.entries.push((flag, id));
    }

    pub fn installs(&self) -> impl Iterator<Item = SolvableId> + '_ {
        self.entries.iter().filter(|(f, _)| *f == JobFlag::Install).map(|(_, id)| *id)
    }

    pub fn favors(&self) -> impl Iterator<Item = SolvableId> + '_ {
        self.entries.iter().filter(|(f, _)| *f == JobFlag::Favor).map(|(_, id)| *id)
    }

    pub fn disfavors(&self) -> impl Iterator<Item = SolvableId> + '_ {
        self.entries.iter().filter(|(f, _)| *f == JobFlag::Disfavor).map(|(_, id)| *id)
    }
}

/// Outcome of one solve attempt. There is no "recommends" concept in this
/// bridge's requirement graph — every requirement is already a hard
/// requires edge, so "disables recommends" from the component contract is
/// satisfied by construction rather than by a solver flag.
#[derive(Debug)]
pub enum Outcome {
    Solved { installed: Vec<SolvableId> },
    Unsolved { problems: Vec<String> },
}

/// Run one solve attempt: install entries become hard requirements, favor
/// entries bias candidate selection for their name, disfavor entries sort
/// to the back of their name's candidate list.
pub fn solve_job(pool: &Rc<Pool>, mask: &Mask, job: &Job) -> Outcome {
    let favor: Vec<SolvableId> = job.favors().collect();
    let disfavor: Vec<SolvableId> = job.disfavors().collect();

    let mut requirements = Vec::new();
    for id in job.installs() {
        let solvable = pool.solvable(id);
        let cap = pool.lookup_capability(&solvable.name);
        let Some(constraint) = pool.lookup_constraint(cap, false) else {
            log::warn!("solve job referenced a solvable with no known capability: {}", solvable.name);
            continue;
        };
        requirements.push(ConditionalRequirement {
            condition: None,
            requirement: Requirement::Single(to_version_set(constraint)),
        });
    }

    let index = ResolverIndex::build(Rc::clone(pool));
    let provider = ResolverProvider::new(index, mask.clone(), &favor, &disfavor);
    let mut solver = Solver::new(provider);
    let problem = Problem::new().requirements(requirements);

    log::debug!("invoking solver with {} install entries", job.installs().count());
    match solver.solve(problem) {
        Ok(solution) => Outcome::Solved {
            installed: solution.into_iter().map(from_rsolvable).collect(),
        },
        Err(UnsolvableOrCancelled::Unsolvable(unsat)) => {
            let report = unsat.display_user_friendly(&solver).to_string();
            let problems: Vec<String> = report
                .lines()
                .map(str::to_string)
                .collect();
            for line in &problems {
                log::warn!("{line}");
            }
            Outcome::Unsolved { problems }
        }
        Err(UnsolvableOrCancelled::Cancelled(_)) => {
            unreachable!("this bridge never cancels a solve")
        }
    }
}
