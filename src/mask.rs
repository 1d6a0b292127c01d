//! Consideration mask (C2): the per-attempt visibility bitmap.
//!
//! A [`Mask`] is reset from the [exclusion baseline][Mask::baseline] at the
//! start of every attempt (invariant 2 of the data model: a bit cleared in
//! one attempt must be re-cleared, never left enabled, in the next), then
//! mutated to hide non-default modules and bare RPMs shadowed by them.

use crate::pool::{Pool, SolvableId};

/// Bitmap of size `|solvables|`. Bit set means the solvable is visible to
/// the solve wrapper for the current attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    bits: Vec<bool>,
}

impl Mask {
    /// All bits set — the permissive mask before any excludes are applied.
    pub fn all(len: usize) -> Self {
        Self { bits: vec![true; len] }
    }

    pub fn set_all(&mut self) {
        self.bits.fill(true);
    }

    pub fn set(&mut self, id: SolvableId) {
        self.bits[id.to_usize()] = true;
    }

    pub fn clear(&mut self, id: SolvableId) {
        self.bits[id.to_usize()] = false;
    }

    pub fn test(&self, id: SolvableId) -> bool {
        self.bits[id.to_usize()]
    }

    /// Reset this mask to match `baseline`, discarding every mutation made
    /// during the previous attempt.
    pub fn clone_from(&mut self, baseline: &Mask) {
        self.bits.clone_from(&baseline.bits);
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Compute the exclusion baseline once per invocation: all bits set,
    /// then cleared for each solvable matching a user exclude, except
    /// solvables from lookaside repositories or marked as modular
    /// packages (those two categories are never excludable).
    pub fn baseline(pool: &Pool, excluded_ids: &[SolvableId]) -> Self {
        let mut mask = Self::all(pool.len());
        for &id in excluded_ids {
            let s = pool.solvable(id);
            if pool.repo_is_lookaside(s.repo) {
                continue;
            }
            if s.provides.iter().any(|&dep| pool.resolve_str(dep) == "modular-package()") {
                continue;
            }
            mask.clear(id);
        }
        mask
    }
}
