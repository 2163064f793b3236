//! The main phase queue, kept as a stack of FIFO levels.
//!
//! Level 0 holds phases pushed to the back of the battle. Every time a phase
//! is taken, a fresh level is opened above it; anything that phase unshifts
//! lands there and runs, in FIFO order, before the phase's own siblings.
//! Phases taken from a child level open their own level in turn, so nested
//! follow-ups resolve depth-first.
//!
//! Each level also holds the phases its opener deferred. They run once the
//! level's ordinary follow-ups are done, ahead of the opener's siblings.

use std::collections::VecDeque;

use crate::phase::{Phase, PhaseKind};

#[derive(Clone, Debug, Default)]
struct Level {
    queued: VecDeque<Phase>,
    deferred: VecDeque<Phase>,
}

impl Level {
    fn is_empty(&self) -> bool {
        self.queued.is_empty() && self.deferred.is_empty()
    }

    fn len(&self) -> usize {
        self.queued.len() + self.deferred.len()
    }

    fn pop_front(&mut self) -> Option<Phase> {
        self.queued.pop_front().or_else(|| self.deferred.pop_front())
    }

    fn iter(&self) -> impl Iterator<Item = &Phase> {
        self.queued.iter().chain(self.deferred.iter())
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Phase> {
        self.queued.iter_mut().chain(self.deferred.iter_mut())
    }

    fn retain(&mut self, mut keep: impl FnMut(&Phase) -> bool) {
        self.queued.retain(|p| keep(p));
        self.deferred.retain(|p| keep(p));
    }

    fn remove_first(&mut self, predicate: impl Fn(&Phase) -> bool) -> bool {
        for queue in [&mut self.queued, &mut self.deferred] {
            if let Some(index) = queue.iter().position(&predicate) {
                queue.remove(index);
                return true;
            }
        }
        false
    }
}

#[derive(Clone, Debug)]
pub struct PhaseTree {
    levels: Vec<Level>,
}

impl Default for PhaseTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTree {
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: vec![Level::default()],
        }
    }

    /// Append to the back of the battle.
    pub fn push(&mut self, phase: Phase) {
        self.levels[0].queued.push_back(phase);
    }

    /// Append to the top level's follow-ups, or with `defer` to its deferred
    /// phases.
    ///
    /// A deferred phase runs once everything queued by the current phase
    /// has resolved, before the current phase's siblings.
    pub fn add(&mut self, phase: Phase, defer: bool) {
        let top = self.top();
        let level = &mut self.levels[top];
        if defer {
            level.deferred.push_back(phase);
        } else {
            level.queued.push_back(phase);
        }
    }

    /// Insert right after the first queued phase of `kind`, searching from the
    /// top level down. Falls back to [`add`](Self::add).
    pub fn add_after(&mut self, phase: Phase, kind: PhaseKind) {
        for level in self.levels.iter_mut().rev() {
            for queue in [&mut level.queued, &mut level.deferred] {
                if let Some(index) = queue.iter().position(|p| p.is(kind)) {
                    queue.insert(index + 1, phase);
                    return;
                }
            }
        }
        self.add(phase, false);
    }

    /// Take the next phase and open a level for its follow-ups.
    pub fn next_phase(&mut self) -> Option<Phase> {
        self.prune();
        let top = self.top();
        let phase = self.levels[top].pop_front()?;
        self.levels.push(Level::default());
        Some(phase)
    }

    /// Drop everything above `level` and open a fresh level there.
    ///
    /// Used when a phase starts from outside the tree (a dynamic queue) and
    /// needs somewhere for its follow-ups to go.
    pub fn open_level_at(&mut self, level: usize) {
        let level = level.max(1);
        self.levels.truncate(level);
        while self.levels.len() <= level {
            self.levels.push(Level::default());
        }
    }

    /// Whether any level at or above `level` still holds phases.
    #[must_use]
    pub fn has_pending_from(&self, level: usize) -> bool {
        self.levels.iter().skip(level).any(|l| !l.is_empty())
    }

    /// Index of the top level.
    #[must_use]
    pub fn top(&self) -> usize {
        self.levels.len() - 1
    }

    /// Number of levels, including empty ones.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Total queued phases (markers included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.iter().map(Level::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Level::is_empty)
    }

    /// Queued phases in the order they would run.
    pub fn iter(&self) -> impl Iterator<Item = &Phase> {
        self.levels.iter().rev().flat_map(Level::iter)
    }

    pub fn find(&self, predicate: impl Fn(&Phase) -> bool) -> Option<&Phase> {
        self.iter().find(|p| predicate(p))
    }

    pub fn find_mut(&mut self, predicate: impl Fn(&Phase) -> bool) -> Option<&mut Phase> {
        self.levels
            .iter_mut()
            .rev()
            .flat_map(Level::iter_mut)
            .find(|p| predicate(p))
    }

    #[must_use]
    pub fn exists(&self, kind: PhaseKind, predicate: impl Fn(&Phase) -> bool) -> bool {
        self.find(|p| p.is(kind) && predicate(p)).is_some()
    }

    /// Remove the first phase of `kind` matching `predicate`.
    pub fn remove(&mut self, kind: PhaseKind, predicate: impl Fn(&Phase) -> bool) -> bool {
        self.levels
            .iter_mut()
            .rev()
            .any(|level| level.remove_first(|p| p.is(kind) && predicate(p)))
    }

    /// Remove every phase of `kind`, returning how many went.
    pub fn remove_all(&mut self, kind: PhaseKind) -> usize {
        self.remove_all_matching(|p| p.is(kind))
    }

    pub fn remove_all_matching(&mut self, predicate: impl Fn(&Phase) -> bool) -> usize {
        let before = self.len();
        for level in &mut self.levels {
            level.retain(|p| !predicate(p));
        }
        before - self.len()
    }

    /// Swap the first phase matching `predicate` for `phase`.
    pub fn replace(&mut self, predicate: impl Fn(&Phase) -> bool, phase: Phase) -> bool {
        match self.find_mut(predicate) {
            Some(slot) => {
                *slot = phase;
                true
            }
            None => false,
        }
    }

    /// Empty the tree. With `leave_unshifted`, the top level survives.
    pub fn clear(&mut self, leave_unshifted: bool) {
        let kept = if leave_unshifted {
            self.levels.pop().unwrap_or_default()
        } else {
            Level::default()
        };
        self.levels = vec![kept];
    }

    fn prune(&mut self) {
        while self.levels.len() > 1 && self.levels.last().is_some_and(Level::is_empty) {
            self.levels.pop();
        }
    }
}
