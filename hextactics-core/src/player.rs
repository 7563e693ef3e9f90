//! Players and their unit rotation queue

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::unit::UnitId;

/// Player index, 0-based
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

impl PlayerId {
    /// Players with even ids deploy at the top edge
    pub fn deploys_at_top(self) -> bool {
        self.0 % 2 == 0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.0 + 1)
    }
}

/// A player owns a FIFO of units. The front of the queue acts next.
#[derive(Clone, Debug)]
pub struct Player {
    id: PlayerId,
    units: VecDeque<UnitId>,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            units: VecDeque::new(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.units.iter().copied()
    }

    /// Unit at queue position `i`
    pub fn peek_unit(&self, i: usize) -> Option<UnitId> {
        self.units.get(i).copied()
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.units.contains(&unit)
    }

    /// Appends a unit. Returns false if it is already queued.
    pub fn add_unit(&mut self, unit: UnitId) -> bool {
        if self.contains(unit) {
            return false;
        }
        self.units.push_back(unit);
        true
    }

    pub fn remove_unit(&mut self, unit: UnitId) -> bool {
        match self.units.iter().position(|u| *u == unit) {
            Some(index) => {
                self.units.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn remove_all_units(&mut self) -> Vec<UnitId> {
        self.units.drain(..).collect()
    }

    /// Dequeue the next living unit and requeue it at the back.
    ///
    /// Dead units met on the way are dropped for good.
    pub fn next_unit(&mut self, is_alive: impl Fn(UnitId) -> bool) -> Option<UnitId> {
        while let Some(unit) = self.units.pop_front() {
            if is_alive(unit) {
                self.units.push_back(unit);
                return Some(unit);
            }
        }
        None
    }

    pub fn is_any_unit_alive(&self, is_alive: impl Fn(UnitId) -> bool) -> bool {
        self.units.iter().any(|u| is_alive(*u))
    }

    /// Move `unit` into `other`'s queue. Fails if this player does not own it.
    pub fn transfer_unit(&mut self, unit: UnitId, other: &mut Player) -> bool {
        if !self.remove_unit(unit) {
            return false;
        }
        other.add_unit(unit);
        true
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}
