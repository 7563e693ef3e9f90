//! Cooperative task primitives polled by the simulation tick

use serde::{Deserialize, Serialize};

/// Result of advancing a long-running operation by one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Done,
}

impl TaskStatus {
    pub fn is_done(self) -> bool {
        self == TaskStatus::Done
    }
}

/// Counts simulated seconds down to zero
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn advance(&mut self, dt: f32) -> TaskStatus {
        self.remaining = (self.remaining - dt).max(0.0);
        if self.remaining <= 0.0 {
            TaskStatus::Done
        } else {
            TaskStatus::Pending
        }
    }
}
