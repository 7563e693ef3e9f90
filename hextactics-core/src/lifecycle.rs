//! Object lifecycle provider
//!
//! The core never owns visuals or pooled objects. It asks a provider to spawn
//! and recycle them by template name and tells it where to put them.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::hex::Point3;

/// Opaque handle to an object owned by the provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub u64);

pub trait ObjectLifecycle {
    fn spawn(&mut self, template: &str) -> InstanceHandle;

    fn recycle(&mut self, handle: InstanceHandle);

    fn place(&mut self, _handle: InstanceHandle, _position: Point3) {}
}

#[derive(Debug, Default)]
struct Ledger {
    next: u64,
    live: FxHashSet<InstanceHandle>,
    spawned: usize,
    recycled: usize,
}

/// Headless provider that only counts instances.
///
/// Clones share the same ledger, so a test can keep one clone and hand the
/// other to a match.
#[derive(Clone, Debug, Default)]
pub struct NullLifecycle {
    ledger: Rc<RefCell<Ledger>>,
}

impl NullLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instances spawned and not yet recycled
    pub fn live(&self) -> usize {
        self.ledger.borrow().live.len()
    }

    pub fn spawned(&self) -> usize {
        self.ledger.borrow().spawned
    }

    pub fn recycled(&self) -> usize {
        self.ledger.borrow().recycled
    }
}

impl ObjectLifecycle for NullLifecycle {
    fn spawn(&mut self, _template: &str) -> InstanceHandle {
        let mut ledger = self.ledger.borrow_mut();
        let handle = InstanceHandle(ledger.next);
        ledger.next += 1;
        ledger.spawned += 1;
        ledger.live.insert(handle);
        handle
    }

    fn recycle(&mut self, handle: InstanceHandle) {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.live.remove(&handle) {
            ledger.recycled += 1;
        }
    }
}
