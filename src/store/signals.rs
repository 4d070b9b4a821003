// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Change notification with batch coalescing.
//!
//! Listeners subscribe to one [`Signal`] category each. Outside a batch a
//! change fires immediately. Inside a batch changes are only recorded, and
//! each pending category fires exactly once when the outermost batch ends.

use std::collections::BTreeSet;
use std::fmt;

/// Category of store change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    Curves,
    Selection,
    ActiveCurve,
    Frame,
    Visibility,
}

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(Signal) + Send>;

/// Listener registry plus the batch depth counter.
#[derive(Default)]
pub struct Notifier {
    next_id: u64,
    listeners: Vec<(ListenerId, Signal, Listener)>,
    pending: BTreeSet<Signal>,
    depth: usize,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending)
            .field("depth", &self.depth)
            .finish()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, signal: Signal, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, signal, listener));
        id
    }

    /// Returns false when the id was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_batching(&self) -> bool {
        self.depth > 0
    }

    /// Record a change, firing now unless a batch is open.
    pub fn emit(&mut self, signal: Signal) {
        if self.depth > 0 {
            self.pending.insert(signal);
        } else {
            self.fire(signal);
        }
    }

    pub fn begin(&mut self) {
        self.depth += 1;
    }

    /// Close one batch level. Unbalanced calls panic in debug builds and are
    /// ignored, with an error logged, in release builds.
    #[track_caller]
    pub fn end(&mut self) {
        debug_assert!(self.depth > 0, "end_batch called without a matching begin_batch");
        if self.depth == 0 {
            log::error!("end_batch called without a matching begin_batch; ignoring");
            return;
        }

        self.depth -= 1;
        if self.depth == 0 {
            for signal in std::mem::take(&mut self.pending) {
                self.fire(signal);
            }
        }
    }

    fn fire(&mut self, signal: Signal) {
        for (_, subscribed, listener) in self.listeners.iter_mut() {
            if *subscribed == signal {
                listener(signal);
            }
        }
    }
}
