// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Single-owner thread confinement.
//!
//! The store is bound to the thread that created it. Work done elsewhere,
//! such as parsing a project in the background, has to hand its result back
//! to that thread before touching the store.

use std::thread::{self, ThreadId};

/// Identity of the thread allowed to use a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerThread {
    id: ThreadId,
}

impl OwnerThread {
    /// Bind to the calling thread.
    pub fn current() -> Self {
        Self {
            id: thread::current().id(),
        }
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    /// Panic unless called on the owner thread. Cross-thread access is a
    /// host programming error and is never recovered from.
    #[track_caller]
    pub fn assert_current(&self, operation: &str) {
        if !self.is_current() {
            panic!(
                "CurveStore::{} called from thread {:?}, but the store is owned by thread {:?}",
                operation,
                thread::current().id(),
                self.id
            );
        }
    }
}
