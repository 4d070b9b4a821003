// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background project loading.
//!
//! Parsing runs on a worker thread and never touches the store. The parsed
//! [`ProjectData`] is handed back over a channel; the owner thread polls
//! for it and then loads it into the store in one batch.

use crate::models::project::ProjectData;
use crate::store::CurveStore;
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};

/// A load running on a worker thread.
#[derive(Debug)]
pub struct PendingLoad {
    path: PathBuf,
    receiver: Receiver<Result<ProjectData>>,
}

impl PendingLoad {
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// The result, if the worker has finished.
    pub fn try_take(&self) -> Option<Result<ProjectData>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(anyhow!(
                "Loader for {} exited without a result",
                self.path.display()
            ))),
        }
    }

    /// Block until the worker finishes.
    pub fn wait(self) -> Result<ProjectData> {
        self.receiver
            .recv()
            .map_err(|_| anyhow!("Loader for {} exited without a result", self.path.display()))?
    }

    /// Poll the worker and, once it is done, load the project into `store`.
    ///
    /// Returns `None` while the worker is still running.
    pub fn poll_into(&self, store: &mut CurveStore) -> Option<Result<()>> {
        let result = self.try_take()?;
        Some(result.map(|project| store.load_project(&project)))
    }
}

/// Start parsing a project file on a worker thread.
pub fn spawn_load(path: impl Into<PathBuf>) -> PendingLoad {
    let path = path.into();
    let (sender, receiver) = channel();
    let worker_path = path.clone();

    std::thread::spawn(move || {
        let result = super::serialization::import_project(&worker_path);
        if let Err(ref e) = result {
            log::error!("Failed to load {}: {:#}", worker_path.display(), e);
        }
        let _ = sender.send(result);
    });

    PendingLoad { path, receiver }
}
