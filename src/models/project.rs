// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project data for loading and exporting.
//!
//! A project is the loader-side view of a curve set: every curve with its
//! points and metadata, plus the length of the image sequence being tracked.

use super::{
    metadata::CurveMetadata,
    trajectory::{Point, Trajectory},
};
use serde::{Deserialize, Serialize};

/// One curve as it appears in a project file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveRecord {
    pub name: String,
    #[serde(flatten)]
    pub metadata: CurveMetadata,
    pub points: Vec<Point>,
}

impl CurveRecord {
    pub fn new(name: impl Into<String>, trajectory: &Trajectory, metadata: CurveMetadata) -> Self {
        Self {
            name: name.into(),
            metadata,
            points: trajectory.sorted(),
        }
    }

    pub fn trajectory(&self) -> Trajectory {
        Trajectory::from_points(self.points.iter().copied())
    }
}

/// Complete project data for serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    /// Number of frames in the image sequence, when one is loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_sequence_length: Option<i32>,
    pub curves: Vec<CurveRecord>,
}

impl ProjectData {
    /// Create an empty project.
    pub fn new(image_sequence_length: Option<i32>) -> Self {
        Self {
            image_sequence_length,
            curves: Vec::new(),
        }
    }

    pub fn add_curve(&mut self, name: impl Into<String>, trajectory: &Trajectory) {
        self.curves
            .push(CurveRecord::new(name, trajectory, CurveMetadata::default()));
    }

    pub fn point_count(&self) -> usize {
        self.curves.iter().map(|c| c.points.len()).sum()
    }
}
