// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Trajectory data structures.
//!
//! This module defines the core value types for tracking data: a single
//! tracked [`Point`], the per-curve [`Trajectory`], and the patches used to
//! replace points structurally.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// How a point's position came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointStatus {
    Normal,
    Interpolated,
    Keyframe,
    Tracked,
    Endframe,
}

impl PointStatus {
    /// Real tracked data that bounds a gap.
    pub fn is_authoritative(self) -> bool {
        matches!(self, Self::Normal | Self::Keyframe | Self::Tracked)
    }

    pub fn is_endframe(self) -> bool {
        self == Self::Endframe
    }
}

/// A tracked position at a single frame.
///
/// Points are immutable values. Equality and hashing cover every field, with
/// coordinates compared bit-for-bit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point {
    pub frame: i32,
    pub x: f64,
    pub y: f64,
    pub status: PointStatus,
}

impl Point {
    pub fn new(frame: i32, x: f64, y: f64, status: PointStatus) -> Self {
        Self { frame, x, y, status }
    }

    /// Same position at the same frame, with a different status.
    pub fn with_status(self, status: PointStatus) -> Self {
        Self { status, ..self }
    }

    /// Same status at the same frame, moved to a new position.
    pub fn moved_to(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame
            && self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.status == other.status
    }
}

impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.frame.hash(state);
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
        self.status.hash(state);
    }
}

/// Ordered sequence of points for one curve, keyed by frame.
///
/// Storage keeps insertion order; frames are unique. Anything that relies on
/// frame order goes through [`Trajectory::sorted`]. Equality compares the
/// frame-to-point mapping, not the storage order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Point>", into = "Vec<Point>")]
pub struct Trajectory {
    points: IndexMap<i32, Point>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trajectory from points. A later point replaces an earlier one
    /// at the same frame.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        let mut trajectory = Self::new();
        for point in points {
            trajectory.insert(point);
        }
        trajectory
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in storage (insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.values()
    }

    /// Copy of the points in ascending frame order.
    pub fn sorted(&self) -> Vec<Point> {
        let mut points: Vec<Point> = self.points.values().copied().collect();
        points.sort_unstable_by_key(|p| p.frame);
        points
    }

    /// Frames present, ascending.
    pub fn frames(&self) -> Vec<i32> {
        let mut frames: Vec<i32> = self.points.keys().copied().collect();
        frames.sort_unstable();
        frames
    }

    pub fn get(&self, frame: i32) -> Option<&Point> {
        self.points.get(&frame)
    }

    pub fn contains_frame(&self, frame: i32) -> bool {
        self.points.contains_key(&frame)
    }

    /// First and last frame, inclusive.
    pub fn frame_range(&self) -> Option<(i32, i32)> {
        let min = self.points.keys().copied().min()?;
        let max = self.points.keys().copied().max()?;
        Some((min, max))
    }

    /// Insert a point, replacing whatever was stored at its frame.
    ///
    /// Returns the replaced point. A replacement keeps its storage position.
    pub fn insert(&mut self, point: Point) -> Option<Point> {
        self.points.insert(point.frame, point)
    }

    /// Remove the point at `frame`, keeping the order of the rest.
    pub fn remove(&mut self, frame: i32) -> Option<Point> {
        self.points.shift_remove(&frame)
    }

    /// Apply a patch and return what is needed to undo it.
    pub fn apply_patch(&mut self, patch: &CurvePatch) -> RevertPatch {
        let mut revert = RevertPatch::default();
        for point in &patch.points {
            match self.insert(*point) {
                Some(previous) => revert.restore.push(previous),
                None => revert.remove.push(point.frame),
            }
        }
        revert
    }

    /// Undo a previously applied patch.
    pub fn revert(&mut self, revert: &RevertPatch) {
        for frame in &revert.remove {
            self.remove(*frame);
        }
        for point in &revert.restore {
            self.insert(*point);
        }
    }
}

impl From<Vec<Point>> for Trajectory {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

impl From<Trajectory> for Vec<Point> {
    fn from(trajectory: Trajectory) -> Self {
        trajectory.points.into_values().collect()
    }
}

impl FromIterator<Point> for Trajectory {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::from_points(iter)
    }
}

/// New point values to write into one curve, one per frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurvePatch {
    pub curve: String,
    pub points: Vec<Point>,
}

impl CurvePatch {
    pub fn new(curve: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            curve: curve.into(),
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn frames(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.iter().map(|p| p.frame)
    }
}

/// Prior state captured when a patch is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevertPatch {
    /// Points the patch overwrote.
    pub restore: Vec<Point>,
    /// Frames the patch created.
    pub remove: Vec<i32>,
}
