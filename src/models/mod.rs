// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Value types for tracking data.

pub mod metadata;
pub mod project;
pub mod trajectory;

pub use metadata::{CurveColor, CurveMetadata};
pub use project::{CurveRecord, ProjectData};
pub use trajectory::{CurvePatch, Point, PointStatus, RevertPatch, Trajectory};
