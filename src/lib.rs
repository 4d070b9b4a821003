// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! TRACKEDIT - trajectory editing core
//!
//! Data model, state store and editing algorithms for multi-curve 2D
//! tracking data: a curve is one tracked point's position over time, a point
//! is that position at a single frame.
//!
//! - [`models`]: points, trajectories, patches and project data
//! - [`store`]: the single-owner [`CurveStore`] with batched notifications
//! - [`engine`]: endframe segmentation and gap filling ("insert track")
//! - [`util`]: geometry and the spatial index used for hit-testing
//! - [`io`]: project files and background loading

pub mod engine;
pub mod io;
pub mod models;
pub mod settings;
pub mod store;
pub mod util;

pub use engine::{FillMode, Gap, GapError, GapOptions, Segment, SourceCurve};
pub use models::{CurvePatch, Point, PointStatus, ProjectData, Trajectory};
pub use settings::EditorSettings;
pub use store::{CurveStore, DisplayMode, Signal};
pub use util::spatial_index::SpatialIndex;
