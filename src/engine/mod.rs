// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pure algorithms over trajectories. Nothing here touches the store.

pub mod gap_fill;
pub mod segment;

pub use gap_fill::{find_gap, find_gaps, insert_track, FillMode, Gap, GapError, GapOptions, SourceCurve};
pub use segment::{segment, segment_at, Segment};
