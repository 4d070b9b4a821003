// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometry helpers and the hit-testing index.

pub mod geometry;
pub mod spatial_index;
