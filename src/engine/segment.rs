// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Endframe segmentation.
//!
//! A trajectory is split into maximal runs of frames that are either
//! active (live tracked, editable) or inactive (holding the last position
//! after an ENDFRAME until real data resumes).
//!
//! The walk opens a candidate run at the first point, at the frame right
//! after every ENDFRAME, and at the first authoritative point following such
//! a held run. A candidate opened by an ENDFRAME is inactive unless it
//! contains an ENDFRAME point itself, so a chain of ENDFRAMEs keeps
//! re-opening the active run. Adjacent candidates with equal activeness are
//! then merged.

use crate::models::{Point, Trajectory};

/// A maximal run of frames sharing one activeness classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start_frame: i32,
    /// Inclusive.
    pub end_frame: i32,
    pub active: bool,
    /// Points inside the run, ascending by frame.
    pub points: Vec<Point>,
}

impl Segment {
    pub fn contains(&self, frame: i32) -> bool {
        (self.start_frame..=self.end_frame).contains(&frame)
    }

    pub fn frame_count(&self) -> i32 {
        self.end_frame - self.start_frame + 1
    }

    pub fn has_endframe(&self) -> bool {
        self.points.iter().any(|p| p.status.is_endframe())
    }
}

/// A run under construction.
struct Candidate {
    start_frame: i32,
    opened_by_endframe: bool,
    points: Vec<Point>,
}

impl Candidate {
    fn new(start_frame: i32, opened_by_endframe: bool) -> Self {
        Self {
            start_frame,
            opened_by_endframe,
            points: Vec::new(),
        }
    }

    fn is_active(&self) -> bool {
        if !self.opened_by_endframe {
            return true;
        }
        // A held run that still contains an ENDFRAME stays active; the
        // ENDFRAME re-opens tracking rather than being overridden by the
        // earlier deactivation.
        self.points.iter().any(|p| p.status.is_endframe())
    }
}

/// Split a trajectory into ordered segments covering its full frame range.
pub fn segment(trajectory: &Trajectory) -> Vec<Segment> {
    let points = trajectory.sorted();
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let last_frame = points[points.len() - 1].frame;

    let mut candidates = Vec::new();
    let mut current = Candidate::new(first.frame, false);
    for point in &points {
        if current.opened_by_endframe && point.status.is_authoritative() {
            if current.start_frame == point.frame && current.points.is_empty() {
                current.opened_by_endframe = false;
            } else {
                let resumed = Candidate::new(point.frame, false);
                candidates.push(std::mem::replace(&mut current, resumed));
            }
        }

        current.points.push(*point);

        if point.status.is_endframe() && point.frame < last_frame {
            let held = Candidate::new(point.frame + 1, true);
            candidates.push(std::mem::replace(&mut current, held));
        }
    }
    candidates.push(current);

    let mut segments: Vec<Segment> = Vec::with_capacity(candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        let end_frame = candidates
            .get(i + 1)
            .map_or(last_frame, |next| next.start_frame - 1);
        let active = candidate.is_active();

        match segments.last_mut() {
            Some(previous) if previous.active == active => {
                previous.end_frame = end_frame;
                previous.points.extend_from_slice(&candidate.points);
            }
            _ => segments.push(Segment {
                start_frame: candidate.start_frame,
                end_frame,
                active,
                points: candidate.points.clone(),
            }),
        }
    }

    segments
}

/// The segment covering `frame`, if any.
pub fn segment_at(segments: &[Segment], frame: i32) -> Option<&Segment> {
    segments.iter().find(|s| s.contains(frame))
}

/// Whether `frame` falls inside a live-tracked run.
pub fn is_active_at(trajectory: &Trajectory, frame: i32) -> bool {
    segment_at(&segment(trajectory), frame).is_some_and(|s| s.active)
}
