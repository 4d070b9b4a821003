// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Gap detection and filling ("insert track").
//!
//! A gap is a contiguous run of frames without authoritative data: frames
//! with no point at all, or with an INTERPOLATED point. It is bracketed by
//! real positions on both sides. A gap that starts right after an ENDFRAME
//! is an intentional break and is refused unless the caller asks to bridge
//! it.
//!
//! Filling never touches the bracketing points. Every strategy returns a
//! [`CurvePatch`] that the caller applies to the store, or a [`GapError`].

use crate::models::{CurvePatch, Point, PointStatus, Trajectory};
use crate::util::geometry::lerp;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Why a gap could not be found or filled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GapError {
    #[error("frame {frame} has tracked data and no adjacent gap")]
    NoGapFound { frame: i32 },

    #[error("gap at frame {frame} is not bracketed by tracked data on both sides")]
    UnboundedGap { frame: i32 },

    #[error("gap at frame {frame} follows the endframe at {endframe}")]
    EndframeBoundary { frame: i32, endframe: i32 },

    #[error("source curve '{curve}' has no data for frames {start}..={end}")]
    InsufficientSourceData { curve: String, start: i32, end: i32 },

    #[error("no source curves given")]
    NoSourceCurves,
}

/// Inclusive span of frames lacking authoritative data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gap {
    pub start: i32,
    pub end: i32,
}

impl Gap {
    pub fn frames(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Frame of the bracketing point before the gap.
    pub fn before(&self) -> i32 {
        self.start - 1
    }

    /// Frame of the bracketing point after the gap.
    pub fn after(&self) -> i32 {
        self.end + 1
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapOptions {
    /// Accept gaps that start right after an ENDFRAME.
    pub bridge_endframes: bool,
}

/// Fill strategy, chosen by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillMode {
    /// Linear interpolation between the bracketing points of the curve.
    #[default]
    Interpolate,
    /// Copy the first suitable source curve's motion, shifted onto the target.
    CopyWithOffset,
    /// Mean of every source curve's offset-corrected motion.
    Average,
}

/// A read-only curve used as the motion source for a fill.
#[derive(Debug, Clone, Copy)]
pub struct SourceCurve<'a> {
    pub name: &'a str,
    pub trajectory: &'a Trajectory,
}

impl<'a> SourceCurve<'a> {
    pub fn new(name: &'a str, trajectory: &'a Trajectory) -> Self {
        Self { name, trajectory }
    }
}

/// A position that may bound a gap.
fn holds_position(point: &Point) -> bool {
    point.status != PointStatus::Interpolated
}

fn has_data(trajectory: &Trajectory, frame: i32) -> bool {
    trajectory.get(frame).is_some_and(holds_position)
}

/// Locate the gap at or next to `frame`.
///
/// When `frame` itself has data, the gap right after it is preferred over
/// the gap right before it.
pub fn find_gap(trajectory: &Trajectory, frame: i32, options: GapOptions) -> Result<Gap, GapError> {
    if !has_data(trajectory, frame) {
        return bounded_gap(trajectory, frame, options);
    }

    let Some((first, last)) = trajectory.frame_range() else {
        return Err(GapError::NoGapFound { frame });
    };
    let forward = (frame < last && !has_data(trajectory, frame + 1))
        .then(|| bounded_gap(trajectory, frame + 1, options));
    let backward = (frame > first && !has_data(trajectory, frame - 1))
        .then(|| bounded_gap(trajectory, frame - 1, options));

    match (forward, backward) {
        (Some(Ok(gap)), _) | (_, Some(Ok(gap))) => Ok(gap),
        (Some(Err(e)), _) | (None, Some(Err(e))) => Err(e),
        (None, None) => Err(GapError::NoGapFound { frame }),
    }
}

/// Grow the gap containing `seed`, which must lack data.
fn bounded_gap(trajectory: &Trajectory, seed: i32, options: GapOptions) -> Result<Gap, GapError> {
    let points = trajectory.sorted();
    let before = points
        .iter()
        .rev()
        .find(|p| p.frame < seed && holds_position(p));
    let after = points.iter().find(|p| p.frame > seed && holds_position(p));

    let (Some(before), Some(after)) = (before, after) else {
        return Err(GapError::UnboundedGap { frame: seed });
    };
    if before.status.is_endframe() && !options.bridge_endframes {
        return Err(GapError::EndframeBoundary {
            frame: seed,
            endframe: before.frame,
        });
    }

    Ok(Gap {
        start: before.frame + 1,
        end: after.frame - 1,
    })
}

/// Every interior gap of a trajectory that `find_gap` would accept.
pub fn find_gaps(trajectory: &Trajectory, options: GapOptions) -> Vec<Gap> {
    let anchors: Vec<Point> = trajectory
        .sorted()
        .into_iter()
        .filter(holds_position)
        .collect();

    anchors
        .windows(2)
        .filter(|pair| pair[1].frame > pair[0].frame + 1)
        .filter(|pair| options.bridge_endframes || !pair[0].status.is_endframe())
        .map(|pair| Gap {
            start: pair[0].frame + 1,
            end: pair[1].frame - 1,
        })
        .collect()
}

fn bracket(trajectory: &Trajectory, gap: Gap) -> Result<(Point, Point), GapError> {
    match (trajectory.get(gap.before()), trajectory.get(gap.after())) {
        (Some(p0), Some(p1)) => Ok((*p0, *p1)),
        _ => Err(GapError::UnboundedGap { frame: gap.start }),
    }
}

/// Position at `frame` on the straight line from `p0` to `p1`.
pub fn lerp_point(p0: &Point, p1: &Point, frame: i32) -> (f64, f64) {
    let t = f64::from(frame - p0.frame) / f64::from(p1.frame - p0.frame);
    (lerp(p0.x, p1.x, t), lerp(p0.y, p1.y, t))
}

/// Strategy 1: linear interpolation between the bracketing points.
pub fn interpolate(trajectory: &Trajectory, gap: Gap) -> Result<Vec<Point>, GapError> {
    let (p0, p1) = bracket(trajectory, gap)?;
    Ok(gap
        .frames()
        .map(|frame| {
            let (x, y) = lerp_point(&p0, &p1, frame);
            Point::new(frame, x, y, PointStatus::Interpolated)
        })
        .collect())
}

/// Offset from `source` to `target`, sampled at a bracketing frame both
/// curves have data at. The frame before the gap is tried first.
pub fn offset_for(target: &Trajectory, gap: Gap, source: &SourceCurve<'_>) -> Result<(f64, f64), GapError> {
    [gap.before(), gap.after()]
        .into_iter()
        .find_map(|frame| {
            let t = target.get(frame)?;
            let s = source.trajectory.get(frame)?;
            Some((t.x - s.x, t.y - s.y))
        })
        .ok_or_else(|| GapError::InsufficientSourceData {
            curve: source.name.to_string(),
            start: gap.before(),
            end: gap.after(),
        })
}

/// Source points across the whole gap, or the first uncovered subrange.
fn source_points(gap: Gap, source: &SourceCurve<'_>) -> Result<Vec<Point>, GapError> {
    let mut points = Vec::with_capacity(gap.len());
    let mut missing: Option<(i32, i32)> = None;
    for frame in gap.frames() {
        match (source.trajectory.get(frame), missing) {
            (Some(point), None) => points.push(*point),
            (Some(_), Some(_)) => break,
            (None, None) => missing = Some((frame, frame)),
            (None, Some((start, _))) => missing = Some((start, frame)),
        }
    }

    match missing {
        Some((start, end)) => Err(GapError::InsufficientSourceData {
            curve: source.name.to_string(),
            start,
            end,
        }),
        None => Ok(points),
    }
}

/// Strategy 2: copy a source curve's motion shifted by a constant offset.
///
/// Sources are tried in order; the first one covering the offset frame and
/// the whole gap wins. When none does, the first source's failure is
/// returned.
pub fn copy_with_offset(
    target: &Trajectory,
    gap: Gap,
    sources: &[SourceCurve<'_>],
) -> Result<Vec<Point>, GapError> {
    let mut first_error = None;
    for source in sources {
        let copied = offset_for(target, gap, source).and_then(|(dx, dy)| {
            let points = source_points(gap, source)?;
            Ok(points
                .into_iter()
                .map(|p| {
                    let status = if p.status == PointStatus::Interpolated {
                        PointStatus::Interpolated
                    } else {
                        PointStatus::Tracked
                    };
                    Point::new(p.frame, p.x + dx, p.y + dy, status)
                })
                .collect())
        });
        match copied {
            Ok(points) => {
                log::debug!("copying frames {}..={} from '{}'", gap.start, gap.end, source.name);
                return Ok(points);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or(GapError::NoSourceCurves))
}

/// Strategy 3: componentwise mean of every offset-corrected source.
pub fn average(target: &Trajectory, gap: Gap, sources: &[SourceCurve<'_>]) -> Result<Vec<Point>, GapError> {
    if sources.is_empty() {
        return Err(GapError::NoSourceCurves);
    }

    let mut sums = vec![(0.0, 0.0); gap.len()];
    for source in sources {
        let (dx, dy) = offset_for(target, gap, source)?;
        for (sum, point) in sums.iter_mut().zip(source_points(gap, source)?) {
            sum.0 += point.x + dx;
            sum.1 += point.y + dy;
        }
    }

    let n = sources.len() as f64;
    Ok(gap
        .frames()
        .zip(sums)
        .map(|(frame, (sx, sy))| Point::new(frame, sx / n, sy / n, PointStatus::Interpolated))
        .collect())
}

/// Find the gap around `frame` on `curve` and fill it with `mode`.
///
/// Sources named like the target are ignored.
pub fn insert_track(
    curve: &str,
    trajectory: &Trajectory,
    frame: i32,
    mode: FillMode,
    sources: &[SourceCurve<'_>],
    options: GapOptions,
) -> Result<CurvePatch, GapError> {
    let gap = find_gap(trajectory, frame, options)?;
    let sources: Vec<SourceCurve<'_>> = sources.iter().filter(|s| s.name != curve).copied().collect();

    let points = match mode {
        FillMode::Interpolate => interpolate(trajectory, gap)?,
        FillMode::CopyWithOffset => copy_with_offset(trajectory, gap, &sources)?,
        FillMode::Average => average(trajectory, gap, &sources)?,
    };

    log::info!(
        "Filled {} frame(s) {}..={} on '{}' ({:?})",
        points.len(),
        gap.start,
        gap.end,
        curve,
        mode
    );
    Ok(CurvePatch::new(curve, points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PointStatus::*;

    fn curve(points: &[(i32, f64, f64, PointStatus)]) -> Trajectory {
        points
            .iter()
            .map(|&(frame, x, y, status)| Point::new(frame, x, y, status))
            .collect()
    }

    /// Frames 1..=10 moving along a parabola.
    fn reference_curve() -> Trajectory {
        (1..=10)
            .map(|f| Point::new(f, f64::from(f) * 2.0, f64::from(f * f), Tracked))
            .collect()
    }

    #[test]
    fn test_single_missing_frame_scenario() {
        let trajectory = curve(&[(1, 0.0, 0.0, Normal), (3, 10.0, 10.0, Normal)]);

        let gap = find_gap(&trajectory, 2, GapOptions::default()).unwrap();
        assert_eq!(gap, Gap { start: 2, end: 2 });

        let points = interpolate(&trajectory, gap).unwrap();
        assert_eq!(points, vec![Point::new(2, 5.0, 5.0, Interpolated)]);
    }

    #[test]
    fn test_interpolated_frames_count_as_missing() {
        let trajectory = curve(&[
            (1, 0.0, 0.0, Keyframe),
            (2, 9.0, 9.0, Interpolated),
            (3, 9.0, 9.0, Interpolated),
            (5, 4.0, 8.0, Tracked),
        ]);

        let gap = find_gap(&trajectory, 3, GapOptions::default()).unwrap();
        assert_eq!(gap, Gap { start: 2, end: 4 });
    }

    #[test]
    fn test_authoritative_frame_prefers_following_gap() {
        let trajectory = curve(&[
            (1, 0.0, 0.0, Keyframe),
            (3, 0.0, 0.0, Keyframe),
            (6, 0.0, 0.0, Keyframe),
        ]);

        assert_eq!(find_gap(&trajectory, 3, GapOptions::default()), Ok(Gap { start: 4, end: 5 }));
        assert_eq!(find_gap(&trajectory, 6, GapOptions::default()), Ok(Gap { start: 4, end: 5 }));
    }

    #[test]
    fn test_no_gap_found() {
        let trajectory = curve(&[
            (1, 0.0, 0.0, Keyframe),
            (2, 0.0, 0.0, Tracked),
            (3, 0.0, 0.0, Tracked),
        ]);
        assert_eq!(
            find_gap(&trajectory, 2, GapOptions::default()),
            Err(GapError::NoGapFound { frame: 2 })
        );
    }

    #[test]
    fn test_unbounded_gap() {
        let trajectory = curve(&[(5, 0.0, 0.0, Keyframe), (6, 0.0, 0.0, Interpolated)]);

        assert_eq!(
            find_gap(&trajectory, 2, GapOptions::default()),
            Err(GapError::UnboundedGap { frame: 2 })
        );
        assert_eq!(
            find_gap(&trajectory, 6, GapOptions::default()),
            Err(GapError::UnboundedGap { frame: 6 })
        );
        assert_eq!(
            find_gap(&Trajectory::new(), 1, GapOptions::default()),
            Err(GapError::UnboundedGap { frame: 1 })
        );
    }

    #[test]
    fn test_endframe_is_not_crossed_unless_bridged() {
        let trajectory = curve(&[
            (1, 0.0, 0.0, Tracked),
            (2, 1.0, 1.0, Endframe),
            (6, 5.0, 5.0, Keyframe),
        ]);

        assert_eq!(
            find_gap(&trajectory, 4, GapOptions::default()),
            Err(GapError::EndframeBoundary { frame: 4, endframe: 2 })
        );
        let bridged = GapOptions { bridge_endframes: true };
        assert_eq!(find_gap(&trajectory, 4, bridged), Ok(Gap { start: 3, end: 5 }));
    }

    #[test]
    fn test_endframe_may_close_a_gap() {
        let trajectory = curve(&[(1, 0.0, 0.0, Tracked), (4, 3.0, 3.0, Endframe)]);
        assert_eq!(find_gap(&trajectory, 2, GapOptions::default()), Ok(Gap { start: 2, end: 3 }));
    }

    #[test]
    fn test_find_gaps_lists_interior_gaps() {
        let trajectory = curve(&[
            (1, 0.0, 0.0, Tracked),
            (4, 0.0, 0.0, Tracked),
            (5, 0.0, 0.0, Endframe),
            (9, 0.0, 0.0, Keyframe),
            (10, 0.0, 0.0, Interpolated),
            (12, 0.0, 0.0, Tracked),
        ]);

        assert_eq!(
            find_gaps(&trajectory, GapOptions::default()),
            vec![Gap { start: 2, end: 3 }, Gap { start: 10, end: 11 }]
        );
        assert_eq!(find_gaps(&trajectory, GapOptions { bridge_endframes: true }).len(), 3);
    }

    #[test]
    fn test_interpolation_boundaries_exact_and_monotonic() {
        let p0 = Point::new(10, 0.1, 100.0, Keyframe);
        let p1 = Point::new(17, 0.7, 3.0, Keyframe);
        let trajectory = Trajectory::from_points([p0, p1]);

        assert_eq!(lerp_point(&p0, &p1, 10), (0.1, 100.0));
        assert_eq!(lerp_point(&p0, &p1, 17), (0.7, 3.0));

        let gap = find_gap(&trajectory, 12, GapOptions::default()).unwrap();
        let points = interpolate(&trajectory, gap).unwrap();
        assert_eq!(points.len(), 6);
        assert!(points.iter().all(|p| p.status == Interpolated));

        let xs: Vec<f64> = std::iter::once(p0.x)
            .chain(points.iter().map(|p| p.x))
            .chain(std::iter::once(p1.x))
            .collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]));
        let ys: Vec<f64> = std::iter::once(p0.y)
            .chain(points.iter().map(|p| p.y))
            .chain(std::iter::once(p1.y))
            .collect();
        assert!(ys.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_copy_with_offset_preserves_source_shape() {
        let a = reference_curve();
        let b: Trajectory = a
            .iter()
            .filter(|p| !(5..=7).contains(&p.frame))
            .map(|p| p.moved_to(p.x + 100.0, p.y - 50.0))
            .collect();

        let gap = find_gap(&b, 5, GapOptions::default()).unwrap();
        assert_eq!(gap, Gap { start: 5, end: 7 });

        let source = SourceCurve::new("A", &a);
        let (dx, dy) = offset_for(&b, gap, &source).unwrap();
        assert_eq!((dx, dy), (100.0, -50.0));

        let points = copy_with_offset(&b, gap, &[source]).unwrap();
        assert_eq!(points.len(), 3);
        for point in &points {
            let original = a.get(point.frame).unwrap();
            assert_eq!(point.x - dx, original.x);
            assert_eq!(point.y - dy, original.y);
            assert_eq!(point.status, Tracked);
        }
    }

    #[test]
    fn test_copy_keeps_interpolated_status() {
        let mut a = reference_curve();
        a.insert(a.get(6).unwrap().with_status(Interpolated));
        let b = curve(&[(4, 0.0, 0.0, Tracked), (8, 0.0, 0.0, Tracked)]);

        let gap = Gap { start: 5, end: 7 };
        let points = copy_with_offset(&b, gap, &[SourceCurve::new("A", &a)]).unwrap();
        let statuses: Vec<PointStatus> = points.iter().map(|p| p.status).collect();
        assert_eq!(statuses, vec![Tracked, Interpolated, Tracked]);
    }

    #[test]
    fn test_copy_reports_uncovered_subrange() {
        let mut a = reference_curve();
        a.remove(6);
        a.remove(7);
        let b = curve(&[(4, 0.0, 0.0, Tracked), (9, 0.0, 0.0, Tracked)]);

        let gap = find_gap(&b, 5, GapOptions::default()).unwrap();
        assert_eq!(
            copy_with_offset(&b, gap, &[SourceCurve::new("A", &a)]),
            Err(GapError::InsufficientSourceData {
                curve: "A".to_string(),
                start: 6,
                end: 7,
            })
        );
    }

    #[test]
    fn test_copy_falls_through_to_covering_source() {
        let mut partial = reference_curve();
        partial.remove(6);
        let full = reference_curve();
        let b = curve(&[(4, 1.0, 1.0, Tracked), (8, 1.0, 1.0, Tracked)]);

        let sources = [SourceCurve::new("partial", &partial), SourceCurve::new("full", &full)];
        let points = copy_with_offset(&b, Gap { start: 5, end: 7 }, &sources).unwrap();
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn test_offset_falls_back_to_trailing_boundary() {
        let mut a = reference_curve();
        a.remove(4);
        let b = curve(&[(4, 0.0, 0.0, Tracked), (8, 20.0, 70.0, Tracked)]);

        let offset = offset_for(&b, Gap { start: 5, end: 7 }, &SourceCurve::new("A", &a)).unwrap();
        assert_eq!(offset, (20.0 - 16.0, 70.0 - 64.0));
    }

    #[test]
    fn test_offset_error_names_both_anchors() {
        let mut a = reference_curve();
        a.remove(4);
        a.remove(8);
        let b = curve(&[(4, 0.0, 0.0, Tracked), (8, 20.0, 70.0, Tracked)]);

        assert_eq!(
            offset_for(&b, Gap { start: 5, end: 7 }, &SourceCurve::new("A", &a)),
            Err(GapError::InsufficientSourceData {
                curve: "A".to_string(),
                start: 4,
                end: 8,
            })
        );
    }

    #[test]
    fn test_average_of_sources() {
        let a = reference_curve();
        let c: Trajectory = a.iter().map(|p| p.moved_to(p.x + 4.0, p.y * 3.0)).collect();
        let b = curve(&[(4, 8.0, 16.0, Tracked), (8, 0.0, 0.0, Tracked)]);

        let gap = Gap { start: 5, end: 7 };
        let points = average(&b, gap, &[SourceCurve::new("A", &a), SourceCurve::new("C", &c)]).unwrap();

        // A's offset at frame 4 is zero; C's is (-4, -32).
        let expected_5 = ((10.0 + (14.0 - 4.0)) / 2.0, (25.0 + (75.0 - 32.0)) / 2.0);
        assert_eq!((points[0].x, points[0].y), expected_5);
        assert!(points.iter().all(|p| p.status == Interpolated));
    }

    #[test]
    fn test_average_requires_sources_with_coverage() {
        let b = curve(&[(4, 0.0, 0.0, Tracked), (8, 0.0, 0.0, Tracked)]);
        let gap = Gap { start: 5, end: 7 };
        assert_eq!(average(&b, gap, &[]), Err(GapError::NoSourceCurves));

        let mut a = reference_curve();
        a.remove(5);
        assert!(matches!(
            average(&b, gap, &[SourceCurve::new("A", &a)]),
            Err(GapError::InsufficientSourceData { start: 5, end: 5, .. })
        ));
    }

    #[test]
    fn test_insert_track_ignores_target_as_source() {
        let b = curve(&[(4, 0.0, 0.0, Tracked), (8, 0.0, 0.0, Tracked)]);
        let sources = [SourceCurve::new("B", &b)];

        let result = insert_track("B", &b, 6, FillMode::CopyWithOffset, &sources, GapOptions::default());
        assert_eq!(result, Err(GapError::NoSourceCurves));

        let patch = insert_track("B", &b, 6, FillMode::Interpolate, &sources, GapOptions::default()).unwrap();
        assert_eq!(patch.curve, "B");
        assert_eq!(patch.frames().collect::<Vec<_>>(), vec![5, 6, 7]);
    }
}
