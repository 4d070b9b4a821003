// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! End-to-end editing flows: read from the store, run an engine, write the
//! patch back in one batch.

use std::sync::{Arc, Mutex};
use trackedit::engine::{find_gap, gap_fill, insert_track, segment};
use trackedit::util::{geometry::ViewTransform, spatial_index::entries_from_curves};
use trackedit::{
    CurvePatch, CurveStore, DisplayMode, FillMode, Gap, GapError, GapOptions, Point, PointStatus, Signal,
    SourceCurve, SpatialIndex, Trajectory,
};

fn counter(store: &mut CurveStore, signal: Signal) -> Arc<Mutex<usize>> {
    let count = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&count);
    store.subscribe(signal, move |_| *sink.lock().unwrap() += 1);
    count
}

fn reference_a() -> Trajectory {
    (1..=10)
        .map(|f| Point::new(f, f64::from(f) * 3.0, 100.0 - f64::from(f * f), PointStatus::Tracked))
        .collect()
}

#[test]
fn single_missing_frame_is_interpolated() {
    let mut store = CurveStore::new();
    store.set_curve(
        "pt",
        Trajectory::from_points([
            Point::new(1, 0.0, 0.0, PointStatus::Normal),
            Point::new(3, 10.0, 10.0, PointStatus::Normal),
        ]),
    );

    let trajectory = store.get_curve("pt").unwrap();
    assert_eq!(find_gap(&trajectory, 2, GapOptions::default()), Ok(Gap { start: 2, end: 2 }));

    let patch = insert_track("pt", &trajectory, 2, FillMode::Interpolate, &[], GapOptions::default()).unwrap();
    store.batch(|store| store.apply_patch(&patch));

    let filled = store.curve("pt").unwrap();
    assert_eq!(filled.get(2), Some(&Point::new(2, 5.0, 5.0, PointStatus::Interpolated)));
    assert_eq!(filled.get(1), Some(&Point::new(1, 0.0, 0.0, PointStatus::Normal)));
    assert_eq!(filled.get(3), Some(&Point::new(3, 10.0, 10.0, PointStatus::Normal)));
}

#[test]
fn copy_with_offset_reproduces_source_shape() {
    let a = reference_a();
    let b: Trajectory = a
        .iter()
        .filter(|p| !(5..=7).contains(&p.frame))
        .map(|p| p.moved_to(p.x - 20.0, p.y + 8.0))
        .collect();

    let mut store = CurveStore::new();
    store.set_curve("A", a.clone());
    store.set_curve("B", b);
    let curves = counter(&mut store, Signal::Curves);

    let target = store.get_curve("B").unwrap();
    let source = store.get_curve("A").unwrap();
    let patch = insert_track(
        "B",
        &target,
        5,
        FillMode::CopyWithOffset,
        &[SourceCurve::new("A", &source)],
        GapOptions::default(),
    )
    .unwrap();

    // Offset sampled at boundary frame 4.
    let (anchor, reference) = (target.get(4).unwrap(), a.get(4).unwrap());
    let (dx, dy) = (anchor.x - reference.x, anchor.y - reference.y);
    assert_eq!((dx, dy), (-20.0, 8.0));

    let revert = store.batch(|store| store.apply_patch(&patch)).unwrap();
    assert_eq!(*curves.lock().unwrap(), 1);

    let filled = store.curve("B").unwrap();
    for frame in 5..=7 {
        let point = filled.get(frame).unwrap();
        let original = a.get(frame).unwrap();
        assert_eq!(point.x - dx, original.x);
        assert_eq!(point.y - dy, original.y);
        assert_eq!(point.status, PointStatus::Tracked);
    }

    store.revert_patch("B", &revert);
    assert!(!store.curve("B").unwrap().contains_frame(6));
}

#[test]
fn averaged_fill_with_two_sources() {
    let a = reference_a();
    let c: Trajectory = a.iter().map(|p| p.moved_to(p.x + 2.0, p.y + 6.0)).collect();
    let b: Trajectory = a.iter().filter(|p| p.frame < 4 || p.frame > 6).copied().collect();

    let patch = insert_track(
        "B",
        &b,
        5,
        FillMode::Average,
        &[SourceCurve::new("A", &a), SourceCurve::new("C", &c)],
        GapOptions::default(),
    )
    .unwrap();

    // Both sources move exactly like B did, so the mean reproduces it.
    for point in &patch.points {
        let original = a.get(point.frame).unwrap();
        assert!((point.x - original.x).abs() < 1e-9);
        assert!((point.y - original.y).abs() < 1e-9);
        assert_eq!(point.status, PointStatus::Interpolated);
    }
    assert_eq!(patch.frames().collect::<Vec<_>>(), vec![4, 5, 6]);
}

#[test]
fn source_hole_is_reported_not_interpolated() {
    let mut a = reference_a();
    a.remove(6);
    let b: Trajectory = reference_a().iter().filter(|p| !(5..=7).contains(&p.frame)).copied().collect();

    let result = insert_track(
        "B",
        &b,
        6,
        FillMode::CopyWithOffset,
        &[SourceCurve::new("A", &a)],
        GapOptions::default(),
    );
    assert_eq!(
        result,
        Err(GapError::InsufficientSourceData {
            curve: "A".to_string(),
            start: 6,
            end: 6
        })
    );
}

#[test]
fn endframe_break_is_respected_until_bridged() {
    let trajectory = Trajectory::from_points([
        Point::new(1, 0.0, 0.0, PointStatus::Keyframe),
        Point::new(4, 3.0, 3.0, PointStatus::Endframe),
        Point::new(9, 8.0, 8.0, PointStatus::Keyframe),
    ]);

    let segments = segment(&trajectory);
    assert_eq!(segments.len(), 3);
    assert!(!segments[1].active);

    assert!(matches!(
        insert_track("pt", &trajectory, 6, FillMode::Interpolate, &[], GapOptions::default()),
        Err(GapError::EndframeBoundary { endframe: 4, .. })
    ));

    let bridged = GapOptions { bridge_endframes: true };
    let patch = insert_track("pt", &trajectory, 6, FillMode::Interpolate, &[], bridged).unwrap();
    assert_eq!(patch.points.len(), 4);
    assert_eq!(gap_fill::find_gaps(&trajectory, bridged), vec![Gap { start: 2, end: 3 }, Gap { start: 5, end: 8 }]);
}

#[test]
fn bulk_load_is_one_notification_per_category() {
    let mut store = CurveStore::new();
    let curves = counter(&mut store, Signal::Curves);
    let active = counter(&mut store, Signal::ActiveCurve);
    let frame = counter(&mut store, Signal::Frame);

    store.begin_batch();
    for i in 0..25 {
        store.set_curve(&format!("pt{}", i), reference_a());
        store.set_frame(i + 1);
    }
    assert_eq!(*curves.lock().unwrap(), 0);
    assert_eq!(store.curve_count(), 25);
    store.end_batch();

    assert_eq!(*curves.lock().unwrap(), 1);
    assert_eq!(*active.lock().unwrap(), 1);
    assert_eq!(*frame.lock().unwrap(), 1);
    assert_eq!(store.current_frame(), 10);
}

#[test]
fn display_mode_precedence_for_all_inputs() {
    let mut store = CurveStore::new();
    store.set_curve("a", reference_a());
    store.set_curve("b", reference_a());

    for show_all in [false, true] {
        for selection in [vec![], vec!["b"], vec!["a", "b"]] {
            store.set_show_all(show_all);
            store.set_selected_curves(selection.clone());
            let expected = if show_all {
                DisplayMode::AllVisible
            } else if !selection.is_empty() {
                DisplayMode::Selected
            } else {
                DisplayMode::ActiveOnly
            };
            assert_eq!(store.display_mode(), expected);
        }
    }
}

#[test]
fn hit_test_after_edit_needs_rebuild() {
    let mut store = CurveStore::new();
    store.set_curve("a", reference_a());
    let transform = ViewTransform::new(2.0, 10.0, 10.0);

    let mut index = SpatialIndex::default();
    index.rebuild(entries_from_curves(store.curves(), &transform));
    let (sx, sy) = transform.to_screen(9.0, 91.0);
    assert_eq!(index.query(sx, sy, 1.0).map(|h| h.frame), Some(3));

    store.set_point("a", Point::new(3, 500.0, 500.0, PointStatus::Keyframe));
    index.invalidate();
    assert!(index.query(sx, sy, 1.0).is_none());

    index.rebuild(entries_from_curves(store.curves(), &transform));
    assert!(index.query(sx, sy, 1.0).is_none());
    let (nx, ny) = transform.to_screen(500.0, 500.0);
    assert_eq!(index.query(nx, ny, 1.0).map(|h| h.frame), Some(3));
}

#[test]
fn discarded_patch_leaves_store_untouched() {
    let mut store = CurveStore::new();
    store.set_curve(
        "a",
        Trajectory::from_points([
            Point::new(1, 0.0, 0.0, PointStatus::Keyframe),
            Point::new(5, 4.0, 4.0, PointStatus::Keyframe),
        ]),
    );
    let before = store.get_curve("a").unwrap();

    let patch: CurvePatch =
        insert_track("a", &before, 3, FillMode::Interpolate, &[], GapOptions::default()).unwrap();
    assert_eq!(patch.points.len(), 3);
    drop(patch);

    assert_eq!(store.get_curve("a").unwrap(), before);
}
