use rust_pan_zoom::Engine;
use rust_pan_zoom::engine::picker::Keyframes;
use rust_pan_zoom::events::{CornerArms, InputSnapshot, Pointer};
use rust_pan_zoom::processing::layout::{FitMode, fit_to_surface};
use rust_pan_zoom::processing::rect::{Rect, Size};

fn rect_close(a: Rect, b: Rect, eps: f64) {
    assert!((a.top - b.top).abs() <= eps, "top mismatch: {:?} vs {:?}", a, b);
    assert!((a.left - b.left).abs() <= eps, "left mismatch: {:?} vs {:?}", a, b);
    assert!((a.bottom - b.bottom).abs() <= eps, "bottom mismatch: {:?} vs {:?}", a, b);
    assert!((a.right - b.right).abs() <= eps, "right mismatch: {:?} vs {:?}", a, b);
}

fn running(elapsed_seconds: f64) -> InputSnapshot {
    InputSnapshot {
        trigger: true,
        elapsed_seconds,
        ..InputSnapshot::default()
    }
}

fn click(x: f64, y: f64, arms: CornerArms) -> InputSnapshot {
    InputSnapshot {
        pointer: Pointer { x, y },
        arms,
        commit: true,
        ..InputSnapshot::default()
    }
}

/// 4000x3000 photo on a 1920x1080 display, running from the full image to a tall strip.
fn landscape_engine() -> Engine {
    let mut engine = Engine::new(
        Size::new(4000.0, 3000.0),
        Size::new(1920.0, 1080.0),
        vec![0.5, 2.0],
    )
    .unwrap();
    engine.set_keyframes(Keyframes {
        start: Rect::new(0.0, 0.0, 3000.0, 4000.0),
        end: Rect::new(0.0, 0.0, 1920.0, 1080.0),
    });
    engine
}

#[test]
fn full_run_lands_on_fitted_end() {
    let mut engine = landscape_engine();

    let first = engine.tick(&running(0.016));
    assert!(engine.animation().initialized);
    // 4:3 cropped to 16:9 loses 375 rows top and bottom.
    assert_eq!(first.visible, Rect::new(375.0, 0.0, 2625.0, 4000.0));

    for _ in 0..30 {
        engine.tick(&running(1.0));
    }
    rect_close(
        engine.visible(),
        Rect::new(656.25, 0.0, 1263.75, 1080.0),
        1e-9,
    );
    rect_close(engine.visible(), engine.animation().effective_end, 1e-9);
}

#[test]
fn holding_past_the_end_overshoots() {
    let mut engine = landscape_engine();
    engine.tick(&running(0.0));
    engine.tick(&running(31.0));
    let end = engine.animation().effective_end;
    // The bottom edge moves up during the run and keeps going.
    assert!(engine.visible().bottom < end.bottom);
    assert!(engine.visible().right < end.right);
}

#[test]
fn progress_depends_on_elapsed_time_not_tick_count() {
    let mut coarse = landscape_engine();
    coarse.tick(&running(0.0));
    coarse.tick(&running(3.0));

    let mut fine = landscape_engine();
    fine.tick(&running(0.0));
    for _ in 0..10 {
        fine.tick(&running(0.3));
    }

    rect_close(coarse.visible(), fine.visible(), 1e-9);
}

#[test]
fn speed_preset_scales_elapsed_time() {
    let mut normal = landscape_engine();
    normal.tick(&running(0.0));
    normal.tick(&running(2.0));

    let mut fast = landscape_engine();
    fast.tick(&running(0.0));
    fast.tick(&InputSnapshot {
        speed_selector: Some(1),
        ..running(1.0)
    });

    assert_eq!(normal.visible(), fast.visible());
}

#[test]
fn releasing_trigger_freezes_then_restarts_from_start() {
    let mut engine = landscape_engine();
    engine.tick(&running(0.0));
    engine.tick(&running(5.0));
    let paused = engine.visible();

    let idle = engine.tick(&InputSnapshot {
        elapsed_seconds: 4.0,
        ..InputSnapshot::default()
    });
    assert_eq!(idle.visible, paused);
    assert!(!engine.animation().initialized);

    let restarted = engine.tick(&running(0.5));
    assert_eq!(restarted.visible, Rect::new(375.0, 0.0, 2625.0, 4000.0));
}

#[test]
fn arming_during_run_resumes_inside_the_image() {
    let mut engine = landscape_engine();
    engine.tick(&running(0.0));
    engine.tick(&running(10.0));

    let arming = engine.tick(&InputSnapshot {
        arms: CornerArms {
            end_top_left: true,
            ..CornerArms::default()
        },
        ..running(0.016)
    });
    assert_eq!(arming.visible, engine.mapping().bounds);
    assert!(!engine.animation().initialized);

    let resumed = engine.tick(&running(1.0));
    assert_eq!(resumed.visible, Rect::new(375.0, 0.0, 2625.0, 4000.0));
    let image = Rect::new(0.0, 0.0, 3000.0, 4000.0);
    assert!(image.contains(&resumed.visible, 0.0));

    let next = engine.tick(&running(1.0));
    assert!(image.contains(&next.visible, 1e-9));
}

#[test]
fn zero_area_keyframe_falls_back_to_whole_image() {
    let mut engine = landscape_engine();
    engine.set_keyframes(Keyframes {
        start: Rect::new(10.0, 10.0, 10.0, 10.0),
        end: Rect::new(0.0, 0.0, 1920.0, 1080.0),
    });
    let out = engine.tick(&running(0.0));
    assert_eq!(out.visible, Rect::new(375.0, 0.0, 2625.0, 4000.0));
    assert!(out.visible.width().is_finite() && out.visible.height().is_finite());
}

#[test]
fn corner_picks_on_matching_aspect_cover_whole_image() {
    let mut engine = Engine::new(
        Size::new(3840.0, 2160.0),
        Size::new(1920.0, 1080.0),
        Vec::new(),
    )
    .unwrap();

    let top_left = engine.tick(&click(
        0.0,
        0.0,
        CornerArms {
            start_top_left: true,
            ..CornerArms::default()
        },
    ));
    assert!(top_left.picked);
    engine.tick(&click(
        1920.0,
        1080.0,
        CornerArms {
            start_bottom_right: true,
            ..CornerArms::default()
        },
    ));

    assert_eq!(engine.keyframes().start, Rect::new(0.0, 0.0, 2160.0, 3840.0));
}

#[test]
fn one_click_sets_every_armed_corner() {
    let mut engine = landscape_engine();
    engine.tick(&click(
        960.0,
        540.0,
        CornerArms {
            start_top_left: true,
            end_top_left: true,
            ..CornerArms::default()
        },
    ));

    let kf = engine.keyframes();
    // Surface centre maps to image centre through the letterboxed placement.
    assert!((kf.start.left - 2000.0).abs() < 1e-9);
    assert!((kf.start.top - 1500.0).abs() < 1e-9);
    assert_eq!((kf.end.left, kf.end.top), (kf.start.left, kf.start.top));
    assert_eq!(kf.start.bottom, 3000.0);
    assert_eq!(kf.end.right, 1080.0);
}

#[test]
fn pick_without_commit_changes_nothing() {
    let mut engine = landscape_engine();
    let before = *engine.keyframes();
    let out = engine.tick(&InputSnapshot {
        pointer: Pointer { x: 100.0, y: 100.0 },
        arms: CornerArms {
            end_bottom_right: true,
            ..CornerArms::default()
        },
        ..InputSnapshot::default()
    });
    assert!(!out.picked);
    assert_eq!(*engine.keyframes(), before);
}

#[test]
fn pick_during_run_restarts_from_new_keyframes() {
    let mut engine = landscape_engine();
    engine.tick(&running(0.0));
    engine.tick(&running(10.0));

    let mut pick = click(
        0.0,
        0.0,
        CornerArms {
            end_top_left: true,
            ..CornerArms::default()
        },
    );
    pick.trigger = true;
    engine.tick(&pick);
    assert!(!engine.animation().initialized);

    engine.tick(&running(0.0));
    let expected_end = fit_to_surface(
        engine.keyframes().end,
        Size::new(1920.0, 1080.0),
        FitMode::ContainSurfaceInRect,
    )
    .unwrap()
    .rect;
    assert_eq!(engine.animation().effective_end, expected_end);
}

const SURFACES: [Size; 4] = [
    Size::new(1920.0, 1080.0),
    Size::new(1080.0, 1920.0),
    Size::new(1024.0, 768.0),
    Size::new(800.0, 800.0),
];

const RECTS: [Rect; 4] = [
    Rect::new(0.0, 0.0, 3000.0, 4000.0),
    Rect::new(100.0, 250.0, 400.0, 300.0),
    Rect::new(-50.0, 20.0, 950.0, 1020.0),
    Rect::new(12.5, 7.25, 1012.5, 3007.25),
];

#[test]
fn cover_fit_lies_inside_rect_and_matches_surface_aspect() {
    for surface in SURFACES {
        for rect in RECTS {
            let fitted = fit_to_surface(rect, surface, FitMode::ContainSurfaceInRect)
                .unwrap()
                .rect;
            assert!(rect.contains(&fitted, 1e-9), "{rect:?} on {surface:?} -> {fitted:?}");
            assert!((fitted.aspect() - surface.aspect()).abs() < 1e-9);
        }
    }
}

#[test]
fn letterbox_fit_contains_rect_and_matches_surface_aspect() {
    for surface in SURFACES {
        for rect in RECTS {
            let fitted = fit_to_surface(rect, surface, FitMode::ContainRectInSurface)
                .unwrap()
                .rect;
            assert!(fitted.contains(&rect, 1e-9), "{rect:?} on {surface:?} -> {fitted:?}");
            assert!((fitted.aspect() - surface.aspect()).abs() < 1e-9);
        }
    }
}

#[test]
fn fitting_twice_is_a_no_op() {
    for mode in [FitMode::ContainRectInSurface, FitMode::ContainSurfaceInRect] {
        for surface in SURFACES {
            for rect in RECTS {
                let once = fit_to_surface(rect, surface, mode).unwrap().rect;
                let twice = fit_to_surface(once, surface, mode).unwrap().rect;
                rect_close(once, twice, 1e-9);
            }
        }
    }
}
