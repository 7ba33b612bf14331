use clap::Parser;
use crossterm::event::{KeyCode, KeyModifiers};
use emotion_canvas::app::{build_detector, canvas_size, capture_size, handle_key, status_line, KeyAction, HUD_ROWS};
use emotion_canvas::config::{CaptureMode, Config, DetectorMode, RendererMode, MIN_BRUSH_SCALE};
use emotion_canvas::detector::MoodPad;
use emotion_canvas::expression::{ExpressionScores, ExpressionSnapshot};
use emotion_canvas::painter::FrameStats;
use std::path::PathBuf;
use std::time::Duration;

fn parse(args: &[&str]) -> Config {
    let mut argv = vec!["emotion-canvas"];
    argv.extend_from_slice(args);
    Config::try_parse_from(argv).expect("valid arguments")
}

#[test]
fn defaults_match_the_installation_timings() {
    let cfg = parse(&[]);
    assert_eq!(cfg.fps, 60);
    assert_eq!(cfg.refresh_ms, 50);
    assert_eq!(cfg.intro_ms, 12_000);
    assert_eq!(cfg.fade_start_ms, 5_000);
    assert_eq!(cfg.fade_end_ms, 10_000);
    assert_eq!(cfg.renderer, RendererMode::HalfBlock);
    assert_eq!(cfg.capture, CaptureMode::Synthetic);
    assert_eq!(cfg.detector, DetectorMode::Pad);
    assert_eq!(cfg.brush_scale, 0.25);
    assert!(!cfg.clamp_blend);
    assert!(cfg.sync_updates);
    assert_eq!(cfg.seed, None);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.refresh_delay(), Duration::from_millis(50));
    let budget = cfg.frame_budget().as_secs_f32();
    assert!((budget - 1.0 / 60.0).abs() < 1e-4);
}

#[test]
fn flags_and_aliases_override_defaults() {
    let cfg = parse(&[
        "--renderer",
        "braille",
        "--detector",
        "keys",
        "--capture",
        "image",
        "--image",
        "face.png",
        "--seed",
        "7",
        "--sync-updates",
        "false",
        "--clamp-blend",
        "--brush-scale",
        "0.5",
    ]);
    assert_eq!(cfg.renderer, RendererMode::Braille);
    assert_eq!(cfg.detector, DetectorMode::Pad);
    assert_eq!(cfg.capture, CaptureMode::Still);
    assert_eq!(cfg.image, Some(PathBuf::from("face.png")));
    assert_eq!(cfg.seed, Some(7));
    assert!(!cfg.sync_updates);
    assert!(cfg.clamp_blend);
    assert_eq!(cfg.brush_scale, 0.5);
    assert!(cfg.validate().is_ok());

    assert_eq!(parse(&["--renderer", "hb"]).renderer, RendererMode::HalfBlock);
    assert_eq!(parse(&["--renderer", "half-block"]).renderer, RendererMode::HalfBlock);
    assert_eq!(parse(&["--renderer", "text"]).renderer, RendererMode::Ascii);
}

#[test]
fn unknown_renderer_is_rejected_by_the_parser() {
    assert!(Config::try_parse_from(["emotion-canvas", "--renderer", "kitty"]).is_err());
}

#[test]
fn validate_rejects_unusable_settings() {
    for args in [
        &["--fps", "0"][..],
        &["--refresh-ms", "0"],
        &["--brush-scale", "0"],
        &["--brush-scale", "0.0001"],
        &["--brush-scale", "0.049"],
        &["--fade-start-ms", "6000", "--fade-end-ms", "6000"],
        &["--capture", "still"],
        &["--detector", "script"],
    ] {
        let cfg = parse(args);
        assert!(cfg.validate().is_err(), "{args:?} should be rejected");
    }
}

#[test]
fn pixels_per_cell_matches_renderer_geometry() {
    assert_eq!(RendererMode::HalfBlock.pixels_per_cell(), (1, 2));
    assert_eq!(RendererMode::Braille.pixels_per_cell(), (2, 4));
    assert_eq!(RendererMode::Ascii.pixels_per_cell(), (1, 1));
}

#[test]
fn canvas_leaves_room_for_the_hud() {
    assert_eq!(HUD_ROWS, 2);
    assert_eq!(canvas_size((80, 24), 1, 2), (80, 44));
    assert_eq!(canvas_size((80, 24), 2, 4), (160, 88));
    assert_eq!(canvas_size((10, 1), 1, 1), (10, 1));
}

#[test]
fn capture_is_canvas_divided_by_brush_scale() {
    assert_eq!(capture_size(80, 44, 0.25), (320, 176));
    assert_eq!(capture_size(80, 44, 1.0), (80, 44));
    assert_eq!(capture_size(0, 0, 0.5), (1, 1));
}

#[test]
fn tiny_brush_scale_cannot_blow_up_the_capture() {
    assert!(parse(&["--brush-scale", "0.05"]).validate().is_ok());
    assert!(parse(&["--brush-scale", "0.0001"]).validate().is_err());

    // Same floor as validation: at most 20x the canvas per axis.
    assert_eq!(capture_size(200, 96, MIN_BRUSH_SCALE), (4_000, 1_920));
    assert_eq!(capture_size(200, 96, 0.0001), (4_000, 1_920));
    assert_eq!(capture_size(200, 96, f32::NAN), (200, 96));
}

#[test]
fn detector_built_from_config() {
    let pad = MoodPad::new();
    assert_eq!(build_detector(&parse(&[]), &pad).expect("pad").name(), "pad");
    assert_eq!(build_detector(&parse(&["--detector", "drift"]), &pad).expect("drift").name(), "drift");
    assert!(build_detector(&parse(&["--detector", "script"]), &pad).is_err());
    assert!(build_detector(
        &parse(&["--detector", "script", "--script", "/nonexistent/moods.txt"]),
        &pad
    )
    .is_err());
}

#[test]
fn keys_drive_the_mood_pad() {
    let pad = MoodPad::new();
    let none = KeyModifiers::NONE;
    assert_eq!(handle_key(KeyCode::Char('q'), none, &pad), KeyAction::Quit);
    assert_eq!(handle_key(KeyCode::Esc, none, &pad), KeyAction::Quit);
    assert_eq!(handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL, &pad), KeyAction::Quit);
    assert_eq!(handle_key(KeyCode::Char('i'), none, &pad), KeyAction::ToggleHud);

    assert_eq!(handle_key(KeyCode::Char('3'), none, &pad), KeyAction::None);
    assert!((pad.scores().angry - 0.1).abs() < 1e-6);
    handle_key(KeyCode::Char('0'), none, &pad);
    assert_eq!(pad.scores(), ExpressionScores::new(0.0, 1.0, 0.0, 0.0));

    handle_key(KeyCode::Char('f'), none, &pad);
    assert!(!pad.face_visible());
    assert_eq!(handle_key(KeyCode::Char('z'), none, &pad), KeyAction::None);
}

#[test]
fn status_line_reports_expression_state() {
    let stats = FrameStats {
        sampled: 12,
        curves: 7,
        dots: 3,
        ..FrameStats::default()
    };
    let snap = ExpressionSnapshot::from_scores(ExpressionScores::new(0.0, 0.0, 1.0, 0.0));
    let line = status_line("painting", Some(&snap), &stats, 59.9, "pad", Some(true));
    assert!(line.starts_with("e.motion | painting"));
    assert!(line.contains("Turb:  1.00"), "{line}");
    assert!(line.contains("A 1.00"));
    assert!(line.contains("Strokes:   10"));
    assert!(line.contains("Det: pad (face)"));
    assert!(line.contains("FPS: 59.9"));

    let empty = status_line("intro", None, &FrameStats::default(), 0.0, "drift", None);
    assert!(empty.contains("no expression data"));
    assert!(empty.contains("Det: drift |"));
}
