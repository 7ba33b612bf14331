use emotion_canvas::canvas::{RasterCanvas, Surface, TextAlign};
use emotion_canvas::capture::CaptureFrame;
use emotion_canvas::expression::{ExpressionScores, ExpressionSnapshot};
use emotion_canvas::painter::{
    intro_alpha, paint_stroke, DiagnosticsClock, FrameDriver, IntroTiming, Phase, QUOTE_LINE_1,
    QUOTE_LINE_2,
};
use emotion_canvas::palette::{PaletteMapper, Rgba};
use emotion_canvas::stroke::{StrokeParams, StrokeShape, StrokeSpec};
use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Cmd {
    Push,
    Pop,
    Translate(f32, f32),
    Rotate(f32),
    Scale(f32),
    Stroke(Rgba),
    Weight(f32),
    Fill(Rgba),
    Point,
    Curve([(f32, f32); 4]),
    Text { text: String, x: f32, y: f32, size: f32, align: TextAlign },
}

/// Surface that only records the commands issued against it.
struct Recorder {
    w: usize,
    h: usize,
    cmds: Vec<Cmd>,
    depth: i32,
}

impl Recorder {
    fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            cmds: Vec::new(),
            depth: 0,
        }
    }

    fn count(&self, pred: impl Fn(&Cmd) -> bool) -> usize {
        self.cmds.iter().filter(|&c| pred(c)).count()
    }

    fn points(&self) -> usize {
        self.count(|c| matches!(c, Cmd::Point))
    }

    fn curves(&self) -> usize {
        self.count(|c| matches!(c, Cmd::Curve(_)))
    }

    fn texts(&self) -> usize {
        self.count(|c| matches!(c, Cmd::Text { .. }))
    }
}

impl Surface for Recorder {
    fn width(&self) -> usize {
        self.w
    }
    fn height(&self) -> usize {
        self.h
    }
    fn push(&mut self) {
        self.depth += 1;
        self.cmds.push(Cmd::Push);
    }
    fn pop(&mut self) {
        self.depth -= 1;
        assert!(self.depth >= 0, "pop without push");
        self.cmds.push(Cmd::Pop);
    }
    fn translate(&mut self, dx: f32, dy: f32) {
        self.cmds.push(Cmd::Translate(dx, dy));
    }
    fn rotate(&mut self, radians: f32) {
        self.cmds.push(Cmd::Rotate(radians));
    }
    fn scale(&mut self, s: f32) {
        self.cmds.push(Cmd::Scale(s));
    }
    fn stroke(&mut self, color: Rgba) {
        self.cmds.push(Cmd::Stroke(color));
    }
    fn stroke_weight(&mut self, weight: f32) {
        self.cmds.push(Cmd::Weight(weight));
    }
    fn fill(&mut self, color: Rgba) {
        self.cmds.push(Cmd::Fill(color));
    }
    fn point(&mut self, _x: f32, _y: f32) {
        self.cmds.push(Cmd::Point);
    }
    fn curve(&mut self, pts: [(f32, f32); 4]) {
        self.cmds.push(Cmd::Curve(pts));
    }
    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, align: TextAlign) {
        self.cmds.push(Cmd::Text {
            text: text.to_string(),
            x,
            y,
            size,
            align,
        });
    }
}

fn driver(seed: u64, brush_scale: f32) -> FrameDriver {
    FrameDriver::new(
        IntroTiming::default(),
        PaletteMapper::default(),
        brush_scale,
        fastrand::Rng::with_seed(seed),
    )
}

fn snapshot(happy: f32, neutral: f32, angry: f32, sad: f32) -> Option<ExpressionSnapshot> {
    Some(ExpressionSnapshot::from_scores(ExpressionScores::new(happy, neutral, angry, sad)))
}

fn gray_capture(w: usize, h: usize) -> CaptureFrame {
    let mut frame = CaptureFrame::new(w, h);
    for px in frame.pixels.chunks_exact_mut(4) {
        px.copy_from_slice(&[128, 128, 128, 255]);
    }
    frame
}

const PAINTING: Duration = Duration::from_millis(12_000);

#[test]
fn intro_alpha_fades_between_five_and_ten_seconds() {
    assert_eq!(intro_alpha(0.0, 5000.0, 10000.0), 0.0);
    assert_eq!(intro_alpha(5000.0, 5000.0, 10000.0), 0.0);
    assert!((intro_alpha(7500.0, 5000.0, 10000.0) - 127.5).abs() < 1e-3);
    assert_eq!(intro_alpha(10000.0, 5000.0, 10000.0), 255.0);
    assert_eq!(intro_alpha(11500.0, 5000.0, 10000.0), 255.0);
}

#[test]
fn phase_switches_to_painting_at_intro_end() {
    let timing = IntroTiming::default();
    assert!(matches!(timing.phase_at(11_999.0), Phase::Intro { .. }));
    assert_eq!(timing.phase_at(12_000.0), Phase::Painting);
    assert_eq!(timing.phase_at(0.0).label(), "intro");
    assert_eq!(Phase::Painting.label(), "painting");
}

#[test]
fn intro_frame_draws_only_the_quote() {
    let mut d = driver(1, 0.25);
    let mut rec = Recorder::new(400, 300);
    let stats = d.frame(Duration::ZERO, &gray_capture(50, 50), snapshot(0.0, 0.0, 1.0, 0.0), &mut rec);

    assert_eq!(stats.quote_alpha, Some(0.0));
    assert_eq!(stats.painted(), 0);
    assert_eq!(rec.points() + rec.curves(), 0);
    assert!(matches!(rec.cmds[0], Cmd::Fill(c) if c.a == 0.0 && c.r == 255.0));

    let texts: Vec<_> = rec
        .cmds
        .iter()
        .filter_map(|c| match c {
            Cmd::Text { text, x, y, size, align } => Some((text.clone(), *x, *y, *size, *align)),
            _ => None,
        })
        .collect();
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0].0, QUOTE_LINE_1);
    assert_eq!(texts[1].0, QUOTE_LINE_2);
    assert_eq!((texts[0].1, texts[0].2), (200.0, 150.0 - 10.0));
    assert_eq!((texts[1].1, texts[1].2), (200.0, 150.0 + 10.0));
    assert_eq!(texts[0].3, 5.0);
    assert_eq!(texts[0].4, TextAlign::Center);
}

#[test]
fn quote_is_half_visible_mid_fade() {
    let mut d = driver(1, 1.0);
    let mut rec = Recorder::new(100, 100);
    let stats = d.frame(Duration::from_millis(7_500), &gray_capture(10, 10), None, &mut rec);
    let alpha = stats.quote_alpha.expect("intro frame");
    assert!((alpha - 127.5).abs() < 1e-2);
    assert!(matches!(rec.cmds[0], Cmd::Fill(c) if (c.a - 127.5).abs() < 1e-2));
}

#[test]
fn painting_frame_has_no_text() {
    let mut d = driver(2, 1.0);
    let mut rec = Recorder::new(100, 100);
    let stats = d.frame(PAINTING, &gray_capture(200, 200), snapshot(0.0, 1.0, 0.0, 0.0), &mut rec);
    assert_eq!(stats.quote_alpha, None);
    assert_eq!(rec.texts(), 0);
    assert!(stats.sampled > 0);
}

#[test]
fn calm_turbulence_paints_only_dots() {
    let mut d = driver(3, 1.0);
    let mut rec = Recorder::new(200, 200);
    // happy = 1 gives turbulence 0.
    let stats = d.frame(PAINTING, &gray_capture(200, 200), snapshot(1.0, 0.0, 0.0, 0.0), &mut rec);

    assert!(stats.sampled > 0);
    assert_eq!(stats.dots, stats.sampled);
    assert_eq!(stats.curves, 0);
    assert_eq!(rec.points(), stats.dots);
    assert_eq!(rec.curves(), 0);
    assert_eq!(rec.count(|c| matches!(c, Cmd::Rotate(_))), 0);
}

#[test]
fn agitated_turbulence_paints_only_rotated_curves() {
    let mut d = driver(4, 1.0);
    let mut rec = Recorder::new(200, 200);
    let stats = d.frame(PAINTING, &gray_capture(200, 200), snapshot(0.0, 0.0, 1.0, 0.0), &mut rec);

    assert!(stats.sampled > 0);
    assert_eq!(stats.curves, stats.sampled);
    assert_eq!(stats.dots, 0);
    assert_eq!(rec.curves(), stats.curves);
    assert_eq!(rec.points(), 0);
    for c in &rec.cmds {
        if let Cmd::Rotate(r) = c {
            assert!(r.abs() <= FRAC_PI_2 + 1e-5, "rotation {r}");
        }
    }
    assert_eq!(rec.count(|c| matches!(c, Cmd::Rotate(_))), stats.curves);
}

#[test]
fn missing_expression_data_skips_every_sample() {
    let mut d = driver(5, 1.0);
    let mut rec = Recorder::new(200, 200);
    let stats = d.frame(PAINTING, &gray_capture(300, 300), None, &mut rec);

    assert!(stats.sampled > 0);
    assert_eq!(stats.skipped_no_data, stats.sampled);
    assert_eq!(stats.painted(), 0);
    assert_eq!(stats.turbulence, None);
    assert_eq!(rec.points() + rec.curves() + rec.texts(), 0);
}

#[test]
fn roughly_one_pixel_in_a_thousand_is_sampled() {
    let mut d = driver(6, 1.0);
    let capture = gray_capture(500, 400);
    let mut total = 0;
    for _ in 0..20 {
        let mut rec = Recorder::new(10, 10);
        total += d.frame(PAINTING, &capture, None, &mut rec).sampled;
    }
    // 4M pixel visits at p = 0.001.
    assert!((3_600..=4_400).contains(&total), "sampled {total}");
}

#[test]
fn strokes_are_mirrored_and_centered() {
    let mut d = driver(7, 1.0);
    let capture = gray_capture(10, 6);
    let mut strokes = 0;
    for _ in 0..3_000 {
        let mut rec = Recorder::new(40, 30);
        let stats = d.frame(PAINTING, &capture, snapshot(1.0, 0.0, 0.0, 0.0), &mut rec);
        assert_eq!(rec.depth, 0);
        assert!(matches!(rec.cmds[0], Cmd::Push));
        assert!(matches!(rec.cmds[1], Cmd::Translate(x, y) if x == 20.0 && y == 15.0));

        for c in rec.cmds.iter().skip(2) {
            if let Cmd::Translate(dx, dy) = *c {
                // dx = cw - x - cw/2 for x in 0..10, dy = y - ch/2 for y in 0..6.
                assert_eq!(dx.fract(), 0.0);
                assert_eq!(dy.fract(), 0.0);
                assert!((-4.0..=5.0).contains(&dx), "dx {dx}");
                assert!((-3.0..=2.0).contains(&dy), "dy {dy}");
            }
        }
        strokes += stats.painted();
    }
    assert!(strokes > 50, "only {strokes} strokes");
}

#[test]
fn brush_scale_is_applied_after_centering() {
    let mut d = driver(8, 0.25);
    let mut rec = Recorder::new(40, 30);
    d.frame(PAINTING, &gray_capture(4, 4), None, &mut rec);
    assert!(matches!(rec.cmds[1], Cmd::Translate(x, y) if x == 20.0 && y == 15.0));
    assert!(matches!(rec.cmds[2], Cmd::Scale(s) if s == 0.25));
}

#[test]
fn stroke_color_carries_turbulence_alpha() {
    let mut d = driver(9, 1.0);
    let mut rec = Recorder::new(100, 100);
    let stats = d.frame(PAINTING, &gray_capture(200, 200), snapshot(0.0, 0.0, 1.0, 0.0), &mut rec);
    assert!(stats.sampled > 0);
    let expected = StrokeParams::from_turbulence(1.0).alpha;
    for c in &rec.cmds {
        if let Cmd::Stroke(color) = c {
            assert!((color.a - expected).abs() < 1e-4);
        }
    }
}

#[test]
fn stroke_params_follow_turbulence() {
    let calm = StrokeParams::from_turbulence(0.0);
    assert_eq!(calm.length_mid, 10.0);
    assert_eq!(calm.thickness_mid, 5.0);
    assert_eq!(calm.alpha, 70.0);
    assert!(!calm.draws_curves());

    let wild = StrokeParams::from_turbulence(1.0);
    assert_eq!(wild.length_mid, 100.0);
    assert_eq!(wild.thickness_mid, 35.0);
    assert_eq!(wild.alpha, 15.0);
    assert_eq!(wild.curve_odds, 10_000.0);
    assert!(wild.draws_curves());

    assert!(!StrokeParams::from_turbulence(0.2).draws_curves());
}

#[test]
fn sampled_strokes_stay_within_their_windows() {
    let params = StrokeParams::from_turbulence(0.5);
    let mapper = PaletteMapper::default();
    let mut rng = fastrand::Rng::with_seed(10);
    let mut with_tangents = 0;
    let n = 10_000;
    for _ in 0..n {
        let s = StrokeSpec::sample(&params, 100.0, &mapper, &mut rng);
        assert!(s.length >= params.length_mid - 30.0 && s.length < params.length_mid);
        assert!(s.thickness >= params.thickness_mid - 2.0 && s.thickness < params.thickness_mid);
        assert!(s.tangent1.abs() <= s.length && s.tangent2.abs() <= s.length);
        match s.shape {
            StrokeShape::Curve { rotation_deg } => assert!(rotation_deg.abs() <= 90.0),
            StrokeShape::Dot => panic!("turbulence 0.5 must draw curves"),
        }
        if s.tangent1 != 0.0 || s.tangent2 != 0.0 {
            with_tangents += 1;
        }
    }
    let share = with_tangents as f32 / n as f32;
    assert!((0.66..=0.74).contains(&share), "tangent share {share}");
}

#[test]
fn curve_control_points_span_the_length() {
    let spec = StrokeSpec {
        length: 20.0,
        thickness: 4.0,
        tangent1: 3.0,
        tangent2: -4.0,
        alpha: 50.0,
        color: Rgba::new(1.0, 2.0, 3.0, 50.0),
        shape: StrokeShape::Curve { rotation_deg: 0.0 },
    };
    assert_eq!(spec.control_points(), [(3.0, -20.0), (0.0, -10.0), (0.0, 10.0), (-4.0, 20.0)]);
    assert_eq!(spec.weight(), 4.0);

    let dot = StrokeSpec {
        shape: StrokeShape::Dot,
        ..spec
    };
    assert_eq!(dot.weight(), 12.0);

    let mut rec = Recorder::new(10, 10);
    paint_stroke(&dot, &mut rec);
    assert!(matches!(rec.cmds[1], Cmd::Weight(w) if w == 12.0));
    assert_eq!(rec.points(), 1);
}

#[test]
fn diagnostics_fire_once_per_interval() {
    let mut clock = DiagnosticsClock::new(Duration::from_millis(50));
    assert!(clock.due(50.0));
    assert!(!clock.due(80.0));
    assert!(clock.due(100.0));
    assert!(!clock.due(149.0));
    // Reporting without data only logs.
    clock.report(200.0, None);
    assert!(!clock.due(220.0));
}

fn white(alpha: f32) -> Rgba {
    Rgba::new(255.0, 255.0, 255.0, alpha)
}

#[test]
fn new_canvas_is_opaque_black() {
    let canvas = RasterCanvas::new(8, 4);
    assert_eq!(canvas.width(), 8);
    assert_eq!(canvas.height(), 4);
    assert_eq!(canvas.pixels().len(), 8 * 4 * 4);
    assert_eq!(canvas.pixel(7, 3), [0, 0, 0, 255]);
}

#[test]
fn point_covers_a_round_dot() {
    let mut canvas = RasterCanvas::new(20, 20);
    canvas.stroke(white(255.0));
    canvas.stroke_weight(5.0);
    canvas.point(10.0, 10.0);
    assert_eq!(canvas.pixel(10, 10), [255, 255, 255, 255]);
    assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 255]);
    assert_eq!(canvas.pixel(18, 10), [0, 0, 0, 255]);
}

#[test]
fn one_mark_blends_each_pixel_once() {
    let mut canvas = RasterCanvas::new(40, 20);
    canvas.stroke(white(100.0));
    canvas.stroke_weight(6.0);
    let line = [(0.0, 10.0), (5.0, 10.0), (25.0, 10.0), (30.0, 10.0)];
    canvas.curve(line);
    assert_eq!(canvas.pixel(15, 10), [100, 100, 100, 255]);

    // A second mark accumulates over the first.
    canvas.curve(line);
    assert_eq!(canvas.pixel(15, 10), [161, 161, 161, 255]);
}

#[test]
fn rotation_turns_vertical_curve_horizontal() {
    let mut canvas = RasterCanvas::new(40, 40);
    canvas.stroke(white(255.0));
    canvas.stroke_weight(2.0);
    canvas.push();
    canvas.translate(20.0, 20.0);
    canvas.rotate(FRAC_PI_2);
    canvas.curve([(0.0, -10.0), (0.0, -5.0), (0.0, 5.0), (0.0, 10.0)]);
    canvas.pop();

    assert_eq!(canvas.pixel(20, 20)[0], 255);
    assert_eq!(canvas.pixel(17, 20)[0], 255);
    assert_eq!(canvas.pixel(20, 14)[0], 0);
    assert_eq!(canvas.pixel(20, 26)[0], 0);
}

#[test]
fn pop_restores_transform_and_style() {
    let mut canvas = RasterCanvas::new(20, 20);
    canvas.stroke(white(255.0));
    canvas.stroke_weight(3.0);
    canvas.push();
    canvas.translate(100.0, 100.0);
    canvas.stroke_weight(0.0);
    assert_eq!(canvas.stack_depth(), 1);
    canvas.pop();
    assert_eq!(canvas.stack_depth(), 0);

    canvas.point(3.0, 3.0);
    assert_eq!(canvas.pixel(3, 3), [255, 255, 255, 255]);

    // Unbalanced pop is ignored.
    canvas.pop();
    assert_eq!(canvas.stack_depth(), 0);
}

#[test]
fn non_positive_weight_draws_nothing() {
    let mut canvas = RasterCanvas::new(10, 10);
    canvas.stroke(white(255.0));
    for w in [0.0, -4.0] {
        canvas.stroke_weight(w);
        canvas.point(5.0, 5.0);
        canvas.curve([(0.0, 0.0), (1.0, 1.0), (8.0, 8.0), (9.0, 9.0)]);
    }
    assert!(canvas.pixels().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
}

#[test]
fn text_is_drawn_above_the_baseline() {
    let mut canvas = RasterCanvas::new(40, 30);
    canvas.fill(white(255.0));
    canvas.text("I", 20.0, 20.0, 5.0, TextAlign::Left);
    let lit = (15..20)
        .flat_map(|y| (20..23).map(move |x| (x, y)))
        .filter(|&(x, y)| canvas.pixel(x, y)[0] == 255)
        .count();
    assert!(lit > 0);
    assert!((0..30).all(|y| canvas.pixel(5, y)[0] == 0));
    assert!((20..30).all(|y| (0..40).all(|x| canvas.pixel(x, y)[0] == 0)));
}

#[test]
fn marks_persist_until_resize() {
    let mut canvas = RasterCanvas::new(20, 20);
    canvas.stroke(white(255.0));
    canvas.stroke_weight(4.0);
    canvas.point(5.0, 5.0);
    canvas.reset_state();
    assert_eq!(canvas.pixel(5, 5), [255, 255, 255, 255]);

    canvas.resize(6, 6);
    assert_eq!(canvas.width(), 6);
    assert!(canvas.pixels().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
}

#[test]
fn painting_onto_raster_leaves_marks() {
    let mut d = driver(11, 1.0);
    let mut canvas = RasterCanvas::new(200, 200);
    let capture = gray_capture(200, 200);
    let mut painted = 0;
    for _ in 0..5 {
        canvas.reset_state();
        painted += d.frame(PAINTING, &capture, snapshot(1.0, 0.0, 0.0, 0.0), &mut canvas).painted();
    }
    assert!(painted > 0);
    assert_eq!(canvas.stack_depth(), 0);
    assert!(canvas.pixels().chunks_exact(4).any(|p| p[..3] != [0, 0, 0]));
}
