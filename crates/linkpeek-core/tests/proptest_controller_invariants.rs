//! Property-based invariant tests for the preview controller.
//!
//! These tests verify the structural invariants of `PreviewController`:
//!
//! 1. Movement that never exceeds the drag threshold opens no preview
//! 2. Crossing the threshold opens exactly one preview
//! 3. A freshly opened window lies inside the viewport and is never below
//!    the minimum size
//! 4. Repeated opens always leave exactly one window
//! 5. `close` is idempotent
//! 6. Arbitrary event sequences never leave more than one window, and a
//!    click is never suppressed more often than a preview was produced
//! 7. Settings survive a save/load round trip

use linkpeek_core::{
    ClickDecision, GestureMode, HostCommand, Key, LinkTarget, MemoryStore, Point, PointerButtons,
    PointerDown, PreviewController, Settings, SettingsStore, Size, TimerKind, TimerToken,
    settings,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const LINK: &str = "https://example.com/article";

fn controller(viewport: Size) -> PreviewController<MemoryStore> {
    let mut c = PreviewController::new(MemoryStore::new());
    c.set_viewport(viewport);
    c
}

fn press(x: f64, y: f64) -> PointerDown {
    PointerDown {
        pos: Point::new(x, y),
        buttons: PointerButtons::PRIMARY,
        link: Some(LinkTarget::anchor(LINK)),
        inside_preview: false,
    }
}

fn mounts(cmds: &[HostCommand]) -> usize {
    cmds.iter()
        .filter(|cmd| matches!(cmd, HostCommand::MountWindow(_)))
        .count()
}

fn removals(cmds: &[HostCommand]) -> usize {
    cmds.iter()
        .filter(|cmd| matches!(cmd, HostCommand::RemoveWindow))
        .count()
}

fn viewport_strategy() -> impl Strategy<Value = Size> {
    (300u32..2560, 200u32..1600).prop_map(|(w, h)| Size::new(f64::from(w), f64::from(h)))
}

/// Whole and half pixels, as produced by layout.
fn pixels(max: u32) -> impl Strategy<Value = f64> {
    (2u32..max * 2).prop_map(|halves| f64::from(halves) / 2.0)
}

fn anchor_strategy() -> impl Strategy<Value = Point> {
    (-4000.0f64..4000.0, -4000.0f64..4000.0).prop_map(|(x, y)| Point::new(x, y))
}

/// Events a page can deliver to the controller.
#[derive(Debug, Clone)]
enum Op {
    Down(f64, f64),
    Move(f64, f64),
    Up,
    FireHold,
    FireSettle,
    Click(bool),
    Escape,
    Toggle,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0.0f64..1000.0, 0.0f64..700.0).prop_map(|(x, y)| Op::Down(x, y)),
        (0.0f64..1000.0, 0.0f64..700.0).prop_map(|(x, y)| Op::Move(x, y)),
        Just(Op::Up),
        Just(Op::FireHold),
        Just(Op::FireSettle),
        any::<bool>().prop_map(Op::Click),
        Just(Op::Escape),
        Just(Op::Toggle),
    ]
}

fn fire(c: &mut PreviewController<MemoryStore>, kind: TimerKind) -> Vec<HostCommand> {
    match c.gesture().session_id() {
        Some(session) => c.on_timer(TimerToken::new(kind, session.get())),
        None => Vec::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 1-2. Threshold classification
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn movement_within_threshold_opens_nothing(
        moves in prop::collection::vec((-1.0f64..1.0, -1.0f64..1.0), 1..40),
    ) {
        let mut c = controller(Size::new(1280.0, 800.0));
        let threshold = c.settings().drag_threshold;
        let start = Point::new(400.0, 300.0);
        let mut cmds = c.on_pointer_down(&press(start.x, start.y));
        for (dx, dy) in moves {
            // Scaled to stay just short of the threshold.
            let len = dx.hypot(dy).max(1.0);
            let reach = threshold * 0.99;
            let pos = Point::new(start.x + dx / len * reach, start.y + dy / len * reach);
            cmds.extend(c.on_pointer_move(pos));
        }
        cmds.extend(c.on_pointer_up());
        prop_assert_eq!(mounts(&cmds), 0);
        prop_assert!(!cmds.contains(&HostCommand::PreventDefault));
        prop_assert_eq!(c.on_click(true), ClickDecision::PassThrough);
    }

    #[test]
    fn crossing_threshold_opens_exactly_one_preview(
        dx in 31.0f64..400.0,
        extra in prop::collection::vec((0.0f64..800.0, 0.0f64..600.0), 0..10),
    ) {
        let mut c = controller(Size::new(1280.0, 800.0));
        let mut cmds = c.on_pointer_down(&press(100.0, 100.0));
        cmds.extend(c.on_pointer_move(Point::new(100.0 + dx, 100.0)));
        for (x, y) in extra {
            cmds.extend(c.on_pointer_move(Point::new(x, y)));
        }
        cmds.extend(c.on_pointer_up());
        prop_assert_eq!(mounts(&cmds), 1);
        prop_assert_eq!(c.on_click(true), ClickDecision::Suppress);
        prop_assert_eq!(c.on_click(true), ClickDecision::PassThrough);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3-5. Window placement and singleton lifecycle
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn opened_window_fits_viewport_and_minimum(
        viewport in viewport_strategy(),
        anchor in anchor_strategy(),
    ) {
        let mut c = controller(viewport);
        c.open(LINK, anchor);
        let rect = c.window().map(|w| w.rect()).unwrap_or_default();
        let min = c.settings().min_size();
        prop_assert!(rect.fits_in(viewport), "{rect:?} outside {viewport:?}");
        prop_assert!(rect.width >= min.width && rect.height >= min.height);
    }

    #[test]
    fn repeated_opens_leave_one_window(
        anchors in prop::collection::vec(anchor_strategy(), 1..12),
    ) {
        let mut c = controller(Size::new(1280.0, 800.0));
        let mut cmds = Vec::new();
        for anchor in anchors {
            cmds.extend(c.open(LINK, anchor));
        }
        prop_assert_eq!(mounts(&cmds) - removals(&cmds), 1);
        prop_assert!(c.window().is_some());
    }

    #[test]
    fn close_is_idempotent(opens in 0usize..4, closes in 1usize..5) {
        let mut c = controller(Size::new(1280.0, 800.0));
        for i in 0..opens {
            c.open(LINK, Point::new(i as f64 * 10.0, 0.0));
        }
        let first = c.close();
        prop_assert_eq!(removals(&first), usize::from(opens > 0));
        for _ in 1..closes {
            prop_assert!(c.close().is_empty());
        }
        prop_assert!(c.window().is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 6. Arbitrary event sequences
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn arbitrary_sequences_keep_singleton_and_bounded_suppression(
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let mut c = controller(Size::new(1280.0, 800.0));
        let mut live = 0usize;
        let mut opened = 0usize;
        let mut suppressed = 0usize;
        for op in ops {
            let cmds = match op {
                Op::Down(x, y) => c.on_pointer_down(&press(x, y)),
                Op::Move(x, y) => c.on_pointer_move(Point::new(x, y)),
                Op::Up => c.on_pointer_up(),
                Op::FireHold => fire(&mut c, TimerKind::Hold),
                Op::FireSettle => fire(&mut c, TimerKind::Settle),
                Op::Click(on_link) => {
                    if c.on_click(on_link) == ClickDecision::Suppress {
                        suppressed += 1;
                    }
                    Vec::new()
                }
                Op::Escape => c.on_key(Key::Escape),
                Op::Toggle => c.toggle_mode(),
            };
            for cmd in &cmds {
                match cmd {
                    HostCommand::MountWindow(_) => {
                        prop_assert_eq!(live, 0, "mounted over a live window");
                        live += 1;
                        opened += 1;
                    }
                    HostCommand::RemoveWindow => {
                        prop_assert_eq!(live, 1, "removed a missing window");
                        live -= 1;
                    }
                    _ => {}
                }
            }
            prop_assert_eq!(live == 1, c.window().is_some());
            prop_assert!(suppressed <= opened);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 7. Settings round trip
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn settings_round_trip(
        drag in any::<bool>(),
        width in pixels(4000),
        height in pixels(4000),
        min_width in pixels(1000),
        min_height in pixels(1000),
        threshold in pixels(200),
    ) {
        let record = Settings {
            drag_mode_enabled: drag,
            width,
            height,
            min_width,
            min_height,
            drag_threshold: threshold,
        };
        let mut store = MemoryStore::new();
        settings::save(&mut store, &record).unwrap();
        prop_assert!(store.read().unwrap().is_some());
        prop_assert_eq!(settings::load(&store), record);
    }

    #[test]
    fn mode_toggle_persists(toggles in 1usize..6) {
        let mut c = controller(Size::new(1280.0, 800.0));
        for _ in 0..toggles {
            c.toggle_mode();
        }
        let expected = if toggles % 2 == 0 { GestureMode::Drag } else { GestureMode::Hold };
        let reloaded = settings::load(c.store());
        prop_assert_eq!(reloaded.gesture_mode(), expected);
    }
}
