//! Scenario tests for the traversal controller, driven by scripted frames and a
//! recording input dispatcher.

use crate::automation::{
    AutomationContext, NodeState, TraversalController, TraversalReport, TraversalState,
};
use crate::config::{AutomationConfig, MatchingAlgorithm, TraversalMode};
use crate::device::{
    CaptureRegion, Frame, Position, RecordedAction, RecordingDispatcher, ReplayCapture,
    ScrollDirection, StaticWindow,
};
use crate::templates::{SemanticClass, Template, TemplateStore};
use crate::test_support::{GLYPH, glyph, scene};
use image::RgbImage;
use std::path::Path;

const FILTER: u32 = 101;
const MENU: u32 = 102;
const CLOSED: u32 = 103;
const OPEN: u32 = 104;
const EDIT: u32 = 105;
const DRAW: u32 = 106;
const CHECK: u32 = 107;
const SURE: u32 = 108;
const CHILD: u32 = 109;

const WIDTH: u32 = 200;
const HALF: i32 = (GLYPH / 2) as i32;

// Footprint centres of the fixed UI elements
const FILTER_AT: Position = Position { x: 4 + HALF, y: 4 + HALF };
const MENU_AT: Position = Position { x: 60 + HALF, y: 4 + HALF };
const EDIT_AT: Position = Position { x: 150 + HALF, y: 4 + HALF };
const DRAW_AT: Position = Position { x: 150 + HALF, y: 40 + HALF };
const CHECK_AT: Position = Position { x: 150 + HALF, y: 80 + HALF };

fn template(name: &str, seed: u32, class: SemanticClass) -> Template {
    Template::new(name, glyph(seed), class, 0.8)
}

fn store_with(names: &[&str]) -> TemplateStore {
    let mut store = TemplateStore::new(Path::new("templates"));
    for name in names {
        let (seed, class) = match *name {
            "img_filter_icon" => (FILTER, SemanticClass::Icon),
            "grid_menu_option" => (MENU, SemanticClass::MenuItem),
            "attachment_node" => (CLOSED, SemanticClass::TreeNode),
            "attachment_node_open" => (OPEN, SemanticClass::TreeNode),
            "grid_edit" => (EDIT, SemanticClass::Button),
            "grid_draw" => (DRAW, SemanticClass::Button),
            "grid_check" => (CHECK, SemanticClass::Button),
            "draw_sure" => (SURE, SemanticClass::Button),
            _ => (CHILD, SemanticClass::ChildNode),
        };
        store.insert(template(name, seed, class));
    }
    store
}

fn full_store() -> TemplateStore {
    store_with(&[
        "img_filter_icon",
        "grid_menu_option",
        "attachment_node",
        "attachment_node_open",
        "grid_edit",
        "grid_draw",
        "grid_check",
    ])
}

fn config() -> AutomationConfig {
    AutomationConfig {
        click_delay: 0.0,
        operation_delay: 0.0,
        menu_delay: 0.0,
        matching_algorithm: MatchingAlgorithm::MultiMethod,
        ..AutomationConfig::default()
    }
}

/// Frame with the toolbar, chain buttons and optionally a parent node glyph whose
/// top-left corner is at (4, node_top)
fn screen(height: u32, node: Option<(u32, u32)>, extra: &[(&RgbImage, u32, u32)]) -> Frame {
    let glyphs: Vec<(RgbImage, u32, u32)> = [
        (FILTER, 4, 4),
        (MENU, 60, 4),
        (EDIT, 150, 4),
        (DRAW, 150, 40),
        (CHECK, 150, 80),
    ]
    .into_iter()
    .chain(node.map(|(seed, top)| (seed, 4, top)))
    .map(|(seed, x, y)| (glyph(seed), x, y))
    .collect();

    let mut items: Vec<(&RgbImage, u32, u32)> = glyphs.iter().map(|(g, x, y)| (g, *x, *y)).collect();
    items.extend_from_slice(extra);
    scene(WIDTH, height, &items)
}

fn run(
    context: &AutomationContext,
    capture: ReplayCapture,
    input: RecordingDispatcher,
    height: u32,
) -> (TraversalReport, RecordingDispatcher) {
    let window = StaticWindow::new("Spine", Some(CaptureRegion::new(0, 0, WIDTH, height)));
    let mut controller = TraversalController::new(context, capture, input, window);
    let report = controller.run();
    assert_eq!(controller.state(), report.final_state);
    let (_, input, _) = controller.into_parts();
    (report, input)
}

/// Child clicks are the clicks in the parent's column below the parent
fn child_ys(input: &RecordingDispatcher, parent_y: i32) -> Vec<i32> {
    input
        .clicks()
        .iter()
        .filter(|p| p.x == 4 + HALF && p.y > parent_y)
        .map(|p| p.y)
        .collect()
}

// ============================================================================
// Full walk
// ============================================================================

#[test]
fn test_full_walk_stops_when_children_leave_the_window() {
    let context = AutomationContext::new(config(), full_store());
    let frame = screen(130, Some((OPEN, 40)), &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(report.final_state, TraversalState::Done);
    let parent = report.parent.unwrap();
    assert_eq!(parent.state, NodeState::Open);
    assert!(!parent.assumed);
    assert_eq!(parent.position, Some(Position::new(4 + HALF, 40 + HALF)));

    // Parent centre y 48, rows of 20: 68, 88, 108, 128 fit; 148 is out of the window
    assert_eq!(child_ys(&input, 48), vec![68, 88, 108, 128]);
    assert_eq!(report.success_count, 4);
    assert_eq!(report.failure_count, 1);
    assert_eq!(report.children_visited, 5);
    assert!(report.success);

    let clicks = input.clicks();
    assert_eq!(clicks[0], FILTER_AT);
    assert_eq!(clicks[1], MENU_AT);
    assert_eq!(&clicks[2..5], &[Position::new(12, 68), EDIT_AT, DRAW_AT]);
}

#[test]
fn test_replay_bounds_end_the_walk_at_the_recording_edge() {
    // Wired like the CLI dry run: the window region comes from the first recording
    let context = AutomationContext::new(
        AutomationConfig {
            max_children: Some(40),
            ..config()
        },
        full_store(),
    );
    let capture = ReplayCapture::from_frames(vec![screen(130, Some((OPEN, 40)), &[])]);
    let window = StaticWindow::new("Spine", Some(capture.bounds().unwrap()));

    let mut controller =
        TraversalController::new(&context, capture, RecordingDispatcher::new(), window);
    let report = controller.run();

    assert_eq!(report.final_state, TraversalState::Done);
    assert_eq!(report.children_visited, 5, "Stopped by the budget, not max_children");
    assert_eq!(report.failure_count, 1);
    assert!(controller.input().clicks().iter().all(|p| p.y < 130));
}

#[test]
fn test_closed_parent_is_activated_first() {
    let context = AutomationContext::new(config(), full_store());
    let frame = screen(130, Some((CLOSED, 40)), &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(report.parent.unwrap().state, NodeState::Closed);
    assert_eq!(input.clicks()[2], Position::new(4 + HALF, 40 + HALF));
    assert_eq!(report.success_count, 4);
}

#[test]
fn test_direct_addressing_uses_display_scale() {
    let context = AutomationContext::new(
        AutomationConfig {
            node_height: 20,
            display_scale: 2.0,
            max_children: Some(4),
            ..config()
        },
        full_store(),
    );
    // Parent centre at y = 100
    let frame = screen(300, Some((OPEN, 92)), &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        300,
    );

    assert_eq!(child_ys(&input, 100), vec![140, 180, 220, 260]);
    assert_eq!(report.children_visited, 4);
    assert_eq!(report.failure_count, 0);
}

#[test]
fn test_pagination_scrolls_every_stride() {
    let context = AutomationContext::new(
        AutomationConfig {
            direct_children: 2,
            max_children: Some(6),
            ..config()
        },
        full_store(),
    );
    let frame = screen(300, Some((OPEN, 40)), &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        300,
    );

    // i=2 and i=5 scroll first; paginated rows are (i % 3) + 9
    assert_eq!(child_ys(&input, 48), vec![68, 88, 268, 228, 248, 268]);
    let scrolls = input.scrolls();
    assert_eq!(scrolls.len(), 2);
    assert!(scrolls.iter().all(|(d, _)| *d == ScrollDirection::Down));
    assert_eq!(report.success_count, 6);

    // The first scroll comes right before the third child's click
    let actions = input.actions();
    let scroll_at = actions
        .iter()
        .position(|a| matches!(a, RecordedAction::Scroll(..)))
        .unwrap();
    assert_eq!(actions[scroll_at + 1], RecordedAction::Click(Position::new(12, 268)));
}

#[test]
fn test_failed_scroll_switches_to_incrementing_offsets() {
    let context = AutomationContext::new(
        AutomationConfig {
            direct_children: 2,
            max_children: Some(6),
            ..config()
        },
        full_store(),
    );
    let frame = screen(300, Some((OPEN, 40)), &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new().with_scroll_default(false),
        300,
    );

    assert_eq!(child_ys(&input, 48), vec![68, 88, 108, 128, 148, 168]);
    assert_eq!(input.scrolls().len(), 1, "Scrolling is never retried");
    assert_eq!(report.success_count, 6);
}

// ============================================================================
// Failure budget
// ============================================================================

#[test]
fn test_budget_exhaustion_without_success() {
    // grid_draw is loaded but never on screen, so every chain fails
    let context = AutomationContext::new(config(), full_store());
    let frame = scene(
        WIDTH,
        130,
        &[
            (&glyph(FILTER), 4, 4),
            (&glyph(MENU), 60, 4),
            (&glyph(EDIT), 150, 4),
            (&glyph(OPEN), 4, 40),
        ],
    );

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(report.final_state, TraversalState::Done);
    assert_eq!(report.children_visited, 1);
    assert_eq!(report.failure_count, 1);
    assert!(!report.success);
    assert_eq!(child_ys(&input, 48), vec![68]);
}

#[test]
fn test_success_resets_consecutive_failures() {
    let context = AutomationContext::new(
        AutomationConfig {
            failure_budget_full_walk: 2,
            ..config()
        },
        full_store(),
    );
    let frame = screen(130, Some((OPEN, 40)), &[]);

    // Clicks: 0 filter, 1 menu, 2 child 0, 3 edit, 4 draw, 5 child 1
    let (report, _) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new().fail_click(5),
        130,
    );

    // Child 1 fails alone; children 4 and 5 fall outside the window and end the walk
    assert_eq!(report.success_count, 3);
    assert_eq!(report.failure_count, 3);
    assert_eq!(report.children_visited, 6);
    assert!(report.success);
}

#[test]
fn test_capture_failure_in_chain_counts_once() {
    let context = AutomationContext::new(config(), full_store());
    let frame = screen(130, Some((OPEN, 40)), &[]);

    // Captures: 0 filter, 1 menu, 2 parent, 3 first chain step
    let (report, _) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]).fail_on_call(3),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(report.final_state, TraversalState::Done);
    assert_eq!(report.failure_count, 1);
    assert_eq!(report.children_visited, 1);
    assert!(!report.success);
}

#[test]
fn test_optional_step_skipped_when_not_visible() {
    // draw_sure is loaded but absent from the screen
    let mut store = full_store();
    store.insert(template("draw_sure", SURE, SemanticClass::Button));
    let context = AutomationContext::new(
        AutomationConfig {
            max_children: Some(2),
            ..config()
        },
        store,
    );
    let frame = screen(130, Some((OPEN, 40)), &[]);

    let (report, _) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );
    assert_eq!(report.success_count, 2);
    assert_eq!(report.failure_count, 0);
}

// ============================================================================
// Aborts
// ============================================================================

#[test]
fn test_missing_required_templates_abort_before_input() {
    let context = AutomationContext::new(
        config(),
        store_with(&["grid_menu_option", "attachment_node", "grid_draw"]),
    );
    let frame = screen(130, Some((OPEN, 40)), &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(report.final_state, TraversalState::Aborted);
    let message = report.message.unwrap();
    assert!(message.contains("img_filter_icon.png"), "{}", message);
    assert!(message.contains("grid_edit.png"), "{}", message);
    assert!(!message.contains("grid_draw.png"));
    assert!(input.actions().is_empty());
    assert!(report.parent.is_none());
}

#[test]
fn test_capture_failure_in_required_stage_aborts() {
    let context = AutomationContext::new(config(), full_store());
    let frame = screen(130, Some((OPEN, 40)), &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]).fail_on_call(0),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(report.final_state, TraversalState::Aborted);
    assert!(input.actions().is_empty());
}

#[test]
fn test_invisible_filter_icon_aborts() {
    let context = AutomationContext::new(config(), full_store());
    let frame = scene(WIDTH, 130, &[(&glyph(OPEN), 4, 40)]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(report.final_state, TraversalState::Aborted);
    assert!(report.message.unwrap().contains("img_filter_icon"));
    assert!(input.clicks().is_empty());
}

// ============================================================================
// Unknown parent state
// ============================================================================

#[test]
fn test_unknown_parent_falls_back_to_assumed_open() {
    let context = AutomationContext::new(
        AutomationConfig {
            max_children: Some(1),
            ..config()
        },
        full_store(),
    );
    let frame = screen(130, None, &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );

    let parent = report.parent.unwrap();
    assert_eq!(parent.state, NodeState::Open);
    assert!(parent.assumed);
    assert_eq!(parent.confidence, 1.0);
    // Anchor is the last click (the grid menu option) shifted left by 40
    let shifted = Position::new(MENU_AT.x - 40, MENU_AT.y);
    assert_eq!(parent.position, Some(shifted));

    let scrolls = input.scrolls();
    assert_eq!(scrolls.len(), 10);
    assert!(scrolls.iter().all(|s| *s == (ScrollDirection::Up, shifted)));

    assert_eq!(report.final_state, TraversalState::Done);
    assert_eq!(report.children_visited, 1);
}

#[test]
fn test_recovery_retry_can_resolve_state() {
    let context = AutomationContext::new(config(), full_store());
    // Captures 0 and 1 show the toolbar, capture 2 has no node, the recapture does
    let toolbar = screen(130, None, &[]);
    let with_node = screen(130, Some((CLOSED, 40)), &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![toolbar.clone(), toolbar.clone(), toolbar, with_node]),
        RecordingDispatcher::new(),
        130,
    );

    let parent = report.parent.unwrap();
    assert_eq!(parent.state, NodeState::Closed);
    assert!(!parent.assumed);
    assert_eq!(input.scrolls().len(), 10);
}

#[test]
fn test_failed_recapture_during_recovery_aborts() {
    let context = AutomationContext::new(config(), full_store());
    // Captures 0 and 1 serve the toolbar, 2 finds no node, 3 is the recovery recapture
    let frame = screen(130, None, &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]).fail_on_call(3),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(report.final_state, TraversalState::Aborted);
    assert!(report.parent.is_none());
    assert!(report.message.unwrap().contains("scripted failure"));
    assert_eq!(input.scrolls().len(), 10);
    assert_eq!(input.clicks(), vec![FILTER_AT, MENU_AT], "No child is clicked");
    assert_eq!(report.children_visited, 0);
}

#[test]
fn test_unknown_parent_aborts_without_fallback() {
    let context = AutomationContext::new(
        AutomationConfig {
            assume_open_on_unknown: false,
            ..config()
        },
        full_store(),
    );
    let frame = screen(130, None, &[]);

    let (report, _) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(report.final_state, TraversalState::Aborted);
    assert_eq!(report.parent.unwrap().state, NodeState::Unknown);
    assert!(report.message.unwrap().contains("unknown"));
}

// ============================================================================
// Other traversal modes
// ============================================================================

#[test]
fn test_single_pass() {
    let context = AutomationContext::new(
        AutomationConfig {
            traversal_mode: TraversalMode::SinglePass,
            ..config()
        },
        full_store(),
    );
    let frame = screen(130, Some((OPEN, 40)), &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(
        &input.actions()[2..],
        &[
            RecordedAction::Click(Position::new(12, 68)),
            RecordedAction::SelectAll,
            RecordedAction::Click(CHECK_AT),
        ]
    );
    assert!(report.success);
    assert_eq!(report.children_visited, 1);
}

#[test]
fn test_single_pass_recovery_uses_short_scroll_count() {
    let context = AutomationContext::new(
        AutomationConfig {
            traversal_mode: TraversalMode::SinglePass,
            ..config()
        },
        full_store(),
    );
    let frame = screen(130, None, &[]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(input.scrolls().len(), 3);
    assert!(report.parent.unwrap().assumed);
}

#[test]
fn test_per_child_skips_missing_templates() {
    let mut store = full_store();
    store.insert(template("raptor-body", CHILD, SemanticClass::ChildNode));
    let context = AutomationContext::new(
        AutomationConfig {
            traversal_mode: TraversalMode::PerChild,
            child_templates: vec!["missing-child".to_string(), "raptor-body".to_string()],
            ..config()
        },
        store,
    );
    let child = glyph(CHILD);
    let frame = screen(130, Some((OPEN, 40)), &[(&child, 100, 100)]);

    let (report, input) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(report.children_visited, 1);
    assert_eq!(report.success_count, 1);
    assert_eq!(
        &input.clicks()[2..],
        &[Position::new(100 + HALF, 100 + HALF), EDIT_AT, DRAW_AT]
    );
}

#[test]
fn test_per_child_budget_of_two() {
    let mut store = full_store();
    for name in ["child-a", "child-b", "child-c"] {
        store.insert(template(name, CHILD, SemanticClass::ChildNode));
    }
    let context = AutomationContext::new(
        AutomationConfig {
            traversal_mode: TraversalMode::PerChild,
            child_templates: vec![
                "child-a".to_string(),
                "child-b".to_string(),
                "child-c".to_string(),
            ],
            ..config()
        },
        store,
    );
    // No child glyph on screen: each lookup fails
    let frame = screen(130, Some((OPEN, 40)), &[]);

    let (report, _) = run(
        &context,
        ReplayCapture::from_frames(vec![frame]),
        RecordingDispatcher::new(),
        130,
    );

    assert_eq!(report.failure_count, 2);
    assert_eq!(report.children_visited, 2);
    assert!(!report.success);
}
