#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// Tool / ToolType
// =============================================================

#[test]
fn tool_default_is_pen() {
    assert_eq!(Tool::default(), Tool::Pen);
}

#[test]
fn tool_ink_modes() {
    assert_eq!(Tool::Pen.ink_mode(), Some(InkMode::Pen));
    assert_eq!(Tool::Magic.ink_mode(), Some(InkMode::Magic));
    assert_eq!(Tool::Eraser.ink_mode(), None);
}

#[test]
fn tool_type_pen_detection() {
    assert!(ToolType::Stylus.is_pen());
    assert!(ToolType::Eraser.is_pen());
    assert!(!ToolType::Finger.is_pen());
}

// =============================================================
// PointerEvent
// =============================================================

#[test]
fn single_down_lists_its_own_pointer() {
    let e = PointerEvent::single(PointerAction::Down, ToolType::Stylus, Point::new(3.0, 4.0), 0.7);
    assert_eq!(e.pointer_count(), 1);
    assert_eq!(e.pointers[0], Point::new(3.0, 4.0));
}

#[test]
fn single_up_has_no_remaining_pointers() {
    let e = PointerEvent::single(PointerAction::Up, ToolType::Finger, Point::new(3.0, 4.0), 1.0);
    assert_eq!(e.pointer_count(), 0);
    assert!(e.pinch_pair().is_none());
}

#[test]
fn multi_event_exposes_pinch_pair() {
    let e = PointerEvent::multi(
        PointerAction::Move,
        ToolType::Finger,
        vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 5.0)],
    );
    assert_eq!(e.position, Point::new(0.0, 0.0));
    assert_eq!(e.pinch_pair(), Some((Point::new(0.0, 0.0), Point::new(10.0, 0.0))));
}

#[test]
fn pointer_event_deserializes_with_defaults() {
    let e: PointerEvent = serde_json::from_value(serde_json::json!({
        "action": "pointer_down",
        "tool": "finger",
        "position": { "x": 1.0, "y": 2.0 }
    }))
    .unwrap();
    assert_eq!(e.action, PointerAction::PointerDown);
    assert_eq!(e.pressure, 1.0);
    assert!(e.pointers.is_empty());
}

// =============================================================
// InputState
// =============================================================

#[test]
fn input_state_default_is_idle() {
    assert!(matches!(InputState::default(), InputState::Idle));
    assert_eq!(InputState::default().name(), "idle");
}

#[test]
fn pinch_state_measures_pair() {
    let state = InputState::pinch(Point::new(0.0, 0.0), Point::new(6.0, 8.0));
    let InputState::Pinching { last_distance, last_center } = state else {
        panic!("expected pinching");
    };
    assert!((last_distance - 10.0).abs() < 1e-12);
    assert_eq!(last_center, Point::new(3.0, 4.0));
}

#[test]
fn input_error_messages() {
    assert_eq!(InputError::PinchPointerMissing(1).to_string(), "pinch requires two pointers, got 1");
    assert!(InputError::UnexpectedDown("drawing").to_string().contains("drawing"));
}
