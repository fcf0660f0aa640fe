use super::*;

#[test]
fn test_key_press_and_release_edges() {
    let mut input = InputState::new();

    input.process_key(KeyCode::Space, true);
    assert!(input.is_key_down(KeyCode::Space));
    assert!(input.key_pressed(KeyCode::Space));

    input.update();
    assert!(input.was_key_down(KeyCode::Space));
    assert!(!input.key_pressed(KeyCode::Space));

    input.process_key(KeyCode::Space, false);
    assert!(input.key_released(KeyCode::Space));

    input.update();
    assert!(!input.key_released(KeyCode::Space));
}

#[test]
fn test_mouse_buttons() {
    let mut input = InputState::new();
    input.process_button(MouseButton::Left, true);
    assert!(input.is_button_down(MouseButton::Left));
    assert!(!input.was_button_down(MouseButton::Left));

    input.update();
    assert!(input.was_button_down(MouseButton::Left));
}

#[test]
fn test_mouse_delta() {
    let mut input = InputState::new();
    input.process_mouse_move(10.0, 20.0);
    assert_eq!(input.mouse_delta(), Vec2::new(10.0, 20.0));

    input.update();
    assert_eq!(input.mouse_delta(), Vec2::ZERO);

    input.process_mouse_move(15.0, 18.0);
    assert_eq!(input.mouse_position(), Vec2::new(15.0, 18.0));
    assert_eq!(input.mouse_delta(), Vec2::new(5.0, -2.0));
}
