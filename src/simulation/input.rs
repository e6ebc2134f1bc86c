//! Keyboard sampling for the four drive controls.

use bevy::prelude::*;

/// Held state of the drive controls, sampled once per frame.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriveInput {
    pub accelerate: bool,
    pub brake: bool,
    pub steer_left: bool,
    pub steer_right: bool,
}

/// Key bindings for the drive controls. Any bound key counts as held.
#[derive(Resource, Clone, Debug)]
pub struct DriveBindings {
    pub accelerate: Vec<KeyCode>,
    pub brake: Vec<KeyCode>,
    pub steer_left: Vec<KeyCode>,
    pub steer_right: Vec<KeyCode>,
}

impl Default for DriveBindings {
    fn default() -> Self {
        Self {
            accelerate: vec![KeyCode::ArrowUp, KeyCode::KeyW],
            brake: vec![KeyCode::ArrowDown, KeyCode::KeyS],
            steer_left: vec![KeyCode::ArrowLeft, KeyCode::KeyA],
            steer_right: vec![KeyCode::ArrowRight, KeyCode::KeyD],
        }
    }
}

impl DriveInput {
    /// Read the current held state. Last state wins; nothing is queued.
    pub fn sample(keys: &ButtonInput<KeyCode>, bindings: &DriveBindings) -> Self {
        Self {
            accelerate: keys.any_pressed(bindings.accelerate.iter().copied()),
            brake: keys.any_pressed(bindings.brake.iter().copied()),
            steer_left: keys.any_pressed(bindings.steer_left.iter().copied()),
            steer_right: keys.any_pressed(bindings.steer_right.iter().copied()),
        }
    }
}

pub(super) fn sample_drive_input(
    keys: Res<ButtonInput<KeyCode>>,
    bindings: Res<DriveBindings>,
    mut input: ResMut<DriveInput>,
) {
    let sampled = DriveInput::sample(&keys, &bindings);
    // Avoid tripping change detection when nothing moved
    input.set_if_neq(sampled);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_and_letter_bindings_both_count() {
        let bindings = DriveBindings::default();
        let mut keys = ButtonInput::<KeyCode>::default();

        keys.press(KeyCode::ArrowUp);
        keys.press(KeyCode::KeyA);
        let input = DriveInput::sample(&keys, &bindings);
        assert!(input.accelerate);
        assert!(input.steer_left);
        assert!(!input.brake);
        assert!(!input.steer_right);

        keys.release(KeyCode::ArrowUp);
        keys.press(KeyCode::KeyS);
        let input = DriveInput::sample(&keys, &bindings);
        assert!(!input.accelerate);
        assert!(input.brake);
    }

    #[test]
    fn nothing_held_is_default() {
        let keys = ButtonInput::<KeyCode>::default();
        let input = DriveInput::sample(&keys, &DriveBindings::default());
        assert_eq!(input, DriveInput::default());
    }
}
