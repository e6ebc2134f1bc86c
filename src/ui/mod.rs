//! Speedometer HUD and pause banner.

use bevy::prelude::*;

use crate::game_state::{DriveSet, GameState};
use crate::simulation::{SimulationConfig, VehicleState};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Driving), setup_hud)
            .add_systems(
                Update,
                (update_speedometer, update_pause_banner).in_set(DriveSet::Present),
            );
    }
}

#[derive(Component)]
struct Speedometer;

#[derive(Component)]
struct PauseBanner;

// Colors
const HUD_CYAN: Color = Color::srgb(0.0, 1.0, 1.0);
const BANNER_COLOR: Color = Color::srgb(1.0, 0.2, 0.8);

/// Speed readout shown on the HUD, e.g. `"042 KM/H"`.
pub fn format_speed(speed: f32) -> String {
    let kmh = speed.max(0.0).floor() as u32;
    format!("{:03} KM/H", kmh)
}

fn setup_hud(mut commands: Commands) {
    commands.spawn((
        Text::new(format_speed(0.0)),
        TextFont {
            font_size: 32.0,
            ..default()
        },
        TextColor(HUD_CYAN),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(40.0),
            right: Val::Px(40.0),
            ..default()
        },
        Speedometer,
    ));

    commands.spawn((
        Text::new("PAUSED"),
        TextFont {
            font_size: 48.0,
            ..default()
        },
        TextColor(BANNER_COLOR),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(40.0),
            left: Val::Px(40.0),
            ..default()
        },
        Visibility::Hidden,
        PauseBanner,
    ));
}

fn update_speedometer(
    vehicle: Res<VehicleState>,
    mut readouts: Query<&mut Text, With<Speedometer>>,
) {
    let readout = format_speed(vehicle.speed);
    for mut text in &mut readouts {
        if text.0 != readout {
            text.0.clone_from(&readout);
        }
    }
}

fn update_pause_banner(
    config: Res<SimulationConfig>,
    mut banners: Query<&mut Visibility, With<PauseBanner>>,
) {
    if !config.is_changed() {
        return;
    }
    let visibility = if config.paused {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut banner in &mut banners {
        *banner = visibility;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_is_floored_and_zero_padded() {
        assert_eq!(format_speed(0.0), "000 KM/H");
        assert_eq!(format_speed(7.9), "007 KM/H");
        assert_eq!(format_speed(42.5), "042 KM/H");
        assert_eq!(format_speed(420.0), "420 KM/H");
    }

    #[test]
    fn wide_speeds_are_not_truncated() {
        assert_eq!(format_speed(1234.0), "1234 KM/H");
    }

    #[test]
    fn negative_speed_reads_zero() {
        assert_eq!(format_speed(-3.0), "000 KM/H");
    }
}
