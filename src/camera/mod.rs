//! Chase camera with speed-driven field of view and shake.
//!
//! The camera never turns. The road bends around it, and the only motion
//! it gets is a widening field of view and a positional jitter once the car
//! is close to top speed. Neither feeds back into the simulation.

use bevy::{
    core_pipeline::{bloom::Bloom, tonemapping::Tonemapping},
    pbr::{DistanceFog, FogFalloff},
    math::FloatExt,
    prelude::*,
    window::WindowResized,
};
use rand::Rng;

use crate::constants::{CAMERA_DISTANCE, CAMERA_HEIGHT, CAMERA_TARGET};
use crate::game_state::DriveSet;
use crate::simulation::{PhysicsConfig, VehicleState};

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraFxConfig>()
            .init_resource::<SceneLightingConfig>()
            .add_systems(Startup, setup_camera)
            .add_systems(Update, apply_camera_fx.in_set(DriveSet::Present))
            .add_systems(Update, track_window_aspect);
    }
}

/// Tuning for the speed effects.
#[derive(Resource, Clone, Debug)]
pub struct CameraFxConfig {
    /// Field of view at rest, in degrees.
    pub base_fov: f32,
    /// Extra field of view at top speed, in degrees.
    pub fov_range: f32,
    /// Fraction of the remaining fov gap closed per frame.
    pub fov_smoothing: f32,
    /// Speed below which the camera is perfectly still.
    pub shake_threshold: f32,
    /// Shake amplitude at top speed, in world units.
    pub shake_max: f32,
    /// Near and far clip planes.
    pub near: f32,
    pub far: f32,
}

impl Default for CameraFxConfig {
    fn default() -> Self {
        Self {
            base_fov: 60.0,
            fov_range: 25.0,
            fov_smoothing: 0.05,
            shake_threshold: 350.0,
            shake_max: 4.0,
            near: 1.0,
            far: 100_000.0,
        }
    }
}

/// Fog, sky and lights of the night scene.
#[derive(Resource, Clone, Debug)]
pub struct SceneLightingConfig {
    pub background: Color,
    pub fog_density: f32,
    pub ambient_brightness: f32,
    pub headlight_color: Color,
    pub headlight_intensity: f32,
    pub headlight_range: f32,
    pub headlight_position: Vec3,
    /// Glow on the unlit neon props.
    pub bloom_intensity: f32,
}

impl Default for SceneLightingConfig {
    fn default() -> Self {
        Self {
            background: Color::srgb_u8(0x05, 0x00, 0x15),
            fog_density: 0.00002,
            ambient_brightness: 400.0,
            headlight_color: Color::srgb(0.0, 1.0, 1.0),
            // The scene is thousands of units across
            headlight_intensity: 2.5e8,
            headlight_range: 5000.0,
            headlight_position: Vec3::new(0.0, 500.0, 700.0),
            bloom_intensity: 0.2,
        }
    }
}

/// Current state of the speed effects.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct CameraFx {
    /// Smoothed field of view, in degrees.
    pub fov: f32,
    /// Current shake amplitude.
    pub shake: f32,
}

impl CameraFx {
    pub fn at_rest(config: &CameraFxConfig) -> Self {
        Self {
            fov: config.base_fov,
            shake: 0.0,
        }
    }

    /// Advance one frame for the given speed.
    pub fn update(&mut self, speed: f32, max_speed: f32, config: &CameraFxConfig) {
        let ratio = (speed / max_speed).clamp(0.0, 1.0);
        let target = config.base_fov + ratio * config.fov_range;
        self.fov = self.fov.lerp(target, config.fov_smoothing);

        self.shake = if speed > config.shake_threshold && max_speed > config.shake_threshold {
            let over = (speed - config.shake_threshold) / (max_speed - config.shake_threshold);
            (over * config.shake_max).min(config.shake_max)
        } else {
            0.0
        };
    }

    /// Random positional offset for this frame, in `[-shake/2, shake/2)`.
    pub fn jitter(&self, rng: &mut impl Rng) -> Vec2 {
        if self.shake == 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            (rng.gen::<f32>() - 0.5) * self.shake,
            (rng.gen::<f32>() - 0.5) * self.shake,
        )
    }
}

fn camera_home() -> Vec3 {
    Vec3::new(0.0, CAMERA_HEIGHT, CAMERA_DISTANCE)
}

fn setup_camera(
    mut commands: Commands,
    fx_config: Res<CameraFxConfig>,
    lighting: Res<SceneLightingConfig>,
    windows: Query<&Window>,
) {
    let aspect_ratio = windows
        .iter()
        .next()
        .map(|w| w.width() / w.height().max(1.0))
        .unwrap_or(16.0 / 9.0);

    commands.insert_resource(ClearColor(lighting.background));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: lighting.ambient_brightness,
    });

    commands.spawn((
        Camera3d::default(),
        Camera {
            hdr: true, // Required for bloom
            ..default()
        },
        Projection::Perspective(PerspectiveProjection {
            fov: fx_config.base_fov.to_radians(),
            aspect_ratio,
            near: fx_config.near,
            far: fx_config.far,
        }),
        Transform::from_translation(camera_home())
            .looking_at(Vec3::from_array(CAMERA_TARGET), Vec3::Y),
        DistanceFog {
            color: lighting.background,
            falloff: FogFalloff::Exponential {
                density: lighting.fog_density,
            },
            ..default()
        },
        Bloom {
            intensity: lighting.bloom_intensity,
            ..Bloom::NATURAL
        },
        Tonemapping::TonyMcMapface,
        CameraFx::at_rest(&fx_config),
    ));

    commands.spawn((
        PointLight {
            color: lighting.headlight_color,
            intensity: lighting.headlight_intensity,
            range: lighting.headlight_range,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_translation(lighting.headlight_position),
    ));

    info!(
        "Camera ready: fov {:.0} deg, fog density {}",
        fx_config.base_fov, lighting.fog_density
    );
}

/// Widen the field of view and shake the camera with speed.
fn apply_camera_fx(
    vehicle: Res<VehicleState>,
    physics: Res<PhysicsConfig>,
    config: Res<CameraFxConfig>,
    mut cameras: Query<(&mut CameraFx, &mut Projection, &mut Transform)>,
) {
    let mut rng = rand::thread_rng();
    let target = Vec3::from_array(CAMERA_TARGET);

    for (mut fx, mut projection, mut transform) in &mut cameras {
        fx.update(vehicle.speed, physics.max_speed, &config);

        if let Projection::Perspective(ref mut perspective) = *projection {
            perspective.fov = fx.fov.to_radians();
        }

        let offset = fx.jitter(&mut rng);
        *transform = Transform::from_translation(camera_home() + offset.extend(0.0))
            .looking_at(target, Vec3::Y);
    }
}

/// Keep the perspective aspect ratio in step with the window.
fn track_window_aspect(
    mut resized: EventReader<WindowResized>,
    mut projections: Query<&mut Projection, With<CameraFx>>,
) {
    let Some(event) = resized.read().last() else {
        return;
    };
    if event.height <= 0.0 {
        return;
    }

    let aspect_ratio = event.width / event.height;
    for mut projection in &mut projections {
        if let Projection::Perspective(ref mut perspective) = *projection {
            perspective.aspect_ratio = aspect_ratio;
        }
    }
    debug!("Window resized to {}x{}", event.width, event.height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const MAX: f32 = 420.0;

    #[test]
    fn fov_eases_toward_speed_target() {
        let config = CameraFxConfig::default();
        let mut fx = CameraFx::at_rest(&config);

        fx.update(MAX, MAX, &config);
        assert!((fx.fov - (60.0 + 25.0 * 0.05)).abs() < 1e-4);

        for _ in 0..500 {
            fx.update(MAX, MAX, &config);
        }
        assert!((fx.fov - 85.0).abs() < 1e-3);

        for _ in 0..500 {
            fx.update(0.0, MAX, &config);
        }
        assert!((fx.fov - 60.0).abs() < 1e-3);
    }

    #[test]
    fn no_shake_at_or_below_threshold() {
        let config = CameraFxConfig::default();
        let mut fx = CameraFx::at_rest(&config);
        for speed in [0.0, 100.0, 349.9, 350.0] {
            fx.update(speed, MAX, &config);
            assert_eq!(fx.shake, 0.0);
            assert_eq!(fx.jitter(&mut StdRng::seed_from_u64(1)), Vec2::ZERO);
        }
    }

    #[test]
    fn shake_grows_linearly_to_max() {
        let config = CameraFxConfig::default();
        let mut fx = CameraFx::at_rest(&config);

        fx.update(385.0, MAX, &config);
        assert!((fx.shake - 2.0).abs() < 1e-4);

        fx.update(MAX, MAX, &config);
        assert!((fx.shake - 4.0).abs() < 1e-4);

        // Capped even if something pushes speed past the limit
        fx.update(MAX * 2.0, MAX, &config);
        assert_eq!(fx.shake, 4.0);
    }

    #[test]
    fn jitter_stays_within_half_amplitude() {
        let config = CameraFxConfig::default();
        let mut fx = CameraFx::at_rest(&config);
        fx.update(MAX, MAX, &config);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let offset = fx.jitter(&mut rng);
            assert!(offset.x.abs() <= 2.0 && offset.y.abs() <= 2.0);
        }
    }
}
