use glam::{DMat3, DVec3};
use rand::RngExt;
use std::f64::consts::TAU;

pub const STAR_COUNT: usize = 2000;
pub const STAR_CUBE_SIDE: f64 = 100.0;
pub const PARTICLE_COUNT: usize = 1000;
pub const PARTICLE_RADIUS_MIN: f64 = 5.0;
pub const PARTICLE_RADIUS_MAX: f64 = 20.0;
pub const DISTANT_STAR_COUNT: usize = 1000;
pub const DISTANT_RADIUS: f64 = 100.0;
pub const DISTANT_DEPTH: f64 = 50.0;

/// Brightness of the deepest distant stars relative to the nearest.
const DISTANT_FADE_FLOOR: f64 = 0.3;

/// Rigid rotation applied to a whole field as a function of time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drift {
    /// Fixed in place.
    Still,
    /// Constant yaw about the vertical axis (rad/s).
    Yaw { rate: f64 },
    /// Yaw plus an oscillating tilt about the x axis.
    YawTilt { rate: f64, tilt: f64, tilt_rate: f64 },
}

/// Dims points linearly with their distance from the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub near: f64,
    pub far: f64,
    pub floor: f64,
}

/// A fixed cloud of points, sampled once and only ever rotated as a whole.
#[derive(Debug, Clone)]
pub struct PointField {
    points: Vec<DVec3>,
    drift: Drift,
    color: (u8, u8, u8),
    opacity: f64,
    fade: Option<Fade>,
}

/// Equal-area direction scaled to `radius`.
fn on_sphere(rng: &mut impl RngExt, radius: f64) -> DVec3 {
    let theta = rng.random_range(0.0..TAU);
    let phi = (2.0 * rng.random_range(0.0..1.0) - 1.0_f64).acos();
    DVec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    )
}

impl PointField {
    /// Distant stars scattered through a cube centred on the origin.
    pub fn stars(rng: &mut impl RngExt, count: usize) -> Self {
        let half = STAR_CUBE_SIDE * 0.5;
        let points = (0..count)
            .map(|_| {
                DVec3::new(
                    rng.random_range(-half..half),
                    rng.random_range(-half..half),
                    rng.random_range(-half..half),
                )
            })
            .collect();
        PointField {
            points,
            drift: Drift::Yaw { rate: 0.001 },
            color: (255, 255, 255),
            opacity: 0.8,
            fade: None,
        }
    }

    /// Ambient particles in a spherical shell around the black hole.
    pub fn particles(rng: &mut impl RngExt, count: usize) -> Self {
        let points = (0..count)
            .map(|_| {
                let radius = rng.random_range(PARTICLE_RADIUS_MIN..PARTICLE_RADIUS_MAX);
                on_sphere(rng, radius)
            })
            .collect();
        PointField {
            points,
            drift: Drift::YawTilt {
                rate: 0.1,
                tilt: 0.1,
                tilt_rate: 0.1,
            },
            color: (0x4a, 0x9e, 0xff),
            opacity: 0.6,
            fade: None,
        }
    }

    /// Colourless backdrop shell far outside the scene, dimmer with depth.
    pub fn distant_stars(rng: &mut impl RngExt, count: usize) -> Self {
        let far = DISTANT_RADIUS + DISTANT_DEPTH;
        let points = (0..count)
            .map(|_| {
                let radius = rng.random_range(DISTANT_RADIUS..far);
                on_sphere(rng, radius)
            })
            .collect();
        PointField {
            points,
            drift: Drift::Still,
            color: (255, 255, 255),
            opacity: 1.0,
            fade: Some(Fade {
                near: DISTANT_RADIUS,
                far,
                floor: DISTANT_FADE_FLOOR,
            }),
        }
    }

    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn color(&self) -> (u8, u8, u8) {
        self.color
    }

    /// Brightness of a point of this field, after any depth fade.
    pub fn brightness(&self, point: DVec3) -> f64 {
        let Some(fade) = self.fade else {
            return self.opacity;
        };
        let t = ((point.length() - fade.near) / (fade.far - fade.near)).clamp(0.0, 1.0);
        self.opacity * (1.0 + (fade.floor - 1.0) * t)
    }

    /// Orientation of the field at `time` (tilt applied after yaw).
    pub fn rotation(&self, time: f64) -> DMat3 {
        match self.drift {
            Drift::Still => DMat3::IDENTITY,
            Drift::Yaw { rate } => DMat3::from_rotation_y(time * rate),
            Drift::YawTilt {
                rate,
                tilt,
                tilt_rate,
            } => {
                DMat3::from_rotation_x((time * tilt_rate).sin() * tilt)
                    * DMat3::from_rotation_y(time * rate)
            }
        }
    }
}
