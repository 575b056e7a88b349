use glam::{DVec2, DVec3};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

const NEAR: f64 = 0.1;
const MAX_PITCH: f64 = FRAC_PI_2 * 0.95;

/// A point projected onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

/// Perspective camera orbiting the origin at a fixed distance.
#[derive(Debug, Clone)]
pub struct Camera {
    distance: f64,
    yaw: f64,
    pitch: f64,
    position: DVec3,
    right: DVec3,
    up: DVec3,
    forward: DVec3,
    center: DVec2,
    focal_x: f64,
    focal_y: f64,
}

impl Camera {
    /// `fov_y` in degrees. `pixel_aspect` is pixel height over pixel width.
    pub fn new(width: usize, height: usize, fov_y: f64, pixel_aspect: f64, distance: f64) -> Self {
        let focal_y = (height as f64 * 0.5) / (fov_y.to_radians() * 0.5).tan();
        let mut camera = Camera {
            distance,
            yaw: 0.0,
            pitch: 0.0,
            position: DVec3::ZERO,
            right: DVec3::X,
            up: DVec3::Y,
            forward: DVec3::NEG_Z,
            center: DVec2::new(width as f64 * 0.5, height as f64 * 0.5),
            focal_x: focal_y * pixel_aspect,
            focal_y,
        };
        camera.orbit_to(0.0, 0.0);
        camera
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn forward(&self) -> DVec3 {
        self.forward
    }

    pub fn right(&self) -> DVec3 {
        self.right
    }

    pub fn up(&self) -> DVec3 {
        self.up
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Place the camera on its orbit. Pitch is clamped short of the poles.
    pub fn orbit_to(&mut self, yaw: f64, pitch: f64) {
        self.yaw = yaw.rem_euclid(TAU);
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.position = DVec3::new(cp * sy, sp, cp * cy) * self.distance;
        self.forward = (-self.position).normalize();
        self.right = self.forward.cross(DVec3::Y).normalize();
        self.up = self.right.cross(self.forward);
    }

    /// Pixel radius of a world-space length seen at `depth` (vertical, horizontal).
    pub fn pixel_radius(&self, size: f64, depth: f64) -> (f64, f64) {
        (size * self.focal_y / depth, size * self.focal_x / depth)
    }

    /// Project a world point; `None` when it is behind the near plane.
    pub fn project(&self, p: DVec3) -> Option<Projected> {
        let rel = p - self.position;
        let depth = rel.dot(self.forward);
        if depth < NEAR {
            return None;
        }
        Some(Projected {
            x: self.center.x + rel.dot(self.right) / depth * self.focal_x,
            y: self.center.y - rel.dot(self.up) / depth * self.focal_y,
            depth,
        })
    }

    /// Unit ray direction through the centre of pixel (px, py).
    pub fn ray(&self, px: usize, py: usize) -> DVec3 {
        let sx = (px as f64 + 0.5 - self.center.x) / self.focal_x;
        let sy = -(py as f64 + 0.5 - self.center.y) / self.focal_y;
        (self.forward + self.right * sx + self.up * sy).normalize()
    }
}

/// Entry and exit distances of a ray through a sphere at the origin.
pub fn ray_sphere(origin: DVec3, dir: DVec3, radius: f64) -> Option<(f64, f64)> {
    let b = origin.dot(dir);
    let c = origin.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let (near, far) = (-b - root, -b + root);
    if far < 0.0 {
        return None;
    }
    Some((near.max(0.0), far))
}

/// Texture coordinate of a point on a sphere centred at the origin.
///
/// u runs around the vertical axis starting from -x, v runs from the south
/// pole (0) to the north pole (1).
pub fn sphere_uv(p: DVec3) -> DVec2 {
    let n = p.normalize_or_zero();
    let theta = n.y.clamp(-1.0, 1.0).acos();
    let phi = n.z.atan2(-n.x).rem_euclid(TAU);
    DVec2::new(phi / TAU, 1.0 - theta / PI)
}
