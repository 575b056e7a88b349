use super::camera::{Camera, ray_sphere, sphere_uv};
use crate::generators::PointField;
use crate::render::{Canvas, ColorMode, RenderMode};
use crate::scene::scheduler::Stage;
use crate::scene::shading::{HORIZON, Shader, Uniforms};
use crate::scene::{ObjectKind, SpaceObject};
use glam::{DMat3, DVec2, DVec3};

pub const HOLE_RADIUS: f64 = 2.0;
pub const CAMERA_DISTANCE: f64 = 10.0;
pub const FOV_Y: f64 = 75.0;

/// Direction of the key light, as seen from the origin.
const LIGHT: DVec3 = DVec3::new(0.577, 0.577, 0.577);
const AMBIENT: f64 = 0.15;

const SATELLITE_SIZE: DVec3 = DVec3::new(0.1, 0.05, 0.15);

/// Where a pixel's view ray crosses the black hole sphere.
#[derive(Debug, Clone, Copy)]
struct SurfaceHit {
    front: DVec2,
    back: DVec2,
    depth: f64,
    /// Front face lies inside the event horizon.
    void: bool,
}

/// Draws the scene into a terminal canvas.
pub struct TerminalStage {
    canvas: Canvas,
    camera: Camera,
    hits: Vec<Option<SurfaceHit>>,
    depth: Vec<f64>,
}

impl TerminalStage {
    pub fn new(
        term_cols: usize,
        term_rows: usize,
        render_mode: RenderMode,
        color_mode: ColorMode,
    ) -> Self {
        let canvas = Canvas::new(term_cols, term_rows, render_mode, color_mode);
        let camera = Camera::new(
            canvas.width,
            canvas.height,
            FOV_Y,
            render_mode.pixel_aspect(),
            CAMERA_DISTANCE,
        );
        let size = canvas.width * canvas.height;
        let mut stage = TerminalStage {
            canvas,
            camera,
            hits: Vec::new(),
            depth: vec![f64::INFINITY; size],
        };
        stage.trace_surface();
        stage
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Canvas size in pixels.
    pub fn resolution(&self) -> DVec2 {
        DVec2::new(self.canvas.width as f64, self.canvas.height as f64)
    }

    /// Orbit the camera; the sphere intersections are retraced.
    pub fn orbit(&mut self, d_yaw: f64, d_pitch: f64) {
        let (yaw, pitch) = (self.camera.yaw() + d_yaw, self.camera.pitch() + d_pitch);
        self.camera.orbit_to(yaw, pitch);
        self.trace_surface();
    }

    /// The camera and sphere are static between orbits, so ray hits are cached.
    fn trace_surface(&mut self) {
        let (w, h) = (self.canvas.width, self.canvas.height);
        let origin = self.camera.position();
        self.hits = (0..w * h)
            .map(|idx| {
                let dir = self.camera.ray(idx % w, idx / w);
                ray_sphere(origin, dir, HOLE_RADIUS).map(|(near, far)| {
                    let front = sphere_uv(origin + dir * near);
                    SurfaceHit {
                        front,
                        back: sphere_uv(origin + dir * far),
                        depth: near * dir.dot(self.camera.forward()),
                        void: front.distance(DVec2::splat(0.5)) < HORIZON,
                    }
                })
            })
            .collect();
    }

    /// Depth test against the opaque horizon and previously drawn objects.
    fn visible(&self, x: usize, y: usize, depth: f64) -> bool {
        let idx = y * self.canvas.width + x;
        if depth >= self.depth[idx] {
            return false;
        }
        match self.hits[idx] {
            Some(hit) if hit.void => depth < hit.depth,
            _ => true,
        }
    }

    fn plot(
        &mut self,
        x: f64,
        y: f64,
        depth: f64,
        brightness: f64,
        rgb: (u8, u8, u8),
        write_depth: bool,
    ) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (ix, iy) = (x as usize, y as usize);
        if ix >= self.canvas.width || iy >= self.canvas.height || !self.visible(ix, iy, depth) {
            return;
        }
        if write_depth {
            self.depth[iy * self.canvas.width + ix] = depth;
        }
        self.canvas.set_colored(ix, iy, brightness, rgb.0, rgb.1, rgb.2);
    }

    fn draw_ball(&mut self, center: DVec3, radius: f64, kind: ObjectKind, spin: f64) {
        let Some(p) = self.camera.project(center) else {
            return;
        };
        let (ry, rx) = self.camera.pixel_radius(radius, p.depth);
        let rgb = kind.color();
        if ry < 0.75 {
            self.plot(p.x, p.y, p.depth, kind.opacity(), rgb, true);
            return;
        }

        let view_light = DVec3::new(
            LIGHT.dot(self.camera.right()),
            LIGHT.dot(self.camera.up()),
            -LIGHT.dot(self.camera.forward()),
        );
        let (x0, x1) = ((p.x - rx).floor() as i64, (p.x + rx).ceil() as i64);
        let (y0, y1) = ((p.y - ry).floor() as i64, (p.y + ry).ceil() as i64);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = (px as f64 + 0.5 - p.x) / rx;
                let dy = (py as f64 + 0.5 - p.y) / ry;
                let mut edge = 1.0;
                if kind == ObjectKind::Asteroid {
                    // Lumpy silhouette that turns with the spin
                    edge = 0.82 + 0.18 * (dy.atan2(dx) * 5.0 + spin).sin().abs();
                }
                let d2 = dx * dx + dy * dy;
                if d2 > edge * edge || px < 0 || py < 0 {
                    continue;
                }
                let brightness = if kind == ObjectKind::Star {
                    kind.opacity()
                } else {
                    let normal = DVec3::new(dx, -dy, (1.0 - d2.min(1.0)).sqrt());
                    AMBIENT + (1.0 - AMBIENT) * normal.dot(view_light).max(0.0)
                };
                let depth = p.depth - radius * (1.0 - d2.min(1.0)).sqrt();
                self.plot(px as f64, py as f64, depth, brightness, rgb, true);
            }
        }
    }

    fn draw_box(&mut self, center: DVec3, size: DVec3, spin: (f64, f64), rgb: (u8, u8, u8)) {
        let rot = DMat3::from_rotation_x(spin.0) * DMat3::from_rotation_y(spin.1);
        let half = size * 0.5;
        let corners: Vec<Option<(f64, f64, f64)>> = (0..8)
            .map(|i| {
                let local = DVec3::new(
                    if i & 1 == 0 { -half.x } else { half.x },
                    if i & 2 == 0 { -half.y } else { half.y },
                    if i & 4 == 0 { -half.z } else { half.z },
                );
                self.camera
                    .project(center + rot * local)
                    .map(|p| (p.x, p.y, p.depth))
            })
            .collect();
        for a in 0..8usize {
            for bit in [1usize, 2, 4] {
                let b = a | bit;
                if b == a {
                    continue;
                }
                if let (Some(pa), Some(pb)) = (corners[a], corners[b]) {
                    self.line(pa, pb, rgb);
                }
            }
        }
    }

    fn line(&mut self, a: (f64, f64, f64), b: (f64, f64, f64), rgb: (u8, u8, u8)) {
        let steps = ((b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil() as usize).max(1);
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = a.0 + (b.0 - a.0) * t;
            let y = a.1 + (b.1 - a.1) * t;
            let depth = a.2 + (b.2 - a.2) * t;
            self.plot(x, y, depth, 0.9, rgb, true);
        }
    }
}

impl Stage for TerminalStage {
    fn begin_frame(&mut self) {
        self.canvas.clear();
        self.depth.fill(f64::INFINITY);
    }

    fn draw_field(&mut self, field: &PointField, rotation: DMat3) {
        let rgb = field.color();
        for &point in field.points() {
            if let Some(p) = self.camera.project(rotation * point) {
                // Points do not write depth; they only hide behind the horizon.
                self.plot(p.x, p.y, p.depth, field.brightness(point), rgb, false);
            }
        }
    }

    fn draw_surface(&mut self, shader: &Shader, uniforms: &Uniforms) {
        let w = self.canvas.width;
        for idx in 0..self.hits.len() {
            let Some(hit) = self.hits[idx] else {
                continue;
            };
            let (x, y) = (idx % w, idx / w);
            for uv in [hit.back, hit.front] {
                let shade = shader.shade(uv, uniforms);
                if shade.alpha <= 0.0 {
                    continue;
                }
                let light = shade.color * shade.alpha;
                self.canvas.add_light(x, y, (light.x, light.y, light.z));
            }
        }
    }

    fn draw_object(&mut self, object: &SpaceObject, spin: (f64, f64)) {
        let pose = object.pose();
        let kind = object.kind();
        match kind {
            ObjectKind::Satellite => {
                self.draw_box(pose.position, SATELLITE_SIZE * pose.scale, spin, kind.color())
            }
            _ => self.draw_ball(pose.position, kind.radius() * pose.scale, kind, spin.1),
        }
    }
}
