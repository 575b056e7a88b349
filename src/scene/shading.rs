use glam::{DVec2, DVec3};
use noise::{NoiseFn, Perlin};
use serde::Deserialize;

pub const HORIZON: f64 = 0.15;
pub const DISK_INNER: f64 = 0.2;
pub const DISK_OUTER: f64 = 0.45;
pub const GLOW_WIDTH: f64 = 0.1;

const CENTER: DVec2 = DVec2::new(0.5, 0.5);
const TEMPERATURE_BREAK: f64 = 0.7;

const COOL: DVec3 = DVec3::new(0.8, 0.2, 0.1);
const MEDIUM: DVec3 = DVec3::new(1.0, 0.4, 0.1);
const HOT: DVec3 = DVec3::new(1.0, 0.8, 0.3);

/// Default lensing glow color (#ff6600).
pub const GLOW_COLOR: DVec3 = DVec3::new(1.0, 0.4, 0.0);

/// Source of the accretion disk turbulence term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Turbulence {
    /// Per-sample sine hash (grainy, flickers every frame)
    #[default]
    Hash,
    /// Smooth Perlin noise
    Perlin,
    /// No turbulence (deterministic output)
    Off,
}

/// Time-dependent inputs of the disk shader, rewritten once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    pub time: f64,
    /// Viewport size in pixels. Not used by the current shading.
    pub resolution: DVec2,
    pub glow_color: DVec3,
}

impl Default for Uniforms {
    fn default() -> Self {
        Uniforms {
            time: 0.0,
            resolution: DVec2::ZERO,
            glow_color: GLOW_COLOR,
        }
    }
}

/// Shaded sample: linear RGB in 0.0..=1.0 and opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shade {
    pub color: DVec3,
    pub alpha: f64,
}

impl Shade {
    pub const TRANSPARENT: Shade = Shade {
        color: DVec3::ZERO,
        alpha: 0.0,
    };
}

/// Fragment shader for the black hole sphere.
pub struct Shader {
    turbulence: Turbulence,
    perlin: Perlin,
}

impl Shader {
    pub fn new(turbulence: Turbulence) -> Self {
        Shader {
            turbulence,
            perlin: Perlin::new(0x5eed),
        }
    }

    /// Color and opacity of the disk at texture coordinate `uv` (0..=1 on both axes).
    pub fn shade(&self, uv: DVec2, uniforms: &Uniforms) -> Shade {
        let t = uniforms.time;
        let dist = uv.distance(CENTER);

        let shade = if dist < HORIZON {
            Shade {
                color: DVec3::ZERO,
                alpha: 1.0,
            }
        } else if dist > DISK_INNER && dist < DISK_OUTER {
            let accretion = (dist - DISK_INNER) / (DISK_OUTER - DISK_INNER);

            let angle = (uv.y - CENTER.y).atan2(uv.x - CENTER.x) + t * 2.0;
            let spiral = (angle * 8.0 + dist * 20.0 - t * 5.0).sin() * 0.5 + 0.5;

            let turbulence = self.turbulence_at(uv * 10.0 + DVec2::splat(t * 0.5)) * 0.3;
            let temperature = (1.0 - accretion) * spiral + turbulence;

            let color = if temperature > TEMPERATURE_BREAK {
                MEDIUM.lerp(HOT, (temperature - TEMPERATURE_BREAK) / (1.0 - TEMPERATURE_BREAK))
            } else {
                COOL.lerp(MEDIUM, temperature / TEMPERATURE_BREAK)
            };

            let intensity = spiral * (1.0 - accretion) * 0.8;
            Shade {
                color: color * intensity,
                alpha: intensity * 0.9,
            }
        } else if dist < DISK_OUTER + GLOW_WIDTH {
            // Also covers the gap between horizon and disk, where glow exceeds 1.
            let glow = 1.0 - (dist - DISK_OUTER) / GLOW_WIDTH;
            Shade {
                color: uniforms.glow_color * 0.3 * glow,
                alpha: glow * 0.3,
            }
        } else {
            Shade::TRANSPARENT
        };

        Shade {
            color: shade.color.clamp(DVec3::ZERO, DVec3::ONE),
            alpha: shade.alpha.clamp(0.0, 1.0),
        }
    }

    fn turbulence_at(&self, p: DVec2) -> f64 {
        match self.turbulence {
            Turbulence::Hash => hash_noise(p),
            Turbulence::Perlin => self.perlin.get([p.x, p.y]) * 0.5 + 0.5,
            Turbulence::Off => 0.0,
        }
    }
}

/// Sine hash in [0, 1).
pub fn hash_noise(p: DVec2) -> f64 {
    let v = p.dot(DVec2::new(12.9898, 78.233)).sin() * 43758.5453;
    v - v.floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_dist(dist: f64, angle: f64) -> DVec2 {
        CENTER + DVec2::new(angle.cos(), angle.sin()) * dist
    }

    fn uniforms(time: f64) -> Uniforms {
        Uniforms {
            time,
            ..Uniforms::default()
        }
    }

    #[test]
    fn horizon_is_opaque_black_at_any_time() {
        let shader = Shader::new(Turbulence::Hash);
        for &t in &[0.0, 1.3, 97.25] {
            for i in 0..30 {
                let dist = 0.149 * i as f64 / 29.0;
                let s = shader.shade(at_dist(dist, i as f64 * 0.7), &uniforms(t));
                assert_eq!(s.alpha, 1.0);
                assert_eq!(s.color, DVec3::ZERO);
            }
        }
    }

    #[test]
    fn outside_glow_band_is_transparent() {
        let shader = Shader::new(Turbulence::Hash);
        for i in 0..20 {
            let dist = 0.55 + i as f64 * 0.01;
            let s = shader.shade(at_dist(dist, 0.3 * i as f64), &uniforms(i as f64));
            assert_eq!(s.alpha, 0.0);
        }
        // Corners of the texture
        assert_eq!(shader.shade(DVec2::ZERO, &uniforms(2.0)).alpha, 0.0);
        assert_eq!(shader.shade(DVec2::ONE, &uniforms(2.0)).alpha, 0.0);
    }

    #[test]
    fn outer_glow_edge_is_continuous() {
        let shader = Shader::new(Turbulence::Off);
        let eps = 1e-7;
        let inside = shader.shade(at_dist(0.55 - eps, 1.0), &uniforms(4.0));
        let outside = shader.shade(at_dist(0.55 + eps, 1.0), &uniforms(4.0));
        assert!((inside.alpha - outside.alpha).abs() < 1e-5);
        assert!(inside.color.distance(outside.color) < 1e-5);
    }

    #[test]
    fn disk_fades_out_toward_its_outer_edge() {
        let shader = Shader::new(Turbulence::Off);
        for &t in &[0.0, 0.5, 3.0] {
            for k in 0..8 {
                let s = shader.shade(at_dist(0.45 - 1e-7, k as f64 * 0.8), &uniforms(t));
                assert!(s.alpha < 1e-5);
                assert!(s.color.max_element() < 1e-5);
            }
        }
    }

    // The glow band starts at full strength where the disk ends, so the
    // 0.45 edge and the horizon/disk gap are discontinuous by construction.
    #[test]
    fn glow_band_steps_up_at_disk_edge() {
        let shader = Shader::new(Turbulence::Off);
        let s = shader.shade(at_dist(0.45 + 1e-7, 0.0), &uniforms(0.0));
        assert!((s.alpha - 0.3).abs() < 1e-5);
        assert!((s.color - GLOW_COLOR * 0.3).length() < 1e-5);
    }

    #[test]
    fn gap_inside_disk_saturates() {
        let shader = Shader::new(Turbulence::Off);
        let s = shader.shade(at_dist(0.18, 0.0), &uniforms(0.0));
        assert_eq!(s.alpha, 1.0);
        assert_eq!(s.color.x, 1.0);
        assert!((s.color.y - 0.4 * 0.3 * 3.7).abs() < 1e-9);
        assert_eq!(s.color.z, 0.0);
    }

    #[test]
    fn disk_matches_reference_formula() {
        let shader = Shader::new(Turbulence::Off);
        let uv = DVec2::new(0.8, 0.5);
        let t = 0.25;
        let s = shader.shade(uv, &uniforms(t));

        let dist: f64 = 0.3;
        let accretion = (dist - 0.2) / 0.25;
        let spiral = ((0.0 + 2.0 * t) * 8.0 + dist * 20.0 - 5.0 * t).sin() * 0.5 + 0.5;
        let intensity = spiral * (1.0 - accretion) * 0.8;
        assert!((s.alpha - intensity * 0.9).abs() < 1e-9);
    }

    #[test]
    fn disk_alpha_stays_in_range_with_turbulence() {
        for turbulence in [Turbulence::Hash, Turbulence::Perlin] {
            let shader = Shader::new(turbulence);
            for i in 0..200 {
                let dist = 0.2 + 0.25 * (i as f64 + 0.5) / 200.0;
                let s = shader.shade(at_dist(dist, i as f64), &uniforms(i as f64 * 0.1));
                assert!((0.0..=1.0).contains(&s.alpha));
                assert!(s.color.min_element() >= 0.0 && s.color.max_element() <= 1.0);
            }
        }
    }

    #[test]
    fn hash_noise_is_unit_interval_and_deterministic() {
        for i in 0..100 {
            let p = DVec2::new(i as f64 * 0.37 - 12.0, i as f64 * -1.9);
            let n = hash_noise(p);
            assert!((0.0..1.0).contains(&n));
            assert_eq!(n, hash_noise(p));
        }
    }
}
