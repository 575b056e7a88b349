use super::attraction;
use super::population::{Population, Reconciled, Spawn};
use super::shading::{Shader, Turbulence, Uniforms};
use super::{ObjectId, ObjectKind, SpaceObject};
use crate::generators::{self, PointField};
use glam::{DMat3, DVec2};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

/// Rendering collaborator driven once per frame by the scheduler.
pub trait Stage {
    /// Called before anything is drawn for the frame.
    fn begin_frame(&mut self) {}

    /// Draw a background point field under the given rigid rotation.
    fn draw_field(&mut self, field: &PointField, rotation: DMat3);

    /// Draw the black hole surface with the frame's uniforms.
    fn draw_surface(&mut self, shader: &Shader, uniforms: &Uniforms);

    /// Place one live object using its current pose.
    fn draw_object(&mut self, object: &SpaceObject, spin: (f64, f64));

    fn end_frame(&mut self) {}
}

/// Knobs fixed at scene creation.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub seed: u64,
    pub spawn: Spawn,
    pub turbulence: Turbulence,
    pub star_count: usize,
    pub particle_count: usize,
    pub distant_star_count: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            seed: 0,
            spawn: Spawn::default(),
            turbulence: Turbulence::default(),
            star_count: generators::STAR_COUNT,
            particle_count: generators::PARTICLE_COUNT,
            distant_star_count: generators::DISTANT_STAR_COUNT,
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub time: f64,
    pub live: usize,
    pub destroyed: Vec<ObjectId>,
}

type DestroyListener = Box<dyn FnMut(ObjectId, ObjectKind)>;

/// Owns elapsed time and drives shading, attraction and background drift each frame.
pub struct Scheduler {
    time: f64,
    progress: f64,
    uniforms: Uniforms,
    shader: Shader,
    population: Population,
    fields: Vec<PointField>,
    on_destroy: Option<DestroyListener>,
    swallowed: u64,
}

impl Scheduler {
    pub fn new(config: &SceneConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let stars = PointField::stars(&mut rng, config.star_count);
        let particles = PointField::particles(&mut rng, config.particle_count);
        let distant = PointField::distant_stars(&mut rng, config.distant_star_count);
        let population = Population::with_seed(config.spawn, rng.random());

        Scheduler {
            time: 0.0,
            progress: 0.0,
            uniforms: Uniforms::default(),
            shader: Shader::new(config.turbulence),
            population,
            // Back to front
            fields: vec![distant, stars, particles],
            on_destroy: None,
            swallowed: 0,
        }
    }

    /// Register the callback fired once for every object that crosses the horizon.
    pub fn on_destroy(&mut self, listener: impl FnMut(ObjectId, ObjectKind) + 'static) {
        self.on_destroy = Some(Box::new(listener));
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    #[cfg(test)]
    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    #[cfg(test)]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[cfg(test)]
    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    /// Total objects swallowed this session.
    pub fn swallowed(&self) -> u64 {
        self.swallowed
    }

    /// New scroll progress: reconcile the population toward its target.
    pub fn set_progress(&mut self, progress: f64) -> Reconciled {
        self.progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.population.reconcile(self.progress)
    }

    /// Route a destruction: remove the object and notify the listener.
    /// Unknown or already removed ids are ignored.
    pub fn destroy(&mut self, id: ObjectId) -> bool {
        let Some(kind) = self.population.get(id).map(|o| o.kind()) else {
            return false;
        };
        if !self.population.destroy(id) {
            return false;
        }
        self.swallowed += 1;
        log::debug!("{id} ({kind:?}) crossed the event horizon");
        if let Some(listener) = self.on_destroy.as_mut() {
            listener(id, kind);
        }
        true
    }

    /// Advance one frame at host time `time` and draw it onto `stage`.
    pub fn tick(&mut self, time: f64, resolution: DVec2, stage: &mut impl Stage) -> FrameStats {
        if time.is_finite() && time > self.time {
            self.time = time;
        }
        self.uniforms.time = self.time;
        self.uniforms.resolution = resolution;

        let crossed = self.population.advance(self.progress, self.time);
        let mut destroyed = Vec::with_capacity(crossed.len());
        for id in crossed {
            if self.destroy(id) {
                destroyed.push(id);
            }
        }

        stage.begin_frame();
        for field in &self.fields {
            stage.draw_field(field, field.rotation(self.time));
        }
        stage.draw_surface(&self.shader, &self.uniforms);
        let spin = attraction::spin(self.time);
        for object in self.population.iter().filter(|o| !o.is_destroyed()) {
            stage.draw_object(object, spin);
        }
        stage.end_frame();

        FrameStats {
            time: self.time,
            live: self.population.len(),
            destroyed,
        }
    }
}
