use super::attraction;
use super::{ObjectId, ObjectKind, SpaceObject};
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

/// Live object count at full scroll.
pub const MAX_OBJECTS: usize = 50;
pub const SPAWN_RADIUS_MIN: f64 = 8.0;
pub const SPAWN_RADIUS_MAX: f64 = 18.0;

/// How spawn directions are drawn on the sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Spawn {
    /// Uniform polar angle; objects bunch up near the poles
    #[default]
    SourceCompatible,
    /// Equal-area directions
    Uniform,
}

/// Desired number of live objects at a given scroll progress.
pub fn target_for(progress: f64) -> usize {
    if !progress.is_finite() {
        return 0;
    }
    (progress.clamp(0.0, 1.0) * MAX_OBJECTS as f64).floor() as usize
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub spawned: Vec<ObjectId>,
    pub evicted: Vec<ObjectId>,
}

/// Owns the live set of space objects.
pub struct Population {
    objects: BTreeMap<ObjectId, SpaceObject>,
    next_id: u64,
    spawn: Spawn,
    rng: StdRng,
}

impl Population {
    pub fn new(spawn: Spawn, rng: StdRng) -> Self {
        Population {
            objects: BTreeMap::new(),
            next_id: 0,
            spawn,
            rng,
        }
    }

    pub fn with_seed(spawn: Spawn, seed: u64) -> Self {
        Population::new(spawn, StdRng::seed_from_u64(seed))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn get(&self, id: ObjectId) -> Option<&SpaceObject> {
        self.objects.get(&id)
    }

    #[cfg(test)]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Live objects in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &SpaceObject> {
        self.objects.values()
    }

    /// Grow or shrink the live set toward the target for `progress`.
    ///
    /// Objects already marked destroyed are dropped first. On shrink the
    /// newest identities go first, so long-lived objects keep their place.
    pub fn reconcile(&mut self, progress: f64) -> Reconciled {
        let target = target_for(progress);
        let mut result = Reconciled::default();

        self.objects.retain(|_, obj| !obj.is_destroyed());

        while self.objects.len() < target {
            let kind = ObjectKind::ALL[self.rng.random_range(0..ObjectKind::ALL.len())];
            let position = self.sample_position();
            result.spawned.push(self.spawn_at(position, kind));
        }
        while self.objects.len() > target {
            let Some((id, _)) = self.objects.pop_last() else {
                break;
            };
            result.evicted.push(id);
        }

        log::debug!(
            "reconciled to {} objects (progress {:.3}): +{} -{}",
            target,
            progress,
            result.spawned.len(),
            result.evicted.len()
        );
        result
    }

    /// Insert an object at an explicit starting position.
    pub fn spawn_at(&mut self, initial: DVec3, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, SpaceObject::new(id, kind, initial));
        id
    }

    /// Re-evaluate every live object. Returns the objects that became
    /// destroyed during this call; each id is reported at most once.
    pub fn advance(&mut self, progress: f64, time: f64) -> Vec<ObjectId> {
        let mut destroyed = Vec::new();
        for obj in self.objects.values_mut() {
            let pose = attraction::evaluate(obj.initial(), progress, time);
            if obj.apply(pose) {
                destroyed.push(obj.id());
            }
        }
        destroyed
    }

    /// Remove an object. Returns false if it was not live.
    pub fn destroy(&mut self, id: ObjectId) -> bool {
        self.objects.remove(&id).is_some()
    }

    fn sample_position(&mut self) -> DVec3 {
        let radius = self.rng.random_range(SPAWN_RADIUS_MIN..SPAWN_RADIUS_MAX);
        let theta = self.rng.random_range(0.0..TAU);
        let phi = match self.spawn {
            Spawn::SourceCompatible => self.rng.random_range(0.0..PI),
            Spawn::Uniform => (2.0 * self.rng.random_range(0.0..1.0) - 1.0_f64).acos(),
        };
        DVec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(pop: &Population) -> Vec<ObjectId> {
        pop.iter().map(|o| o.id()).collect()
    }

    #[test]
    fn target_is_floor_of_progress_times_fifty() {
        assert_eq!(target_for(0.0), 0);
        assert_eq!(target_for(0.1), 5);
        assert_eq!(target_for(0.5), 25);
        assert_eq!(target_for(0.999), 49);
        assert_eq!(target_for(1.0), 50);
        assert_eq!(target_for(1.7), 50);
        assert_eq!(target_for(-0.2), 0);
        assert_eq!(target_for(f64::NAN), 0);
    }

    #[test]
    fn growth_preserves_existing_identities() {
        let mut pop = Population::with_seed(Spawn::SourceCompatible, 7);
        assert!(pop.reconcile(0.0).spawned.is_empty());
        assert_eq!(pop.len(), 0);

        pop.reconcile(0.5);
        assert_eq!(pop.len(), 25);
        let first = ids(&pop);
        let positions: Vec<DVec3> = pop.iter().map(|o| o.initial()).collect();

        let step = pop.reconcile(1.0);
        assert_eq!(pop.len(), 50);
        assert_eq!(step.spawned.len(), 25);
        assert!(step.evicted.is_empty());
        for (id, p0) in first.iter().zip(&positions) {
            assert_eq!(pop.get(*id).map(|o| o.initial()), Some(*p0));
        }
    }

    #[test]
    fn shrink_evicts_newest_first() {
        let mut pop = Population::with_seed(Spawn::Uniform, 1);
        pop.reconcile(0.2);
        let before = ids(&pop);
        let step = pop.reconcile(0.1);
        assert_eq!(pop.len(), 5);
        assert_eq!(ids(&pop), before[..5].to_vec());
        assert_eq!(step.evicted.len(), 5);
    }

    #[test]
    fn identities_are_never_reused() {
        let mut pop = Population::with_seed(Spawn::SourceCompatible, 3);
        pop.reconcile(0.2);
        let old = ids(&pop);
        pop.reconcile(0.0);
        pop.reconcile(0.2);
        for id in ids(&pop) {
            assert!(!old.contains(&id));
        }
    }

    #[test]
    fn spawn_radius_is_within_shell() {
        for spawn in [Spawn::SourceCompatible, Spawn::Uniform] {
            let mut pop = Population::with_seed(spawn, 11);
            pop.reconcile(1.0);
            for obj in pop.iter() {
                let r = obj.initial().length();
                assert!(r >= SPAWN_RADIUS_MIN - 1e-9 && r <= SPAWN_RADIUS_MAX + 1e-9);
            }
        }
    }

    #[test]
    fn same_seed_same_population() {
        let mut a = Population::with_seed(Spawn::Uniform, 99);
        let mut b = Population::with_seed(Spawn::Uniform, 99);
        a.reconcile(0.6);
        b.reconcile(0.6);
        let pa: Vec<_> = a.iter().map(|o| (o.kind(), o.initial())).collect();
        let pb: Vec<_> = b.iter().map(|o| (o.kind(), o.initial())).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut pop = Population::with_seed(Spawn::SourceCompatible, 5);
        pop.reconcile(0.1);
        let id = ids(&pop)[2];
        assert!(pop.destroy(id));
        assert!(!pop.destroy(id));
        assert!(!pop.contains(id));
        assert_eq!(pop.len(), 4);
    }

    #[test]
    fn advance_reports_each_destruction_once() {
        let mut pop = Population::with_seed(Spawn::SourceCompatible, 5);
        let near = pop.spawn_at(DVec3::new(0.5, 0.5, 0.5), ObjectKind::Asteroid);
        let far = pop.spawn_at(DVec3::new(0.0, 12.0, 0.0), ObjectKind::Planet);

        assert_eq!(pop.advance(1.0, 0.0), vec![near]);
        assert!(pop.advance(1.0, 0.016).is_empty());
        assert!(pop.advance(1.0, 0.033).is_empty());
        assert!(!pop.get(far).map(|o| o.is_destroyed()).unwrap_or(true));
    }

    #[test]
    fn reconcile_drops_lingering_destroyed_objects() {
        let mut pop = Population::with_seed(Spawn::SourceCompatible, 5);
        let near = pop.spawn_at(DVec3::new(0.2, 0.0, 0.0), ObjectKind::Star);
        pop.advance(0.0, 0.0);
        pop.reconcile(0.05);
        assert!(!pop.contains(near));
        assert_eq!(pop.len(), 2);
    }
}
