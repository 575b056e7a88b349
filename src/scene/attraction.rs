use super::Pose;
use glam::DVec3;

/// Objects whose undisturbed radial distance drops below this are swallowed.
pub const DESTROY_RADIUS: f64 = 1.5;

/// Strength of the inward pull at a given scroll progress.
pub fn pull_strength(progress: f64) -> f64 {
    progress * progress * 2.0
}

/// Pose of an object that started at `initial`, given scroll progress and time.
///
/// Destruction is judged from the distance of `initial` to the origin, not from
/// the pulled and jittered position.
pub fn evaluate(initial: DVec3, progress: f64, time: f64) -> Pose {
    let pull = pull_strength(progress);
    let radial = DVec3::ZERO - initial;
    let distance = radial.length();

    // Zero vector at the origin: no pull.
    let direction = radial.normalize_or_zero();
    let pulled = initial + direction * pull;

    let orbit = DVec3::new(
        (time + initial.x).sin() * 0.1,
        (time + initial.y).cos() * 0.1,
        (time * 0.5 + initial.z).sin() * 0.05,
    );

    Pose {
        position: pulled + orbit,
        scale: (1.0 - pull * 0.3).max(0.1),
        destroyed: distance < DESTROY_RADIUS,
    }
}

/// Cosmetic mesh spin (x, y) in radians.
pub fn spin(time: f64) -> (f64, f64) {
    (time * 0.6, time * 1.2)
}
