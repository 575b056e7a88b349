pub mod attraction;
pub mod population;
pub mod scheduler;
pub mod scroll;
pub mod shading;

use glam::DVec3;

/// Stable identity of a live object. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "object-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Planet,
    Asteroid,
    Satellite,
    Star,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 4] = [
        ObjectKind::Planet,
        ObjectKind::Asteroid,
        ObjectKind::Satellite,
        ObjectKind::Star,
    ];

    /// Approximate radius of the mesh in world units (satellite: half its longest side).
    pub fn radius(self) -> f64 {
        match self {
            ObjectKind::Planet => 0.3,
            ObjectKind::Asteroid => 0.2,
            ObjectKind::Satellite => 0.075,
            ObjectKind::Star => 0.1,
        }
    }

    pub fn color(self) -> (u8, u8, u8) {
        match self {
            ObjectKind::Planet => (0x4a, 0x7c, 0x59),
            ObjectKind::Asteroid => (0x66, 0x66, 0x66),
            ObjectKind::Satellite => (0xcc, 0xcc, 0xcc),
            ObjectKind::Star => (0xff, 0xff, 0xff),
        }
    }

    pub fn opacity(self) -> f64 {
        match self {
            ObjectKind::Star => 0.8,
            _ => 1.0,
        }
    }
}

/// Per-frame derived placement of an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: DVec3,
    pub scale: f64,
    pub destroyed: bool,
}

/// A body drifting toward the black hole.
///
/// `initial` is fixed at creation; `pose` is recomputed every tick from it.
#[derive(Debug, Clone)]
pub struct SpaceObject {
    id: ObjectId,
    kind: ObjectKind,
    initial: DVec3,
    pose: Pose,
}

impl SpaceObject {
    pub fn new(id: ObjectId, kind: ObjectKind, initial: DVec3) -> Self {
        SpaceObject {
            id,
            kind,
            initial,
            pose: Pose {
                position: initial,
                scale: 1.0,
                destroyed: false,
            },
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn initial(&self) -> DVec3 {
        self.initial
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn is_destroyed(&self) -> bool {
        self.pose.destroyed
    }

    /// Apply a freshly evaluated pose. Returns true only on the false→true
    /// transition of the destroyed flag; a destroyed object stays destroyed.
    pub(crate) fn apply(&mut self, pose: Pose) -> bool {
        let was_destroyed = self.pose.destroyed;
        self.pose = Pose {
            destroyed: was_destroyed || pose.destroyed,
            ..pose
        };
        !was_destroyed && self.pose.destroyed
    }
}
