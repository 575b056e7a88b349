pub mod camera;
pub mod stage;
