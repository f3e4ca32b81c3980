mod collect;
mod graph;
mod parse;

pub use collect::{SceneSource, generate_scene, load_scene};
pub use graph::{Scene, SceneNode};
