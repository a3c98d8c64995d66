mod controller;
mod transform;

pub use controller::{HitShape, InteractionEvent, PointerController, PointerInput};
pub use transform::ViewTransform;
