pub mod encoding;
mod frame;
mod scene;
mod svg;

pub use encoding::{Focus, RadiusScale};
pub use frame::{DisplayList, DrawCommand, FrameLoop, FrameState, ResizeWatch, build_frame};
pub use scene::{Scene, flatten_quadratic};
pub use svg::{render_svg, write_svg};
