// Inkstat Render - Frame Compositor
// Draws a status snapshot and artwork into the two panel planes

pub mod canvas;
pub mod compositor;

pub use canvas::PlaneCanvas;
pub use compositor::{FrameCompositor, Polarity, ARTWORK_OFFSET};
