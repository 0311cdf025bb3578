mod renderer;

pub use renderer::{DocumentRenderer, RenderError};
