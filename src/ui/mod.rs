mod app;
mod render;
mod terminal;

pub use app::App;
pub use render::draw;
pub use terminal::{Suspendable, Suspended};
