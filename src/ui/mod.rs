pub mod console;
pub mod demo;
pub mod render;

pub use console::{SessionEnd, run_interactive};
pub use demo::run_demo;
pub use render::BANNER;
