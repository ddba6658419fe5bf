pub mod event;
pub mod level;

pub use event::*;
pub use level::*;
