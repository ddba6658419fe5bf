// HTTP routes
pub mod docs;
pub mod events;
pub mod health;

pub use docs::*;
pub use events::*;
pub use health::*;
