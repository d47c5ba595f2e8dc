//! Request handlers.

pub mod analyze;
pub mod health;
pub mod page;

pub use analyze::*;
pub use health::*;
pub use page::*;
