//! Request handlers.

pub mod callback;
pub mod health;
pub mod variations;

pub use callback::*;
pub use health::*;
pub use variations::*;
