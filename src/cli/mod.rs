//! CLI command handling

pub mod input;
pub mod lambda;
pub mod output;
pub mod preview;
pub mod replay;

pub use input::*;
pub use lambda::*;
pub use output::*;
pub use preview::*;
pub use replay::*;
