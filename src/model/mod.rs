mod change;
mod event;
mod tree;

pub use change::*;
pub use event::*;
pub use tree::*;
