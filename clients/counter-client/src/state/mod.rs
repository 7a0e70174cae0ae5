//! On-chain account layout and the local session view

pub mod counter;
pub mod session;

pub use counter::*;
pub use session::*;
