pub mod client;
pub mod event;

pub use client::*;
pub use event::*;
