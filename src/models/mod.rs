// Domain entities read from the pipeline database

pub mod stage;
pub mod client;
pub mod event;

pub use stage::*;
pub use client::*;
pub use event::*;
