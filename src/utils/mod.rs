pub mod date;

pub use date::parse_as_of;
