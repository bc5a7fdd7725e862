//! Header name and value registries.

pub mod known;

pub use known::KnownHeader;
