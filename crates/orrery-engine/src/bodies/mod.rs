//! Typed body configuration and debris-belt generation.

pub mod belt;
pub mod config;
