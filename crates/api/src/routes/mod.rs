//! API Routes

pub mod frames;
pub mod streams;
