//! # Utilities Module
//!
//! Grid geometry and distance helpers shared by generation and navigation.

pub mod math;

pub use math::*;
