//! Utility functions for pixel coordinate handling.

pub mod safe_cast;
