// src/lib.rs

pub mod analyze;
pub mod error;
pub mod fetch;
pub mod process;
