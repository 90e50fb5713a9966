// src/lib.rs

//! Transparent Classroom to Tinybeans sync library

pub mod clients;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
