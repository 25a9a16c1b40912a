// src/lib.rs

//! Scheduled article publisher for a static news site.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
