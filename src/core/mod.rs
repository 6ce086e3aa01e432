//! Core types shared by the store, the service and the front ends.

pub mod config;
pub mod error;
pub mod example;
pub mod logging;
pub mod paths;
