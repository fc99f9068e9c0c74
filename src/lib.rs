//! Library exports for pbm-exporter, shared between the binary and tests.

pub mod config;
pub mod exporter;
pub mod models;
pub mod routes;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
