//! # Catalog Gateway Library
//!
//! This library exposes the gateway's modules for the binary and for integration testing.

pub mod aggregator;
pub mod clients;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod notifier;
