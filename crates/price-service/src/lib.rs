//! # Price Service Library
//!
//! The price downstream of the catalog gateway: a seeded cache in front of a slow,
//! random price computation.

pub mod cache;
pub mod config;
pub mod http;
pub mod service;
