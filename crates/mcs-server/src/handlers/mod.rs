//! Tool handlers, one module per concern

pub mod admin;
pub mod analysis;
pub mod cache;
pub mod feedback;
pub mod generation;
pub mod search;
pub mod service;
