//! Assembly of global sparse systems from element-level contributions.
pub mod global;
pub mod local;
