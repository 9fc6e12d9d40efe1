//! Data supplied by the host application: variable catalogs, context
//! values, and engine configuration.

pub mod catalog;
pub mod config;
pub mod value;
