//! HTTP request handlers, one module per area.

pub mod health;
pub mod refresh;
pub mod revenue;
