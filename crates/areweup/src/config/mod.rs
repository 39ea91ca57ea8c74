//! Turns the raw check document plus bootstrap defaults into a
//! [`HealthCheckConfiguration`](crate::models::HealthCheckConfiguration).

mod fields;
pub mod resolver;
pub mod validation;

pub use resolver::{resolve, resolve_document};
