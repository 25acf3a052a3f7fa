//! Transports wrapping the finance service.

pub mod batch;
pub mod csv;
