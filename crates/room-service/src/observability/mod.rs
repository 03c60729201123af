//! Observability: metrics definitions and recorder setup.

pub mod metrics;
