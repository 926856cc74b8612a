//! Library for the synthetic load actuator
//!
//! This crate provides the core functionality for:
//! - The feedback control loop steering request pacing toward a CPU target
//! - Memory and disk ballast actuators for memory/disk targets
//! - The request worker pool exercising the test endpoints
//! - Metrics reading, target config watching, and status publishing
//! - Health checks and observability

pub mod ballast;
pub mod config_watch;
pub mod controller;
pub mod health;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod status;
pub mod worker;

pub use controller::{Controller, ControllerConfig};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ActuatorMetrics, StructuredLogger};
