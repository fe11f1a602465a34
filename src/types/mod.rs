//! Core Value Objects and Errors

pub mod api;
pub mod error;
pub mod request;

pub use api::{AssistMetadata, AssistResponse, HealthReport, ProviderStatus, StatusReport};
pub use error::{AttemptError, GateError, Result};
pub use request::{AttemptRecord, RequestType, RoutingRequest, RoutingResponse};
