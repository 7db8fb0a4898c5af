//! HTTP client for the StarChat server
//!
//! This module provides:
//! - Index management, decision-table upload/dump and term endpoints
//! - Basic authentication
//! - Error classification of server answers
//! - Polling with a fixed patience delay while the server is busy

pub mod client;
pub mod error;
pub mod retry;

pub use client::{ClientConfig, StarChatClient, UploadOutcome, SUPPORTED_SERVER_VERSIONS};
pub use error::{ErrorClassification, HttpError};
pub use retry::{RetryDecision, RetryPolicy};

// Re-export commonly used types
pub use reqwest::StatusCode;
