//! Upstream HR API.
//!
//! The department, cadre, employee and payroll endpoints belong to another
//! service. Records come back as raw JSON and are projected by the
//! `options` and `employees` modules.

mod http;

pub use http::*;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::{CreatePayrollRequest, EmployeeQuery};

/// Upstream call failure.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),
}

impl UpstreamError {
    /// HTTP status reported by upstream, when it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Http(e) => e.status().map(|status| status.as_u16()),
            UpstreamError::Status { status, .. } => Some(*status),
            UpstreamError::InvalidUrl(_) => None,
        }
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// The HR directory this service reads from and submits payroll runs to.
#[async_trait]
pub trait HrDirectory: Send + Sync {
    async fn list_departments(&self) -> UpstreamResult<Value>;

    async fn list_cadres(&self) -> UpstreamResult<Value>;

    async fn list_employees(&self, query: &EmployeeQuery) -> UpstreamResult<Value>;

    async fn create_payroll(&self, request: &CreatePayrollRequest) -> UpstreamResult<Value>;
}
