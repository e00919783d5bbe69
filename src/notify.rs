//! Delivery of payroll notifications to employees.
//!
//! Delivery itself (e-mail, PDF rendering, push) lives outside this service. A
//! [`Notifier`] only hands events over, and every call site treats a failed
//! hand-over as a warning: the state change that produced the event has
//! already been committed.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{payslip, sea_orm_active_enums::PayslipStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayslipEventKind {
    Generated,
    /// Triggers PDF rendering and e-mail dispatch downstream
    Approved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayslipEvent {
    pub kind: PayslipEventKind,
    pub payslip_id: Uuid,
    pub employee_id: Uuid,
    pub organization_id: Uuid,
    pub month: i16,
    pub year: i32,
    pub net_salary: i64,
    pub status: PayslipStatus,
}

impl PayslipEvent {
    pub fn new(kind: PayslipEventKind, payslip: &payslip::Model) -> Self {
        Self {
            kind,
            payslip_id: payslip.id,
            employee_id: payslip.employee_id,
            organization_id: payslip.organization_id,
            month: payslip.month,
            year: payslip.year,
            net_salary: payslip.net_salary,
            status: payslip.status,
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("webhook request failed")]
    Request(#[from] reqwest::Error),

    #[error("webhook responded with {0}")]
    Status(reqwest::StatusCode),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &PayslipEvent) -> Result<(), DispatchError>;
}

/// Fire-and-forget: failures end up in the log and nowhere else. A notifier must
/// bound its own delivery time, the caller waits for it.
pub async fn dispatch(notifier: &dyn Notifier, event: PayslipEvent) {
    if let Err(err) = notifier.notify(&event).await {
        warn!(
            %err,
            payslip_id = %event.payslip_id,
            kind = ?event.kind,
            "payslip notification could not be delivered"
        );
    }
}

/// Used when no delivery endpoint is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &PayslipEvent) -> Result<(), DispatchError> {
        info!(
            payslip_id = %event.payslip_id,
            employee_id = %event.employee_id,
            kind = ?event.kind,
            "payslip notification"
        );

        Ok(())
    }
}

/// POSTs every event as JSON to an external delivery service.
///
/// A delivery that takes longer than `timeout` is abandoned and reported as failed.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: &PayslipEvent) -> Result<(), DispatchError> {
        let response = self.client
            .post(&self.url)
            .json(event)
            .send().await?;

        if !response.status().is_success() {
            return Err(DispatchError::Status(response.status()));
        }

        Ok(())
    }
}
