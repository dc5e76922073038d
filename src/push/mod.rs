//! Push-notification delivery.
//!
//! The completion monitor hands the final task snapshot to a
//! [`PushSender`]; the production implementation posts it to the
//! configured webhook over HTTP.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::models::push::PushNotificationConfig;
use crate::models::task::Task;
use crate::{AppError, Result};

/// Delivery collaborator for push notifications.
pub trait PushSender: Send + Sync {
    /// Deliver the final task snapshot to one configured target.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Push`] when delivery fails; callers log and
    /// continue, delivery failures never propagate to protocol clients.
    fn send(
        &self,
        config: &PushNotificationConfig,
        task: &Task,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Webhook sender posting task snapshots as JSON.
pub struct HttpPushSender {
    client: reqwest::Client,
}

impl HttpPushSender {
    /// Build a sender with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Push`] when the HTTP client cannot be
    /// constructed.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Push(format!("failed to build http client: {err}")))?;
        Ok(Self { client })
    }
}

impl PushSender for HttpPushSender {
    fn send(
        &self,
        config: &PushNotificationConfig,
        task: &Task,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let config = config.clone();
        let task = task.clone();
        Box::pin(async move {
            let mut request = self.client.post(&config.url).json(&task);
            if let Some(token) = &config.token {
                request = request.bearer_auth(token);
            }
            let response = request
                .send()
                .await
                .map_err(|err| AppError::Push(format!("delivery to {} failed: {err}", config.url)))?;
            let status = response.status();
            if !status.is_success() {
                return Err(AppError::Push(format!(
                    "delivery to {} rejected with status {status}",
                    config.url
                )));
            }
            debug!(task_id = %task.id, url = %config.url, "push notification delivered");
            Ok(())
        })
    }
}
