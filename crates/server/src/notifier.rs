//! Outbound transition-event delivery. The approval path never waits on
//! this: events are posted on a detached task and failures are logged,
//! at-most-once, with no retry or outbox.

use std::time::Duration;

use quoteflow_core::config::NotifierConfig;
use quoteflow_core::notify::{NotificationTrigger, TransitionEvent};
use tracing::{debug, warn};

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Returns `None` when no webhook URL is configured; callers fall
    /// back to a noop trigger.
    pub fn from_config(config: &NotifierConfig) -> Result<Option<Self>, reqwest::Error> {
        let Some(url) = config.webhook_url.clone() else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Some(Self { client, url }))
    }
}

impl NotificationTrigger for WebhookNotifier {
    fn notify(&self, event: TransitionEvent) {
        let client = self.client.clone();
        let url = self.url.clone();

        tokio::spawn(async move {
            let workflow_id = event.workflow_id.clone();
            match client.post(&url).json(&event).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(
                        event_name = "notify.webhook_delivered",
                        workflow_id = %workflow_id,
                        new_status = ?event.new_status,
                        "transition event delivered"
                    );
                }
                Ok(response) => {
                    warn!(
                        event_name = "notify.webhook_rejected",
                        workflow_id = %workflow_id,
                        status = %response.status(),
                        "notification webhook rejected the transition event"
                    );
                }
                Err(error) => {
                    warn!(
                        event_name = "notify.webhook_unreachable",
                        workflow_id = %workflow_id,
                        error = %error,
                        "notification webhook unreachable; event dropped"
                    );
                }
            }
        });
    }
}
