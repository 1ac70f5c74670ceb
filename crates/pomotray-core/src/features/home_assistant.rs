//! Home Assistant webhooks -- one fire-and-forget POST per phase.

use std::time::Duration;
use url::Url;

use super::traits::{FeatureCall, FeatureHandler, FeatureResult};
use crate::config::HomeAssistantConfig;

pub struct HomeAssistantHandler {
    base: Url,
    client: reqwest::blocking::Client,
}

impl HomeAssistantHandler {
    pub fn new(config: &HomeAssistantConfig) -> FeatureResult<Self> {
        if config.base_url.is_empty() {
            return Err("Home Assistant base URL is not configured".into());
        }
        let base = Url::parse(&config.base_url)?;
        // Webhooks are best-effort; a short timeout keeps a dead
        // receiver from backing up the worker.
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()?;
        Ok(Self { base, client })
    }

    fn trigger_webhook(&self, id: &str) -> FeatureResult {
        let url = self.base.join(&format!("api/webhook/{id}"))?;
        tracing::debug!(webhook = id, "triggering webhook");
        self.client.post(url).send()?.error_for_status()?;
        Ok(())
    }
}

impl FeatureHandler for HomeAssistantHandler {
    fn handle(&mut self, call: FeatureCall) -> FeatureResult {
        match call {
            FeatureCall::TriggerWebhook { id } => self.trigger_webhook(&id),
            other => {
                tracing::debug!(?other, "call outside Home Assistant capability");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posts_to_the_webhook_path() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/webhook/pomodoro_work")
            .with_status(200)
            .create();

        let config = HomeAssistantConfig {
            base_url: server.url(),
        };
        let mut handler = HomeAssistantHandler::new(&config).unwrap();
        handler
            .handle(FeatureCall::TriggerWebhook {
                id: "pomodoro_work".into(),
            })
            .unwrap();
        mock.assert();
    }

    #[test]
    fn empty_base_url_fails_construction() {
        assert!(HomeAssistantHandler::new(&HomeAssistantConfig::default()).is_err());
    }

    #[test]
    fn unreachable_receiver_is_an_error_not_a_panic() {
        let config = HomeAssistantConfig {
            base_url: "http://127.0.0.1:1".into(),
        };
        let mut handler = HomeAssistantHandler::new(&config).unwrap();
        assert!(handler
            .handle(FeatureCall::TriggerWebhook { id: "x".into() })
            .is_err());
    }
}
