//! Reporting the detection result to the home-automation hub.
//!
//! [`HomeAssistant`] posts the binary state to the Home Assistant REST
//! states API (`POST /api/states/<entity_id>`) with a long-lived bearer
//! token.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::HubConfig;
use crate::error::TransportError;

/// Binary entity state as understood by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HubState {
    On,
    Off,
}

impl HubState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl From<bool> for HubState {
    fn from(snow_detected: bool) -> Self {
        if snow_detected {
            Self::On
        } else {
            Self::Off
        }
    }
}

/// Request body for the states endpoint.
#[derive(Debug, Serialize)]
struct StatePayload {
    state: HubState,
}

/// Destination for the snow-present flag.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn report(&self, snow_detected: bool) -> Result<(), TransportError>;
}

/// Home Assistant states API client.
pub struct HomeAssistant {
    client: reqwest::Client,
    config: HubConfig,
}

impl HomeAssistant {
    /// Build a hub client whose requests are bounded by `timeout`.
    pub fn new(config: HubConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ReportSink for HomeAssistant {
    async fn report(&self, snow_detected: bool) -> Result<(), TransportError> {
        let url = self.config.state_url();
        let state = HubState::from(snow_detected);

        tracing::info!(url = %url, state = state.as_str(), "Updating hub entity");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&StatePayload { state })
            .send()
            .await
            .map_err(|e| TransportError::request(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
