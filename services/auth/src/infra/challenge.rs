use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::domain::repository::ChallengeVerifier;
use crate::error::AuthServiceError;

/// Cloudflare Turnstile siteverify endpoint.
pub const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// HTTP client for the human-verification challenge service.
#[derive(Clone)]
pub struct TurnstileVerifier {
    pub http: reqwest::Client,
    pub endpoint: String,
}

impl TurnstileVerifier {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: SITEVERIFY_URL.to_owned(),
        }
    }
}

#[derive(Serialize)]
struct SiteverifyRequest<'a> {
    secret: &'a str,
    response: &'a str,
    remoteip: &'a str,
}

#[derive(Deserialize)]
struct SiteverifyResponse {
    success: bool,
}

impl ChallengeVerifier for TurnstileVerifier {
    async fn verify(
        &self,
        secret: &str,
        token: &str,
        remote_ip: &str,
    ) -> Result<bool, AuthServiceError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&SiteverifyRequest {
                secret,
                response: token,
                remoteip: remote_ip,
            })
            .send()
            .await
            .context("challenge service request")?;
        let body: SiteverifyResponse = response
            .json()
            .await
            .context("challenge service response")?;
        Ok(body.success)
    }
}
