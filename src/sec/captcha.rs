use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;

use crate::config;
use crate::error;

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,

    #[serde(rename = "error-codes")]
    error_codes: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct Captcha {
    client: reqwest::Client,
    secret: Option<String>,
    verify_url: String,
}

impl Captcha {
    pub fn from_config(config: &config::Config) -> error::Result<Self> {
        tracing::debug!("creating Captcha state");

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.settings.captcha.timeout))
            .build()?;

        Ok(Captcha {
            client,
            secret: config.settings.captcha.secret.clone(),
            verify_url: config.settings.captcha.verify_url.clone(),
        })
    }

    /// checks the given response token with the remote verifier. anything
    /// short of a definite pass fails the check, a missing secret included
    pub async fn verify(&self, token: &str, remote_ip: IpAddr) -> bool {
        let Some(secret) = &self.secret else {
            tracing::warn!("captcha secret is not configured, rejecting token");

            return false;
        };

        let remote_ip = remote_ip.to_string();
        let params = [
            ("secret", secret.as_str()),
            ("response", token),
            ("remoteip", remote_ip.as_str()),
        ];

        let response = match self.client.post(&self.verify_url).form(&params).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("captcha verify request failed: {:#?}", err);

                return false;
            }
        };

        let verified: VerifyResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::error!("captcha verify response was not parsable: {:#?}", err);

                return false;
            }
        };

        if !verified.success {
            if let Some(codes) = verified.error_codes {
                tracing::debug!("captcha verify rejected token: {codes:?}");
            }
        }

        verified.success
    }
}
