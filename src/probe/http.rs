//! HTTP probe implementation.

use std::time::Duration;

use async_trait::async_trait;

use super::{Check, ProbeError, Prober};

/// Issues a GET and requires the exact expected status code.
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Config(e.to_string()))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, check: &Check) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(check.target())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout(self.timeout)
                } else {
                    ProbeError::Network(e.to_string())
                }
            })?;

        let got = response.status().as_u16();
        if got == check.expected_code {
            Ok(())
        } else {
            Err(ProbeError::UnexpectedStatus {
                expected: check.expected_code,
                got,
            })
        }
    }
}
