//! TCP port probe implementation.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use super::{Check, ProbeError, Prober};

/// Connects to `host:port` and closes the connection straight away.
pub struct PortProber {
    timeout: Duration,
}

impl PortProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Prober for PortProber {
    async fn probe(&self, check: &Check) -> Result<(), ProbeError> {
        let target = (check.target(), check.port);

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(target))
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))?
            .map_err(|e| ProbeError::Network(format!("failed to connect: {}", e)))?;
        drop(stream);

        Ok(())
    }
}
