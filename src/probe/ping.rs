//! Ping probe implementation using the system `ping` command.
//!
//! A single echo request is sent; a zero exit status means the host is up.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{Check, ProbeError, Prober};

/// Address family forced on the ping command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    /// Let `ping` pick, as for a plain `ping` check
    Any,
    /// Force IPv6 where the platform has a flag for it
    V6,
}

/// ICMP echo prober backed by the system `ping` binary.
pub struct IcmpProber {
    family: IpFamily,
    timeout: Duration,
}

impl IcmpProber {
    pub fn new(family: IpFamily, timeout: Duration) -> Self {
        Self { family, timeout }
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, check: &Check) -> Result<(), ProbeError> {
        let address = check.target();
        if address.is_empty() {
            return Err(ProbeError::Config(format!("check {} has no host", check.name)));
        }

        // No timeout wrapper here: ping enforces its own reply budget.
        let status = Command::new("ping")
            .args(ping_args(address, self.family, self.timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| ProbeError::Command(format!("failed to execute ping: {}", e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(ProbeError::Command(format!("ping {} exited with {}", address, status)))
        }
    }
}

/// Build the `ping` arguments for one echo request on this platform.
fn ping_args(address: &str, family: IpFamily, timeout: Duration) -> Vec<String> {
    let mut args = Vec::with_capacity(6);

    if cfg!(windows) {
        let timeout_ms = timeout.as_millis().max(1);
        if family == IpFamily::V6 {
            args.push("-6".to_string());
        }
        args.extend(["-n".to_string(), "1".to_string()]);
        args.extend(["-w".to_string(), timeout_ms.to_string()]);
    } else {
        let timeout_secs = timeout.as_secs().max(1);
        if family == IpFamily::V6 && cfg!(target_os = "linux") {
            args.push("-6".to_string());
        }
        args.extend(["-c".to_string(), "1".to_string()]);
        args.extend(["-W".to_string(), timeout_secs.to_string()]);
    }

    args.push(address.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::CheckKind;

    #[test]
    #[cfg(target_os = "linux")]
    fn test_ping_args_linux() {
        let args = ping_args("example.com", IpFamily::Any, Duration::from_secs(5));
        assert_eq!(args, ["-c", "1", "-W", "5", "example.com"]);

        let args = ping_args("::1", IpFamily::V6, Duration::from_secs(5));
        assert_eq!(args, ["-6", "-c", "1", "-W", "5", "::1"]);
    }

    #[test]
    #[cfg(windows)]
    fn test_ping_args_windows() {
        let args = ping_args("example.com", IpFamily::V6, Duration::from_secs(5));
        assert_eq!(args, ["-6", "-n", "1", "-w", "5000", "example.com"]);
    }

    #[test]
    fn test_sub_second_timeout_rounds_up() {
        let args = ping_args("host", IpFamily::Any, Duration::from_millis(200));
        assert!(args.contains(&"1".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("host"));
    }

    #[tokio::test]
    async fn test_empty_host_is_config_error() {
        let prober = IcmpProber::new(IpFamily::Any, Duration::from_secs(1));
        let check = Check {
            name: "nowhere".to_string(),
            kind: CheckKind::Ping,
            ..Default::default()
        };
        assert!(matches!(prober.probe(&check).await, Err(ProbeError::Config(_))));
    }
}
