//! Connectivity diagnostics
//!
//! Operator-facing checks exposed as plain API calls returning printable
//! reports: a sequential availability probe over the known endpoints and a
//! combined probe + query round-trip report.

use std::time::Duration;

use serde::Serialize;

use crate::api::{ApiClient, ConnectionStatus};

/// Candidate endpoints, probed in order; the first responder wins
const PROBE_ENDPOINTS: [&str; 5] = ["/api/health", "/api/status", "/api/exec", "/health", "/status"];

/// Per-endpoint probe timeout
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of the availability probe
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub available: bool,
    /// Endpoint that responded, when one did
    pub endpoint: Option<String>,
    /// HTTP status of the response, when one arrived
    pub status: Option<u16>,
    /// Failure summary when nothing responded
    pub message: Option<String>,
}

/// Combined diagnostic: probe plus an end-to-end query round trip
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityReport {
    pub probe: ProbeReport,
    pub connection: ConnectionStatus,
}

/// Probe the server root for any responding endpoint.
///
/// Any HTTP response counts as available, whatever its status; only
/// transport failures move the probe to the next candidate.
pub async fn probe_server(server_root: &str) -> ProbeReport {
    let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(client) => client,
        Err(err) => {
            return ProbeReport {
                available: false,
                endpoint: None,
                status: None,
                message: Some(err.to_string()),
            }
        }
    };

    let root = server_root.trim_end_matches('/');
    for endpoint in PROBE_ENDPOINTS {
        let url = format!("{}{}", root, endpoint);
        match client.get(&url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                log::info!("endpoint {} responded with {}", endpoint, status);
                return ProbeReport {
                    available: true,
                    endpoint: Some(endpoint.to_string()),
                    status: Some(status),
                    message: None,
                };
            }
            Err(err) => {
                log::debug!("endpoint {} unavailable: {}", endpoint, err);
            }
        }
    }

    ProbeReport {
        available: false,
        endpoint: None,
        status: None,
        message: Some("no server endpoint responded".to_string()),
    }
}

/// Run the full connectivity diagnostic against a configured client
pub async fn connectivity_report(client: &ApiClient, server_root: &str) -> ConnectivityReport {
    let probe = probe_server(server_root).await;
    let connection = client.check_connection().await;
    ConnectivityReport { probe, connection }
}

impl std::fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.available {
            write!(
                f,
                "server available via {} (status {})",
                self.endpoint.as_deref().unwrap_or("?"),
                self.status.unwrap_or(0)
            )
        } else {
            write!(
                f,
                "server unavailable: {}",
                self.message.as_deref().unwrap_or("unknown")
            )
        }
    }
}

impl std::fmt::Display for ConnectivityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.probe)?;
        write!(
            f,
            "query round trip: {}",
            if self.connection.connected {
                "ok"
            } else {
                self.connection.message.as_str()
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_report_display() {
        let up = ProbeReport {
            available: true,
            endpoint: Some("/api/health".to_string()),
            status: Some(200),
            message: None,
        };
        assert_eq!(up.to_string(), "server available via /api/health (status 200)");

        let down = ProbeReport {
            available: false,
            endpoint: None,
            status: None,
            message: Some("no server endpoint responded".to_string()),
        };
        assert!(down.to_string().contains("unavailable"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = ConnectivityReport {
            probe: ProbeReport {
                available: true,
                endpoint: Some("/api/health".to_string()),
                status: Some(200),
                message: None,
            },
            connection: ConnectionStatus {
                connected: false,
                message: "HTTP error 500".to_string(),
            },
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["probe"]["endpoint"], "/api/health");
        assert_eq!(json["probe"]["status"], 200);
        assert_eq!(json["connection"]["connected"], false);
    }

    #[tokio::test]
    async fn test_probe_unreachable_server() {
        // nothing listens on port 1, each attempt is refused immediately
        let report = probe_server("http://127.0.0.1:1").await;
        assert!(!report.available);
        assert!(report.endpoint.is_none());
        assert!(report.message.is_some());
    }
}
