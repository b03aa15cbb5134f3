//! Network inspection: interfaces, port checks and a minimal host scan.

use super::{Host, Invocation, OsError, OsResult, Platform};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::{self, JoinSet};
use tokio::time::timeout;
use udc_executor::InterfaceInfo;

pub const PORT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_SCAN_PORTS: &[u16] = &[22, 80, 443, 3389];

#[derive(Debug, Clone, Serialize)]
pub struct NetworkInfo {
    pub interfaces: Vec<InterfaceInfo>,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortStatus {
    pub host: String,
    pub port: u16,
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostStatus {
    pub ip: String,
    pub status: String,
    pub ports: Vec<PortStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub network: String,
    pub hosts: Vec<HostStatus>,
}

pub fn diagnostic_invocations(platform: Platform) -> Vec<(&'static str, Invocation)> {
    if platform.is_windows() {
        vec![("ipconfig", Invocation::new("ipconfig", ["/all"]))]
    } else {
        vec![
            ("ifconfig", Invocation::new("ifconfig", ["-a"])),
            ("netstat", Invocation::new("netstat", ["-rn"])),
        ]
    }
}

pub async fn info(host: &Host<'_>) -> OsResult<NetworkInfo> {
    let interfaces = task::spawn_blocking(InterfaceInfo::list)
        .await
        .map_err(|e| OsError::OperationFailed(e.to_string()))?;

    let mut details = BTreeMap::new();
    for (label, invocation) in diagnostic_invocations(host.platform) {
        if let Some(output) = host.run_best_effort(&invocation).await {
            details.insert(label.to_string(), output.trim_end().to_string());
        }
    }

    Ok(NetworkInfo {
        interfaces,
        details,
    })
}

/// TCP connect probe. Connection errors are reported in the status, not
/// returned as failures.
pub async fn check_port(host: &str, port: u16) -> PortStatus {
    let (open, error) = match timeout(PORT_PROBE_TIMEOUT, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => (true, None),
        Ok(Err(e)) => (false, Some(e.to_string())),
        Err(_) => (
            false,
            Some(format!("timed out after {}ms", PORT_PROBE_TIMEOUT.as_millis())),
        ),
    };

    PortStatus {
        host: host.to_string(),
        port,
        open,
        error,
    }
}

/// Base address of a `a.b.c.d/nn` network.
pub fn base_address(network: &str) -> OsResult<IpAddr> {
    let base = network.split('/').next().unwrap_or(network).trim();
    base.parse()
        .map_err(|_| OsError::invalid("network", format!("'{base}' is not an IP address")))
}

pub fn ping_invocation(platform: Platform, ip: &IpAddr) -> Invocation {
    let ip = ip.to_string();
    match platform {
        Platform::Windows => Invocation::new("ping", ["-n", "1", "-w", "1000", ip.as_str()]),
        Platform::MacOs => Invocation::new("ping", ["-c", "1", "-t", "1", ip.as_str()]),
        Platform::Linux | Platform::OtherUnix => {
            Invocation::new("ping", ["-c", "1", "-W", "1", ip.as_str()])
        }
    }
}

/// Pings the base address of `network` and probes `ports` on it.
pub async fn scan(host: &Host<'_>, network: &str, ports: &[u16]) -> OsResult<ScanReport> {
    let ip = base_address(network)?;

    let status = match host.run(&ping_invocation(host.platform, &ip)).await {
        Ok(output) if output.success() => "up".to_string(),
        Ok(_) => "down".to_string(),
        Err(e) => {
            tracing::warn!("ping {} failed: {}", ip, e);
            "unknown".to_string()
        }
    };

    let mut probes = JoinSet::new();
    for &port in ports {
        let target = ip.to_string();
        probes.spawn(async move { check_port(&target, port).await });
    }

    let mut port_statuses = Vec::with_capacity(ports.len());
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok(port_status) => port_statuses.push(port_status),
            Err(e) => tracing::warn!("port probe task failed: {}", e),
        }
    }
    port_statuses.sort_by_key(|p| p.port);

    Ok(ScanReport {
        network: network.to_string(),
        hosts: vec![HostStatus {
            ip: ip.to_string(),
            status,
            ports: port_statuses,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_base_address() {
        assert_eq!(
            base_address("192.168.1.0/24").unwrap().to_string(),
            "192.168.1.0"
        );
        assert!(base_address("10.0.0.7").is_ok());
        assert!(matches!(
            base_address("example.com; rm -rf /"),
            Err(OsError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_ping_invocation() {
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(
            ping_invocation(Platform::Linux, &ip),
            Invocation::new("ping", ["-c", "1", "-W", "1", "10.0.0.1"])
        );
        assert_eq!(ping_invocation(Platform::Windows, &ip).args[0], "-n");
    }

    #[tokio::test]
    async fn test_check_port_open_and_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let open = check_port("127.0.0.1", port).await;
        assert!(open.open);
        assert!(open.error.is_none());

        drop(listener);
        let closed = check_port("127.0.0.1", port).await;
        assert!(!closed.open);
        assert!(closed.error.is_some());
    }
}
