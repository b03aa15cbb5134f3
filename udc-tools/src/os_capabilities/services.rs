//! System service listing and control.

use super::{Host, Invocation, OsError, OsResult, Platform};
use crate::call::ServiceAction;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceInfo {
    fn matches(&self, filter: &str) -> bool {
        let filter = filter.to_lowercase();
        self.name.to_lowercase().contains(&filter)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&filter))
    }
}

/// Parses `systemctl list-units --no-legend --plain` rows:
/// `UNIT LOAD ACTIVE SUB DESCRIPTION...`.
pub fn parse_systemctl(output: &str) -> Vec<ServiceInfo> {
    output
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let unit = cols.next()?;
            let _load = cols.next()?;
            let active = cols.next()?;
            let sub = cols.next()?;
            let description = cols.collect::<Vec<_>>().join(" ");
            Some(ServiceInfo {
                name: unit.trim_end_matches(".service").to_string(),
                status: format!("{active} ({sub})"),
                description: (!description.is_empty()).then_some(description),
            })
        })
        .collect()
}

/// Parses `service --status-all` rows such as ` [ + ]  cron`.
pub fn parse_service_status_all(output: &str) -> Vec<ServiceInfo> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line.strip_prefix('[')?;
            let (flag, name) = rest.split_once(']')?;
            let status = match flag.trim() {
                "+" => "running",
                "-" => "stopped",
                _ => "unknown",
            };
            let name = name.trim();
            (!name.is_empty()).then(|| ServiceInfo {
                name: name.to_string(),
                status: status.to_string(),
                description: None,
            })
        })
        .collect()
}

/// Parses `sc query state= all` blocks.
pub fn parse_sc_query(output: &str) -> Vec<ServiceInfo> {
    let mut services = Vec::new();
    let mut current: Option<ServiceInfo> = None;

    for line in output.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix("SERVICE_NAME:") {
            if let Some(done) = current.take() {
                services.push(done);
            }
            current = Some(ServiceInfo {
                name: name.trim().to_string(),
                status: "unknown".to_string(),
                description: None,
            });
        } else if let Some(service) = current.as_mut() {
            if let Some(display) = line.strip_prefix("DISPLAY_NAME:") {
                service.description = Some(display.trim().to_string());
            } else if let Some(state) = line.strip_prefix("STATE") {
                // "STATE              : 4  RUNNING"
                if let Some(word) = state.split_whitespace().last() {
                    service.status = word.to_lowercase();
                }
            }
        }
    }
    if let Some(done) = current {
        services.push(done);
    }
    services
}

/// Parses `launchctl list` rows: `PID STATUS LABEL`.
pub fn parse_launchctl(output: &str) -> Vec<ServiceInfo> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let pid = cols.next()?;
            let _status = cols.next()?;
            let label = cols.next()?;
            Some(ServiceInfo {
                name: label.to_string(),
                status: if pid == "-" { "stopped" } else { "running" }.to_string(),
                description: None,
            })
        })
        .collect()
}

pub async fn list(host: &Host<'_>, filter: Option<&str>) -> OsResult<Vec<ServiceInfo>> {
    let services = match host.platform {
        Platform::Windows => {
            let output = host
                .run_checked(&Invocation::new("sc", ["query", "state=", "all"]))
                .await?;
            parse_sc_query(&output.stdout)
        }
        Platform::MacOs => {
            let output = host
                .run_checked(&Invocation::new("launchctl", ["list"]))
                .await?;
            parse_launchctl(&output.stdout)
        }
        Platform::Linux | Platform::OtherUnix => {
            let systemctl = Invocation::new(
                "systemctl",
                [
                    "list-units",
                    "--type=service",
                    "--all",
                    "--no-pager",
                    "--no-legend",
                    "--plain",
                ],
            );
            match host.run_checked(&systemctl).await {
                Ok(output) => parse_systemctl(&output.stdout),
                Err(e) => {
                    tracing::debug!("systemctl unavailable ({}), falling back to service", e);
                    let output = host
                        .run(&Invocation::new("service", ["--status-all"]))
                        .await?;
                    // `service --status-all` exits non-zero when any script fails
                    let mut combined = output.stdout;
                    combined.push_str(&output.stderr);
                    parse_service_status_all(&combined)
                }
            }
        }
    };

    let filter = filter.map(str::trim).filter(|f| !f.is_empty());
    Ok(match filter {
        Some(filter) => services.into_iter().filter(|s| s.matches(filter)).collect(),
        None => services,
    })
}

pub fn manage_invocations(
    platform: Platform,
    service: &str,
    action: ServiceAction,
) -> OsResult<Vec<Invocation>> {
    let service = service.trim();
    if service.is_empty() {
        return Err(OsError::invalid("serviceName", "must not be empty"));
    }

    match platform {
        Platform::Windows => Ok(match action {
            ServiceAction::Start => vec![Invocation::new("net", ["start", service])],
            ServiceAction::Stop => vec![Invocation::new("net", ["stop", service])],
            ServiceAction::Restart => vec![
                Invocation::new("net", ["stop", service]),
                Invocation::new("net", ["start", service]),
            ],
            ServiceAction::Enable => {
                vec![Invocation::new("sc", ["config", service, "start=", "auto"])]
            }
            ServiceAction::Disable => {
                vec![Invocation::new("sc", ["config", service, "start=", "disabled"])]
            }
        }),
        Platform::Linux => Ok(vec![Invocation::new(
            "sudo",
            ["-n", "systemctl", action.as_str(), service],
        )]),
        Platform::MacOs | Platform::OtherUnix => Err(OsError::Unsupported(
            "service management requires systemd or Windows".to_string(),
        )),
    }
}

pub async fn manage(host: &Host<'_>, service: &str, action: ServiceAction) -> OsResult<String> {
    let mut transcript = Vec::new();
    for invocation in manage_invocations(host.platform, service, action)? {
        let output = host.run_checked(&invocation).await?;
        let text = output.text().trim();
        if !text.is_empty() {
            transcript.push(text.to_string());
        }
    }
    tracing::info!("Service {} {}", service, action.as_str());
    Ok(transcript.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_systemctl() {
        let output = "\
cron.service loaded active running Regular background program processing daemon
ssh.service loaded inactive dead OpenBSD Secure Shell server
";
        let services = parse_systemctl(output);
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].name, "cron");
        assert_eq!(services[0].status, "active (running)");
        assert_eq!(
            services[1].description.as_deref(),
            Some("OpenBSD Secure Shell server")
        );
    }

    #[test]
    fn test_parse_service_status_all() {
        let output = " [ + ]  cron\n [ - ]  nginx\n [ ? ]  hwclock.sh\n";
        let services = parse_service_status_all(output);
        assert_eq!(services.len(), 3);
        assert_eq!(services[0].status, "running");
        assert_eq!(services[1].name, "nginx");
        assert_eq!(services[2].status, "unknown");
    }

    #[test]
    fn test_parse_sc_query() {
        let output = "\
SERVICE_NAME: Spooler
DISPLAY_NAME: Print Spooler
        TYPE               : 110  WIN32_OWN_PROCESS
        STATE              : 4  RUNNING

SERVICE_NAME: wuauserv
DISPLAY_NAME: Windows Update
        STATE              : 1  STOPPED
";
        let services = parse_sc_query(output);
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].status, "running");
        assert_eq!(services[1].description.as_deref(), Some("Windows Update"));
    }

    #[test]
    fn test_filter_matches_description() {
        let service = ServiceInfo {
            name: "spooler".into(),
            status: "running".into(),
            description: Some("Print Spooler".into()),
        };
        assert!(service.matches("PRINT"));
        assert!(!service.matches("update"));
    }

    #[test]
    fn test_manage_invocations() {
        let linux = manage_invocations(Platform::Linux, "nginx", ServiceAction::Restart).unwrap();
        assert_eq!(
            linux,
            vec![Invocation::new("sudo", ["-n", "systemctl", "restart", "nginx"])]
        );

        let windows =
            manage_invocations(Platform::Windows, "Spooler", ServiceAction::Restart).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].args, vec!["stop", "Spooler"]);

        assert!(manage_invocations(Platform::Linux, " ", ServiceAction::Start).is_err());
    }
}
