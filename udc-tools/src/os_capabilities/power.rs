//! Shutdown, reboot, sleep and hibernate.

use super::{Host, Invocation, OsError, OsResult, Platform};
use crate::call::PowerAction;

/// Minutes argument for `shutdown +m`, rounding partial minutes up.
fn delay_minutes(delay_seconds: u64) -> u64 {
    delay_seconds.div_ceil(60)
}

pub fn power_invocation(
    platform: Platform,
    action: PowerAction,
    delay_seconds: u64,
    force: bool,
) -> OsResult<Invocation> {
    let delayed = delay_seconds > 0;
    if delayed && matches!(action, PowerAction::Sleep | PowerAction::Hibernate) {
        return Err(OsError::invalid(
            "delaySeconds",
            format!("{} cannot be delayed", action.as_str()),
        ));
    }

    match platform {
        Platform::Windows => {
            let mut args = match action {
                PowerAction::Shutdown => vec!["/s".to_string(), "/t".to_string(), delay_seconds.to_string()],
                PowerAction::Reboot => vec!["/r".to_string(), "/t".to_string(), delay_seconds.to_string()],
                PowerAction::Sleep | PowerAction::Hibernate => vec!["/h".to_string()],
            };
            if force {
                args.push("/f".to_string());
            }
            Ok(Invocation::new("shutdown", args))
        }
        Platform::Linux | Platform::MacOs | Platform::OtherUnix => {
            let when = if delayed {
                format!("+{}", delay_minutes(delay_seconds))
            } else {
                "now".to_string()
            };
            match (action, platform) {
                (PowerAction::Shutdown, _) => {
                    Ok(Invocation::new("sudo", ["-n".to_string(), "shutdown".to_string(), "-h".to_string(), when]))
                }
                (PowerAction::Reboot, _) => {
                    Ok(Invocation::new("sudo", ["-n".to_string(), "shutdown".to_string(), "-r".to_string(), when]))
                }
                (PowerAction::Sleep, Platform::Linux) => {
                    Ok(Invocation::new("systemctl", ["suspend"]))
                }
                (PowerAction::Hibernate, Platform::Linux) => {
                    Ok(Invocation::new("systemctl", ["hibernate"]))
                }
                (PowerAction::Sleep, Platform::MacOs) => Ok(Invocation::new("pmset", ["sleepnow"])),
                (other, _) => Err(OsError::Unsupported(format!(
                    "{} is not available on this platform",
                    other.as_str()
                ))),
            }
        }
    }
}

pub async fn perform(
    host: &Host<'_>,
    action: PowerAction,
    delay_seconds: u64,
    force: bool,
) -> OsResult<String> {
    let invocation = power_invocation(host.platform, action, delay_seconds, force)?;
    let output = host.run_checked(&invocation).await?;
    tracing::warn!(
        "Power action {} initiated (delay {}s)",
        action.as_str(),
        delay_seconds
    );
    Ok(output.text().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_shutdown_rounds_delay_up() {
        let inv = power_invocation(Platform::Linux, PowerAction::Shutdown, 90, false).unwrap();
        assert_eq!(inv, Invocation::new("sudo", ["-n", "shutdown", "-h", "+2"]));

        let inv = power_invocation(Platform::Linux, PowerAction::Reboot, 0, false).unwrap();
        assert_eq!(inv, Invocation::new("sudo", ["-n", "shutdown", "-r", "now"]));
    }

    #[test]
    fn test_windows_invocations() {
        let inv = power_invocation(Platform::Windows, PowerAction::Reboot, 30, true).unwrap();
        assert_eq!(inv, Invocation::new("shutdown", ["/r", "/t", "30", "/f"]));

        let inv = power_invocation(Platform::Windows, PowerAction::Hibernate, 0, false).unwrap();
        assert_eq!(inv, Invocation::new("shutdown", ["/h"]));
    }

    #[test]
    fn test_sleep_variants() {
        assert_eq!(
            power_invocation(Platform::Linux, PowerAction::Sleep, 0, false).unwrap(),
            Invocation::new("systemctl", ["suspend"])
        );
        assert_eq!(
            power_invocation(Platform::MacOs, PowerAction::Sleep, 0, false).unwrap(),
            Invocation::new("pmset", ["sleepnow"])
        );
        assert!(matches!(
            power_invocation(Platform::MacOs, PowerAction::Hibernate, 0, false),
            Err(OsError::Unsupported(_))
        ));
    }

    #[test]
    fn test_sleep_rejects_delay() {
        assert!(matches!(
            power_invocation(Platform::Linux, PowerAction::Sleep, 60, false),
            Err(OsError::InvalidArgument { .. })
        ));
    }
}
