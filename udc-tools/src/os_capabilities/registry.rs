//! Windows registry access through `reg.exe`.

use super::{Host, Invocation, OsError, OsResult, Platform};
use crate::call::RegistryAction;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RegistryOutcome {
    pub action: &'static str,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

pub fn value_type(raw: Option<&str>) -> OsResult<&'static str> {
    match raw.map(|t| t.trim().to_uppercase()).as_deref() {
        None | Some("") | Some("STRING") | Some("REG_SZ") => Ok("REG_SZ"),
        Some("DWORD") | Some("REG_DWORD") => Ok("REG_DWORD"),
        Some("BINARY") | Some("REG_BINARY") => Ok("REG_BINARY"),
        Some(other) => Err(OsError::invalid(
            "type",
            format!("unsupported registry type '{other}'"),
        )),
    }
}

fn required<'a>(field: &str, value: Option<&'a str>) -> OsResult<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OsError::invalid(field, "is required for this action"))
}

pub fn registry_invocation(
    platform: Platform,
    action: RegistryAction,
    key: &str,
    value: Option<&str>,
    data: Option<&str>,
    raw_type: Option<&str>,
) -> OsResult<Invocation> {
    if !platform.is_windows() {
        return Err(OsError::Unsupported(
            "registry operations are only available on Windows".to_string(),
        ));
    }
    if key.trim().is_empty() {
        return Err(OsError::invalid("key", "must not be empty"));
    }

    let invocation = match action {
        RegistryAction::Read => {
            let mut args = vec!["query".to_string(), key.to_string()];
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                args.extend(["/v".to_string(), value.to_string()]);
            }
            Invocation::new("reg", args)
        }
        RegistryAction::Write => {
            let value = required("value", value)?;
            let data = data.unwrap_or_default();
            Invocation::new(
                "reg",
                [
                    "add", key, "/v", value, "/t", value_type(raw_type)?, "/d", data, "/f",
                ],
            )
        }
        RegistryAction::Delete => {
            let value = required("value", value)?;
            Invocation::new("reg", ["delete", key, "/v", value, "/f"])
        }
    };
    Ok(invocation)
}

pub async fn operate(
    host: &Host<'_>,
    action: RegistryAction,
    key: &str,
    value: Option<&str>,
    data: Option<&str>,
    raw_type: Option<&str>,
) -> OsResult<RegistryOutcome> {
    let invocation = registry_invocation(host.platform, action, key, value, data, raw_type)?;
    let output = host.run_checked(&invocation).await?;

    let (label, data) = match action {
        RegistryAction::Read => ("read", Some(output.stdout.trim().to_string())),
        RegistryAction::Write => ("write", data.map(str::to_string)),
        RegistryAction::Delete => ("delete", None),
    };
    Ok(RegistryOutcome {
        action: label,
        key: key.to_string(),
        value: value.map(str::to_string),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "HKCU\\Software\\Udc";

    #[test]
    fn test_non_windows_unsupported() {
        let result = registry_invocation(Platform::Linux, RegistryAction::Read, KEY, None, None, None);
        assert!(matches!(result, Err(OsError::Unsupported(_))));
    }

    #[test]
    fn test_write_maps_type() {
        let inv = registry_invocation(
            Platform::Windows,
            RegistryAction::Write,
            KEY,
            Some("Level"),
            Some("3"),
            Some("dword"),
        )
        .unwrap();
        assert_eq!(
            inv,
            Invocation::new(
                "reg",
                ["add", KEY, "/v", "Level", "/t", "REG_DWORD", "/d", "3", "/f"]
            )
        );
    }

    #[test]
    fn test_delete_requires_value() {
        let result =
            registry_invocation(Platform::Windows, RegistryAction::Delete, KEY, None, None, None);
        assert!(matches!(result, Err(OsError::InvalidArgument { .. })));
    }

    #[test]
    fn test_value_type() {
        assert_eq!(value_type(None).unwrap(), "REG_SZ");
        assert_eq!(value_type(Some("binary")).unwrap(), "REG_BINARY");
        assert!(value_type(Some("QWORD")).is_err());
    }
}
