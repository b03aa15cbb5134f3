//! Permissions, ownership and symbolic links.

use super::{Host, Invocation, OsError, OsResult, Platform};
use std::path::Path;
use tokio::fs;

/// Parses a 3 or 4 digit octal mode such as `755` or `0644`.
pub fn parse_mode(permissions: &str) -> OsResult<u32> {
    let trimmed = permissions.trim();
    let valid_len = matches!(trimmed.len(), 3 | 4);
    if !valid_len || !trimmed.chars().all(|c| ('0'..='7').contains(&c)) {
        return Err(OsError::invalid(
            "permissions",
            format!("'{trimmed}' is not an octal mode like 755"),
        ));
    }
    u32::from_str_radix(trimmed, 8).map_err(|e| OsError::invalid("permissions", e.to_string()))
}

pub fn chmod_invocation(
    platform: Platform,
    path: &Path,
    permissions: &str,
    recursive: bool,
) -> OsResult<Invocation> {
    let path = path.display().to_string();
    if platform.is_windows() {
        let grant = permissions.trim();
        if grant.is_empty() {
            return Err(OsError::invalid("permissions", "icacls grant spec is empty"));
        }
        let mut args = vec![path, "/grant".to_string(), grant.to_string()];
        if recursive {
            args.push("/T".to_string());
        }
        return Ok(Invocation::new("icacls", args));
    }

    let mode = parse_mode(permissions)?;
    let mut args = Vec::new();
    if recursive {
        args.push("-R".to_string());
    }
    args.push(format!("{mode:o}"));
    args.push(path);
    Ok(Invocation::new("chmod", args))
}

pub async fn set_permissions(
    host: &Host<'_>,
    path: &Path,
    permissions: &str,
    recursive: bool,
) -> OsResult<()> {
    if fs::symlink_metadata(path).await.is_err() {
        return Err(OsError::NotFound(path.display().to_string()));
    }

    #[cfg(unix)]
    if !recursive && !host.platform.is_windows() {
        use std::os::unix::fs::PermissionsExt;
        let mode = parse_mode(permissions)?;
        fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
        return Ok(());
    }

    host.run_checked(&chmod_invocation(host.platform, path, permissions, recursive)?)
        .await?;
    Ok(())
}

pub fn chown_invocation(
    platform: Platform,
    path: &Path,
    user: Option<&str>,
    group: Option<&str>,
    recursive: bool,
) -> OsResult<Invocation> {
    if platform.is_windows() {
        return Err(OsError::Unsupported(
            "change_file_ownership is not available on Windows".to_string(),
        ));
    }

    let user = user.map(str::trim).filter(|u| !u.is_empty());
    let group = group.map(str::trim).filter(|g| !g.is_empty());
    let owner = match (user, group) {
        (Some(user), Some(group)) => format!("{user}:{group}"),
        (Some(user), None) => user.to_string(),
        (None, Some(group)) => format!(":{group}"),
        (None, None) => return Err(OsError::invalid("user", "user or group is required")),
    };

    let mut args = Vec::new();
    if recursive {
        args.push("-R".to_string());
    }
    args.push(owner);
    args.push(path.display().to_string());
    Ok(Invocation::new("chown", args))
}

pub async fn change_owner(
    host: &Host<'_>,
    path: &Path,
    user: Option<&str>,
    group: Option<&str>,
    recursive: bool,
) -> OsResult<()> {
    let invocation = chown_invocation(host.platform, path, user, group, recursive)?;
    host.run_checked(&invocation).await?;
    Ok(())
}

/// Creates `link` pointing at `target`, replacing an existing entry only
/// when `force` is set.
pub async fn symlink(target: &Path, link: &Path, force: bool) -> OsResult<()> {
    if let Ok(existing) = fs::symlink_metadata(link).await {
        if !force {
            return Err(OsError::invalid(
                "linkPath",
                format!("{} already exists", link.display()),
            ));
        }
        if existing.is_dir() {
            fs::remove_dir_all(link).await?;
        } else {
            fs::remove_file(link).await?;
        }
    }

    #[cfg(unix)]
    {
        fs::symlink(target, link).await?;
    }
    #[cfg(windows)]
    {
        if fs::metadata(target).await.map(|m| m.is_dir()).unwrap_or(false) {
            fs::symlink_dir(target, link).await?;
        } else {
            fs::symlink_file(target, link).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("755").unwrap(), 0o755);
        assert_eq!(parse_mode("0644").unwrap(), 0o644);
        assert!(parse_mode("rwx").is_err());
        assert!(parse_mode("888").is_err());
        assert!(parse_mode("75").is_err());
    }

    #[test]
    fn test_chmod_invocation_recursive() {
        let inv = chmod_invocation(Platform::Linux, Path::new("/srv/app"), "750", true).unwrap();
        assert_eq!(inv, Invocation::new("chmod", ["-R", "750", "/srv/app"]));
    }

    #[test]
    fn test_icacls_invocation() {
        let inv = chmod_invocation(
            Platform::Windows,
            Path::new("C:\\data"),
            "Users:(OI)(CI)R",
            true,
        )
        .unwrap();
        assert_eq!(
            inv,
            Invocation::new("icacls", ["C:\\data", "/grant", "Users:(OI)(CI)R", "/T"])
        );
    }

    #[test]
    fn test_chown_invocation() {
        let path = PathBuf::from("/srv/app");
        assert_eq!(
            chown_invocation(Platform::Linux, &path, Some("www"), Some("web"), true).unwrap(),
            Invocation::new("chown", ["-R", "www:web", "/srv/app"])
        );
        assert_eq!(
            chown_invocation(Platform::Linux, &path, None, Some("web"), false).unwrap(),
            Invocation::new("chown", [":web", "/srv/app"])
        );
        assert!(matches!(
            chown_invocation(Platform::Linux, &path, None, Some("  "), false),
            Err(OsError::InvalidArgument { .. })
        ));
        assert!(matches!(
            chown_invocation(Platform::Windows, &path, Some("a"), None, false),
            Err(OsError::Unsupported(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_force() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.txt");
        let other = dir.path().join("other.txt");
        let link = dir.path().join("link");
        std::fs::write(&target, "t").unwrap();
        std::fs::write(&other, "o").unwrap();

        symlink(&target, &link, false).await.unwrap();
        assert!(symlink(&other, &link, false).await.is_err());

        symlink(&other, &link, true).await.unwrap();
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "o");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_set_permissions_direct() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, "").unwrap();

        let runner = udc_executor::ShellRunner::new();
        let host = Host::new(&runner, Platform::current(), std::time::Duration::from_secs(5));
        set_permissions(&host, &file, "600", false).await.unwrap();

        let mode = std::fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
