use crate::os_capabilities::{OsError, OsResult};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Resolves caller-supplied paths and optionally confines them to a set of
/// allowed roots. An empty root list means every path is permitted.
#[derive(Debug, Clone, Default)]
pub struct PathGuard {
    allowed: Vec<PathBuf>,
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Expands a leading `~` and makes the path absolute against the working
/// directory. `.` and `..` components are folded lexically.
pub fn expand(raw: &str) -> OsResult<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(OsError::invalid("path", "must not be empty"));
    }

    let expanded = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => {
            let home = home_dir()
                .ok_or_else(|| OsError::invalid("path", "home directory is not set"))?;
            home.join(rest.trim_start_matches(['/', '\\']))
        }
        _ => PathBuf::from(raw),
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()?.join(expanded)
    };

    Ok(normalize(&absolute))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalizes the deepest existing ancestor so symlinks inside the
/// allowed roots cannot point outside of them.
fn resolve_existing_prefix(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut tail = Vec::new();
    loop {
        if let Ok(canonical) = fs::canonicalize(&existing) {
            let mut resolved = canonical;
            for part in tail.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
            (Some(name), Some(parent)) => {
                tail.push(name);
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}

impl PathGuard {
    pub fn new<I, S>(allowed: I) -> OsResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed
            .into_iter()
            .map(|dir| expand(dir.as_ref()).map(|p| resolve_existing_prefix(&p)))
            .collect::<OsResult<Vec<_>>>()?;
        Ok(Self { allowed })
    }

    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn allowed_directories(&self) -> &[PathBuf] {
        &self.allowed
    }

    pub fn is_restricted(&self) -> bool {
        !self.allowed.is_empty()
    }

    pub fn validate(&self, raw: &str) -> OsResult<PathBuf> {
        let path = expand(raw)?;
        if !self.is_restricted() {
            return Ok(path);
        }

        let resolved = resolve_existing_prefix(&path);
        if self.allowed.iter().any(|root| resolved.starts_with(root)) {
            Ok(path)
        } else {
            Err(OsError::AccessDenied(format!(
                "{} is outside the allowed directories",
                path.display()
            )))
        }
    }
}
