//! Scheduled tasks: tagged crontab entries on Unix, `schtasks` on Windows.
//!
//! Crontab entries created here are preceded by a `# udc:<name>` line so
//! they can be listed and deleted by name without touching foreign entries.

use super::{Host, Invocation, OsError, OsResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

pub const CRON_TAG_PREFIX: &str = "# udc:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledTask {
    pub name: String,
    pub schedule: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

pub fn validate_name(name: &str) -> OsResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OsError::invalid("name", "must not be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(OsError::invalid(
            "name",
            "may only contain letters, digits, '-', '_' and '.'",
        ));
    }
    Ok(name)
}

fn single_line<'a>(field: &str, value: &'a str) -> OsResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OsError::invalid(field, "must not be empty"));
    }
    if value.contains(['\n', '\r']) {
        return Err(OsError::invalid(field, "must be a single line"));
    }
    Ok(value)
}

/// Accepts five cron fields or one of the `@` shorthands.
pub fn validate_schedule(schedule: &str) -> OsResult<String> {
    let schedule = single_line("schedule", schedule)?;
    if schedule.starts_with('@') {
        return Ok(schedule.to_string());
    }
    let fields: Vec<&str> = schedule.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(OsError::invalid(
            "schedule",
            format!("expected 5 cron fields, got {}", fields.len()),
        ));
    }
    Ok(fields.join(" "))
}

fn tag_line(name: &str) -> String {
    format!("{CRON_TAG_PREFIX}{name}")
}

fn split_entry(line: &str) -> (String, String) {
    if line.starts_with('@') {
        let (schedule, command) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        return (schedule.to_string(), command.trim().to_string());
    }
    let fields: Vec<&str> = line.split_whitespace().collect();
    let split = fields.len().min(5);
    (fields[..split].join(" "), fields[split..].join(" "))
}

/// Returns the crontab with a tagged entry appended.
pub fn append_entry(existing: &str, name: &str, schedule: &str, command: &str) -> OsResult<String> {
    let name = validate_name(name)?;
    let schedule = validate_schedule(schedule)?;
    let command = single_line("command", command)?;

    let tag = tag_line(name);
    if existing.lines().any(|line| line.trim() == tag) {
        return Err(OsError::invalid(
            "name",
            format!("a task named '{name}' already exists"),
        ));
    }

    let mut updated = existing.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&format!("{tag}\n{schedule} {command}\n"));
    Ok(updated)
}

/// Returns the crontab without the tagged entry, or `NotFound`.
pub fn remove_entry(existing: &str, name: &str) -> OsResult<String> {
    let tag = tag_line(validate_name(name)?);
    let mut kept = Vec::new();
    let mut lines = existing.lines();
    let mut found = false;

    while let Some(line) = lines.next() {
        if line.trim() == tag {
            found = true;
            // drop the entry that follows the tag as well
            lines.next();
            continue;
        }
        kept.push(line);
    }

    if !found {
        return Err(OsError::NotFound(format!("scheduled task '{name}'")));
    }
    let mut updated = kept.join("\n");
    if !updated.is_empty() {
        updated.push('\n');
    }
    Ok(updated)
}

pub fn parse_crontab(content: &str) -> Vec<ScheduledTask> {
    let mut tasks = Vec::new();
    let mut pending_name: Option<String> = None;

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix(CRON_TAG_PREFIX) {
            pending_name = Some(name.trim().to_string());
            continue;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // environment assignments such as MAILTO=root
        if !line.starts_with('@')
            && line
                .split_whitespace()
                .next()
                .is_some_and(|first| first.contains('='))
        {
            continue;
        }

        let (schedule, command) = split_entry(line);
        tasks.push(ScheduledTask {
            name: pending_name.take().unwrap_or_else(|| format!("cron-{index}")),
            schedule,
            command,
            status: None,
        });
    }
    tasks
}

/// Maps a cron expression to a `schtasks /sc` value.
pub fn windows_schedule_type(schedule: &str) -> &'static str {
    let normalized = schedule.split_whitespace().collect::<Vec<_>>().join(" ");
    match normalized.as_str() {
        "* * * * *" => "MINUTE",
        "0 * * * *" => "HOURLY",
        "0 0 * * *" => "DAILY",
        "0 0 * * 0" => "WEEKLY",
        "0 0 1 * *" => "MONTHLY",
        _ => "ONCE",
    }
}

/// `HH:MM` start time when minute and hour are plain numbers.
fn windows_start_time(schedule: &str) -> Option<String> {
    let fields: Vec<&str> = schedule.split_whitespace().collect();
    let numeric = |f: &str| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit());
    if fields.len() != 5 || !numeric(fields[0]) || !numeric(fields[1]) {
        return None;
    }
    Some(format!("{:0>2}:{:0>2}", fields[1], fields[0]))
}

pub fn schtasks_create_invocation(
    name: &str,
    command: &str,
    schedule: &str,
    run_as_admin: bool,
) -> OsResult<Invocation> {
    let name = validate_name(name)?;
    let command = single_line("command", command)?;
    let schedule = validate_schedule(schedule)?;

    let mut args: Vec<String> = ["/create", "/tn", name, "/tr", command, "/sc"]
        .into_iter()
        .map(str::to_string)
        .collect();
    args.push(windows_schedule_type(&schedule).to_string());
    if let Some(start) = windows_start_time(&schedule) {
        args.extend(["/st".to_string(), start]);
    }
    if run_as_admin {
        args.extend(["/rl".to_string(), "HIGHEST".to_string()]);
    }
    Ok(Invocation::new("schtasks", args))
}

/// Parses `schtasks /query /fo LIST /v` output.
pub fn parse_schtasks(output: &str) -> Vec<ScheduledTask> {
    output
        .replace("\r\n", "\n")
        .split("\n\n")
        .filter_map(|block| {
            let fields: BTreeMap<&str, &str> = block
                .lines()
                .filter_map(|line| {
                    let (key, value) = line.split_once(':')?;
                    Some((key.trim(), value.trim()))
                })
                .collect();
            let name = fields.get("TaskName")?;
            Some(ScheduledTask {
                name: name.trim_start_matches('\\').to_string(),
                schedule: fields.get("Schedule Type").copied().unwrap_or_default().to_string(),
                command: fields.get("Task To Run").copied().unwrap_or_default().to_string(),
                status: fields.get("Status").map(|s| s.to_string()),
            })
        })
        .collect()
}

async fn read_crontab(host: &Host<'_>) -> OsResult<String> {
    let output = host.run(&Invocation::new("crontab", ["-l"])).await?;
    if output.success() {
        return Ok(output.stdout);
    }
    if output.stderr.to_lowercase().contains("no crontab") {
        return Ok(String::new());
    }
    Err(OsError::OperationFailed(format!(
        "crontab -l exited with code {}: {}",
        output.exit_code,
        output.stderr.trim()
    )))
}

async fn install_crontab(host: &Host<'_>, content: &str) -> OsResult<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    let path = file.path().display().to_string();
    host.run_checked(&Invocation::new("crontab", [path])).await?;
    Ok(())
}

pub async fn create(
    host: &Host<'_>,
    name: &str,
    command: &str,
    schedule: &str,
    run_as_admin: bool,
) -> OsResult<()> {
    if host.platform.is_windows() {
        let invocation = schtasks_create_invocation(name, command, schedule, run_as_admin)?;
        host.run_checked(&invocation).await?;
    } else {
        if run_as_admin {
            tracing::warn!("runAsAdmin is ignored for crontab entries");
        }
        let existing = read_crontab(host).await?;
        let updated = append_entry(&existing, name, schedule, command)?;
        install_crontab(host, &updated).await?;
    }
    tracing::info!("Scheduled task created: {}", name);
    Ok(())
}

pub async fn list(host: &Host<'_>, filter: Option<&str>) -> OsResult<Vec<ScheduledTask>> {
    let tasks = if host.platform.is_windows() {
        let output = host
            .run_checked(&Invocation::new("schtasks", ["/query", "/fo", "LIST", "/v"]))
            .await?;
        parse_schtasks(&output.stdout)
    } else {
        parse_crontab(&read_crontab(host).await?)
    };

    let filter = filter.map(|f| f.trim().to_lowercase()).filter(|f| !f.is_empty());
    Ok(match filter {
        Some(filter) => tasks
            .into_iter()
            .filter(|t| {
                t.name.to_lowercase().contains(&filter) || t.command.to_lowercase().contains(&filter)
            })
            .collect(),
        None => tasks,
    })
}

pub async fn delete(host: &Host<'_>, name: &str) -> OsResult<()> {
    if host.platform.is_windows() {
        let name = validate_name(name)?;
        host.run_checked(&Invocation::new("schtasks", ["/delete", "/tn", name, "/f"]))
            .await?;
    } else {
        let existing = read_crontab(host).await?;
        let updated = remove_entry(&existing, name)?;
        install_crontab(host, &updated).await?;
    }
    tracing::info!("Scheduled task deleted: {}", name);
    Ok(())
}
