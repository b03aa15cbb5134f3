use parking_lot::RwLock;
use std::collections::BTreeSet;
use tracing::info;

pub const DEFAULT_BLOCKED_COMMANDS: &[&str] = &[
    "format", "mount", "umount", "mkfs", "fdisk", "dd", "sudo", "su", "passwd", "adduser",
    "useradd", "usermod", "groupadd",
];

// `$(` comes before `(` so substitutions open a fresh segment
const SEGMENT_SEPARATORS: &[&str] = &[
    "&&", "||", ";", "|", "&", "\n", "\r", "$(", "`", "(", ")",
];

/// Decides whether a raw command line may be executed.
pub trait CommandPolicy: Send + Sync {
    fn is_command_allowed(&self, command: &str) -> bool;
}

struct BlocklistState {
    enabled: bool,
    blocked: BTreeSet<String>,
}

/// Runtime-editable list of blocked commands.
///
/// A command line is split into segments on control operators, newlines
/// and subshell or substitution openers. Leading `NAME=value` assignments
/// are skipped to find each segment's program. A single-word entry blocks
/// a program by base name or stem; a multi-word entry blocks segments
/// whose leading words match it, e.g. `rm -rf` blocks `rm -rf /tmp/x`
/// but not `rm file`.
pub struct CommandBlocklist {
    state: RwLock<BlocklistState>,
}

impl CommandBlocklist {
    pub fn new<I, S>(blocked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let blocked = blocked
            .into_iter()
            .map(|c| normalize_entry(c.as_ref()))
            .filter(|c| !c.is_empty())
            .collect();

        Self {
            state: RwLock::new(BlocklistState {
                enabled: true,
                blocked,
            }),
        }
    }

    /// Returns false when the command was already blocked or is blank.
    pub fn block(&self, command: &str) -> bool {
        let command = normalize_entry(command);
        if command.is_empty() {
            return false;
        }
        let inserted = self.state.write().blocked.insert(command.clone());
        if inserted {
            info!("Command blocked: {}", command);
        }
        inserted
    }

    /// Returns false when the command was not blocked.
    pub fn unblock(&self, command: &str) -> bool {
        let command = normalize_entry(command);
        let removed = self.state.write().blocked.remove(&command);
        if removed {
            info!("Command unblocked: {}", command);
        }
        removed
    }

    pub fn list(&self) -> Vec<String> {
        self.state.read().blocked.iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.state.write().blocked.clear();
        info!("Blocked command list cleared");
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.write().enabled = enabled;
        info!("Command blocking {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn is_enabled(&self) -> bool {
        self.state.read().enabled
    }

    /// Lowercased words of each segment, program first, with its path
    /// stripped.
    fn segments(command: &str) -> Vec<Vec<String>> {
        let mut segments = vec![command.to_string()];
        for sep in SEGMENT_SEPARATORS {
            segments = segments
                .iter()
                .flat_map(|s| s.split(sep).map(str::to_string).collect::<Vec<_>>())
                .collect();
        }

        segments
            .iter()
            .filter_map(|segment| {
                let mut words = segment
                    .split_whitespace()
                    .skip_while(|word| is_assignment(word))
                    .map(str::to_lowercase);
                let program = words.next()?;
                let base = program
                    .rsplit(['/', '\\'])
                    .next()
                    .unwrap_or(program.as_str())
                    .trim_matches(|c| c == '"' || c == '\'' || c == '{' || c == '}')
                    .to_string();
                if base.is_empty() {
                    return None;
                }
                Some(std::iter::once(base).chain(words).collect())
            })
            .collect()
    }
}

fn normalize_entry(command: &str) -> String {
    command
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_assignment(word: &str) -> bool {
    let Some((name, _)) = word.split_once('=') else {
        return false;
    };
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn entry_matches(entry: &str, words: &[String]) -> bool {
    let mut wanted = entry.split(' ');
    let (Some(program), Some(base)) = (wanted.next(), words.first()) else {
        return false;
    };
    let stem = base.split('.').next().unwrap_or(base);
    if program != base && program != stem {
        return false;
    }

    let rest: Vec<&str> = wanted.collect();
    rest.len() < words.len()
        && rest
            .iter()
            .zip(&words[1..])
            .all(|(want, word)| *want == word.as_str())
}

impl Default for CommandBlocklist {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED_COMMANDS)
    }
}

impl CommandPolicy for CommandBlocklist {
    fn is_command_allowed(&self, command: &str) -> bool {
        let state = self.state.read();
        if !state.enabled {
            return true;
        }

        Self::segments(command).iter().all(|words| {
            !state
                .blocked
                .iter()
                .any(|entry| entry_matches(entry, words))
        })
    }
}
