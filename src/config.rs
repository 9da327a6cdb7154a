//! Environment configuration

use std::time::Duration;

/// Runtime configuration for the bot process
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token from @BotFather
    pub token: String,
    /// Path of the sqlite session store
    pub db_path: String,
    /// Directory holding `lessons/` and `quizzes/`
    pub content_dir: String,
    /// Interpreter used for code submissions
    pub python_bin: String,
    /// Wall-clock cap for one code run
    pub exec_timeout: Duration,
    /// Chat ids allowed to use the admin commands
    pub admin_ids: Vec<i64>,
    /// getUpdates long-poll hold time
    pub poll_timeout_secs: u64,
}

impl Config {
    /// Read configuration from the environment. Only the token is
    /// mandatory.
    pub fn from_env() -> Result<Self, String> {
        let token = std::env::var("PYTUTOR_BOT_TOKEN")
            .map_err(|_| "PYTUTOR_BOT_TOKEN is not set".to_string())?;

        let db_path = std::env::var("PYTUTOR_DB_PATH").unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            format!("{home}/.pytutor/sessions.db")
        });

        let content_dir =
            std::env::var("PYTUTOR_CONTENT_DIR").unwrap_or_else(|_| ".".to_string());

        let python_bin =
            std::env::var("PYTUTOR_PYTHON_BIN").unwrap_or_else(|_| "python3".to_string());

        let exec_timeout = std::env::var("PYTUTOR_EXEC_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map_or(crate::exec::DEFAULT_TIMEOUT, Duration::from_secs);

        let admin_ids = std::env::var("PYTUTOR_ADMIN_IDS")
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default();

        let poll_timeout_secs = std::env::var("PYTUTOR_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            token,
            db_path,
            content_dir,
            python_bin,
            exec_timeout,
            admin_ids,
            poll_timeout_secs,
        })
    }
}

/// Comma-separated chat ids; malformed entries are skipped with a warning
fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| match part.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(entry = part, "ignoring malformed admin id");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_ids_parse_and_skip_garbage() {
        assert_eq!(parse_admin_ids("1, 2,3"), vec![1, 2, 3]);
        assert_eq!(parse_admin_ids(""), Vec::<i64>::new());
        assert_eq!(parse_admin_ids("7,abc, 9"), vec![7, 9]);
    }
}
