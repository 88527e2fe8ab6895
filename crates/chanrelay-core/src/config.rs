use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{domain::UserId, errors::Error, Result};

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    /// Users allowed to issue commands without being relay recipients.
    pub admin_users: Vec<UserId>,

    // Persistence
    pub channels_file: PathBuf,
    pub users_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in `load`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admin_users = parse_csv_i64(lookup("RELAY_ADMIN_USERS"))
            .into_iter()
            .map(UserId)
            .collect();

        let data_dir = lookup("RELAY_DATA_DIR")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let channels_file = data_dir.join(
            lookup("CHANNELS_FILE")
                .and_then(non_empty)
                .unwrap_or_else(|| "channels.txt".to_string()),
        );
        let users_file = data_dir.join(
            lookup("USERS_FILE")
                .and_then(non_empty)
                .unwrap_or_else(|| "users.txt".to_string()),
        );

        Ok(Self {
            telegram_bot_token: telegram_bot_token.trim().to_string(),
            admin_users,
            channels_file,
            users_file,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn token_is_required() {
        let err = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn defaults_to_files_in_the_working_dir() {
        let cfg = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "t")])).unwrap();
        assert_eq!(cfg.channels_file, PathBuf::from("./channels.txt"));
        assert_eq!(cfg.users_file, PathBuf::from("./users.txt"));
        assert!(cfg.admin_users.is_empty());
    }

    #[test]
    fn reads_admins_and_paths() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("RELAY_ADMIN_USERS", "12345, oops, -7"),
            ("RELAY_DATA_DIR", "/var/lib/chanrelay"),
            ("CHANNELS_FILE", "chans.txt"),
            ("USERS_FILE", "/etc/chanrelay/users.txt"),
        ]))
        .unwrap();
        assert_eq!(cfg.admin_users, vec![UserId(12345), UserId(-7)]);
        assert_eq!(
            cfg.channels_file,
            PathBuf::from("/var/lib/chanrelay/chans.txt")
        );
        // Absolute paths win over the data dir.
        assert_eq!(cfg.users_file, PathBuf::from("/etc/chanrelay/users.txt"));
    }

    #[test]
    fn dotenv_strips_quotes_and_comments() {
        let parsed = parse_dotenv("# c\nA=1\nB = \"two words\"\nbad line\n='x'\nC='3'\n");
        assert_eq!(
            parsed,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "two words".to_string()),
                ("C".to_string(), "3".to_string()),
            ]
        );
    }
}
