//! Durable integer lists: one decimal id per line, ascending.

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{errors::Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListName {
    Channels,
    Users,
}

impl ListName {
    pub fn as_str(self) -> &'static str {
        match self {
            ListName::Channels => "channels",
            ListName::Users => "users",
        }
    }
}

pub trait ListStore: Send + Sync {
    /// Missing or unreadable lists load as empty; malformed lines are skipped.
    fn load(&self, list: ListName) -> BTreeSet<i64>;

    /// Replace the stored list with `ids`.
    fn save(&self, list: ListName, ids: &BTreeSet<i64>) -> Result<()>;
}

/// Plain-text files, one per list.
#[derive(Clone, Debug)]
pub struct FileListStore {
    channels_path: PathBuf,
    users_path: PathBuf,
}

impl FileListStore {
    pub fn new(channels_path: impl Into<PathBuf>, users_path: impl Into<PathBuf>) -> Self {
        Self {
            channels_path: channels_path.into(),
            users_path: users_path.into(),
        }
    }

    pub fn path(&self, list: ListName) -> &Path {
        match list {
            ListName::Channels => &self.channels_path,
            ListName::Users => &self.users_path,
        }
    }
}

impl ListStore for FileListStore {
    fn load(&self, list: ListName) -> BTreeSet<i64> {
        let path = self.path(list);
        match fs::read_to_string(path) {
            Ok(contents) => parse_list(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(list = list.as_str(), path = %path.display(), "failed to read list, starting empty: {e}");
                BTreeSet::new()
            }
        }
    }

    fn save(&self, list: ListName, ids: &BTreeSet<i64>) -> Result<()> {
        let path = self.path(list);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, render_list(ids))?;
        Ok(())
    }
}

/// In-memory lists, for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryListStore {
    lists: Mutex<HashMap<ListName, BTreeSet<i64>>>,
}

impl MemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(self, list: ListName, ids: impl IntoIterator<Item = i64>) -> Self {
        if let Ok(mut lists) = self.lists.lock() {
            lists.insert(list, ids.into_iter().collect());
        }
        self
    }
}

impl ListStore for MemoryListStore {
    fn load(&self, list: ListName) -> BTreeSet<i64> {
        self.lists
            .lock()
            .map(|lists| lists.get(&list).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn save(&self, list: ListName, ids: &BTreeSet<i64>) -> Result<()> {
        let mut lists = self
            .lists
            .lock()
            .map_err(|_| Error::External("list store lock poisoned".to_string()))?;
        lists.insert(list, ids.clone());
        Ok(())
    }
}

fn parse_list(contents: &str) -> BTreeSet<i64> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| l.parse::<i64>().ok())
        .collect()
}

fn render_list(ids: &BTreeSet<i64>) -> String {
    let mut out = String::new();
    for id in ids {
        out.push_str(&id.to_string());
        out.push('\n');
    }
    out
}
