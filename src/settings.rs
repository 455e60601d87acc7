use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};
use tracing::{info, warn};

use crate::error::StoreResult;

/// Settings key holding the day the app was last opened.
pub const LAST_COMPLETION_DATE: &str = "LastCompletionDate";

pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Flat string key-value settings.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> StoreResult<()>;

    /// An unparseable stored date is treated as absent.
    fn last_completion_date(&self) -> Option<Date> {
        let raw = self.get(LAST_COMPLETION_DATE)?;
        match Date::parse(&raw, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(e) => {
                warn!(value = %raw, error = %e, "ignoring malformed {LAST_COMPLETION_DATE}");
                None
            }
        }
    }

    fn set_last_completion_date(&mut self, date: Date) -> StoreResult<()> {
        let value = date
            .format(DATE_FORMAT)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.set(LAST_COMPLETION_DATE, value)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    values: BTreeMap<String, String>,
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> StoreResult<()> {
        self.values.insert(key.to_owned(), value);
        Ok(())
    }
}

/// Settings persisted as a JSON object; every `set` rewrites the file.
#[derive(Debug)]
pub struct JsonSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonSettings {
    /// A missing file yields empty settings.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let values = match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> StoreResult<()> {
        self.values.insert(key.to_owned(), value);

        let staging = self.path.with_extension("json.new");
        serde_json::to_writer_pretty(File::create(&staging)?, &self.values)?;
        fs::rename(&staging, &self.path)?;

        info!(key, path = %self.path.display(), "saved setting");
        Ok(())
    }
}
