//! On-disk journal directory.
//!
//! ```text
//! <journal>/
//!   journal.json    entries (newest first) and to-do items
//!   settings.json   key-value settings, e.g. LastCompletionDate
//! ```

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entries::Journal;
use crate::error::{StoreError, StoreResult};
use crate::settings::JsonSettings;
use crate::todo::TodoList;

pub const JOURNAL_FILE: &str = "journal.json";
pub const SETTINGS_FILE: &str = "settings.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct JournalFile {
    version: u32,
    entries: Journal,
    todos: TodoList,
}

#[derive(Debug, Clone)]
pub struct JournalStore {
    dir: PathBuf,
}

impl JournalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.join(JOURNAL_FILE).is_file()
    }

    /// Creates the directory with an empty journal.
    pub fn init(&self) -> StoreResult<()> {
        if self.exists() {
            return Err(StoreError::AlreadyExists(self.dir.clone()));
        }

        fs::create_dir_all(&self.dir)?;
        self.save(&Journal::default(), &TodoList::default())?;
        info!(path = %self.dir.display(), "created journal");
        Ok(())
    }

    pub fn load(&self) -> StoreResult<(Journal, TodoList)> {
        let path = self.dir.join(JOURNAL_FILE);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotAJournal(self.dir.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let data: JournalFile = serde_json::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            version = data.version,
            entries = data.entries.len(),
            todos = data.todos.items().len(),
            "loaded journal"
        );
        Ok((data.entries, data.todos))
    }

    /// Replaces `journal.json` via a staging file so a crash never leaves it half-written.
    pub fn save(&self, journal: &Journal, todos: &TodoList) -> StoreResult<()> {
        let path = self.dir.join(JOURNAL_FILE);
        let staging = self.dir.join(format!("{JOURNAL_FILE}.new"));

        let data = JournalFile {
            version: FORMAT_VERSION,
            entries: journal.clone(),
            todos: todos.clone(),
        };

        let mut writer = BufWriter::new(File::create(&staging)?);
        serde_json::to_writer_pretty(&mut writer, &data)?;
        writer.flush()?;
        drop(writer);
        fs::rename(&staging, &path)?;

        info!(path = %path.display(), entries = journal.len(), "saved journal");
        Ok(())
    }

    pub fn settings(&self) -> StoreResult<JsonSettings> {
        JsonSettings::open(self.dir.join(SETTINGS_FILE))
    }
}
