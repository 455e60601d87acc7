//! Application state shared by every command.
//!
//! `AppState` owns the journal, the to-do list, the derived completion state
//! and the settings store. Every mutation goes through its methods so the
//! completion state never drifts from the entries.

use time::{Date, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::entries::{DiaryEntry, EntryPatch, Journal};
use crate::error::{StoreResult, ValidationError};
use crate::settings::SettingsStore;
use crate::todo::TodoList;
use crate::tracker::DayCompletionTracker;
use crate::wizard::DiarySink;

/// Current local time, or UTC when the local offset cannot be determined.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn today() -> Date {
    now().date()
}

pub struct AppState<S: SettingsStore> {
    journal: Journal,
    todos: TodoList,
    tracker: DayCompletionTracker,
    settings: S,
    today: Date,
}

impl<S: SettingsStore> AppState<S> {
    /// Rebuilds completion state and applies the daily rollover, recording
    /// `today` as the last completion date.
    pub fn open(journal: Journal, todos: TodoList, mut settings: S, today: Date) -> StoreResult<Self> {
        let last = settings.last_completion_date();
        let mut tracker = DayCompletionTracker::from_entries(journal.entries(), today);
        let persisted = tracker.on_app_open(today, last);
        settings.set_last_completion_date(persisted)?;

        info!(
            %today,
            last_opened = ?last,
            morning_done = tracker.completed_morning_today(),
            evening_done = tracker.completed_evening_today(),
            "opened journal"
        );

        Ok(Self {
            journal,
            todos,
            tracker,
            settings,
            today,
        })
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn todos(&self) -> &TodoList {
        &self.todos
    }

    pub fn tracker(&self) -> &DayCompletionTracker {
        &self.tracker
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn today(&self) -> Date {
        self.today
    }

    pub fn add_diary_entry(&mut self, entry: DiaryEntry) {
        self.add_diary_entry_on(entry, today());
    }

    /// Adds `entry` as of `today`, rolling the completion state over if the
    /// date has moved on since the journal was opened.
    pub fn add_diary_entry_on(&mut self, entry: DiaryEntry, today: Date) {
        if today > self.today {
            info!(from = %self.today, to = %today, "date changed while open");
            self.today = today;
        }

        info!(id = %entry.id, kind = ?entry.kind, words = entry.word_count, "adding diary entry");
        self.tracker.on_entry_added(&entry, self.today);
        self.journal.insert(entry);
    }

    /// `Ok(None)` if no entry has `id`.
    pub fn edit_entry(
        &mut self,
        id: Uuid,
        patch: EntryPatch,
    ) -> Result<Option<&DiaryEntry>, ValidationError> {
        let edited = self.journal.edit(id, patch)?;
        if edited.is_some() {
            info!(%id, "edited diary entry");
        }
        Ok(edited)
    }

    /// `None` if the task is blank.
    pub fn add_todo(&mut self, task: &str, due: Option<Date>) -> Option<Uuid> {
        self.todos.add(task, due)
    }

    /// New done state, or `None` if no task has `id`.
    pub fn toggle_todo(&mut self, id: Uuid) -> Option<bool> {
        self.todos.toggle(id)
    }

    pub fn clear_completed_todos(&mut self) -> usize {
        self.todos.clear_completed()
    }

    /// Returns whether an entry was removed.
    pub fn delete_entry(&mut self, id: Uuid) -> bool {
        if !self.journal.delete(id) {
            return false;
        }

        info!(%id, "deleted diary entry");
        self.tracker = DayCompletionTracker::from_entries(self.journal.entries(), self.today);
        true
    }
}

impl<S: SettingsStore> DiarySink for AppState<S> {
    fn add_diary_entry(&mut self, entry: DiaryEntry) {
        AppState::add_diary_entry(self, entry);
    }
}
