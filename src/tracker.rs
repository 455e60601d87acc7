use std::collections::BTreeSet;

use time::Date;
use tracing::info;

use crate::entries::{DiaryEntry, EntryKind};

/// Which days have reflections, and whether today's are done.
///
/// The per-day flags are a cache over the journal; they are only meaningful
/// for `last_reset_date` and are cleared whenever that date rolls over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCompletionTracker {
    completed_days: BTreeSet<Date>,
    completed_morning_today: bool,
    completed_evening_today: bool,
    last_reset_date: Date,
}

impl DayCompletionTracker {
    pub fn new(today: Date) -> Self {
        Self {
            completed_days: BTreeSet::new(),
            completed_morning_today: false,
            completed_evening_today: false,
            last_reset_date: today,
        }
    }

    /// Derives the state for `today` from existing entries.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a DiaryEntry>, today: Date) -> Self {
        let mut tracker = Self::new(today);
        for entry in entries {
            tracker.on_entry_added(entry, today);
        }
        tracker
    }

    pub fn completed_days(&self) -> &BTreeSet<Date> {
        &self.completed_days
    }

    pub fn is_completed(&self, day: Date) -> bool {
        self.completed_days.contains(&day)
    }

    pub fn completed_morning_today(&self) -> bool {
        self.completed_morning_today
    }

    pub fn completed_evening_today(&self) -> bool {
        self.completed_evening_today
    }

    pub fn last_reset_date(&self) -> Date {
        self.last_reset_date
    }

    pub fn on_entry_added(&mut self, entry: &DiaryEntry, today: Date) {
        if today != self.last_reset_date {
            self.roll_over(today);
        }

        let day = entry.day();
        self.completed_days.insert(day);

        if day != today {
            return;
        }
        match entry.kind {
            EntryKind::MorningReflection => self.completed_morning_today = true,
            EntryKind::EveningReflection => self.completed_evening_today = true,
        }
    }

    /// Applies the daily rollover. Returns the date to persist as the last
    /// completion date, which is always `today`.
    pub fn on_app_open(&mut self, today: Date, last_reset_date: Option<Date>) -> Date {
        if last_reset_date.is_some_and(|last| last != today) {
            self.roll_over(today);
        }
        self.last_reset_date = today;
        today
    }

    fn roll_over(&mut self, today: Date) {
        info!(from = %self.last_reset_date, to = %today, "day rolled over");
        self.completed_morning_today = false;
        self.completed_evening_today = false;
        self.last_reset_date = today;
    }
}
