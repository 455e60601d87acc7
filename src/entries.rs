use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};
use thiserror::Error;
use time::{Date, OffsetDateTime};
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::error::ValidationError;

/// Most topics a single reflection may carry.
pub const MAX_TOPICS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    MorningReflection,
    EveningReflection,
}

impl EntryKind {
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::MorningReflection => "Morning reflection",
            EntryKind::EveningReflection => "Evening reflection",
        }
    }

    /// Free-text prompts asked by this kind of reflection, in the order they are asked.
    pub fn prompts(self) -> [Prompt; 3] {
        match self {
            EntryKind::MorningReflection => [
                Prompt::FondMemories,
                Prompt::PlanForFocusTopics,
                Prompt::PositiveFeelings,
            ],
            EntryKind::EveningReflection => {
                [Prompt::WhyGood, Prompt::SelfReward, Prompt::FutureVision]
            }
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A free-text question. Rating and topic questions are stored in their own fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    FondMemories,
    PlanForFocusTopics,
    PositiveFeelings,
    WhyGood,
    SelfReward,
    FutureVision,
}

impl Prompt {
    pub fn question(self) -> &'static str {
        match self {
            Prompt::FondMemories => "What fond memories do you have of these things?",
            Prompt::PlanForFocusTopics => "What is your plan for these things today?",
            Prompt::PositiveFeelings => {
                "If today turns out rewarding and full of surprises, how would you feel?"
            }
            Prompt::WhyGood => "Why did these things feel good today?",
            Prompt::SelfReward => "Cool! How will you reward yourself?",
            Prompt::FutureVision => {
                "If you could see the future, how would you hope these things change you?"
            }
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.question())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Learning,
    Work,
    Relationship,
    Food,
    Exercise,
    Music,
    Art,
    Social,
    Nature,
    Technology,
    Sleep,
    Mindfulness,
}

impl Topic {
    pub const ALL: [Topic; 12] = [
        Topic::Learning,
        Topic::Work,
        Topic::Relationship,
        Topic::Food,
        Topic::Exercise,
        Topic::Music,
        Topic::Art,
        Topic::Social,
        Topic::Nature,
        Topic::Technology,
        Topic::Sleep,
        Topic::Mindfulness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Topic::Learning => "learning",
            Topic::Work => "work",
            Topic::Relationship => "relationship",
            Topic::Food => "food",
            Topic::Exercise => "exercise",
            Topic::Music => "music",
            Topic::Art => "art",
            Topic::Social => "social",
            Topic::Nature => "nature",
            Topic::Technology => "technology",
            Topic::Sleep => "sleep",
            Topic::Mindfulness => "mindfulness",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Topic::Learning => "📖",
            Topic::Work => "💼",
            Topic::Relationship => "❤️",
            Topic::Food => "🍲",
            Topic::Exercise => "🏃",
            Topic::Music => "🎵",
            Topic::Art => "🎨",
            Topic::Social => "👫",
            Topic::Nature => "🌳",
            Topic::Technology => "📱",
            Topic::Sleep => "💤",
            Topic::Mindfulness => "🧘",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.emoji(), self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown topic \"{0}\"")]
pub struct UnknownTopic(pub String);

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Topic::ALL
            .into_iter()
            .find(|topic| topic.name() == wanted)
            .ok_or_else(|| UnknownTopic(s.trim().to_owned()))
    }
}

/// A rating from 1 to 5, used for both sleep quality and mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Mood(u8);

impl Mood {
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::MoodOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Mood {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Mood::new(value)
    }
}

impl From<Mood> for u8 {
    fn from(mood: Mood) -> Self {
        mood.0
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

pub type Answers = BTreeMap<Prompt, String>;

/// One completed reflection.
///
/// Deserializing re-checks the entry and recomputes `word_count`, so a stored
/// entry holds the same guarantees as a freshly created one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredEntry")]
pub struct DiaryEntry {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub kind: EntryKind,
    pub mood: Mood,
    pub selected_topics: BTreeSet<Topic>,
    pub answers: Answers,
    pub mindfulness_minutes: f64,
    pub word_count: usize,
}

#[derive(Deserialize)]
struct StoredEntry {
    id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    date: OffsetDateTime,
    kind: EntryKind,
    mood: u8,
    selected_topics: BTreeSet<Topic>,
    answers: Answers,
    #[serde(default)]
    mindfulness_minutes: f64,
    #[serde(default)]
    word_count: usize,
}

impl TryFrom<StoredEntry> for DiaryEntry {
    type Error = ValidationError;

    fn try_from(stored: StoredEntry) -> Result<Self, Self::Error> {
        let mood = validate(
            stored.kind,
            Some(stored.mood),
            &stored.selected_topics,
            &stored.answers,
        )?;
        if !stored.mindfulness_minutes.is_finite() || stored.mindfulness_minutes < 0.0 {
            return Err(ValidationError::InvalidMindfulness);
        }

        let counted = word_count(&stored.answers);
        if counted != stored.word_count {
            warn!(id = %stored.id, stored = stored.word_count, counted, "stale word count");
        }

        Ok(Self {
            id: stored.id,
            date: stored.date,
            kind: stored.kind,
            mood,
            selected_topics: stored.selected_topics,
            answers: stored.answers,
            mindfulness_minutes: stored.mindfulness_minutes,
            word_count: counted,
        })
    }
}

/// Partial update applied by [`DiaryEntry::edit`]. `answers` is merged per prompt.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub mood: Option<u8>,
    pub selected_topics: Option<BTreeSet<Topic>>,
    pub answers: Answers,
}

/// User-perceived characters (grapheme clusters) across every free-text answer.
pub fn word_count(answers: &Answers) -> usize {
    answers
        .values()
        .map(|answer| answer.graphemes(true).count())
        .sum()
}

fn validate(
    kind: EntryKind,
    mood: Option<u8>,
    topics: &BTreeSet<Topic>,
    answers: &Answers,
) -> Result<Mood, ValidationError> {
    let mood = Mood::new(mood.ok_or(ValidationError::MoodUnset)?)?;

    if topics.len() > MAX_TOPICS {
        return Err(ValidationError::TooManyTopics(topics.len()));
    }

    let expected = kind.prompts();
    if let Some(extra) = answers.keys().find(|prompt| !expected.contains(prompt)) {
        return Err(ValidationError::UnexpectedAnswer(*extra));
    }
    if let Some(missing) = expected.iter().find(|prompt| !answers.contains_key(prompt)) {
        return Err(ValidationError::MissingAnswer(*missing));
    }

    Ok(mood)
}

impl DiaryEntry {
    /// Builds an entry stamped with the current local time.
    pub fn create(
        kind: EntryKind,
        mood: Option<u8>,
        selected_topics: BTreeSet<Topic>,
        answers: Answers,
    ) -> Result<Self, ValidationError> {
        Self::create_at(kind, mood, selected_topics, answers, crate::app::now())
    }

    pub fn create_at(
        kind: EntryKind,
        mood: Option<u8>,
        selected_topics: BTreeSet<Topic>,
        answers: Answers,
        date: OffsetDateTime,
    ) -> Result<Self, ValidationError> {
        let mood = validate(kind, mood, &selected_topics, &answers)?;

        Ok(Self {
            id: Uuid::new_v4(),
            date,
            kind,
            mood,
            word_count: word_count(&answers),
            selected_topics,
            answers,
            mindfulness_minutes: 0.0,
        })
    }

    /// Returns the edited entry; id, date and kind never change.
    pub fn edit(&self, patch: EntryPatch) -> Result<Self, ValidationError> {
        let mood = patch.mood.unwrap_or(self.mood.get());
        let selected_topics = patch
            .selected_topics
            .unwrap_or_else(|| self.selected_topics.clone());
        let mut answers = self.answers.clone();
        answers.extend(patch.answers);

        let mood = validate(self.kind, Some(mood), &selected_topics, &answers)?;

        Ok(Self {
            id: self.id,
            date: self.date,
            kind: self.kind,
            mood,
            word_count: word_count(&answers),
            selected_topics,
            answers,
            mindfulness_minutes: self.mindfulness_minutes,
        })
    }

    pub fn day(&self) -> Date {
        self.date.date()
    }

    /// Case-insensitive match against answers, topics and the kind label.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.kind.label().to_lowercase().contains(&query)
            || self.answers.values().any(|a| a.to_lowercase().contains(&query))
            || self
                .selected_topics
                .iter()
                .any(|t| t.name().contains(&query) || t.emoji().contains(&query))
    }
}

/// Every diary entry, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Journal {
    entries: Vec<DiaryEntry>,
}

impl Journal {
    pub fn new(entries: Vec<DiaryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DiaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, entry: DiaryEntry) {
        self.entries.insert(0, entry);
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn get(&self, id: Uuid) -> Option<&DiaryEntry> {
        self.position(id).map(|index| &self.entries[index])
    }

    /// Resolves a full id or a unique prefix of one.
    pub fn resolve(&self, prefix: &str) -> Option<&DiaryEntry> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return None;
        }

        let mut matches = self
            .entries
            .iter()
            .filter(|entry| entry.id.to_string().starts_with(&prefix));
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    }

    /// Replaces the entry with the same id. Returns `None` if no such entry exists.
    pub fn update(&mut self, entry: DiaryEntry) -> Option<DiaryEntry> {
        let index = self.position(entry.id)?;
        Some(std::mem::replace(&mut self.entries[index], entry))
    }

    /// Applies `patch` to the entry with `id`. `Ok(None)` if it does not exist.
    pub fn edit(
        &mut self,
        id: Uuid,
        patch: EntryPatch,
    ) -> Result<Option<&DiaryEntry>, ValidationError> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };
        self.entries[index] = self.entries[index].edit(patch)?;
        Ok(Some(&self.entries[index]))
    }

    /// Removes the entry with `id` if present. Deleting twice is harmless.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before != self.entries.len()
    }

    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a DiaryEntry> + 'a {
        self.entries.iter().filter(move |entry| entry.matches(query))
    }

    pub fn on_day(&self, day: Date) -> impl Iterator<Item = &DiaryEntry> + '_ {
        self.entries.iter().filter(move |entry| entry.day() == day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn evening_answers(a: &str, b: &str, c: &str) -> Answers {
        Answers::from([
            (Prompt::WhyGood, a.to_owned()),
            (Prompt::SelfReward, b.to_owned()),
            (Prompt::FutureVision, c.to_owned()),
        ])
    }

    fn entry(answers: Answers) -> DiaryEntry {
        DiaryEntry::create_at(
            EntryKind::EveningReflection,
            Some(4),
            BTreeSet::from([Topic::Exercise]),
            answers,
            datetime!(2026-10-19 21:30 UTC),
        )
        .unwrap()
    }

    #[test]
    fn word_count_is_derived_from_answers() {
        let entry = entry(evening_answers("run", "", "stronger 💪"));
        assert_eq!(entry.word_count, 3 + 0 + 10);
        assert_eq!(entry.word_count, word_count(&entry.answers));
    }

    #[test]
    fn word_count_counts_graphemes() {
        let entry = entry(evening_answers("❤️", "e\u{301}", ""));
        assert_eq!(entry.word_count, 2);
    }

    #[test]
    fn rejects_bad_mood() {
        let err = DiaryEntry::create(
            EntryKind::EveningReflection,
            Some(6),
            BTreeSet::new(),
            evening_answers("", "", ""),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MoodOutOfRange(6));

        let err = DiaryEntry::create(
            EntryKind::EveningReflection,
            None,
            BTreeSet::new(),
            evening_answers("", "", ""),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MoodUnset);
    }

    #[test]
    fn rejects_too_many_topics() {
        let topics = BTreeSet::from([Topic::Art, Topic::Food, Topic::Music, Topic::Sleep]);
        let err = DiaryEntry::create(
            EntryKind::EveningReflection,
            Some(3),
            topics,
            evening_answers("", "", ""),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::TooManyTopics(4));
    }

    #[test]
    fn answers_must_match_the_kind() {
        let err = DiaryEntry::create(
            EntryKind::MorningReflection,
            Some(3),
            BTreeSet::new(),
            evening_answers("", "", ""),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::UnexpectedAnswer(Prompt::WhyGood));

        let mut answers = evening_answers("", "", "");
        answers.remove(&Prompt::SelfReward);
        let err = DiaryEntry::create(
            EntryKind::EveningReflection,
            Some(3),
            BTreeSet::new(),
            answers,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingAnswer(Prompt::SelfReward));
    }

    #[test]
    fn edit_merges_patch_and_recounts() {
        let original = entry(evening_answers("A", "B", "C"));
        let edited = original
            .edit(EntryPatch {
                mood: Some(2),
                selected_topics: Some(BTreeSet::from([Topic::Music, Topic::Nature])),
                answers: Answers::from([(Prompt::SelfReward, "a long walk".to_owned())]),
            })
            .unwrap();

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.date, original.date);
        assert_eq!(edited.kind, original.kind);
        assert_eq!(edited.mood.get(), 2);
        assert_eq!(
            edited.selected_topics,
            BTreeSet::from([Topic::Music, Topic::Nature])
        );
        assert_eq!(edited.answers[&Prompt::WhyGood], "A");
        assert_eq!(edited.answers[&Prompt::SelfReward], "a long walk");
        assert_eq!(edited.word_count, 1 + 11 + 1);
    }

    #[test]
    fn edit_revalidates() {
        let original = entry(evening_answers("A", "B", "C"));
        let err = original
            .edit(EntryPatch {
                answers: Answers::from([(Prompt::FondMemories, "x".to_owned())]),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, ValidationError::UnexpectedAnswer(Prompt::FondMemories));

        let err = original
            .edit(EntryPatch {
                mood: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, ValidationError::MoodOutOfRange(0));
    }

    #[test]
    fn delete_is_idempotent() {
        let first = entry(evening_answers("A", "B", "C"));
        let second = entry(evening_answers("D", "E", "F"));
        let id = first.id;

        let mut journal = Journal::default();
        journal.insert(first);
        journal.insert(second);

        assert!(journal.delete(id));
        let once = journal.clone();
        assert!(!journal.delete(id));
        assert_eq!(journal, once);
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn newest_entries_come_first() {
        let older = entry(evening_answers("old", "", ""));
        let newer = entry(evening_answers("new", "", ""));
        let newer_id = newer.id;

        let mut journal = Journal::default();
        journal.insert(older);
        journal.insert(newer);

        assert_eq!(journal.entries()[0].id, newer_id);
    }

    #[test]
    fn update_and_edit_report_missing_ids() {
        let mut journal = Journal::default();
        let stray = entry(evening_answers("", "", ""));
        assert!(journal.update(stray.clone()).is_none());
        assert!(
            journal
                .edit(stray.id, EntryPatch::default())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn resolves_unique_prefixes() {
        let first = entry(evening_answers("", "", ""));
        let id = first.id;
        let mut journal = Journal::default();
        journal.insert(first);

        assert_eq!(journal.resolve(&id.to_string()[..8]).map(|e| e.id), Some(id));
        assert!(journal.resolve("").is_none());
        assert!(journal.resolve("zzzz").is_none());
    }

    #[test]
    fn search_looks_at_answers_topics_and_kind() {
        let mut journal = Journal::default();
        journal.insert(entry(evening_answers("Went climbing", "", "")));

        assert_eq!(journal.search("CLIMB").count(), 1);
        assert_eq!(journal.search("exercise").count(), 1);
        assert_eq!(journal.search("evening").count(), 1);
        assert_eq!(journal.search("").count(), 1);
        assert_eq!(journal.search("painting").count(), 0);
    }

    #[test]
    fn topics_parse_by_name() {
        assert_eq!("Music".parse::<Topic>(), Ok(Topic::Music));
        assert_eq!(" sleep ".parse::<Topic>(), Ok(Topic::Sleep));
        assert!("gardening".parse::<Topic>().is_err());
    }

    #[test]
    fn entries_survive_json() {
        let original = entry(evening_answers("A", "B", "C"));
        let json = serde_json::to_string(&original).unwrap();
        let back: DiaryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);

        let bad = json.replace("\"mood\":4", "\"mood\":9");
        assert!(serde_json::from_str::<DiaryEntry>(&bad).is_err());
    }

    #[test]
    fn stored_entries_are_rechecked() {
        let json = serde_json::to_string(&entry(evening_answers("A", "B", "C"))).unwrap();

        let stale = json.replace("\"word_count\":3", "\"word_count\":999");
        let back: DiaryEntry = serde_json::from_str(&stale).unwrap();
        assert_eq!(back.word_count, 3);

        let topics = json.replace(
            "\"selected_topics\":[\"exercise\"]",
            "\"selected_topics\":[\"art\",\"food\",\"music\",\"sleep\",\"work\"]",
        );
        assert_ne!(topics, json);
        assert!(serde_json::from_str::<DiaryEntry>(&topics).is_err());

        let answers = json.replace("\"why_good\"", "\"fond_memories\"");
        assert_ne!(answers, json);
        assert!(serde_json::from_str::<DiaryEntry>(&answers).is_err());

        let minutes = json.replace(
            "\"mindfulness_minutes\":0.0",
            "\"mindfulness_minutes\":-3.0",
        );
        assert_ne!(minutes, json);
        assert!(serde_json::from_str::<DiaryEntry>(&minutes).is_err());
    }
}
