//! Step-by-step reflection flow.
//!
//! A [`ReflectionWizard`] walks through five steps: a 1 to 5 rating, up to
//! three topics, then three free-text questions. Only the rating step gates
//! progress. Finishing emits a single [`DiaryEntry`] into a [`DiarySink`]
//! and resets every draft field.

use std::collections::BTreeSet;

use tracing::debug;

use crate::entries::{Answers, DiaryEntry, EntryKind, MAX_TOPICS, Prompt, Topic};
use crate::error::ValidationError;

pub const STEP_COUNT: u8 = 5;

/// Receives entries produced by a finished reflection.
pub trait DiarySink {
    fn add_diary_entry(&mut self, entry: DiaryEntry);
}

impl DiarySink for Vec<DiaryEntry> {
    fn add_diary_entry(&mut self, entry: DiaryEntry) {
        self.insert(0, entry);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SleepQuality,
    FocusTopics,
    FondMemories,
    PlanForFocusTopics,
    PositiveFeelings,
    MoodRating,
    GoodTopics,
    WhyGood,
    SelfReward,
    FutureVision,
}

/// What a step asks the user for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepInput {
    Rating,
    Topics,
    Text(Prompt),
}

impl Step {
    pub fn sequence(kind: EntryKind) -> [Step; STEP_COUNT as usize] {
        match kind {
            EntryKind::MorningReflection => [
                Step::SleepQuality,
                Step::FocusTopics,
                Step::FondMemories,
                Step::PlanForFocusTopics,
                Step::PositiveFeelings,
            ],
            EntryKind::EveningReflection => [
                Step::MoodRating,
                Step::GoodTopics,
                Step::WhyGood,
                Step::SelfReward,
                Step::FutureVision,
            ],
        }
    }

    pub fn input(self) -> StepInput {
        match self {
            Step::SleepQuality | Step::MoodRating => StepInput::Rating,
            Step::FocusTopics | Step::GoodTopics => StepInput::Topics,
            Step::FondMemories => StepInput::Text(Prompt::FondMemories),
            Step::PlanForFocusTopics => StepInput::Text(Prompt::PlanForFocusTopics),
            Step::PositiveFeelings => StepInput::Text(Prompt::PositiveFeelings),
            Step::WhyGood => StepInput::Text(Prompt::WhyGood),
            Step::SelfReward => StepInput::Text(Prompt::SelfReward),
            Step::FutureVision => StepInput::Text(Prompt::FutureVision),
        }
    }

    pub fn question(self) -> &'static str {
        match self {
            Step::SleepQuality => "How well did you sleep last night?",
            Step::FocusTopics => "What will you focus on today?",
            Step::MoodRating => "How do you feel today?",
            Step::GoodTopics => "What went well today?",
            Step::FondMemories => Prompt::FondMemories.question(),
            Step::PlanForFocusTopics => Prompt::PlanForFocusTopics.question(),
            Step::PositiveFeelings => Prompt::PositiveFeelings.question(),
            Step::WhyGood => Prompt::WhyGood.question(),
            Step::SelfReward => Prompt::SelfReward.question(),
            Step::FutureVision => Prompt::FutureVision.question(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    /// 1-based step number.
    Step(u8),
    Finished,
}

/// Result of a `next` or `back` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved(u8),
    /// The request was not allowed from the current state.
    Refused,
    /// `back` from the first step: the host should close the wizard.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ReflectionWizard {
    kind: EntryKind,
    state: WizardState,
    rating: Option<u8>,
    topics: BTreeSet<Topic>,
    answers: Answers,
}

impl ReflectionWizard {
    pub fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            state: WizardState::Step(1),
            rating: None,
            topics: BTreeSet::new(),
            answers: Answers::new(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn current_step(&self) -> Option<Step> {
        match self.state {
            WizardState::Step(n) => Some(Step::sequence(self.kind)[usize::from(n - 1)]),
            WizardState::Finished => None,
        }
    }

    pub fn is_last_step(&self) -> bool {
        self.state == WizardState::Step(STEP_COUNT)
    }

    pub fn rating(&self) -> Option<u8> {
        self.rating
    }

    /// Values outside 1..=5 are ignored.
    pub fn set_rating(&mut self, rating: u8) {
        if (1..=5).contains(&rating) {
            self.rating = Some(rating);
        }
    }

    pub fn topics(&self) -> &BTreeSet<Topic> {
        &self.topics
    }

    /// Whether `topic` can currently be toggled; selected topics always can.
    pub fn can_toggle(&self, topic: Topic) -> bool {
        self.topics.contains(&topic) || self.topics.len() < MAX_TOPICS
    }

    /// Removes `topic` if selected, otherwise adds it while fewer than three are
    /// selected. Returns whether the topic is selected afterwards.
    pub fn toggle_topic(&mut self, topic: Topic) -> bool {
        if self.topics.remove(&topic) {
            false
        } else if self.topics.len() < MAX_TOPICS {
            self.topics.insert(topic)
        } else {
            false
        }
    }

    pub fn answer(&self, prompt: Prompt) -> &str {
        self.answers.get(&prompt).map(String::as_str).unwrap_or("")
    }

    /// Answers to prompts this kind does not ask are ignored.
    pub fn set_answer(&mut self, prompt: Prompt, text: impl Into<String>) {
        if self.kind.prompts().contains(&prompt) {
            self.answers.insert(prompt, text.into());
        }
    }

    pub fn can_advance(&self) -> bool {
        match self.state {
            WizardState::Step(1) => self.rating.is_some(),
            WizardState::Step(n) => n < STEP_COUNT,
            WizardState::Finished => false,
        }
    }

    pub fn next(&mut self) -> Transition {
        if !self.can_advance() {
            return Transition::Refused;
        }
        let WizardState::Step(n) = self.state else {
            return Transition::Refused;
        };

        self.state = WizardState::Step(n + 1);
        debug!(kind = ?self.kind, step = n + 1, "reflection advanced");
        Transition::Moved(n + 1)
    }

    pub fn back(&mut self) -> Transition {
        match self.state {
            WizardState::Step(1) => {
                self.cancel();
                Transition::Cancelled
            }
            WizardState::Step(n) => {
                self.state = WizardState::Step(n - 1);
                debug!(kind = ?self.kind, step = n - 1, "reflection went back");
                Transition::Moved(n - 1)
            }
            WizardState::Finished => Transition::Refused,
        }
    }

    /// Discards the draft and returns to the first step.
    pub fn cancel(&mut self) {
        debug!(kind = ?self.kind, "reflection cancelled");
        self.reset();
        self.state = WizardState::Step(1);
    }

    /// Completes the reflection from the last step. Returns `Ok(None)` when not
    /// on the last step; the draft is untouched if the entry fails validation.
    pub fn finish(
        &mut self,
        sink: &mut dyn DiarySink,
    ) -> Result<Option<DiaryEntry>, ValidationError> {
        if !self.is_last_step() {
            return Ok(None);
        }

        let mut answers = Answers::new();
        for prompt in self.kind.prompts() {
            answers.insert(prompt, self.answer(prompt).to_owned());
        }
        let entry = DiaryEntry::create(self.kind, self.rating, self.topics.clone(), answers)?;

        sink.add_diary_entry(entry.clone());
        self.reset();
        self.state = WizardState::Finished;
        debug!(kind = ?self.kind, id = %entry.id, "reflection finished");

        Ok(Some(entry))
    }

    fn reset(&mut self) {
        self.rating = None;
        self.topics.clear();
        self.answers.clear();
    }
}
