//! Line-oriented driver for a [`ReflectionWizard`].

use std::io::{self, BufRead, Write};

use tracing::info;

use crate::entries::{DiaryEntry, EntryKind, Topic};
use crate::error::ValidationError;
use crate::wizard::{DiarySink, ReflectionWizard, STEP_COUNT, StepInput, Transition, WizardState};

const BACK: &str = ":back";
const CANCEL: &str = ":cancel";

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Saved(DiaryEntry),
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

fn print_step<W: Write>(wizard: &ReflectionWizard, output: &mut W) -> io::Result<()> {
    let (WizardState::Step(n), Some(step)) = (wizard.state(), wizard.current_step()) else {
        return Ok(());
    };

    writeln!(output)?;
    writeln!(output, "[{n}/{STEP_COUNT}] {}", step.question())?;
    match step.input() {
        StepInput::Rating => writeln!(output, "Enter a rating from 1 to 5.")?,
        StepInput::Topics => {
            let names: Vec<&str> = Topic::ALL.iter().map(|topic| topic.name()).collect();
            writeln!(output, "Pick up to 3: {}", names.join(", "))?;
            writeln!(output, "Type names to toggle them, an empty line to continue.")?;
        }
        StepInput::Text(_) => {
            if !wizard.topics().is_empty() {
                writeln!(output, "{}", topic_chips(wizard.topics().iter().copied()))?;
            }
        }
    }
    Ok(())
}

pub fn topic_chips(topics: impl IntoIterator<Item = Topic>) -> String {
    topics
        .into_iter()
        .map(|topic| format!("[{topic}]"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs one reflection to completion or cancellation. End of input cancels.
pub fn run_reflection<R: BufRead, W: Write>(
    kind: EntryKind,
    mut input: R,
    mut output: W,
    sink: &mut dyn DiarySink,
) -> Result<Outcome, SessionError> {
    let mut wizard = ReflectionWizard::new(kind);
    writeln!(output, "{} ({BACK} to go back, {CANCEL} to stop)", kind.label())?;
    print_step(&wizard, &mut output)?;

    let mut line = String::new();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            wizard.cancel();
            info!(?kind, "reflection abandoned at end of input");
            return Ok(Outcome::Cancelled);
        }
        let text = line.trim_end_matches(['\r', '\n']);

        match text.trim() {
            CANCEL => {
                wizard.cancel();
                return Ok(Outcome::Cancelled);
            }
            BACK => {
                if wizard.back() == Transition::Cancelled {
                    return Ok(Outcome::Cancelled);
                }
                print_step(&wizard, &mut output)?;
                continue;
            }
            _ => {}
        }

        let Some(step) = wizard.current_step() else {
            return Ok(Outcome::Cancelled);
        };
        match step.input() {
            StepInput::Rating => {
                let text = text.trim();
                if !text.is_empty() {
                    match text.parse::<u8>() {
                        Ok(rating @ 1..=5) => wizard.set_rating(rating),
                        _ => {
                            writeln!(output, "Please enter a number from 1 to 5.")?;
                            continue;
                        }
                    }
                }
                if wizard.next() == Transition::Refused {
                    writeln!(output, "Choose a rating before continuing.")?;
                    continue;
                }
            }
            StepInput::Topics => {
                let text = text.trim();
                if text.is_empty() {
                    wizard.next();
                } else {
                    toggle_topics(&mut wizard, text, &mut output)?;
                    continue;
                }
            }
            StepInput::Text(prompt) => {
                wizard.set_answer(prompt, text);
                if wizard.is_last_step() {
                    return match wizard.finish(sink)? {
                        Some(entry) => {
                            writeln!(output, "Saved. {} characters written.", entry.word_count)?;
                            Ok(Outcome::Saved(entry))
                        }
                        None => Ok(Outcome::Cancelled),
                    };
                }
                wizard.next();
            }
        }
        print_step(&wizard, &mut output)?;
    }
}

fn toggle_topics<W: Write>(
    wizard: &mut ReflectionWizard,
    text: &str,
    output: &mut W,
) -> io::Result<()> {
    for word in text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|word| !word.is_empty())
    {
        match word.parse::<Topic>() {
            Ok(topic) if wizard.can_toggle(topic) => {
                wizard.toggle_topic(topic);
            }
            Ok(topic) => writeln!(output, "Already 3 topics selected, {} skipped.", topic.name())?,
            Err(e) => writeln!(output, "{e}")?,
        }
    }

    if wizard.topics().is_empty() {
        writeln!(output, "No topics selected.")
    } else {
        writeln!(output, "Selected: {}", topic_chips(wizard.topics().iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::Prompt;
    use std::collections::BTreeSet;

    fn run(kind: EntryKind, script: &str) -> (Outcome, Vec<DiaryEntry>, String) {
        let mut sink: Vec<DiaryEntry> = Vec::new();
        let mut output = Vec::new();
        let outcome = run_reflection(kind, script.as_bytes(), &mut output, &mut sink).unwrap();
        (outcome, sink, String::from_utf8(output).unwrap())
    }

    #[test]
    fn evening_session_saves_entry() {
        let (outcome, sink, _) = run(
            EntryKind::EveningReflection,
            "4\nexercise, music\n\nA\nB\nC\n",
        );

        let Outcome::Saved(entry) = outcome else {
            panic!("expected a saved entry");
        };
        assert_eq!(entry.mood.get(), 4);
        assert_eq!(
            entry.selected_topics,
            BTreeSet::from([Topic::Exercise, Topic::Music])
        );
        assert_eq!(entry.answers[&Prompt::FutureVision], "C");
        assert_eq!(entry.word_count, 3);
        assert_eq!(sink, vec![entry]);
    }

    #[test]
    fn rating_gate_and_bad_input() {
        let (outcome, _, output) = run(EntryKind::MorningReflection, "\n7\n2\n\n\n\n\n");

        assert!(output.contains("Choose a rating before continuing."));
        assert!(output.contains("Please enter a number from 1 to 5."));
        let Outcome::Saved(entry) = outcome else {
            panic!("expected a saved entry");
        };
        assert_eq!(entry.mood.get(), 2);
        assert_eq!(entry.word_count, 0);
    }

    #[test]
    fn fourth_topic_is_skipped() {
        let (outcome, _, output) = run(
            EntryKind::MorningReflection,
            "3\nart food music sleep\n\nx\ny\nz\n",
        );

        assert!(output.contains("Already 3 topics selected, sleep skipped."));
        let Outcome::Saved(entry) = outcome else {
            panic!("expected a saved entry");
        };
        assert_eq!(entry.selected_topics.len(), 3);
    }

    #[test]
    fn back_from_first_step_cancels() {
        let (outcome, sink, _) = run(EntryKind::EveningReflection, "5\n:back\n:back\n");
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(sink.is_empty());
    }

    #[test]
    fn end_of_input_cancels() {
        let (outcome, sink, _) = run(EntryKind::MorningReflection, "3\n\nhalf");
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(sink.is_empty());
    }

    #[test]
    fn unknown_topics_are_reported() {
        let (_, _, output) = run(EntryKind::EveningReflection, "1\ngardening\n:cancel\n");
        assert!(output.contains("unknown topic \"gardening\""));
    }
}
