use clap::Parser;
use cli::{Cli, Command, EntryCommand, TodoCommand};
use color_eyre::eyre::{WrapErr, bail, eyre};
use rand::seq::IndexedRandom;
use reflect::{
    app::{self, AppState},
    calendar,
    config::Config,
    entries::{DiaryEntry, EntryKind, EntryPatch, Topic},
    search,
    session::{self, Outcome},
    settings::{self, JsonSettings},
    store::JournalStore,
    vault, wizard,
};
use std::{collections::BTreeSet, io};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod cli;

const CARD_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[month]/[day] [hour]:[minute]");

type App = AppState<JsonSettings>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load();
    let dir = cli.dir.unwrap_or_else(|| config.journal_dir.clone());
    let store = JournalStore::new(&dir);

    match cli.command {
        Command::Init => {
            store.init().wrap_err("Failed to create journal")?;

            println!("Created journal at {}", dir.display());
        }
        Command::Seal { level } => {
            if !store.exists() {
                bail!("No journal at {}", dir.display());
            }

            let password = {
                let p1 = rpassword::prompt_password("Enter password: ")?;
                let p2 = rpassword::prompt_password("Re-enter password: ")?;

                if p1 != p2 {
                    bail!("Passwords do not match");
                }

                p1
            };

            let sealed = vault::seal(
                &dir,
                &password,
                level.unwrap_or(config.compression_level),
            )?;

            println!("Journal sealed into {}", sealed.display());
        }
        Command::Unseal => {
            let password = rpassword::prompt_password("Enter password: ")?;

            vault::unseal(&dir, &password)?;

            println!("Journal unsealed.");
        }
        command => {
            let (journal, todos) = store.load().wrap_err("Failed to open journal")?;
            let settings = store.settings().wrap_err("Failed to read settings")?;
            let mut app = AppState::open(journal, todos, settings, app::today())
                .wrap_err("Failed to record today's visit")?;

            run(command, &mut app, &store, &config).await?;
        }
    }

    Ok(())
}

async fn run(
    command: Command,
    app: &mut App,
    store: &JournalStore,
    config: &Config,
) -> color_eyre::Result<()> {
    match command {
        Command::Morning => reflect(EntryKind::MorningReflection, app, store)?,
        Command::Evening => reflect(EntryKind::EveningReflection, app, store)?,
        Command::Status => {
            println!("{}", calendar::greeting(app::now().hour()));
            println!();
            for (kind, done) in [
                (
                    EntryKind::MorningReflection,
                    app.tracker().completed_morning_today(),
                ),
                (
                    EntryKind::EveningReflection,
                    app.tracker().completed_evening_today(),
                ),
            ] {
                println!(
                    "{}: {}",
                    kind,
                    if done { "recorded" } else { "not yet" }
                );
            }
            println!();
            print_week(app, 0);
        }
        Command::Week { offset } => print_week(app, offset),
        Command::Entry { entry_command } => match entry_command {
            EntryCommand::List => {
                if app.journal().is_empty() {
                    println!("No entries yet.");
                }
                for entry in app.journal().entries() {
                    print_card(entry)?;
                }
            }
            EntryCommand::Show { id } => match app.journal().resolve(&id) {
                Some(entry) => print_full(entry)?,
                None => println!("Entry does not exist :("),
            },
            EntryCommand::Search { query } => {
                let mut indicator = search::SearchIndicator::new();
                indicator.begin(config.search_delay());
                eprintln!("Searching…");

                let found: Vec<&DiaryEntry> = app.journal().search(&query).collect();

                indicator.settle().await;

                if found.is_empty() {
                    println!("No entries found.");
                }
                for entry in found {
                    print_card(entry)?;
                }
            }
            EntryCommand::Day { date } => {
                let day = Date::parse(&date, settings::DATE_FORMAT)
                    .wrap_err_with(|| format!("Invalid date {date}, expected YYYY-MM-DD"))?;

                let mut any = false;
                for entry in app.journal().on_day(day) {
                    any = true;
                    print_card(entry)?;
                }
                if !any {
                    println!("No entries on {date}.");
                }
            }
            EntryCommand::Edit {
                id,
                mood,
                topics,
                clear_topics,
                answer,
            } => {
                let Some(entry) = app.journal().resolve(&id) else {
                    println!("Entry does not exist :(");
                    return Ok(());
                };
                let (entry_id, prompts) = (entry.id, entry.kind.prompts());

                let selected_topics = if clear_topics {
                    Some(BTreeSet::new())
                } else {
                    topics
                        .map(|names| {
                            names
                                .iter()
                                .map(|name| name.parse::<Topic>())
                                .collect::<Result<BTreeSet<_>, _>>()
                        })
                        .transpose()?
                };

                let mut patch = EntryPatch {
                    mood,
                    selected_topics,
                    ..Default::default()
                };
                for raw in answer {
                    let (number, text) = raw
                        .split_once('=')
                        .ok_or_else(|| eyre!("Expected QUESTION_NUMBER=TEXT, got {raw}"))?;
                    let prompt = number
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|index| prompts.get(index))
                        .ok_or_else(|| eyre!("Question number must be 1 to {}", prompts.len()))?;
                    patch.answers.insert(*prompt, text.to_owned());
                }

                match app.edit_entry(entry_id, patch)? {
                    Some(entry) => print_full(entry)?,
                    None => println!("Entry does not exist :("),
                }
                save(app, store)?;
            }
            EntryCommand::Delete { id } => {
                let Some(entry_id) = app.journal().resolve(&id).map(|entry| entry.id) else {
                    println!("Entry does not exist :(");
                    return Ok(());
                };

                if app.delete_entry(entry_id) {
                    save(app, store)?;
                    println!("Removed entry {entry_id}");
                }
            }
        },
        Command::Todo { todo_command } => match todo_command {
            TodoCommand::Add { task, due } => {
                let due = due
                    .map(|raw| {
                        Date::parse(&raw, settings::DATE_FORMAT)
                            .wrap_err_with(|| format!("Invalid date {raw}, expected YYYY-MM-DD"))
                    })
                    .transpose()?;

                match app.add_todo(&task, due) {
                    Some(_) => {
                        save(app, store)?;
                        println!("Added \"{}\"", task.trim());
                    }
                    None => println!("Nothing to add."),
                }
            }
            TodoCommand::Toggle { number } => {
                let id = number
                    .checked_sub(1)
                    .and_then(|index| app.todos().items().get(index))
                    .map(|item| item.id);

                match id.and_then(|id| app.toggle_todo(id)) {
                    Some(done) => {
                        save(app, store)?;
                        println!("Task {number} {}", if done { "done" } else { "reopened" });
                    }
                    None => println!("Task does not exist :("),
                }
            }
            TodoCommand::Clear => {
                let removed = app.clear_completed_todos();
                save(app, store)?;

                println!("Cleared {removed} completed task(s)");
            }
            TodoCommand::List { by_due } => print_todos(app, by_due)?,
        },
        // Handled before the journal is opened.
        Command::Init | Command::Seal { .. } | Command::Unseal => {}
    }

    Ok(())
}

fn reflect(kind: EntryKind, app: &mut App, store: &JournalStore) -> color_eyre::Result<()> {
    let done = match kind {
        EntryKind::MorningReflection => app.tracker().completed_morning_today(),
        EntryKind::EveningReflection => app.tracker().completed_evening_today(),
    };
    if done {
        println!("{kind} already recorded today.");
        return Ok(());
    }

    let outcome = session::run_reflection(kind, io::stdin().lock(), io::stdout().lock(), app)
        .wrap_err("Reflection failed")?;

    match outcome {
        Outcome::Saved(_) => save(app, store)?,
        Outcome::Cancelled => println!("\nReflection discarded."),
    }

    Ok(())
}

fn save(app: &App, store: &JournalStore) -> color_eyre::Result<()> {
    store
        .save(app.journal(), app.todos())
        .wrap_err("Failed to save journal")
}

fn print_week(app: &App, offset: i64) {
    let today = app.today();
    let start = calendar::shift_week(calendar::start_of_week(today), offset);

    println!(
        "{}",
        calendar::render_week(start, app.tracker().completed_days(), today)
    );
}

fn print_card(entry: &DiaryEntry) -> color_eyre::Result<()> {
    let notes: Vec<&String> = entry.answers.values().filter(|a| !a.is_empty()).collect();
    let preview = notes
        .choose(&mut rand::rng())
        .map(|answer| answer.as_str())
        .unwrap_or("No notes recorded");

    println!(
        "{} ({})  {}\n\t{}",
        entry.kind,
        &entry.id.to_string()[..8],
        entry.date.format(CARD_DATE)?,
        preview
    );
    if !entry.selected_topics.is_empty() {
        println!(
            "\t{}",
            session::topic_chips(entry.selected_topics.iter().copied())
        );
    }

    Ok(())
}

fn print_full(entry: &DiaryEntry) -> color_eyre::Result<()> {
    println!("{} ({})", entry.kind, entry.id);
    println!("{}", entry.date.format(CARD_DATE)?);
    println!(
        "Mindfulness: {:.1} min, words: {}",
        entry.mindfulness_minutes, entry.word_count
    );
    println!();

    let [rating_step, topics_step, ..] = wizard::Step::sequence(entry.kind);
    let stars: String = (1..=5)
        .map(|i| if i <= entry.mood.get() { '★' } else { '☆' })
        .collect();
    println!("{}\n\t{stars} {}", rating_step.question(), entry.mood);
    println!(
        "{}\n\t{}",
        topics_step.question(),
        session::topic_chips(entry.selected_topics.iter().copied())
    );

    for (number, prompt) in entry.kind.prompts().into_iter().enumerate() {
        let answer = entry.answers.get(&prompt).map(String::as_str).unwrap_or("");
        println!("{}. {}\n\t{}", number + 1, prompt, answer);
    }

    Ok(())
}

fn print_todos(app: &App, by_due: bool) -> color_eyre::Result<()> {
    let items = app.todos().items();
    if items.is_empty() {
        println!("Nothing to do.");
        return Ok(());
    }

    let sorted = app.todos().sorted(by_due);
    let number = |id: Uuid| {
        items
            .iter()
            .position(|item| item.id == id)
            .map(|index| index + 1)
            .unwrap_or_default()
    };

    let (done, pending): (Vec<_>, Vec<_>) = sorted.into_iter().partition(|item| item.done);
    for item in pending {
        let due = match item.due {
            Some(due) => format!("  (due {})", due.format(format_description!("[month]/[day]"))?),
            None => String::new(),
        };
        println!("{:>3}. [ ] {}{due}", number(item.id), item.task);
    }
    if !done.is_empty() {
        println!("Completed");
        for item in done {
            println!("{:>3}. [x] {}", number(item.id), item.task);
        }
    }

    Ok(())
}
