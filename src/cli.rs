use clap::{Parser, Subcommand, value_parser};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    /// Journal directory (overrides the config file)
    #[arg(long, short = 'd', global = true)]
    pub dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
    /// Create a new journal
    Init,
    /// Start the morning reflection
    Morning,
    /// Start the evening reflection
    Evening,
    /// Greeting, today's reflections and this week
    Status,
    /// Show a week of the calendar
    Week {
        /// Weeks relative to this one
        #[arg(long, short = 'o', default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
    },
    /// Browse and manage diary entries
    Entry {
        #[clap(subcommand)]
        entry_command: EntryCommand,
    },
    /// Manage the to-do list
    Todo {
        #[clap(subcommand)]
        todo_command: TodoCommand,
    },
    /// Encrypt the journal into a single file
    Seal {
        /// Level of compression to use
        #[arg(long, short = 'L', value_parser=value_parser!(u32).range(1..=9))]
        level: Option<u32>,
    },
    /// Restore a sealed journal
    Unseal,
}

#[derive(Subcommand, Clone)]
pub enum EntryCommand {
    /// List entries, newest first
    List,
    /// Show one entry in full
    Show {
        /// Entry id or a unique prefix of it
        id: String,
    },
    /// Search entries by answers, topics and kind
    Search {
        /// Text to look for
        query: String,
    },
    /// List entries written on a day
    Day {
        /// Date as YYYY-MM-DD
        date: String,
    },
    /// Change an entry's rating, topics or answers
    Edit {
        /// Entry id or a unique prefix of it
        id: String,

        /// New rating, 1 to 5
        #[arg(long, short = 'm', value_parser=value_parser!(u8).range(1..=5))]
        mood: Option<u8>,

        /// Replace topics, comma separated
        #[arg(long, short = 't', value_delimiter = ',', conflicts_with = "clear_topics")]
        topics: Option<Vec<String>>,

        /// Remove every topic
        #[arg(long)]
        clear_topics: bool,

        /// Replace an answer, as QUESTION_NUMBER=TEXT (1 to 3)
        #[arg(long, short = 'a')]
        answer: Vec<String>,
    },
    /// Delete an entry
    Delete {
        /// Entry id or a unique prefix of it
        id: String,
    },
}

#[derive(Subcommand, Clone)]
pub enum TodoCommand {
    /// Add a task
    Add {
        /// What needs doing
        task: String,

        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },
    /// Mark a task done, or not done
    Toggle {
        /// Number shown by `todo list`
        number: usize,
    },
    /// Remove completed tasks
    Clear,
    /// List tasks
    List {
        /// Sort by due date
        #[arg(long)]
        by_due: bool,
    },
}
