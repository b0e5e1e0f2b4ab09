use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use todust::commands::*;
use todust::error::Result;
use todust::filter::{Criteria, DueFilter, StatusFilter};
use todust::models::{Priority, TaskUpdate};
use todust::storage::{default_data_dir, FileStore, TaskStorage};
use todust::store::TaskStore;

#[derive(Parser)]
#[command(name = "todust")]
#[command(about = "Simple terminal todo list", long_about = None)]
struct Cli {
    /// Directory holding todos.json (defaults to $TODUST_DATA_DIR or the local data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task text (quoted if it has spaces)
        text: String,
        /// Priority: low, medium or high
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Category id
        #[arg(short, long)]
        category: Option<String>,
        /// Due date in YYYY-MM-DD or RFC 3339
        #[arg(short, long)]
        due: Option<String>,
        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List tasks, newest first
    List {
        /// Case-insensitive text search
        #[arg(short, long, default_value = "")]
        search: String,
        /// Only this category id
        #[arg(short, long, default_value = "")]
        category: String,
        /// Only this priority
        #[arg(short, long)]
        priority: Option<Priority>,
        /// all, active or completed
        #[arg(long, default_value_t = StatusFilter::All)]
        status: StatusFilter,
        /// all, today, overdue or upcoming
        #[arg(long, default_value_t = DueFilter::All)]
        due: DueFilter,
    },
    /// Toggle a task between active and completed
    Toggle {
        id: String,
    },
    /// Remove a task
    Remove {
        id: String,
    },
    /// Edit a task
    Edit {
        id: String,
        /// New text
        #[arg(long)]
        text: Option<String>,
        /// New priority
        #[arg(short, long)]
        priority: Option<Priority>,
        /// New category id
        #[arg(short, long)]
        category: Option<String>,
        /// New due date
        #[arg(short, long, conflicts_with = "no_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        no_due: bool,
        /// Replace tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Option<Vec<String>>,
        /// New notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Remove all completed tasks
    Clear,
    /// Show task counts
    Stats,
    /// List the built-in categories
    Categories,
    /// Reset the database (delete all tasks)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() {
    // Corruption warnings are visible by default; RUST_LOG overrides.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let storage = TaskStorage::new(FileStore::new(dir));

    let command = cli.command.unwrap_or(Commands::List {
        search: String::new(),
        category: String::new(),
        priority: None,
        status: StatusFilter::All,
        due: DueFilter::All,
    });

    match &command {
        Commands::Reset { force } => {
            let mut storage = storage;
            return cmd_reset(&mut storage, *force);
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "todust", &mut io::stdout());
            return Ok(());
        }
        Commands::Categories => {
            cmd_categories();
            return Ok(());
        }
        _ => {}
    }

    let mut store = TaskStore::open(storage);
    let result = match command {
        Commands::Add { text, priority, category, due, tags, notes } => {
            let due = due.as_deref().map(parse_due).transpose()?;
            let options = AddOptions { priority, category, due, tags, notes };
            cmd_add(&mut store, &text, options, false).map(|_| ())
        }
        Commands::List { search, category, priority, status, due } => {
            let criteria = Criteria { search, category, priority, status, due };
            cmd_list(&store, &criteria);
            Ok(())
        }
        Commands::Toggle { id } => cmd_toggle(&mut store, &id, false),
        Commands::Remove { id } => cmd_remove(&mut store, &id, false),
        Commands::Edit { id, text, priority, category, due, no_due, tags, notes } => {
            let due_date = if no_due {
                Some(None)
            } else {
                due.as_deref().map(parse_due).transpose()?.map(Some)
            };
            let update = TaskUpdate { text, completed: None, priority, category, due_date, tags, notes };
            cmd_edit(&mut store, &id, update, false)
        }
        Commands::Clear => {
            cmd_clear(&mut store, false);
            Ok(())
        }
        Commands::Stats => {
            cmd_stats(&store);
            Ok(())
        }
        Commands::Reset { .. } | Commands::Completions { .. } | Commands::Categories => Ok(()),
    };

    // A failed save does not fail the command.
    if result.is_ok() {
        report_store_error(&store);
    }
    result
}
