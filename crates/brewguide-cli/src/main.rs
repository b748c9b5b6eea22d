use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "brewguide", version, about = "Step-by-step cooking sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recipes in the catalog
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show one recipe in detail
    Show {
        id: u32,
        #[arg(long)]
        json: bool,
    },
    /// Show which blocks of a multi-block recipe can start
    Blocks {
        id: u32,
        /// Comma-separated ids of completed blocks
        #[arg(long, value_delimiter = ',')]
        completed: Vec<String>,
    },
    /// Cook a recipe interactively (commands on stdin, events on stdout)
    Cook { id: u32 },
    /// Interface language
    Lang {
        #[command(subcommand)]
        action: commands::lang::LangAction,
    },
    /// Interface theme
    Theme {
        #[command(subcommand)]
        action: commands::lang::ThemeAction,
    },
    /// Translate an interface key
    T {
        /// Dotted key, e.g. "recipe.step"
        key: String,
        /// Language code (defaults to the current language)
        #[arg(long)]
        lang: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BREWGUIDE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::List { json } => commands::recipes::list(json).await,
        Commands::Show { id, json } => commands::recipes::show(id, json).await,
        Commands::Blocks { id, completed } => commands::recipes::blocks(id, completed).await,
        Commands::Cook { id } => commands::cook::run(id).await,
        Commands::Lang { action } => commands::lang::run_lang(action),
        Commands::Theme { action } => commands::lang::run_theme(action),
        Commands::T { key, lang } => commands::lang::translate(&key, lang.as_deref()),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
