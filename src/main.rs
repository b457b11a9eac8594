mod activate;
mod classify;
mod config;
mod entry;
mod partition;
mod storage;
mod store;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::Config;
use crate::entry::{absolute_path, locator_for_path, normalize_locator};
use crate::storage::JsonFileStore;
use crate::store::FavoritesStore;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    compile_time::datetime_str!(),
    ")",
);

/// Favorites — pin files and folders per workspace
#[derive(Parser, Debug)]
#[command(
    version = VERSION,
    about,
    long_about = "Favorites — pin files and folders per workspace\n\n\
        Favorites are stored per workspace root folder. A favorite belongs to\n\
        the workspace that contains it, or to the first workspace otherwise.\n\
        Without any workspace the global list is used.",
    after_long_help = "Examples:\n\
        \x20 favorites add src/main.rs              Pin a file\n\
        \x20 favorites list                         Show favorites in order\n\
        \x20 favorites move README.md --before src  Drag README.md above src\n\
        \x20 favorites open src/main.rs             Open a pinned file\n\
        \x20 favorites --no-workspace list          Show the global list"
)]
struct Cli {
    /// Workspace root folder (repeatable; defaults to config, then the current directory)
    #[arg(short, long = "workspace", global = true)]
    workspaces: Vec<PathBuf>,

    /// Use the global list instead of any workspace
    #[arg(long, global = true, conflicts_with = "workspaces")]
    no_workspace: bool,

    /// State file holding every workspace's favorites
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a file or folder to favorites
    Add { path: PathBuf },
    /// Remove a favorite
    Remove { target: String },
    /// List favorites in display order
    List {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a favorite before another one (or to the end)
    Move {
        source: String,
        #[arg(long)]
        before: Option<String>,
    },
    /// Open a favorite file or reveal a favorite folder
    Open { target: String },
}

const DEFAULT_LOGLEVEL: &str = if cfg!(debug_assertions) {
    "debug"
} else {
    "info"
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env file
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Ok(dotenv) = dotenv {
        tracing::debug!(path = %dotenv.display(), "Loaded .env file");
    }

    let config = Config::load()?;
    let cwd = std::env::current_dir().context("Failed to resolve current directory")?;

    let roots = if cli.no_workspace {
        Vec::new()
    } else {
        resolve_roots(&cli.workspaces, &config.workspaces, &cwd)
    };
    let state_path = cli
        .state
        .or(config.state_file)
        .unwrap_or_else(JsonFileStore::default_path);
    let storage = JsonFileStore::open(&state_path)
        .with_context(|| format!("Failed to open state file {}", state_path.display()))?;

    let mut store = FavoritesStore::open(storage, roots);
    let mut changes = store.subscribe();

    match cli.command {
        Command::Add { path } => {
            let path = absolute_path(&path, &cwd);
            // Unstat-able paths are silently skipped
            if let Some(kind) = classify::classify(&path) {
                store.add(locator_for_path(&path), kind);
            }
        }
        Command::Remove { target } => {
            store.remove(&normalize_locator(&target, &cwd));
        }
        Command::List { json } => {
            let items = store.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for item in &items {
                    let partition = store.partition_of(&item.identifier);
                    let description = partition
                        .root()
                        .and_then(|root| item.description(root))
                        .unwrap_or_default();
                    println!(
                        "{}\t{}\t{}\t{}",
                        item.order,
                        item.kind.as_str(),
                        item.display_name(),
                        description
                    );
                }
            }
        }
        Command::Move { source, before } => {
            let source = normalize_locator(&source, &cwd);
            let before = before.map(|t| normalize_locator(&t, &cwd));
            store.reorder(&source, before.as_deref());
        }
        Command::Open { target } => {
            let identifier = normalize_locator(&target, &cwd);
            match store.get(&identifier) {
                Some(entry) => {
                    activate::activate(entry);
                }
                None => tracing::warn!(%identifier, "Not a favorite"),
            }
        }
    }

    while let Ok(change) = changes.try_recv() {
        tracing::info!(?change, state = %store.storage().path().display(), "Favorites changed");
    }

    Ok(())
}

/// Workspace roots: command line, then config, then the current directory
fn resolve_roots(cli: &[PathBuf], config: &[PathBuf], cwd: &Path) -> Vec<PathBuf> {
    let roots = if !cli.is_empty() {
        cli
    } else if !config.is_empty() {
        config
    } else {
        return vec![cwd.to_path_buf()];
    };
    roots.iter().map(|root| absolute_path(root, cwd)).collect()
}

fn init_tracing() {
    let env_filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOGLEVEL));

    // stdout is reserved for command output
    let fmt_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter_layer)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_roots_precedence() {
        let cwd = Path::new("/home/user/project");
        let cli = vec![PathBuf::from("./app/")];
        let config = vec![PathBuf::from("/ws")];

        assert_eq!(
            resolve_roots(&cli, &config, cwd),
            vec![PathBuf::from("/home/user/project/app")]
        );
        assert_eq!(resolve_roots(&[], &config, cwd), vec![PathBuf::from("/ws")]);
        assert_eq!(
            resolve_roots(&[], &[], cwd),
            vec![PathBuf::from("/home/user/project")]
        );
    }

    #[test]
    fn test_cli_no_workspace() {
        let cli = Cli::try_parse_from(["favorites", "--no-workspace", "list"]).unwrap();
        assert!(cli.no_workspace);
        assert!(cli.workspaces.is_empty());

        let conflicting =
            Cli::try_parse_from(["favorites", "--no-workspace", "-w", "/ws", "list"]);
        assert!(conflicting.is_err());
    }

    #[test]
    fn test_cli_parses_move() {
        let cli = Cli::try_parse_from([
            "favorites",
            "--workspace",
            "/ws",
            "move",
            "README.md",
            "--before",
            "src",
        ])
        .unwrap();

        assert_eq!(cli.workspaces, vec![PathBuf::from("/ws")]);
        match cli.command {
            Command::Move { source, before } => {
                assert_eq!(source, "README.md");
                assert_eq!(before.as_deref(), Some("src"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
