mod auth;
mod commands;
mod config;
mod menu;
mod posts;
mod server;
mod state;
mod subjects;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;

use config::{install_config, mutate_config, read_config, AdminConfig};
use subjects::{SubjectPatch, SubjectStore};

#[derive(Debug, Parser)]
#[command(name = "post-subjects", version, about = "Manage blog post subjects")]
struct Cli {
    /// Admin config file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subject store file, overrides the config
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Refuse to modify a store file that fails to parse
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all configured subjects
    List,
    /// Add a new subject
    Add {
        name: String,
        description: String,
        /// Comma-separated keywords
        keywords: String,
    },
    /// Edit the subject at a 0-based index
    Edit {
        index: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated keywords
        #[arg(long)]
        keywords: Option<String>,
    },
    /// Delete the subject at a 0-based index
    Delete { index: usize },
    /// Write all subjects to a JSON file
    Export { file: PathBuf },
    /// Replace all subjects with the contents of a JSON file
    Import { file: PathBuf },
    /// Interactive menu (default)
    Menu,
    /// Run the web admin
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate a dated post file
    Post {
        title: String,
        content: String,
        category: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        install_config(AdminConfig::load_or_default(path));
    }
    mutate_config(|config| {
        if let Some(store) = &cli.store {
            config.store.path = store.clone();
        }
        if cli.strict {
            config.store.strict = true;
        }
    });

    let config = read_config();
    let store = SubjectStore::new(&config.store.path).with_strict(config.store.strict);

    match cli.command.unwrap_or(Command::Menu) {
        Command::List => commands::list_subjects(&store)?,
        Command::Add {
            name,
            description,
            keywords,
        } => commands::add_subject(&store, &name, &description, &keywords)?,
        Command::Edit {
            index,
            name,
            description,
            keywords,
        } => commands::edit_subject(
            &store,
            index,
            SubjectPatch {
                name,
                description,
                keywords,
            },
        )?,
        Command::Delete { index } => commands::delete_subject(&store, index)?,
        Command::Export { file } => commands::export_subjects(&store, &file)?,
        Command::Import { file } => commands::import_subjects(&store, &file)?,
        Command::Menu => menu::run(&store)?,
        Command::Serve { host, port } => {
            mutate_config(|config| {
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
            });
            server::serve(&read_config())?;
        }
        Command::Post {
            title,
            content,
            category,
        } => commands::generate_post(&config.posts, &title, &content, category.as_deref())?,
    }

    Ok(())
}
