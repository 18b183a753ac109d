use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use punch_cli::commands::{
    add, archive, data, edit, export, get, insert, list, restart, rm, set, start, status, stop,
};
use punch_cli::{Cli, Commands, Config};
use punch_store::EntryStore;

/// Load config and open the entry store, ensuring the data directory exists.
fn open_store(cli: &Cli) -> Result<(EntryStore, Config)> {
    let mut config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(datadir) = &cli.datadir {
        config.data_dir.clone_from(datadir);
    }
    tracing::debug!(?config, "loaded configuration");

    std::fs::create_dir_all(&config.data_dir).context("failed to create data directory")?;
    let store = EntryStore::open(&config.database_path()).context("failed to open store")?;
    Ok((store, config))
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let now = Local::now().naive_local();
    let mut stdout = std::io::stdout();

    match &cli.command {
        Some(Commands::Start {
            date,
            message,
            kind,
        }) => {
            let (mut store, _config) = open_store(&cli)?;
            start::run(
                &mut store,
                date.as_deref(),
                message.as_deref(),
                kind.as_deref(),
                now,
            )?;
        }
        Some(Commands::Stop {
            stamp,
            date,
            message,
        }) => {
            let (mut store, _config) = open_store(&cli)?;
            stop::run(
                &mut store,
                stamp.as_deref(),
                date.as_deref(),
                message.as_deref(),
                now,
            )?;
        }
        Some(Commands::Restart { stamp }) => {
            let (mut store, _config) = open_store(&cli)?;
            restart::run(&mut store, stamp.as_deref(), now)?;
        }
        Some(Commands::Add {
            start,
            end,
            message,
            kind,
        }) => {
            let (mut store, _config) = open_store(&cli)?;
            add::run(
                &mut store,
                start,
                end,
                message.as_deref(),
                kind.as_deref(),
                now,
            )?;
        }
        Some(Commands::Status) => {
            let (store, _config) = open_store(&cli)?;
            status::run(&mut stdout, &store, now)?;
        }
        Some(Commands::List { range, long, raw }) => {
            let (store, _config) = open_store(&cli)?;
            list::run(&mut stdout, &store, &range.to_query()?, *long, *raw, now)?;
        }
        Some(Commands::Csv { range }) => {
            let (store, _config) = open_store(&cli)?;
            export::run(&mut stdout, &store, &range.to_query()?, now)?;
        }
        Some(Commands::Data { range, title, rate }) => {
            let (store, _config) = open_store(&cli)?;
            data::run(&mut stdout, &store, &range.to_query()?, title, *rate, now)?;
        }
        Some(Commands::Get { stamp }) => {
            let (store, _config) = open_store(&cli)?;
            get::run(&mut stdout, &store, stamp)?;
        }
        Some(Commands::Set { args }) => {
            let (mut store, _config) = open_store(&cli)?;
            set::run(&mut store, args, now)?;
        }
        Some(Commands::Edit { stamp, property }) => {
            let (mut store, _config) = open_store(&cli)?;
            edit::run(&mut store, stamp, property.as_deref(), now)?;
        }
        Some(Commands::Insert { stamp }) => {
            let (mut store, _config) = open_store(&cli)?;
            insert::run(&mut store, stamp)?;
        }
        Some(Commands::Rm { stamps }) => {
            let (mut store, _config) = open_store(&cli)?;
            rm::run(&mut store, stamps)?;
        }
        Some(Commands::Archive { stamps, range }) => {
            let (mut store, _config) = open_store(&cli)?;
            archive::run(&mut store, stamps, &range.to_query()?, true)?;
        }
        Some(Commands::Unarchive { stamps, range }) => {
            let (mut store, _config) = open_store(&cli)?;
            archive::run(&mut store, stamps, &range.to_query()?, false)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
