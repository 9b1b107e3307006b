mod cli;
mod error;
mod logging;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use backcheck_asyncutils::AdmissionPool;
use backcheck_cache::CacheStore;
use backcheck_cache::store::{ArtifactStore, DirectoryStore, ReadOnlyStore, SqliteStore, StoreHandle};
use backcheck_config::{CacheBackend, Config};
use backcheck_library::build::{BuildEvent, build};
use backcheck_library::check::check;
use backcheck_storage::{DirectoryWalker, HashComputer, Sha1Digester};
use clap::Parser;
use exn::ResultExt;
use futures::TryStreamExt;
use std::process::ExitCode;
use std::sync::Arc;

const SQLITE_FILE: &str = "artifacts.sqlite";
/// Exit status of a check that found files missing from source.
const EXIT_MISSING: u8 = 1;
/// Exit status of any unrecovered failure.
const EXIT_FAILURE: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config) {
        Ok(config) => config,
        Err(err) => {
            logging::init("info");
            tracing::error!(error = ?err, "Cannot start");
            return ExitCode::from(EXIT_FAILURE);
        },
    };
    logging::init(&config.log);
    match run(cli, config).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = ?err, "Unrecoverable failure");
            ExitCode::from(EXIT_FAILURE)
        },
    }
}

async fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    let (store, database) = open_store(&config, cli.dry_run).await?;
    let outcome = execute(cli.command, store, &config).await;
    if let Some(database) = database {
        database.close().await;
    }
    outcome
}

async fn execute(command: Command, store: StoreHandle, config: &Config) -> Result<ExitCode> {
    let pool = AdmissionPool::new(config.pool.capacity);
    let hasher = HashComputer::new(pool)
        .with_digester(Arc::new(Sha1Digester::new(config.hashing.buffer_size)))
        .with_max_attempts(config.hashing.max_attempts);
    let cache = CacheStore::new(store, DirectoryWalker::new(hasher));

    match command {
        Command::Build { paths, scan, dig } => {
            let events = build(&cache, &paths, scan.options(), dig);
            futures::pin_mut!(events);
            while let Some(event) = events.try_next().await.or_raise(|| ErrorKind::Build)? {
                match event {
                    BuildEvent::Started => tracing::debug!(roots = paths.len(), dig, "Build started"),
                    BuildEvent::Planned(directories) => tracing::info!(directories, "Planned cache build"),
                    BuildEvent::Scanned { root, files } => {
                        tracing::info!(root = %root.display(), files, "Cache ready")
                    },
                    BuildEvent::Complete => tracing::info!("Build complete"),
                }
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Check { copy, source, scan, key } => {
            let report = check(&cache, &copy, &source, &scan.options(), &key.fields())
                .await
                .or_raise(|| ErrorKind::Check)?;
            for missing in &report.missing {
                match &missing.identical_in_source {
                    Some(identical) => println!("{}\t{}", missing.path.display(), identical.display()),
                    None => println!("{}", missing.path.display()),
                }
            }
            match report.is_complete() {
                true => Ok(ExitCode::SUCCESS),
                false => Ok(ExitCode::from(EXIT_MISSING)),
            }
        },
    }
}

/// The store to cache through, plus the database to close on exit when
/// artifacts live in SQLite.
async fn open_store(config: &Config, dry_run: bool) -> Result<(StoreHandle, Option<SqliteStore>)> {
    let path = &config.cache.path;
    let (store, database): (StoreHandle, _) = match config.cache.backend {
        CacheBackend::Directory => (Arc::new(DirectoryStore::new(path)), None),
        CacheBackend::Sqlite => {
            let database = SqliteStore::connect(path.join(SQLITE_FILE)).await.or_raise(|| ErrorKind::Store)?;
            (Arc::new(database.clone()), Some(database))
        },
    };
    tracing::debug!(store = store.name(), path = %path.display(), dry_run, "Opened cache store");
    let store: StoreHandle = match dry_run {
        true => Arc::new(ReadOnlyStore::new(store)),
        false => store,
    };
    Ok((store, database))
}
