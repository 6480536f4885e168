//! KingTable command-line driver.

mod cli;
mod output;
mod paths;

use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use kingtable_lib::FetchOutcome;
use kingtable_lib::KingTable;
use kingtable_lib::RenderOutcome;
use kingtable_lib::Row;
use kingtable_lib::SearchTrigger;
use kingtable_lib::config::SortOrder;
use kingtable_lib::config::TableOptions;
use kingtable_lib::error::ConfigError;
use kingtable_lib::storage::JsonFileStore;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;

use crate::cli::Cli;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: expected a JSON array of records: {source}")]
    Data {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot encode rows: {0}")]
    Encode(serde_json::Error),

    #[error("no source given and the options set no url")]
    NoSource,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Table(#[from] kingtable_lib::error::Error),
}

fn init_logging(cli: &Cli) {
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let Some(path) = cli.log_file.clone().or_else(paths::log_file) else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match File::create(&path) {
        Ok(file) => {
            if let Err(e) = WriteLogger::init(level, Config::default(), file) {
                eprintln!("warning: logging disabled: {}", e);
            }
        }
        Err(e) => eprintln!("warning: cannot create log file {}: {}", path.display(), e),
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_rows(path: &Path) -> Result<Vec<Row>, CliError> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|source| CliError::Data {
        path: path.to_path_buf(),
        source,
    })
}

fn build_table(cli: &Cli) -> Result<KingTable, CliError> {
    let mut options = match &cli.options {
        Some(path) => TableOptions::from_json(&read(path)?)?,
        None => TableOptions::default(),
    };

    let mut rows = None;
    match cli.source.as_deref() {
        Some(source) if Cli::is_remote(source) => options = options.with_url(source),
        Some(source) => rows = Some(load_rows(Path::new(source))?),
        None if options.url.is_some() => {}
        None => return Err(CliError::NoSource),
    }

    let mut builder = KingTable::builder(options);
    if let Some(rows) = rows {
        builder = builder.data(rows);
    }
    match cli.store.clone().or_else(paths::settings_file) {
        Some(path) => match JsonFileStore::open(path) {
            Ok(store) => builder = builder.store(Arc::new(store)),
            Err(e) => log::warn!("page size will not be remembered: {}", e),
        },
        None => log::warn!("no data directory; page size will not be remembered"),
    }
    Ok(builder.build()?)
}

async fn show_page(table: &KingTable) -> Result<Option<Vec<Row>>, CliError> {
    match table.rows_to_display(None).await? {
        FetchOutcome::Loaded(loaded) => Ok(Some(loaded.into_inner())),
        FetchOutcome::Stale => Ok(None),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let table = build_table(&cli)?;

    if let Some(size) = cli.size {
        table.set_results_per_page(size)?;
    }
    if let Some(search) = cli.search.as_deref() {
        if table.search(search) == SearchTrigger::Ignored {
            log::warn!("search {:?} is too short and was ignored", search);
        }
    }

    if matches!(table.render().await?, RenderOutcome::Pending) {
        println!("{}", output::footer(&table.pagination()));
        return Ok(());
    }

    if let Some(column) = cli.sort.as_deref() {
        let mut order = table.sort_by(column)?;
        if cli.desc && order == SortOrder::Asc {
            order = table.sort_by(column)?;
        }
        log::info!("sorted by {} {}", column, order.as_str());
    }

    let mut rows = show_page(&table).await?;
    if let Some(page) = cli.page {
        if page != table.pagination().page {
            if table.go_to_page(page) {
                rows = show_page(&table).await?;
            } else {
                log::warn!(
                    "page {} does not exist; showing page {}",
                    page,
                    table.pagination().page
                );
            }
        }
    }

    let rows = rows.unwrap_or_default();
    if cli.json {
        let text = serde_json::to_string_pretty(&rows).map_err(CliError::Encode)?;
        println!("{}", text);
    } else {
        let columns = table.columns();
        println!(
            "{}",
            output::render_table(&columns, &rows, table.options().row_count)
        );
    }
    println!("{}", output::footer(&table.pagination()));

    table.dispose();
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli).await {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
