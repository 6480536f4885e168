//! Command-line arguments.

use std::path::PathBuf;

use clap::ArgAction;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "kingtable",
    version,
    about = "Show one page of a remote or local table",
    long_about = "Load a table from a catalog endpoint or a local JSON collection and print one page.\n\n\
                  The chosen page size is remembered between runs."
)]
pub struct Cli {
    /// Catalog endpoint (http/https URL) or path to a JSON array of records.
    ///
    /// May be omitted when the options file sets `url`.
    #[arg(value_name = "SOURCE")]
    pub source: Option<String>,

    /// Table options as a JSON file.
    #[arg(long = "options", value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Page to show.
    #[arg(long = "page", value_name = "N")]
    pub page: Option<usize>,

    /// Results per page; must be one of the allowed sizes.
    #[arg(long = "size", value_name = "N")]
    pub size: Option<usize>,

    /// Search text.
    #[arg(long = "search", value_name = "TEXT")]
    pub search: Option<String>,

    /// Column to sort by.
    #[arg(long = "sort", value_name = "COLUMN")]
    pub sort: Option<String>,

    /// Sort descending instead of ascending.
    #[arg(long = "desc", requires = "sort")]
    pub desc: bool,

    /// Print the page as JSON instead of a tab-separated table.
    #[arg(long = "json")]
    pub json: bool,

    /// Settings file remembering the page size (default: in the data directory).
    #[arg(long = "store", value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Log file (default: `latest.log` in the cache directory).
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Returns `true` if the source names a remote endpoint.
    pub fn is_remote(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "kingtable",
            "people.json",
            "--size",
            "10",
            "--sort",
            "name",
            "--desc",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.source.as_deref(), Some("people.json"));
        assert_eq!(cli.size, Some(10));
        assert!(cli.desc);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_desc_requires_sort() {
        assert!(Cli::try_parse_from(["kingtable", "people.json", "--desc"]).is_err());
    }

    #[test]
    fn test_remote_sources() {
        assert!(Cli::is_remote("https://example.com/rows"));
        assert!(!Cli::is_remote("./rows.json"));
    }
}
