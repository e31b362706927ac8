//! Command-line surface and the dispatch from subcommands to the service.
//!
//! Every subcommand prints its result to stdout as pretty JSON; logs go
//! to stderr so the output can be piped.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rival_db::{DbError, PlaydataService};
use rival_types::{AccountIdx, ChartIdx, NewPlayRecord, PlayFilter};
use serde::Serialize;

use crate::error::ImporterError;

/// Import, query, and compare rhythm-game play records.
#[derive(Debug, Parser)]
#[command(name = "rival-importer", version, long_about = None)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(
        long,
        short,
        env = "RIVAL_CONFIG",
        default_value = "rival-config.yaml",
        global = true
    )]
    pub config: PathBuf,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// One operation of the public surface.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a batch file as an account's new current snapshot
    Import {
        /// Account index
        account: i32,
        /// JSON array of records (`chart_idx`, `score`, `rank`, `chart_vf`); `-` reads stdin
        file: PathBuf,
    },

    /// Print an account's current snapshot
    Current {
        /// Account index
        account: i32,
        /// Read from Postgres and leave the cache untouched
        #[arg(long)]
        no_cache: bool,
    },

    /// Filter an account's current snapshot
    Filter {
        /// Account index
        account: i32,
        /// Clear rank codes (1-5), comma separated
        #[arg(long = "rank", value_delimiter = ',')]
        ranks: Vec<i16>,
        /// Score grade codes (0-9), comma separated
        #[arg(long = "grade", value_delimiter = ',')]
        grades: Vec<i16>,
        /// Chart levels (1-20), comma separated
        #[arg(long = "level", value_delimiter = ',')]
        levels: Vec<i16>,
        /// Case-insensitive song title substring
        #[arg(long)]
        title: Option<String>,
    },

    /// Current records on charts of one level, best first
    Level {
        /// Account index
        account: i32,
        /// Chart level (1-20)
        level: i16,
    },

    /// The current record for one chart
    One {
        /// Account index
        account: i32,
        /// Chart index
        chart: i32,
    },

    /// Personal-best ladder for one chart
    History {
        /// Account index
        account: i32,
        /// Chart index
        chart: i32,
    },

    /// Leaderboard for one chart
    Ranking {
        /// Chart index
        chart: i32,
    },

    /// Chart-by-chart comparison of two accounts
    Compare {
        /// Left-hand account index
        left: i32,
        /// Right-hand account index
        right: i32,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Current records with the highest VF contribution
    Volforce {
        /// Account index
        account: i32,
    },

    /// Most recent record per chart across all imports
    Latest {
        /// Account index
        account: i32,
    },

    /// Drop an account's cached snapshot
    Invalidate {
        /// Account index
        account: i32,
    },

    /// Print an account, by index or by external player id
    Account {
        /// Account index
        #[arg(required_unless_present = "sdvx_id", conflicts_with = "sdvx_id")]
        account: Option<i32>,
        /// External player id
        #[arg(long)]
        sdvx_id: Option<String>,
    },

    /// Flip an account's hidden flag
    ToggleHidden {
        /// Account index
        account: i32,
    },

    /// Apply pending database migrations and exit
    Migrate,
}

impl Command {
    /// Run the command against `service` and print its result.
    ///
    /// # Errors
    ///
    /// Returns [`ImporterError`] if the input cannot be read or the
    /// operation fails.
    pub async fn execute(self, service: &PlaydataService) -> Result<(), ImporterError> {
        match self {
            Self::Import { account, file } => {
                let records = read_batch(&file)?;
                let summary = service.import(AccountIdx::new(account), &records).await?;
                emit(&summary)
            }
            Self::Current { account, no_cache } => {
                let account = AccountIdx::new(account);
                let records = if no_cache {
                    service.current_uncached(account).await?
                } else {
                    service.current(account).await?
                };
                emit(&records)
            }
            Self::Filter {
                account,
                ranks,
                grades,
                levels,
                title,
            } => {
                let filter =
                    PlayFilter::from_codes(&ranks, &grades, &levels, title.as_deref().unwrap_or(""))
                        .map_err(DbError::from)?;
                emit(&service.filtered(AccountIdx::new(account), &filter).await?)
            }
            Self::Level { account, level } => {
                emit(&service.by_level(AccountIdx::new(account), level).await?)
            }
            Self::One { account, chart } => emit(
                &service
                    .one(AccountIdx::new(account), ChartIdx::new(chart))
                    .await?,
            ),
            Self::History { account, chart } => emit(
                &service
                    .history(AccountIdx::new(account), ChartIdx::new(chart))
                    .await?,
            ),
            Self::Ranking { chart } => emit(&service.ranking(ChartIdx::new(chart)).await?),
            Self::Compare { left, right, page } => emit(
                &service
                    .compare(AccountIdx::new(left), AccountIdx::new(right), page)
                    .await?,
            ),
            Self::Volforce { account } => {
                emit(&service.volforce(AccountIdx::new(account)).await?)
            }
            Self::Latest { account } => {
                emit(&service.latest_per_chart(AccountIdx::new(account)).await?)
            }
            Self::Invalidate { account } => {
                let account = AccountIdx::new(account);
                service.invalidate(account).await?;
                emit(&serde_json::json!({ "account_idx": account, "invalidated": true }))
            }
            Self::Account { account, sdvx_id } => {
                let found = match (account, sdvx_id) {
                    (Some(account), _) => service.account(AccountIdx::new(account)).await?,
                    (None, Some(sdvx_id)) => service.account_by_sdvx_id(&sdvx_id).await?,
                    (None, None) => {
                        return Err(ImporterError::from(DbError::account_not_found("<none>")));
                    }
                };
                emit(&found)
            }
            Self::ToggleHidden { account } => {
                let account = AccountIdx::new(account);
                let hidden = service.toggle_hidden(account).await?;
                emit(&serde_json::json!({ "account_idx": account, "is_hidden": hidden }))
            }
            // Migrations already ran during startup.
            Self::Migrate => Ok(()),
        }
    }

    /// True when the command needs the schema brought up to date first,
    /// regardless of configuration.
    pub const fn forces_migrations(&self) -> bool {
        matches!(self, Self::Migrate)
    }
}

/// Parse a batch file (or stdin for `-`) into records.
fn read_batch(path: &Path) -> Result<Vec<NewPlayRecord>, ImporterError> {
    let mut contents = String::new();
    let read = if path == Path::new("-") {
        std::io::stdin().read_to_string(&mut contents)
    } else {
        std::fs::File::open(path).and_then(|mut f| f.read_to_string(&mut contents))
    };
    read.map_err(|source| ImporterError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    parse_batch(&contents)
}

fn parse_batch(contents: &str) -> Result<Vec<NewPlayRecord>, ImporterError> {
    Ok(serde_json::from_str(contents)?)
}

fn emit<T: Serialize>(value: &T) -> Result<(), ImporterError> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
