//! CampusDesk CLI - fetch, query, import and export records
//!
//! ```bash
//! campusdesk fetch students                      # Aggregate every page as JSON
//! campusdesk list teachers --query smith --sort name
//! campusdesk import students pupils.csv          # Validate and create row by row
//! campusdesk export students --filter grade=7    # Write students_YYYY-MM-DD.csv
//! campusdesk template subjects                   # Empty import file with headers
//! ```
//!
//! Configuration comes from `CAMPUSDESK_*` environment variables (or `.env`);
//! `--api-url` and `--token` override them.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use campusdesk::error::{ClientError, ClientResult, ConfigError};
use campusdesk::export::{rows_for_export, write_export};
use campusdesk::import::{import_file, template};
use campusdesk::query::filter_and_sort;
use campusdesk::{
    apply, fetch_all, ClientConfig, ColumnFilter, DateRange, EntityKind, ExportExtension,
    FetchOptions, HttpRecordApi, Record, SortDirection, SortSpec, ViewSpec,
};

#[derive(Parser)]
#[command(name = "campusdesk")]
#[command(about = "Fetch, query, import and export CampusDesk records", long_about = None)]
struct Cli {
    /// Records API base URL (overrides CAMPUSDESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token (overrides CAMPUSDESK_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every page of a listing and print it as JSON
    Fetch {
        /// Entity kind (students, teachers, admins, schools, subjects, timetables)
        kind: EntityKind,

        /// Records per page request
        #[arg(long)]
        fetch_size: Option<usize>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch a listing and print one page of the filtered, sorted view
    List {
        kind: EntityKind,

        #[command(flatten)]
        view: ViewArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a CSV file, creating one record per valid row
    Import {
        kind: EntityKind,

        /// Input file (.csv, or delimited text saved as .xlsx/.xls)
        file: PathBuf,
    },

    /// Export the filtered, sorted view to a date-stamped file
    Export {
        kind: EntityKind,

        #[command(flatten)]
        view: ViewArgs,

        /// Only export records with these natural keys
        #[arg(long = "select")]
        selected: Vec<String>,

        /// Target directory (default: CAMPUSDESK_EXPORT_DIR or .)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Name the file .xlsx (content is still CSV)
        #[arg(long)]
        legacy_xlsx: bool,
    },

    /// Print an empty import file with the expected headers
    Template {
        kind: EntityKind,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ViewArgs {
    /// Free-text search over the kind's searchable fields
    #[arg(short, long)]
    query: Option<String>,

    /// Column filter as field=value (repeatable)
    #[arg(short, long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Match filters ignoring case
    #[arg(long)]
    ignore_case: bool,

    /// Sort key
    #[arg(short, long)]
    sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Date field for --from/--to
    #[arg(long, default_value = "createdAt")]
    date_field: String,

    /// Earliest date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Latest date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Page to show (1-based)
    #[arg(short, long, default_value = "1")]
    page: usize,

    /// Rows per page
    #[arg(long, default_value = "10")]
    page_size: usize,

    /// Records per page request
    #[arg(long)]
    fetch_size: Option<usize>,
}

impl ViewArgs {
    fn to_spec(&self) -> ViewSpec {
        let mut spec = ViewSpec::new(self.page_size);

        if let Some(query) = &self.query {
            spec.set_query(query.clone());
        }
        for (column, value) in &self.filters {
            let filter = if self.ignore_case {
                ColumnFilter::ExactIgnoreCase(value.clone())
            } else {
                ColumnFilter::Exact(value.clone())
            };
            spec.set_filter(column.clone(), filter);
        }
        if self.from.is_some() || self.to.is_some() {
            spec.set_date_range(Some(DateRange {
                field: self.date_field.clone(),
                from: self.from,
                to: self.to,
            }));
        }
        if let Some(key) = &self.sort {
            spec.set_sort(Some(SortSpec {
                key: key.clone(),
                direction: if self.desc {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                },
            }));
        }
        spec.set_page(self.page);
        spec
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected field=value, got '{}'", raw)),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Only commands that talk to the API load configuration.
async fn run(cli: Cli) -> ClientResult<()> {
    let Cli {
        api_url,
        token,
        command,
    } = cli;
    let connect = move || -> ClientResult<(ClientConfig, HttpRecordApi)> {
        let config = load_config(api_url, token)?;
        let api = HttpRecordApi::new(&config)?;
        Ok((config, api))
    };

    match command {
        Commands::Template { kind, output } => cmd_template(kind, output.as_deref()),

        Commands::Fetch {
            kind,
            fetch_size,
            output,
        } => {
            let (config, api) = connect()?;
            cmd_fetch(&api, &config, kind, fetch_size, output.as_deref()).await
        }

        Commands::List { kind, view, output } => {
            let (config, api) = connect()?;
            cmd_list(&api, &config, kind, &view, output.as_deref()).await
        }

        Commands::Import { kind, file } => {
            let (config, api) = connect()?;
            cmd_import(&api, &config, kind, &file).await
        }

        Commands::Export {
            kind,
            view,
            selected,
            dir,
            legacy_xlsx,
        } => {
            let (config, api) = connect()?;
            let dir = dir.unwrap_or_else(|| config.export_dir.clone());
            let extension = if legacy_xlsx {
                ExportExtension::LegacyXlsx
            } else {
                ExportExtension::Csv
            };
            cmd_export(&api, &config, kind, &view, selected, &dir, extension).await
        }
    }
}

/// Environment first, then command-line overrides. A URL on the command line
/// stands in for a missing `CAMPUSDESK_API_URL`.
fn load_config(api_url: Option<String>, token: Option<String>) -> ClientResult<ClientConfig> {
    let mut config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::Missing(_)) if api_url.is_some() => {
            ClientConfig::new(api_url.clone().unwrap_or_default())
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(url) = api_url {
        config.api_url = url;
    }
    if let Some(token) = token {
        config = config.with_token(token);
    }
    Ok(config)
}

fn fetch_options(config: &ClientConfig, fetch_size: Option<usize>) -> FetchOptions {
    FetchOptions {
        page_size: fetch_size.unwrap_or(config.page_size).max(1),
        max_pages: config.max_pages,
    }
}

async fn load_records(
    api: &HttpRecordApi,
    config: &ClientConfig,
    kind: EntityKind,
    fetch_size: Option<usize>,
) -> ClientResult<Vec<Record>> {
    eprintln!("📥 Fetching {} from {}", kind.list_path(), api.base_url());

    let aggregation = fetch_all(api, kind.list_path(), fetch_options(config, fetch_size)).await?;

    eprintln!(
        "   {} records in {} request(s)",
        aggregation.records.len(),
        aggregation.pages
    );
    if !aggregation.is_complete() {
        eprintln!("   ⚠️  Listing incomplete: {:?}", aggregation.completeness);
    }
    Ok(aggregation.records)
}

async fn cmd_fetch(
    api: &HttpRecordApi,
    config: &ClientConfig,
    kind: EntityKind,
    fetch_size: Option<usize>,
    output: Option<&Path>,
) -> ClientResult<()> {
    let records = load_records(api, config, kind, fetch_size).await?;
    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output)
}

async fn cmd_list(
    api: &HttpRecordApi,
    config: &ClientConfig,
    kind: EntityKind,
    view: &ViewArgs,
    output: Option<&Path>,
) -> ClientResult<()> {
    let records = load_records(api, config, kind, view.fetch_size).await?;
    let result = apply(&records, kind, &view.to_spec());

    eprintln!(
        "📋 Page {}/{} ({} matching)",
        result.page, result.total_pages, result.total_count
    );

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)
}

async fn cmd_import(
    api: &HttpRecordApi,
    config: &ClientConfig,
    kind: EntityKind,
    file: &Path,
) -> ClientResult<()> {
    eprintln!("📄 Importing {}: {}", kind, file.display());

    let report = import_file(api, kind, file, config.import_limits).await?;

    eprintln!("\n📊 Results:");
    eprintln!("   ✅ Created: {}", report.success_count);
    eprintln!("   ❌ Failed: {}", report.error_count);
    for line in report.errors.iter().take(20) {
        eprintln!("     - {}", line);
    }
    if report.errors.len() > 20 {
        eprintln!("     ... and {} more", report.errors.len() - 20);
    }

    if report.needs_refresh() {
        let records = load_records(api, config, kind, None).await?;
        eprintln!("🔄 {} now has {} records", kind.list_path(), records.len());
    }

    if report.error_count > 0 && report.success_count == 0 {
        return Err(ClientError::BadArgument(format!(
            "no rows imported from {}",
            file.display()
        )));
    }
    Ok(())
}

async fn cmd_export(
    api: &HttpRecordApi,
    config: &ClientConfig,
    kind: EntityKind,
    view: &ViewArgs,
    selected: Vec<String>,
    dir: &Path,
    extension: ExportExtension,
) -> ClientResult<()> {
    let records = load_records(api, config, kind, view.fetch_size).await?;
    let rows = filter_and_sort(&records, kind, &view.to_spec());

    let selection: HashSet<String> = selected.into_iter().collect();
    let rows = rows_for_export(&rows, kind, &selection);
    let columns = kind.schema().default_columns();

    let path = write_export(dir, &rows, kind, &columns, extension).await?;
    eprintln!("💾 Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn cmd_template(kind: EntityKind, output: Option<&Path>) -> ClientResult<()> {
    let csv = template(kind)?;
    write_output(csv.trim_end(), output)
}

fn write_output(content: &str, path: Option<&Path>) -> ClientResult<()> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
