use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use queryspec_core::{
    AliasMap, Filter, FilterOperator, LogicalOperator, SearchRequest, SortDirection, SortSpec,
    WeatherForecast, WeatherForecastResponse,
};
use queryspec_storage::seed::seed_forecasts;
use queryspec_storage::snapshot::{read_snapshot, write_snapshot};
use queryspec_storage::{apply_specification, InMemoryStore};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "queryspec")]
#[command(about = "Seed and search weather forecast snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Write a snapshot of generated forecasts
    Seed {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 5)]
        per_summary: usize,
        /// Date of the newest forecast (YYYY-MM-DD); defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Run a paged search over a snapshot and print the page as JSON
    Search {
        #[arg(long)]
        data: PathBuf,
        /// field:op:value, or field:between:from..to
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Combine filters with OR instead of AND
        #[arg(long)]
        or: bool,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
}

/// `temp:gt:20` -> `("temp", Filter::gt("20"))`
///
/// Between bounds are split on `..` so date-time bounds may keep their colons.
fn parse_filter(raw: &str) -> Result<(String, Filter)> {
    let mut parts = raw.splitn(3, ':');
    let (Some(field), Some(op), Some(rest)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("filter '{raw}' must look like field:op:value");
    };
    let operator: FilterOperator = op.parse()?;
    let filter = if operator == FilterOperator::Between {
        let (from, to) = rest
            .split_once("..")
            .ok_or_else(|| anyhow!("between filter '{raw}' must look like field:between:from..to"))?;
        Filter::between(from, to)
    } else {
        Filter::new(operator, rest)
    };
    Ok((field.to_string(), filter))
}

fn build_request(
    filters: &[String],
    or: bool,
    sort: Option<String>,
    desc: bool,
    page: u32,
    size: u32,
) -> Result<SearchRequest> {
    if page < 1 || size < 1 {
        bail!("page and size must be at least 1");
    }
    let mut request = SearchRequest::default().page(page, size);
    for raw in filters {
        let (field, filter) = parse_filter(raw)?;
        request = request.filter(field, filter);
    }
    if or {
        request = request.with_operator(LogicalOperator::Or);
    }
    if let Some(field) = sort {
        let direction = if desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        request = request.sort_by(SortSpec { field, direction });
    }
    Ok(request)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Seed {
            out,
            seed,
            per_summary,
            today,
        } => {
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            let rows = seed_forecasts(&mut StdRng::seed_from_u64(seed), today, per_summary);
            let n = write_snapshot(&out, &rows)
                .with_context(|| format!("write snapshot {}", out.display()))?;
            println!("wrote {} forecasts to {}", n, out.display());
        }
        Cmd::Search {
            data,
            filters,
            or,
            sort,
            desc,
            page,
            size,
        } => {
            let rows: Vec<WeatherForecast> = read_snapshot(&data)
                .with_context(|| format!("read snapshot {}", data.display()))?;
            let store = InMemoryStore::from_rows(rows);
            let request = build_request(&filters, or, sort, desc, page, size)?;
            let aliases = AliasMap::new().with("temp", "temperatureC");
            let result =
                apply_specification(&store, &request, &aliases, &CancellationToken::new()).await?;
            let result = result.map(WeatherForecastResponse::from);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}
