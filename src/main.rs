//! Cost of Living Dashboard - command line front end
//!
//! Loads the CSO datasets, applies the sidebar filters given on the command
//! line and prints the dashboard snapshot as JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use col_dashboard::charts::{CategoryPalette, DashboardSnapshot};
use col_dashboard::config::{DashboardConfig, YearSpan};
use col_dashboard::data::{DataLoader, LabelTarget};
use col_dashboard::filter::{FilterEvent, FilterState, PeriodSelection};
use std::path::{Path, PathBuf};
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PeriodArg {
    All,
    PreCovid,
    Covid,
    InflationSurge,
}

impl From<PeriodArg> for PeriodSelection {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::All => PeriodSelection::All,
            PeriodArg::PreCovid => PeriodSelection::PreCovid,
            PeriodArg::Covid => PeriodSelection::Covid,
            PeriodArg::InflationSurge => PeriodSelection::InflationSurge,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "col-dashboard", version, about = "Ireland cost of living dashboard data")]
struct Args {
    /// Directory holding the four CSO CSV exports
    #[arg(long, env = "COL_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// TOML config (periods, label overrides, spending weights)
    #[arg(long, env = "COL_CONFIG")]
    config: Option<PathBuf>,

    /// First year of the range (defaults to the baseline year or first data year)
    #[arg(long)]
    from: Option<i32>,

    /// Last year of the range (defaults to the last data year)
    #[arg(long)]
    to: Option<i32>,

    /// Category to include, by short name or CSO label; repeatable (defaults to all 12)
    #[arg(long = "category")]
    categories: Vec<String>,

    #[arg(long, value_enum, default_value_t = PeriodArg::All)]
    period: PeriodArg,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => PathBuf::from(DEFAULT_CONFIG_PATH),
        None => {
            info!("No config file, using built-in defaults");
            return Ok(DashboardConfig::default());
        }
    };

    let config = DashboardConfig::load(&path)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    info!(
        path = %path.display(),
        weight_groups = config.weights.group_names().len(),
        "Loaded configuration"
    );
    Ok(config)
}

fn initial_filter(args: &Args, config: &DashboardConfig, bounds: (i32, i32)) -> Result<FilterState> {
    let start = args.from.unwrap_or(bounds.0.max(config.baseline_year.min(bounds.1)));
    let end = args.to.unwrap_or(bounds.1);

    let mut state = FilterState::with_defaults(YearSpan::new(bounds.0, bounds.1))?
        .apply(FilterEvent::SetYearRange { start, end })
        .with_context(|| format!("--from/--to must lie within {}-{}", bounds.0, bounds.1))?
        .apply(FilterEvent::SetPeriod(args.period.into()))?;

    if !args.categories.is_empty() {
        let mut selected = Vec::new();
        for name in &args.categories {
            match config.labels.lookup(name) {
                Some(LabelTarget::Category(category)) => selected.push(category),
                _ => bail!("unknown category '{name}'"),
            }
        }
        state = state.apply(FilterEvent::SelectCategories(selected))?;
    }

    Ok(state)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting col-dashboard v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let loader = DataLoader::new(&args.data_dir, config.files.clone());
    let tables = match loader.load_all(&config.labels) {
        Ok(tables) => tables,
        Err(e) => {
            error!("Failed to load datasets from {}: {}", args.data_dir.display(), e);
            return Err(e.into());
        }
    };

    let Some(bounds) = tables.year_bounds() else {
        bail!("no usable rows in {}", args.data_dir.display());
    };

    let filter = initial_filter(&args, &config, bounds)?;
    info!(
        from = filter.year_range().start,
        to = filter.year_range().end,
        categories = filter.selected_categories().len(),
        period = filter.selected_period().label(),
        "Filter state"
    );

    let palette = CategoryPalette::standard();
    let snapshot = DashboardSnapshot::build(&tables, &config, &palette, &filter);

    let json = if args.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{json}");

    Ok(())
}
