#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line reports over the epi-map dataset.
//!
//! ```text
//! epi_map summary [--sort cases_desc] [--metric per100k] [--n 10]
//! epi_map top [--by disease|state|year] [--n 4]
//! epi_map years --disease Measles [--state CA]
//! epi_map trend [--diseases Measles,Mumps]
//! epi_map histogram | scatter | distribution | choropleth [--metric per100k]
//! epi_map state California
//! epi_map theme [light|dark|toggle]
//! epi_map serve
//! ```
//!
//! Every report is printed as JSON. Configuration comes from
//! `epi_map.toml` (or `EPI_MAP_CONFIG`), then environment overrides, then
//! the global flags below.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use epi_map_analytics::{top_n_totals, totals_by, year_series};
use epi_map_analytics_models::GroupBy;
use epi_map_dataset::{
    EpiMapConfig, LoadedDataset, Preferences, Theme,
    config::{CONFIG_ENV, DEFAULT_CONFIG_PATH, parse_value},
    load_boundaries_or_empty, load_configured, load_preferences, save_preferences,
};
use epi_map_server::views;
use epi_map_server_models::{
    ApiPreferences, DEFAULT_TOP_DISEASES, DashboardQueryParams, DashboardRequest,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "epi_map", about = "Disease surveillance reports by state")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CSV dataset to load instead of the configured one
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// `GeoJSON` state boundaries for `choropleth`
    #[arg(long, global = true)]
    boundaries: Option<PathBuf>,

    /// How repeated population values combine: `first_seen` or `max`
    #[arg(long, global = true)]
    policy: Option<String>,

    /// Skip the on-disk dataset cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Row selectors and chart options shared by the reports.
#[derive(Args, Default)]
struct QueryArgs {
    /// Only rows for this disease
    #[arg(long)]
    disease: Option<String>,

    /// Only rows for this year
    #[arg(long)]
    year: Option<String>,

    /// Only rows for this state
    #[arg(long)]
    state: Option<String>,

    /// Ranking order: `cases_desc`, `cases_asc`, `alpha_asc`, `alpha_desc`,
    /// `population_desc`, `density_desc`, `per100k_desc`
    #[arg(long)]
    sort: Option<String>,

    /// Value per state: `cases` or `per100k`
    #[arg(long)]
    metric: Option<String>,

    /// Scatter x-axis: `population` or `density`
    #[arg(long)]
    axis: Option<String>,

    /// Comma-separated diseases to chart
    #[arg(long)]
    diseases: Option<String>,

    /// Maximum number of results
    #[arg(long)]
    n: Option<String>,
}

impl QueryArgs {
    fn into_request(self) -> Result<DashboardRequest, Box<dyn std::error::Error>> {
        let params = DashboardQueryParams {
            disease: self.disease,
            year: self.year,
            state: self.state,
            sort: self.sort,
            metric: self.metric,
            axis: self.axis,
            diseases: self.diseases,
            n: self.n,
        };
        Ok(DashboardRequest::from_params(&params)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the diseases, years and states in the dataset
    Meta,
    /// Ranked per-state totals with the headline table
    Summary {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Largest case totals by disease, state or year
    Top {
        /// Grouping key: `disease`, `state` or `year`
        #[arg(long, default_value = "disease")]
        by: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Case totals per year
    Years {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Case totals per year for several diseases over their common years
    Trend {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Histogram of per-state values
    Histogram {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Population or density against per-state values
    Scatter {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Per-disease distribution of per-state values
    Distribution {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// State boundaries joined with per-state values, as `GeoJSON`
    Choropleth {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Everything about one state
    State {
        /// State name
        name: String,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Show or change the dashboard theme
    Theme {
        /// `light`, `dark` or `toggle`
        value: Option<String>,
    },
    /// Start the API server
    Serve,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Serve => {
            actix_web::rt::System::new().block_on(epi_map_server::run_server(config))?;
        }
        Commands::Theme { value } => {
            let dir = config.cache.dir.as_path();
            let theme = match value.as_deref().map(str::trim) {
                None => load_preferences(dir).theme,
                Some(value) => {
                    let theme = resolve_theme(load_preferences(dir).theme, value)?;
                    save_preferences(dir, &Preferences::with_theme(theme))?;
                    theme
                }
            };
            print_json(&ApiPreferences { theme })?;
        }
        Commands::Meta => {
            let loaded = load(&config)?;
            print_json(&views::meta(
                &loaded.dataset,
                loaded.source,
                loaded.dropped,
                loaded.notice.as_ref(),
            ))?;
        }
        Commands::Summary { query } => {
            let req = query.into_request()?;
            let loaded = load(&config)?;
            print_json(&views::summary(
                loaded.dataset.rows(),
                &req,
                config.aggregation.policy,
            ))?;
        }
        Commands::Top { by, query } => {
            let group_by: GroupBy = parse_value("--by", &by)?;
            let req = query.into_request()?;
            let loaded = load(&config)?;
            let totals = totals_by(loaded.dataset.rows(), group_by, &req.filter);
            print_json(&top_n_totals(
                totals,
                req.n.unwrap_or(DEFAULT_TOP_DISEASES),
            ))?;
        }
        Commands::Years { query } => {
            let req = query.into_request()?;
            let loaded = load(&config)?;
            print_json(&year_series(loaded.dataset.rows(), &req.filter))?;
        }
        Commands::Trend { query } => {
            let req = query.into_request()?;
            let loaded = load(&config)?;
            print_json(&views::trend(loaded.dataset.rows(), &req))?;
        }
        Commands::Histogram { query } => {
            let req = query.into_request()?;
            let loaded = load(&config)?;
            print_json(&views::state_histogram(
                loaded.dataset.rows(),
                &req,
                config.aggregation.policy,
            ))?;
        }
        Commands::Scatter { query } => {
            let req = query.into_request()?;
            let loaded = load(&config)?;
            print_json(&views::scatter(
                loaded.dataset.rows(),
                &req,
                config.aggregation.policy,
            ))?;
        }
        Commands::Distribution { query } => {
            let req = query.into_request()?;
            let loaded = load(&config)?;
            print_json(&views::distribution(
                loaded.dataset.rows(),
                &req,
                config.aggregation.policy,
            ))?;
        }
        Commands::Choropleth { query } => {
            let req = query.into_request()?;
            let loaded = load(&config)?;
            let (boundaries, notice) = load_boundaries_or_empty(config.data.boundaries.as_deref());
            if let Some(notice) = &notice {
                eprintln!("warning: {}", notice.message);
            }
            print_json(&views::choropleth(
                loaded.dataset.rows(),
                &boundaries,
                notice.as_ref(),
                &req,
                config.aggregation.policy,
            ))?;
        }
        Commands::State { name, query } => {
            let req = query.into_request()?;
            let loaded = load(&config)?;
            print_json(&views::state_view(
                loaded.dataset.rows(),
                name.trim(),
                &req,
                config.aggregation.policy,
            ))?;
        }
    }

    Ok(())
}

/// Config file, then environment overrides, then command-line flags.
fn resolve_config(cli: &Cli) -> Result<EpiMapConfig, Box<dyn std::error::Error>> {
    let path = cli.config.clone().unwrap_or_else(|| {
        PathBuf::from(
            std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
        )
    });

    let mut config = EpiMapConfig::load(&path)?;
    config.apply_overrides(|name| std::env::var(name).ok())?;
    apply_flags(&mut config, cli)?;
    Ok(config)
}

fn apply_flags(config: &mut EpiMapConfig, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dataset) = &cli.dataset {
        config.data.dataset.clone_from(dataset);
    }
    if let Some(boundaries) = &cli.boundaries {
        config.data.boundaries = Some(boundaries.clone());
    }
    if let Some(policy) = &cli.policy {
        config.aggregation.policy = parse_value("--policy", policy)?;
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    Ok(())
}

fn resolve_theme(current: Theme, value: &str) -> Result<Theme, Box<dyn std::error::Error>> {
    if value.eq_ignore_ascii_case("toggle") {
        return Ok(current.toggled());
    }
    Ok(parse_value("theme", value)?)
}

/// Loads the dataset, printing any load notice to stderr.
fn load(config: &EpiMapConfig) -> Result<LoadedDataset, Box<dyn std::error::Error>> {
    let loaded = load_configured(config)?;
    log::debug!(
        "{} rows from {} ({} dropped)",
        loaded.dataset.len(),
        config.data.dataset.display(),
        loaded.dropped
    );
    if let Some(notice) = &loaded.notice {
        eprintln!("warning: {}", notice.message);
    }
    Ok(loaded)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
