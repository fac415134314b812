use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reachmap::{combine, config::AppConfig, map, overpass, routing, CriterionLayer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "reachmap=debug,info"
    } else {
        "reachmap=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = AppConfig::load_from_file(&cli.config)
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;

    if config.criteria.is_empty() {
        anyhow::bail!("no criteria configured, nothing to map");
    }

    let bbox = overpass::bbox_from_point(config.area.lat, config.area.lon, config.area.radius_m);
    tracing::info!(
        lat = config.area.lat,
        lon = config.area.lon,
        radius_m = config.area.radius_m,
        "searching area"
    );

    let batch_delay = Duration::from_millis(config.routing.batch_delay_ms);
    let mut layers = Vec::new();

    for criterion in &config.criteria {
        tracing::info!(criterion = %criterion.label(), "processing criterion");

        let places =
            overpass::fetch_places(&config.overpass.endpoint, &bbox, criterion.category).await;

        let isochrones = routing::fetch_isochrones(
            &config.routing.endpoint,
            config.routing.api_key.as_deref(),
            &places,
            criterion.mode,
            criterion.minutes,
            config.routing.batch_size,
            batch_delay,
        )
        .await;

        layers.push(CriterionLayer {
            criterion: *criterion,
            isochrones,
        });
    }

    let region_sets = combine::combine(&layers);
    tracing::info!(count = region_sets.len(), "combined region sets");

    map::write_html(
        &config.output.html,
        &region_sets,
        config.area.lat,
        config.area.lon,
    )
    .with_context(|| format!("failed to write map to {:?}", config.output.html))?;
    println!("Map written to {}", config.output.html.display());

    if let Some(path) = &config.output.geojson {
        map::write_geojson(path, &region_sets)
            .with_context(|| format!("failed to write GeoJSON to {:?}", path))?;
        println!("GeoJSON written to {}", path.display());
    }

    Ok(())
}
