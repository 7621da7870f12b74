//! aqmap - drive the air-quality map dashboard core from the command line
//!
//! Replays a sequence of presentation events against the live prediction
//! and geocoding services, waits for every lookup to settle, then prints the
//! resulting view model as JSON on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```sh
//! # Two markers, then pick the first again
//! aqmap --draw 19.076,72.8777 --draw 19.1,72.9 --draw 19.076,72.8777
//!
//! # Search, then jump to a place without adding a marker
//! aqmap --search "Bandra West" --select 19.0596,72.8295
//!
//! # Point at another prediction service
//! AQMAP_PREDICTION_URL=http://10.0.0.5:5000/predict aqmap --draw 19.0,72.8
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use aqmap_core::prelude::*;

/// Air-quality map dashboard driver
#[derive(Parser, Debug)]
#[command(name = "aqmap", version)]
#[command(about = "Replay map events against the prediction service and print the view model")]
struct Args {
    /// JSON file with dashboard settings; flags below override it
    #[arg(long, env = "AQMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Prediction endpoint receiving POST {lat, lon}
    #[arg(long, env = "AQMAP_PREDICTION_URL")]
    prediction_url: Option<String>,

    /// Nominatim-compatible search endpoint
    #[arg(long, env = "AQMAP_GEOCODE_URL")]
    geocode_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "AQMAP_TIMEOUT")]
    timeout: Option<u64>,

    /// Draw a marker at LAT,LON (repeatable, applied in order)
    #[arg(long, value_name = "LAT,LON", value_parser = parse_coordinate)]
    draw: Vec<Coordinate>,

    /// Delete every marker at LAT,LON after drawing
    #[arg(long, value_name = "LAT,LON", value_parser = parse_coordinate)]
    delete: Vec<Coordinate>,

    /// Search for a place by name
    #[arg(long)]
    search: Option<String>,

    /// Jump to LAT,LON as if picked from search results
    #[arg(long, value_name = "LAT,LON", value_parser = parse_coordinate)]
    select: Option<Coordinate>,

    /// Clear all markers at the end
    #[arg(long)]
    clear: bool,

    /// Include the action log in the output and log at debug level
    #[arg(long)]
    debug: bool,
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {raw:?}"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("bad latitude {lat:?}: {e}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("bad longitude {lon:?}: {e}"))?;
    if !lat.is_finite() || !lon.is_finite() {
        return Err(format!("coordinate must be finite, got {raw:?}"));
    }
    Ok(Coordinate::new(lat, lon))
}

fn load_config(args: &Args) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| format!("reading {}: {e}", path.display()))?;
            serde_json::from_str(&raw).map_err(|e| format!("parsing {}: {e}", path.display()))?
        }
        None => DashboardConfig::default(),
    };

    if let Some(url) = &args.prediction_url {
        config.prediction_url = url.clone();
    }
    if let Some(url) = &args.geocode_url {
        config.geocode_url = url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }
    Ok(config)
}

fn init_tracing(debug: bool) -> Result<(), Box<dyn std::error::Error>> {
    let default = if debug {
        "aqmap=debug,aqmap_core=debug"
    } else {
        "aqmap=info,aqmap_core=info"
    };
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args)?;
    tracing::debug!(?config, "loaded config");

    let predictions = HttpPredictionClient::new(&config)?;
    let geocoder = NominatimClient::new(&config)?;
    let mut controller = AnnotationController::new(&config, predictions, geocoder);

    for coordinate in &args.draw {
        if !config.bounds.contains(coordinate) {
            tracing::warn!(%coordinate, "marker outside map bounds");
        }
        controller.on_draw_created(*coordinate);
    }
    if let Some(query) = &args.search {
        controller.on_search_input(query.as_str());
    }
    controller.settle().await;

    if !args.delete.is_empty() {
        controller.on_draw_deleted(&args.delete);
    }
    if let Some(coordinate) = args.select {
        controller.on_location_selected(coordinate);
        controller.settle().await;
    }
    if args.clear {
        controller.on_clear_all();
    }

    let view_model = controller.view_model();
    for marker in &view_model.markers {
        tracing::info!(key = %marker.key, status = marker.status.label(), "marker");
    }
    let output = if args.debug {
        let actions: Vec<_> = controller
            .action_log()
            .entries()
            .map(|entry| {
                serde_json::json!({
                    "sequence": entry.sequence,
                    "action": entry.name,
                    "summary": entry.summary,
                    "state_changed": entry.state_changed,
                })
            })
            .collect();
        serde_json::json!({ "view_model": view_model, "actions": actions })
    } else {
        serde_json::to_value(&view_model)?
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if let Some(failure) = &view_model.last_failure {
        tracing::warn!(key = %failure.key, error = %failure.error, "last lookup failed");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_tracing(args.debug) {
        eprintln!("Error: could not set up logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(
            parse_coordinate("19.076, 72.8777"),
            Ok(Coordinate::new(19.076, 72.8777))
        );
        assert!(parse_coordinate("19.076").is_err());
        assert!(parse_coordinate("north,72.8").is_err());
        assert!(parse_coordinate("NaN,72.8").is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "aqmap",
            "--prediction-url",
            "http://predict.local/v1",
            "--timeout",
            "3",
            "--draw",
            "19.0,72.8",
            "--draw",
            "19.1,72.9",
        ]);
        let config = load_config(&args).unwrap();

        assert_eq!(config.prediction_url, "http://predict.local/v1");
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(args.draw.len(), 2);
    }
}
