//! tilecrop: stitch the region between two tile-canvas points into a PNG.
//!
//! Points are given the way the canvas reports them: a tile index and a
//! pixel offset inside that tile. Tiles come from the public backend by
//! default, from another server with `--base-url`, or from a local mirror
//! with `--tiles-dir`.
//!
//! # Usage
//!
//! ```text
//! tilecrop --from 1023,680,500,500 --to 1024,681,500,500 -o out.png
//! tilecrop --from 0,0,10,10 --to 2,1,90,40 --tiles-dir ./tiles -o out.png --json
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod source;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use futures::executor::block_on;
use tilecrop_core::{
    BackendConfig, ConfigError, Coordinate, CoordinateError, Selection, StitchError,
    StitchResult, StitchSummary, TileFetchError, TileIndex, TileSource, encode_png, stitch,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::source::{DirTileSource, HttpTileSource};

/// Stitch the region between two tile-canvas points into one PNG.
#[derive(Parser, Debug)]
#[command(name = "tilecrop", version)]
struct Cli {
    /// First corner as "TILE_X,TILE_Y,PIXEL_X,PIXEL_Y".
    #[arg(long, value_name = "TX,TY,PX,PY", value_parser = parse_point)]
    from: PointArg,

    /// Opposite corner as "TILE_X,TILE_Y,PIXEL_X,PIXEL_Y".
    #[arg(long, value_name = "TX,TY,PX,PY", value_parser = parse_point)]
    to: PointArg,

    /// Output PNG path.
    #[arg(short, long)]
    output: PathBuf,

    /// Read tiles from a local directory laid out as DIR/{x}/{y}.png
    /// instead of downloading them.
    #[arg(long, value_name = "DIR", conflicts_with = "base_url")]
    tiles_dir: Option<PathBuf>,

    /// Backend origin to download tiles from.
    #[arg(long, value_name = "URL", default_value = BackendConfig::DEFAULT_BACKEND_ORIGIN)]
    base_url: String,

    /// Path prefix of the tile endpoint.
    #[arg(long, default_value = BackendConfig::DEFAULT_TILES_PREFIX)]
    tiles_prefix: String,

    /// Tile edge length in pixels.
    #[arg(long, default_value_t = BackendConfig::DEFAULT_TILE_SIZE, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    tile_size: u32,

    /// HTTP timeout per tile, in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Print a JSON summary of the run to stdout.
    #[arg(long)]
    json: bool,

    /// Full backend config as a JSON string.
    ///
    /// When provided, `--base-url`, `--tiles-prefix` and `--tile-size` are
    /// ignored. The JSON must be a valid `BackendConfig` serialization;
    /// missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Errors that stop a run before any output is written.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// `--config-json` is not a valid backend config.
    #[error("error parsing --config-json: {0}")]
    ConfigJson(#[from] serde_json::Error),

    /// The backend config failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A point does not fit the tile grid.
    #[error("invalid point: {0}")]
    Point(#[from] CoordinateError),

    /// The tile server client could not be set up.
    #[error(transparent)]
    Tiles(#[from] TileFetchError),

    /// Stitching the region failed.
    #[error(transparent)]
    Stitch(#[from] StitchError),
}

/// A point as typed on the command line, before validation against the
/// tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PointArg {
    tile_x: u32,
    tile_y: u32,
    pixel_x: u32,
    pixel_y: u32,
}

impl PointArg {
    fn coordinate(self, tile_size: u32) -> Result<Coordinate, CoordinateError> {
        Coordinate::new(
            TileIndex::new(self.tile_x, self.tile_y),
            self.pixel_x,
            self.pixel_y,
            tile_size,
        )
    }
}

/// Parse "TX,TY,PX,PY".
fn parse_point(s: &str) -> Result<PointArg, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [tx, ty, px, py] = parts.as_slice() else {
        return Err(format!(
            "expected TILE_X,TILE_Y,PIXEL_X,PIXEL_Y, got {} value(s) in '{s}'",
            parts.len()
        ));
    };

    let field = |name: &str, v: &str| {
        v.parse::<u32>()
            .map_err(|e| format!("invalid {name} '{v}': {e}"))
    };
    Ok(PointArg {
        tile_x: field("tile x", tx)?,
        tile_y: field("tile y", ty)?,
        pixel_x: field("pixel x", px)?,
        pixel_y: field("pixel y", py)?,
    })
}

/// Build the backend config from CLI arguments.
///
/// If `--config-json` is provided it wins over the individual flags.
fn config_from_cli(cli: &Cli) -> Result<BackendConfig, CliError> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json)?
    } else {
        BackendConfig {
            backend_origin: cli.base_url.clone(),
            tiles_prefix: cli.tiles_prefix.clone(),
            tile_size: cli.tile_size,
            ..BackendConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

fn selection_from_cli(cli: &Cli, tile_size: u32) -> Result<Selection, CliError> {
    Ok(Selection {
        first: cli.from.coordinate(tile_size)?,
        second: cli.to.coordinate(tile_size)?,
    })
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_stitch<S: TileSource>(
    source: &S,
    selection: &Selection,
    config: &BackendConfig,
) -> Result<StitchResult, CliError> {
    Ok(block_on(stitch(source, selection, config))?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let selection = match selection_from_cli(&cli, config.tile_size) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = if let Some(ref dir) = cli.tiles_dir {
        info!(dir = %dir.display(), "reading tiles from directory");
        run_stitch(&DirTileSource::new(dir.clone()), &selection, &config)
    } else {
        info!(origin = %config.backend_origin, "downloading tiles");
        HttpTileSource::new(config.clone(), Duration::from_secs(cli.timeout_secs))
            .map_err(CliError::from)
            .and_then(|source| run_stitch(&source, &selection, &config))
    };
    let result = match outcome {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "stitch failed");
            return ExitCode::FAILURE;
        }
    };

    let png = match encode_png(&result.image) {
        Ok(png) => png,
        Err(e) => {
            error!(error = %e, "encoding failed");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = std::fs::write(&cli.output, &png) {
        error!(path = %cli.output.display(), error = %e, "failed to write output");
        return ExitCode::FAILURE;
    }

    let summary = result.summary();
    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing summary: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_report(&summary, &cli.output);
    }

    ExitCode::SUCCESS
}

fn print_report(summary: &StitchSummary, output: &std::path::Path) {
    println!(
        "Wrote {} ({}x{})",
        output.display(),
        summary.dimensions.width,
        summary.dimensions.height
    );
    println!("  tiles composited: {}", summary.composited.len());
    if !summary.skipped.is_empty() {
        let skipped: Vec<String> = summary.skipped.iter().map(ToString::to_string).collect();
        println!("  tiles skipped:    {}", skipped.join(", "));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["tilecrop", "-o", "out.png"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn parses_four_part_point() {
        assert_eq!(
            parse_point("1023, 680,500,7").unwrap(),
            PointArg {
                tile_x: 1023,
                tile_y: 680,
                pixel_x: 500,
                pixel_y: 7,
            }
        );
    }

    #[test]
    fn rejects_wrong_arity_and_negatives() {
        assert!(parse_point("1,2,3").unwrap_err().contains("3 value(s)"));
        assert!(parse_point("1,2,3,4,5").is_err());
        assert!(parse_point("1,-2,3,4").unwrap_err().contains("tile y"));
    }

    #[test]
    fn flags_build_backend_config() {
        let cli = cli(&[
            "--from",
            "0,0,1,1",
            "--to",
            "1,1,2,2",
            "--base-url",
            "http://localhost:8080/",
            "--tile-size",
            "256",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.backend_origin, "http://localhost:8080/");
        assert_eq!(config.tile_size, 256);
        assert_eq!(config.tiles_prefix, BackendConfig::DEFAULT_TILES_PREFIX);
        assert_eq!(
            config.tile_url(TileIndex::new(3, 4)),
            "http://localhost:8080/files/s0/tiles/3/4.png"
        );
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = cli(&[
            "--from",
            "0,0,1,1",
            "--to",
            "1,1,2,2",
            "--tile-size",
            "256",
            "--config-json",
            r#"{"tile_size": 512}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.tile_size, 512);
        assert_eq!(config.backend_origin, BackendConfig::DEFAULT_BACKEND_ORIGIN);
    }

    #[test]
    fn pixel_outside_tile_is_rejected() {
        let cli = cli(&["--from", "0,0,1000,1", "--to", "1,1,2,2"]);
        let config = config_from_cli(&cli).unwrap();
        let err = selection_from_cli(&cli, config.tile_size).unwrap_err();
        assert!(matches!(err, CliError::Point(_)));
        assert!(err.to_string().starts_with("invalid point: "));
    }

    #[test]
    fn malformed_config_json_is_reported() {
        let cli = cli(&[
            "--from",
            "0,0,1,1",
            "--to",
            "1,1,2,2",
            "--config-json",
            "{tile_size: 512",
        ]);
        let err = config_from_cli(&cli).unwrap_err();
        assert!(matches!(err, CliError::ConfigJson(_)));
        assert!(err.to_string().starts_with("error parsing --config-json: "));
    }

    #[test]
    fn invalid_config_json_fails_validation() {
        let cli = cli(&[
            "--from",
            "0,0,1,1",
            "--to",
            "1,1,2,2",
            "--config-json",
            r#"{"tile_size": 0}"#,
        ]);
        let err = config_from_cli(&cli).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::ZeroTileSize)));
    }

    #[test]
    fn identical_points_fail_to_stitch() {
        let cli = cli(&["--from", "0,0,5,5", "--to", "0,0,5,5", "--tiles-dir", "tiles"]);
        let config = config_from_cli(&cli).unwrap();
        let selection = selection_from_cli(&cli, config.tile_size).unwrap();
        let source = DirTileSource::new(PathBuf::from("tiles"));
        let err = run_stitch(&source, &selection, &config).unwrap_err();
        assert!(matches!(
            err,
            CliError::Stitch(StitchError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn tiles_dir_conflicts_with_base_url() {
        let result = Cli::try_parse_from([
            "tilecrop",
            "-o",
            "out.png",
            "--from",
            "0,0,1,1",
            "--to",
            "1,1,2,2",
            "--tiles-dir",
            "tiles",
            "--base-url",
            "http://localhost",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn zero_tile_size_flag_is_rejected() {
        let result = Cli::try_parse_from([
            "tilecrop", "-o", "out.png", "--from", "0,0,0,0", "--to", "1,1,0,0", "--tile-size",
            "0",
        ]);
        assert!(result.is_err());
    }
}
