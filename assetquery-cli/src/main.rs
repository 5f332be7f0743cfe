//! AssetQuery CLI - Command-line interface
//!
//! Queries exposure data for a rectangular region of interest from a named
//! schema and writes the matching geocells as GeoJSON and NRML files.

mod error;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use assetquery::config::{QueryConfig, QueryMode};
use assetquery::roi::RegionOfInterest;
use assetquery::service::QueryService;
use error::CliError;

#[derive(Parser)]
#[command(name = "assetquery")]
#[command(version = assetquery::VERSION)]
#[command(about = "Query an exposure model from flat-file datasets", long_about = None)]
struct Args {
    /// Region of interest: minimal longitude
    #[arg(allow_negative_numbers = true)]
    lonmin: f64,

    /// Region of interest: maximal longitude
    #[arg(allow_negative_numbers = true)]
    lonmax: f64,

    /// Region of interest: minimal latitude
    #[arg(allow_negative_numbers = true)]
    latmin: f64,

    /// Region of interest: maximal latitude
    #[arg(allow_negative_numbers = true)]
    latmax: f64,

    /// Exposure/vulnerability schema (e.g. SARA_v1.0)
    schema: String,

    /// Type of exposed assets (e.g. res)
    assettype: String,

    /// Query mode ('within' / 'intersects')
    querymode: String,

    /// Only load dataset files whose name contains this string
    #[arg(long)]
    model: Option<String>,

    /// Root directory holding one subdirectory per schema
    #[arg(long, default_value = "schemas")]
    schemas_dir: PathBuf,

    /// Directory receiving the two output files
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        e.exit();
    }
}

fn run(args: Args) -> Result<(), CliError> {
    assetquery::logging::init_logging().map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let mode: QueryMode = args
        .querymode
        .parse()
        .map_err(assetquery::service::QueryError::from)?;
    let roi = RegionOfInterest::new(args.lonmin, args.lonmax, args.latmin, args.latmax)?;

    let config = QueryConfig::new(
        args.schemas_dir,
        args.schema,
        args.assettype,
        mode,
        args.output_dir,
    )
    .with_model_filter(args.model);

    info!(
        bounds = ?roi.bounds(),
        schema = %config.schema,
        mode = %config.mode,
        "running exposure query"
    );

    let report = QueryService::new(config).run(&roi)?;

    println!("{} geocells matched, {} assets", report.matched, report.assets);
    println!("GeoJSON: {}", report.geojson_path.display());
    println!("NRML:    {}", report.xml_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_argument_order() {
        let args = Args::try_parse_from([
            "assetquery",
            "-71.8",
            "-71.4",
            "-33.2",
            "-33.0",
            "SARA_v1.0",
            "res",
            "intersects",
        ])
        .unwrap();
        assert_eq!(args.lonmin, -71.8);
        assert_eq!(args.lonmax, -71.4);
        assert_eq!(args.latmin, -33.2);
        assert_eq!(args.latmax, -33.0);
        assert_eq!(args.schema, "SARA_v1.0");
        assert_eq!(args.assettype, "res");
        assert_eq!(args.querymode, "intersects");
        assert_eq!(args.model, None);
    }

    #[test]
    fn test_optional_flags() {
        let args = Args::try_parse_from([
            "assetquery",
            "0",
            "1",
            "0",
            "1",
            "SARA_v1.0",
            "res",
            "within",
            "--model",
            "valparaiso",
            "--schemas-dir",
            "/data/schemas",
            "--output-dir",
            "/tmp/out",
        ])
        .unwrap();
        assert_eq!(args.model.as_deref(), Some("valparaiso"));
        assert_eq!(args.schemas_dir, PathBuf::from("/data/schemas"));
        assert_eq!(args.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_missing_positionals_rejected() {
        assert!(Args::try_parse_from(["assetquery", "0", "1"]).is_err());
    }
}
