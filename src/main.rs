use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use hubfabric::{composer, config_loader, declaration};
use log::info;
use std::path::PathBuf;

/// Topology composer for hub-and-spoke hybrid network fabrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the fabric configuration file (YAML or JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Region whose CIDR plan is composed
    #[arg(short, long)]
    region: String,

    /// Output directory for the declaration and outputs
    #[arg(short, long, default_value = "fabric_output")]
    output: PathBuf,

    /// Only resolve and validate the configuration
    #[arg(long)]
    check: bool,

    /// Log the build plan in evaluation order
    #[arg(long)]
    print_plan: bool,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting HubFabric topology composer");
    info!("Configuration file: {:?}", args.config);
    info!("Region: {}", args.region);

    let config = config_loader::load_config(&args.config)?;

    if args.check {
        config
            .resolve(&args.region)
            .wrap_err_with(|| format!("Region '{}' failed validation", args.region))?;
        info!("Configuration is valid for region {}", args.region);
        return Ok(());
    }

    let composition = composer::compose(&config, &args.region)?;

    if args.print_plan {
        info!("Build plan ({} resources):", composition.order().len());
        for (i, node) in composition.order().iter().enumerate() {
            info!("  {:>3}. {}", i + 1, node);
        }
    }

    let (declaration_path, outputs_path) =
        declaration::write_composition(&composition, &args.output)?;

    info!("Declaration: {:?}", declaration_path);
    info!("Outputs: {:?}", outputs_path);
    info!("Composition completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from([
            "hubfabric",
            "--config", "fabric.yaml",
            "--region", "us-east-1",
        ]);

        assert_eq!(args.config, PathBuf::from("fabric.yaml"));
        assert_eq!(args.region, "us-east-1");
        assert_eq!(args.output, PathBuf::from("fabric_output"));
        assert!(!args.check);
        assert!(!args.print_plan);
    }

    #[test]
    fn test_flag_args() {
        let args = Args::parse_from([
            "hubfabric",
            "-c", "fabric.json",
            "-r", "eu-west-2",
            "-o", "out",
            "--check",
            "--print-plan",
        ]);

        assert_eq!(args.output, PathBuf::from("out"));
        assert!(args.check);
        assert!(args.print_plan);
    }

    #[test]
    fn test_region_is_required() {
        assert!(Args::try_parse_from(["hubfabric", "--config", "fabric.yaml"]).is_err());
    }
}
