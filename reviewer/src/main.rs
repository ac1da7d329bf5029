use anyhow::Context;
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;
use workflow::config::{load_cube_list, ReviewConfig};
use workflow::runner::{ReportKind, ReviewRequest, Runner};

mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Control-network review reports")]
struct Args {
    /// Control network (flat CSV export)
    network: PathBuf,
    /// Report to produce
    #[arg(long, value_enum, default_value_t = ReportKind::Summary)]
    report: ReportKind,
    /// Cube files used to resolve serial numbers
    #[arg(long, num_args = 1..)]
    images: Vec<PathBuf>,
    /// Cube list file, one cube path per line
    #[arg(long)]
    cube_list: Option<PathBuf>,
    /// Load review settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Always re-parse the network
    #[arg(long, default_value_t = false)]
    no_cache: bool,
    /// campt executable for coordinate conversion
    #[arg(long)]
    campt: Option<PathBuf>,
    /// Write the JSON report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match args.config.as_ref() {
        Some(path) => ReviewConfig::load(path)?,
        None => ReviewConfig::default(),
    }
    .with_overrides(args.cache_dir.clone(), args.no_cache, args.campt.clone());

    let mut images = args.images.clone();
    if let Some(list) = args.cube_list.as_ref() {
        images.extend(load_cube_list(list)?);
    }

    let request = ReviewRequest {
        network: args.network.clone(),
        images,
        kind: args.report,
    };
    let runner = Runner::new(config);
    let report = runner.execute(&request)?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("serializing report")?;

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, rendered + "\n")
                .with_context(|| format!("writing report {}", path.display()))?;
            info!("{:?} report written to {}", request.kind, path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
