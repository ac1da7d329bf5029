use crate::workflow::config::ReviewConfig;
use anyhow::Context;
use clap::ValueEnum;
use cnetcore::io::{CsvNetworkReader, NetworkLoader, PvlLabelReader};
use cnetcore::isis::{CamptConverter, ClockLookup};
use cnetcore::model::{MeasurementTable, PointTable};
use cnetcore::processing::{find_pairs, summarize, ImagePair, NetworkSummary, PointAggregator};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Counts by status and residual extremes
    Summary,
    /// One ground location and status per control point
    Points,
    /// Image pairs ranked by shared control points
    Pairs,
    /// Serial number to cube resolution
    Match,
}

#[derive(Clone, Debug)]
pub struct ReviewRequest {
    pub network: PathBuf,
    pub images: Vec<PathBuf>,
    pub kind: ReportKind,
}

#[derive(Debug, Serialize)]
#[serde(tag = "report", content = "data", rename_all = "lowercase")]
pub enum ReviewReport {
    Summary(NetworkSummary),
    Points(PointTable),
    Pairs(Vec<ImagePair>),
    Match(BTreeMap<String, Option<PathBuf>>),
}

pub struct Runner {
    config: ReviewConfig,
    loader: NetworkLoader<CsvNetworkReader>,
}

impl Runner {
    pub fn new(config: ReviewConfig) -> Self {
        let mut loader = NetworkLoader::new(CsvNetworkReader::new());
        if let Some(cache) = config.build_cache() {
            loader = loader.with_cache(cache);
        }
        Self { config, loader }
    }

    pub fn load(&self, request: &ReviewRequest) -> anyhow::Result<MeasurementTable> {
        self.loader
            .load(&request.network)
            .with_context(|| format!("loading control network {}", request.network.display()))
    }

    pub fn execute(&self, request: &ReviewRequest) -> anyhow::Result<ReviewReport> {
        let table = self.load(request)?;

        let report = match request.kind {
            ReportKind::Summary => ReviewReport::Summary(summarize(&table)),
            ReportKind::Pairs => ReviewReport::Pairs(find_pairs(&table)),
            ReportKind::Points => {
                let aggregator = PointAggregator::new(
                    Box::new(PvlLabelReader::new()),
                    Box::new(CamptConverter::new(&self.config.campt_command)),
                );
                let images = (!request.images.is_empty()).then_some(request.images.as_slice());
                let points = aggregator
                    .to_points(&table, images)
                    .context("deriving control points")?;
                ReviewReport::Points(points)
            }
            ReportKind::Match => {
                let lookup = ClockLookup::build(&request.images[..], &PvlLabelReader::new());
                ReviewReport::Match(lookup.match_serials(table.distinct_serials()))
            }
        };

        Ok(report)
    }
}
