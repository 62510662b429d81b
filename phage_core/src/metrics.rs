use std::io::{self, Write};

use bevy::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::{lattice::Lattice, resources::SimulationTick};

/// Column names of the per-tick CSV, in emission order.
pub const CSV_HEADER: &str = "t,bacteriaCount,lysogenicBacteriaCountA,lyticBacteriaCountA,lysogenicBacteriaCountB,lyticBacteriaCountB,healthyBacteriaCount";

/// Population snapshot taken after both phases of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickRecord {
    pub tick: u64,
    pub total: u64,
    pub lysogenic_a: u64,
    pub lytic_a: u64,
    pub lysogenic_b: u64,
    pub lytic_b: u64,
    pub healthy: u64,
}

impl TickRecord {
    pub fn capture(tick: u64, lattice: &Lattice) -> Self {
        let counts = lattice.counts();
        Self {
            tick,
            total: counts.occupied,
            lysogenic_a: counts.lysogenic_a,
            lytic_a: counts.lytic_a,
            lysogenic_b: counts.lysogenic_b,
            lytic_b: counts.lytic_b,
            healthy: counts.healthy(),
        }
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            self.tick,
            self.total,
            self.lysogenic_a,
            self.lytic_a,
            self.lysogenic_b,
            self.lytic_b,
            self.healthy
        )
    }
}

#[derive(Resource, Default, Debug, Clone)]
pub struct SimulationMetrics {
    /// Record of the most recently completed tick.
    pub latest: Option<TickRecord>,
}

pub fn collect_metrics(
    tick: Res<SimulationTick>,
    lattice: Res<Lattice>,
    mut metrics: ResMut<SimulationMetrics>,
) {
    metrics.latest = Some(TickRecord::capture(tick.0, &lattice));
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to write metrics record: {0}")]
    Io(#[from] io::Error),
}

/// Receives one record per simulated tick, in tick order.
pub trait MetricsSink {
    fn record(&mut self, record: &TickRecord) -> Result<(), MetricsError>;

    fn finish(&mut self) -> Result<(), MetricsError> {
        Ok(())
    }
}

/// Writes the header on construction, then one CSV row per record.
pub struct CsvMetricsWriter<W: Write> {
    out: W,
}

impl<W: Write> CsvMetricsWriter<W> {
    pub fn new(mut out: W) -> Result<Self, MetricsError> {
        writeln!(out, "{CSV_HEADER}")?;
        Ok(Self { out })
    }

    pub fn into_inner(mut self) -> Result<W, MetricsError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> MetricsSink for CsvMetricsWriter<W> {
    fn record(&mut self, record: &TickRecord) -> Result<(), MetricsError> {
        writeln!(self.out, "{}", record.to_csv_row())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), MetricsError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryMetricsSink {
    pub records: Vec<TickRecord>,
}

impl MetricsSink for MemoryMetricsSink {
    fn record(&mut self, record: &TickRecord) -> Result<(), MetricsError> {
        self.records.push(*record);
        Ok(())
    }
}

/// Drops every record. Used when only the final state matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardMetrics;

impl MetricsSink for DiscardMetrics {
    fn record(&mut self, _record: &TickRecord) -> Result<(), MetricsError> {
        Ok(())
    }
}
