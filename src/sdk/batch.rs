use std::path::Path;

use crate::sdk::error::GaodeError;
use crate::sdk::geocode::GeocodeResolver;
use crate::sdk::routing::service::RouteProvider;
use crate::sdk::routing::types::RouteSummary;
use crate::sdk::table::{Table, Value};

pub const COL_ORIGIN: &str = "origin";
pub const COL_DESTINATION: &str = "destination";
pub const COL_DISTANCE: &str = "gaode_map_distance";
pub const COL_DURATION: &str = "duration";
pub const COL_TOLL: &str = "toll";
pub const COL_STATUS: &str = "status";

pub const DEFAULT_CHECKPOINT_EVERY: usize = 20;

/// Per-row fetch state as stored in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Pending,
    Done,
    Failed,
}

impl RowStatus {
    /// `failed` (and anything unrecognized) is fetched again on the next run.
    fn parse(value: &Value) -> RowStatus {
        match value.as_str() {
            Some("done") => RowStatus::Done,
            Some("failed") => RowStatus::Failed,
            _ => RowStatus::Pending,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            RowStatus::Pending => "pending",
            RowStatus::Done => "done",
            RowStatus::Failed => "failed",
        }
    }
}

/// What a run did. `checkpoints` counts mid-run saves only; the final save on
/// completion is unconditional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub skipped: usize,
    pub checkpoints: usize,
}

/// Single forward pass over the route table: skip finished rows, fetch the
/// rest one at a time, checkpoint every `checkpoint_every` fetched rows.
///
/// Any error — unknown city or rejected call — saves the table and stops the
/// whole batch. The failing row keeps its old cells, so a rerun resumes at
/// exactly that row. Coarse on purpose: resumability instead of retries.
pub struct BatchRunner<'a, P: RouteProvider> {
    table: &'a mut Table,
    path: &'a Path,
    resolver: &'a GeocodeResolver,
    provider: &'a P,
    checkpoint_every: usize,
}

impl<'a, P: RouteProvider> BatchRunner<'a, P> {
    pub fn new(
        table: &'a mut Table,
        path: &'a Path,
        resolver: &'a GeocodeResolver,
        provider: &'a P,
    ) -> Self {
        Self {
            table,
            path,
            resolver,
            provider,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
        }
    }

    pub fn checkpoint_every(mut self, rows: usize) -> Self {
        self.checkpoint_every = rows.max(1);
        self
    }

    pub fn run(self) -> Result<RunReport, GaodeError> {
        require_columns(self.table, self.path)?;
        ensure_status_column(self.table)?;
        let has_toll = self.table.has_column(COL_TOLL);

        let mut report = RunReport::default();
        for row in 0..self.table.len() {
            if RowStatus::parse(self.table.get(row, COL_STATUS)?) == RowStatus::Done {
                report.skipped += 1;
                continue;
            }

            let origin = self.table.get(row, COL_ORIGIN)?.to_string();
            let destination = self.table.get(row, COL_DESTINATION)?.to_string();

            let summary = match self.fetch_one(&origin, &destination) {
                Ok(summary) => summary,
                Err(err) => {
                    log::error!(
                        "row {} ({} -> {}) failed: {}. Saving table before stopping.",
                        row,
                        origin,
                        destination,
                        err
                    );
                    self.table.save(self.path)?;
                    return Err(err);
                }
            };

            self.table
                .set(row, COL_DISTANCE, Value::Number(summary.distance_km))?;
            self.table
                .set(row, COL_DURATION, Value::Number(summary.duration_secs))?;
            if has_toll {
                self.table.set(
                    row,
                    COL_TOLL,
                    Value::Number(summary.toll_yuan.unwrap_or(0.0)),
                )?;
            }
            self.table.set(
                row,
                COL_STATUS,
                Value::Text(RowStatus::Done.as_str().to_string()),
            )?;
            report.fetched += 1;

            if report.fetched % self.checkpoint_every == 0 {
                log::info!("checkpoint after {} fetched rows", report.fetched);
                self.table.save(self.path)?;
                report.checkpoints += 1;
            }
        }

        self.table.save(self.path)?;
        log::info!(
            "batch finished: {} fetched, {} skipped, {} checkpoints",
            report.fetched,
            report.skipped,
            report.checkpoints
        );
        Ok(report)
    }

    fn fetch_one(&self, origin: &str, destination: &str) -> Result<RouteSummary, GaodeError> {
        let origin_coord = self.resolver.resolve(origin)?;
        let destination_coord = self.resolver.resolve(destination)?;
        self.provider.fetch_route(origin_coord, destination_coord)
    }
}

/// Builds a fresh route table: every ordered pair of distinct cities, all
/// rows pending.
pub fn build_route_table(cities: &[String], with_toll: bool) -> Result<Table, GaodeError> {
    let mut header = vec![COL_ORIGIN, COL_DESTINATION, COL_DISTANCE, COL_DURATION];
    if with_toll {
        header.push(COL_TOLL);
    }
    header.push(COL_STATUS);
    let mut table = Table::new(header.into_iter().map(String::from).collect());

    for origin in cities {
        for destination in cities {
            if origin == destination {
                continue;
            }
            let mut row = vec![
                Value::Text(origin.clone()),
                Value::Text(destination.clone()),
                Value::Number(0.0),
                Value::Number(0.0),
            ];
            if with_toll {
                row.push(Value::Number(0.0));
            }
            row.push(Value::Text(RowStatus::Pending.as_str().to_string()));
            table.push_row(row)?;
        }
    }
    Ok(table)
}

fn require_columns(table: &Table, path: &Path) -> Result<(), GaodeError> {
    for column in [COL_ORIGIN, COL_DESTINATION, COL_DISTANCE, COL_DURATION] {
        if !table.has_column(column) {
            return Err(GaodeError::MalformedTable {
                path: path.to_path_buf(),
                detail: format!("missing column {:?}", column),
            });
        }
    }
    Ok(())
}

/// Tables written before the status column existed used distance 0 as the
/// pending marker. Derive the column once; saves then always carry it.
fn ensure_status_column(table: &mut Table) -> Result<(), GaodeError> {
    if table.has_column(COL_STATUS) {
        return Ok(());
    }
    let distance = table
        .header()
        .iter()
        .position(|h| h == COL_DISTANCE)
        .ok_or_else(|| GaodeError::UnknownColumn(COL_DISTANCE.to_string()))?;
    log::info!("no status column found; deriving it from the distance sentinel");
    table.add_column(COL_STATUS, |row| {
        let fetched = matches!(row[distance].as_f64(), Some(d) if d != 0.0);
        Value::Text(
            if fetched { RowStatus::Done } else { RowStatus::Pending }
                .as_str()
                .to_string(),
        )
    });
    Ok(())
}
