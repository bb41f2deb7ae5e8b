//! Route reconciler
//!
//! Points a list of UDR routes at the firewall's new private IP. Rows are
//! processed sequentially in file order; a failing row is recorded and the
//! next row is still attempted.

use crate::error::RouteError;
use fwpause_cloud::FirewallApi;
use std::fmt;
use std::path::Path;

/// Header line recognised and skipped
pub const CSV_HEADER: [&str; 3] = ["resource_group", "route_table_name", "route_name"];

/// One route to update; the next hop is supplied at update time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteUpdateRequest {
    pub resource_group: String,
    pub route_table_name: String,
    pub route_name: String,
}

impl fmt::Display for RouteUpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.resource_group, self.route_table_name, self.route_name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvRow {
    Route(RouteUpdateRequest),
    /// Fewer than three non-empty fields
    Malformed { line: usize, content: String },
}

/// Parse the route list
///
/// Skips a UTF-8 BOM, blank lines and the exact header row. Fields are
/// trimmed; anything after the third column is ignored.
pub fn parse_routes_csv(content: &str) -> Vec<CsvRow> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut rows = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() >= 3 && fields[..3] == CSV_HEADER {
            continue;
        }

        match fields.as_slice() {
            [rg, table, route, ..] if !rg.is_empty() && !table.is_empty() && !route.is_empty() => {
                rows.push(CsvRow::Route(RouteUpdateRequest {
                    resource_group: rg.to_string(),
                    route_table_name: table.to_string(),
                    route_name: route.to_string(),
                }));
            }
            _ => rows.push(CsvRow::Malformed {
                line: index + 1,
                content: line.to_string(),
            }),
        }
    }

    rows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteStatus {
    Updated,
    DryRun,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    /// `None` for malformed rows
    pub route: Option<RouteUpdateRequest>,
    /// Route identity or the raw row text
    pub label: String,
    pub status: RouteStatus,
}

/// Per-row result of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub next_hop_ip: String,
    pub outcomes: Vec<RouteOutcome>,
}

impl ReconcileReport {
    pub fn updated(&self) -> usize {
        self.count(|s| matches!(s, RouteStatus::Updated))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, RouteStatus::Failed(_)))
    }

    pub fn planned(&self) -> usize {
        self.count(|s| matches!(s, RouteStatus::DryRun))
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, predicate: impl Fn(&RouteStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

/// Update every route listed in `csv_path` to `next_hop_ip`
///
/// Only an unreadable CSV is an error; per-row failures land in the report.
pub async fn reconcile(
    api: &dyn FirewallApi,
    csv_path: &Path,
    next_hop_ip: &str,
    dry_run: bool,
) -> Result<ReconcileReport, RouteError> {
    let content = tokio::fs::read_to_string(csv_path)
        .await
        .map_err(|source| RouteError::Io {
            path: csv_path.to_path_buf(),
            source,
        })?;
    let rows = parse_routes_csv(&content);
    tracing::info!(
        "Updating {} route(s) from {} to next hop {}",
        rows.len(),
        csv_path.display(),
        next_hop_ip
    );

    let mut outcomes = Vec::with_capacity(rows.len());
    for row in rows {
        let route = match row {
            CsvRow::Route(route) => route,
            CsvRow::Malformed { line, content } => {
                tracing::warn!(
                    "Skipping malformed row {} in {}: '{}'",
                    line,
                    csv_path.display(),
                    content
                );
                outcomes.push(RouteOutcome {
                    route: None,
                    label: content,
                    status: RouteStatus::Failed(format!(
                        "line {}: expected resource_group,route_table_name,route_name",
                        line
                    )),
                });
                continue;
            }
        };

        let label = route.to_string();
        let status = if dry_run {
            tracing::info!(
                "[DRY RUN] would set next hop of route {} to {}",
                label,
                next_hop_ip
            );
            RouteStatus::DryRun
        } else {
            match api
                .set_route_next_hop(
                    &route.resource_group,
                    &route.route_table_name,
                    &route.route_name,
                    next_hop_ip,
                )
                .await
            {
                Ok(()) => {
                    tracing::info!("Route {} now points to {}", label, next_hop_ip);
                    RouteStatus::Updated
                }
                Err(e) => {
                    tracing::warn!("Failed to update route {}: {}", label, e);
                    RouteStatus::Failed(e.to_string())
                }
            }
        };

        outcomes.push(RouteOutcome {
            route: Some(route),
            label,
            status,
        });
    }

    Ok(ReconcileReport {
        next_hop_ip: next_hop_ip.to_string(),
        outcomes,
    })
}
