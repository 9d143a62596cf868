use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Counter: committed mutations. Labels: op.
pub const COMMITS_TOTAL: &str = "suiteplan_commits_total";

/// Counter: conflicting candidates surfaced to callers.
pub const CONFLICTS_TOTAL: &str = "suiteplan_conflicts_total";

/// Counter: multi-reservation batches rejected because one member conflicted.
pub const BATCH_BLOCKED_TOTAL: &str = "suiteplan_batch_blocked_total";

/// Counter: undo calls that restored a snapshot.
pub const UNDO_TOTAL: &str = "suiteplan_undo_total";

/// Histogram: reservations produced per chunked request.
pub const CHUNKS_PER_REQUEST: &str = "suiteplan_chunks_per_request";

/// Gauge: reservations in the store after the last commit or undo.
pub const RESERVATIONS_ACTIVE: &str = "suiteplan_reservations_active";

/// Install a Prometheus exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Committing operation, used as the `op` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create,
    Edit,
    Force,
    BookAvailable,
    Delete,
    Move,
}

impl Op {
    pub fn label(self) -> &'static str {
        match self {
            Op::Create => "create",
            Op::Edit => "edit",
            Op::Force => "force",
            Op::BookAvailable => "book_available",
            Op::Delete => "delete",
            Op::Move => "move",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_port_installs_nothing() {
        assert!(init(None).is_ok());
    }

    #[test]
    fn labels_are_snake_case() {
        for op in [Op::Create, Op::Edit, Op::Force, Op::BookAvailable, Op::Delete, Op::Move] {
            let label = op.label();
            assert!(label.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{label}");
        }
    }
}
