//! Reconciliation
//!
//! Walks the aligned pairs, asks each engine for the row count of its side and
//! produces one [`ReconciliationRecord`] per pair, in alignment order.
//!
//! Count queries run concurrently, bounded by one semaphore per engine. A
//! failed or timed-out query only affects its own record.

use crate::align::AlignedPair;
use crate::config::ReconcileConfig;
use crate::error::QueryError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Row-count capability for one engine.
///
/// Implementations quote `table` for their own dialect and must surface query
/// failures instead of reporting zero rows.
#[async_trait]
pub trait RowCounter: Send + Sync {
    async fn count_rows(&self, table: &str) -> Result<u64, QueryError>;
}

/// Outcome of counting one side of a pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum RowCount {
    Counted(u64),
    /// No table on this side; contributes 0 to the delta
    Absent,
    /// The count query failed; carries the error message
    Failed(String),
}

impl RowCount {
    /// Value used in the delta arithmetic, `None` if the count is unknown
    pub fn as_operand(&self) -> Option<u64> {
        match self {
            RowCount::Counted(n) => Some(*n),
            RowCount::Absent => Some(0),
            RowCount::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RowCount::Failed(_))
    }
}

impl fmt::Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowCount::Counted(n) => write!(f, "{}", n),
            RowCount::Absent => f.write_str("0"),
            RowCount::Failed(_) => f.write_str("ERROR"),
        }
    }
}

/// One reconciled pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationRecord {
    /// 1-based position in the alignment
    pub sequence_number: usize,
    pub left_table: Option<String>,
    pub left_count: RowCount,
    pub right_table: Option<String>,
    pub right_count: RowCount,
    /// `|left - right|`, `None` when either count failed
    pub delta: Option<u64>,
}

impl ReconciliationRecord {
    pub fn new(sequence_number: usize, pair: &AlignedPair, left_count: RowCount, right_count: RowCount) -> Self {
        let delta = match (left_count.as_operand(), right_count.as_operand()) {
            (Some(l), Some(r)) => Some(l.abs_diff(r)),
            _ => None,
        };

        Self {
            sequence_number,
            left_table: pair.left().map(str::to_owned),
            left_count,
            right_table: pair.right().map(str::to_owned),
            right_count,
            delta,
        }
    }

    pub fn has_error(&self) -> bool {
        self.left_count.is_failed() || self.right_count.is_failed()
    }

    /// Present on both sides with equal counts
    pub fn is_consistent(&self) -> bool {
        self.left_table.is_some() && self.right_table.is_some() && self.delta == Some(0)
    }
}

/// Count both sides of every pair and build the records.
///
/// The result has the same length and order as `pairs`, whatever order the
/// queries complete in.
pub async fn reconcile<L, R>(
    pairs: &[AlignedPair],
    left: Arc<L>,
    right: Arc<R>,
    config: &ReconcileConfig,
) -> Vec<ReconciliationRecord>
where
    L: RowCounter + ?Sized + 'static,
    R: RowCounter + ?Sized + 'static,
{
    let permits = config.max_concurrency.max(1);
    let left_permits = Arc::new(Semaphore::new(permits));
    let right_permits = Arc::new(Semaphore::new(permits));
    let timeout = config.query_timeout;

    let mut tasks = JoinSet::new();
    for (index, pair) in pairs.iter().enumerate() {
        let left_table = pair.left().map(str::to_owned);
        let right_table = pair.right().map(str::to_owned);
        let left = Arc::clone(&left);
        let right = Arc::clone(&right);
        let left_permits = Arc::clone(&left_permits);
        let right_permits = Arc::clone(&right_permits);

        tasks.spawn(async move {
            let (left_count, right_count) = tokio::join!(
                count_side(&*left, left_table.as_deref(), &left_permits, timeout),
                count_side(&*right, right_table.as_deref(), &right_permits, timeout),
            );
            (index, left_count, right_count)
        });
    }

    let mut slots: Vec<Option<(RowCount, RowCount)>> = vec![None; pairs.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, left_count, right_count)) => slots[index] = Some((left_count, right_count)),
            Err(e) => warn!(error = %e, "Row-count task did not complete"),
        }
    }

    pairs
        .iter()
        .zip(slots)
        .enumerate()
        .map(|(index, (pair, slot))| {
            let (left_count, right_count) = slot.unwrap_or_else(|| {
                warn!(table = pair.name(), "No row counts recorded for pair");
                let lost = |present: Option<&str>| match present {
                    Some(_) => RowCount::Failed("count task aborted".to_string()),
                    None => RowCount::Absent,
                };
                (lost(pair.left()), lost(pair.right()))
            });
            ReconciliationRecord::new(index + 1, pair, left_count, right_count)
        })
        .collect()
}

async fn count_side<C>(counter: &C, table: Option<&str>, permits: &Semaphore, timeout: Duration) -> RowCount
where
    C: RowCounter + ?Sized,
{
    let Some(table) = table else {
        return RowCount::Absent;
    };

    let _permit = match permits.acquire().await {
        Ok(permit) => permit,
        Err(_) => return RowCount::Failed("row-count queue closed".to_string()),
    };

    match tokio::time::timeout(timeout, counter.count_rows(table)).await {
        Ok(Ok(count)) => {
            debug!(table, count, "Counted rows");
            RowCount::Counted(count)
        }
        Ok(Err(e)) => {
            warn!(table, error = %e, "Row count failed");
            RowCount::Failed(e.to_string())
        }
        Err(_) => {
            let e = QueryError::Timeout(timeout);
            warn!(table, error = %e, "Row count timed out");
            RowCount::Failed(e.to_string())
        }
    }
}
