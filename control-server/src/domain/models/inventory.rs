use chrono::{DateTime, Utc};
use farm_agent_bridge::InventoryItem;
use serde::Serialize;

/// Inclusive item id range eligible for liquidation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemIdRange {
    pub min: i64,
    pub max: i64,
}

impl ItemIdRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, id: i64) -> bool {
        (self.min..=self.max).contains(&id)
    }
}

/// Inventory entry selected for liquidation in the current cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibleItem {
    pub id: i64,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
}

impl From<&EligibleItem> for InventoryItem {
    fn from(item: &EligibleItem) -> Self {
        InventoryItem {
            id: item.id,
            count: item.count,
            uid: item.uid,
        }
    }
}

/// Accumulated liquidation counters for the lifetime of the process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SellStats {
    pub total_proceeds: i64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_eligible_count: usize,
    pub cycles_completed: u64,
}

impl SellStats {
    /// Fold a completed cycle into the counters
    pub fn record(&mut self, report: &SellReport) {
        self.total_proceeds = self.total_proceeds.saturating_add(report.proceeds);
        self.last_run_at = Some(report.finished_at);
        self.last_eligible_count = report.items.len();
        self.cycles_completed += 1;
    }
}

/// Result of one successful cycle that sold at least one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellReport {
    pub items: Vec<EligibleItem>,
    pub batches: usize,
    pub proceeds: i64,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CycleOutcome {
    /// Another cycle was already running
    Skipped,
    /// Nothing eligible in the inventory
    Idle,
    Sold(SellReport),
}

/// `warehouse` snapshot section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarehouseView {
    #[serde(flatten)]
    pub stats: SellStats,
    pub sell_interval_ms: u64,
    pub is_selling: bool,
}
