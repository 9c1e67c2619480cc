//! Periodic liquidation of eligible inventory through the game peer

use chrono::Utc;
use farm_agent_bridge::{
    msgpack, BagReply, BagRequest, InventoryItem, SellReply, SellRequest, ITEM_SERVICE,
    METHOD_BAG, METHOD_SELL,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapters::infrastructure::{Scheduler, TaskHandle};
use crate::config::LiquidationConfig;
use crate::domain::errors::LiquidationError;
use crate::domain::models::{
    CycleOutcome, EligibleItem, ItemIdRange, SellReport, SellStats, WarehouseView,
};
use crate::domain::services::{partition, select_eligible};
use crate::ports::{RemoteCall, StateProvider};

pub const WAREHOUSE_SECTION: &str = "warehouse";

#[derive(Debug, Clone)]
pub struct LiquidatorSettings {
    pub range: ItemIdRange,
    pub batch_size: usize,
    pub batch_pacing: Duration,
    pub warmup: Duration,
    pub interval: Duration,
}

impl From<&LiquidationConfig> for LiquidatorSettings {
    fn from(config: &LiquidationConfig) -> Self {
        Self {
            range: ItemIdRange::new(config.id_min, config.id_max),
            batch_size: config.effective_batch_size(),
            batch_pacing: config.batch_pacing(),
            warmup: config.warmup(),
            interval: config.interval(),
        }
    }
}

impl Default for LiquidatorSettings {
    fn default() -> Self {
        Self::from(&LiquidationConfig::default())
    }
}

/// Holds the in-progress flag for the duration of one cycle
struct CycleGuard<'a>(&'a AtomicBool);

impl<'a> CycleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Liquidator {
    remote: Arc<dyn RemoteCall>,
    settings: LiquidatorSettings,
    stats: Mutex<SellStats>,
    in_progress: AtomicBool,
    schedule: Mutex<Option<TaskHandle>>,
}

impl Liquidator {
    pub fn new(remote: Arc<dyn RemoteCall>, settings: LiquidatorSettings) -> Self {
        Self {
            remote,
            settings,
            stats: Mutex::new(SellStats::default()),
            in_progress: AtomicBool::new(false),
            schedule: Mutex::new(None),
        }
    }

    /// Sell every eligible inventory entry in bounded, paced batches.
    ///
    /// Returns `Skipped` without touching the peer while another cycle is
    /// running. Any failure aborts the remaining batches and leaves the
    /// statistics as they were.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, LiquidationError> {
        let Some(_guard) = CycleGuard::acquire(&self.in_progress) else {
            tracing::debug!("Sell cycle already in progress, skipping");
            return Ok(CycleOutcome::Skipped);
        };

        let inventory = self.fetch_inventory().await?;
        let eligible = select_eligible(&inventory, self.settings.range);
        if eligible.is_empty() {
            tracing::debug!(inventory = inventory.len(), "No eligible items to sell");
            return Ok(CycleOutcome::Idle);
        }

        let batches = partition(&eligible, self.settings.batch_size);
        let batch_count = batches.len();
        tracing::debug!(
            eligible = eligible.len(),
            batches = batch_count,
            batch_size = self.settings.batch_size,
            "Selling eligible items"
        );

        let mut proceeds: i64 = 0;
        for (index, batch) in batches.into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.batch_pacing).await;
            }
            let gold = self.sell_batch(batch).await?;
            tracing::debug!(
                batch = index + 1,
                of = batch_count,
                entries = batch.len(),
                gold,
                "Batch sold"
            );
            proceeds = proceeds.saturating_add(gold);
        }

        let report = SellReport {
            items: eligible,
            batches: batch_count,
            proceeds,
            finished_at: Utc::now(),
        };

        tracing::info!(
            entries = report.items.len(),
            batches = report.batches,
            proceeds = report.proceeds,
            items = %describe(&report.items),
            "Sold eligible inventory"
        );

        self.lock_stats().record(&report);
        Ok(CycleOutcome::Sold(report))
    }

    async fn fetch_inventory(&self) -> Result<Vec<InventoryItem>, LiquidationError> {
        let request = msgpack::encode(&BagRequest::default())?;
        let reply = self.remote.query(ITEM_SERVICE, METHOD_BAG, request).await?;
        let bag: BagReply = msgpack::decode(&reply)?;
        Ok(bag.into_items())
    }

    async fn sell_batch(&self, batch: &[EligibleItem]) -> Result<i64, LiquidationError> {
        let request = msgpack::encode(&SellRequest {
            items: batch.iter().map(InventoryItem::from).collect(),
        })?;
        let reply = self.remote.query(ITEM_SERVICE, METHOD_SELL, request).await?;
        let sold: SellReply = msgpack::decode(&reply)?;
        Ok(sold.gold)
    }

    /// Run one cycle from the timer; failures are logged, never propagated
    pub async fn run_scheduled(&self) {
        match self.run_cycle().await {
            Ok(CycleOutcome::Skipped) => {
                tracing::debug!("Scheduled sell cycle skipped, previous cycle still running")
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Sell cycle failed: {}", e),
        }
    }

    /// Start the sell loop: first cycle after the warmup, then every interval.
    /// Returns `false` when the loop is already running or the scheduler is stopped.
    pub fn schedule(self: &Arc<Self>, scheduler: &Scheduler) -> bool {
        let mut schedule = self
            .schedule
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if schedule.as_ref().is_some_and(|task| !task.is_finished()) {
            return false;
        }

        let liquidator = Arc::downgrade(self);
        let handle = scheduler.every(
            "sell",
            self.settings.warmup,
            self.settings.interval,
            move || {
                let liquidator = liquidator.clone();
                async move {
                    if let Some(liquidator) = liquidator.upgrade() {
                        liquidator.run_scheduled().await;
                    }
                }
            },
        );

        let scheduled = handle.is_some();
        if scheduled {
            tracing::info!(
                warmup_secs = self.settings.warmup.as_secs(),
                interval_secs = self.settings.interval.as_secs(),
                "Sell loop scheduled"
            );
        }
        *schedule = handle;
        scheduled
    }

    pub fn is_selling(&self) -> bool {
        self.schedule
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn is_cycle_running(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> SellStats {
        self.lock_stats().clone()
    }

    pub fn view(&self) -> WarehouseView {
        WarehouseView {
            stats: self.stats(),
            sell_interval_ms: self.settings.interval.as_millis() as u64,
            is_selling: self.is_selling(),
        }
    }

    fn lock_stats(&self) -> std::sync::MutexGuard<'_, SellStats> {
        self.stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateProvider for Liquidator {
    fn section(&self) -> &str {
        WAREHOUSE_SECTION
    }

    fn current_state(&self) -> anyhow::Result<Value> {
        Ok(serde_json::to_value(self.view())?)
    }
}

fn describe(items: &[EligibleItem]) -> String {
    items
        .iter()
        .map(|item| format!("{}x{}", item.id, item.count))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::RemoteCallError;
    use crate::ports::MockRemoteCall;
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio::time::Instant;

    fn bag_bytes(items: Vec<InventoryItem>) -> Vec<u8> {
        msgpack::encode(&BagReply {
            item_bag: Some(farm_agent_bridge::ItemBag { items }),
            items: vec![],
        })
        .unwrap()
    }

    fn fruits(n: usize) -> Vec<InventoryItem> {
        (0..n).map(|i| InventoryItem::new(40_001 + i as i64, 2)).collect()
    }

    /// Peer that answers Bag with a fixed inventory and Sell with 10 gold per entry
    #[derive(Default)]
    struct FakePeer {
        inventory: Vec<InventoryItem>,
        fail_sell_call: Option<usize>,
        bag_gate: Option<Arc<Notify>>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl FakePeer {
        fn with_inventory(inventory: Vec<InventoryItem>) -> Self {
            Self {
                inventory,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(String, usize)> {
            self.calls.lock().unwrap().clone()
        }

        fn sell_calls(&self) -> Vec<usize> {
            self.calls()
                .into_iter()
                .filter(|(method, _)| method == METHOD_SELL)
                .map(|(_, entries)| entries)
                .collect()
        }
    }

    #[async_trait]
    impl RemoteCall for FakePeer {
        async fn query(
            &self,
            service: &str,
            method: &str,
            request: Vec<u8>,
        ) -> Result<Vec<u8>, RemoteCallError> {
            assert_eq!(service, ITEM_SERVICE);

            if method == METHOD_BAG {
                self.calls.lock().unwrap().push((method.to_string(), 0));
                if let Some(gate) = &self.bag_gate {
                    gate.notified().await;
                }
                return Ok(bag_bytes(self.inventory.clone()));
            }

            let sell: SellRequest = msgpack::decode(&request).unwrap();
            let call_index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((method.to_string(), sell.items.len()));
                calls.iter().filter(|(m, _)| m == METHOD_SELL).count()
            };
            if self.fail_sell_call == Some(call_index) {
                return Err(RemoteCallError::Status {
                    call: format!("{}.{}", service, method),
                    status: 500,
                });
            }
            Ok(msgpack::encode(&SellReply {
                gold: 10 * sell.items.len() as i64,
            })
            .unwrap())
        }

        async fn disconnect(&self) {}
    }

    fn liquidator(peer: Arc<FakePeer>) -> Arc<Liquidator> {
        Arc::new(Liquidator::new(peer, LiquidatorSettings::default()))
    }

    #[tokio::test]
    async fn test_single_eligible_item_is_sold_in_one_call() {
        let mut remote = MockRemoteCall::new();
        remote
            .expect_query()
            .withf(|service, method, _| service == ITEM_SERVICE && method == METHOD_BAG)
            .times(1)
            .returning(|_, _, _| {
                Ok(bag_bytes(vec![
                    InventoryItem::new(4001, 3),
                    InventoryItem::new(900, 5),
                ]))
            });
        remote
            .expect_query()
            .withf(|_, method, request| {
                method == METHOD_SELL
                    && msgpack::decode::<SellRequest>(request)
                        .map(|sell| sell.items == vec![InventoryItem::new(4001, 3)])
                        .unwrap_or(false)
            })
            .times(1)
            .returning(|_, _, _| Ok(msgpack::encode(&SellReply { gold: 90 }).unwrap()));

        let liquidator = Liquidator::new(Arc::new(remote), LiquidatorSettings::default());
        let outcome = liquidator.run_cycle().await.unwrap();

        let CycleOutcome::Sold(report) = outcome else {
            panic!("expected a sale, got {:?}", outcome);
        };
        assert_eq!(report.batches, 1);
        assert_eq!(report.proceeds, 90);

        let stats = liquidator.stats();
        assert_eq!(stats.total_proceeds, 90);
        assert_eq!(stats.last_eligible_count, 1);
        assert!(stats.last_run_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_are_bounded_and_paced() {
        let peer = Arc::new(FakePeer::with_inventory(fruits(31)));
        let liquidator = liquidator(peer.clone());

        let started = Instant::now();
        let outcome = liquidator.run_cycle().await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(peer.sell_calls(), vec![15, 15, 1]);
        assert!(elapsed >= Duration::from_millis(600), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(900), "elapsed {:?}", elapsed);
        assert!(matches!(outcome, CycleOutcome::Sold(ref report) if report.proceeds == 310));
        assert_eq!(liquidator.stats().cycles_completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_proceeds_saturate() {
        let mut remote = MockRemoteCall::new();
        remote
            .expect_query()
            .withf(|_, method, _| method == METHOD_BAG)
            .times(1)
            .returning(|_, _, _| Ok(bag_bytes(fruits(16))));
        remote
            .expect_query()
            .withf(|_, method, _| method == METHOD_SELL)
            .times(2)
            .returning(|_, _, _| Ok(msgpack::encode(&SellReply { gold: i64::MAX }).unwrap()));

        let liquidator = Liquidator::new(Arc::new(remote), LiquidatorSettings::default());
        let outcome = liquidator.run_cycle().await.unwrap();

        assert!(matches!(outcome, CycleOutcome::Sold(ref report) if report.proceeds == i64::MAX));
        assert_eq!(liquidator.stats().total_proceeds, i64::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_batch_has_no_pacing_delay() {
        let peer = Arc::new(FakePeer::with_inventory(fruits(15)));
        let liquidator = liquidator(peer.clone());

        let started = Instant::now();
        liquidator.run_cycle().await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(peer.sell_calls(), vec![15]);
    }

    #[tokio::test]
    async fn test_nothing_eligible_is_idle() {
        let peer = Arc::new(FakePeer::with_inventory(vec![
            InventoryItem::new(900, 5),
            InventoryItem::new(4001, 0),
        ]));
        let liquidator = liquidator(peer.clone());

        let outcome = liquidator.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Idle);
        assert!(peer.sell_calls().is_empty());
        assert_eq!(liquidator.stats(), SellStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_batch_aborts_cycle_and_keeps_stats() {
        let peer = Arc::new(FakePeer {
            fail_sell_call: Some(2),
            ..FakePeer::with_inventory(fruits(40))
        });
        let liquidator = liquidator(peer.clone());

        let result = liquidator.run_cycle().await;

        assert!(matches!(
            result,
            Err(LiquidationError::Remote(RemoteCallError::Status { status: 500, .. }))
        ));
        assert_eq!(peer.sell_calls(), vec![15, 15]);
        assert_eq!(liquidator.stats(), SellStats::default());
        assert!(!liquidator.is_cycle_running());
    }

    #[tokio::test]
    async fn test_undecodable_inventory_is_codec_error() {
        let mut remote = MockRemoteCall::new();
        remote
            .expect_query()
            .returning(|_, _, _| Ok(vec![0xc1]));

        let liquidator = Liquidator::new(Arc::new(remote), LiquidatorSettings::default());

        assert!(matches!(
            liquidator.run_cycle().await,
            Err(LiquidationError::Codec(_))
        ));
        assert!(!liquidator.is_cycle_running());
    }

    #[tokio::test]
    async fn test_concurrent_cycle_is_skipped() {
        let gate = Arc::new(Notify::new());
        let peer = Arc::new(FakePeer {
            bag_gate: Some(gate.clone()),
            ..FakePeer::with_inventory(fruits(1))
        });
        let liquidator = liquidator(peer.clone());

        let running = tokio::spawn({
            let liquidator = liquidator.clone();
            async move { liquidator.run_cycle().await }
        });
        while !liquidator.is_cycle_running() {
            tokio::task::yield_now().await;
        }

        let second = liquidator.run_cycle().await.unwrap();
        assert_eq!(second, CycleOutcome::Skipped);
        assert_eq!(peer.calls().len(), 1);

        gate.notify_one();
        let first = running.await.unwrap().unwrap();
        assert!(matches!(first, CycleOutcome::Sold(_)));
        assert!(!liquidator.is_cycle_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_runs_after_warmup_then_every_interval() {
        let peer = Arc::new(FakePeer::with_inventory(vec![]));
        let liquidator = liquidator(peer.clone());
        let scheduler = Scheduler::new();

        assert!(liquidator.schedule(&scheduler));
        assert!(!liquidator.schedule(&scheduler));
        assert!(liquidator.is_selling());

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(peer.calls().len(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(peer.calls().len(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(peer.calls().len(), 2);

        scheduler.cancel_all();
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert!(!liquidator.is_selling());
    }

    #[test]
    fn test_warehouse_section() {
        let liquidator = Liquidator::new(
            Arc::new(FakePeer::default()),
            LiquidatorSettings::default(),
        );

        let state = liquidator.current_state().unwrap();

        assert_eq!(liquidator.section(), "warehouse");
        assert_eq!(state["sell_interval_ms"], 60_000);
        assert_eq!(state["is_selling"], false);
        assert_eq!(state["total_proceeds"], 0);
    }
}
