//! Inventory filtering and batching for the sell loop

use farm_agent_bridge::InventoryItem;

use crate::domain::models::{EligibleItem, ItemIdRange};

/// Keep entries whose id lies in `range` and whose count is positive.
/// Inventory order is preserved.
pub fn select_eligible(items: &[InventoryItem], range: ItemIdRange) -> Vec<EligibleItem> {
    items
        .iter()
        .filter(|item| range.contains(item.id) && item.count > 0)
        .map(|item| EligibleItem {
            id: item.id,
            count: item.count,
            uid: item.uid,
        })
        .collect()
}

/// Split into consecutive batches of at most `batch_size` entries
pub fn partition(items: &[EligibleItem], batch_size: usize) -> Vec<&[EligibleItem]> {
    items.chunks(batch_size.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> ItemIdRange {
        ItemIdRange::new(3001, 49999)
    }

    fn eligible(n: usize) -> Vec<EligibleItem> {
        (0..n)
            .map(|i| EligibleItem {
                id: 40_000 + i as i64,
                count: 1,
                uid: None,
            })
            .collect()
    }

    #[test]
    fn test_out_of_range_entry_is_dropped() {
        let items = vec![InventoryItem::new(4001, 3), InventoryItem::new(900, 5)];

        let selected = select_eligible(&items, range());

        assert_eq!(
            selected,
            vec![EligibleItem {
                id: 4001,
                count: 3,
                uid: None
            }]
        );
    }

    #[test]
    fn test_zero_and_negative_counts_are_dropped() {
        let items = vec![
            InventoryItem::new(4001, 0),
            InventoryItem::new(4002, -1),
            InventoryItem::new(4003, 1),
        ];

        let selected = select_eligible(&items, range());

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, 4003);
    }

    #[test]
    fn test_partition_counts() {
        for (k, b) in [(0, 15), (1, 15), (15, 15), (16, 15), (31, 15), (7, 3), (5, 1)] {
            let items = eligible(k);
            let batches = partition(&items, b);

            assert_eq!(batches.len(), k.div_ceil(b), "k={} b={}", k, b);
            assert!(batches.iter().all(|batch| !batch.is_empty() && batch.len() <= b));
            assert_eq!(batches.iter().map(|batch| batch.len()).sum::<usize>(), k);
        }
    }

    #[test]
    fn test_partition_keeps_order() {
        let items = eligible(4);
        let batches = partition(&items, 3);

        assert_eq!(batches[0][0].id, 40_000);
        assert_eq!(batches[0][2].id, 40_002);
        assert_eq!(batches[1][0].id, 40_003);
    }

    #[test]
    fn test_partition_zero_batch_size_is_clamped() {
        let items = eligible(2);
        assert_eq!(partition(&items, 0).len(), 2);
    }
}
