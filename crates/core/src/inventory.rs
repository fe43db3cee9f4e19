//! Inventory classification: storage-view filtering, freshness buckets,
//! soonest-expiring-first ordering and grid grouping.
//!
//! Every pass is pure over the item list already loaded for the session;
//! `InventoryScreen` re-fetches the whole list on focus.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use storage::models::{Item, StorageLocation};
use storage::{ItemStore, StorageError};
use tracing::debug;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Window used by the home screen's "expiring soon" list.
pub const EXPIRING_SOON_DAYS: i64 = 7;

/// Urgency category derived from days until expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Freshness {
    Critical,
    Warning,
    Caution,
    Fair,
    Fresh,
    /// No expiration date recorded.
    Unknown,
}

impl Freshness {
    /// Buckets are `<= 2`, `<= 5`, `<= 10`, `<= 20`, then fresh; boundaries fall
    /// into the more urgent bucket.
    pub fn from_days(diff_days: i64) -> Self {
        if diff_days <= 2 {
            Freshness::Critical
        } else if diff_days <= 5 {
            Freshness::Warning
        } else if diff_days <= 10 {
            Freshness::Caution
        } else if diff_days <= 20 {
            Freshness::Fair
        } else {
            Freshness::Fresh
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Freshness::Critical => "#E57373",
            Freshness::Warning => "#FFB74D",
            Freshness::Caution => "#FFF176",
            Freshness::Fair => "#AED581",
            Freshness::Fresh => "#81C784",
            Freshness::Unknown => "#E0E0E0",
        }
    }
}

/// `ceil((expiration - now) / 1 day)`, with the expiration taken at midnight UTC.
pub fn days_until(expiration: NaiveDate, now: DateTime<Utc>) -> i64 {
    let expires_at = expiration.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let millis = (expires_at - now).num_milliseconds();
    let whole = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        whole
    } else {
        whole + 1
    }
}

pub fn freshness(expiration: Option<NaiveDate>, now: DateTime<Utc>) -> Freshness {
    match expiration {
        Some(date) => Freshness::from_days(days_until(date, now)),
        None => Freshness::Unknown,
    }
}

pub fn filter_by_location(items: &[Item], mode: StorageLocation) -> Vec<&Item> {
    items
        .iter()
        .filter(|i| i.storage_location == mode)
        .collect()
}

/// Stable ascending sort by expiration; undated items go last.
pub fn sort_by_expiration(items: &mut [&Item]) {
    items.sort_by_key(|i| (i.estimated_expiration.is_none(), i.estimated_expiration));
}

/// Dated items across every location expiring within `days` of `now`,
/// already-expired ones included, soonest first.
pub fn expiring_within(items: &[Item], now: DateTime<Utc>, days: i64) -> Vec<&Item> {
    let mut soon: Vec<&Item> = items
        .iter()
        .filter(|i| {
            i.estimated_expiration
                .is_some_and(|d| days_until(d, now) <= days)
        })
        .collect();
    sort_by_expiration(&mut soon);
    soon
}

pub fn group_rows<T: Clone>(items: &[T], columns: usize) -> Vec<Vec<T>> {
    items.chunks(columns.max(1)).map(|c| c.to_vec()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCard {
    pub id: i64,
    pub name: String,
    pub expiration: Option<NaiveDate>,
    pub days_left: Option<i64>,
    pub freshness: Freshness,
    pub color: &'static str,
}

impl ItemCard {
    fn from_item(item: &Item, now: DateTime<Utc>) -> Self {
        let days_left = item.estimated_expiration.map(|d| days_until(d, now));
        let freshness = days_left.map(Freshness::from_days).unwrap_or(Freshness::Unknown);
        Self {
            id: item.id,
            name: item.name.clone(),
            expiration: item.estimated_expiration,
            days_left,
            freshness,
            color: freshness.color(),
        }
    }

    pub fn expiration_label(&self) -> String {
        self.expiration
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryView {
    pub mode: StorageLocation,
    pub rows: Vec<Vec<ItemCard>>,
}

impl InventoryView {
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Filter, classify, sort and group in one pass.
pub fn build_view(
    items: &[Item],
    mode: StorageLocation,
    now: DateTime<Utc>,
    columns: usize,
) -> InventoryView {
    let mut selected = filter_by_location(items, mode);
    sort_by_expiration(&mut selected);
    let cards: Vec<ItemCard> = selected
        .into_iter()
        .map(|i| ItemCard::from_item(i, now))
        .collect();
    InventoryView {
        mode,
        rows: group_rows(&cards, columns),
    }
}

/// Session-local inventory state behind the inventory screen.
pub struct InventoryScreen {
    items: Vec<Item>,
    mode: StorageLocation,
    columns: usize,
}

impl InventoryScreen {
    pub fn new(mode: StorageLocation, columns: usize) -> Self {
        Self {
            items: Vec::new(),
            mode,
            columns,
        }
    }

    pub fn mode(&self) -> StorageLocation {
        self.mode
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Unconditional full re-fetch, run on every focus.
    pub async fn refresh(&mut self, store: &dyn ItemStore, user_uuid: &str) -> Result<(), StorageError> {
        self.items = store.get_items(user_uuid).await?;
        debug!(count = self.items.len(), "inventory refreshed");
        Ok(())
    }

    pub fn set_mode(&mut self, mode: StorageLocation) {
        self.mode = mode;
    }

    pub fn view(&self, now: DateTime<Utc>) -> InventoryView {
        build_view(&self.items, self.mode, now, self.columns)
    }

    pub fn expiring(&self, now: DateTime<Utc>, days: i64) -> Vec<ItemCard> {
        expiring_within(&self.items, now, days)
            .into_iter()
            .map(|i| ItemCard::from_item(i, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 10, 15, 30, 0).unwrap()
    }

    fn item(id: i64, loc: StorageLocation, exp: Option<(i32, u32, u32)>) -> Item {
        Item {
            id,
            name: format!("item-{id}"),
            date_bought: None,
            estimated_expiration: exp.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            price: 0.0,
            storage_location: loc,
            user_uuid: "u".into(),
        }
    }

    #[test]
    fn bucket_boundaries_are_inclusive_of_the_urgent_side() {
        assert_eq!(Freshness::from_days(-3), Freshness::Critical);
        assert_eq!(Freshness::from_days(2), Freshness::Critical);
        assert_eq!(Freshness::from_days(3), Freshness::Warning);
        assert_eq!(Freshness::from_days(5), Freshness::Warning);
        assert_eq!(Freshness::from_days(6), Freshness::Caution);
        assert_eq!(Freshness::from_days(10), Freshness::Caution);
        assert_eq!(Freshness::from_days(11), Freshness::Fair);
        assert_eq!(Freshness::from_days(20), Freshness::Fair);
        assert_eq!(Freshness::from_days(21), Freshness::Fresh);
    }

    #[test]
    fn buckets_are_monotonic() {
        let mut previous = Freshness::from_days(-100);
        for d in -100..100 {
            let current = Freshness::from_days(d);
            assert!(current >= previous, "bucket went backwards at {d}");
            assert_ne!(current, Freshness::Unknown);
            previous = current;
        }
    }

    #[test]
    fn days_until_rounds_up_partial_days() {
        // Midnight of the 12th is 1 day 8.5 hours away.
        let d = NaiveDate::from_ymd_opt(2025, 10, 12).unwrap();
        assert_eq!(days_until(d, now()), 2);
        // Midnight of today is already past: -0.6 rounds up to 0.
        let d = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap();
        assert_eq!(days_until(d, now()), 0);
        let exact = Utc.with_ymd_and_hms(2025, 10, 10, 0, 0, 0).unwrap();
        let d = NaiveDate::from_ymd_opt(2025, 10, 15).unwrap();
        assert_eq!(days_until(d, exact), 5);
        assert_eq!(freshness(None, now()), Freshness::Unknown);
    }

    #[test]
    fn filter_round_trip_leaves_items_untouched() {
        let items = vec![
            item(1, StorageLocation::Shelf, None),
            item(2, StorageLocation::Freeze, None),
            item(3, StorageLocation::Shelf, Some((2025, 11, 1))),
        ];
        let shelf: Vec<i64> = filter_by_location(&items, StorageLocation::Shelf)
            .iter()
            .map(|i| i.id)
            .collect();
        let _ = filter_by_location(&items, StorageLocation::Freeze);
        let again: Vec<i64> = filter_by_location(&items, StorageLocation::Shelf)
            .iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(shelf, vec![1, 3]);
        assert_eq!(shelf, again);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn undated_items_sort_last_and_ties_keep_input_order() {
        let items = vec![
            item(1, StorageLocation::Shelf, None),
            item(2, StorageLocation::Shelf, Some((2025, 10, 20))),
            item(3, StorageLocation::Shelf, None),
            item(4, StorageLocation::Shelf, Some((2025, 10, 12))),
            item(5, StorageLocation::Shelf, Some((2025, 10, 20))),
        ];
        let mut refs: Vec<&Item> = items.iter().collect();
        sort_by_expiration(&mut refs);
        let ids: Vec<i64> = refs.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![4, 2, 5, 1, 3]);
    }

    #[test]
    fn view_groups_into_rows_of_configured_width() {
        let items: Vec<Item> = (1..=7)
            .map(|i| item(i, StorageLocation::Refrigerate, Some((2025, 10, 10 + i as u32))))
            .chain(std::iter::once(item(99, StorageLocation::Shelf, None)))
            .collect();
        let view = build_view(&items, StorageLocation::Refrigerate, now(), 3);
        let widths: Vec<usize> = view.rows.iter().map(Vec::len).collect();
        assert_eq!(widths, vec![3, 3, 1]);
        assert_eq!(view.len(), 7);
        assert_eq!(view.rows[0][0].id, 1);
        assert_eq!(view.rows[0][0].freshness, Freshness::Critical);
        assert_eq!(view.rows[2][0].freshness, Freshness::Caution);
    }

    #[test]
    fn expiring_within_a_week_spans_locations() {
        let items = vec![
            item(1, StorageLocation::Shelf, Some((2025, 10, 17))),
            item(2, StorageLocation::Freeze, Some((2025, 10, 18))),
            item(3, StorageLocation::Refrigerate, Some((2025, 10, 8))),
            item(4, StorageLocation::Refrigerate, None),
            item(5, StorageLocation::Shelf, Some((2025, 10, 12))),
        ];
        // Midnight of the 17th is 6 days 8.5 hours out, so it rounds up to 7.
        let ids: Vec<i64> = expiring_within(&items, now(), EXPIRING_SOON_DAYS)
            .iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![3, 5, 1]);
        assert!(expiring_within(&items, now(), -10).is_empty());
    }

    #[test]
    fn undated_card_shows_placeholder() {
        let items = vec![item(1, StorageLocation::Freeze, None)];
        let view = build_view(&items, StorageLocation::Freeze, now(), 3);
        let card = &view.rows[0][0];
        assert_eq!(card.expiration_label(), "N/A");
        assert_eq!(card.color, Freshness::Unknown.color());
    }
}
