//! Order statistics aggregation
//!
//! Time-bucketed and status-bucketed rollups of order records for the
//! back-office dashboard. The aggregator is a pure function of its
//! inputs: the caller passes the fetched order list and the sampled
//! "now", and every call is a full recompute — there is no incremental
//! state to invalidate when the list changes.
//!
//! Two rollups ship to the dashboard, built over one shared boundary
//! core:
//! - [`StatsAggregator::overview`]: five independent windows with
//!   net-of-delivery earnings, for the landing cards.
//! - [`StatsAggregator::detailed`]: four strictly nested windows with
//!   raw totals plus a current-year status breakdown, for the
//!   delivery/marketing analytics pages.

mod periods;

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::order::{Order, OrderStatus};
use periods::PeriodBounds;
pub use periods::WeekStart;

/// Reference zone the storefront operates in. Boundaries are always
/// computed here, never in the host's local zone.
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::Africa::Tunis;

/// Flat delivery fee subtracted from an order's total when computing net
/// earnings, unless the checkout carries free delivery.
pub const DEFAULT_DELIVERY_PRICE: f64 = 8.0;

#[derive(Clone, Debug)]
pub struct StatsConfig {
    pub time_zone: Tz,
    pub delivery_price: f64,
    /// Week convention for the overview rollup.
    pub overview_week_start: WeekStart,
    /// Week convention for the detailed rollup.
    pub detailed_week_start: WeekStart,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE,
            delivery_price: DEFAULT_DELIVERY_PRICE,
            overview_week_start: WeekStart::Monday,
            detailed_week_start: WeekStart::Sunday,
        }
    }
}

// =============================================================================
// Output types
// =============================================================================

/// Overview slots, in the order the dashboard renders them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
    ThisYear,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Today,
        Period::Yesterday,
        Period::ThisWeek,
        Period::ThisMonth,
        Period::ThisYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Period::Today => "Today",
            Period::Yesterday => "Yesterday",
            Period::ThisWeek => "This week",
            Period::ThisMonth => "This month",
            Period::ThisYear => "This year",
        }
    }
}

/// Overview rollup: parallel per-period arrays, indexed by [`Period`].
///
/// Today and yesterday are mutually exclusive day buckets; the week,
/// month, and year windows run from their period start and overlap each
/// other and today.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewStats {
    pub orders: [u64; 5],
    pub earnings: [f64; 5],
}

impl OverviewStats {
    pub fn orders_in(&self, period: Period) -> u64 {
        self.orders[period as usize]
    }

    pub fn earnings_in(&self, period: Period) -> f64 {
        self.earnings[period as usize]
    }
}

/// One aggregation window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodBucket {
    pub count: u64,
    pub total: f64,
}

impl PeriodBucket {
    fn add(&mut self, amount: f64) {
        self.count += 1;
        self.total += amount;
    }
}

/// Detailed rollup: strictly nested windows over raw totals, plus the
/// status tally for the current year.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStats {
    pub today: PeriodBucket,
    pub this_week: PeriodBucket,
    pub this_month: PeriodBucket,
    pub this_year: PeriodBucket,
    pub by_status: BTreeMap<OrderStatus, u64>,
}

/// Per-calendar-month point feeding the current-year chart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub month: u32,
    pub count: u64,
    pub total: f64,
}

// =============================================================================
// Aggregator
// =============================================================================

pub struct StatsAggregator {
    config: StatsConfig,
}

impl StatsAggregator {
    pub fn new(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// Five-bucket rollup with net-of-delivery earnings.
    pub fn overview(&self, orders: &[Order], now: DateTime<Utc>) -> OverviewStats {
        let bounds =
            PeriodBounds::compute(self.now_local(now), self.config.overview_week_start);
        let mut stats = OverviewStats::default();
        for order in orders {
            if order.status.is_excluded() {
                continue;
            }
            let Some(created) = self.created_local(order) else {
                continue;
            };
            let earned = if order.checkout.free_delivery {
                order.checkout.total
            } else {
                order.checkout.total - self.config.delivery_price
            };
            let mut hit = |period: Period| {
                stats.orders[period as usize] += 1;
                stats.earnings[period as usize] += earned;
            };
            if created >= bounds.day_start {
                hit(Period::Today);
            } else if created >= bounds.yesterday_start {
                hit(Period::Yesterday);
            }
            if created >= bounds.week_start {
                hit(Period::ThisWeek);
            }
            if created >= bounds.month_start {
                hit(Period::ThisMonth);
            }
            if created >= bounds.year_start {
                hit(Period::ThisYear);
            }
        }
        tracing::debug!(orders = orders.len(), "computed overview rollup");
        stats
    }

    /// Nested four-bucket rollup over raw totals, plus the current-year
    /// status tally.
    pub fn detailed(&self, orders: &[Order], now: DateTime<Utc>) -> DetailedStats {
        let bounds =
            PeriodBounds::compute(self.now_local(now), self.config.detailed_week_start);
        let mut stats = DetailedStats::default();
        for order in orders {
            // Exclusion runs before the status tally too: cancelled,
            // refunded, and returned orders never appear in the
            // breakdown.
            if order.status.is_excluded() {
                continue;
            }
            let Some(created) = self.created_local(order) else {
                continue;
            };
            if created < bounds.year_start {
                continue;
            }
            *stats.by_status.entry(order.status.clone()).or_insert(0) += 1;
            let total = order.checkout.total;
            stats.this_year.add(total);
            if created >= bounds.month_start {
                stats.this_month.add(total);
                if created >= bounds.week_start {
                    stats.this_week.add(total);
                    if created >= bounds.day_start {
                        stats.today.add(total);
                    }
                }
            }
        }
        tracing::debug!(orders = orders.len(), "computed detailed rollup");
        stats
    }

    /// Twelve per-month points for the current reference-zone year.
    pub fn monthly(&self, orders: &[Order], now: DateTime<Utc>) -> Vec<MonthlyBucket> {
        let year = self.now_local(now).year();
        let mut points: Vec<MonthlyBucket> = (1..=12)
            .map(|month| MonthlyBucket {
                month,
                ..MonthlyBucket::default()
            })
            .collect();
        for order in orders {
            if order.status.is_excluded() {
                continue;
            }
            let Some(created) = self.created_local(order) else {
                continue;
            };
            if created.year() != year {
                continue;
            }
            let point = &mut points[created.month0() as usize];
            point.count += 1;
            point.total += order.checkout.total;
        }
        points
    }

    fn now_local(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.config.time_zone).naive_local()
    }

    /// Creation instant in the reference zone. Orders with a timestamp
    /// that does not parse are skipped from every rollup and logged.
    fn created_local(&self, order: &Order) -> Option<NaiveDateTime> {
        let millis = match order.created_at.parse::<i64>() {
            Ok(millis) => millis,
            Err(_) => {
                tracing::warn!(
                    order_id = %order.id,
                    raw = %order.created_at,
                    "skipping order with malformed creation timestamp"
                );
                return None;
            }
        };
        match DateTime::from_timestamp_millis(millis) {
            Some(utc) => Some(utc.with_timezone(&self.config.time_zone).naive_local()),
            None => {
                tracing::warn!(
                    order_id = %order.id,
                    millis,
                    "skipping order with out-of-range creation timestamp"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::Checkout;
    use chrono::TimeZone;

    fn tunis(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        DEFAULT_TIME_ZONE
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn order(created: DateTime<Utc>, status: OrderStatus, total: f64, free_delivery: bool) -> Order {
        Order {
            id: format!("order-{}", created.timestamp_millis()),
            created_at: created.timestamp_millis().to_string(),
            status,
            checkout: Checkout { total, free_delivery },
        }
    }

    fn aggregator() -> StatsAggregator {
        StatsAggregator::new(StatsConfig::default())
    }

    // 2024-05-15 is a Wednesday.
    fn wednesday_noon() -> DateTime<Utc> {
        tunis(2024, 5, 15, 12, 0)
    }

    #[test]
    fn empty_input_yields_all_zero_buckets() {
        let agg = aggregator();
        let now = wednesday_noon();
        assert_eq!(agg.overview(&[], now), OverviewStats::default());
        let detailed = agg.detailed(&[], now);
        assert_eq!(detailed, DetailedStats::default());
        assert!(detailed.by_status.is_empty());
        assert!(agg.monthly(&[], now).iter().all(|p| p.count == 0));
    }

    #[test]
    fn order_placed_now_nets_the_delivery_fee_in_overview_only() {
        let agg = aggregator();
        let now = wednesday_noon();
        let orders = [order(now, OrderStatus::PayedAndDelivered, 100.0, false)];

        let overview = agg.overview(&orders, now);
        assert_eq!(overview.orders, [1, 0, 1, 1, 1]);
        assert_eq!(overview.earnings, [92.0, 0.0, 92.0, 92.0, 92.0]);

        let detailed = agg.detailed(&orders, now);
        assert_eq!(detailed.today, PeriodBucket { count: 1, total: 100.0 });
        assert_eq!(detailed.this_year, PeriodBucket { count: 1, total: 100.0 });
        assert_eq!(
            detailed.by_status.get(&OrderStatus::PayedAndDelivered),
            Some(&1)
        );
    }

    #[test]
    fn free_delivery_keeps_the_full_total() {
        let agg = aggregator();
        let now = wednesday_noon();
        let orders = [order(now, OrderStatus::Confirmed, 100.0, true)];
        assert_eq!(agg.overview(&orders, now).earnings_in(Period::Today), 100.0);
    }

    #[test]
    fn excluded_statuses_contribute_nothing_anywhere() {
        let agg = aggregator();
        let now = wednesday_noon();
        // Exactly at the start-of-year boundary.
        let orders = [
            order(tunis(2024, 1, 1, 0, 0), OrderStatus::Cancelled, 50.0, false),
            order(now, OrderStatus::Refunded, 80.0, false),
            order(now, OrderStatus::Returned, 30.0, false),
        ];
        assert_eq!(agg.overview(&orders, now), OverviewStats::default());
        let detailed = agg.detailed(&orders, now);
        assert_eq!(detailed, DetailedStats::default());
        assert!(detailed.by_status.is_empty());
        assert!(agg.monthly(&orders, now).iter().all(|p| p.count == 0));
    }

    #[test]
    fn today_and_yesterday_are_mutually_exclusive() {
        let agg = aggregator();
        let now = wednesday_noon();
        let orders = [
            order(tunis(2024, 5, 15, 9, 0), OrderStatus::Processing, 20.0, false),
            order(tunis(2024, 5, 14, 10, 0), OrderStatus::Processing, 20.0, false),
        ];
        let overview = agg.overview(&orders, now);
        assert_eq!(overview.orders, [1, 1, 2, 2, 2]);
    }

    #[test]
    fn detailed_buckets_narrow_progressively() {
        let agg = aggregator();
        let now = wednesday_noon();
        let orders = [
            // In the month but before the week (both conventions).
            order(tunis(2024, 5, 5, 10, 0), OrderStatus::Confirmed, 40.0, false),
            // In the week but not today.
            order(tunis(2024, 5, 14, 10, 0), OrderStatus::Confirmed, 60.0, false),
        ];
        let detailed = agg.detailed(&orders, now);
        assert_eq!(detailed.this_year.count, 2);
        assert_eq!(detailed.this_month.count, 2);
        assert_eq!(detailed.this_week.count, 1);
        assert_eq!(detailed.today.count, 0);
        assert_eq!(detailed.this_month.total, 100.0);
        assert_eq!(detailed.this_week.total, 60.0);
    }

    #[test]
    fn overview_and_detailed_use_different_week_starts() {
        let agg = aggregator();
        // 2024-05-19 is a Sunday; ISO week began Monday the 13th, the
        // locale week starts fresh on the 19th.
        let now = tunis(2024, 5, 19, 9, 0);
        let orders = [order(
            tunis(2024, 5, 18, 15, 0),
            OrderStatus::Processing,
            25.0,
            false,
        )];
        let overview = agg.overview(&orders, now);
        assert_eq!(overview.orders_in(Period::ThisWeek), 1);
        assert_eq!(overview.orders_in(Period::Yesterday), 1);
        let detailed = agg.detailed(&orders, now);
        assert_eq!(detailed.this_week.count, 0);
        assert_eq!(detailed.this_month.count, 1);
    }

    #[test]
    fn malformed_timestamps_are_skipped() {
        let agg = aggregator();
        let now = wednesday_noon();
        let mut bad = order(now, OrderStatus::Confirmed, 100.0, false);
        bad.created_at = "abc".to_string();
        let mut out_of_range = order(now, OrderStatus::Confirmed, 100.0, false);
        out_of_range.created_at = i64::MAX.to_string();
        let orders = [bad, out_of_range];

        assert_eq!(agg.overview(&orders, now), OverviewStats::default());
        assert_eq!(agg.detailed(&orders, now), DetailedStats::default());
        assert!(agg.monthly(&orders, now).iter().all(|p| p.count == 0));
    }

    #[test]
    fn unrecognized_status_tallies_under_its_own_key() {
        let agg = aggregator();
        let now = wednesday_noon();
        let status = OrderStatus::Other("ON_HOLD".to_string());
        let orders = [order(now, status.clone(), 10.0, false)];
        let detailed = agg.detailed(&orders, now);
        assert_eq!(detailed.by_status.get(&status), Some(&1));
        assert_eq!(detailed.today.count, 1);
    }

    #[test]
    fn previous_year_orders_are_outside_every_detailed_bucket() {
        let agg = aggregator();
        let now = wednesday_noon();
        let orders = [order(
            tunis(2023, 12, 31, 23, 0),
            OrderStatus::Processing,
            10.0,
            false,
        )];
        let detailed = agg.detailed(&orders, now);
        assert_eq!(detailed, DetailedStats::default());
        assert!(detailed.by_status.is_empty());
        assert_eq!(agg.overview(&orders, now), OverviewStats::default());
    }

    #[test]
    fn start_of_year_boundary_is_inclusive() {
        let agg = aggregator();
        let now = wednesday_noon();
        let orders = [order(
            tunis(2024, 1, 1, 0, 0),
            OrderStatus::Confirmed,
            10.0,
            false,
        )];
        assert_eq!(agg.detailed(&orders, now).this_year.count, 1);
        assert_eq!(agg.overview(&orders, now).orders_in(Period::ThisYear), 1);
        assert_eq!(agg.monthly(&orders, now)[0].count, 1);
    }

    #[test]
    fn detailed_counts_never_grow_as_windows_narrow() {
        let agg = aggregator();
        let now = wednesday_noon();
        let orders = [
            order(tunis(2024, 2, 10, 8, 0), OrderStatus::Confirmed, 10.0, false),
            order(tunis(2024, 5, 3, 8, 0), OrderStatus::Processing, 10.0, false),
            order(tunis(2024, 5, 14, 8, 0), OrderStatus::Confirmed, 10.0, false),
            order(tunis(2024, 5, 15, 8, 0), OrderStatus::PayedNotDelivered, 10.0, false),
        ];
        let detailed = agg.detailed(&orders, now);
        assert!(detailed.this_year.count >= detailed.this_month.count);
        assert!(detailed.this_month.count >= detailed.this_week.count);
        assert!(detailed.this_week.count >= detailed.today.count);
        assert!(detailed.this_year.total >= detailed.this_month.total);
        assert!(detailed.this_month.total >= detailed.this_week.total);
        assert!(detailed.this_week.total >= detailed.today.total);
    }

    #[test]
    fn same_input_and_now_is_idempotent() {
        let agg = aggregator();
        let now = wednesday_noon();
        let orders = [
            order(tunis(2024, 5, 14, 8, 0), OrderStatus::Confirmed, 33.0, false),
            order(tunis(2024, 4, 2, 8, 0), OrderStatus::Processing, 12.0, true),
        ];
        assert_eq!(agg.overview(&orders, now), agg.overview(&orders, now));
        assert_eq!(agg.detailed(&orders, now), agg.detailed(&orders, now));
        assert_eq!(agg.monthly(&orders, now), agg.monthly(&orders, now));
    }

    #[test]
    fn monthly_series_covers_the_calendar_year() {
        let agg = aggregator();
        let now = wednesday_noon();
        let orders = [
            order(tunis(2024, 1, 10, 8, 0), OrderStatus::Confirmed, 10.0, false),
            order(tunis(2024, 2, 3, 8, 0), OrderStatus::Processing, 20.0, false),
            order(tunis(2024, 2, 20, 8, 0), OrderStatus::Confirmed, 30.0, false),
            order(tunis(2024, 5, 1, 8, 0), OrderStatus::Cancelled, 99.0, false),
            order(tunis(2023, 2, 1, 8, 0), OrderStatus::Confirmed, 40.0, false),
        ];
        let points = agg.monthly(&orders, now);
        assert_eq!(points.len(), 12);
        assert_eq!(points[0], MonthlyBucket { month: 1, count: 1, total: 10.0 });
        assert_eq!(points[1], MonthlyBucket { month: 2, count: 2, total: 50.0 });
        assert_eq!(points[4].count, 0);
    }

    #[test]
    fn boundaries_follow_the_reference_zone_not_utc() {
        let agg = aggregator();
        // 23:30 UTC on the 14th is already the 15th in Africa/Tunis
        // (UTC+1), so the order counts as today.
        let now = wednesday_noon();
        let created = Utc.with_ymd_and_hms(2024, 5, 14, 23, 30, 0).unwrap();
        let orders = [order(created, OrderStatus::Confirmed, 10.0, false)];
        let overview = agg.overview(&orders, now);
        assert_eq!(overview.orders_in(Period::Today), 1);
        assert_eq!(overview.orders_in(Period::Yesterday), 0);
    }

    #[test]
    fn week_convention_is_configurable_per_rollup() {
        let agg = StatsAggregator::new(StatsConfig {
            detailed_week_start: WeekStart::Monday,
            ..StatsConfig::default()
        });
        let now = tunis(2024, 5, 19, 9, 0);
        let orders = [order(
            tunis(2024, 5, 18, 15, 0),
            OrderStatus::Processing,
            25.0,
            false,
        )];
        // With ISO weeks on both rollups, Saturday the 18th is in-week
        // for the detailed view too.
        assert_eq!(agg.detailed(&orders, now).this_week.count, 1);
    }

    #[test]
    fn period_labels_line_up_with_slots() {
        assert_eq!(Period::ALL.len(), 5);
        assert_eq!(Period::ALL[0].label(), "Today");
        assert_eq!(Period::ALL[4].label(), "This year");
    }
}
