//! 报表聚合
//!
//! 纯函数，输入是已经取出的订单/商品记录。统计窗口是截止到 `now` 的滚动窗口，
//! 上一周期是紧挨着当前窗口之前、等长的窗口。

use std::collections::{BTreeMap, HashMap};

use shared::models::{
    Order, OrderComparison, OrderStatus, Product, ReportPeriod, RevenueComparison,
    TopOrderedProduct, TopRatedProduct,
};

/// 当前 / 上一周期的边界
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub previous_start: i64,
    pub current_start: i64,
    pub end: i64,
}

impl Windows {
    pub fn new(period: ReportPeriod, now: i64) -> Self {
        let len = period.duration_millis();
        Self {
            previous_start: now - 2 * len,
            current_start: now - len,
            end: now,
        }
    }

    fn in_current(&self, t: i64) -> bool {
        t >= self.current_start && t <= self.end
    }

    fn in_previous(&self, t: i64) -> bool {
        t >= self.previous_start && t < self.current_start
    }
}

/// Percentage change rounded to two decimals; None when there is no baseline
pub fn change_percent(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let pct = (current - previous) / previous * 100.0;
    Some((pct * 100.0).round() / 100.0)
}

fn counts_as_revenue(order: &Order) -> bool {
    order.is_paid() && !order.status.is_cancelled()
}

fn is_placed(order: &Order) -> bool {
    order.status != OrderStatus::Draft
}

pub fn revenue_comparison(orders: &[Order], period: ReportPeriod, now: i64) -> RevenueComparison {
    let w = Windows::new(period, now);
    let (mut current, mut previous) = (0i64, 0i64);

    for order in orders.iter().filter(|o| counts_as_revenue(o)) {
        if w.in_current(order.created_at) {
            current += order.total_price;
        } else if w.in_previous(order.created_at) {
            previous += order.total_price;
        }
    }

    RevenueComparison {
        period,
        current,
        previous,
        change_percent: change_percent(current as f64, previous as f64),
    }
}

pub fn order_comparison(orders: &[Order], period: ReportPeriod, now: i64) -> OrderComparison {
    let w = Windows::new(period, now);
    let (mut current, mut previous) = (0u64, 0u64);
    let mut by_status: BTreeMap<String, u64> = BTreeMap::new();

    for order in orders.iter().filter(|o| is_placed(o)) {
        if w.in_current(order.created_at) {
            current += 1;
            *by_status.entry(order.status.as_str().to_string()).or_default() += 1;
        } else if w.in_previous(order.created_at) {
            previous += 1;
        }
    }

    OrderComparison {
        period,
        current,
        previous,
        change_percent: change_percent(current as f64, previous as f64),
        by_status,
    }
}

/// Σ quantity per product over placed, non-cancelled orders
pub fn top_ordered(orders: &[Order], limit: usize) -> Vec<TopOrderedProduct> {
    let mut totals: HashMap<&str, (&str, i64)> = HashMap::new();

    for order in orders
        .iter()
        .filter(|o| is_placed(o) && !o.status.is_cancelled())
    {
        for item in &order.items {
            let entry = totals
                .entry(item.product_id.as_str())
                .or_insert((item.name.as_str(), 0));
            entry.1 += item.quantity;
        }
    }

    let mut ranked: Vec<TopOrderedProduct> = totals
        .into_iter()
        .map(|(id, (name, quantity))| TopOrderedProduct {
            product_id: id.to_string(),
            name: name.to_string(),
            quantity,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Rated products by average rating, then rating count
pub fn top_rated(products: &[Product], limit: usize) -> Vec<TopRatedProduct> {
    let mut ranked: Vec<TopRatedProduct> = products
        .iter()
        .filter(|p| p.rating_count > 0)
        .map(|p| TopRatedProduct {
            product_id: p.product_id.clone(),
            name: p.name.clone(),
            average_rating: p.average_rating(),
            rating_count: p.rating_count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then_with(|| b.rating_count.cmp(&a.rating_count))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);
    ranked
}
