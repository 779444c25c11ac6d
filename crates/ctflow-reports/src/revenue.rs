//! 收入报表聚合
//!
//! 按扫描类别汇总患者数、扫描数与金额，扣除固定比例的免费份额。

use ctflow_core::RevenueRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 免费份额比例（总额的25%不可回收）
pub const FREE_SHARE_PERCENT: f64 = 25.0;

/// 单个扫描类别的小计
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub patients: i64,
    pub scans: i64,
    pub amount: i64,
}

/// 收入汇总报表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub categories: Vec<CategorySummary>,
    pub total_patients: i64,
    pub total_scans: i64,
    pub total_amount: i64,
    pub free_share: f64,      // 总额的25%
    pub net_receivable: f64,  // 总额扣除免费份额
}

/// 对取回的患者行集做收入汇总
///
/// 每行代表一名患者；类别按名称排序输出，保证报表稳定。
pub fn summarize_revenue(rows: &[RevenueRow]) -> RevenueSummary {
    let mut by_category: BTreeMap<&str, CategorySummary> = BTreeMap::new();

    for row in rows {
        let entry = by_category
            .entry(row.category.as_str())
            .or_insert_with(|| CategorySummary {
                category: row.category.clone(),
                patients: 0,
                scans: 0,
                amount: 0,
            });
        entry.patients += 1;
        entry.scans += row.scans as i64;
        entry.amount += row.amount;
    }

    let categories: Vec<CategorySummary> = by_category.into_values().collect();
    let total_patients: i64 = categories.iter().map(|c| c.patients).sum();
    let total_scans: i64 = categories.iter().map(|c| c.scans).sum();
    let total_amount: i64 = categories.iter().map(|c| c.amount).sum();

    let free_share = total_amount as f64 * FREE_SHARE_PERCENT / 100.0;
    let net_receivable = total_amount as f64 - free_share;

    RevenueSummary {
        categories,
        total_patients,
        total_scans,
        total_amount,
        free_share,
        net_receivable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cro: &str, category: &str, scans: i32, amount: i64) -> RevenueRow {
        RevenueRow {
            cro: cro.to_string(),
            category: category.to_string(),
            scans,
            amount,
        }
    }

    #[test]
    fn test_daily_summary_totals() {
        // 类别A: 2名患者、10次扫描、1000卢比；类别B: 1名患者、5次扫描、500卢比
        let rows = vec![
            row("CRO-1", "A", 6, 600),
            row("CRO-2", "A", 4, 400),
            row("CRO-3", "B", 5, 500),
        ];

        let summary = summarize_revenue(&rows);

        assert_eq!(summary.total_patients, 3);
        assert_eq!(summary.total_scans, 15);
        assert_eq!(summary.total_amount, 1500);
        assert_eq!(summary.free_share, 375.0);
        assert_eq!(summary.net_receivable, 1125.0);

        assert_eq!(summary.categories.len(), 2);
        let a = &summary.categories[0];
        assert_eq!((a.category.as_str(), a.patients, a.scans, a.amount), ("A", 2, 10, 1000));
        let b = &summary.categories[1];
        assert_eq!((b.category.as_str(), b.patients, b.scans, b.amount), ("B", 1, 5, 500));
    }

    #[test]
    fn test_empty_rows() {
        let summary = summarize_revenue(&[]);
        assert_eq!(summary.total_patients, 0);
        assert_eq!(summary.total_amount, 0);
        assert_eq!(summary.free_share, 0.0);
        assert_eq!(summary.net_receivable, 0.0);
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn test_categories_sorted_by_name() {
        let rows = vec![row("CRO-1", "Chest CT", 1, 100), row("CRO-2", "Brain CT", 1, 100)];
        let summary = summarize_revenue(&rows);
        assert_eq!(summary.categories[0].category, "Brain CT");
        assert_eq!(summary.categories[1].category, "Chest CT");
    }
}
