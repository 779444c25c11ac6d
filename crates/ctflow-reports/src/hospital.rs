//! 医院维度报表聚合

use ctflow_core::HospitalRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单家医院的小计
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalSummary {
    pub hospital: String,
    pub patients: i64,
    pub amount: i64,
}

/// 按医院汇总患者数与金额
pub fn summarize_by_hospital(rows: &[HospitalRow]) -> Vec<HospitalSummary> {
    let mut by_hospital: BTreeMap<&str, HospitalSummary> = BTreeMap::new();

    for row in rows {
        let entry = by_hospital
            .entry(row.hospital.as_str())
            .or_insert_with(|| HospitalSummary {
                hospital: row.hospital.clone(),
                patients: 0,
                amount: 0,
            });
        entry.patients += 1;
        entry.amount += row.amount;
    }

    by_hospital.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hospital_breakdown() {
        let rows = vec![
            HospitalRow { hospital: "City Hospital".to_string(), amount: 700 },
            HospitalRow { hospital: "City Hospital".to_string(), amount: 300 },
            HospitalRow { hospital: "District Clinic".to_string(), amount: 500 },
        ];

        let summary = summarize_by_hospital(&rows);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].hospital, "City Hospital");
        assert_eq!(summary[0].patients, 2);
        assert_eq!(summary[0].amount, 1000);
        assert_eq!(summary[1].patients, 1);
        assert_eq!(summary[1].amount, 500);
    }
}
