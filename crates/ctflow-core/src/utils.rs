//! 通用工具函数
//!
//! 边界日期解析与扫描间隔计算。

use crate::error::{CtflowError, Result};
use chrono::{NaiveDate, NaiveTime};

/// 解析HTTP边界传入的 dd-mm-yyyy 日期
///
/// 旧系统在库内以本地化文本存储日期并做字符串比较，跨月/跨年边界
/// 排序是错的。这里在边界一次性转换为结构化日期，之后全程使用
/// `NaiveDate`。
pub fn parse_boundary_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%d-%m-%Y")
        .map_err(|_| CtflowError::Validation(format!("Invalid date '{}', expected dd-mm-yyyy", text)))
}

/// 解析 HH:MM:SS 时刻
pub fn parse_clock(text: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M:%S")
        .map_err(|_| CtflowError::Validation(format!("Invalid time '{}', expected HH:MM:SS", text)))
}

/// 计算扫描起止间隔文本
///
/// 间隔达到60分钟时输出 "时:分"，否则输出总秒数 "Nsec"。
/// 结束时刻早于开始时刻视为跨午夜。
pub fn format_scan_gap(start: NaiveTime, stop: NaiveTime) -> String {
    let mut secs = (stop - start).num_seconds();
    if secs < 0 {
        secs += 24 * 60 * 60;
    }

    let minutes = secs / 60;
    if minutes >= 60 {
        format!("{}:{}", minutes / 60, minutes % 60)
    } else {
        format!("{}sec", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(s: &str) -> NaiveTime {
        parse_clock(s).unwrap()
    }

    #[test]
    fn test_gap_over_an_hour() {
        assert_eq!(format_scan_gap(clock("09:00:00"), clock("10:05:00")), "1:5");
    }

    #[test]
    fn test_gap_in_seconds() {
        assert_eq!(format_scan_gap(clock("09:00:00"), clock("09:00:30")), "30sec");
        assert_eq!(format_scan_gap(clock("09:00:00"), clock("09:45:00")), "2700sec");
    }

    #[test]
    fn test_gap_exactly_one_hour() {
        assert_eq!(format_scan_gap(clock("09:00:00"), clock("10:00:00")), "1:0");
    }

    #[test]
    fn test_gap_across_midnight() {
        assert_eq!(format_scan_gap(clock("23:59:30"), clock("00:00:10")), "40sec");
    }

    #[test]
    fn test_boundary_date() {
        let date = parse_boundary_date("07-08-2026").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());

        assert!(parse_boundary_date("2026-08-07").is_err());
        assert!(parse_boundary_date("32-01-2026").is_err());
    }

    #[test]
    fn test_boundary_date_orders_across_months() {
        // 字符串比较会把 "01-02-2026" 排在 "31-01-2026" 之前，结构化日期不会
        let jan = parse_boundary_date("31-01-2026").unwrap();
        let feb = parse_boundary_date("01-02-2026").unwrap();
        assert!(jan < feb);
    }

    #[test]
    fn test_clock_rejects_garbage() {
        assert!(parse_clock("9am").is_err());
        assert!(parse_clock("25:00:00").is_err());
    }
}
