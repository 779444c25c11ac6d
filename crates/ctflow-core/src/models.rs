//! 核心数据模型定义

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 患者登记信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub cro: String,                        // 就诊参考号，跨表关联键
    pub name: String,                       // 患者姓名
    pub age: Option<i32>,                   // 年龄
    pub gender: Option<Gender>,             // 性别
    pub mobile: Option<String>,             // 联系电话
    pub address: Option<String>,            // 地址
    pub doctor_id: Option<i64>,             // 开单医生
    pub hospital_id: Option<i64>,           // 所属医院
    pub category: String,                   // 扫描类别 (头部CT、胸部CT等)
    pub total_scans: i32,                   // 扫描数量
    pub amount: i64,                        // 应收金额（卢比整数）
    pub received_amount: i64,               // 实收金额
    pub due_amount: i64,                    // 欠费金额
    pub scan_status: ScanStatus,            // 当前工作流状态
    pub examination_id: Option<String>,     // 检查号，扫描执行后写入
    pub scan_date: Option<NaiveDate>,       // 扫描日期，扫描执行后写入
    pub report_date: Option<NaiveDate>,     // 医生出具报告日期
    pub registration_date: NaiveDate,       // 登记日期
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 性别枚举
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// 患者扫描工作流状态
///
/// 旧系统将状态存储为散落在各处理器中的整数字面量，这里以显式枚举
/// 承载同一组编码，合法转换由 ctflow-workflow 的转换表约束。
/// 序列化保持整数编码的线上格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanStatus {
    Registered,       // 0 - 已登记（接待台）
    Complete,         // 1 - 扫描完成
    SentToConsole,    // 2 - 已送操作台（已准备）
    Recall,           // 3 - 召回重扫
    PendingAtConsole, // 4 - 操作台待处理
}

impl ScanStatus {
    /// 状态对应的存储/线上整数编码
    pub fn code(&self) -> i16 {
        match self {
            ScanStatus::Registered => 0,
            ScanStatus::Complete => 1,
            ScanStatus::SentToConsole => 2,
            ScanStatus::Recall => 3,
            ScanStatus::PendingAtConsole => 4,
        }
    }

    /// 从整数编码还原状态
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(ScanStatus::Registered),
            1 => Some(ScanStatus::Complete),
            2 => Some(ScanStatus::SentToConsole),
            3 => Some(ScanStatus::Recall),
            4 => Some(ScanStatus::PendingAtConsole),
            _ => None,
        }
    }

    /// 操作台文本状态到状态编码的映射
    ///
    /// 与旧系统保持一致: Complete→1, Pending→4, Recall→3, 其他→0。
    pub fn from_console_text(text: &str) -> Self {
        match text {
            "Complete" => ScanStatus::Complete,
            "Pending" => ScanStatus::PendingAtConsole,
            "Recall" => ScanStatus::Recall,
            _ => ScanStatus::Registered,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Registered => "Registered",
            ScanStatus::Complete => "Complete",
            ScanStatus::SentToConsole => "SentToConsole",
            ScanStatus::Recall => "Recall",
            ScanStatus::PendingAtConsole => "PendingAtConsole",
        }
    }
}

impl Serialize for ScanStatus {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i16(self.code())
    }
}

impl<'de> Deserialize<'de> for ScanStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = i16::deserialize(deserializer)?;
        ScanStatus::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid scan status code {}", code)))
    }
}

/// 操作台扫描记录
///
/// 每次扫描尝试一行，以CRO关联患者。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub id: i64,
    pub cro: String,
    pub examination_id: Option<String>,
    pub technician: Option<String>,       // 操作技师
    pub start_time: Option<NaiveTime>,    // 扫描开始时间
    pub stop_time: Option<NaiveTime>,     // 扫描结束时间
    pub gap: Option<String>,              // 起止间隔文本 ("H:M" 或 "Nsec")
    pub number_films: Option<i32>,        // 胶片数
    pub number_scans: Option<i32>,        // 扫描序列数
    pub issue_cd: Option<String>,         // 是否发放光盘
    pub remark: Option<String>,
    pub status: String,                   // Pending / Complete / Recall
    pub created_at: DateTime<Utc>,
}

/// 护理队列记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NursingEntry {
    pub id: i64,
    pub cro: String,
    pub forwarded_at: DateTime<Utc>,              // 转入护理队列时间
    pub prepared_at: Option<DateTime<Utc>>,       // 准备完成时间
    pub report_ready_at: Option<DateTime<Utc>>,   // 报告就绪时间
}

/// 开单医生
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialty: Option<String>,
    pub mobile: Option<String>,
}

/// 合作医院
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub contact: Option<String>,
}

/// 操作台预约时段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: i64,
    pub from_time: NaiveTime,
    pub to_time: NaiveTime,
}

/// 库存物品
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub item_name: String,
    pub category: Option<String>,     // 胶片、造影剂、耗材等
    pub quantity: i32,                // 当前库存
    pub reorder_level: i32,           // 补货阈值
    pub unit_price: i64,
    pub updated_at: DateTime<Utc>,
}

/// 收入报表行
///
/// 每行对应一名患者，聚合在应用层完成。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueRow {
    pub cro: String,
    pub category: String,
    pub scans: i32,
    pub amount: i64,
}

/// 医院维度报表行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalRow {
    pub hospital: String,
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ScanStatus::Registered.code(), 0);
        assert_eq!(ScanStatus::Complete.code(), 1);
        assert_eq!(ScanStatus::SentToConsole.code(), 2);
        assert_eq!(ScanStatus::Recall.code(), 3);
        assert_eq!(ScanStatus::PendingAtConsole.code(), 4);

        for code in 0i16..=4 {
            let status = ScanStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(ScanStatus::from_code(5).is_none());
        assert!(ScanStatus::from_code(-1).is_none());
    }

    #[test]
    fn test_status_serializes_as_code() {
        let json = serde_json::to_string(&ScanStatus::PendingAtConsole).unwrap();
        assert_eq!(json, "4");

        let status: ScanStatus = serde_json::from_str("2").unwrap();
        assert_eq!(status, ScanStatus::SentToConsole);
        assert!(serde_json::from_str::<ScanStatus>("9").is_err());
    }

    #[test]
    fn test_console_text_mapping() {
        assert_eq!(ScanStatus::from_console_text("Complete").code(), 1);
        assert_eq!(ScanStatus::from_console_text("Pending").code(), 4);
        assert_eq!(ScanStatus::from_console_text("Recall").code(), 3);
        assert_eq!(ScanStatus::from_console_text("whatever").code(), 0);
        assert_eq!(ScanStatus::from_console_text("").code(), 0);
    }
}
