//! 数据库模型

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use ctflow_core::models::*;
use sqlx::FromRow;
use uuid::Uuid;

// 数据库表模型 - 使用FromRow trait用于SQL查询

/// 患者表 (patient_new)
#[derive(Debug, FromRow)]
pub struct DbPatient {
    pub id: i64,
    pub cro: String,
    pub name: String,
    pub age: Option<i32>,
    pub gender: Option<String>, // 存储为字符串，转换为Gender枚举
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub doctor_id: Option<i64>,
    pub hospital_id: Option<i64>,
    pub category: String,
    pub total_scans: i32,
    pub amount: i64,
    pub received_amount: i64,
    pub due_amount: i64,
    pub scan_status: i16, // 存储为整数编码，转换为ScanStatus枚举
    pub examination_id: Option<String>,
    pub scan_date: Option<NaiveDate>,
    pub report_date: Option<NaiveDate>,
    pub registration_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbPatient> for Patient {
    fn from(db: DbPatient) -> Self {
        Patient {
            id: db.id,
            cro: db.cro,
            name: db.name,
            age: db.age,
            gender: db.gender.and_then(|g| match g.as_str() {
                "M" => Some(Gender::Male),
                "F" => Some(Gender::Female),
                "O" => Some(Gender::Other),
                _ => None,
            }),
            mobile: db.mobile,
            address: db.address,
            doctor_id: db.doctor_id,
            hospital_id: db.hospital_id,
            category: db.category,
            total_scans: db.total_scans,
            amount: db.amount,
            received_amount: db.received_amount,
            due_amount: db.due_amount,
            scan_status: ScanStatus::from_code(db.scan_status).unwrap_or(ScanStatus::Registered),
            examination_id: db.examination_id,
            scan_date: db.scan_date,
            report_date: db.report_date,
            registration_date: db.registration_date,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// 性别枚举到存储字符的映射
pub fn gender_to_str(gender: &Gender) -> &'static str {
    match gender {
        Gender::Male => "M",
        Gender::Female => "F",
        Gender::Other => "O",
    }
}

/// 操作台表 (console)
#[derive(Debug, FromRow)]
pub struct DbConsoleEntry {
    pub id: i64,
    pub cro: String,
    pub examination_id: Option<String>,
    pub technician: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub stop_time: Option<NaiveTime>,
    pub gap: Option<String>,
    pub number_films: Option<i32>,
    pub number_scans: Option<i32>,
    pub issue_cd: Option<String>,
    pub remark: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbConsoleEntry> for ConsoleEntry {
    fn from(db: DbConsoleEntry) -> Self {
        ConsoleEntry {
            id: db.id,
            cro: db.cro,
            examination_id: db.examination_id,
            technician: db.technician,
            start_time: db.start_time,
            stop_time: db.stop_time,
            gap: db.gap,
            number_films: db.number_films,
            number_scans: db.number_scans,
            issue_cd: db.issue_cd,
            remark: db.remark,
            status: db.status,
            created_at: db.created_at,
        }
    }
}

/// 护理队列表 (nursing_patient)
#[derive(Debug, FromRow)]
pub struct DbNursingEntry {
    pub id: i64,
    pub cro: String,
    pub forwarded_at: DateTime<Utc>,
    pub prepared_at: Option<DateTime<Utc>>,
    pub report_ready_at: Option<DateTime<Utc>>,
}

impl From<DbNursingEntry> for NursingEntry {
    fn from(db: DbNursingEntry) -> Self {
        NursingEntry {
            id: db.id,
            cro: db.cro,
            forwarded_at: db.forwarded_at,
            prepared_at: db.prepared_at,
            report_ready_at: db.report_ready_at,
        }
    }
}

/// 医生表 (doctor)
#[derive(Debug, FromRow)]
pub struct DbDoctor {
    pub id: i64,
    pub name: String,
    pub specialty: Option<String>,
    pub mobile: Option<String>,
}

impl From<DbDoctor> for Doctor {
    fn from(db: DbDoctor) -> Self {
        Doctor {
            id: db.id,
            name: db.name,
            specialty: db.specialty,
            mobile: db.mobile,
        }
    }
}

/// 医院表 (hospital)
#[derive(Debug, FromRow)]
pub struct DbHospital {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub contact: Option<String>,
}

impl From<DbHospital> for Hospital {
    fn from(db: DbHospital) -> Self {
        Hospital {
            id: db.id,
            name: db.name,
            address: db.address,
            contact: db.contact,
        }
    }
}

/// 时段表 (time_slot2)
#[derive(Debug, FromRow)]
pub struct DbTimeSlot {
    pub id: i64,
    pub from_time: NaiveTime,
    pub to_time: NaiveTime,
}

impl From<DbTimeSlot> for TimeSlot {
    fn from(db: DbTimeSlot) -> Self {
        TimeSlot {
            id: db.id,
            from_time: db.from_time,
            to_time: db.to_time,
        }
    }
}

/// 库存表 (inventory)
#[derive(Debug, FromRow)]
pub struct DbInventoryItem {
    pub id: Uuid,
    pub item_name: String,
    pub category: Option<String>,
    pub quantity: i32,
    pub reorder_level: i32,
    pub unit_price: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<DbInventoryItem> for InventoryItem {
    fn from(db: DbInventoryItem) -> Self {
        InventoryItem {
            id: db.id,
            item_name: db.item_name,
            category: db.category,
            quantity: db.quantity,
            reorder_level: db.reorder_level,
            unit_price: db.unit_price,
            updated_at: db.updated_at,
        }
    }
}

// 插入模型 - 用于创建新记录

/// 新患者登记模型
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub name: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub doctor_id: Option<i64>,
    pub hospital_id: Option<i64>,
    pub category: String,
    pub total_scans: i32,
    pub amount: i64,
    pub received_amount: i64,
    pub registration_date: NaiveDate,
}

/// 操作台扫描记录模型
///
/// 由处理器解析请求并计算gap后传入，status保留原始文本。
#[derive(Debug, Clone)]
pub struct NewConsoleEntry {
    pub cro: String,
    pub examination_id: String,
    pub technician: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub stop_time: Option<NaiveTime>,
    pub gap: Option<String>,
    pub number_films: Option<i32>,
    pub number_scans: Option<i32>,
    pub issue_cd: Option<String>,
    pub remark: Option<String>,
    pub status: String,
    pub scan_date: NaiveDate,
}

/// 新库存物品模型
#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub item_name: String,
    pub category: Option<String>,
    pub quantity: i32,
    pub reorder_level: i32,
    pub unit_price: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db_patient(status: i16, gender: Option<&str>) -> DbPatient {
        DbPatient {
            id: 7,
            cro: "CT-07082026-7".to_string(),
            name: "Asha Verma".to_string(),
            age: Some(42),
            gender: gender.map(|g| g.to_string()),
            mobile: None,
            address: None,
            doctor_id: Some(1),
            hospital_id: Some(2),
            category: "Brain CT".to_string(),
            total_scans: 1,
            amount: 1200,
            received_amount: 1000,
            due_amount: 200,
            scan_status: status,
            examination_id: None,
            scan_date: None,
            report_date: None,
            registration_date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_patient_conversion() {
        let patient: Patient = sample_db_patient(2, Some("F")).into();
        assert_eq!(patient.scan_status, ScanStatus::SentToConsole);
        assert_eq!(patient.gender, Some(Gender::Female));
        assert_eq!(patient.due_amount, 200);
    }

    #[test]
    fn test_patient_conversion_defaults() {
        // 未知编码与未知性别字符回落为安全默认值
        let patient: Patient = sample_db_patient(99, Some("X")).into();
        assert_eq!(patient.scan_status, ScanStatus::Registered);
        assert_eq!(patient.gender, None);
    }
}
