//! 数据库查询操作
//!
//! 工作流相关的多语句序列（队列插入 + 患者状态更新）全部在单个
//! 事务内执行并持行锁，状态合法性在锁内由状态机校验，避免旧系统
//! 的部分失败与丢失更新。

use crate::connection::DatabasePool;
use crate::models::*;
use chrono::NaiveDate;
use ctflow_core::{
    ConsoleEntry, CtflowError, Doctor, Hospital, HospitalRow, InventoryItem, Patient, Result,
    RevenueRow, ScanStatus, TimeSlot,
};
use ctflow_workflow::{RouteDestination, ScanEvent, ScanStateMachine};
use sqlx::Row;
use uuid::Uuid;

/// 患者列表过滤器
#[derive(Debug, Clone, Default)]
pub struct PatientPageFilter {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub date: Option<NaiveDate>,
}

/// 患者分页结果
#[derive(Debug)]
pub struct PatientPage {
    pub patients: Vec<Patient>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// 数据库查询操作接口
pub struct DatabaseQueries<'a> {
    pool: &'a DatabasePool,
    machine: ScanStateMachine,
}

impl<'a> DatabaseQueries<'a> {
    pub fn new(pool: &'a DatabasePool) -> Self {
        Self {
            pool,
            machine: ScanStateMachine::new(),
        }
    }

    /// 创建数据库表
    pub async fn create_tables(&self) -> Result<()> {
        let pool = self.pool.pool();

        // 医生表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS doctor (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                specialty VARCHAR(128),
                mobile VARCHAR(20)
            )
        "#).execute(pool).await.map_err(|e| CtflowError::Database(e.to_string()))?;

        // 医院表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS hospital (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                address TEXT,
                contact VARCHAR(64)
            )
        "#).execute(pool).await.map_err(|e| CtflowError::Database(e.to_string()))?;

        // 患者表，外键引用医生与医院
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS patient_new (
                id BIGSERIAL PRIMARY KEY,
                cro VARCHAR(64) UNIQUE NOT NULL,
                name VARCHAR(255) NOT NULL,
                age INTEGER,
                gender CHAR(1),
                mobile VARCHAR(20),
                address TEXT,
                doctor_id BIGINT REFERENCES doctor(id),
                hospital_id BIGINT REFERENCES hospital(id),
                category VARCHAR(64) NOT NULL,
                total_scans INTEGER NOT NULL DEFAULT 1,
                amount BIGINT NOT NULL DEFAULT 0,
                received_amount BIGINT NOT NULL DEFAULT 0,
                due_amount BIGINT NOT NULL DEFAULT 0,
                scan_status SMALLINT NOT NULL DEFAULT 0,
                examination_id VARCHAR(64),
                scan_date DATE,
                report_date DATE,
                registration_date DATE NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| CtflowError::Database(e.to_string()))?;

        // 操作台表，CRO唯一约束保证一名患者同时只有一条扫描记录
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS console (
                id BIGSERIAL PRIMARY KEY,
                cro VARCHAR(64) UNIQUE NOT NULL,
                examination_id VARCHAR(64),
                technician VARCHAR(128),
                start_time TIME,
                stop_time TIME,
                gap VARCHAR(16),
                number_films INTEGER,
                number_scans INTEGER,
                issue_cd VARCHAR(8),
                remark TEXT,
                status VARCHAR(16) NOT NULL DEFAULT 'Pending',
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| CtflowError::Database(e.to_string()))?;

        // 护理队列表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS nursing_patient (
                id BIGSERIAL PRIMARY KEY,
                cro VARCHAR(64) UNIQUE NOT NULL,
                forwarded_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                prepared_at TIMESTAMP WITH TIME ZONE,
                report_ready_at TIMESTAMP WITH TIME ZONE
            )
        "#).execute(pool).await.map_err(|e| CtflowError::Database(e.to_string()))?;

        // 时段表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS time_slot2 (
                id BIGSERIAL PRIMARY KEY,
                from_time TIME NOT NULL,
                to_time TIME NOT NULL
            )
        "#).execute(pool).await.map_err(|e| CtflowError::Database(e.to_string()))?;

        // 库存表
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS inventory (
                id UUID PRIMARY KEY,
                item_name VARCHAR(255) NOT NULL,
                category VARCHAR(64),
                quantity INTEGER NOT NULL DEFAULT 0,
                reorder_level INTEGER NOT NULL DEFAULT 0,
                unit_price BIGINT NOT NULL DEFAULT 0,
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#).execute(pool).await.map_err(|e| CtflowError::Database(e.to_string()))?;

        self.create_indexes().await?;

        tracing::info!("Database tables created successfully");
        Ok(())
    }

    /// 创建数据库索引
    async fn create_indexes(&self) -> Result<()> {
        let pool = self.pool.pool();

        let indexes = vec![
            "CREATE INDEX IF NOT EXISTS idx_patient_new_cro ON patient_new(cro)",
            "CREATE INDEX IF NOT EXISTS idx_patient_new_name ON patient_new(name)",
            "CREATE INDEX IF NOT EXISTS idx_patient_new_scan_status ON patient_new(scan_status)",
            "CREATE INDEX IF NOT EXISTS idx_patient_new_registration_date ON patient_new(registration_date)",
            "CREATE INDEX IF NOT EXISTS idx_patient_new_hospital_id ON patient_new(hospital_id)",
            "CREATE INDEX IF NOT EXISTS idx_console_cro ON console(cro)",
            "CREATE INDEX IF NOT EXISTS idx_nursing_patient_cro ON nursing_patient(cro)",
            "CREATE INDEX IF NOT EXISTS idx_inventory_item_name ON inventory(item_name)",
        ];

        for index_sql in indexes {
            sqlx::query(index_sql)
                .execute(pool)
                .await
                .map_err(|e| CtflowError::Database(e.to_string()))?;
        }

        Ok(())
    }

    // ========== 患者登记与查询 ==========

    /// 登记新患者
    ///
    /// CRO由登记日期和自增ID生成，插入与回写在同一事务内。
    pub async fn register_patient(&self, patient: &NewPatient) -> Result<Patient> {
        let mut tx = self.pool.pool().begin().await
            .map_err(|e| CtflowError::Database(e.to_string()))?;

        let due_amount = patient.amount - patient.received_amount;
        let gender_str = patient.gender.as_ref().map(gender_to_str);

        let id: i64 = sqlx::query_scalar(r#"
            INSERT INTO patient_new
                (cro, name, age, gender, mobile, address, doctor_id, hospital_id,
                 category, total_scans, amount, received_amount, due_amount,
                 scan_status, registration_date)
            VALUES ('', $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
        "#)
        .bind(&patient.name)
        .bind(patient.age)
        .bind(gender_str)
        .bind(&patient.mobile)
        .bind(&patient.address)
        .bind(patient.doctor_id)
        .bind(patient.hospital_id)
        .bind(&patient.category)
        .bind(patient.total_scans)
        .bind(patient.amount)
        .bind(patient.received_amount)
        .bind(due_amount)
        .bind(ScanStatus::Registered.code())
        .bind(patient.registration_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        let cro = format!("CT-{}-{}", patient.registration_date.format("%d%m%Y"), id);

        let db_patient = sqlx::query_as::<_, DbPatient>(
            "UPDATE patient_new SET cro = $1 WHERE id = $2 RETURNING *"
        )
        .bind(&cro)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        tx.commit().await.map_err(|e| CtflowError::Database(e.to_string()))?;

        tracing::info!("Registered patient {} with CRO {}", id, cro);
        Ok(db_patient.into())
    }

    /// 分页查询患者列表
    pub async fn get_patients(&self, filter: &PatientPageFilter) -> Result<PatientPage> {
        let pool = self.pool.pool();

        let page = filter.page.unwrap_or(1).max(1);
        let limit = filter.limit.unwrap_or(50).clamp(1, 200);
        let offset = (page - 1) * limit;
        let search = filter.search.as_ref().map(|s| format!("%{}%", s));

        let total: i64 = sqlx::query_scalar(r#"
            SELECT COUNT(*) FROM patient_new
            WHERE ($1::text IS NULL OR cro ILIKE $1 OR name ILIKE $1)
              AND ($2::date IS NULL OR registration_date = $2)
        "#)
        .bind(&search)
        .bind(filter.date)
        .fetch_one(pool)
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        let rows = sqlx::query_as::<_, DbPatient>(r#"
            SELECT * FROM patient_new
            WHERE ($1::text IS NULL OR cro ILIKE $1 OR name ILIKE $1)
              AND ($2::date IS NULL OR registration_date = $2)
            ORDER BY id DESC
            LIMIT $3 OFFSET $4
        "#)
        .bind(&search)
        .bind(filter.date)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(PatientPage {
            patients: rows.into_iter().map(Patient::from).collect(),
            total,
            page,
            limit,
        })
    }

    /// 根据CRO查找患者
    pub async fn get_patient_by_cro(&self, cro: &str) -> Result<Option<Patient>> {
        let result = sqlx::query_as::<_, DbPatient>(
            "SELECT * FROM patient_new WHERE cro = $1"
        )
        .bind(cro)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(result.map(Patient::from))
    }

    // ========== 队列路由 ==========

    /// 将患者转入护理或操作台队列
    ///
    /// 队列行插入与患者状态更新在同一事务内完成，患者行持
    /// FOR UPDATE 锁，锁内由状态机校验转换合法性。
    pub async fn route_patient(&self, cro: &str, destination: RouteDestination) -> Result<ScanStatus> {
        let mut tx = self.pool.pool().begin().await
            .map_err(|e| CtflowError::Database(e.to_string()))?;

        let current = self.lock_patient_status(&mut tx, cro).await?;
        let event = destination.event();
        let next = self.machine.transition(current, &event)?;

        match destination {
            RouteDestination::Nursing => {
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM nursing_patient WHERE cro = $1)"
                )
                .bind(cro)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| CtflowError::Database(e.to_string()))?;

                if exists {
                    return Err(CtflowError::AlreadyExists(format!(
                        "CRO {} already exists in nursing queue", cro
                    )));
                }

                sqlx::query("INSERT INTO nursing_patient (cro) VALUES ($1)")
                    .bind(cro)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| CtflowError::Database(e.to_string()))?;
            }
            RouteDestination::Console => {
                let existing: Option<String> = sqlx::query_scalar(
                    "SELECT status FROM console WHERE cro = $1 FOR UPDATE"
                )
                .bind(cro)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| CtflowError::Database(e.to_string()))?;

                match existing.as_deref() {
                    None => {
                        sqlx::query("INSERT INTO console (cro, status) VALUES ($1, 'Pending')")
                            .bind(cro)
                            .execute(&mut *tx)
                            .await
                            .map_err(|e| CtflowError::Database(e.to_string()))?;
                    }
                    // 召回的患者重新排队，重置原扫描记录
                    Some("Recall") => {
                        sqlx::query(r#"
                            UPDATE console
                            SET status = 'Pending', start_time = NULL, stop_time = NULL,
                                gap = NULL, created_at = NOW()
                            WHERE cro = $1
                        "#)
                        .bind(cro)
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| CtflowError::Database(e.to_string()))?;
                    }
                    Some(_) => {
                        return Err(CtflowError::AlreadyExists(format!(
                            "CRO {} already exists in console queue", cro
                        )));
                    }
                }
            }
        }

        self.update_patient_status(&mut tx, cro, next).await?;

        tx.commit().await.map_err(|e| CtflowError::Database(e.to_string()))?;

        tracing::info!("Routed patient {} to {} queue, status {:?}", cro, destination.as_str(), next);
        Ok(next)
    }

    // ========== 护理队列 ==========

    /// 护理队列：已转入且报告尚未就绪的患者
    pub async fn nursing_queue(&self) -> Result<Vec<Patient>> {
        let rows = sqlx::query_as::<_, DbPatient>(r#"
            SELECT p.* FROM patient_new p
            JOIN nursing_patient n ON n.cro = p.cro
            WHERE n.report_ready_at IS NULL
            ORDER BY n.forwarded_at
        "#)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Patient::from).collect())
    }

    /// 护理准备完成，患者转入已准备状态
    pub async fn nursing_prepare(&self, cro: &str) -> Result<ScanStatus> {
        self.nursing_update(cro, ScanEvent::NursingPrepare, "prepared_at").await
    }

    /// 护理完成，报告就绪
    pub async fn nursing_complete(&self, cro: &str) -> Result<ScanStatus> {
        self.nursing_update(cro, ScanEvent::NursingComplete, "report_ready_at").await
    }

    async fn nursing_update(&self, cro: &str, event: ScanEvent, stamp_column: &str) -> Result<ScanStatus> {
        let mut tx = self.pool.pool().begin().await
            .map_err(|e| CtflowError::Database(e.to_string()))?;

        let current = self.lock_patient_status(&mut tx, cro).await?;
        let next = self.machine.transition(current, &event)?;

        // 护理行可能尚不存在（患者未经接待台转入），此时补插一行
        let sql = format!(
            r#"
            INSERT INTO nursing_patient (cro, {col}) VALUES ($1, NOW())
            ON CONFLICT (cro) DO UPDATE SET {col} = NOW()
            "#,
            col = stamp_column
        );
        sqlx::query(&sql)
            .bind(cro)
            .execute(&mut *tx)
            .await
            .map_err(|e| CtflowError::Database(e.to_string()))?;

        self.update_patient_status(&mut tx, cro, next).await?;

        tx.commit().await.map_err(|e| CtflowError::Database(e.to_string()))?;

        tracing::info!("Nursing {:?} for patient {}, status {:?}", event, cro, next);
        Ok(next)
    }

    // ========== 操作台 ==========

    /// 操作台队列：已送达或待处理的患者
    pub async fn console_queue(&self) -> Result<Vec<Patient>> {
        let rows = sqlx::query_as::<_, DbPatient>(r#"
            SELECT p.* FROM patient_new p
            JOIN console c ON c.cro = p.cro
            WHERE p.scan_status IN ($1, $2)
            ORDER BY c.created_at
        "#)
        .bind(ScanStatus::SentToConsole.code())
        .bind(ScanStatus::PendingAtConsole.code())
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Patient::from).collect())
    }

    /// 技师记录扫描执行结果
    ///
    /// 在同一事务内完成：扫描记录落表、患者 scan_status /
    /// examination_id / scan_date 更新。目标状态由调用方根据
    /// 文本状态映射得出。
    pub async fn record_console_entry(&self, entry: &NewConsoleEntry, target: ScanStatus) -> Result<ConsoleEntry> {
        let event = ScanEvent::for_console_status(target).ok_or_else(|| {
            CtflowError::Validation(format!("Unsupported console status '{}'", entry.status))
        })?;

        let mut tx = self.pool.pool().begin().await
            .map_err(|e| CtflowError::Database(e.to_string()))?;

        let current = self.lock_patient_status(&mut tx, &entry.cro).await?;
        let next = self.machine.transition(current, &event)?;

        let console_status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM console WHERE cro = $1 FOR UPDATE"
        )
        .bind(&entry.cro)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        match console_status.as_deref() {
            None => {
                return Err(CtflowError::NotFound(format!(
                    "CRO {} was never sent to console", entry.cro
                )));
            }
            Some("Complete") => {
                return Err(CtflowError::AlreadyExists(format!(
                    "Scan for CRO {} already recorded", entry.cro
                )));
            }
            Some(_) => {}
        }

        let db_entry = sqlx::query_as::<_, DbConsoleEntry>(r#"
            UPDATE console
            SET examination_id = $2, technician = $3, start_time = $4, stop_time = $5,
                gap = $6, number_films = $7, number_scans = $8, issue_cd = $9,
                remark = $10, status = $11
            WHERE cro = $1
            RETURNING *
        "#)
        .bind(&entry.cro)
        .bind(&entry.examination_id)
        .bind(&entry.technician)
        .bind(entry.start_time)
        .bind(entry.stop_time)
        .bind(&entry.gap)
        .bind(entry.number_films)
        .bind(entry.number_scans)
        .bind(&entry.issue_cd)
        .bind(&entry.remark)
        .bind(&entry.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        sqlx::query(r#"
            UPDATE patient_new
            SET scan_status = $2, examination_id = $3, scan_date = $4, updated_at = NOW()
            WHERE cro = $1
        "#)
        .bind(&entry.cro)
        .bind(next.code())
        .bind(&entry.examination_id)
        .bind(entry.scan_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        tx.commit().await.map_err(|e| CtflowError::Database(e.to_string()))?;

        tracing::info!("Recorded console entry for {} with status {}", entry.cro, entry.status);
        Ok(db_entry.into())
    }

    /// 根据CRO查找扫描记录
    pub async fn get_console_entry(&self, cro: &str) -> Result<Option<ConsoleEntry>> {
        let result = sqlx::query_as::<_, DbConsoleEntry>(
            "SELECT * FROM console WHERE cro = $1"
        )
        .bind(cro)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(result.map(ConsoleEntry::from))
    }

    // ========== 医生阶段 ==========

    /// 医生队列：扫描完成且尚未出报告的患者
    pub async fn doctor_queue(&self) -> Result<Vec<Patient>> {
        let rows = sqlx::query_as::<_, DbPatient>(r#"
            SELECT * FROM patient_new
            WHERE scan_status = $1 AND report_date IS NULL
            ORDER BY scan_date, id
        "#)
        .bind(ScanStatus::Complete.code())
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Patient::from).collect())
    }

    /// 医生出具报告
    pub async fn record_doctor_report(&self, cro: &str, report_date: NaiveDate) -> Result<()> {
        let mut tx = self.pool.pool().begin().await
            .map_err(|e| CtflowError::Database(e.to_string()))?;

        let current = self.lock_patient_status(&mut tx, cro).await?;
        if current != ScanStatus::Complete {
            return Err(CtflowError::Validation(format!(
                "Cannot report CRO {} in status {}", cro, current.as_str()
            )));
        }

        sqlx::query(
            "UPDATE patient_new SET report_date = $2, updated_at = NOW() WHERE cro = $1"
        )
        .bind(cro)
        .bind(report_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        tx.commit().await.map_err(|e| CtflowError::Database(e.to_string()))?;

        tracing::info!("Recorded report for patient {} on {}", cro, report_date);
        Ok(())
    }

    // ========== 维度表 ==========

    /// 医生列表
    pub async fn get_doctors(&self) -> Result<Vec<Doctor>> {
        let rows = sqlx::query_as::<_, DbDoctor>("SELECT * FROM doctor ORDER BY name")
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Doctor::from).collect())
    }

    /// 医院列表
    pub async fn get_hospitals(&self) -> Result<Vec<Hospital>> {
        let rows = sqlx::query_as::<_, DbHospital>("SELECT * FROM hospital ORDER BY name")
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Hospital::from).collect())
    }

    /// 时段列表
    pub async fn get_time_slots(&self) -> Result<Vec<TimeSlot>> {
        let rows = sqlx::query_as::<_, DbTimeSlot>("SELECT * FROM time_slot2 ORDER BY from_time")
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(TimeSlot::from).collect())
    }

    // ========== 库存 ==========

    /// 库存列表
    pub async fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, DbInventoryItem>("SELECT * FROM inventory ORDER BY item_name")
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    /// 新增库存物品
    pub async fn add_inventory_item(&self, item: &NewInventoryItem) -> Result<InventoryItem> {
        let row = sqlx::query_as::<_, DbInventoryItem>(r#"
            INSERT INTO inventory (id, item_name, category, quantity, reorder_level, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
        "#)
        .bind(Uuid::new_v4())
        .bind(&item.item_name)
        .bind(&item.category)
        .bind(item.quantity)
        .bind(item.reorder_level)
        .bind(item.unit_price)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(row.into())
    }

    /// 调整库存数量，不允许调成负数
    pub async fn adjust_inventory(&self, id: Uuid, delta: i32) -> Result<InventoryItem> {
        let row = sqlx::query_as::<_, DbInventoryItem>(r#"
            UPDATE inventory
            SET quantity = quantity + $2, updated_at = NOW()
            WHERE id = $1 AND quantity + $2 >= 0
            RETURNING *
        "#)
        .bind(id)
        .bind(delta)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        match row {
            Some(row) => {
                let item: InventoryItem = row.into();
                if item.quantity <= item.reorder_level {
                    tracing::warn!("Inventory item {} at or below reorder level", item.item_name);
                }
                Ok(item)
            }
            None => {
                // 区分物品不存在与库存不足
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS(SELECT 1 FROM inventory WHERE id = $1)"
                )
                .bind(id)
                .fetch_one(self.pool.pool())
                .await
                .map_err(|e| CtflowError::Database(e.to_string()))?;

                if exists {
                    Err(CtflowError::Validation(format!(
                        "Adjustment of {} would make inventory negative", delta
                    )))
                } else {
                    Err(CtflowError::NotFound(format!("Inventory item {} not found", id)))
                }
            }
        }
    }

    // ========== 报表行集 ==========

    /// 日期范围内的收入报表行
    pub async fn revenue_rows(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<RevenueRow>> {
        let rows = sqlx::query(r#"
            SELECT cro, category, total_scans, amount FROM patient_new
            WHERE registration_date BETWEEN $1 AND $2
        "#)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| RevenueRow {
                cro: row.get("cro"),
                category: row.get("category"),
                scans: row.get("total_scans"),
                amount: row.get("amount"),
            })
            .collect())
    }

    /// 日期范围内的医院维度报表行
    pub async fn hospital_rows(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<HospitalRow>> {
        let rows = sqlx::query(r#"
            SELECT COALESCE(h.name, 'Walk-in') AS hospital, p.amount
            FROM patient_new p
            LEFT JOIN hospital h ON h.id = p.hospital_id
            WHERE p.registration_date BETWEEN $1 AND $2
        "#)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| HospitalRow {
                hospital: row.get("hospital"),
                amount: row.get("amount"),
            })
            .collect())
    }

    /// 指定日期的待处理/已完成患者列表
    pub async fn patients_by_completion(&self, date: NaiveDate, completed: bool) -> Result<Vec<Patient>> {
        let sql = if completed {
            "SELECT * FROM patient_new WHERE registration_date = $1 AND scan_status = $2 ORDER BY id"
        } else {
            "SELECT * FROM patient_new WHERE registration_date = $1 AND scan_status <> $2 ORDER BY id"
        };

        let rows = sqlx::query_as::<_, DbPatient>(sql)
            .bind(date)
            .bind(ScanStatus::Complete.code())
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Patient::from).collect())
    }

    // ========== 内部辅助 ==========

    /// 锁定患者行并读取当前状态
    async fn lock_patient_status(&self, tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, cro: &str) -> Result<ScanStatus> {
        let code: Option<i16> = sqlx::query_scalar(
            "SELECT scan_status FROM patient_new WHERE cro = $1 FOR UPDATE"
        )
        .bind(cro)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        match code {
            Some(code) => Ok(ScanStatus::from_code(code).unwrap_or(ScanStatus::Registered)),
            None => Err(CtflowError::NotFound(format!("Patient with CRO {} not found", cro))),
        }
    }

    async fn update_patient_status(&self, tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, cro: &str, status: ScanStatus) -> Result<()> {
        sqlx::query(
            "UPDATE patient_new SET scan_status = $2, updated_at = NOW() WHERE cro = $1"
        )
        .bind(cro)
        .bind(status.code())
        .execute(&mut **tx)
        .await
        .map_err(|e| CtflowError::Database(e.to_string()))?;

        Ok(())
    }
}
