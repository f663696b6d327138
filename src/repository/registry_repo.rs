// ==========================================
// 创伤急救数据导入系统 - 登记表仓储
// ==========================================
// 职责: 九张登记表的查询与整批落库（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 落库走单个事务: 任一表失败则整批回滚
// ==========================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::{Deserialize, Serialize};

use crate::db::{initialize_schema, open_sqlite_connection};
use crate::domain::records::{
    AdmissionVitals, DischargeVitals, GcsScore, InjuryRecord, InterventionExtra,
    InterventionTime, IssInjury, Patient, RtsScore, StagedBatch,
};
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// 落库汇总
// ==========================================

/// 单表落库汇总（新增/更新计数）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCommit {
    pub table_name: String,
    pub inserted: usize,
    pub updated: usize,
}

/// 整批落库汇总，表顺序与导入顺序一致
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitSummary {
    pub tables: Vec<TableCommit>,
}

impl CommitSummary {
    pub fn table(&self, table_name: &str) -> Option<&TableCommit> {
        self.tables.iter().find(|t| t.table_name == table_name)
    }

    pub fn total_inserted(&self) -> usize {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    pub fn total_updated(&self) -> usize {
        self.tables.iter().map(|t| t.updated).sum()
    }
}

// ==========================================
// RegistryRepository - 登记表仓储接口
// ==========================================
/// 登记表仓储接口
/// 职责: 屏蔽 SQLite 细节，供编排层做存在性检查与整批提交
pub trait RegistryRepository {
    /// 库内已有的全部患者ID
    fn patient_ids(&self) -> RepositoryResult<HashSet<i64>>;

    /// 整批落库（单事务，失败整批回滚）
    fn commit_batch(&self, staged: &StagedBatch) -> RepositoryResult<CommitSummary>;
}

// ==========================================
// SqliteRegistryRepository
// ==========================================
pub struct SqliteRegistryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRegistryRepository {
    /// 打开数据库文件并保证建表
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例（测试常用内存库）
    pub fn from_connection(conn: Connection) -> RepositoryResult<Self> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按患者ID查单表现存行数与主键，0 行走 INSERT，1 行走 UPDATE，多行为数据损坏
    fn existing_row_id(
        tx: &Transaction,
        table: &str,
        pk_column: &str,
        patient_id: i64,
    ) -> RepositoryResult<Option<i64>> {
        let count: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE patient_id = ?1", table),
            params![patient_id],
            |row| row.get(0),
        )?;
        match count {
            0 => Ok(None),
            1 => {
                let id: i64 = tx.query_row(
                    &format!(
                        "SELECT {} FROM {} WHERE patient_id = ?1",
                        pk_column, table
                    ),
                    params![patient_id],
                    |row| row.get(0),
                )?;
                Ok(Some(id))
            }
            _ => Err(RepositoryError::DuplicateRows {
                table: table.to_string(),
                patient_id,
            }),
        }
    }

    fn upsert_patients_tx(tx: &Transaction, records: &[Patient]) -> RepositoryResult<TableCommit> {
        let mut commit = TableCommit {
            table_name: "patient".to_string(),
            inserted: 0,
            updated: 0,
        };
        for p in records {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT patient_id FROM patient WHERE patient_id = ?1",
                    params![p.patient_id],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                tx.execute(
                    r#"
                    UPDATE patient
                    SET name = ?2, gender = ?3, age = ?4, is_green_channel = ?5,
                        height = ?6, weight = ?7
                    WHERE patient_id = ?1
                    "#,
                    params![
                        p.patient_id,
                        p.name,
                        p.gender,
                        p.age,
                        p.is_green_channel,
                        p.height,
                        p.weight,
                    ],
                )?;
                commit.updated += 1;
            } else {
                tx.execute(
                    r#"
                    INSERT INTO patient (
                        patient_id, name, gender, age, is_green_channel, height, weight
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                    params![
                        p.patient_id,
                        p.name,
                        p.gender,
                        p.age,
                        p.is_green_channel,
                        p.height,
                        p.weight,
                    ],
                )?;
                commit.inserted += 1;
            }
        }
        Ok(commit)
    }

    fn upsert_injury_records_tx(
        tx: &Transaction,
        records: &[InjuryRecord],
    ) -> RepositoryResult<TableCommit> {
        let mut commit = TableCommit {
            table_name: "injury_record".to_string(),
            inserted: 0,
            updated: 0,
        };
        for r in records {
            let season = r.season.map(|s| s.code());
            let time_period = r.time_period.map(|t| t.code());
            let cause = r.injury_cause_category.map(|c| c.code());
            match Self::existing_row_id(tx, "injury_record", "injury_id", r.patient_id)? {
                Some(id) => {
                    tx.execute(
                        r#"
                        UPDATE injury_record
                        SET patient_id = ?2, admission_date = ?3, season = ?4,
                            admission_time = ?5, time_period = ?6, arrival_method = ?7,
                            injury_location_desc = ?8, longitude = ?9, latitude = ?10,
                            station_name = ?11, injury_cause_category = ?12,
                            injury_cause_detail = ?13
                        WHERE injury_id = ?1
                        "#,
                        params![
                            id,
                            r.patient_id,
                            r.admission_date,
                            season,
                            r.admission_time,
                            time_period,
                            r.arrival_method,
                            r.injury_location_desc,
                            r.longitude,
                            r.latitude,
                            r.station_name,
                            cause,
                            r.injury_cause_detail,
                        ],
                    )?;
                    commit.updated += 1;
                }
                None => {
                    tx.execute(
                        r#"
                        INSERT INTO injury_record (
                            patient_id, admission_date, season, admission_time, time_period,
                            arrival_method, injury_location_desc, longitude, latitude,
                            station_name, injury_cause_category, injury_cause_detail
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                        "#,
                        params![
                            r.patient_id,
                            r.admission_date,
                            season,
                            r.admission_time,
                            time_period,
                            r.arrival_method,
                            r.injury_location_desc,
                            r.longitude,
                            r.latitude,
                            r.station_name,
                            cause,
                            r.injury_cause_detail,
                        ],
                    )?;
                    commit.inserted += 1;
                }
            }
        }
        Ok(commit)
    }

    fn upsert_gcs_scores_tx(
        tx: &Transaction,
        records: &[GcsScore],
    ) -> RepositoryResult<TableCommit> {
        let mut commit = TableCommit {
            table_name: "gcs_score".to_string(),
            inserted: 0,
            updated: 0,
        };
        for g in records {
            match Self::existing_row_id(tx, "gcs_score", "gcs_id", g.patient_id)? {
                Some(id) => {
                    tx.execute(
                        r#"
                        UPDATE gcs_score
                        SET patient_id = ?2, eye_opening = ?3, verbal_response = ?4,
                            motor_response = ?5, total_score = ?6, eye_description = ?7,
                            verbal_description = ?8, motor_description = ?9,
                            consciousness_level = ?10
                        WHERE gcs_id = ?1
                        "#,
                        params![
                            id,
                            g.patient_id,
                            g.eye_opening,
                            g.verbal_response,
                            g.motor_response,
                            g.total_score,
                            g.eye_description,
                            g.verbal_description,
                            g.motor_description,
                            g.consciousness_level,
                        ],
                    )?;
                    commit.updated += 1;
                }
                None => {
                    tx.execute(
                        r#"
                        INSERT INTO gcs_score (
                            patient_id, eye_opening, verbal_response, motor_response,
                            total_score, eye_description, verbal_description,
                            motor_description, consciousness_level
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                        "#,
                        params![
                            g.patient_id,
                            g.eye_opening,
                            g.verbal_response,
                            g.motor_response,
                            g.total_score,
                            g.eye_description,
                            g.verbal_description,
                            g.motor_description,
                            g.consciousness_level,
                        ],
                    )?;
                    commit.inserted += 1;
                }
            }
        }
        Ok(commit)
    }

    fn upsert_rts_scores_tx(
        tx: &Transaction,
        records: &[RtsScore],
    ) -> RepositoryResult<TableCommit> {
        let mut commit = TableCommit {
            table_name: "rts_score".to_string(),
            inserted: 0,
            updated: 0,
        };
        for r in records {
            match Self::existing_row_id(tx, "rts_score", "rts_id", r.patient_id)? {
                Some(id) => {
                    tx.execute(
                        r#"
                        UPDATE rts_score
                        SET patient_id = ?2, gcs_score = ?3, sbp_score = ?4,
                            rr_score = ?5, total_score = ?6
                        WHERE rts_id = ?1
                        "#,
                        params![
                            id,
                            r.patient_id,
                            r.gcs_score,
                            r.sbp_score,
                            r.rr_score,
                            r.total_score,
                        ],
                    )?;
                    commit.updated += 1;
                }
                None => {
                    tx.execute(
                        r#"
                        INSERT INTO rts_score (
                            patient_id, gcs_score, sbp_score, rr_score, total_score
                        ) VALUES (?1, ?2, ?3, ?4, ?5)
                        "#,
                        params![
                            r.patient_id,
                            r.gcs_score,
                            r.sbp_score,
                            r.rr_score,
                            r.total_score,
                        ],
                    )?;
                    commit.inserted += 1;
                }
            }
        }
        Ok(commit)
    }

    fn upsert_admission_vitals_tx(
        tx: &Transaction,
        records: &[AdmissionVitals],
    ) -> RepositoryResult<TableCommit> {
        let mut commit = TableCommit {
            table_name: "admission_vitals".to_string(),
            inserted: 0,
            updated: 0,
        };
        for v in records {
            match Self::existing_row_id(tx, "admission_vitals", "id", v.patient_id)? {
                Some(id) => {
                    tx.execute(
                        r#"
                        UPDATE admission_vitals
                        SET patient_id = ?2, systolic_bp = ?3, diastolic_bp = ?4,
                            heart_rate = ?5, respiratory_rate = ?6, medical_history = ?7,
                            temperature = ?8, oxygen_saturation = ?9, consciousness = ?10,
                            skin = ?11, drunk = ?12, pupil = ?13, light_reflex = ?14
                        WHERE id = ?1
                        "#,
                        params![
                            id,
                            v.patient_id,
                            v.systolic_bp,
                            v.diastolic_bp,
                            v.heart_rate,
                            v.respiratory_rate,
                            v.medical_history,
                            v.temperature,
                            v.oxygen_saturation,
                            v.consciousness,
                            v.skin,
                            v.drunk,
                            v.pupil,
                            v.light_reflex,
                        ],
                    )?;
                    commit.updated += 1;
                }
                None => {
                    tx.execute(
                        r#"
                        INSERT INTO admission_vitals (
                            patient_id, systolic_bp, diastolic_bp, heart_rate,
                            respiratory_rate, medical_history, temperature,
                            oxygen_saturation, consciousness, skin, drunk, pupil,
                            light_reflex
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                        "#,
                        params![
                            v.patient_id,
                            v.systolic_bp,
                            v.diastolic_bp,
                            v.heart_rate,
                            v.respiratory_rate,
                            v.medical_history,
                            v.temperature,
                            v.oxygen_saturation,
                            v.consciousness,
                            v.skin,
                            v.drunk,
                            v.pupil,
                            v.light_reflex,
                        ],
                    )?;
                    commit.inserted += 1;
                }
            }
        }
        Ok(commit)
    }

    fn upsert_discharge_vitals_tx(
        tx: &Transaction,
        records: &[DischargeVitals],
    ) -> RepositoryResult<TableCommit> {
        let mut commit = TableCommit {
            table_name: "discharge_vitals".to_string(),
            inserted: 0,
            updated: 0,
        };
        for v in records {
            match Self::existing_row_id(tx, "discharge_vitals", "id", v.patient_id)? {
                Some(id) => {
                    tx.execute(
                        r#"
                        UPDATE discharge_vitals
                        SET patient_id = ?2, temperature = ?3, respiratory_rate = ?4,
                            heart_rate = ?5, systolic_bp = ?6, diastolic_bp = ?7,
                            oxygen_saturation = ?8, total_fluid_volume = ?9,
                            saline_solution = ?10, balanced_solution = ?11,
                            artificial_colloid = ?12, other_fluid = ?13,
                            urine_output = ?14, other_drainage = ?15, blood_loss = ?16
                        WHERE id = ?1
                        "#,
                        params![
                            id,
                            v.patient_id,
                            v.temperature,
                            v.respiratory_rate,
                            v.heart_rate,
                            v.systolic_bp,
                            v.diastolic_bp,
                            v.oxygen_saturation,
                            v.total_fluid_volume,
                            v.saline_solution,
                            v.balanced_solution,
                            v.artificial_colloid,
                            v.other_fluid,
                            v.urine_output,
                            v.other_drainage,
                            v.blood_loss,
                        ],
                    )?;
                    commit.updated += 1;
                }
                None => {
                    tx.execute(
                        r#"
                        INSERT INTO discharge_vitals (
                            patient_id, temperature, respiratory_rate, heart_rate,
                            systolic_bp, diastolic_bp, oxygen_saturation,
                            total_fluid_volume, saline_solution, balanced_solution,
                            artificial_colloid, other_fluid, urine_output,
                            other_drainage, blood_loss
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                        "#,
                        params![
                            v.patient_id,
                            v.temperature,
                            v.respiratory_rate,
                            v.heart_rate,
                            v.systolic_bp,
                            v.diastolic_bp,
                            v.oxygen_saturation,
                            v.total_fluid_volume,
                            v.saline_solution,
                            v.balanced_solution,
                            v.artificial_colloid,
                            v.other_fluid,
                            v.urine_output,
                            v.other_drainage,
                            v.blood_loss,
                        ],
                    )?;
                    commit.inserted += 1;
                }
            }
        }
        Ok(commit)
    }

    fn upsert_intervention_times_tx(
        tx: &Transaction,
        records: &[InterventionTime],
    ) -> RepositoryResult<TableCommit> {
        let mut commit = TableCommit {
            table_name: "intervention_time".to_string(),
            inserted: 0,
            updated: 0,
        };
        for t in records {
            match Self::existing_row_id(tx, "intervention_time", "intervention_id", t.patient_id)? {
                Some(id) => {
                    tx.execute(
                        r#"
                        UPDATE intervention_time
                        SET patient_id = ?2, admission_date = ?3, admission_time = ?4,
                            peripheral = ?5, iv_line = ?6, central_access = ?7,
                            nasal_pipe = ?8, face_mask = ?9, endotracheal_tube = ?10,
                            ventilator = ?11, cpr = ?12, cpr_start_time = ?13,
                            cpr_end_time = ?14, ultrasound = ?15, ct = ?16,
                            tourniquet = ?17, blood_draw = ?18, catheter = ?19,
                            gastric_tube = ?20, transfusion = ?21, transfusion_start = ?22,
                            transfusion_end = ?23, leave_room_date = ?24,
                            leave_room_time = ?25, patient_destination = ?26, death = ?27,
                            death_date = ?28, death_time = ?29
                        WHERE intervention_id = ?1
                        "#,
                        params![
                            id,
                            t.patient_id,
                            t.admission_date,
                            t.admission_time,
                            t.peripheral,
                            t.iv_line,
                            t.central_access,
                            t.nasal_pipe,
                            t.face_mask,
                            t.endotracheal_tube,
                            t.ventilator,
                            t.cpr,
                            t.cpr_start_time,
                            t.cpr_end_time,
                            t.ultrasound,
                            t.ct,
                            t.tourniquet,
                            t.blood_draw,
                            t.catheter,
                            t.gastric_tube,
                            t.transfusion,
                            t.transfusion_start,
                            t.transfusion_end,
                            t.leave_room_date,
                            t.leave_room_time,
                            t.patient_destination,
                            t.death,
                            t.death_date,
                            t.death_time,
                        ],
                    )?;
                    commit.updated += 1;
                }
                None => {
                    tx.execute(
                        r#"
                        INSERT INTO intervention_time (
                            patient_id, admission_date, admission_time, peripheral,
                            iv_line, central_access, nasal_pipe, face_mask,
                            endotracheal_tube, ventilator, cpr, cpr_start_time,
                            cpr_end_time, ultrasound, ct, tourniquet, blood_draw,
                            catheter, gastric_tube, transfusion, transfusion_start,
                            transfusion_end, leave_room_date, leave_room_time,
                            patient_destination, death, death_date, death_time
                        ) VALUES (
                            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                            ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26,
                            ?27, ?28
                        )
                        "#,
                        params![
                            t.patient_id,
                            t.admission_date,
                            t.admission_time,
                            t.peripheral,
                            t.iv_line,
                            t.central_access,
                            t.nasal_pipe,
                            t.face_mask,
                            t.endotracheal_tube,
                            t.ventilator,
                            t.cpr,
                            t.cpr_start_time,
                            t.cpr_end_time,
                            t.ultrasound,
                            t.ct,
                            t.tourniquet,
                            t.blood_draw,
                            t.catheter,
                            t.gastric_tube,
                            t.transfusion,
                            t.transfusion_start,
                            t.transfusion_end,
                            t.leave_room_date,
                            t.leave_room_time,
                            t.patient_destination,
                            t.death,
                            t.death_date,
                            t.death_time,
                        ],
                    )?;
                    commit.inserted += 1;
                }
            }
        }
        Ok(commit)
    }

    fn upsert_intervention_extras_tx(
        tx: &Transaction,
        records: &[InterventionExtra],
    ) -> RepositoryResult<TableCommit> {
        let mut commit = TableCommit {
            table_name: "intervention_extra".to_string(),
            inserted: 0,
            updated: 0,
        };
        for e in records {
            match Self::existing_row_id(tx, "intervention_extra", "id", e.patient_id)? {
                Some(id) => {
                    tx.execute(
                        r#"
                        UPDATE intervention_extra
                        SET patient_id = ?2, oxygen_concentration = ?3,
                            defibrillation = ?4, limb_amputation = ?5,
                            transfusion_reaction = ?6, suspended_red_units = ?7,
                            plasma_units = ?8, platelets_amount = ?9,
                            cryoprecipitate_units = ?10, other_transfusion = ?11,
                            therapeutic_operation = ?12, consultation_dept = ?13,
                            administrative_dept = ?14
                        WHERE id = ?1
                        "#,
                        params![
                            id,
                            e.patient_id,
                            e.oxygen_concentration,
                            e.defibrillation,
                            e.limb_amputation,
                            e.transfusion_reaction,
                            e.suspended_red_units,
                            e.plasma_units,
                            e.platelets_amount,
                            e.cryoprecipitate_units,
                            e.other_transfusion,
                            e.therapeutic_operation,
                            e.consultation_dept,
                            e.administrative_dept,
                        ],
                    )?;
                    commit.updated += 1;
                }
                None => {
                    tx.execute(
                        r#"
                        INSERT INTO intervention_extra (
                            patient_id, oxygen_concentration, defibrillation,
                            limb_amputation, transfusion_reaction, suspended_red_units,
                            plasma_units, platelets_amount, cryoprecipitate_units,
                            other_transfusion, therapeutic_operation, consultation_dept,
                            administrative_dept
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                        "#,
                        params![
                            e.patient_id,
                            e.oxygen_concentration,
                            e.defibrillation,
                            e.limb_amputation,
                            e.transfusion_reaction,
                            e.suspended_red_units,
                            e.plasma_units,
                            e.platelets_amount,
                            e.cryoprecipitate_units,
                            e.other_transfusion,
                            e.therapeutic_operation,
                            e.consultation_dept,
                            e.administrative_dept,
                        ],
                    )?;
                    commit.inserted += 1;
                }
            }
        }
        Ok(commit)
    }

    fn upsert_iss_injuries_tx(
        tx: &Transaction,
        records: &[IssInjury],
    ) -> RepositoryResult<TableCommit> {
        let mut commit = TableCommit {
            table_name: "iss_injury".to_string(),
            inserted: 0,
            updated: 0,
        };
        for i in records {
            match Self::existing_row_id(tx, "iss_injury", "injury_id", i.patient_id)? {
                Some(id) => {
                    tx.execute(
                        r#"
                        UPDATE iss_injury
                        SET patient_id = ?2, head_neck = ?3, head_neck_details = ?4,
                            face = ?5, face_details = ?6, chest = ?7, chest_details = ?8,
                            abdomen = ?9, abdomen_details = ?10, limbs = ?11,
                            limbs_details = ?12, surface = ?13, surface_details = ?14,
                            iss_score = ?15, has_details = ?16
                        WHERE injury_id = ?1
                        "#,
                        params![
                            id,
                            i.patient_id,
                            i.head_neck,
                            i.head_neck_details,
                            i.face,
                            i.face_details,
                            i.chest,
                            i.chest_details,
                            i.abdomen,
                            i.abdomen_details,
                            i.limbs,
                            i.limbs_details,
                            i.surface,
                            i.surface_details,
                            i.iss_score,
                            i.has_details,
                        ],
                    )?;
                    commit.updated += 1;
                }
                None => {
                    tx.execute(
                        r#"
                        INSERT INTO iss_injury (
                            patient_id, head_neck, head_neck_details, face, face_details,
                            chest, chest_details, abdomen, abdomen_details, limbs,
                            limbs_details, surface, surface_details, iss_score, has_details
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                        "#,
                        params![
                            i.patient_id,
                            i.head_neck,
                            i.head_neck_details,
                            i.face,
                            i.face_details,
                            i.chest,
                            i.chest_details,
                            i.abdomen,
                            i.abdomen_details,
                            i.limbs,
                            i.limbs_details,
                            i.surface,
                            i.surface_details,
                            i.iss_score,
                            i.has_details,
                        ],
                    )?;
                    commit.inserted += 1;
                }
            }
        }
        Ok(commit)
    }
}

impl RegistryRepository for SqliteRegistryRepository {
    fn patient_ids(&self) -> RepositoryResult<HashSet<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT patient_id FROM patient")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<HashSet<i64>, _>>()?;
        Ok(ids)
    }

    fn commit_batch(&self, staged: &StagedBatch) -> RepositoryResult<CommitSummary> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 患者主表先行，子表的外键才能成立
        let mut summary = CommitSummary::default();
        summary.tables.push(Self::upsert_patients_tx(&tx, &staged.patients)?);
        summary
            .tables
            .push(Self::upsert_injury_records_tx(&tx, &staged.injury_records)?);
        summary
            .tables
            .push(Self::upsert_gcs_scores_tx(&tx, &staged.gcs_scores)?);
        summary
            .tables
            .push(Self::upsert_rts_scores_tx(&tx, &staged.rts_scores)?);
        summary
            .tables
            .push(Self::upsert_admission_vitals_tx(&tx, &staged.admission_vitals)?);
        summary
            .tables
            .push(Self::upsert_discharge_vitals_tx(&tx, &staged.discharge_vitals)?);
        summary
            .tables
            .push(Self::upsert_intervention_times_tx(&tx, &staged.intervention_times)?);
        summary
            .tables
            .push(Self::upsert_intervention_extras_tx(&tx, &staged.intervention_extras)?);
        summary
            .tables
            .push(Self::upsert_iss_injuries_tx(&tx, &staged.iss_injuries)?);

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_connection;

    fn repo() -> SqliteRegistryRepository {
        SqliteRegistryRepository::from_connection(open_in_memory_connection().unwrap()).unwrap()
    }

    fn patient(id: i64, age: i64) -> Patient {
        Patient {
            patient_id: id,
            name: None,
            gender: "男".to_string(),
            age,
            is_green_channel: false,
            height: None,
            weight: None,
        }
    }

    #[test]
    fn test_commit_inserts_then_updates() {
        let repo = repo();
        let mut staged = StagedBatch::default();
        staged.patients.push(patient(1, 30));
        staged.gcs_scores.push(GcsScore {
            patient_id: 1,
            eye_opening: Some(4),
            verbal_response: Some(5),
            motor_response: Some(6),
            total_score: Some(15),
            eye_description: None,
            verbal_description: None,
            motor_description: None,
            consciousness_level: Some("意识清楚".to_string()),
        });

        let first = repo.commit_batch(&staged).unwrap();
        assert_eq!(first.total_inserted(), 2);
        assert_eq!(first.total_updated(), 0);

        // 重新导入同一患者: 行数不增，走更新
        staged.patients[0].age = 31;
        let second = repo.commit_batch(&staged).unwrap();
        assert_eq!(second.total_inserted(), 0);
        assert_eq!(second.total_updated(), 2);

        let conn = repo.get_conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM gcs_score", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        let age: i64 = conn
            .query_row("SELECT age FROM patient WHERE patient_id = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(age, 31);
    }

    #[test]
    fn test_duplicate_rows_abort_batch() {
        let repo = repo();
        {
            let conn = repo.get_conn().unwrap();
            conn.execute(
                "INSERT INTO patient (patient_id, gender, age, is_green_channel) VALUES (1, '男', 30, 0)",
                [],
            )
            .unwrap();
            // 人为制造同一患者的两条 GCS 记录
            conn.execute("INSERT INTO gcs_score (patient_id) VALUES (1)", [])
                .unwrap();
            conn.execute("INSERT INTO gcs_score (patient_id) VALUES (1)", [])
                .unwrap();
        }

        let mut staged = StagedBatch::default();
        staged.patients.push(patient(1, 40));
        staged.gcs_scores.push(GcsScore {
            patient_id: 1,
            eye_opening: None,
            verbal_response: None,
            motor_response: None,
            total_score: Some(10),
            eye_description: None,
            verbal_description: None,
            motor_description: None,
            consciousness_level: None,
        });

        let err = repo.commit_batch(&staged).unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateRows { .. }));

        // 事务回滚: 患者年龄保持原值
        let conn = repo.get_conn().unwrap();
        let age: i64 = conn
            .query_row("SELECT age FROM patient WHERE patient_id = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(age, 30);
    }

    #[test]
    fn test_patient_ids_reflects_database() {
        let repo = repo();
        assert!(repo.patient_ids().unwrap().is_empty());

        let mut staged = StagedBatch::default();
        staged.patients.push(patient(3, 20));
        staged.patients.push(patient(7, 50));
        repo.commit_batch(&staged).unwrap();

        let ids = repo.patient_ids().unwrap();
        assert_eq!(ids, HashSet::from([3, 7]));
    }
}
