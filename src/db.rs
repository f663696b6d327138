// ==========================================
// 创伤急救数据导入系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建库: 九张登记表的 DDL 集中在此
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存库（测试用）并应用统一配置
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建立九张登记表（幂等）
///
/// 患者基本信息为主表，其余八张表以 patient_id 引用之。
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS patient (
            patient_id        INTEGER PRIMARY KEY,
            name              TEXT,
            gender            TEXT NOT NULL,
            age               INTEGER NOT NULL,
            is_green_channel  INTEGER NOT NULL,
            height            REAL,
            weight            REAL
        );

        CREATE TABLE IF NOT EXISTS injury_record (
            injury_id             INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id            INTEGER NOT NULL REFERENCES patient(patient_id),
            admission_date        TEXT,
            season                INTEGER,
            admission_time        TEXT,
            time_period           INTEGER,
            arrival_method        TEXT,
            injury_location_desc  TEXT,
            longitude             REAL,
            latitude              REAL,
            station_name          TEXT,
            injury_cause_category INTEGER,
            injury_cause_detail   TEXT
        );

        CREATE TABLE IF NOT EXISTS gcs_score (
            gcs_id              INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id          INTEGER NOT NULL REFERENCES patient(patient_id),
            eye_opening         INTEGER,
            verbal_response     INTEGER,
            motor_response      INTEGER,
            total_score         INTEGER,
            eye_description     TEXT,
            verbal_description  TEXT,
            motor_description   TEXT,
            consciousness_level TEXT
        );

        CREATE TABLE IF NOT EXISTS rts_score (
            rts_id      INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id  INTEGER NOT NULL REFERENCES patient(patient_id),
            gcs_score   INTEGER,
            sbp_score   INTEGER,
            rr_score    INTEGER,
            total_score INTEGER
        );

        CREATE TABLE IF NOT EXISTS admission_vitals (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id        INTEGER NOT NULL REFERENCES patient(patient_id),
            systolic_bp       INTEGER,
            diastolic_bp      INTEGER,
            heart_rate        INTEGER,
            respiratory_rate  INTEGER,
            medical_history   TEXT,
            temperature       REAL,
            oxygen_saturation REAL,
            consciousness     TEXT,
            skin              TEXT,
            drunk             INTEGER,
            pupil             TEXT,
            light_reflex      TEXT
        );

        CREATE TABLE IF NOT EXISTS discharge_vitals (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id         INTEGER NOT NULL REFERENCES patient(patient_id),
            temperature        REAL,
            respiratory_rate   INTEGER,
            heart_rate         INTEGER,
            systolic_bp        INTEGER,
            diastolic_bp       INTEGER,
            oxygen_saturation  REAL,
            total_fluid_volume REAL,
            saline_solution    REAL,
            balanced_solution  REAL,
            artificial_colloid REAL,
            other_fluid        REAL,
            urine_output       REAL,
            other_drainage     REAL,
            blood_loss         REAL
        );

        CREATE TABLE IF NOT EXISTS intervention_time (
            intervention_id   INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id        INTEGER NOT NULL REFERENCES patient(patient_id),
            admission_date    TEXT,
            admission_time    TEXT,
            peripheral        TEXT,
            iv_line           TEXT,
            central_access    TEXT,
            nasal_pipe        TEXT,
            face_mask         TEXT,
            endotracheal_tube TEXT,
            ventilator        TEXT,
            cpr               TEXT,
            cpr_start_time    TEXT,
            cpr_end_time      TEXT,
            ultrasound        TEXT,
            ct                TEXT,
            tourniquet        TEXT,
            blood_draw        TEXT,
            catheter          TEXT,
            gastric_tube      TEXT,
            transfusion       TEXT,
            transfusion_start TEXT,
            transfusion_end   TEXT,
            leave_room_date   TEXT,
            leave_room_time   TEXT,
            patient_destination TEXT,
            death             TEXT,
            death_date        TEXT,
            death_time        TEXT
        );

        CREATE TABLE IF NOT EXISTS intervention_extra (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id           INTEGER NOT NULL REFERENCES patient(patient_id),
            oxygen_concentration REAL,
            defibrillation       INTEGER,
            limb_amputation      INTEGER,
            transfusion_reaction INTEGER,
            suspended_red_units  REAL,
            plasma_units         REAL,
            platelets_amount     REAL,
            cryoprecipitate_units REAL,
            other_transfusion    TEXT,
            therapeutic_operation TEXT,
            consultation_dept    TEXT,
            administrative_dept  TEXT
        );

        CREATE TABLE IF NOT EXISTS iss_injury (
            injury_id         INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id        INTEGER NOT NULL REFERENCES patient(patient_id),
            head_neck         TEXT,
            head_neck_details TEXT,
            face              TEXT,
            face_details      TEXT,
            chest             TEXT,
            chest_details     TEXT,
            abdomen           TEXT,
            abdomen_details   TEXT,
            limbs             TEXT,
            limbs_details     TEXT,
            surface           TEXT,
            surface_details   TEXT,
            iss_score         INTEGER,
            has_details       INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_bootstrap_idempotent() {
        let conn = open_in_memory_connection().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 9);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let conn = open_in_memory_connection().unwrap();
        initialize_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO gcs_score (patient_id, total_score) VALUES (999, 15)",
            [],
        );
        assert!(result.is_err());
    }
}
