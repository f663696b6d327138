// ==========================================
// 创伤急救数据导入系统 - 登记表实体
// ==========================================
// 九张登记表的领域实体，全部以 patient_id 为业务键
// 红线: 实体只承载校验通过后的净值，不保留原始单元格文本
// ==========================================

use crate::domain::types::{InjuryCause, Season, TimePeriod};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Patient - 患者基本信息（主表）
// ==========================================
// 其余八张表以 patient_id 引用此表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: i64,            // 序号（业务主键，>0）
    pub name: Option<String>,       // 姓名（可缺省）
    pub gender: String,             // 性别: 男/女
    pub age: i64,                   // 年龄: 0-120
    pub is_green_channel: bool,     // 是否绿色通道
    pub height: Option<f64>,        // 身高 cm（30-250, DECIMAL(5,2)）
    pub weight: Option<f64>,        // 体重 kg（1-500, DECIMAL(5,2)）
}

// ==========================================
// InjuryRecord - 受伤记录
// ==========================================
// season/time_period/经纬度 为派生字段，校验通过后补齐
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjuryRecord {
    pub patient_id: i64,
    pub admission_date: Option<NaiveDate>,       // 接诊日期（严格 yyyy-MM-dd）
    pub season: Option<Season>,                  // 派生: 月份 -> 季节
    pub admission_time: Option<String>,          // 接诊时间（严格 HHMM）
    pub time_period: Option<TimePeriod>,         // 派生: 小时 -> 时段
    pub arrival_method: Option<String>,          // 来院方式
    pub injury_location_desc: Option<String>,    // 创伤发生地（自由文本）
    pub longitude: Option<f64>,                  // 派生: 地理编码（尽力而为）
    pub latitude: Option<f64>,
    pub station_name: Option<String>,            // 120分站站点名称
    pub injury_cause_category: Option<InjuryCause>, // 派生: 受伤原因归类
    pub injury_cause_detail: Option<String>,     // "其他"类保留原文
}

// ==========================================
// GcsScore - GCS评分
// ==========================================
// 睁眼/言语/动作由中文描述解码为数值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcsScore {
    pub patient_id: i64,
    pub eye_opening: Option<i64>,          // 睁眼 0-4
    pub verbal_response: Option<i64>,      // 言语 0-5
    pub motor_response: Option<i64>,       // 动作 0-6
    pub total_score: Option<i64>,          // GCS总分
    pub eye_description: Option<String>,   // 原始中文描述
    pub verbal_description: Option<String>,
    pub motor_description: Option<String>,
    pub consciousness_level: Option<String>, // 派生: 总分 -> 意识水平
}

// ==========================================
// RtsScore - RTS评分
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtsScore {
    pub patient_id: i64,
    pub gcs_score: Option<i64>, // RTS—GCS 分量 0-4
    pub sbp_score: Option<i64>, // 收缩压分量 0-4
    pub rr_score: Option<i64>,  // 呼吸频率分量 0-4
    pub total_score: Option<i64>,
}

// ==========================================
// AdmissionVitals - 患者入室信息
// ==========================================
// 入室生命体征，宽松清洗（缺失/脏值取默认）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionVitals {
    pub patient_id: i64,
    pub systolic_bp: Option<i64>,
    pub diastolic_bp: Option<i64>,
    pub heart_rate: Option<i64>,
    pub respiratory_rate: Option<i64>,
    pub medical_history: Option<String>,  // 既往病史
    pub temperature: Option<f64>,         // 入室体温（仅接受 30.0-45.0）
    pub oxygen_saturation: Option<f64>,   // 指脉氧 %
    pub consciousness: Option<String>,    // 精神意识
    pub skin: Option<String>,
    pub drunk: Option<bool>,              // 醉酒
    pub pupil: Option<String>,            // 瞳孔
    pub light_reflex: Option<String>,     // 对光反射
}

// ==========================================
// DischargeVitals - 患者离室信息
// ==========================================
// 离室生命体征 + 补液/出入量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DischargeVitals {
    pub patient_id: i64,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<i64>,
    pub heart_rate: Option<i64>,
    pub systolic_bp: Option<i64>,
    pub diastolic_bp: Option<i64>,
    pub oxygen_saturation: Option<f64>,
    pub total_fluid_volume: Option<f64>,  // 总补液量 ml
    pub saline_solution: Option<f64>,     // 生理盐水 ml
    pub balanced_solution: Option<f64>,   // 平衡液 ml
    pub artificial_colloid: Option<f64>,  // 人工胶体 ml
    pub other_fluid: Option<f64>,
    pub urine_output: Option<f64>,        // 尿量 ml
    pub other_drainage: Option<f64>,      // 其他引流量 ml
    pub blood_loss: Option<f64>,          // 出血量 ml
}

// ==========================================
// InterventionTime - 干预时间
// ==========================================
// 事件时间统一 HHMM；跨零点事件重编码为 2400+HHMM（如 2500）
// 死亡时间与离室时间不参与跨零点重编码
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionTime {
    pub patient_id: i64,
    pub admission_date: NaiveDate,
    pub admission_time: String,              // HHMM
    pub peripheral: Option<String>,          // 外周
    pub iv_line: Option<String>,             // 深静脉
    pub central_access: Option<String>,      // 骨通道
    pub nasal_pipe: Option<String>,          // 鼻导管
    pub face_mask: Option<String>,           // 面罩
    pub endotracheal_tube: Option<String>,   // 气管插管
    pub ventilator: Option<String>,          // 呼吸机
    pub cpr: Option<String>,                 // 心肺复苏 是/否
    pub cpr_start_time: Option<String>,
    pub cpr_end_time: Option<String>,
    pub ultrasound: Option<String>,          // B超
    pub ct: Option<String>,                  // CT
    pub tourniquet: Option<String>,          // 止血带
    pub blood_draw: Option<String>,          // 采血
    pub catheter: Option<String>,            // 导尿
    pub gastric_tube: Option<String>,        // 胃管
    pub transfusion: Option<String>,         // 输血 是/否
    pub transfusion_start: Option<String>,
    pub transfusion_end: Option<String>,
    pub leave_room_date: Option<NaiveDate>,  // 离开抢救室日期（解析派生）
    pub leave_room_time: Option<String>,
    pub patient_destination: Option<String>, // 病人去向
    pub death: Option<String>,               // 死亡 是/否
    pub death_date: Option<NaiveDate>,
    pub death_time: Option<String>,
}

// ==========================================
// InterventionExtra - 干预补充数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionExtra {
    pub patient_id: i64,
    pub oxygen_concentration: Option<f64>,   // 氧浓度 %（最低）
    pub defibrillation: Option<bool>,        // 除颤
    pub limb_amputation: Option<bool>,       // 肢体离断
    pub transfusion_reaction: Option<bool>,  // 输血反应
    pub suspended_red_units: Option<f64>,    // 悬红 U
    pub plasma_units: Option<f64>,           // 血浆 ml
    pub platelets_amount: Option<f64>,       // 血小板 U
    pub cryoprecipitate_units: Option<f64>,  // 冷沉淀 U
    pub other_transfusion: Option<String>,
    pub therapeutic_operation: Option<String>, // 治疗性操作
    pub consultation_dept: Option<String>,     // 会诊科室
    pub administrative_dept: Option<String>,   // 行政科室
}

// ==========================================
// IssInjury - ISS数据
// ==========================================
// 区域分值为规范化的数字串（"3" 或 "1|3|4"），"0" 存为 None
// 非零分值必须带解码出的详细伤情（*_details）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssInjury {
    pub patient_id: i64,
    pub head_neck: Option<String>,
    pub head_neck_details: Option<String>,
    pub face: Option<String>,
    pub face_details: Option<String>,
    pub chest: Option<String>,
    pub chest_details: Option<String>,
    pub abdomen: Option<String>,
    pub abdomen_details: Option<String>,
    pub limbs: Option<String>,
    pub limbs_details: Option<String>,
    pub surface: Option<String>,
    pub surface_details: Option<String>,
    pub iss_score: Option<i64>, // ISS评分（总分）
    pub has_details: bool,      // 是否解码出任何详细伤情
}

// ==========================================
// StagedBatch - 通过校验的整批暂存记录
// ==========================================
// 九张表的有效记录在内存中聚齐后才允许开事务落库
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagedBatch {
    pub patients: Vec<Patient>,
    pub injury_records: Vec<InjuryRecord>,
    pub gcs_scores: Vec<GcsScore>,
    pub rts_scores: Vec<RtsScore>,
    pub admission_vitals: Vec<AdmissionVitals>,
    pub discharge_vitals: Vec<DischargeVitals>,
    pub intervention_times: Vec<InterventionTime>,
    pub intervention_extras: Vec<InterventionExtra>,
    pub iss_injuries: Vec<IssInjury>,
}

impl StagedBatch {
    /// 暂存记录总数
    pub fn total_staged(&self) -> usize {
        self.patients.len()
            + self.injury_records.len()
            + self.gcs_scores.len()
            + self.rts_scores.len()
            + self.admission_vitals.len()
            + self.discharge_vitals.len()
            + self.intervention_times.len()
            + self.intervention_extras.len()
            + self.iss_injuries.len()
    }
}
