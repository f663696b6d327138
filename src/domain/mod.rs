// ==========================================
// 创伤急救数据导入系统 - 领域模型层
// ==========================================
// 职责: 定义登记表实体、闭合类型、导入报告 DTO
// 红线: 不含数据访问逻辑,不含解析/校验逻辑
// ==========================================

pub mod records;
pub mod report;
pub mod types;

// 重导出核心类型
pub use records::{
    AdmissionVitals, DischargeVitals, GcsScore, InjuryRecord, InterventionExtra,
    InterventionTime, IssInjury, Patient, RtsScore, StagedBatch,
};
pub use report::{
    BatchReport, BatchState, ImportBatch, ImportOutcome, ImportStatus, TableReport,
    ValidationError, ValidationResult,
};
pub use types::{BodyRegion, InjuryCause, Season, TimePeriod};
