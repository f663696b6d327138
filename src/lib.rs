// ==========================================
// 创伤急救数据导入系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 创伤登记九表批量导入（先校验后提交）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BodyRegion, InjuryCause, Season, TimePeriod};

// 领域实体
pub use domain::{
    AdmissionVitals, DischargeVitals, GcsScore, InjuryRecord, InterventionExtra,
    InterventionTime, IssInjury, Patient, RtsScore,
};

// 导入报告
pub use domain::report::{
    BatchReport, ImportOutcome, ImportStatus, TableReport, ValidationError, ValidationResult,
};

// 导入编排
pub use importer::{ImportError, ImportResult, RegistryImporter};

// 仓储
pub use repository::{RegistryRepository, SqliteRegistryRepository};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "创伤急救数据导入系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
