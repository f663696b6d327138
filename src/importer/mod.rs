// ==========================================
// 创伤急救数据导入系统 - 导入层
// ==========================================
// 职责: 文件解析、字段校验、评分解码、时间归一、批次编排
// 红线: 导入层不直接写库，落库统一经由仓储层事务
// ==========================================

pub mod derivation;
pub mod error;
pub mod field_validator;
pub mod file_parser;
pub mod orchestrator;
pub mod score_mapping;
pub mod severity_decoder;
pub mod tables;
pub mod time_normalizer;

// 重导出核心类型
pub use derivation::{DerivationService, Geocoder, NoopGeocoder};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, Sheet, SheetRow, UniversalFileParser};
pub use orchestrator::RegistryImporter;
