// ==========================================
// 创伤急救数据导入系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 校验错误走 ValidationError 累积通道，此处为流程级错误
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 提交阶段错误 =====
    #[error("批次存在校验错误（共 {0} 条），已放弃落库")]
    ValidationRejected(usize),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ===== 仓储错误 =====
    #[error(transparent)]
    Repository(#[from] crate::repository::RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseTransactionError(err.to_string())
    }
}

/// 导入模块统一结果类型
pub type ImportResult<T> = Result<T, ImportError>;
