// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 导入错误明细走报告返回，控制台日志只记录批次状态流转
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

// 默认过滤: 本库 info（批次状态流转），第三方库只留 warn
const DEFAULT_DIRECTIVES: &str = "warn,trauma_registry=info";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: warn,trauma_registry=info）
///   例如: RUST_LOG=trauma_registry::importer=debug 跟踪单表扫描
///
/// # 示例
/// ```no_run
/// use trauma_registry::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("trauma_registry=debug"))
        .with_test_writer()
        .try_init();
}
