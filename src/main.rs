// ==========================================
// 创伤急救数据导入系统 - CLI 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 创伤登记九表批量导入（先校验后提交）
// ==========================================

use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use trauma_registry::{logging, RegistryImporter, SqliteRegistryRepository};

fn run() -> Result<bool> {
    let args: Vec<String> = std::env::args().collect();
    let (file_path, db_path) = match args.as_slice() {
        [_, file, db] => (file.clone(), db.clone()),
        [_, file] => (file.clone(), "trauma_registry.db".to_string()),
        _ => {
            bail!("用法: trauma-registry <导入文件.xlsx|.csv> [数据库路径]");
        }
    };

    tracing::info!("==================================================");
    tracing::info!("{}", trauma_registry::APP_NAME);
    tracing::info!("系统版本: {}", trauma_registry::VERSION);
    tracing::info!("==================================================");
    tracing::info!("使用数据库: {}", db_path);

    let repository =
        SqliteRegistryRepository::new(&db_path).context("无法初始化数据库")?;
    let importer = RegistryImporter::new(repository);

    let report = importer
        .import_file(&file_path)
        .with_context(|| format!("导入失败: {}", file_path))?;

    // 报告以 JSON 输出，供上层系统或人工查阅
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.success)
}

fn main() -> ExitCode {
    logging::init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
