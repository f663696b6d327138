// ==========================================
// 创伤急救数据导入系统 - 批次导入编排
// ==========================================
// 流程: 解析 -> 九表逐一校验暂存 -> 零错误才开事务整批落库
// 状态机: PARSING -> VALIDATING -> COMMITTING -> COMMITTED
//                              \-> ROLLED_BACK（存在任何校验错误）
// ==========================================

use std::collections::HashSet;
use std::time::Instant;

use tracing::{info, warn};

use crate::domain::records::StagedBatch;
use crate::domain::report::{
    BatchReport, BatchState, ImportBatch, ImportOutcome, ImportStatus, TableReport,
    ValidationError, ValidationResult,
};
use crate::importer::derivation::{DerivationService, Geocoder, NoopGeocoder};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::tables::{
    admission_vitals, discharge_vitals, gcs_score, injury_record, intervention_extra,
    intervention_time, iss_injury, patient, rts_score,
};
use crate::repository::{CommitSummary, RegistryRepository};

/// 单表扫描产物，落库前的中间结果
struct TableStage {
    table_name: &'static str,
    table_label: &'static str,
    staged_count: usize,
    errors: Vec<ValidationError>,
}

impl TableStage {
    fn new<T>(
        table_name: &'static str,
        table_label: &'static str,
        scan: &crate::importer::tables::TableScan<T>,
    ) -> Self {
        // 错误信息统一加 [表标签] 前缀，整批汇总后仍可辨认来源
        let errors = scan
            .errors
            .iter()
            .map(|e| {
                let mut e = e.clone();
                e.message = format!("[{}] {}", table_label, e.message);
                e
            })
            .collect();
        Self {
            table_name,
            table_label,
            staged_count: scan.records.len(),
            errors,
        }
    }

    fn validation_result(&self) -> ValidationResult {
        let message = if self.errors.is_empty() {
            format!("数据验证通过，共 {} 条有效记录", self.staged_count)
        } else {
            format!("数据验证失败，共发现 {} 个错误", self.errors.len())
        };
        ValidationResult::from_errors(self.errors.clone(), message)
    }
}

// ==========================================
// RegistryImporter - 九表批量导入器
// ==========================================
pub struct RegistryImporter<R: RegistryRepository> {
    repository: R,
    derivation: DerivationService,
    geocoder: Box<dyn Geocoder>,
}

impl<R: RegistryRepository> RegistryImporter<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            derivation: DerivationService,
            geocoder: Box::new(NoopGeocoder),
        }
    }

    /// 替换地理编码实现（默认不做经纬度解析）
    pub fn with_geocoder(mut self, geocoder: Box<dyn Geocoder>) -> Self {
        self.geocoder = geocoder;
        self
    }

    /// 导入一个批次文件（.xlsx/.xls/.csv，单工作表）
    ///
    /// 校验错误不返回 Err: 带着全部错误明细的失败报告返回 Ok。
    /// Err 仅用于文件/数据库层面的流程性故障。
    pub fn import_file(&self, file_path: &str) -> ImportResult<BatchReport> {
        let started = Instant::now();
        let mut batch = ImportBatch::new(file_path);
        info!(
            batch_id = %batch.batch_id,
            file = file_path,
            state = %batch.state,
            "开始导入批次"
        );

        // ===== 解析阶段 =====
        let sheet = UniversalFileParser.parse(file_path)?;
        info!(
            batch_id = %batch.batch_id,
            columns = sheet.headers.len(),
            rows = sheet.rows.len(),
            "文件解析完成"
        );

        // 只有表头、没有任何数据行: 按系统性错误整批拒绝
        if sheet.rows.is_empty() {
            batch.state = BatchState::RolledBack;
            warn!(
                batch_id = %batch.batch_id,
                state = %batch.state,
                "文件没有数据行，未导入任何数据"
            );
            let err = ValidationError::systemic(
                "文件",
                "Excel文件中没有数据行（第2行应为第一条数据）",
            );
            return Ok(BatchReport {
                batch_id: batch.batch_id,
                success: false,
                all_valid: false,
                total_error_count: 1,
                all_errors: vec![err],
                tables: Vec::new(),
                message: "数据验证失败，未导入任何数据。共发现 1 个错误".to_string(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }

        // ===== 校验阶段 =====
        batch.state = BatchState::Validating;

        // 患者主表先扫，子表的存在性检查覆盖"库内已有 + 本批新增"
        let patient_scan = patient::scan(&sheet);
        let mut known_patients: HashSet<i64> = self.repository.patient_ids()?;
        known_patients.extend(patient_scan.records.iter().map(|p| p.patient_id));

        let injury_scan = injury_record::scan(&sheet, &known_patients);
        let gcs_scan = gcs_score::scan(&sheet, &known_patients);
        let rts_scan = rts_score::scan(&sheet, &known_patients);
        let admission_scan = admission_vitals::scan(&sheet, &known_patients);
        let discharge_scan = discharge_vitals::scan(&sheet, &known_patients);
        let time_scan = intervention_time::scan(&sheet, &known_patients);
        let extra_scan = intervention_extra::scan(&sheet, &known_patients);
        let iss_scan = iss_injury::scan(&sheet, &known_patients);

        let stages = vec![
            TableStage::new(patient::TABLE_NAME, patient::TABLE_LABEL, &patient_scan),
            TableStage::new(injury_record::TABLE_NAME, injury_record::TABLE_LABEL, &injury_scan),
            TableStage::new(gcs_score::TABLE_NAME, gcs_score::TABLE_LABEL, &gcs_scan),
            TableStage::new(rts_score::TABLE_NAME, rts_score::TABLE_LABEL, &rts_scan),
            TableStage::new(
                admission_vitals::TABLE_NAME,
                admission_vitals::TABLE_LABEL,
                &admission_scan,
            ),
            TableStage::new(
                discharge_vitals::TABLE_NAME,
                discharge_vitals::TABLE_LABEL,
                &discharge_scan,
            ),
            TableStage::new(
                intervention_time::TABLE_NAME,
                intervention_time::TABLE_LABEL,
                &time_scan,
            ),
            TableStage::new(
                intervention_extra::TABLE_NAME,
                intervention_extra::TABLE_LABEL,
                &extra_scan,
            ),
            TableStage::new(iss_injury::TABLE_NAME, iss_injury::TABLE_LABEL, &iss_scan),
        ];

        let total_error_count: usize = stages.iter().map(|s| s.errors.len()).sum();

        // ===== 任一表有错: 整批放弃 =====
        if total_error_count > 0 {
            batch.state = BatchState::RolledBack;
            warn!(
                batch_id = %batch.batch_id,
                errors = total_error_count,
                state = %batch.state,
                "批次存在校验错误，未导入任何数据"
            );

            let all_errors: Vec<ValidationError> =
                stages.iter().flat_map(|s| s.errors.clone()).collect();
            let tables = stages
                .iter()
                .map(|s| {
                    let validation = s.validation_result();
                    TableReport {
                        table_name: s.table_name.to_string(),
                        table_label: s.table_label.to_string(),
                        success: false,
                        valid: validation.valid,
                        error_count: validation.error_count,
                        import: ImportOutcome::rolled_back(s.staged_count),
                        validation,
                    }
                })
                .collect();

            return Ok(BatchReport {
                batch_id: batch.batch_id,
                success: false,
                all_valid: false,
                total_error_count,
                all_errors,
                tables,
                message: format!(
                    "数据验证失败，未导入任何数据。共发现 {} 个错误",
                    total_error_count
                ),
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }

        // ===== 提交阶段 =====
        batch.state = BatchState::Committing;
        info!(batch_id = %batch.batch_id, state = %batch.state, "校验通过，开始落库");

        let mut injury_records = injury_scan.records;
        self.derivation
            .enrich_injury_records(&mut injury_records, self.geocoder.as_ref());

        let staged = StagedBatch {
            patients: patient_scan.records,
            injury_records,
            gcs_scores: gcs_scan.records,
            rts_scores: rts_scan.records,
            admission_vitals: admission_scan.records,
            discharge_vitals: discharge_scan.records,
            intervention_times: time_scan.records,
            intervention_extras: extra_scan.records,
            iss_injuries: iss_scan.records,
        };
        let total_staged = staged.total_staged();

        let summary = match self.repository.commit_batch(&staged) {
            Ok(summary) => summary,
            Err(e) => {
                batch.state = BatchState::RolledBack;
                warn!(
                    batch_id = %batch.batch_id,
                    state = %batch.state,
                    error = %e,
                    "落库失败，事务已回滚"
                );
                return Err(e.into());
            }
        };

        batch.state = BatchState::Committed;
        info!(
            batch_id = %batch.batch_id,
            state = %batch.state,
            inserted = summary.total_inserted(),
            updated = summary.total_updated(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "批次导入完成"
        );

        let tables = stages
            .iter()
            .map(|s| {
                let validation = s.validation_result();
                let import = commit_outcome(&summary, s.table_name);
                TableReport {
                    table_name: s.table_name.to_string(),
                    table_label: s.table_label.to_string(),
                    success: true,
                    valid: true,
                    error_count: 0,
                    validation,
                    import,
                }
            })
            .collect();

        Ok(BatchReport {
            batch_id: batch.batch_id,
            success: true,
            all_valid: true,
            total_error_count: 0,
            all_errors: Vec::new(),
            tables,
            message: format!(
                "导入成功，共导入 {} 条记录（新增 {}，更新 {}）",
                total_staged,
                summary.total_inserted(),
                summary.total_updated()
            ),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

fn commit_outcome(summary: &CommitSummary, table_name: &str) -> ImportOutcome {
    let (inserted, updated) = summary
        .table(table_name)
        .map(|t| (t.inserted, t.updated))
        .unwrap_or((0, 0));
    ImportOutcome {
        success: true,
        success_count: inserted + updated,
        insert_count: inserted,
        update_count: updated,
        failed_count: 0,
        status: ImportStatus::Success,
        message: format!("导入完成: 新增 {} 条，更新 {} 条", inserted, updated),
    }
}
