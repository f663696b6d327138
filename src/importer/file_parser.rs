// ==========================================
// 创伤急救数据导入系统 - 文件解析器
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 九张表共用同一张工作表，解析一次，各表流水线各取所需列
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

// ==========================================
// Sheet - 统一的表格视图
// ==========================================
// 行号与 Excel 对齐: 表头为第1行，首条数据行为第2行
#[derive(Debug, Clone)]
pub struct Sheet {
    pub headers: Vec<String>,
    header_index: HashMap<String, usize>,
    pub rows: Vec<SheetRow>,
}

#[derive(Debug, Clone)]
pub struct SheetRow {
    pub row_number: usize,
    pub cells: Vec<String>,
}

impl Sheet {
    fn build(headers: Vec<String>, rows: Vec<SheetRow>) -> Self {
        let mut header_index = HashMap::new();
        for (idx, h) in headers.iter().enumerate() {
            // 同名表头以首个为准
            header_index.entry(h.clone()).or_insert(idx);
        }
        Self {
            headers,
            header_index,
            rows,
        }
    }

    /// 精确列名查找
    pub fn column(&self, header: &str) -> Option<usize> {
        self.header_index.get(header).copied()
    }

    /// 包含式列名查找（ISS 详细伤情列定位用），返回全部命中列
    pub fn columns_containing(&self, fragment: &str) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.contains(fragment))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// 缺失的必需列
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }
}

impl SheetRow {
    /// 取单元格文本（trim 后），列越界视为空
    pub fn cell(&self, col: usize) -> &str {
        self.cells.get(col).map(|s| s.as_str()).unwrap_or("")
    }
}

// ==========================================
// CSV 解析
// ==========================================
pub struct CsvParser;

impl CsvParser {
    pub fn parse(&self, path: &Path) -> ImportResult<Sheet> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::CsvParseError("文件无表头行".to_string()));
        }

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let cells: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            // 跳过完全空白的行
            if cells.iter().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(SheetRow {
                row_number: row_idx + 2,
                cells,
            });
        }

        Ok(Sheet::build(headers, rows))
    }
}

// ==========================================
// Excel 解析
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    pub fn parse(&self, path: &Path) -> ImportResult<Sheet> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // open_workbook_auto 按文件内容识别 .xlsx 与旧版 .xls
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        }

        let sheet_name = sheet_names[0].clone();
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let mut range_rows = range.rows();
        let header_row = range_rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无表头行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (row_idx, data_row) in range_rows.enumerate() {
            let cells: Vec<String> = data_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect();

            if cells.iter().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(SheetRow {
                row_number: row_idx + 2,
                cells,
            });
        }

        Ok(Sheet::build(headers, rows))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Sheet> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse(path),
            "xlsx" | "xls" => ExcelParser.parse(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(f, "{}", content).unwrap();
        f
    }

    #[test]
    fn test_csv_parser_headers_and_rows() {
        let f = csv_file("序号,患者性别：,年龄：       \n1,男,35\n2,女,42\n");
        let sheet = CsvParser.parse(f.path()).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.column("序号"), Some(0));
        // 表头 trim 后存储
        assert_eq!(sheet.column("年龄："), Some(2));
        assert_eq!(sheet.rows[0].row_number, 2);
        assert_eq!(sheet.rows[0].cell(sheet.column("患者性别：").unwrap()), "男");
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let f = csv_file("序号,年龄\n1,35\n,\n2,42\n");
        let sheet = CsvParser.parse(f.path()).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        // 空行被跳过，但行号与原文件对齐
        assert_eq!(sheet.rows[1].row_number, 4);
    }

    #[test]
    fn test_parser_file_not_found() {
        let result = CsvParser.parse(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = UniversalFileParser.parse("data.txt");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_columns_containing() {
        let f = csv_file("序号,头颈部损伤—①头部外伤,胸部损伤—③连枷胸\n1,,\n");
        let sheet = CsvParser.parse(f.path()).unwrap();

        assert_eq!(sheet.columns_containing("头部外伤").len(), 1);
        assert!(sheet.columns_containing("腹部").is_empty());
    }

    #[test]
    fn test_missing_columns() {
        let f = csv_file("序号,年龄\n1,35\n");
        let sheet = CsvParser.parse(f.path()).unwrap();

        let missing = sheet.missing_columns(&["序号", "患者性别：", "年龄"]);
        assert_eq!(missing, vec!["患者性别：".to_string()]);
    }
}
