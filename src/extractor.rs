// Sheet extraction: find the table inside a worksheet, project it onto the
// fixed column sets and compute the per-row derived fields.
use crate::classify::classify_os;
use crate::config::{
    COL_SOURCE_FILE_META, REQUIRED_VHOST_COLS, REQUIRED_VINFO_COLS, VHOST_SHEET, VINFO_SHEET,
    VMETADATA_SHEET,
};
use crate::error::ExtractError;
use crate::types::{CellValue, HostRow, MetadataRow, OsClass, VmRow};
use crate::util::normalize_percentage;
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

/// Raw grid of one worksheet, top-left cell first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

/// Anything that can hand out named worksheets.
pub trait SheetSource {
    fn sheet_names(&self) -> Vec<String>;
    fn read_sheet(&mut self, name: &str) -> Result<Sheet, ExtractError>;

    fn has_sheet(&self, name: &str) -> bool {
        self.sheet_names().iter().any(|n| n == name)
    }
}

/// An `.xls`/`.xlsx`/`.xlsm` workbook on disk, read through calamine.
pub struct ExcelWorkbook {
    inner: Sheets<BufReader<File>>,
}

impl ExcelWorkbook {
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let inner = open_workbook_auto(path)?;
        Ok(Self { inner })
    }
}

fn cell_from(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Text(other.to_string()),
    }
}

impl SheetSource for ExcelWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet, ExtractError> {
        let range = self
            .inner
            .worksheet_range(name)
            .map_err(|e| ExtractError::Sheet {
                sheet: name.to_string(),
                reason: e.to_string(),
            })?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_from).collect())
            .collect();
        Ok(Sheet {
            name: name.to_string(),
            rows,
        })
    }
}

/// In-memory workbook for grids that never touched disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<Sheet>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        self.sheets.push(Sheet {
            name: name.to_string(),
            rows,
        });
        self
    }
}

impl SheetSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet, ExtractError> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| ExtractError::SheetNotFound(name.to_string()))
    }
}

/// A worksheet once its header row is known.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Build a table using `rows[header_row]` as the header.
    ///
    /// Blank header cells become `Unnamed: <index>` and repeated names get a
    /// `.N` suffix, so a lookup by name always hits the first occurrence.
    /// Data rows that are entirely empty are dropped.
    pub fn from_rows(rows: &[Vec<CellValue>], header_row: usize) -> Self {
        let Some(header) = rows.get(header_row) else {
            return Self::default();
        };
        let mut seen: HashMap<String, usize> = HashMap::new();
        let headers = header
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let name = cell.to_display().trim().to_string();
                let name = if name.is_empty() {
                    format!("Unnamed: {}", i)
                } else {
                    name
                };
                let n = seen.entry(name.clone()).or_insert(0);
                let unique = if *n == 0 {
                    name
                } else {
                    format!("{}.{}", name, n)
                };
                *n += 1;
                unique
            })
            .collect();
        let data = rows[header_row + 1..]
            .iter()
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .cloned()
            .collect();
        Self {
            headers,
            rows: data,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Project every row onto `columns`. A column the sheet lacks yields a
    /// full column of `Empty` markers instead of an error.
    pub fn project(&self, columns: &[&str]) -> Vec<Vec<CellValue>> {
        let indices: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        self.rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|idx| idx.and_then(|i| row.get(i)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

/// Index of the first row holding `first_col` as a cell value, else 0.
pub fn locate_header(rows: &[Vec<CellValue>], first_col: &str) -> usize {
    rows.iter()
        .position(|row| {
            row.iter()
                .any(|cell| cell.as_text().map(str::trim) == Some(first_col))
        })
        .unwrap_or(0)
}

fn discover_table(sheet: &Sheet, first_col: &str) -> Table {
    let header_row = locate_header(&sheet.rows, first_col);
    if header_row > 0 {
        debug!(sheet = %sheet.name, header_row, "header row is not the first row");
    }
    Table::from_rows(&sheet.rows, header_row)
}

pub fn extract_vm_rows(sheet: &Sheet, source_file: &str) -> Vec<VmRow> {
    let table = discover_table(sheet, REQUIRED_VINFO_COLS[0]);
    table
        .project(&REQUIRED_VINFO_COLS)
        .into_iter()
        .map(|cells| {
            let mut it = cells.into_iter();
            let mut next = || it.next().unwrap_or_default();
            let mut row = VmRow {
                vm: next(),
                powerstate: next(),
                connection_state: next(),
                cpus: next(),
                memory: next(),
                resource_pool: next(),
                provisioned_mib: next(),
                datacenter: next(),
                cluster: next(),
                host: next(),
                os_config: next(),
                os_tools: next(),
                vi_sdk_server: next(),
                os_classification: OsClass::Unknown,
                source_file: source_file.to_string(),
            };
            row.os_classification =
                classify_os(&row.os_config.to_display(), &row.os_tools.to_display());
            row
        })
        .collect()
}

pub fn extract_host_rows(sheet: &Sheet, source_file: &str) -> Vec<HostRow> {
    let table = discover_table(sheet, REQUIRED_VHOST_COLS[0]);
    table
        .project(&REQUIRED_VHOST_COLS)
        .into_iter()
        .map(|cells| {
            let mut it = cells.into_iter();
            let mut next = || it.next().unwrap_or_default();
            HostRow {
                host: next(),
                datacenter: next(),
                cluster: next(),
                num_cpu: next(),
                num_cores: next(),
                cpu_usage: normalize_percentage(&next()),
                num_memory: next(),
                memory_usage: normalize_percentage(&next()),
                esx_version: next(),
                vendor: next(),
                model: next(),
                source_file: source_file.to_string(),
                cpu_bucket: None,
                ram_bucket: None,
            }
        })
        .collect()
}

/// Free-form vMetaData rows. Row 0 is the header; `SourceFile_Meta` leads
/// the returned header list. Empty cells are left out of each row's map.
pub fn extract_metadata(sheet: &Sheet, source_file: &str) -> (Vec<String>, Vec<MetadataRow>) {
    let table = Table::from_rows(&sheet.rows, 0);
    let mut headers = vec![COL_SOURCE_FILE_META.to_string()];
    headers.extend(table.headers.iter().cloned());
    let rows = table
        .rows
        .iter()
        .map(|row| MetadataRow {
            source_file: source_file.to_string(),
            values: table
                .headers
                .iter()
                .zip(row.iter())
                .filter(|(_, cell)| !cell.is_empty())
                .map(|(h, cell)| (h.clone(), cell.to_display()))
                .collect(),
        })
        .collect();
    (headers, rows)
}

/// Everything one input file contributes. `None` marks an absent sheet.
#[derive(Debug, Clone, Default)]
pub struct FileExtract {
    pub vinfo: Option<Vec<VmRow>>,
    pub vhost: Option<Vec<HostRow>>,
    pub metadata: Option<(Vec<String>, Vec<MetadataRow>)>,
}

impl FileExtract {
    pub fn tables_found(&self) -> usize {
        [self.vinfo.is_some(), self.vhost.is_some(), self.metadata.is_some()]
            .iter()
            .filter(|present| **present)
            .count()
    }
}

/// Extract the three known sheets from one workbook.
///
/// A missing sheet is logged and skipped; a sheet that exists but cannot be
/// read fails the whole file so nothing from it is half-appended.
pub fn extract_file<S: SheetSource>(
    source: &mut S,
    source_file: &str,
) -> Result<FileExtract, ExtractError> {
    let mut extract = FileExtract::default();

    if source.has_sheet(VINFO_SHEET) {
        let sheet = source.read_sheet(VINFO_SHEET)?;
        let rows = extract_vm_rows(&sheet, source_file);
        info!("Processed {} VMs from vInfo sheet of {}", rows.len(), source_file);
        extract.vinfo = Some(rows);
    } else {
        warn!("vInfo sheet not found in {}", source_file);
    }

    if source.has_sheet(VHOST_SHEET) {
        let sheet = source.read_sheet(VHOST_SHEET)?;
        let rows = extract_host_rows(&sheet, source_file);
        info!("Processed {} hosts from vHost sheet of {}", rows.len(), source_file);
        extract.vhost = Some(rows);
    } else {
        warn!("vHost sheet not found in {}", source_file);
    }

    if source.has_sheet(VMETADATA_SHEET) {
        let sheet = source.read_sheet(VMETADATA_SHEET)?;
        let (headers, rows) = extract_metadata(&sheet, source_file);
        info!("Processed metadata with {} rows from {}", rows.len(), source_file);
        extract.metadata = Some((headers, rows));
    } else {
        warn!("vMetaData sheet not found in {}", source_file);
    }

    Ok(extract)
}
