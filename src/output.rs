use crate::config::{
    COL_CPU_BUCKET, COL_OS_CLASSIFICATION, COL_RAM_BUCKET, COL_SOURCE_FILE, COL_SOURCE_FILE_META,
    REQUIRED_VHOST_COLS, REQUIRED_VINFO_COLS, SHEET_CONSOLIDATED_METADATA,
    SHEET_CONSOLIDATED_VHOST, SHEET_CONSOLIDATED_VINFO,
};
use crate::error::OutputError;
use crate::types::{CellValue, ConsolidatedData, MetadataTable};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), OutputError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn write_text(path: &Path, text: &str) -> Result<(), OutputError> {
    std::fs::write(path, text)?;
    Ok(())
}

pub fn vinfo_headers() -> Vec<String> {
    REQUIRED_VINFO_COLS
        .iter()
        .chain([COL_OS_CLASSIFICATION, COL_SOURCE_FILE].iter())
        .map(|s| s.to_string())
        .collect()
}

pub fn vhost_headers() -> Vec<String> {
    REQUIRED_VHOST_COLS
        .iter()
        .chain([COL_SOURCE_FILE, COL_CPU_BUCKET, COL_RAM_BUCKET].iter())
        .map(|s| s.to_string())
        .collect()
}

fn metadata_cells(table: &MetadataTable) -> Vec<Vec<CellValue>> {
    table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .map(|col| {
                    if col == COL_SOURCE_FILE_META {
                        CellValue::Text(row.source_file.clone())
                    } else {
                        row.values
                            .get(col)
                            .map(|v| CellValue::Text(v.clone()))
                            .unwrap_or_default()
                    }
                })
                .collect()
        })
        .collect()
}

fn fill_sheet(
    sheet: &mut Worksheet,
    headers: &[String],
    rows: &[Vec<CellValue>],
) -> Result<(), OutputError> {
    for (col, h) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, h.as_str())?;
    }
    for (r, row) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    sheet.write_string(r, col, s.as_str())?;
                }
                CellValue::Number(n) => {
                    sheet.write_number(r, col, *n)?;
                }
                CellValue::Bool(b) => {
                    sheet.write_boolean(r, col, *b)?;
                }
            }
        }
    }
    Ok(())
}

/// Write the consolidated tables, one worksheet each.
///
/// The vInfo and vHost sheets are always present (headers only when empty);
/// the metadata sheet is skipped when no file had any metadata rows.
pub fn write_workbook(path: &Path, data: &ConsolidatedData) -> Result<(), OutputError> {
    let mut workbook = Workbook::new();

    let vinfo: Vec<Vec<CellValue>> = data.vinfo.iter().map(|r| r.to_cells()).collect();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_CONSOLIDATED_VINFO)?;
    fill_sheet(sheet, &vinfo_headers(), &vinfo)?;

    let vhost: Vec<Vec<CellValue>> = data.vhost.iter().map(|r| r.to_cells()).collect();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_CONSOLIDATED_VHOST)?;
    fill_sheet(sheet, &vhost_headers(), &vhost)?;

    if !data.metadata.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_CONSOLIDATED_METADATA)?;
        fill_sheet(sheet, &data.metadata.columns, &metadata_cells(&data.metadata))?;
    }

    workbook.save(path)?;
    info!("Data exported to: {}", path.display());
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
