use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::{Report, ReportTable};
use crate::model::task::Task;

const SUMMARY_SHEET: &str = "Summary";
const INCOMPLETE_SHEET: &str = "Incomplete";

fn xlsx_error(e: XlsxError) -> anyhow::Error {
    anyhow!("Failed to build spreadsheet: {e}")
}

/// Workbook bytes: the percentage table, plus a sheet listing incomplete tasks if any.
pub fn render_to_bytes(report: &Report) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET).map_err(xlsx_error)?;
    write_table(sheet, &report.table, &bold)?;

    if !report.incomplete.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(INCOMPLETE_SHEET).map_err(xlsx_error)?;
        write_incomplete(sheet, &report.incomplete, &bold)?;
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

pub fn write_workbook(path: &Path, report: &Report) -> Result<()> {
    let bytes = render_to_bytes(report)?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn write_table(sheet: &mut Worksheet, table: &ReportTable, bold: &Format) -> Result<()> {
    for (col, title) in table.header.iter().enumerate() {
        if !title.is_empty() {
            sheet
                .write_string_with_format(0, col as u16, title, bold)
                .map_err(xlsx_error)?;
        }
    }
    for (row, cells) in table.rows.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            sheet
                .write_string(row as u32 + 1, col as u16, cell)
                .map_err(xlsx_error)?;
        }
    }
    sheet.set_column_width(0, 30).map_err(xlsx_error)?;
    Ok(())
}

fn write_incomplete(sheet: &mut Worksheet, tasks: &[Task], bold: &Format) -> Result<()> {
    for (col, title) in ["Title", "Link", "Missing", "Created", "Closed"].iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *title, bold)
            .map_err(xlsx_error)?;
    }
    for (i, task) in tasks.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, task.title()).map_err(xlsx_error)?;
        sheet.write_string(row, 1, task.link()).map_err(xlsx_error)?;
        sheet
            .write_string(row, 2, task.missing().join(", "))
            .map_err(xlsx_error)?;
        sheet
            .write_string(row, 3, task.date_created().format("%Y-%m-%d").to_string())
            .map_err(xlsx_error)?;
        sheet
            .write_string(row, 4, task.date_closed().format("%Y-%m-%d").to_string())
            .map_err(xlsx_error)?;
    }
    sheet.set_column_width(0, 50).map_err(xlsx_error)?;
    sheet.set_column_width(1, 60).map_err(xlsx_error)?;
    Ok(())
}
