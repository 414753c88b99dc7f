//! Spreadsheet report writer.

use crate::models::report::{
    CompletionStatus, FieldRecord, FieldValue, MovieRecord, ResolutionTier, ShowRecord,
};
use crate::utils::format::{sanitize_sheet_name, season_header};
use crate::Result;
use chrono::{DateTime, Local};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Header of the series completeness column.
pub const SERIES_HEADER: &str = "Series Complete (Plex/TVMaze)";

const MIN_COLUMN_WIDTH: f64 = 10.0;
const MAX_COLUMN_WIDTH: f64 = 60.0;
const SHEET_NAME_LIMIT: usize = 31;

/// Columns holding long free text.
const WRAP_COLUMNS: &[&str] = &[
    "Summary",
    "Tagline",
    "File Path",
    "Collections",
    "Genres",
    "Labels",
];

const ULTRA_HD_FILL: u32 = 0x77B190;
const STANDARD_FILL: u32 = 0xFFFFCC;
const COMPLETE_FILL: u32 = 0x90EE90;
const PARTIAL_FILL: u32 = 0xFFB6B6;
const ATTENTION_FILL: u32 = 0xFFFFCC;
const NEUTRAL_FILL: u32 = 0xD3D3D3;

/// Report file name for a run started at `now`.
pub fn report_file_name(now: &DateTime<Local>) -> String {
    format!("PlexMediaExport_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// Report path in the export directory for a run started now.
pub fn default_report_path(dir: &Path) -> PathBuf {
    dir.join(report_file_name(&Local::now()))
}

fn resolution_fill(tier: ResolutionTier) -> Option<u32> {
    match tier {
        ResolutionTier::UltraHd => Some(ULTRA_HD_FILL),
        ResolutionTier::Standard => Some(STANDARD_FILL),
        ResolutionTier::FullHd | ResolutionTier::Unknown => None,
    }
}

fn status_fill(status: CompletionStatus) -> Option<u32> {
    match status {
        CompletionStatus::Complete => Some(COMPLETE_FILL),
        CompletionStatus::Partial => Some(PARTIAL_FILL),
        CompletionStatus::Attention => Some(ATTENTION_FILL),
        CompletionStatus::Neutral => Some(NEUTRAL_FILL),
        CompletionStatus::Missing => None,
    }
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_border_bottom(FormatBorder::Thick)
        .set_align(FormatAlign::Center)
        .set_text_wrap()
}

fn cell_format(fill: Option<u32>, wrap: bool, center: bool) -> Format {
    let mut format = Format::new().set_border(FormatBorder::Thin);
    if let Some(rgb) = fill {
        format = format.set_background_color(Color::RGB(rgb));
    }
    if wrap {
        format = format.set_text_wrap().set_align(FormatAlign::Top);
    }
    if center {
        format = format.set_align(FormatAlign::Center);
    }
    format
}

/// Column headers of a show sheet.
pub fn show_headers(fields: &[String], records: &[ShowRecord], max_season: u32) -> Vec<String> {
    let mut headers: Vec<String> = fields.to_vec();
    headers.push(SERIES_HEADER.to_string());
    if records.iter().any(ShowRecord::has_specials) {
        headers.push(season_header(0));
    }
    headers.extend((1..=max_season).map(season_header));
    headers
}

/// Season numbers shown as columns, in column order.
fn season_columns(records: &[ShowRecord], max_season: u32) -> Vec<u32> {
    let specials = records.iter().any(ShowRecord::has_specials);
    let first = if specials { 0 } else { 1 };
    (first..=max_season).collect()
}

/// Tracks the widest text per column.
struct ColumnWidths(Vec<usize>);

impl ColumnWidths {
    fn new(headers: &[String]) -> Self {
        Self(headers.iter().map(|h| h.chars().count()).collect())
    }

    fn observe(&mut self, col: usize, text: &str) {
        let len = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        if let Some(width) = self.0.get_mut(col) {
            *width = (*width).max(len);
        }
    }

    fn width(&self, col: usize) -> f64 {
        let raw = self.0.get(col).copied().unwrap_or(0) as f64 + 2.0;
        raw.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
    }
}

fn to_col(index: usize) -> u16 {
    u16::try_from(index).unwrap_or(u16::MAX)
}

fn to_row(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

fn write_value(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &FieldValue,
    format: &Format,
) -> Result<()> {
    match value.as_number() {
        Some(number) => sheet.write_number_with_format(row, col, number, format)?,
        None => sheet.write_string_with_format(row, col, value.to_string(), format)?,
    };
    Ok(())
}

fn write_headers(sheet: &mut Worksheet, headers: &[String]) -> Result<()> {
    let format = header_format();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, to_col(col), header, &format)?;
    }
    Ok(())
}

fn write_fields(
    sheet: &mut Worksheet,
    row: u32,
    fields: &[String],
    record: &FieldRecord,
    fill: Option<u32>,
    widths: &mut ColumnWidths,
) -> Result<()> {
    for (col, field) in fields.iter().enumerate() {
        let value = record.get(field).unwrap_or(&FieldValue::NotAvailable);
        let wrap = WRAP_COLUMNS.contains(&field.as_str());
        write_value(sheet, row, to_col(col), value, &cell_format(fill, wrap, false))?;
        widths.observe(col, &value.to_string());
    }
    Ok(())
}

/// Builds the workbook one sheet per library section.
pub struct ReportWriter {
    workbook: Workbook,
    sheet_names: HashSet<String>,
    sheets: usize,
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportWriter {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            sheet_names: HashSet::new(),
            sheets: 0,
        }
    }

    /// Number of sheets added so far.
    pub fn sheet_count(&self) -> usize {
        self.sheets
    }

    /// Sanitised sheet name that no earlier sheet uses.
    pub fn unique_sheet_name(&mut self, title: &str) -> String {
        let base = sanitize_sheet_name(title);
        let mut name = base.clone();
        let mut n = 2;
        while self.sheet_names.contains(&name.to_lowercase()) {
            let suffix = format!(" ({})", n);
            let keep = SHEET_NAME_LIMIT.saturating_sub(suffix.chars().count());
            let stem: String = base.chars().take(keep).collect();
            name = format!("{}{}", stem.trim_end(), suffix);
            n += 1;
        }
        self.sheet_names.insert(name.to_lowercase());
        name
    }

    /// Add a movie sheet. Rows are coloured by resolution tier.
    pub fn add_movie_sheet(
        &mut self,
        section_title: &str,
        fields: &[String],
        records: &[MovieRecord],
    ) -> Result<()> {
        if records.is_empty() {
            tracing::info!("Skipping empty movie section '{}'", section_title);
            return Ok(());
        }

        let name = self.unique_sheet_name(section_title);
        let sheet = self.workbook.add_worksheet();
        sheet.set_name(&name)?;

        write_headers(sheet, fields)?;
        let mut widths = ColumnWidths::new(fields);
        for (i, record) in records.iter().enumerate() {
            let fill = resolution_fill(record.resolution);
            write_fields(sheet, to_row(i + 1), fields, &record.fields, fill, &mut widths)?;
        }

        for col in 0..fields.len() {
            sheet.set_column_width(to_col(col), widths.width(col))?;
        }
        sheet.set_freeze_panes(1, 0)?;
        if !fields.is_empty() {
            sheet.autofilter(0, 0, to_row(records.len()), to_col(fields.len() - 1))?;
        }

        self.sheets += 1;
        tracing::info!("Wrote {} movies to sheet '{}'", records.len(), name);
        Ok(())
    }

    /// Add a show sheet with series and per-season completeness columns.
    pub fn add_show_sheet(
        &mut self,
        section_title: &str,
        fields: &[String],
        records: &[ShowRecord],
        max_season: u32,
    ) -> Result<()> {
        if records.is_empty() {
            tracing::info!("Skipping empty show section '{}'", section_title);
            return Ok(());
        }

        let name = self.unique_sheet_name(section_title);
        let headers = show_headers(fields, records, max_season);
        let seasons = season_columns(records, max_season);
        let series_col = fields.len();

        let sheet = self.workbook.add_worksheet();
        sheet.set_name(&name)?;
        write_headers(sheet, &headers)?;

        let mut widths = ColumnWidths::new(&headers);
        for (i, record) in records.iter().enumerate() {
            let row = to_row(i + 1);
            write_fields(sheet, row, fields, &record.fields, None, &mut widths)?;

            let series = record.series_cell();
            let format = cell_format(status_fill(series.status), false, true);
            sheet.write_string_with_format(row, to_col(series_col), &series.text, &format)?;
            widths.observe(series_col, &series.text);

            for (offset, season) in seasons.iter().enumerate() {
                let col = series_col + 1 + offset;
                let cell = record.season_cell(*season);
                let format = cell_format(status_fill(cell.status), false, true);
                if cell.text.is_empty() {
                    sheet.write_blank(row, to_col(col), &format)?;
                } else {
                    sheet.write_string_with_format(row, to_col(col), &cell.text, &format)?;
                }
            }
        }

        for (col, header) in headers.iter().enumerate() {
            let width = match header.as_str() {
                "Title" => 35.0,
                "Studio" => 20.0,
                _ => widths.width(col),
            };
            sheet.set_column_width(to_col(col), width)?;
        }
        sheet.set_freeze_panes(1, to_col(series_col + 1))?;
        sheet.autofilter(0, 0, to_row(records.len()), to_col(headers.len() - 1))?;

        self.sheets += 1;
        tracing::info!(
            "Wrote {} shows to sheet '{}' ({} season columns)",
            records.len(),
            name,
            seasons.len()
        );
        Ok(())
    }

    /// Write the workbook to `path`.
    pub fn save(mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            crate::utils::fs::create_dir_all(parent)?;
        }
        self.workbook.save(path)?;
        tracing::info!("Saved report with {} sheets to {}", self.sheets, path.display());
        Ok(())
    }
}
