use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use payfill_core::StaffCode;

use crate::layout::{self, col};
use crate::writer::SheetError;

/// The active (first) sheet of a payroll template, loaded into memory.
pub struct TemplateSheet {
    pub name: String,
    range: Range<Data>,
}

/// A payroll template workbook. Only the first sheet is ever written
/// to, but `inspect` reports them all.
pub struct Template {
    pub sheet: TemplateSheet,
}

impl Template {
    pub fn open(path: &Path) -> Result<Self, SheetError> {
        let mut workbook = open_workbook_auto(path)?;
        let name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SheetError::NoSheets(path.to_path_buf()))?;
        let range = workbook.worksheet_range(&name)?;
        Ok(Template {
            sheet: TemplateSheet { name, range },
        })
    }
}

impl TemplateSheet {
    /// Cell at absolute zero-based coordinates, if populated.
    pub fn cell(&self, row: u32, column: u16) -> Option<&Data> {
        self.range.get_value((row, column as u32))
    }

    /// Last populated row index.
    pub fn end_row(&self) -> u32 {
        self.range.end().map(|(r, _)| r).unwrap_or(0)
    }

    /// Text of a cell, whatever its underlying type. Numbers that happen
    /// to be stored where codes live are rendered without a trailing .0.
    pub fn cell_text(&self, row: u32, column: u16) -> Option<String> {
        match self.cell(row, column)? {
            Data::String(s) => Some(s.trim().to_string()),
            Data::Int(i) => Some(i.to_string()),
            Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
            Data::Float(f) => Some(f.to_string()),
            Data::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn cell_number(&self, row: u32, column: u16) -> Option<f64> {
        match self.cell(row, column)? {
            Data::Int(i) => Some(*i as f64),
            Data::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Scan column B for the row holding `code` (trim/case-insensitive,
    /// as the lookup script compared).
    pub fn find_staff_code_row(&self, code: &StaffCode) -> Option<u32> {
        (0..=self.end_row()).find(|&row| {
            self.cell_text(row, col::STAFF_CODE)
                .is_some_and(|text| code.matches(&text))
        })
    }

    /// First row at or after `start` with an empty staff-code cell.
    pub fn next_empty_row(&self, start: u32) -> u32 {
        let end = self.end_row();
        for row in start..=end.max(start) {
            let empty = match self.cell(row, col::STAFF_CODE) {
                None | Some(Data::Empty) => true,
                Some(Data::String(s)) => s.trim().is_empty(),
                _ => false,
            };
            if empty {
                return row;
            }
        }
        end + 1
    }

    /// Largest running number in column A of the employee table, for
    /// assigning the next "No" on append.
    pub fn max_numbering(&self) -> u32 {
        (layout::DATA_START_ROW..=self.end_row())
            .filter_map(|row| self.cell_number(row, col::NO))
            .filter(|n| *n >= 0.0)
            .fold(0u32, |acc, n| acc.max(n as u32))
    }

    /// Every populated cell, absolute zero-based coordinates.
    pub(crate) fn populated_cells(&self) -> Vec<(u32, u16, &Data)> {
        let Some((start_row, start_col)) = self.range.start() else {
            return Vec::new();
        };
        let mut cells = Vec::new();
        for (r, row) in self.range.rows().enumerate() {
            for (c, data) in row.iter().enumerate() {
                if !matches!(data, Data::Empty) {
                    if let Ok(column) = u16::try_from(start_col + c as u32) {
                        cells.push((start_row + r as u32, column, data));
                    }
                }
            }
        }
        cells
    }
}

// ── Inspection ────────────────────────────────────────────────────────────────

/// What the inspector reports for one sheet.
pub struct SheetReport {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    /// (A1 reference, rendered value) for populated cells in the first
    /// `layout::INSPECT_ROWS` rows.
    pub populated: Vec<(String, String)>,
}

/// Report the structure of every sheet in a workbook — the eyeball pass
/// needed before trusting the fixed column layout.
pub fn inspect(path: &Path) -> Result<Vec<SheetReport>, SheetError> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names();
    let mut reports = Vec::with_capacity(names.len());

    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let (rows, columns) = range.get_size();
        let sheet = TemplateSheet { name: name.clone(), range };

        let populated = sheet
            .populated_cells()
            .into_iter()
            .filter(|(row, _, _)| *row < layout::INSPECT_ROWS)
            .map(|(row, column, data)| (layout::cell_ref(row, column), data.to_string()))
            .collect();

        reports.push(SheetReport { name, rows, columns, populated });
    }
    Ok(reports)
}
