use std::path::{Path, PathBuf};

use calamine::Data;
use rust_xlsxwriter::{Workbook, Worksheet};
use thiserror::Error;
use tracing::info;

use payfill_core::{Money, PayslipRecord, StaffCode};

use crate::layout::{self, cell_ref, col};
use crate::template::TemplateSheet;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Failed to read workbook: {0}")]
    Read(#[from] calamine::Error),
    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error("Workbook has no sheets: {0}")]
    NoSheets(PathBuf),
    #[error("Staff code '{0}' not found in column B of the template")]
    StaffCodeNotFound(StaffCode),
    #[error("Record carries no staff code")]
    MissingStaffCode,
}

/// One cell write against the template copy.
enum CellUpdate {
    Text(u32, u16, String),
    Number(u32, u16, f64),
}

// ── Operations ────────────────────────────────────────────────────────────────

/// Append a full employee row (A..AK) at the first empty row of the
/// append section, assigning the next running number. Returns the
/// zero-based row written.
pub fn append_employee(
    sheet: &TemplateSheet,
    record: &PayslipRecord,
    output: &Path,
) -> Result<u32, SheetError> {
    let row = sheet.next_empty_row(layout::APPEND_START_ROW);
    let number = sheet.max_numbering() + 1;
    info!("Appending employee at row {} as No {number}", row + 1);

    let mut updates = vec![CellUpdate::Number(row, col::NO, number as f64)];

    let mut text = |column: u16, value: Option<String>| {
        updates.push(CellUpdate::Text(row, column, value.unwrap_or_default()));
    };
    text(col::STAFF_CODE, record.staff_code.as_ref().map(|c| c.to_string()));
    text(col::NAME, record.employee_name.clone());
    text(col::NRIC, record.ic_no.clone());

    // Overtime pairs: multipliers the slip didn't carry stay zero, as the
    // demo filler wrote them.
    for (multiplier, hours_col, amount_col) in [
        (1.0, col::OT10_HOURS, col::OT10_AMOUNT),
        (1.5, col::OT15_HOURS, col::OT15_AMOUNT),
        (2.0, col::OT20_HOURS, col::OT20_AMOUNT),
        (3.0, col::OT30_HOURS, col::OT30_AMOUNT),
    ] {
        let entry = record.overtime.iter().find(|ot| ot.multiplier == multiplier);
        updates.push(CellUpdate::Number(
            row,
            hours_col,
            entry.map(|ot| ot.hours).unwrap_or(0.0),
        ));
        updates.push(CellUpdate::Number(
            row,
            amount_col,
            entry.map(|ot| ot.amount.to_f64()).unwrap_or(0.0),
        ));
    }
    updates.push(CellUpdate::Number(row, col::REST_DAY_HOURS, 0.0));
    updates.push(CellUpdate::Number(row, col::REST_DAY_AMOUNT, 0.0));
    updates.push(CellUpdate::Number(row, col::PUBLIC_HOLIDAY_HOURS, 0.0));
    updates.push(CellUpdate::Number(row, col::PUBLIC_HOLIDAY_AMOUNT, 0.0));

    let mut amount = |column: u16, value: Option<Money>| {
        updates.push(CellUpdate::Number(
            row,
            column,
            value.unwrap_or_else(Money::zero).to_f64(),
        ));
    };
    amount(col::BASIC_PAY, record.basic_pay);
    amount(col::OT_TOTAL, record.total_overtime());
    amount(col::CHILD_CARE, record.allowance("CHILD"));
    amount(col::INCENTIVE, record.incentive);
    amount(col::COND_INCENTIVE, record.allowance("COND"));
    amount(
        col::CAR_TRANSPORT,
        record.allowance("CAR").or_else(|| record.allowance("TRANSP")),
    );
    amount(
        col::TRAVELLING_ALLW,
        record.allowance("TRAVEL").or_else(|| record.allowance("LEADER")),
    );
    amount(col::TOTAL_PAYABLE, record.monthly_gross);
    amount(col::EPF_EMPLOYER, record.epf_employer);
    amount(col::EPF_EMPLOYEE, record.epf_employee);
    amount(col::EPF_TOTAL, record.epf_total());
    amount(col::SOCSO_EMPLOYER, record.socso_employer);
    amount(col::SOCSO_EMPLOYEE, record.socso_employee);
    amount(col::SOCSO_TOTAL, record.socso_total());
    amount(col::EIS_EMPLOYER, record.eis_employer);
    amount(col::EIS_EMPLOYEE, record.eis_employee);
    amount(col::EIS_TOTAL, record.eis_total());
    amount(col::STAFF_LOAN, record.staff_loan);
    amount(col::ADVANCE, record.advance);
    amount(col::PCB, record.pcb);
    amount(col::NETT_PAY, record.nett_pay);

    save_with_updates(sheet, &updates, output)?;
    Ok(row)
}

/// Locate the employee's row by staff code and overwrite only the fields
/// the record carries, logging each old → new value. Returns the
/// zero-based row updated.
pub fn update_by_staff_code(
    sheet: &TemplateSheet,
    record: &PayslipRecord,
    output: &Path,
) -> Result<u32, SheetError> {
    let code = record.staff_code.as_ref().ok_or(SheetError::MissingStaffCode)?;
    let row = sheet
        .find_staff_code_row(code)
        .ok_or_else(|| SheetError::StaffCodeNotFound(code.clone()))?;
    info!("Found {code} at row {}", row + 1);

    let mut updates = Vec::new();
    let ot15 = record.overtime.iter().find(|ot| ot.multiplier == 1.5);
    if let Some(ot15) = ot15 {
        info!("{}: -> {} hours", cell_ref(row, col::OT15_HOURS), ot15.hours);
        updates.push(CellUpdate::Number(row, col::OT15_HOURS, ot15.hours));
    }

    let mut set = |column: u16, value: Option<Money>| {
        if let Some(money) = value {
            let old = sheet.cell_number(row, column).unwrap_or(0.0);
            info!("{}: {old} -> {money}", cell_ref(row, column));
            updates.push(CellUpdate::Number(row, column, money.to_f64()));
        }
    };

    set(col::BASIC_PAY, record.basic_pay);
    set(col::OT15_AMOUNT, ot15.map(|ot| ot.amount));
    set(col::OT_TOTAL, record.total_overtime());
    set(col::INCENTIVE, record.incentive);
    set(
        col::TRAVELLING_ALLW,
        record.allowance("TRAVEL").or_else(|| record.allowance("LEADER")),
    );
    set(col::TOTAL_PAYABLE, record.monthly_gross);
    set(col::EPF_EMPLOYER, record.epf_employer);
    set(col::EPF_EMPLOYEE, record.epf_employee);
    set(col::EPF_TOTAL, record.epf_total());
    set(col::SOCSO_EMPLOYER, record.socso_employer);
    set(col::SOCSO_EMPLOYEE, record.socso_employee);
    set(col::SOCSO_TOTAL, record.socso_total());
    set(col::EIS_EMPLOYER, record.eis_employer);
    set(col::EIS_EMPLOYEE, record.eis_employee);
    set(col::EIS_TOTAL, record.eis_total());
    set(col::NETT_PAY, record.nett_pay);

    save_with_updates(sheet, &updates, output)?;
    Ok(row)
}

/// The prototype extractor's flat mapping: identity and summary fields
/// across columns A..O of row 2, one workbook per payslip.
pub fn fill_summary_row(
    sheet: &TemplateSheet,
    record: &PayslipRecord,
    output: &Path,
) -> Result<(), SheetError> {
    const ROW: u32 = 1;
    let mut updates = Vec::new();

    let mut text = |column: u16, value: Option<String>| {
        if let Some(value) = value {
            updates.push(CellUpdate::Text(ROW, column, value));
        }
    };
    text(0, record.staff_code.as_ref().map(|c| c.to_string()));
    text(1, record.employee_name.clone());
    text(2, record.ic_no.clone());
    text(3, record.period.clone());

    let mut number = |column: u16, value: Option<f64>| {
        if let Some(value) = value {
            updates.push(CellUpdate::Number(ROW, column, value));
        }
    };
    number(4, record.basic_rate.map(Money::to_f64));
    number(5, record.working_days);
    number(6, record.basic_pay.map(Money::to_f64));
    number(7, record.monthly_gross.map(Money::to_f64));
    number(8, record.epf_employer.map(Money::to_f64));
    number(9, record.socso_employer.map(Money::to_f64));
    number(10, record.eis_employer.map(Money::to_f64));
    number(11, record.epf_employee.map(Money::to_f64));
    number(12, record.socso_employee.map(Money::to_f64));
    number(13, record.eis_employee.map(Money::to_f64));
    number(14, record.nett_pay.map(Money::to_f64));

    save_with_updates(sheet, &updates, output)
}

// ── Workbook rebuild ──────────────────────────────────────────────────────────

/// calamine reads and rust_xlsxwriter writes; neither edits in place.
/// Rebuild the output workbook from the template's populated cells, then
/// apply the updates on top. Cell formatting is not carried over.
fn save_with_updates(
    sheet: &TemplateSheet,
    updates: &[CellUpdate],
    output: &Path,
) -> Result<(), SheetError> {
    let mut workbook = Workbook::new();
    let out_sheet = workbook.add_worksheet();
    out_sheet.set_name(&sheet.name)?;

    for (row, column, data) in sheet.populated_cells() {
        copy_cell(out_sheet, row, column, data)?;
    }
    for update in updates {
        match update {
            CellUpdate::Text(row, column, value) => {
                out_sheet.write_string(*row, *column, value)?;
            }
            CellUpdate::Number(row, column, value) => {
                out_sheet.write_number(*row, *column, *value)?;
            }
        }
    }

    workbook.save(output)?;
    info!("Saved workbook to {}", output.display());
    Ok(())
}

fn copy_cell(
    sheet: &mut Worksheet,
    row: u32,
    column: u16,
    data: &Data,
) -> Result<(), SheetError> {
    match data {
        Data::String(s) => {
            sheet.write_string(row, column, s)?;
        }
        Data::Int(i) => {
            sheet.write_number(row, column, *i as f64)?;
        }
        Data::Float(f) => {
            sheet.write_number(row, column, *f)?;
        }
        Data::Bool(b) => {
            sheet.write_boolean(row, column, *b)?;
        }
        Data::DateTime(dt) => {
            sheet.write_number(row, column, dt.as_f64())?;
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => {
            sheet.write_string(row, column, s)?;
        }
        Data::Empty | Data::Error(_) => {}
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;
    use payfill_core::OvertimeEntry;

    fn money(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    /// Template with two employees and a section header row like the SA
    /// workbook's.
    fn write_fixture(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Salary Analysis").unwrap();
        sheet.write_string(9, col::STAFF_CODE, "Staff Code").unwrap();

        sheet.write_number(10, col::NO, 1).unwrap();
        sheet.write_string(10, col::STAFF_CODE, "AF0001").unwrap();
        sheet.write_string(10, col::NAME, "Hamdan Bin Kassim").unwrap();
        sheet.write_number(10, col::BASIC_PAY, 1500.0).unwrap();

        sheet.write_number(11, col::NO, 2).unwrap();
        sheet.write_string(11, col::STAFF_CODE, "Y0034").unwrap();
        sheet.write_string(11, col::NAME, "KYAW SWAR HTET").unwrap();

        sheet
            .write_string(29, col::NO, "Factory - Office & Admin")
            .unwrap();
        workbook.save(path).unwrap();
    }

    fn sample_record() -> PayslipRecord {
        PayslipRecord {
            staff_code: Some("AF0001".parse().unwrap()),
            employee_name: Some("Hamdan Bin Kassim".to_string()),
            basic_pay: Some(money(165000)),
            overtime: vec![OvertimeEntry {
                multiplier: 1.5,
                rate: 13.5577,
                hours: 29.0,
                amount: money(39317),
            }],
            overtime_total: Some(money(39317)),
            allowances: vec![("LEADER ALLW".to_string(), money(23000))],
            monthly_gross: Some(money(227317)),
            socso_employer: Some(money(3935)),
            socso_employee: Some(money(1125)),
            nett_pay: Some(money(226192)),
            ..Default::default()
        }
    }

    fn reopen(path: &Path) -> Template {
        Template::open(path).unwrap()
    }

    #[test]
    fn update_writes_into_matched_row() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("template.xlsx");
        let output_path = dir.path().join("updated.xlsx");
        write_fixture(&template_path);

        let template = Template::open(&template_path).unwrap();
        let row =
            update_by_staff_code(&template.sheet, &sample_record(), &output_path).unwrap();
        assert_eq!(row, 10);

        let out = reopen(&output_path);
        assert_eq!(out.sheet.name, "Salary Analysis");
        assert_eq!(out.sheet.cell_number(10, col::BASIC_PAY), Some(1650.0));
        assert_eq!(out.sheet.cell_number(10, col::OT15_HOURS), Some(29.0));
        assert_eq!(out.sheet.cell_number(10, col::OT15_AMOUNT), Some(393.17));
        assert_eq!(out.sheet.cell_number(10, col::SOCSO_TOTAL), Some(50.6));
        assert_eq!(out.sheet.cell_number(10, col::NETT_PAY), Some(2261.92));
        // EPF absent from the record: the cells stay untouched.
        assert_eq!(out.sheet.cell_number(10, col::EPF_TOTAL), None);
        // Untouched rows survive the rebuild.
        assert_eq!(
            out.sheet.cell_text(11, col::NAME).as_deref(),
            Some("KYAW SWAR HTET")
        );
    }

    #[test]
    fn update_unknown_staff_code_fails() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("template.xlsx");
        write_fixture(&template_path);
        let template = Template::open(&template_path).unwrap();

        let mut record = sample_record();
        record.staff_code = Some("ZZ9999".parse().unwrap());
        let err = update_by_staff_code(&template.sheet, &record, &dir.path().join("o.xlsx"))
            .unwrap_err();
        assert!(matches!(err, SheetError::StaffCodeNotFound(_)));
    }

    #[test]
    fn update_without_staff_code_fails() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("template.xlsx");
        write_fixture(&template_path);
        let template = Template::open(&template_path).unwrap();

        let mut record = sample_record();
        record.staff_code = None;
        let err = update_by_staff_code(&template.sheet, &record, &dir.path().join("o.xlsx"))
            .unwrap_err();
        assert!(matches!(err, SheetError::MissingStaffCode));
    }

    #[test]
    fn append_takes_next_empty_row_and_number() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("template.xlsx");
        let output_path = dir.path().join("appended.xlsx");
        write_fixture(&template_path);

        let template = Template::open(&template_path).unwrap();
        let row = append_employee(&template.sheet, &sample_record(), &output_path).unwrap();
        assert_eq!(row, 30);

        let out = reopen(&output_path);
        assert_eq!(out.sheet.cell_number(30, col::NO), Some(3.0));
        assert_eq!(out.sheet.cell_text(30, col::STAFF_CODE).as_deref(), Some("AF0001"));
        assert_eq!(out.sheet.cell_number(30, col::OT15_HOURS), Some(29.0));
        // Unused OT multipliers are zeroed, not left blank.
        assert_eq!(out.sheet.cell_number(30, col::OT20_AMOUNT), Some(0.0));
        // LEADER ALLW lands in the travelling allowance column.
        assert_eq!(out.sheet.cell_number(30, col::TRAVELLING_ALLW), Some(230.0));
        assert_eq!(out.sheet.cell_number(30, col::TOTAL_PAYABLE), Some(2273.17));
        assert_eq!(out.sheet.cell_number(30, col::NETT_PAY), Some(2261.92));
    }

    #[test]
    fn fill_summary_row_maps_columns_a_through_o() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("template.xlsx");
        let output_path = dir.path().join("summary.xlsx");
        write_fixture(&template_path);

        let mut record = sample_record();
        record.basic_rate = Some(money(165000));
        record.working_days = Some(26.0);

        let template = Template::open(&template_path).unwrap();
        fill_summary_row(&template.sheet, &record, &output_path).unwrap();

        let out = reopen(&output_path);
        assert_eq!(out.sheet.cell_text(1, 0).as_deref(), Some("AF0001"));
        assert_eq!(out.sheet.cell_text(1, 1).as_deref(), Some("Hamdan Bin Kassim"));
        assert_eq!(out.sheet.cell_number(1, 4), Some(1650.0));
        assert_eq!(out.sheet.cell_number(1, 5), Some(26.0));
        assert_eq!(out.sheet.cell_number(1, 9), Some(39.35));
        assert_eq!(out.sheet.cell_number(1, 14), Some(2261.92));
    }
}
