use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use payfill_core::{Money, OvertimeEntry, PayslipRecord, StaffCode};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_number, r"[\d,]+(?:\.\d+)?");
re!(re_company, r"(?i)\b(?:SDN\.?\s*BHD|INDUSTRIES)\b");
re!(re_staff_code, r"\b[A-Z]{1,2}\d{3,}\b");
re!(re_ic_no, r"\b[A-Z]{2}\d{6,}\b");
re!(re_upper_name, r"\b[A-Z]{2,}(?:\s+[A-Z]{2,}){1,3}\b");
re!(re_month_year,
    r"(?i)\b(?:JANUARY|FEBRUARY|MARCH|APRIL|MAY|JUNE|JULY|AUGUST|SEPTEMBER|OCTOBER|NOVEMBER|DECEMBER)\s+\d{4}\b");
re!(re_dmy_date, r"\b(\d{2})/(\d{2})/(\d{4})\b");
re!(re_ot_multiplier, r"(?i)\b(\d+(?:\.\d+)?)\s*TIMES\b");

/// Tokens that disqualify an uppercase run from being an employee name.
const LABEL_WORDS: &[&str] = &[
    "NAME", "EMPLOYEE", "LINE", "NO", "COMPANY", "PAYROLL", "BANK", "MONTHLY",
    "INDUSTRIES", "SDN", "BHD", "BASIC", "RATE", "WORKING", "DAYS", "GROSS",
];

/// How many numbers a line must carry to be taken as the totals row.
const SUMMARY_MIN_NUMBERS: usize = 8;

// ── Public API ───────────────────────────────────────────────────────────────

/// Scrape a `PayslipRecord` out of raw OCR text.
///
/// Parsing is total: fields the text does not yield stay `None`. The
/// heuristics mirror the layout of the source payslips — labeled amount
/// lines in the body, employer statutory lines suffixed 'YER, and a final
/// totals row whose values, when present, override the labeled ones.
pub fn parse_payslip(text: &str) -> PayslipRecord {
    let lines: Vec<&str> = text.lines().collect();
    let mut record = PayslipRecord::default();

    for (i, line) in lines.iter().enumerate() {
        let upper = line.to_uppercase();

        if record.company_name.is_none() && re_company().is_match(line) {
            record.company_name = Some(line.trim().to_string());
        }

        if record.staff_code.is_none() && upper.contains("EMPLOYEE") && upper.contains("LINE NO") {
            if let Some(m) = re_staff_code().find(&upper) {
                record.staff_code = StaffCode::new(m.as_str()).ok();
            }
        }

        if record.employee_name.is_none() && upper.contains("NAME") {
            record.employee_name = find_name_near(&lines, i);
        }

        if record.ic_no.is_none() && (upper.contains("I/C NO") || upper.contains("IC NO")) {
            if let Some(m) = re_ic_no().find(&upper) {
                record.ic_no = Some(m.as_str().to_string());
            }
        }

        if record.period.is_none() && upper.contains("PAYROLL") && re_month_year().is_match(line) {
            record.period = Some(line.trim().to_string());
        }

        if record.payment_date.is_none() && upper.contains("MONTHLY") && upper.contains("BANK") {
            record.payment_date = parse_dmy_date(line);
        }

        if upper.contains("BASIC RATE") {
            record.basic_rate = first_amount(line);
        }
        if upper.contains("WORKING DAYS") {
            record.working_days = first_quantity(line);
        }
        if upper.contains("BASIC PAY") && !upper.contains("DIRECTOR") {
            record.basic_pay = first_amount(line);
        }
        if upper.contains("MONTHLY GROSS") {
            record.monthly_gross = first_amount(line);
        }
        if upper.contains("INCENTIVE") {
            record.incentive = first_amount(line);
        }

        if upper.contains("ALLW") || upper.contains("ALLOWANCE") {
            if let Some((label, amount)) = parse_allowance(line) {
                record.allowances.push((label, amount));
            }
        }

        // Employer statutory portions: the slip abbreviates EMPLOYER to
        // 'YER. Take the trailing number so the label can't shadow it.
        if upper.contains("YER") {
            if upper.contains("EPF") {
                record.epf_employer = last_amount(line);
            }
            if upper.contains("SOCSO") {
                record.socso_employer = last_amount(line);
            }
            if upper.contains("EIS") {
                record.eis_employer = last_amount(line);
            }
        }

        if upper.contains("YTD AL") {
            record.ytd_annual_leave = first_quantity(line);
        }
        if upper.contains("YTD MC") {
            record.ytd_medical_leave = first_quantity(line);
        }

        if upper.contains("TIMES") || upper.contains("OVERTIME") {
            if let Some(entry) = parse_overtime(&upper) {
                record.overtime.push(entry);
            }
        }
    }

    apply_summary_row(&lines, &mut record);
    record
}

// ── Field helpers ────────────────────────────────────────────────────────────

/// The slips print the employee name on or just around the NAME
/// label line, with no delimiter OCR reliably preserves. Scan a small
/// window for a run of uppercase words that isn't label text.
fn find_name_near(lines: &[&str], i: usize) -> Option<String> {
    let start = i.saturating_sub(2);
    let end = (i + 3).min(lines.len());
    for line in &lines[start..end] {
        let upper = line.to_uppercase();
        for m in re_upper_name().find_iter(&upper) {
            let candidate = m.as_str();
            if candidate.split_whitespace().all(|w| !LABEL_WORDS.contains(&w)) {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

fn parse_dmy_date(line: &str) -> Option<NaiveDate> {
    let c = re_dmy_date().captures(line)?;
    let day: u32 = c.get(1)?.as_str().parse().ok()?;
    let month: u32 = c.get(2)?.as_str().parse().ok()?;
    let year: i32 = c.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn number_tokens<'a>(line: &'a str) -> Vec<&'a str> {
    re_number().find_iter(line).map(|m| m.as_str()).collect()
}

fn first_amount(line: &str) -> Option<Money> {
    re_number().find(line).and_then(|m| Money::parse(m.as_str()))
}

fn last_amount(line: &str) -> Option<Money> {
    number_tokens(line).last().copied().and_then(Money::parse)
}

/// A non-monetary count (days, hours, leave balance).
fn first_quantity(line: &str) -> Option<f64> {
    re_number()
        .find(line)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// "LEADER ALLW 230.00" → ("LEADER ALLW", 230.00). The label is whatever
/// precedes the first number.
fn parse_allowance(line: &str) -> Option<(String, Money)> {
    let m = re_number().find(line)?;
    let amount = Money::parse(m.as_str())?;
    let label = line[..m.start()]
        .trim()
        .trim_end_matches([':', '-', '.'])
        .trim()
        .to_string();
    if label.is_empty() {
        return None;
    }
    Some((label, amount))
}

/// "1.5 TIMES 13.5577 29.00 393.17" → multiplier, rate, hours, amount.
/// The multiplier token is consumed first so it can't be mistaken for the
/// rate. Rows labeled plain OVERTIME on these slips are time-and-a-half.
///
/// Works on the uppercased line only: uppercasing can change byte
/// length, so match offsets must never index the raw line.
fn parse_overtime(upper: &str) -> Option<OvertimeEntry> {
    let (multiplier, rest) = match re_ot_multiplier().captures(upper) {
        Some(c) => {
            let mult: f64 = c.get(1)?.as_str().parse().ok()?;
            (mult, &upper[c.get(0)?.end()..])
        }
        None => (1.5, upper),
    };

    let nums: Vec<f64> = number_tokens(rest)
        .iter()
        .filter_map(|t| t.replace(',', "").parse().ok())
        .collect();
    if nums.len() < 3 {
        return None;
    }

    Some(OvertimeEntry {
        multiplier,
        rate: nums[0],
        hours: nums[1],
        amount: Money::parse(&format!("{:.2}", nums[2]))?,
    })
}

/// The last line carrying at least eight numbers is the printed totals
/// row. Its column order is fixed on this slip layout; values present
/// there override whatever the labeled lines produced.
fn apply_summary_row(lines: &[&str], record: &mut PayslipRecord) {
    for line in lines.iter().rev() {
        let tokens = number_tokens(line);
        if tokens.len() < SUMMARY_MIN_NUMBERS {
            continue;
        }
        let amount = |idx: usize| tokens.get(idx).copied().and_then(Money::parse);

        record.basic_pay = amount(0).or(record.basic_pay);
        // tokens[1] is the director fee column, not tracked.
        record.overtime_total = amount(2);
        record.allowance_total = amount(3);
        record.monthly_gross = amount(4).or(record.monthly_gross);
        record.deduction = amount(5);
        record.epf_employee = amount(6);
        record.socso_employee = amount(7);
        if tokens.len() > 8 {
            record.eis_employee = amount(8);
        }
        if tokens.len() > 9 {
            record.nett_pay = amount(9);
        }
        return;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_SLIP: &str = "\
AF INDUSTRIES SDN BHD
EMPLOYEE / LINE NO : Y0034
NAME : KYAW SWAR HTET
I/C NO : MD630258
PAYROLL FOR SEPTEMBER 2025
MONTHLY BANK 31/10/2025
BASIC RATE 1650.00
WORKING DAYS 26.00
BASIC PAY 1650.00
LEADER ALLW 230.00
1.5 TIMES 13.5577 29.00 393.17
MONTHLY GROSS 2273.17
EPF 'YER 0.00
SOCSO 'YER 39.35
EIS 'YER 0.00
YTD AL 5.50
YTD MC 2.00
1650.00 0.00 393.17 230.00 2273.17 0.00 0.00 11.25 0.00 2261.92";

    fn money(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn full_slip_identity_fields() {
        let r = parse_payslip(FULL_SLIP);
        assert_eq!(r.company_name.as_deref(), Some("AF INDUSTRIES SDN BHD"));
        assert_eq!(r.staff_code.as_ref().map(|c| c.as_str()), Some("Y0034"));
        assert_eq!(r.employee_name.as_deref(), Some("KYAW SWAR HTET"));
        assert_eq!(r.ic_no.as_deref(), Some("MD630258"));
        assert_eq!(r.period.as_deref(), Some("PAYROLL FOR SEPTEMBER 2025"));
        assert_eq!(r.payment_date, NaiveDate::from_ymd_opt(2025, 10, 31));
    }

    #[test]
    fn full_slip_labeled_amounts() {
        let r = parse_payslip(FULL_SLIP);
        assert_eq!(r.basic_rate, Some(money(165000)));
        assert_eq!(r.working_days, Some(26.0));
        assert_eq!(r.basic_pay, Some(money(165000)));
        assert_eq!(r.monthly_gross, Some(money(227317)));
        assert_eq!(r.epf_employer, Some(money(0)));
        assert_eq!(r.socso_employer, Some(money(3935)));
        assert_eq!(r.eis_employer, Some(money(0)));
        assert_eq!(r.ytd_annual_leave, Some(5.5));
        assert_eq!(r.ytd_medical_leave, Some(2.0));
    }

    #[test]
    fn full_slip_allowance_line() {
        let r = parse_payslip(FULL_SLIP);
        assert_eq!(r.allowances, vec![("LEADER ALLW".to_string(), money(23000))]);
        assert_eq!(r.allowance("leader"), Some(money(23000)));
    }

    #[test]
    fn full_slip_overtime_line() {
        let r = parse_payslip(FULL_SLIP);
        assert_eq!(r.overtime.len(), 1);
        let ot = &r.overtime[0];
        assert_eq!(ot.multiplier, 1.5);
        assert_eq!(ot.rate, 13.5577);
        assert_eq!(ot.hours, 29.0);
        assert_eq!(ot.amount, money(39317));
    }

    #[test]
    fn full_slip_summary_row_overrides() {
        let r = parse_payslip(FULL_SLIP);
        assert_eq!(r.overtime_total, Some(money(39317)));
        assert_eq!(r.allowance_total, Some(money(23000)));
        assert_eq!(r.deduction, Some(money(0)));
        assert_eq!(r.epf_employee, Some(money(0)));
        assert_eq!(r.socso_employee, Some(money(1125)));
        assert_eq!(r.eis_employee, Some(money(0)));
        assert_eq!(r.nett_pay, Some(money(226192)));
    }

    #[test]
    fn summary_row_with_commas() {
        let text = "BASIC PAY 5,200.00\n5,200.00 0.00 0.00 0.00 5,200.00 0.00 572.00 24.75 10.40 4,592.85";
        let r = parse_payslip(text);
        assert_eq!(r.basic_pay, Some(money(520000)));
        assert_eq!(r.monthly_gross, Some(money(520000)));
        assert_eq!(r.nett_pay, Some(money(459285)));
    }

    #[test]
    fn partial_slip_leaves_missing_fields_none() {
        let r = parse_payslip("BASIC PAY 1650.00\nMONTHLY GROSS 1650.00");
        assert_eq!(r.basic_pay, Some(money(165000)));
        assert_eq!(r.staff_code, None);
        assert_eq!(r.nett_pay, None);
        assert!(r.overtime.is_empty());
    }

    #[test]
    fn director_basic_pay_is_ignored() {
        let r = parse_payslip("DIRECTOR BASIC PAY 9999.00\nBASIC PAY 1650.00");
        assert_eq!(r.basic_pay, Some(money(165000)));
    }

    #[test]
    fn overtime_multiplier_not_mistaken_for_rate() {
        let r = parse_payslip("2.0 TIMES 18.0770 4.00 72.31");
        let ot = &r.overtime[0];
        assert_eq!(ot.multiplier, 2.0);
        assert_eq!(ot.rate, 18.077);
        assert_eq!(ot.hours, 4.0);
        assert_eq!(ot.amount, money(7231));
    }

    #[test]
    fn overtime_line_with_too_few_numbers_is_skipped() {
        let r = parse_payslip("OVERTIME 393.17");
        assert!(r.overtime.is_empty());
    }

    // U+0149 uppercases to two chars, shifting every byte offset after it.
    #[test]
    fn overtime_line_with_length_changing_uppercase() {
        let r = parse_payslip("\u{0149} 1.5 TIMES 13.5577 29.00 393.17");
        assert_eq!(r.overtime.len(), 1);
        let ot = &r.overtime[0];
        assert_eq!(ot.multiplier, 1.5);
        assert_eq!(ot.rate, 13.5577);
        assert_eq!(ot.amount, money(39317));
    }

    #[test]
    fn short_staff_code_is_accepted() {
        let r = parse_payslip("EMPLOYEE / LINE NO : Y123");
        assert_eq!(r.staff_code.as_ref().map(|c| c.as_str()), Some("Y123"));
    }

    #[test]
    fn name_window_skips_label_lines() {
        let text = "EMPLOYEE / LINE NO : Y0034\nNAME :\nHAMDAN BIN KASSIM";
        let r = parse_payslip(text);
        assert_eq!(r.employee_name.as_deref(), Some("HAMDAN BIN KASSIM"));
    }

    #[test]
    fn no_panic_on_garbage() {
        let _ = parse_payslip("");
        let _ = parse_payslip("!@#$%^&*()\n\0\x01\x02");
        let _ = parse_payslip("TIMES TIMES TIMES");
        let _ = parse_payslip("\u{0149} 1.5 TIMES");
        let _ = parse_payslip("ﬁ ß \u{0149} OVERTIME 1 2 3");
    }

    #[test]
    fn payment_date_rejects_impossible_date() {
        let r = parse_payslip("MONTHLY BANK 45/99/2025");
        assert_eq!(r.payment_date, None);
    }
}
