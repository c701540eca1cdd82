use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::staff::StaffCode;

/// One overtime line on a payslip ("1.5 TIMES  13.5577  29.00  393.17").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeEntry {
    /// Pay multiplier: 1.0, 1.5, 2.0, 3.0.
    pub multiplier: f64,
    /// Hourly rate at that multiplier.
    pub rate: f64,
    pub hours: f64,
    pub amount: Money,
}

/// Everything extractable from a single payslip, plus the columns the
/// payroll template tracks that the slip may not carry (loans, advances,
/// PCB). Absent values stay `None` / zero so a partially recognized slip
/// still produces a usable record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayslipRecord {
    pub company_name: Option<String>,
    pub staff_code: Option<StaffCode>,
    pub employee_name: Option<String>,
    /// NRIC / passport number ("MD630258").
    pub ic_no: Option<String>,
    /// Payroll period line as printed ("PAYROLL FOR SEPTEMBER 2025").
    pub period: Option<String>,
    /// Bank payment date.
    pub payment_date: Option<NaiveDate>,

    pub basic_rate: Option<Money>,
    pub working_days: Option<f64>,
    pub basic_pay: Option<Money>,

    /// Named allowances as labeled on the slip ("LEADER ALLW" -> 230.00).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowances: Vec<(String, Money)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overtime: Vec<OvertimeEntry>,

    pub overtime_total: Option<Money>,
    pub allowance_total: Option<Money>,
    pub incentive: Option<Money>,
    pub monthly_gross: Option<Money>,

    pub epf_employer: Option<Money>,
    pub epf_employee: Option<Money>,
    pub socso_employer: Option<Money>,
    pub socso_employee: Option<Money>,
    pub eis_employer: Option<Money>,
    pub eis_employee: Option<Money>,

    /// Year-to-date annual leave / medical leave balances.
    pub ytd_annual_leave: Option<f64>,
    pub ytd_medical_leave: Option<f64>,

    pub staff_loan: Option<Money>,
    pub advance: Option<Money>,
    /// Monthly tax deduction (Potongan Cukai Bulanan).
    pub pcb: Option<Money>,
    pub deduction: Option<Money>,

    pub nett_pay: Option<Money>,
}

impl PayslipRecord {
    /// Employer + employee EPF, as the template's total column expects.
    pub fn epf_total(&self) -> Option<Money> {
        sum_portions(self.epf_employer, self.epf_employee)
    }

    pub fn socso_total(&self) -> Option<Money> {
        sum_portions(self.socso_employer, self.socso_employee)
    }

    pub fn eis_total(&self) -> Option<Money> {
        sum_portions(self.eis_employer, self.eis_employee)
    }

    /// The slip's printed OT total, falling back to the sum of the
    /// individual overtime lines.
    pub fn total_overtime(&self) -> Option<Money> {
        if self.overtime_total.is_some() {
            return self.overtime_total;
        }
        if self.overtime.is_empty() {
            return None;
        }
        Some(
            self.overtime
                .iter()
                .fold(Money::zero(), |acc, ot| acc + ot.amount),
        )
    }

    /// First allowance matching `label` (case-insensitive substring).
    pub fn allowance(&self, label: &str) -> Option<Money> {
        let needle = label.to_uppercase();
        self.allowances
            .iter()
            .find(|(name, _)| name.to_uppercase().contains(&needle))
            .map(|(_, amount)| *amount)
    }
}

/// Both portions absent means the template cell stays untouched; one
/// present treats the other as zero.
fn sum_portions(employer: Option<Money>, employee: Option<Money>) -> Option<Money> {
    match (employer, employee) {
        (None, None) => None,
        (er, ee) => Some(er.unwrap_or_else(Money::zero) + ee.unwrap_or_else(Money::zero)),
    }
}
