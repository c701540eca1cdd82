//! The fixed column layout of the "SA" payroll template.
//!
//! Every writer in this workspace targets these coordinates; the template
//! itself carries no machine-readable schema, so the letters below are
//! the contract.

/// Zero-based column indices, named after the template headers.
pub mod col {
    pub const NO: u16 = 0; // A  running number
    pub const STAFF_CODE: u16 = 1; // B
    pub const NAME: u16 = 2; // C
    pub const NRIC: u16 = 3; // D
    pub const BASIC_PAY: u16 = 4; // E

    // Overtime hour/amount pairs per multiplier.
    pub const OT10_HOURS: u16 = 5; // F
    pub const OT10_AMOUNT: u16 = 6; // G
    pub const OT15_HOURS: u16 = 7; // H
    pub const OT15_AMOUNT: u16 = 8; // I
    pub const OT20_HOURS: u16 = 9; // J
    pub const OT20_AMOUNT: u16 = 10; // K
    pub const OT30_HOURS: u16 = 11; // L
    pub const OT30_AMOUNT: u16 = 12; // M
    pub const REST_DAY_HOURS: u16 = 13; // N
    pub const REST_DAY_AMOUNT: u16 = 14; // O
    pub const PUBLIC_HOLIDAY_HOURS: u16 = 15; // P
    pub const PUBLIC_HOLIDAY_AMOUNT: u16 = 16; // Q
    pub const OT_TOTAL: u16 = 17; // R

    pub const CHILD_CARE: u16 = 18; // S
    pub const INCENTIVE: u16 = 19; // T
    pub const COND_INCENTIVE: u16 = 20; // U
    pub const CAR_TRANSPORT: u16 = 21; // V
    pub const TRAVELLING_ALLW: u16 = 22; // W
    pub const TOTAL_PAYABLE: u16 = 23; // X

    pub const EPF_EMPLOYER: u16 = 24; // Y
    pub const EPF_EMPLOYEE: u16 = 25; // Z
    pub const EPF_TOTAL: u16 = 26; // AA
    pub const SOCSO_EMPLOYER: u16 = 27; // AB
    pub const SOCSO_EMPLOYEE: u16 = 28; // AC
    pub const SOCSO_TOTAL: u16 = 29; // AD
    pub const EIS_EMPLOYER: u16 = 30; // AE
    pub const EIS_EMPLOYEE: u16 = 31; // AF
    pub const EIS_TOTAL: u16 = 32; // AG

    pub const STAFF_LOAN: u16 = 33; // AH
    pub const ADVANCE: u16 = 34; // AI
    pub const PCB: u16 = 35; // AJ
    pub const NETT_PAY: u16 = 36; // AK
}

/// First data row of the employee table (template row 11).
pub const DATA_START_ROW: u32 = 10;
/// Start of the "Factory - Office & Admin" section the filler appends to
/// (template row 31).
pub const APPEND_START_ROW: u32 = 30;
/// Rows shown by the template inspector.
pub const INSPECT_ROWS: u32 = 30;

/// "AK" → 36. Case-insensitive; `None` for anything but ASCII letters.
pub fn column_index(letters: &str) -> Option<u16> {
    if letters.is_empty() {
        return None;
    }
    let mut idx: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        idx = idx * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        // Out of u16 range already; keep the accumulator from wrapping.
        if idx > u16::MAX as u32 + 1 {
            return None;
        }
    }
    u16::try_from(idx - 1).ok()
}

/// 36 → "AK".
pub fn column_letters(mut index: u16) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ascii")
}

/// An A1-style reference for a zero-based (row, col) pair.
pub fn cell_ref(row: u32, column: u16) -> String {
    format!("{}{}", column_letters(column), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_letter_columns() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("b"), Some(1));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
    }

    #[test]
    fn double_letter_columns() {
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("AK"), Some(36));
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(36), "AK");
    }

    #[test]
    fn template_landmarks_match_letters() {
        assert_eq!(column_index("B"), Some(col::STAFF_CODE));
        assert_eq!(column_index("E"), Some(col::BASIC_PAY));
        assert_eq!(column_index("R"), Some(col::OT_TOTAL));
        assert_eq!(column_index("X"), Some(col::TOTAL_PAYABLE));
        assert_eq!(column_index("AA"), Some(col::EPF_TOTAL));
        assert_eq!(column_index("AK"), Some(col::NETT_PAY));
    }

    #[test]
    fn invalid_letters_are_rejected() {
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn out_of_range_letters_are_rejected() {
        // Past u16 territory entirely; must not wrap around.
        assert_eq!(column_index("ZZZZ"), None);
        assert_eq!(column_index("AAAAAAAAAAAAAAAA"), None);
    }

    #[test]
    fn cell_ref_is_one_based() {
        assert_eq!(cell_ref(0, 0), "A1");
        assert_eq!(cell_ref(10, col::STAFF_CODE), "B11");
        assert_eq!(cell_ref(30, col::NETT_PAY), "AK31");
    }

    #[test]
    fn letters_roundtrip() {
        for idx in 0..100u16 {
            assert_eq!(column_index(&column_letters(idx)), Some(idx));
        }
    }
}
