pub mod money;
pub mod record;
pub mod staff;

pub use money::Money;
pub use record::{OvertimeEntry, PayslipRecord};
pub use staff::{StaffCode, StaffCodeError};
