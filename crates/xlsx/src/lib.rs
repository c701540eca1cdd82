pub mod layout;
pub mod template;
pub mod writer;

pub use layout::{column_index, column_letters};
pub use template::{inspect, SheetReport, Template, TemplateSheet};
pub use writer::{append_employee, fill_summary_row, update_by_staff_code, SheetError};
