pub mod classification_report;
pub mod reset_report;
