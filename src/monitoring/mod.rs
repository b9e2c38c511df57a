pub mod arbiter_monitoring_system;
pub mod decision_log;
pub mod overlay;

pub use decision_log::{log_frame_report, log_to_csv, read_csv, summarize, ReportSummary};
pub use overlay::render_overlay;
