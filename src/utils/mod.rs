pub mod constants;
pub mod dates;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use dates::{date_range, month_range, parse_iso_date, parse_timestamp, parse_year_month};
pub use logging::{init_logging, log_banner};
pub use progress::ProgressReporter;
