pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, empty, error, header, section, status, success, summary_row, warn};
pub use table::{
    carbon_table, measurements_table, projects_table, region_reports_table, regions_table,
    stats_table, targets_table, TableBuilder,
};
pub use theme::{theme, Theme};
