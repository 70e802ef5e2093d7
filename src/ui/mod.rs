pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    caution, done, empty_listing, entity_ref, failure, format_duration, section, snapshot_written,
    status_ref, summary_row, timing,
};
pub use table::{customer_table, keyword_table, order_table, stats_table};
pub use theme::{theme, Theme};
