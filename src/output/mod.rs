pub mod formatter;

pub use formatter::{format_batch_table, format_product_score, format_report, should_use_colors};
