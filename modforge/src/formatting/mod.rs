//! CLI formatting utilities.
//!
//! Colors, section headers, status lines, tables, and the progress bar shared
//! by every command.

mod headers;
mod output;
mod progress;
mod status;
mod tables;

pub use headers::{print_section_header, SectionStyle};
pub use output::{format_duration, print_key_value, print_separator_with_spacing, print_summary_box};
pub use progress::create_progress_bar;
pub use status::{print_error, print_success, print_warning, Status};
pub use tables::{print_name_list, print_task_table, TaskRow};
