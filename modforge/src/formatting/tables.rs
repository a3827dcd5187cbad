//! Table formatting using comfy-table.

use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;

/// One row of the task listing.
pub struct TaskRow<'a> {
    pub name: &'a str,
    pub prerequisites: &'a [String],
    pub description: &'a str,
    pub root: bool,
}

/// Prints tasks with their prerequisites and descriptions.
pub fn print_task_table(rows: &[TaskRow<'_>]) {
    let mut table = Table::new();
    table
        .set_header(vec![
            Cell::new("Task").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Depends on").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Description").add_attribute(comfy_table::Attribute::Bold),
        ])
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);

    for row in rows {
        let deps = if row.prerequisites.is_empty() {
            "-".to_string()
        } else {
            row.prerequisites.join(", ")
        };
        let name_color = if row.root {
            comfy_table::Color::Cyan
        } else {
            comfy_table::Color::White
        };
        table.add_row(vec![
            Cell::new(row.name).fg(name_color),
            Cell::new(deps).fg(comfy_table::Color::DarkGrey),
            Cell::new(row.description),
        ]);
    }

    println!("{}", table);
}

/// Prints names one per line, or `(none)`.
pub fn print_name_list(names: &[String]) {
    if names.is_empty() {
        println!("  {} {}", "→".cyan(), "(none)".bright_black());
        return;
    }

    for name in names {
        println!("  {} {}", "→".cyan(), name.bold().white());
    }
}
