//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use formgrade_engine::Outcome;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Render rows as a table
pub fn render_table<T: TableDisplay>(items: &[T]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(T::headers());
    for item in items {
        table.add_row(item.row());
    }
    table
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    match format {
        OutputFormat::Table => {
            println!("{}", render_table(items));
        }
        OutputFormat::Json => print_json(items),
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                let row = item.row();
                for (header, value) in T::headers().iter().zip(row.iter()) {
                    println!("{}: {}", header, value);
                }
            }
        }
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Short marker for a check outcome
pub fn outcome_symbol(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Pass => "✓",
        Outcome::Fail { .. } => "✗",
        Outcome::Skipped => "-",
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✅".green(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{}  {}", "⚠️".yellow(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("ℹ️  {}", message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgrade_common::FailureKind;

    struct Row(&'static str, u32);

    impl TableDisplay for Row {
        fn headers() -> Vec<&'static str> {
            vec!["Name", "Count"]
        }

        fn row(&self) -> Vec<String> {
            vec![self.0.to_string(), self.1.to_string()]
        }
    }

    #[test]
    fn test_render_table_includes_headers_and_rows() {
        let rendered = render_table(&[Row("email", 3), Row("age", 1)]).to_string();
        assert!(rendered.contains("Name"));
        assert!(rendered.contains("email"));
        assert!(rendered.contains("age"));
    }

    #[test]
    fn test_outcome_symbols() {
        assert_eq!(outcome_symbol(&Outcome::Pass), "✓");
        assert_eq!(outcome_symbol(&Outcome::Skipped), "-");
        let fail = Outcome::Fail {
            kind: FailureKind::LabelMismatch,
            message: String::new(),
        };
        assert_eq!(outcome_symbol(&fail), "✗");
    }
}
