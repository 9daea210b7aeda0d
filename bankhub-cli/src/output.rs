//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use rust_decimal::Decimal;

use bankhub_core::{SkippedStage, Stage};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format an amount with its currency, two decimal places
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    format!("{} {}", currency, amount.round_dp(2))
}

/// Human label for where an institution ended up
pub fn stage_label(stage: Stage, skipped: Option<&SkippedStage>) -> String {
    match skipped {
        Some(s) => format!("skipped at {}", s.stage.as_str()),
        None => stage.as_str().replace('_', " "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::new(-12345, 3), "BRL"), "BRL -12.34");
        assert_eq!(format_amount(Decimal::new(500, 0), "BRL"), "BRL 500");
    }

    #[test]
    fn test_stage_label() {
        assert_eq!(stage_label(Stage::Done, None), "done");
        let skipped = SkippedStage {
            stage: Stage::AccountsEnumerated,
            reason: "HTTP 500".to_string(),
        };
        assert_eq!(
            stage_label(Stage::Done, Some(&skipped)),
            "skipped at accounts_enumerated"
        );
    }
}
