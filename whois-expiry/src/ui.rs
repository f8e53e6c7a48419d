//! Pretty-mode display logic for whois-expiry CLI.
//!
//! Handles `--pretty` output: a short colored summary of the report on
//! stdout. Uses only the `console` crate.

use console::{pad_str, style, Alignment, StyledObject};
use whois_expiry_lib::ExpiryReport;

/// Reports under this many days left are highlighted as expiring soon.
const EXPIRING_SOON_DAYS: i64 = 30;

const LABEL_WIDTH: usize = 12;

/// Print the report as aligned, colored lines.
pub fn print_report(report: &ExpiryReport) {
    println!("{}", style(&report.domain).bold());
    print_line("Expires", style(report.expiration_date.to_string()).white());
    print_line("Days left", days_left_style(report));
    print_line("Source", style(report.source.to_string()).dim());
}

fn print_line(label: &str, value: StyledObject<String>) {
    let padded = pad_str(label, LABEL_WIDTH, Alignment::Left, None);
    println!("  {}{}", style(padded).dim(), value);
}

/// Red once expired, yellow when close, green otherwise.
fn days_left_style(report: &ExpiryReport) -> StyledObject<String> {
    let text = describe_days_left(report.days_left);
    if report.is_expired() {
        style(text).red().bold()
    } else if report.days_left < EXPIRING_SOON_DAYS {
        style(text).yellow().bold()
    } else {
        style(text).green()
    }
}

fn describe_days_left(days_left: i64) -> String {
    match days_left {
        0 => "expires today".to_string(),
        1 => "1 day".to_string(),
        d if d < 0 => format!(
            "expired {} day{} ago",
            -d,
            if d == -1 { "" } else { "s" }
        ),
        d => format!("{} days", d),
    }
}
