//! Output formatting module for bizperf
//!
//! This module provides formatters for displaying reports in different formats:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output and integration with other tools
//!
//! Money is shown as whole VND with thousands separators, BMM with two
//! decimals, and profit percent with one decimal. A line with zero revenue
//! shows `-` instead of a percent.
//!
//! # Examples
//!
//! ```
//! use bizperf::aggregation_types::{Report, ReportKind};
//! use bizperf::output::get_formatter;
//!
//! let report = Report::new(ReportKind::Company, 2024, vec![1], vec![]);
//!
//! // Table formatter for human-readable output
//! let formatter = get_formatter(false, false);
//! println!("{}", formatter.format_report(&report));
//!
//! // JSON formatter for machine-readable output
//! let json_formatter = get_formatter(true, false);
//! assert!(json_formatter.format_report(&report).contains("\"report\": \"company\""));
//! ```

use crate::aggregation_types::{Report, ReportLine, Totals};
use crate::types::{OverheadCostRecord, RevenueRecord, SalaryCostRecord};
use colored::Colorize;
use prettytable::{Cell, Row, Table, format, row};
use serde_json::json;

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a finalized report with its totals row
    fn format_report(&self, report: &Report) -> String;

    /// Format stored revenue rows
    fn format_revenues(&self, rows: &[RevenueRecord]) -> String;

    /// Format stored salary rows
    fn format_salaries(&self, rows: &[SalaryCostRecord]) -> String;

    /// Format stored cost rows
    fn format_costs(&self, rows: &[OverheadCostRecord]) -> String;
}

/// Format a whole number with thousands separators
///
/// # Examples
/// ```
/// use bizperf::output::format_number;
///
/// assert_eq!(format_number(1234567), "1,234,567");
/// assert_eq!(format_number(-1000), "-1,000");
/// assert_eq!(format_number(999), "999");
/// ```
pub fn format_number(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let mut result = String::new();

    for (count, ch) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }

    if n < 0 {
        result.push('-');
    }
    result.chars().rev().collect()
}

/// Round to whole VND
pub fn round_vnd(amount: f64) -> i64 {
    amount.round() as i64
}

/// Whole VND with thousands separators
pub fn format_money(amount: f64) -> String {
    format_number(round_vnd(amount))
}

/// BMM with two decimals
pub fn format_bmm(bmm: f64) -> String {
    format!("{bmm:.2}")
}

/// Profit percent with one decimal, `-` when revenue was zero
///
/// # Examples
/// ```
/// use bizperf::output::format_percent;
///
/// assert_eq!(format_percent(Some(70.0)), "70.0%");
/// assert_eq!(format_percent(Some(0.0)), "0.0%");
/// assert_eq!(format_percent(None), "-");
/// ```
pub fn format_percent(percent: Option<f64>) -> String {
    match percent {
        Some(p) => format!("{p:.1}%"),
        None => "-".to_string(),
    }
}

fn month_label(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

/// Table formatter for human-readable output
pub struct TableFormatter {
    /// Whether negative profit is coloured
    pub color: bool,
}

impl TableFormatter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn profit_cell(&self, profit: f64) -> Cell {
        let text = format_money(profit);
        if self.color && profit < 0.0 {
            Cell::new(&text.red().to_string()).style_spec("r")
        } else {
            Cell::new(&text).style_spec("r")
        }
    }

    fn line_row(&self, line: &ReportLine) -> Row {
        let s = &line.summary;
        Row::new(vec![
            Cell::new(&month_label(s.period.year, s.period.month)),
            Cell::new(&s.code),
            Cell::new(&s.name),
            Cell::new(&format_bmm(s.bmm)).style_spec("r"),
            Cell::new(&format_money(s.revenue)).style_spec("r"),
            Cell::new(&format_money(s.salary_cost)).style_spec("r"),
            Cell::new(&format_money(s.overhead_cost)).style_spec("r"),
            Cell::new(&format_money(line.bonus)).style_spec("r"),
            Cell::new(&format_money(line.total_cost)).style_spec("r"),
            self.profit_cell(line.profit),
            Cell::new(&format_percent(line.profit_percent)).style_spec("r"),
        ])
    }

    /// Create a totals row for report tables
    fn format_totals_row(totals: &Totals) -> Row {
        row![
            b -> "TOTAL",
            "",
            "",
            br -> format_bmm(totals.bmm),
            br -> format_money(totals.revenue),
            br -> format_money(totals.salary_cost),
            br -> format_money(totals.overhead_cost),
            br -> format_money(totals.bonus),
            br -> format_money(totals.total_cost),
            br -> format_money(totals.profit),
            br -> format_percent(totals.profit_percent)
        ]
    }

    fn new_table() -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table
    }

    fn optional(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or("-")
    }
}

impl OutputFormatter for TableFormatter {
    fn format_report(&self, report: &Report) -> String {
        let mut table = Self::new_table();

        table.set_titles(row![
            b -> "Month",
            b -> "Code",
            b -> "Name",
            b -> "BMM",
            b -> "Revenue",
            b -> "Salary",
            b -> "Overhead",
            b -> "Bonus",
            b -> "Total Cost",
            b -> "Profit",
            b -> "Profit %"
        ]);

        for line in &report.lines {
            table.add_row(self.line_row(line));
        }

        // Add separator
        table.add_row(Row::new(vec![Cell::new(""); 11]));

        // Add totals row
        table.add_row(Self::format_totals_row(&report.totals));

        format!(
            "{} performance, {} (months {})\n{}",
            capitalize(report.kind.as_str()),
            report.year,
            report
                .months
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(","),
            table
        )
    }

    fn format_revenues(&self, rows: &[RevenueRecord]) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "ID",
            b -> "Month",
            b -> "Company",
            b -> "Division",
            b -> "Customer",
            b -> "Project",
            b -> "BMM",
            b -> "Revenue"
        ]);

        for rev in rows {
            table.add_row(row![
                rev.id,
                month_label(rev.year, rev.month),
                Self::optional(&rev.company_id),
                Self::optional(&rev.division_id),
                Self::optional(&rev.customer_id),
                Self::optional(&rev.project_name),
                r -> format_bmm(rev.quantity),
                r -> format_money(rev.vnd_revenue)
            ]);
        }

        table.to_string()
    }

    fn format_salaries(&self, rows: &[SalaryCostRecord]) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "ID",
            b -> "Month",
            b -> "Company",
            b -> "Division",
            b -> "Customer",
            b -> "Amount"
        ]);

        for salary in rows {
            table.add_row(row![
                salary.id,
                month_label(salary.year, salary.month),
                Self::optional(&salary.company_id),
                Self::optional(&salary.division_id),
                Self::optional(&salary.customer_id),
                r -> format_money(salary.amount)
            ]);
        }

        table.to_string()
    }

    fn format_costs(&self, rows: &[OverheadCostRecord]) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "ID",
            b -> "Month",
            b -> "Description",
            b -> "Cost",
            b -> "Overhead"
        ]);

        for cost in rows {
            table.add_row(row![
                cost.id,
                month_label(cost.year, cost.month),
                Self::optional(&cost.description),
                r -> format_money(cost.cost),
                c -> if cost.is_cost { "yes" } else { "no" }
            ]);
        }

        table.to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// JSON formatter for machine-readable output
///
/// Figures are emitted unrounded; `profit_percent` is `null` when revenue
/// is zero.
pub struct JsonFormatter;

impl JsonFormatter {
    fn to_pretty(value: &serde_json::Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &Report) -> String {
        let output = json!({
            "report": report.kind.as_str(),
            "year": report.year,
            "months": report.months,
            "lines": report.lines.iter().map(|l| json!({
                "month": l.summary.period.month,
                "group": l.summary.group,
                "code": l.summary.code,
                "name": l.summary.name,
                "bmm": l.summary.bmm,
                "revenue": l.summary.revenue,
                "salary_cost": l.summary.salary_cost,
                "overhead_cost": l.summary.overhead_cost,
                "bonus": l.bonus,
                "total_cost": l.total_cost,
                "profit": l.profit,
                "profit_percent": l.profit_percent,
            })).collect::<Vec<_>>(),
            "totals": report.totals,
        });

        Self::to_pretty(&output)
    }

    fn format_revenues(&self, rows: &[RevenueRecord]) -> String {
        Self::to_pretty(&json!({ "revenues": rows }))
    }

    fn format_salaries(&self, rows: &[SalaryCostRecord]) -> String {
        Self::to_pretty(&json!({ "salary_costs": rows }))
    }

    fn format_costs(&self, rows: &[OverheadCostRecord]) -> String {
        Self::to_pretty(&json!({ "costs": rows }))
    }
}

/// Pick a formatter for the requested output mode
pub fn get_formatter(json: bool, color: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter::new(color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation_types::{PeriodSummary, ReportKind};
    use crate::types::{GroupKey, Period};

    fn line(code: &str, revenue: f64, salary: f64) -> ReportLine {
        PeriodSummary {
            period: Period {
                year: 2024,
                month: 1,
            },
            group: GroupKey::Company {
                company_id: code.to_string(),
            },
            code: code.to_string(),
            name: format!("{code} Ltd"),
            bmm: 10.0,
            revenue,
            salary_cost: salary,
            overhead_cost: 100_000.0,
            bonus_value: Some(0.0),
        }
        .finalize(0.0)
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(-1_234_567), "-1,234,567");
        assert_eq!(format_money(999.5), "1,000");
        assert_eq!(format_money(-0.4), "0");
        assert_eq!(format_bmm(1.0 / 3.0), "0.33");
    }

    #[test]
    fn test_table_output() {
        let report = Report::new(
            ReportKind::Company,
            2024,
            vec![1],
            vec![line("A", 1_000_000.0, 200_000.0)],
        );
        let output = TableFormatter::new(false).format_report(&report);

        assert!(output.starts_with("Company performance, 2024 (months 1)"));
        assert!(output.contains("2024-01"));
        assert!(output.contains("A Ltd"));
        assert!(output.contains("1,000,000"));
        assert!(output.contains("700,000"));
        assert!(output.contains("70.0%"));
        assert!(output.contains("TOTAL"));
    }

    #[test]
    fn test_zero_revenue_renders_dash() {
        let report = Report::new(
            ReportKind::Company,
            2024,
            vec![1],
            vec![line("A", 0.0, 200_000.0)],
        );
        let output = TableFormatter::new(false).format_report(&report);
        assert!(!output.contains("NaN"));
        assert!(!output.contains("0.0%"));

        let json_output = JsonFormatter.format_report(&report);
        let parsed: serde_json::Value = serde_json::from_str(&json_output).unwrap();
        assert!(parsed["lines"][0]["profit_percent"].is_null());
        assert_eq!(parsed["lines"][0]["profit"], -300_000.0);
    }

    #[test]
    fn test_json_output() {
        let report = Report::new(
            ReportKind::Company,
            2024,
            vec![1, 2],
            vec![line("A", 1_000_000.0, 200_000.0)],
        );
        let parsed: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format_report(&report)).unwrap();

        assert_eq!(parsed["report"], "company");
        assert_eq!(parsed["months"], json!([1, 2]));
        assert_eq!(parsed["lines"][0]["code"], "A");
        assert_eq!(parsed["lines"][0]["group"]["kind"], "company");
        assert_eq!(parsed["totals"]["profit"], 700_000.0);
        assert_eq!(parsed["totals"]["profit_percent"], 70.0);
    }
}
