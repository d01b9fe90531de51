//! Terminal output helpers
//!
//! Renders check results and command output. Pure presentation; all
//! pass/fail decisions happen in the probes.

use colored::Colorize;
use vpsops_core::{AggregateReport, CheckResult};

pub fn pass(msg: &str) {
    println!("{}{}", "  PASS ".green(), msg);
}

pub fn fail(msg: &str) {
    println!("{}{}", "  FAIL ".red(), msg);
}

pub fn warn(msg: &str) {
    println!("{}{}", "  WARN ".yellow(), msg);
}

pub fn info(msg: &str) {
    println!("{}{}", "  INFO ".blue(), msg);
}

pub fn header(title: &str) {
    println!();
    println!("{}", format!("=== {} ===", title).cyan().bold());
    println!();
}

pub fn divider() {
    println!("{}", "  ---------------------------------".dimmed());
}

pub fn target_label(target: &str) -> String {
    match target {
        "primary" => "[primary]".magenta().to_string(),
        "secondary" => "[secondary]".blue().to_string(),
        other => format!("[{}]", other).dimmed().to_string(),
    }
}

pub fn print_result(result: &CheckResult) {
    let mut line = format!("{} {}", target_label(&result.target), result.name);
    if !result.detail.is_empty() {
        line.push_str(&format!(" {}", format!("- {}", result.detail).dimmed()));
    }
    if result.ok {
        pass(&line);
    } else {
        fail(&line);
    }
}

pub fn print_report(report: &AggregateReport) {
    for result in &report.results {
        print_result(result);
    }
    println!();
    if report.total == 0 {
        println!("{}", "  No checks ran.".yellow().bold());
    } else if report.all_passed() {
        println!(
            "{}",
            format!("  All {} checks passed.", report.total).green().bold()
        );
    } else {
        println!(
            "{}",
            format!(
                "  {}/{} checks passed, {} failed.",
                report.passed,
                report.total,
                report.total - report.passed
            )
            .yellow()
            .bold()
        );
    }
    println!();
}

pub fn print_output(output: &str) {
    if !output.is_empty() {
        println!("{}", output);
    }
}
