use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::off::ProductSummary;
use crate::scan::{ScanError, ScanReport, Scanned};
use crate::scoring::{Grade, ScoreResult, Severity};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn paint_grade(grade: Grade, text: &str, use_colors: bool) -> String {
    if !use_colors {
        return text.to_string();
    }
    match grade {
        Grade::Excellent => text.green().bold().to_string(),
        Grade::Good => text.green().to_string(),
        Grade::Average => text.yellow().to_string(),
        Grade::Poor => text.red().to_string(),
    }
}

fn paint_severity(severity: Severity, use_colors: bool) -> String {
    let label = severity.as_str();
    if !use_colors {
        return label.to_string();
    }
    match severity {
        Severity::High => label.red().bold().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::Low | Severity::Unknown => label.dimmed().to_string(),
    }
}

/// Format a single scan as a multi-line report
pub fn format_report(report: &ScanReport, cached: bool, use_colors: bool) -> String {
    let barcode_line = format!(
        "  Barcode: {}{}",
        report.barcode,
        if cached { " (cached)" } else { "" }
    );
    render(&report.product, Some(barcode_line), &report.score, use_colors)
}

/// Format a score for a product that did not come from a barcode scan
pub fn format_product_score(product: &ProductSummary, score: &ScoreResult, use_colors: bool) -> String {
    render(product, None, score, use_colors)
}

fn render(product: &ProductSummary, barcode_line: Option<String>, score: &ScoreResult, use_colors: bool) -> String {
    let breakdown = &score.breakdown;

    let headline = format!("{}/100 {}", score.total, score.grade);
    let title = if use_colors {
        format!("{} ({})", product.name.bold(), product.brand.cyan())
    } else {
        format!("{} ({})", product.name, product.brand)
    };

    let mut lines = vec![title];
    lines.extend(barcode_line);
    lines.push(format!("  Score: {}", paint_grade(score.grade, &headline, use_colors)));

    if breakdown.pure_water {
        lines.push("  Plain water: nutrition and additive checks skipped".to_string());
    }

    let n = &breakdown.nutrition.details;
    lines.push(format!("  Nutrition: {}/100", breakdown.nutrition.score));
    lines.push(format!(
        "    energy -{}  sugars -{}  saturated fat -{}  sodium -{}  fiber +{}  protein +{}",
        n.energy_points, n.sugar_points, n.sat_fat_points, n.sodium_points, n.fiber_points, n.protein_points
    ));

    let additives = &breakdown.additives;
    lines.push(format!(
        "  Additives: {}/100 (penalty {})",
        additives.score, additives.penalty
    ));
    for flagged in &additives.flagged_additives {
        lines.push(format!(
            "    {} [{}]",
            flagged.tag,
            paint_severity(flagged.severity, use_colors)
        ));
    }

    if breakdown.is_organic {
        lines.push(format!("  Organic: +{}", breakdown.organic_bonus));
    }
    if breakdown.has_concerning_allergen {
        lines.push(format!("  Allergens of concern: {}", breakdown.allergen_penalty));
    }

    if let Some(ref image) = product.image_url {
        let image = if use_colors {
            image.underline().to_string()
        } else {
            image.clone()
        };
        lines.push(format!("  Image: {}", image));
    }

    lines.join("\n")
}

/// Format batch results as a table: Index, Score, Grade, Barcode, Name.
/// Failures are listed after the scored products with their error.
pub fn format_batch_table(results: &[(String, Result<Scanned, ScanError>)], use_colors: bool) -> String {
    format_batch_table_with_width(results, use_colors, get_terminal_width())
}

fn format_batch_table_with_width(
    results: &[(String, Result<Scanned, ScanError>)],
    use_colors: bool,
    term_width: Option<usize>,
) -> String {
    if results.is_empty() {
        return "No barcodes scanned.".to_string();
    }

    // "99." + score "100" + grade "excellent" + 20-digit barcode
    let index_width = 3;
    let score_width = 3;
    let grade_width = 9;
    let barcode_width = 20;
    let separator = "  ";
    let fixed_width = index_width + 1 + score_width + grade_width + barcode_width + separator.len() * 3;

    results
        .iter()
        .enumerate()
        .map(|(idx, (input, result))| {
            let index_str = format!("{:>2}.", idx + 1);
            let index_str = if use_colors {
                index_str.dimmed().to_string()
            } else {
                index_str
            };

            match result {
                Ok(scanned) => {
                    let report = &scanned.report;
                    let name = match term_width {
                        Some(width) if width > fixed_width + 10 => {
                            truncate(&report.product.name, width - fixed_width)
                        }
                        // Very narrow terminal, show truncated
                        Some(_) => truncate(&report.product.name, 20),
                        // No terminal (pipe), don't truncate
                        None => report.product.name.clone(),
                    };
                    let score = format!("{:>width$}", report.score.total, width = score_width);
                    let grade = format!("{:<width$}", report.score.grade.as_str(), width = grade_width);
                    format!(
                        "{} {}{}{}{}{:<bw$}{}{}",
                        index_str,
                        paint_grade(report.score.grade, &score, use_colors),
                        separator,
                        paint_grade(report.score.grade, &grade, use_colors),
                        separator,
                        report.barcode.as_str(),
                        separator,
                        name,
                        bw = barcode_width
                    )
                }
                Err(e) => {
                    let message = format!("error: {}", e);
                    let message = if use_colors {
                        message.red().to_string()
                    } else {
                        message
                    };
                    format!(
                        "{} {:>sw$}{}{:<gw$}{}{:<bw$}{}{}",
                        index_str,
                        "-",
                        separator,
                        "-",
                        separator,
                        input.trim(),
                        separator,
                        message,
                        sw = score_width,
                        gw = grade_width,
                        bw = barcode_width
                    )
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
