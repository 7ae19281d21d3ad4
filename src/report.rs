use std::fmt::Write;

use crate::output::{InsightOutput, InsightSize};
use crate::registry::ComputedInsight;

/// Renders computed insights as a markdown dashboard. Small insights come
/// first as headline numbers, then charts and tables.
pub fn build_dashboard_report(course_label: &str, window_label: &str, insights: &[ComputedInsight]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Office Hours Insights");
    let _ = writeln!(output, "Generated for {course_label} ({window_label})");
    let _ = writeln!(output);

    if insights.is_empty() {
        let _ = writeln!(output, "No insights available for this role.");
        return output;
    }

    let (small, default): (Vec<&ComputedInsight>, Vec<&ComputedInsight>) = insights
        .iter()
        .partition(|insight| insight.definition.size == InsightSize::Small);

    if !small.is_empty() {
        let _ = writeln!(output, "## At a Glance");
        for insight in small {
            let _ = writeln!(
                output,
                "- {}: {}",
                insight.definition.display_name,
                headline(&insight.output)
            );
        }
    }

    for insight in default {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", insight.definition.display_name);
        let _ = writeln!(output, "_{}_", insight.definition.description);
        let _ = writeln!(output);

        match &insight.output {
            InsightOutput::SimpleDisplay(value) => {
                let _ = writeln!(output, "{value}");
            }
            InsightOutput::BarChart(chart) => {
                for datum in &chart.data {
                    let _ = writeln!(output, "- {}: {}", datum.category, datum.value);
                }
            }
            InsightOutput::SimpleTable(table) => {
                if table.data_source.is_empty() {
                    let _ = writeln!(output, "No rows for this window.");
                    continue;
                }
                let titles: Vec<&str> = table.columns.iter().map(|c| c.title.as_str()).collect();
                let _ = writeln!(output, "| {} |", titles.join(" | "));
                let _ = writeln!(output, "|{}", " --- |".repeat(titles.len()));
                for row in &table.data_source {
                    let cells: Vec<String> = table
                        .columns
                        .iter()
                        .map(|column| cell_text(row.get(&column.data_index)))
                        .collect();
                    let _ = writeln!(output, "| {} |", cells.join(" | "));
                }
            }
        }
    }

    output
}

fn headline(output: &InsightOutput) -> String {
    match output {
        InsightOutput::SimpleDisplay(value) => value.to_string(),
        InsightOutput::BarChart(chart) => format!("{} categories", chart.data.len()),
        InsightOutput::SimpleTable(table) => format!("{} rows", table.data_source.len()),
    }
}

fn cell_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Writes an insight's output as CSV.
pub fn write_csv<W: std::io::Write>(output: &InsightOutput, writer: W) -> csv::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    match output {
        InsightOutput::SimpleDisplay(value) => {
            csv.write_record(["value"])?;
            csv.write_record([value.to_string()])?;
        }
        InsightOutput::BarChart(chart) => {
            csv.write_record([chart.y_field.as_str(), chart.x_field.as_str()])?;
            for datum in &chart.data {
                csv.write_record([datum.category.clone(), datum.value.to_string()])?;
            }
        }
        InsightOutput::SimpleTable(table) => {
            csv.write_record(table.columns.iter().map(|column| column.title.as_str()))?;
            for row in &table.data_source {
                csv.write_record(
                    table
                        .columns
                        .iter()
                        .map(|column| cell_text(row.get(&column.data_index))),
                )?;
            }
        }
    }

    csv.flush()?;
    Ok(())
}
