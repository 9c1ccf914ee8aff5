//! Output formatting for records, printouts and reports.
//!
//! Everything is written to a caller-supplied [`Write`] so the binary can
//! target stdout or a file and tests can render into a buffer.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::record::{ServiceRecord, DATE_FORMAT};
use crate::report::{Report, ReportPeriod, ReportRow, RevenueShare};

/// Column headers of the record table.
const RECORD_HEADERS: [&str; 8] = [
    "ID",
    "Date",
    "Chassis number",
    "Registration plate",
    "Make/Model",
    "Service type",
    "Description",
    "Price",
];

/// Field labels of the single-record printout.
const PRINTOUT_LABELS: [&str; 8] = [
    "No.",
    "Date",
    "Chassis number",
    "Registration plate",
    "Make/Model",
    "Service type",
    "Description",
    "Price",
];

/// Write a list of records.
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn write_records<W: Write>(
    out: &mut W,
    records: &[ServiceRecord],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, records)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(RECORD_HEADERS)?;
            for record in records {
                writer.write_record(record_cells(record))?;
            }
            writer.flush()?;
        }
        OutputFormat::Plain => {
            writeln!(out, "{}", RECORD_HEADERS.join("\t"))?;
            for record in records {
                writeln!(out, "{}", record_cells(record).join("\t"))?;
            }
        }
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = records.iter().map(record_cells).collect();
            write_table(out, &RECORD_HEADERS, &rows, &[0, 7])?;
            writeln!(out, "{} record(s)", records.len())?;
        }
    }
    Ok(())
}

fn record_cells(record: &ServiceRecord) -> Vec<String> {
    vec![
        record.id.to_string(),
        record.date.format(DATE_FORMAT).to_string(),
        record.chassis_number.clone(),
        record.registration_plate.clone(),
        record.make_model.clone(),
        record.service_type.clone(),
        record.description.replace('\n', " "),
        record.price.map(|p| p.to_string()).unwrap_or_default(),
    ]
}

/// Write the printable sheet for one record.
///
/// Plain and table formats produce the signed printout; CSV and JSON emit the
/// record data only.
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn write_printout<W: Write>(
    out: &mut W,
    record: &ServiceRecord,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, record)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_records(out, std::slice::from_ref(record), format)?,
        OutputFormat::Plain | OutputFormat::Table => {
            let title = format!("Service no. {}", record.id);
            writeln!(out, "{title}")?;
            writeln!(out, "{}", "=".repeat(title.chars().count()))?;
            writeln!(out)?;

            let width = PRINTOUT_LABELS
                .iter()
                .map(|l| l.chars().count())
                .max()
                .unwrap_or(0)
                + 2;
            for (label, value) in PRINTOUT_LABELS.iter().zip(record_cells(record)) {
                let label = format!("{label}:");
                writeln!(out, "{}{value}", pad_right(&label, width))?;
            }

            writeln!(out)?;
            writeln!(out)?;
            writeln!(out, "{:>60}", "_________________________")?;
            writeln!(out, "{:>60}", "Signature")?;
        }
    }
    Ok(())
}

/// JSON shape of a report, with derived totals and revenue shares.
#[derive(Debug, Serialize)]
struct ReportDocument<'a> {
    title: String,
    period: &'a ReportPeriod,
    generated_on: String,
    rows: &'a [ReportRow],
    shares: Vec<RevenueShare>,
    total_count: i64,
    total_revenue: i64,
}

/// One CSV line of a report.
#[derive(Debug, Serialize)]
struct ReportCsvRow<'a> {
    service_type: &'a str,
    count: i64,
    average_price: Option<String>,
    total_price: Option<i64>,
    share_percent: String,
}

/// Write a summary report.
///
/// # Errors
///
/// Returns an error if writing or serialization fails.
pub fn write_report<W: Write>(out: &mut W, report: &Report, format: OutputFormat) -> Result<()> {
    let shares = report.shares();
    match format {
        OutputFormat::Json => {
            let document = ReportDocument {
                title: report.title(),
                period: &report.period,
                generated_on: report.generated_on.format(DATE_FORMAT).to_string(),
                rows: &report.rows,
                shares,
                total_count: report.total_count(),
                total_revenue: report.total_revenue(),
            };
            serde_json::to_writer_pretty(&mut *out, &document)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for (row, share) in report.rows.iter().zip(&shares) {
                writer.serialize(ReportCsvRow {
                    service_type: &row.service_type,
                    count: row.count,
                    average_price: row.average_price.map(|a| format!("{a:.2}")),
                    total_price: row.total_price,
                    share_percent: format!("{:.1}", share.percent),
                })?;
            }
            writer.flush()?;
        }
        OutputFormat::Plain | OutputFormat::Table => {
            let title = report.title();
            writeln!(out, "{title}")?;
            writeln!(out, "{}", "=".repeat(title.chars().count()))?;
            writeln!(out)?;

            let mut rows: Vec<Vec<String>> = report
                .rows
                .iter()
                .zip(&shares)
                .map(|(row, share)| {
                    vec![
                        row.service_type.clone(),
                        row.count.to_string(),
                        row.average_price
                            .map(|a| format!("{a:.2}"))
                            .unwrap_or_default(),
                        row.total_price.map(|t| t.to_string()).unwrap_or_default(),
                        format!("{:.1}%", share.percent),
                    ]
                })
                .collect();
            let total_share = if report.total_revenue() > 0 { 100.0 } else { 0.0 };
            rows.push(vec![
                "Total".to_string(),
                report.total_count().to_string(),
                String::new(),
                report.total_revenue().to_string(),
                format!("{total_share:.1}%"),
            ]);

            write_table(
                out,
                &["Service type", "Count", "Average price", "Total", "Share"],
                &rows,
                &[1, 2, 3, 4],
            )?;
            writeln!(out)?;
            writeln!(
                out,
                "Generated on: {}",
                report.generated_on.format(DATE_FORMAT)
            )?;
        }
    }
    Ok(())
}

/// Write an aligned text table. Columns listed in `right_aligned` are
/// right-justified.
fn write_table<W: Write>(
    out: &mut W,
    headers: &[&str],
    rows: &[Vec<String>],
    right_aligned: &[usize],
) -> Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    writeln!(out, "{}", render_row(headers, &widths, right_aligned))?;
    writeln!(
        out,
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ")
    )?;
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        writeln!(out, "{}", render_row(&cells, &widths, right_aligned))?;
    }
    Ok(())
}

fn render_row(cells: &[&str], widths: &[usize], right_aligned: &[usize]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let width = widths.get(i).copied().unwrap_or(0);
            if right_aligned.contains(&i) {
                pad_left(cell, width)
            } else {
                pad_right(cell, width)
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn pad_right(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

fn pad_left(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{text}", " ".repeat(width.saturating_sub(len)))
}
