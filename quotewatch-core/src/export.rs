//! CSV and JSON export of a dashboard view.

use crate::indicators::AnnotatedSeries;
use crate::pipeline::DashboardView;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("export I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8")]
    Utf8,
}

/// Annotated rows oldest-first. Missing indicator values are empty cells.
///
/// Columns: timestamp, open, high, low, close, volume, sma_short, sma_long, rsi
pub fn export_csv(series: &AnnotatedSeries) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "sma_short",
        "sma_long",
        "rsi",
    ])?;

    let cell = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();

    for row in series.rows() {
        let p = row.point;
        wtr.write_record([
            p.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.4}", p.open),
            format!("{:.4}", p.high),
            format!("{:.4}", p.low),
            format!("{:.4}", p.close),
            p.volume.to_string(),
            cell(row.sma_short),
            cell(row.sma_long),
            cell(row.rsi),
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    String::from_utf8(data).map_err(|_| ExportError::Utf8)
}

pub fn write_csv(path: &Path, series: &AnnotatedSeries) -> Result<(), ExportError> {
    std::fs::write(path, export_csv(series)?)?;
    Ok(())
}

pub fn export_json(view: &DashboardView) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(view)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Interval, Symbol, TimeSeries};
    use crate::indicators::{annotate, make_points, IndicatorParams};

    fn annotated() -> AnnotatedSeries {
        let series = TimeSeries::new(
            Symbol::new("MSFT").unwrap(),
            Interval::FiveMinutes,
            make_points(&[10.0, 11.0, 12.0]),
        )
        .unwrap();
        annotate(series, &IndicatorParams::new(2, 3, 2).unwrap()).unwrap()
    }

    #[test]
    fn csv_has_header_and_empty_missing_cells() {
        let csv = export_csv(&annotated()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "timestamp,open,high,low,close,volume,sma_short,sma_long,rsi"
        );
        assert_eq!(
            lines[1],
            "2024-01-02 09:30:00,10.0000,11.0000,9.0000,10.0000,1000,,,"
        );
        assert!(lines[3].ends_with(",11.500000,11.000000,100.000000"));
    }

    #[test]
    fn write_csv_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("msft.csv");
        write_csv(&path, &annotated()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("timestamp,"));
    }
}
