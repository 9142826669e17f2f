use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use super::{Metric, Timeline, month_label};

const PROJECT_HEADER: &str = "Project name";
const NULL_CELL: &str = "null";

/// Write one metric as a wide CSV: one row per artifact, one column per
/// month.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_metric_csv<W: io::Write>(
    out: W,
    metric: Metric,
    months: &[NaiveDate],
    timelines: &[Timeline],
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = Vec::with_capacity(months.len() + 1);
    header.push(PROJECT_HEADER.to_string());
    header.extend(months.iter().copied().map(month_label));
    writer.write_record(&header)?;

    for timeline in timelines {
        let mut row = Vec::with_capacity(months.len() + 1);
        row.push(timeline.artifact.to_string());
        for month in months {
            let cell = timeline
                .points
                .iter()
                .find(|point| point.month == *month)
                .and_then(|point| point.metrics())
                .map_or_else(|| NULL_CELL.to_string(), |m| metric.render(m));
            row.push(cell);
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write `<metric>.csv` for every [`Metric`] into `out_dir`, creating the
/// directory if needed. Returns the written paths in [`Metric::ALL`] order.
///
/// # Errors
///
/// Returns an error if the directory or any file cannot be written.
pub fn write_metric_csvs(
    out_dir: &Path,
    months: &[NaiveDate],
    timelines: &[Timeline],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let path = out_dir.join(format!("{}.csv", metric.name()));
        let file = fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_metric_csv(io::BufWriter::new(file), metric, months, timelines)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    info!(
        dir = %out_dir.display(),
        files = written.len(),
        rows = timelines.len(),
        "timeline exported"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{MissingReason, MonthMetrics, MonthOutcome, MonthPoint};
    use depchron_core::{ArtifactId, ArtifactTag};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn timeline() -> Timeline {
        let measured = MonthMetrics {
            upstreams: 3,
            downstreams: 1,
            t_upstreams: 7,
            t_downstreams: 2,
            d_upstreams: 0,
            dc_katz: 5.5,
        };
        Timeline {
            artifact: ArtifactId::new("com.hankcs:hanlp"),
            points: vec![
                MonthPoint {
                    month: day(2019, 1, 1),
                    evaluated_at: day(2019, 2, 1),
                    outcome: MonthOutcome::Missing {
                        reason: MissingReason::NotInGraph {
                            tag: ArtifactTag::from("com.hankcs:hanlp:1.0"),
                        },
                    },
                },
                MonthPoint {
                    month: day(2019, 2, 1),
                    evaluated_at: day(2019, 3, 1),
                    outcome: MonthOutcome::Measured {
                        tag: ArtifactTag::from("com.hankcs:hanlp:1.1"),
                        metrics: measured,
                    },
                },
            ],
        }
    }

    #[test]
    fn wide_layout_with_nulls() {
        let months = [day(2019, 1, 1), day(2019, 2, 1)];
        let mut buf = Vec::new();
        write_metric_csv(&mut buf, Metric::TUpstreams, &months, &[timeline()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Project name,2019-JANUARY,2019-FEBRUARY\ncom.hankcs:hanlp,null,7\n"
        );
    }

    #[test]
    fn writes_one_file_per_metric() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("series");
        let months = [day(2019, 1, 1), day(2019, 2, 1)];
        let written = write_metric_csvs(&out, &months, &[timeline()]).unwrap();
        assert_eq!(written.len(), 6);
        let katz = fs::read_to_string(out.join("dc_katz.csv")).unwrap();
        assert!(katz.ends_with("com.hankcs:hanlp,null,5.5\n"));
    }
}
