use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::HashMap;

use crate::paste::Row;

/// Known columns of a monthly intake sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Date,
    Vehicle,
    Material,
    WeighIn,
    WeighOut,
    TotalTime,
    Quantity,
    Bag,
    NetWeight,
    Cause,
    Detail,
}

impl Column {
    /// Match a header cell exactly as it appears in the sheet template.
    pub fn from_header(header: &str) -> Option<Self> {
        match header.trim() {
            "Ngày/tháng" => Some(Column::Date),
            "Số Xe" => Some(Column::Vehicle),
            "Tên nguyên liệu" => Some(Column::Material),
            "Xe cân VÀO" => Some(Column::WeighIn),
            "Xe cân RA" => Some(Column::WeighOut),
            "Tổng thời gian" => Some(Column::TotalTime),
            "Số lượng" => Some(Column::Quantity),
            "Bag." => Some(Column::Bag),
            "Net.Wgh. (kg)" => Some(Column::NetWeight),
            "Nguyên nhân" => Some(Column::Cause),
            "Lí do chi tiết" => Some(Column::Detail),
            _ => None,
        }
    }
}

/// Header plus data rows read back from a worksheet, all the same width.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Frame {
    pub headers: Vec<String>,
    pub columns: Vec<Option<Column>>,
    pub rows: Vec<Row>,
}

impl Frame {
    /// Locate the header row and build a frame from raw sheet values
    ///
    /// The header is the first row whose first cell contains `header_marker`,
    /// falling back to the very first row. Only rows before index `max_row`
    /// are considered. Rows that are entirely empty are dropped.
    ///
    /// # Arguments
    /// * `values` - Whole-sheet values, row 0 being sheet row 1
    /// * `header_marker` - Text identifying the header row, e.g. `Ngày/tháng`
    /// * `max_row` - Exclusive row index where reading stops
    ///
    /// # Returns
    /// * `Frame` - Empty when there is no data below the header
    pub fn from_values(values: &[Row], header_marker: &str, max_row: usize) -> Self {
        let start = values
            .iter()
            .position(|row| row.first().is_some_and(|cell| cell.contains(header_marker)))
            .unwrap_or(0);
        let end = max_row.min(values.len());
        if end <= start + 1 {
            return Frame::default();
        }

        let window = &values[start..end];
        let width = window.iter().map(Vec::len).max().unwrap_or(0);
        let pad = |row: &Row| {
            let mut row = row.clone();
            row.resize(width, String::new());
            row
        };

        let headers = pad(&window[0]);
        let rows: Vec<Row> = window[1..]
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(pad)
            .collect();
        let columns = headers.iter().map(|h| Column::from_header(h)).collect();

        Frame {
            headers,
            columns,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|c| *c == Some(column))
    }

    /// Values of one column, one per data row; `None` if the column is absent.
    pub fn column_values(&self, column: Column) -> Option<impl Iterator<Item = &str>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }
}

/// Thresholds used by [`Summary::compute`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRules {
    /// Weigh-out strictly after this time counts as a late intake
    pub late_cutoff: NaiveTime,
    /// Intake longer than this counts as slow
    pub slow_threshold: Duration,
}

impl Default for ReportRules {
    fn default() -> Self {
        ReportRules {
            late_cutoff: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            slow_threshold: Duration::minutes(120),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CauseCount {
    pub cause: String,
    pub count: usize,
}

/// Headline numbers for one month.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub total_vehicles: usize,
    pub late_vehicles: usize,
    /// Percentage of vehicles that were late, 0 with no vehicles
    pub late_ratio: f64,
    pub slow_vehicles: usize,
    pub average_minutes: Option<f64>,
    pub total_net_weight: f64,
    pub total_quantity: f64,
    pub causes: Vec<CauseCount>,
}

impl Summary {
    pub fn compute(frame: &Frame, rules: &ReportRules) -> Self {
        let cell = |row: &Row, column: Column| -> Option<String> {
            frame.column_index(column).map(|idx| row[idx].clone())
        };

        let mut late_vehicles = 0;
        let mut slow_vehicles = 0;
        let mut durations = Vec::new();

        for row in &frame.rows {
            let weigh_in = cell(row, Column::WeighIn).and_then(|v| parse_time(&v));
            let weigh_out = cell(row, Column::WeighOut).and_then(|v| parse_time(&v));

            if weigh_out.is_some_and(|t| t > rules.late_cutoff) {
                late_vehicles += 1;
            }

            let duration = cell(row, Column::TotalTime)
                .and_then(|v| parse_duration(&v))
                .or_else(|| match (weigh_in, weigh_out) {
                    (Some(start), Some(end)) => Some(elapsed(start, end)),
                    _ => None,
                });
            if let Some(duration) = duration {
                if duration > rules.slow_threshold {
                    slow_vehicles += 1;
                }
                durations.push(duration);
            }
        }

        let total_vehicles = frame.rows.len();
        let late_ratio = if total_vehicles == 0 {
            0.0
        } else {
            late_vehicles as f64 * 100.0 / total_vehicles as f64
        };
        let average_minutes = if durations.is_empty() {
            None
        } else {
            let seconds = durations
                .iter()
                .fold(0i64, |acc, d| acc.saturating_add(d.num_seconds()));
            Some(seconds as f64 / 60.0 / durations.len() as f64)
        };

        Summary {
            total_vehicles,
            late_vehicles,
            late_ratio,
            slow_vehicles,
            average_minutes,
            total_net_weight: sum_numbers(frame, Column::NetWeight),
            total_quantity: sum_numbers(frame, Column::Quantity),
            causes: count_causes(frame),
        }
    }
}

fn sum_numbers(frame: &Frame, column: Column) -> f64 {
    frame
        .column_values(column)
        .map(|values| values.filter_map(parse_number).sum())
        .unwrap_or(0.0)
}

fn count_causes(frame: &Frame) -> Vec<CauseCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    if let Some(values) = frame.column_values(Column::Cause) {
        for cause in values.map(str::trim).filter(|c| !c.is_empty()) {
            *counts.entry(cause).or_default() += 1;
        }
    }

    let mut causes: Vec<CauseCount> = counts
        .into_iter()
        .map(|(cause, count)| CauseCount {
            cause: cause.to_string(),
            count,
        })
        .collect();
    causes.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.cause.cmp(&b.cause)));
    causes
}

/// Clock time in a cell: `HH:MM:SS`, `HH:MM`, or a full `YYYY-MM-DD HH:MM:SS`.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.time())
        })
}

/// Elapsed time written as `H:MM:SS` or `H:MM`; hours may exceed 24.
///
/// Values too large for a [`Duration`] count as missing.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let parts: Vec<i64> = value
        .trim()
        .split(':')
        .map(|p| p.parse::<i64>().ok().filter(|n| *n >= 0))
        .collect::<Option<_>>()?;

    let (h, m, s) = match parts.as_slice() {
        [h, m, s] if *m < 60 && *s < 60 => (*h, *m, *s),
        [h, m] if *m < 60 => (*h, *m, 0),
        _ => return None,
    };
    let seconds = h.checked_mul(3600)?.checked_add(m * 60 + s)?;
    Duration::try_seconds(seconds)
}

/// Numeric cell value; anything unparseable counts as missing.
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

// weigh-out before weigh-in means the truck left after midnight
fn elapsed(start: NaiveTime, end: NaiveTime) -> Duration {
    let diff = end.signed_duration_since(start);
    if diff < Duration::zero() {
        diff + Duration::hours(24)
    } else {
        diff
    }
}
