use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::metrics::{rate, revenue_share};
use crate::models::{CampaignRecord, Platform, Post};

pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub struct SeriesSpec<R> {
    pub name: String,
    pub accessor: fn(&R) -> f64,
}

impl<R> SeriesSpec<R> {
    pub fn new(name: impl Into<String>, accessor: fn(&R) -> f64) -> Self {
        Self {
            name: name.into(),
            accessor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CategorySeries {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

/// Categories follow the order of `records`; nothing is sorted.
pub fn to_category_series<R, F>(
    records: &[R],
    category: F,
    specs: &[SeriesSpec<R>],
) -> CategorySeries
where
    F: Fn(&R) -> String,
{
    CategorySeries {
        categories: records.iter().map(&category).collect(),
        series: specs
            .iter()
            .map(|spec| Series {
                name: spec.name.clone(),
                data: records.iter().map(spec.accessor).collect(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSlice {
    pub label: String,
    pub value: f64,
    pub percentage: f64,
}

/// One slice per record, zero-valued records included.
pub fn to_share_slices<R, V, L>(records: &[R], value: V, label: L) -> Vec<ShareSlice>
where
    V: Fn(&R) -> f64,
    L: Fn(&R) -> String,
{
    let total: f64 = records.iter().map(&value).sum();

    records
        .iter()
        .map(|record| {
            let slice_value = value(record);
            ShareSlice {
                label: label(record),
                value: slice_value,
                percentage: revenue_share(slice_value, total),
            }
        })
        .collect()
}

/// `[col_index, row_index, value]`, serialized as a three-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell(pub usize, pub usize, pub f64);

pub fn to_heatmap_cells<S: AsRef<str>>(
    row_labels: &[S],
    col_labels: &[S],
    matrix: &[Vec<f64>],
) -> Result<Vec<HeatmapCell>> {
    let rows_match = matrix.len() == row_labels.len();
    let cols_match = matrix.iter().all(|row| row.len() == col_labels.len());

    if !rows_match || !cols_match {
        return Err(DashboardError::ShapeMismatch {
            expected_rows: row_labels.len(),
            expected_cols: col_labels.len(),
            actual_rows: matrix.len(),
            actual_cols: matrix.iter().map(Vec::len).collect(),
        });
    }

    let mut cells = Vec::with_capacity(row_labels.len() * col_labels.len());
    for (row_index, row) in matrix.iter().enumerate() {
        for (col_index, value) in row.iter().enumerate() {
            cells.push(HeatmapCell(col_index, row_index, *value));
        }
    }
    Ok(cells)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDef {
    pub name: String,
    pub value: f64,
}

impl StageDef {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub name: String,
    pub value: f64,
    /// Percentage lost since the previous stage; 0 for the first stage.
    pub dropoff: f64,
    pub conversion_from_top: f64,
}

pub fn to_funnel_stages(mut stages: Vec<StageDef>) -> Vec<FunnelStage> {
    // NaN stages sink to the end; the rest sort descending.
    stages.sort_by(|a, b| {
        a.value
            .is_nan()
            .cmp(&b.value.is_nan())
            .then_with(|| b.value.total_cmp(&a.value))
    });

    let top = stages.first().map(|stage| stage.value).unwrap_or(0.0);
    let mut previous: Option<f64> = None;
    let mut funnel = Vec::with_capacity(stages.len());

    for stage in stages {
        let dropoff = match previous {
            Some(prev) => rate(prev - stage.value, prev),
            None => 0.0,
        };
        previous = Some(stage.value);
        funnel.push(FunnelStage {
            conversion_from_top: rate(stage.value, top),
            name: stage.name,
            value: stage.value,
            dropoff,
        });
    }

    funnel
}

pub fn campaign_stage_defs(campaign: &CampaignRecord) -> Vec<StageDef> {
    vec![
        StageDef::new("Click-throughs", campaign.click_throughs as f64),
        StageDef::new("Detail page views", campaign.total_dpv as f64),
        StageDef::new("Add to cart", campaign.total_atc as f64),
        StageDef::new("Purchases", campaign.total_purchases as f64),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarIndicator {
    pub name: String,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RadarChart {
    pub indicators: Vec<RadarIndicator>,
    pub series: Vec<RadarSeries>,
}

pub fn to_radar<R, F>(records: &[R], label: F, axes: &[SeriesSpec<R>]) -> RadarChart
where
    F: Fn(&R) -> String,
{
    let indicators = axes
        .iter()
        .map(|axis| {
            let max = records
                .iter()
                .map(axis.accessor)
                .fold(0.0_f64, f64::max);
            RadarIndicator {
                name: axis.name.clone(),
                // an all-zero axis still needs a positive scale
                max: if max > 0.0 { max } else { 1.0 },
            }
        })
        .collect();

    let series = records
        .iter()
        .map(|record| RadarSeries {
            name: label(record),
            values: axes.iter().map(|axis| (axis.accessor)(record)).collect(),
        })
        .collect();

    RadarChart { indicators, series }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityMatrix {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl ActivityMatrix {
    pub fn cells(&self) -> Result<Vec<HeatmapCell>> {
        to_heatmap_cells(&self.rows, &self.cols, &self.values)
    }
}

pub fn post_activity_matrix(posts: &[Post], platforms: &[Platform]) -> ActivityMatrix {
    let mut values = vec![vec![0.0; WEEKDAYS.len()]; platforms.len()];

    for post in posts {
        let Some(row) = platforms.iter().position(|p| *p == post.platform) else {
            continue;
        };
        let col = post.published_on.weekday().num_days_from_monday() as usize;
        values[row][col] += post.views as f64;
    }

    ActivityMatrix {
        rows: platforms.iter().map(|p| p.to_string()).collect(),
        cols: WEEKDAYS.iter().map(|d| d.to_string()).collect(),
        values,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ValueFormat {
    Money { currency: String },
    Number { decimals: u8 },
    Percent { decimals: u8 },
    Integer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesValue {
    pub series: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatterContext {
    pub index: usize,
    pub label: String,
    pub values: Vec<SeriesValue>,
}

impl FormatterContext {
    pub fn from_series(chart: &CategorySeries, index: usize) -> Option<Self> {
        let label = chart.categories.get(index)?.clone();
        let values = chart
            .series
            .iter()
            .filter_map(|series| {
                series.data.get(index).map(|value| SeriesValue {
                    series: series.name.clone(),
                    value: *value,
                })
            })
            .collect();
        Some(Self {
            index,
            label,
            values,
        })
    }
}

pub fn format_tooltip(context: &FormatterContext, format: &ValueFormat) -> String {
    let mut lines = vec![context.label.clone()];
    for entry in &context.values {
        lines.push(format!("{}: {}", entry.series, format_value(entry.value, format)));
    }
    lines.join("\n")
}

pub fn format_value(value: f64, format: &ValueFormat) -> String {
    match format {
        ValueFormat::Money { currency } => {
            let amount = group_thousands(value, 2);
            match currency_symbol(currency) {
                Some(symbol) => match amount.strip_prefix('-') {
                    Some(unsigned) => format!("-{symbol}{unsigned}"),
                    None => format!("{symbol}{amount}"),
                },
                None => format!("{amount} {currency}"),
            }
        }
        ValueFormat::Number { decimals } => group_thousands(value, *decimals as usize),
        ValueFormat::Percent { decimals } => format!("{:.*}%", *decimals as usize, value),
        ValueFormat::Integer => group_thousands(value.round(), 0),
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" | "CNY" => Some("¥"),
        _ => None,
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 1);
    let nonzero = formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    if value < 0.0 && nonzero {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac_part) = frac_part {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    struct Row {
        name: &'static str,
        v: f64,
    }

    fn share_fixture() -> Vec<(&'static str, f64)> {
        vec![
            ("Meta", 3259.44),
            ("Amazon", 479.98),
            ("Official", 55.99),
            ("TikTok", 0.0),
        ]
    }

    #[test]
    fn category_series_preserves_input_order() {
        let rows = vec![Row { name: "B", v: 2.0 }, Row { name: "A", v: 1.0 }];
        let chart = to_category_series(
            &rows,
            |r| r.name.to_string(),
            &[SeriesSpec::new("value", |r: &Row| r.v)],
        );
        assert_eq!(chart.categories, vec!["B", "A"]);
        assert_eq!(chart.series[0].data, vec![2.0, 1.0]);

        let rows = vec![Row { name: "A", v: 1.0 }, Row { name: "B", v: 2.0 }];
        let chart = to_category_series(&rows, |r| r.name.to_string(), &[]);
        assert_eq!(chart.categories, vec!["A", "B"]);
        assert_eq!(chart.categories.len(), rows.len());
    }

    #[test]
    fn share_slices_match_channel_mix() {
        let slices = to_share_slices(&share_fixture(), |r| r.1, |r| r.0.to_string());
        assert_eq!(slices.len(), 4);
        assert!((slices[0].percentage - 85.9).abs() < 0.1);
        assert!((slices[1].percentage - 12.6).abs() < 0.1);
        assert!((slices[2].percentage - 1.5).abs() < 0.1);
        assert_eq!(slices[3].label, "TikTok");
        assert_eq!(slices[3].percentage, 0.0);

        let total: f64 = slices.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 0.05);
    }

    #[test]
    fn share_slices_of_all_zero_values_are_zero() {
        let records = vec![("a", 0.0), ("b", 0.0)];
        let slices = to_share_slices(&records, |r| r.1, |r| r.0.to_string());
        assert_eq!(slices.len(), 2);
        assert!(slices.iter().all(|s| s.percentage == 0.0));
    }

    #[test]
    fn heatmap_flattens_as_col_row_value() {
        let rows = ["r0", "r1"];
        let cols = ["c0", "c1", "c2"];
        let matrix = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let cells = to_heatmap_cells(&rows, &cols, &matrix).unwrap();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], HeatmapCell(0, 0, 1.0));
        assert_eq!(cells[5], HeatmapCell(2, 1, 6.0));
        assert_eq!(serde_json::to_string(&cells[4]).unwrap(), "[1,1,5.0]");
    }

    #[test]
    fn heatmap_rejects_missing_rows() {
        let rows = ["a", "b", "c"];
        let cols = ["w", "x", "y", "z"];
        let matrix = vec![vec![0.0; 4]; 2];
        let err = to_heatmap_cells(&rows, &cols, &matrix).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::ShapeMismatch {
                expected_rows: 3,
                actual_rows: 2,
                ..
            }
        ));
    }

    #[test]
    fn heatmap_rejects_ragged_rows() {
        let rows = ["a", "b"];
        let cols = ["x", "y"];
        let matrix = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            to_heatmap_cells(&rows, &cols, &matrix),
            Err(DashboardError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn funnel_sorts_descending_with_dropoff() {
        let stages = to_funnel_stages(vec![
            StageDef::new("Purchases", 10.0),
            StageDef::new("Clicks", 200.0),
            StageDef::new("Add to cart", 40.0),
            StageDef::new("Views", 100.0),
        ]);
        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Clicks", "Views", "Add to cart", "Purchases"]);
        assert_eq!(stages[0].dropoff, 0.0);
        assert_eq!(stages[1].dropoff, 50.0);
        assert_eq!(stages[2].dropoff, 60.0);
        assert_eq!(stages[3].dropoff, 75.0);
        assert_eq!(stages[3].conversion_from_top, 5.0);
    }

    #[test]
    fn funnel_puts_nan_stages_last_and_keeps_the_rest_descending() {
        let defs = (0..200)
            .map(|i| {
                let value = if i % 7 == 0 { f64::NAN } else { ((i * 37) % 101) as f64 };
                StageDef::new(format!("stage {i}"), value)
            })
            .collect();
        let stages = to_funnel_stages(defs);
        assert_eq!(stages.len(), 200);

        let split = stages.iter().position(|s| s.value.is_nan()).unwrap();
        assert!(stages[split..].iter().all(|s| s.value.is_nan()));
        assert!(stages[..split]
            .windows(2)
            .all(|pair| pair[0].value >= pair[1].value));
        assert!(stages.iter().all(|s| s.dropoff.is_finite()));
    }

    #[test]
    fn funnel_after_empty_stage_has_zero_dropoff() {
        let stages = to_funnel_stages(vec![
            StageDef::new("ATC", 8.0),
            StageDef::new("Purchases", 0.0),
            StageDef::new("Refunds", 0.0),
        ]);
        assert_eq!(stages[1].dropoff, 100.0);
        assert_eq!(stages[2].dropoff, 0.0);
        assert!(to_funnel_stages(Vec::new()).is_empty());
    }

    #[test]
    fn radar_scales_axes_to_max() {
        let rows = vec![Row { name: "A", v: 4.0 }, Row { name: "B", v: 10.0 }];
        let radar = to_radar(
            &rows,
            |r| r.name.to_string(),
            &[
                SeriesSpec::new("v", |r: &Row| r.v),
                SeriesSpec::new("zero", |_: &Row| 0.0),
            ],
        );
        assert_eq!(radar.indicators[0].max, 10.0);
        assert_eq!(radar.indicators[1].max, 1.0);
        assert_eq!(radar.series[1].values, vec![10.0, 0.0]);
    }

    #[test]
    fn activity_matrix_buckets_views_by_weekday() {
        let post = |platform, date: NaiveDate, views| Post {
            id: Uuid::nil(),
            kol_id: Uuid::nil(),
            platform,
            title: "unboxing".to_string(),
            published_on: date,
            views,
            likes: 0,
            comments: 0,
            shares: 0,
        };
        // 2026-03-02 is a Monday
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let posts = vec![
            post(Platform::Tiktok, monday, 100),
            post(Platform::Tiktok, monday, 50),
            post(Platform::Youtube, sunday, 30),
            post(Platform::Twitter, sunday, 999),
        ];
        let matrix = post_activity_matrix(&posts, &[Platform::Youtube, Platform::Tiktok]);
        assert_eq!(matrix.values[1][0], 150.0);
        assert_eq!(matrix.values[0][6], 30.0);
        assert_eq!(matrix.cells().unwrap().len(), 14);
    }

    #[test]
    fn tooltip_formats_each_series() {
        let chart = CategorySeries {
            categories: vec!["Week 1".to_string(), "Week 2".to_string()],
            series: vec![
                Series {
                    name: "Revenue".to_string(),
                    data: vec![3259.44, 1234567.0],
                },
                Series {
                    name: "Spend".to_string(),
                    data: vec![-12.5, 0.0],
                },
            ],
        };
        let context = FormatterContext::from_series(&chart, 1).unwrap();
        let money = ValueFormat::Money {
            currency: "USD".to_string(),
        };
        assert_eq!(
            format_tooltip(&context, &money),
            "Week 2\nRevenue: $1,234,567.00\nSpend: $0.00"
        );
        let first = FormatterContext::from_series(&chart, 0).unwrap();
        assert_eq!(
            format_tooltip(&first, &money),
            "Week 1\nRevenue: $3,259.44\nSpend: -$12.50"
        );
        assert!(FormatterContext::from_series(&chart, 2).is_none());
    }

    #[test]
    fn value_formats_cover_each_kind() {
        assert_eq!(format_value(85.876, &ValueFormat::Percent { decimals: 1 }), "85.9%");
        assert_eq!(format_value(1999.6, &ValueFormat::Integer), "2,000");
        assert_eq!(format_value(-0.001, &ValueFormat::Number { decimals: 2 }), "0.00");
        assert_eq!(
            format_value(1500.0, &ValueFormat::Money { currency: "SEK".to_string() }),
            "1,500.00 SEK"
        );
    }
}
