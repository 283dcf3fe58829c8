use image::{Rgb, RgbImage};
use outflow_core::{Money, Month};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::f64::consts::TAU;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::summary::{display_name, percent_of, Summary};

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Failed to encode chart: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Failed to write chart {}: {cause}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSlice {
    pub label: String,
    pub value: Money,
}

impl ChartSlice {
    pub fn from_summary(summary: &Summary) -> Vec<ChartSlice> {
        summary
            .lines
            .iter()
            .map(|line| ChartSlice {
                label: display_name(&line.category),
                value: line.total,
            })
            .collect()
    }
}

/// Somewhere a category breakdown can be drawn.
pub trait ChartSink {
    /// Draw `slices` and return where the chart went, or `None` when there
    /// was nothing to draw.
    fn render(&self, month: Option<Month>, slices: &[ChartSlice]) -> Result<Option<PathBuf>, ChartError>;
}

pub const OTHER_LABEL: &str = "Other";

/// Folds slices below `threshold` percent of the total into one trailing
/// `Other` slice. A single small slice is left as it is.
pub fn group_small(slices: &[ChartSlice], threshold: Decimal) -> Vec<ChartSlice> {
    let total: Money = slices.iter().map(|s| s.value).sum();
    let (mut kept, small): (Vec<ChartSlice>, Vec<ChartSlice>) = slices
        .iter()
        .cloned()
        .partition(|s| percent_of(s.value, total) >= threshold);

    if small.len() > 1 {
        kept.push(ChartSlice {
            label: OTHER_LABEL.to_string(),
            value: small.iter().map(|s| s.value).sum(),
        });
    } else {
        kept.extend(small);
    }
    kept
}

/// One console line per slice, in slice (and swatch) order.
pub fn legend(slices: &[ChartSlice], symbol: &str) -> Vec<String> {
    let total: Money = slices.iter().map(|s| s.value).sum();
    slices
        .iter()
        .map(|s| {
            let whole = s
                .value
                .amount()
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            format!("{}: {symbol}{whole} ({:.1}%)", s.label, percent_of(s.value, total))
        })
        .collect()
}

// Set3 qualitative palette.
const PALETTE: [Rgb<u8>; 12] = [
    Rgb([0x8d, 0xd3, 0xc7]),
    Rgb([0xff, 0xff, 0xb3]),
    Rgb([0xbe, 0xba, 0xda]),
    Rgb([0xfb, 0x80, 0x72]),
    Rgb([0x80, 0xb1, 0xd3]),
    Rgb([0xfd, 0xb4, 0x62]),
    Rgb([0xb3, 0xde, 0x69]),
    Rgb([0xfc, 0xcd, 0xe5]),
    Rgb([0xd9, 0xd9, 0xd9]),
    Rgb([0xbc, 0x80, 0xbd]),
    Rgb([0xcc, 0xeb, 0xc5]),
    Rgb([0xff, 0xed, 0x6f]),
];
const BACKGROUND: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const MARGIN: u32 = 20;
const SWATCH: u32 = 24;

pub fn slice_colour(index: usize) -> Rgb<u8> {
    PALETTE[index % PALETTE.len()]
}

/// PNG pie chart written to `dir` as `expense_breakdown[_YYYY-MM].png`.
///
/// Slices run clockwise from twelve o'clock; a column of colour swatches to
/// the right of the pie matches [`legend`] line by line.
#[derive(Debug, Clone)]
pub struct PieChart {
    dir: PathBuf,
    diameter: u32,
}

impl PieChart {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), diameter: 600 }
    }

    pub fn with_diameter(mut self, diameter: u32) -> Self {
        self.diameter = diameter;
        self
    }

    pub fn file_name(month: Option<Month>) -> String {
        match month {
            Some(month) => format!("expense_breakdown_{month}.png"),
            None => "expense_breakdown.png".to_string(),
        }
    }

    pub fn draw(&self, slices: &[ChartSlice]) -> RgbImage {
        let legend_rows = slices.len() as u32;
        let width = self.diameter + 3 * MARGIN + SWATCH + MARGIN;
        let height = (self.diameter + 2 * MARGIN).max(MARGIN + legend_rows * (SWATCH + MARGIN));
        let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

        let values: Vec<f64> = slices
            .iter()
            .map(|s| s.value.amount().to_f64().unwrap_or(0.0))
            .collect();
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            return img;
        }

        let mut ends = Vec::with_capacity(values.len());
        let mut running = 0.0;
        for v in &values {
            running += v / total;
            ends.push(running);
        }

        let radius = f64::from(self.diameter) / 2.0;
        let centre = f64::from(MARGIN) + radius;
        for (x, y, px) in img.enumerate_pixels_mut() {
            let dx = f64::from(x) + 0.5 - centre;
            let dy = f64::from(y) + 0.5 - centre;
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let turn = dx.atan2(-dy).rem_euclid(TAU) / TAU;
            let idx = ends.iter().position(|&end| turn < end).unwrap_or(ends.len() - 1);
            *px = slice_colour(idx);
        }

        let swatch_x = self.diameter + 3 * MARGIN;
        for idx in 0..legend_rows {
            let top = MARGIN + idx * (SWATCH + MARGIN);
            for y in top..top + SWATCH {
                for x in swatch_x..swatch_x + SWATCH {
                    img.put_pixel(x, y, slice_colour(idx as usize));
                }
            }
        }

        img
    }
}

impl ChartSink for PieChart {
    fn render(&self, month: Option<Month>, slices: &[ChartSlice]) -> Result<Option<PathBuf>, ChartError> {
        let total: Money = slices.iter().map(|s| s.value).sum();
        if total.is_zero() {
            info!("No expenses to chart");
            return Ok(None);
        }

        let mut buf = Vec::new();
        self.draw(slices)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

        let path = self.dir.join(Self::file_name(month));
        fs::write(&path, buf).map_err(|cause| ChartError::Write { path: path.clone(), cause })?;
        info!(path = %path.display(), slices = slices.len(), "chart saved");
        Ok(Some(path))
    }
}
