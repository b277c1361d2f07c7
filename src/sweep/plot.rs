use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::sweep::{BinStatistics, SweepError};
/// Which of the finalized arrays to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatSeries {
    Mean,
    StdDev,
    Peak,
}
impl StatSeries {
    pub const ALL: [StatSeries; 3] = [StatSeries::Mean, StatSeries::StdDev, StatSeries::Peak];
    pub fn title(self) -> &'static str {
        match self {
            StatSeries::Mean => "Mean Power vs Frequency",
            StatSeries::StdDev => "Standard Deviation of Power vs Frequency",
            StatSeries::Peak => "Peak Power vs Frequency",
        }
    }
    pub fn quantity(self) -> &'static str {
        match self {
            StatSeries::Mean => "Mean Power",
            StatSeries::StdDev => "Standard Deviation of Power",
            StatSeries::Peak => "Peak Power",
        }
    }
    pub fn unit(self) -> &'static str {
        match self {
            StatSeries::StdDev => "dB",
            StatSeries::Mean | StatSeries::Peak => "dBm",
        }
    }
    pub fn file_name(self) -> &'static str {
        match self {
            StatSeries::Mean => "mean_power.png",
            StatSeries::StdDev => "std_dev.png",
            StatSeries::Peak => "peak_power.png",
        }
    }
    fn values(self, stats: &BinStatistics) -> &ndarray::Array1<f64> {
        match self {
            StatSeries::Mean => stats.mean_dbm(),
            StatSeries::StdDev => stats.std_db(),
            StatSeries::Peak => stats.peak_dbm(),
        }
    }
}
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub line: RGBColor,
    /// Draw caption and axis labels. Needs a system font.
    pub annotate: bool,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 500,
            background: RGBColor(10, 10, 10),
            line: CYAN,
            annotate: true,
        }
    }
}
/// Renders one statistic against frequency (MHz) as a PNG.
pub fn render_series_png(
    stats: &BinStatistics,
    series: StatSeries,
    style: &PlotStyle,
) -> Result<Vec<u8>, SweepError> {
    if stats.is_empty() {
        return Err(SweepError::Plot("statistics hold no bins".into()));
    }
    let values = series.values(stats);
    let x_min = stats.grid().start_hz() / 1e6;
    let x_max = stats.grid().end_hz() / 1e6;
    let y_min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let y_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Keep a visible band around flat series.
    let pad = ((y_max - y_min) * 0.05).max(0.5);
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.annotate {
            builder
                .caption(series.title(), ("sans-serif", 20).into_font().color(&WHITE))
                .set_label_area_size(LabelAreaPosition::Left, 60)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart =
            builder.build_cartesian_2d(x_min..x_max, (y_min - pad)..(y_max + pad))?;
        let mut mesh = chart.configure_mesh();
        mesh.light_line_style(&WHITE.mix(0.1));
        if style.annotate {
            mesh.x_desc("Frequency (MHz)")
                .y_desc(format!("{} ({})", series.quantity(), series.unit()))
                .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
                .label_style(("sans-serif", 12).into_font().color(&WHITE));
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw()?;
        let points = stats
            .frequencies()
            .iter()
            .zip(values.iter())
            .map(|(f, v)| (f / 1e6, *v));
        chart.draw_series(LineSeries::new(points, &style.line))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Writes all three plots into `dir`, creating it if needed.
pub fn write_plots(
    stats: &BinStatistics,
    dir: &Path,
    style: &PlotStyle,
) -> Result<Vec<PathBuf>, SweepError> {
    fs::create_dir_all(dir).map_err(|e| SweepError::io(dir.display().to_string(), e))?;
    let mut written = Vec::with_capacity(StatSeries::ALL.len());
    for series in StatSeries::ALL {
        let png = render_series_png(stats, series, style)?;
        let path = dir.join(series.file_name());
        fs::write(&path, png).map_err(|e| SweepError::io(path.display().to_string(), e))?;
        written.push(path);
    }
    Ok(written)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, SweepError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| SweepError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
