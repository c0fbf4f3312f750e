//! Server-side bar chart rendered as inline SVG.

use serde::Serialize;

use crate::aggregate::RegionTotal;
use crate::format::{escape_html, group_digits};

/// Viridis colour stops, dark to bright.
const VIRIDIS: [(u8, u8, u8); 10] = [
    (0x44, 0x01, 0x54),
    (0x48, 0x28, 0x78),
    (0x3e, 0x49, 0x89),
    (0x31, 0x68, 0x8e),
    (0x26, 0x82, 0x8e),
    (0x1f, 0x9e, 0x89),
    (0x35, 0xb7, 0x79),
    (0x6e, 0xce, 0x58),
    (0xb5, 0xde, 0x2b),
    (0xfd, 0xe7, 0x25),
];

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 440.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 110.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
const Y_TICKS: usize = 5;

/// Sample the viridis scale at `t` in `[0, 1]` as a `#rrggbb` string.
pub fn viridis(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(VIRIDIS.len() - 1);
    let frac = scaled - lo as f64;

    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (r0, g0, b0) = VIRIDIS[lo];
    let (r1, g1, b1) = VIRIDIS[hi];
    format!("#{:02x}{:02x}{:02x}", lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Short axis label: `1500000000` -> `1.5B`.
pub fn abbreviate(value: f64) -> String {
    let (scaled, suffix) = match value.abs() {
        v if v >= 1e9 => (value / 1e9, "B"),
        v if v >= 1e6 => (value / 1e6, "M"),
        v if v >= 1e3 => (value / 1e3, "k"),
        _ => (value, ""),
    };
    let text = format!("{:.1}", scaled);
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{}{}", text, suffix)
}

/// One bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: i64,
    pub color: String,
}

/// A vertical bar chart with a continuous colour scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

impl BarChart {
    /// The "Total Population by Region" chart.
    pub fn population_by_region(totals: &[RegionTotal]) -> Self {
        let min = totals.iter().map(|t| t.population).min().unwrap_or(0) as f64;
        let max = totals.iter().map(|t| t.population).max().unwrap_or(0) as f64;
        let range = max - min;

        let bars = totals
            .iter()
            .map(|t| {
                let position = if range > 0.0 {
                    (t.population as f64 - min) / range
                } else {
                    1.0
                };
                Bar {
                    label: t.region.clone(),
                    value: t.population,
                    color: viridis(position),
                }
            })
            .collect();

        Self {
            title: "Total Population by Region".to_string(),
            x_label: "Region".to_string(),
            y_label: "Population".to_string(),
            bars,
        }
    }

    /// Upper bound of the y axis, rounded up to a readable step.
    fn axis_max(&self) -> f64 {
        let max = self.bars.iter().map(|b| b.value).max().unwrap_or(0) as f64;
        if max <= 0.0 {
            return 1.0;
        }
        let step = nice_step(max / Y_TICKS as f64);
        (max / step).ceil() * step
    }

    /// Render as a standalone `<svg>` element.
    pub fn to_svg(&self) -> String {
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let axis_max = self.axis_max();
        let base_y = MARGIN_TOP + plot_h;

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" class="bar-chart" viewBox="0 0 {w} {h}" role="img" aria-label="{title}">"#,
            w = WIDTH,
            h = HEIGHT,
            title = escape_html(&self.title),
        );
        svg.push_str(&format!(
            r#"<text class="chart-title" x="{x}" y="28">{title}</text>"#,
            x = MARGIN_LEFT,
            title = escape_html(&self.title),
        ));

        // Gridlines and y tick labels
        for i in 0..=Y_TICKS {
            let value = axis_max * i as f64 / Y_TICKS as f64;
            let y = base_y - plot_h * i as f64 / Y_TICKS as f64;
            svg.push_str(&format!(
                r#"<line class="grid" x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}"/><text class="tick" x="{tx}" y="{ty:.1}" text-anchor="end">{label}</text>"#,
                x1 = MARGIN_LEFT,
                x2 = MARGIN_LEFT + plot_w,
                tx = MARGIN_LEFT - 8.0,
                ty = y + 4.0,
                label = abbreviate(value),
            ));
        }

        if self.bars.is_empty() {
            svg.push_str(&format!(
                r#"<text class="empty" x="{x}" y="{y}" text-anchor="middle">No data</text>"#,
                x = MARGIN_LEFT + plot_w / 2.0,
                y = MARGIN_TOP + plot_h / 2.0,
            ));
        }

        let slot = plot_w / self.bars.len().max(1) as f64;
        let bar_w = slot * 0.8;
        for (i, bar) in self.bars.iter().enumerate() {
            let h = plot_h * (bar.value.max(0) as f64 / axis_max);
            let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
            let label = escape_html(&bar.label);
            svg.push_str(&format!(
                r#"<rect class="bar" x="{x:.1}" y="{y:.1}" width="{bw:.1}" height="{h:.1}" fill="{color}"><title>{x_label}={label}&#10;{y_label}={value}</title></rect><text class="tick" x="{cx:.1}" y="{ly:.1}" text-anchor="middle">{label}</text>"#,
                y = base_y - h,
                bw = bar_w,
                color = bar.color,
                x_label = escape_html(&self.x_label),
                y_label = escape_html(&self.y_label),
                value = group_digits(bar.value),
                cx = x + bar_w / 2.0,
                ly = base_y + 18.0,
            ));
        }

        // Axis titles
        svg.push_str(&format!(
            r#"<text class="axis-title" x="{x:.1}" y="{y:.1}" text-anchor="middle">{label}</text>"#,
            x = MARGIN_LEFT + plot_w / 2.0,
            y = HEIGHT - 14.0,
            label = escape_html(&self.x_label),
        ));
        svg.push_str(&format!(
            r#"<text class="axis-title" x="18" y="{y:.1}" text-anchor="middle" transform="rotate(-90 18 {y:.1})">{label}</text>"#,
            y = MARGIN_TOP + plot_h / 2.0,
            label = escape_html(&self.y_label),
        ));

        if !self.bars.is_empty() {
            svg.push_str(&self.colorbar_svg(MARGIN_LEFT + plot_w + 30.0, MARGIN_TOP, plot_h));
        }

        svg.push_str("</svg>");
        svg
    }

    fn colorbar_svg(&self, x: f64, y: f64, h: f64) -> String {
        let min = self.bars.iter().map(|b| b.value).min().unwrap_or(0) as f64;
        let max = self.bars.iter().map(|b| b.value).max().unwrap_or(0) as f64;

        let mut out = String::from(r#"<defs><linearGradient id="viridis" x1="0" y1="1" x2="0" y2="0">"#);
        for i in 0..VIRIDIS.len() {
            let t = i as f64 / (VIRIDIS.len() - 1) as f64;
            out.push_str(&format!(
                r#"<stop offset="{:.3}" stop-color="{}"/>"#,
                t,
                viridis(t)
            ));
        }
        out.push_str("</linearGradient></defs>");
        out.push_str(&format!(
            r#"<rect class="colorbar" x="{x:.1}" y="{y:.1}" width="16" height="{h:.1}" fill="url(#viridis)"/><text class="tick" x="{tx:.1}" y="{ty_top:.1}">{max}</text><text class="tick" x="{tx:.1}" y="{ty_bottom:.1}">{min}</text><text class="tick" x="{x:.1}" y="{label_y:.1}">{title}</text>"#,
            tx = x + 22.0,
            ty_top = y + 8.0,
            ty_bottom = y + h,
            max = abbreviate(max),
            min = abbreviate(min),
            label_y = y - 10.0,
            title = escape_html(&self.y_label),
        ));
        out
    }
}

/// Round a raw step up to 1, 2 or 5 times a power of ten.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powi(raw.log10().floor() as i32);
    let residual = raw / magnitude;
    let factor = if residual <= 1.0 {
        1.0
    } else if residual <= 2.0 {
        2.0
    } else if residual <= 5.0 {
        5.0
    } else {
        10.0
    };
    factor * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals() -> Vec<RegionTotal> {
        vec![
            RegionTotal {
                region: "Africa".to_string(),
                population: 1_300_000_000,
            },
            RegionTotal {
                region: "Oceania".to_string(),
                population: 43_000_000,
            },
            RegionTotal {
                region: "Asia".to_string(),
                population: 4_600_000_000,
            },
        ]
    }

    #[test]
    fn test_viridis_endpoints() {
        assert_eq!(viridis(0.0), "#440154");
        assert_eq!(viridis(1.0), "#fde725");
        assert_eq!(viridis(-3.0), "#440154");
        assert_eq!(viridis(f64::NAN), "#440154");
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate(0.0), "0");
        assert_eq!(abbreviate(1_500_000_000.0), "1.5B");
        assert_eq!(abbreviate(2_000_000.0), "2M");
        assert_eq!(abbreviate(43_000.0), "43k");
    }

    #[test]
    fn test_nice_step() {
        assert_eq!(nice_step(0.92e9), 1e9);
        assert_eq!(nice_step(1.3e6), 2e6);
        assert_eq!(nice_step(3.0), 5.0);
        assert_eq!(nice_step(7.0), 10.0);
    }

    #[test]
    fn test_population_by_region_keeps_order_and_values() {
        let chart = BarChart::population_by_region(&totals());
        assert_eq!(chart.title, "Total Population by Region");
        let labels: Vec<_> = chart.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["Africa", "Oceania", "Asia"]);
        assert_eq!(chart.bars[2].value, 4_600_000_000);
        // Largest total is brightest, smallest is darkest
        assert_eq!(chart.bars[2].color, "#fde725");
        assert_eq!(chart.bars[1].color, "#440154");
    }

    #[test]
    fn test_axis_max_covers_largest_bar() {
        let chart = BarChart::population_by_region(&totals());
        assert_eq!(chart.axis_max(), 5e9);
    }

    #[test]
    fn test_to_svg() {
        let svg = BarChart::population_by_region(&totals()).to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<rect class=\"bar\"").count(), 3);
        assert!(svg.contains("Population=4,600,000,000"));
        assert!(svg.contains("Total Population by Region"));
    }

    #[test]
    fn test_to_svg_empty() {
        let svg = BarChart::population_by_region(&[]).to_svg();
        assert!(svg.contains("No data"));
        assert!(!svg.contains("class=\"bar\""));
    }

    #[test]
    fn test_to_svg_escapes_labels() {
        let chart = BarChart::population_by_region(&[RegionTotal {
            region: "<script>".to_string(),
            population: 1,
        }]);
        let svg = chart.to_svg();
        assert!(!svg.contains("<script>"));
        assert!(svg.contains("&lt;script&gt;"));
    }
}
