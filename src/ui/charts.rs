use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use choco_dash::data::{DashboardSummary, GroupKey, HistogramBin, ScatterPoint};

use crate::color::ColorMap;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;
const ACCENT: Color32 = Color32::from_rgb(210, 140, 70);

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render KPIs and every chart for the current selection.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(summary) = &state.summary else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a sales file to start  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("🍫 Chocolate Sales Dashboard");
            kpi_strip(ui, summary);
            ui.separator();

            if summary.kpis.records == 0 {
                ui.label("No records match the current filters.");
                return;
            }

            let colors = state.color_map.as_ref();
            ui.columns(2, |cols| {
                titled(&mut cols[0], "🌍 Total Sales by Country", |ui| {
                    category_bars(ui, "by_country", &summary.by_country, colors)
                });
                titled(&mut cols[1], "🍫 Sales Share by Product", |ui| {
                    product_share(ui, &summary.by_product)
                });
            });
            titled(ui, "📈 Sales Trend Over Time", |ui| daily_line(ui, &summary.daily));
            ui.columns(2, |cols| {
                titled(&mut cols[0], "📊 Sales Amount Distribution", |ui| {
                    amount_histogram(ui, &summary.histogram)
                });
                titled(&mut cols[1], "📦 Boxes Shipped vs Sales Amount", |ui| {
                    units_scatter(ui, &summary.scatter, colors)
                });
            });
            titled(ui, "📅 Monthly Sales Trend", |ui| monthly_area(ui, &summary.monthly));
        });
}

fn titled(ui: &mut Ui, title: &str, body: impl FnOnce(&mut Ui)) {
    ui.strong(title);
    body(ui);
    ui.add_space(8.0);
}

fn kpi_strip(ui: &mut Ui, summary: &DashboardSummary) {
    let kpis = &summary.kpis;
    ui.columns(3, |cols| {
        kpi(&mut cols[0], "💰 Total Sales", money(kpis.total_amount));
        kpi(&mut cols[1], "📦 Total Boxes", thousands(kpis.total_units));
        kpi(&mut cols[2], "🌍 Total Countries", kpis.distinct_countries.to_string());
    });
}

fn kpi(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(label);
        ui.label(RichText::new(value).size(26.0).strong());
    });
}

/// `1234567` → `1,234,567`.
fn thousands(n: u128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Whole dollars with grouped digits; the sign goes in front of the `$`.
fn money(amount: f64) -> String {
    let sign = if amount.round() < 0.0 { "-" } else { "" };
    format!("{sign}${}", thousands(amount.abs().round() as u128))
}

// ---------------------------------------------------------------------------
// Category charts
// ---------------------------------------------------------------------------

fn category_labels(series: &[(GroupKey, f64)]) -> Vec<String> {
    series.iter().map(|(k, _)| k.to_string()).collect()
}

/// Axis formatter that shows the label at each integer position.
fn index_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

fn category_bars(ui: &mut Ui, id: &str, series: &[(GroupKey, f64)], colors: Option<&ColorMap>) {
    let labels = category_labels(series);
    let bars: Vec<Bar> = series
        .iter()
        .enumerate()
        .map(|(i, (key, amount))| {
            let name = key.to_string();
            let fill = colors.map_or(ACCENT, |cm| cm.color_for(&name));
            Bar::new(i as f64, *amount).name(name).fill(fill).width(0.7)
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_formatter(index_formatter(labels))
        .y_axis_label("Amount")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

/// Horizontal bars labelled with each product's share of total sales.
fn product_share(ui: &mut Ui, series: &[(GroupKey, f64)]) {
    let total: f64 = series.iter().map(|(_, v)| v).sum();
    let labels = category_labels(series);
    let palette = crate::color::generate_palette(series.len());
    let bars: Vec<Bar> = series
        .iter()
        .zip(palette)
        .enumerate()
        .map(|(i, ((key, amount), fill))| {
            let pct = if total != 0.0 { amount / total * 100.0 } else { 0.0 };
            Bar::new(i as f64, pct)
                .name(format!("{key} ({pct:.1}%)"))
                .fill(fill)
                .width(0.7)
        })
        .collect();

    Plot::new("by_product")
        .height(CHART_HEIGHT)
        .y_axis_formatter(index_formatter(labels))
        .x_axis_label("% of sales")
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn day_formatter(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    NaiveDate::from_num_days_from_ce_opt(mark.value.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn daily_line(ui: &mut Ui, series: &[(GroupKey, f64)]) {
    let points: Vec<[f64; 2]> = series
        .iter()
        .filter_map(|(key, amount)| match key {
            GroupKey::Date(d) => Some([day_number(*d), *amount]),
            _ => None,
        })
        .collect();

    Plot::new("daily")
        .height(CHART_HEIGHT)
        .x_axis_formatter(day_formatter)
        .y_axis_label("Amount")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::from(points.clone())).color(ACCENT).width(1.5));
            plot_ui.points(Points::new(PlotPoints::from(points)).color(ACCENT).radius(3.0));
        });
}

fn monthly_area(ui: &mut Ui, series: &[(GroupKey, f64)]) {
    let labels = category_labels(series);
    let points: PlotPoints = series
        .iter()
        .enumerate()
        .map(|(i, (_, amount))| [i as f64, *amount])
        .collect();

    Plot::new("monthly")
        .height(CHART_HEIGHT)
        .x_axis_formatter(index_formatter(labels))
        .y_axis_label("Amount")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).color(ACCENT).fill(0.0).width(2.0));
        });
}

// ---------------------------------------------------------------------------
// Distributions
// ---------------------------------------------------------------------------

fn amount_histogram(ui: &mut Ui, bins: &[HistogramBin]) {
    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            let width = (b.upper - b.lower).max(1.0);
            Bar::new((b.lower + b.upper) / 2.0, b.count as f64)
                .width(width)
                .fill(ACCENT)
                .name(format!("{:.0} – {:.0}", b.lower, b.upper))
        })
        .collect();

    Plot::new("histogram")
        .height(CHART_HEIGHT)
        .x_axis_label("Amount")
        .y_axis_label("Records")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

fn units_scatter(ui: &mut Ui, points: &[ScatterPoint], colors: Option<&ColorMap>) {
    let mut by_country: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for p in points {
        by_country
            .entry(p.country.as_str())
            .or_default()
            .push([p.units as f64, p.amount]);
    }

    Plot::new("scatter")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Boxes")
        .y_axis_label("Amount")
        .show(ui, |plot_ui| {
            for (country, pts) in by_country {
                let color = colors.map_or(ACCENT, |cm| cm.color_for(country));
                plot_ui.points(
                    Points::new(PlotPoints::from(pts))
                        .name(country)
                        .color(color)
                        .radius(3.5),
                );
            }
        });
}
