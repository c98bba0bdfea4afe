use crate::emotions::EmotionScores;
use crate::evaluation::{ErrorReport, MetricReport};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print an error report in the specified format
pub fn print_report(report: &ErrorReport, format: OutputFormat) {
    match format {
        OutputFormat::Plain => print!("{}", render_report_plain(report)),
        OutputFormat::Json => print_json(report),
    }
}

/// Print exported per-video scores in the specified format
pub fn print_scores(scores: &BTreeMap<String, EmotionScores>, format: OutputFormat) {
    match format {
        OutputFormat::Plain => print!("{}", render_scores_plain(scores)),
        OutputFormat::Json => print_json(scores),
    }
}

/// Render one table per metric: model, matched videos, overall error
fn render_report_plain(report: &ErrorReport) -> String {
    let mut out = String::new();

    for (i, metric) in report.metrics.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("=== {} ===\n", metric.metric.name().to_uppercase()));
        out.push_str(&render_metric_plain(metric));
    }

    out
}

fn render_metric_plain(metric: &MetricReport) -> String {
    if metric.overall.is_empty() {
        return "No models could be scored.\n".to_string();
    }

    let width = metric
        .overall
        .keys()
        .map(|model| model.len())
        .max()
        .unwrap_or(0)
        .max("Model".len());

    let mut out = format!("{:<width$} {:>8} {:>10}\n", "Model", "Videos", "Overall");
    out.push_str(&format!("{}\n", "-".repeat(width + 20)));
    for (model, error) in &metric.overall {
        let videos = metric.video_counts.get(model).copied().unwrap_or(0);
        out.push_str(&format!("{:<width$} {:>8} {:>10.4}\n", model, videos, error));
    }
    out
}

/// Render exported scores, one line per video
fn render_scores_plain(scores: &BTreeMap<String, EmotionScores>) -> String {
    if scores.is_empty() {
        return "No videos with usable predictions.\n".to_string();
    }

    let mut out = String::new();
    for (video, video_scores) in scores {
        out.push_str(&format!("{video}\n"));
        for (emotion, score) in video_scores.iter() {
            out.push_str(&format!("  • {:<38} {:.3}\n", emotion.label(), score));
        }
    }
    out
}

/// Print any serializable value as pretty JSON
fn print_json<T: Serialize + ?Sized>(value: &T) {
    match render_json(value) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Error serializing results to JSON: {}", e),
    }
}

fn render_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
