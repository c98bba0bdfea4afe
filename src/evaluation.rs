use crate::aggregate::GroundTruth;
use crate::emotions::{EMOTION_COUNT, EmotionScores};
use crate::error::EvalError;
use crate::models::video_basename;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Error metric comparing a predicted score with the ground truth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Squared difference
    Mse,
    /// Absolute difference
    Mae,
}

impl Metric {
    /// Short name used on the command line and as report key prefix
    pub fn name(self) -> &'static str {
        match self {
            Metric::Mse => "mse",
            Metric::Mae => "mae",
        }
    }

    /// Error for a single score
    pub fn error(self, predicted: f64, truth: f64) -> f64 {
        match self {
            Metric::Mse => (predicted - truth).powi(2),
            Metric::Mae => (predicted - truth).abs(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mse" => Ok(Metric::Mse),
            "mae" => Ok(Metric::Mae),
            other => Err(EvalError::UnsupportedMetric(other.to_string())),
        }
    }
}

/// Parse metric names, dropping repeats but keeping first-seen order
pub fn parse_metrics<S: AsRef<str>>(names: &[S]) -> Result<Vec<Metric>, EvalError> {
    let mut metrics = Vec::with_capacity(names.len());
    for name in names {
        let metric: Metric = name.as_ref().parse()?;
        if !metrics.contains(&metric) {
            metrics.push(metric);
        }
    }
    Ok(metrics)
}

/// Per-video errors collected for one model under one metric
#[derive(Debug, Clone, Default)]
pub struct ModelErrors {
    /// Mean error across emotions, one entry per matched video
    overall: Vec<f64>,
    /// Error per emotion, one entry per matched video
    per_emotion: [Vec<f64>; EMOTION_COUNT],
}

impl ModelErrors {
    /// Record the errors of one video's prediction
    pub fn record(&mut self, metric: Metric, predicted: &EmotionScores, truth: &EmotionScores) {
        let errors = EmotionScores::from_fn(|emotion| metric.error(predicted[emotion], truth[emotion]));
        for (emotion, error) in errors.iter() {
            self.per_emotion[emotion.index()].push(error);
        }
        self.overall.push(errors.mean());
    }

    /// Number of videos recorded so far
    pub fn video_count(&self) -> usize {
        self.overall.len()
    }

    fn overall_mean(&self) -> Option<f64> {
        mean(&self.overall)
    }

    fn per_emotion_mean(&self) -> Option<EmotionScores> {
        if self.overall.is_empty() {
            return None;
        }
        Some(EmotionScores::from_fn(|emotion| {
            mean(&self.per_emotion[emotion.index()]).unwrap_or(0.0)
        }))
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Final errors for every model under one metric
#[derive(Debug, Clone)]
pub struct MetricReport {
    pub metric: Metric,
    /// Model -> mean of per-video overall errors
    pub overall: BTreeMap<String, f64>,
    /// Model -> mean error per emotion
    pub per_emotion: BTreeMap<String, EmotionScores>,
    /// Model -> number of videos that contributed
    pub video_counts: BTreeMap<String, usize>,
}

impl MetricReport {
    fn from_errors(metric: Metric, models: &BTreeMap<String, ModelErrors>) -> Self {
        let mut overall = BTreeMap::new();
        let mut per_emotion = BTreeMap::new();
        let mut video_counts = BTreeMap::new();

        for (model, errors) in models {
            if let (Some(total), Some(by_emotion)) = (errors.overall_mean(), errors.per_emotion_mean()) {
                overall.insert(model.clone(), total);
                per_emotion.insert(model.clone(), by_emotion);
                video_counts.insert(model.clone(), errors.video_count());
            }
        }

        Self {
            metric,
            overall,
            per_emotion,
            video_counts,
        }
    }
}

/// Errors for every requested metric
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub metrics: Vec<MetricReport>,
}

impl Serialize for ErrorReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.metrics.len() * 2))?;
        for report in &self.metrics {
            map.serialize_entry(&format!("{}_overall", report.metric), &report.overall)?;
            map.serialize_entry(&format!("{}_per_emotion", report.metric), &report.per_emotion)?;
        }
        map.end()
    }
}

/// Compares averaged predictions with ground truth under one or more metrics
pub struct Evaluator<'a> {
    ground_truth: &'a GroundTruth,
    metrics: Vec<Metric>,
    models: BTreeMap<String, Vec<ModelErrors>>,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over a ground-truth table
    pub fn new(ground_truth: &'a GroundTruth, metrics: Vec<Metric>) -> Self {
        Self {
            ground_truth,
            metrics,
            models: BTreeMap::new(),
        }
    }

    /// Ground truth the evaluator compares against
    pub fn ground_truth(&self) -> &'a GroundTruth {
        self.ground_truth
    }

    /// Score one model's averaged prediction for a video
    ///
    /// Returns `false`, recording nothing, when the video has no ground truth.
    pub fn score_video(&mut self, model: &str, video: &str, predicted: &EmotionScores) -> bool {
        let Some(truth) = self.ground_truth.get(video_basename(video)) else {
            return false;
        };

        let metric_count = self.metrics.len();
        let errors = self
            .models
            .entry(model.to_string())
            .or_insert_with(|| vec![ModelErrors::default(); metric_count]);
        for (metric, model_errors) in self.metrics.iter().zip(errors.iter_mut()) {
            model_errors.record(*metric, predicted, truth);
        }
        true
    }

    /// Whether any video has been recorded for the model
    pub fn has_model(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    /// Forget everything recorded for a model
    pub fn discard_model(&mut self, model: &str) {
        self.models.remove(model);
    }

    /// Reduce the recorded errors to per-model means
    pub fn finish(self) -> ErrorReport {
        let metrics = self
            .metrics
            .iter()
            .enumerate()
            .map(|(i, &metric)| {
                let models: BTreeMap<String, ModelErrors> = self
                    .models
                    .iter()
                    .map(|(model, errors)| (model.clone(), errors[i].clone()))
                    .collect();
                MetricReport::from_errors(metric, &models)
            })
            .collect();

        ErrorReport { metrics }
    }
}
