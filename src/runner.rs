use crate::aggregate::{GateStats, GroundTruth, aggregate_predictions, build_ground_truth, score_count};
use crate::baseline::{BaselineModel, baseline_rng};
use crate::config::Config;
use crate::emotions::EmotionScores;
use crate::error::EvalError;
use crate::evaluation::{ErrorReport, Evaluator, Metric, parse_metrics};
use crate::models::{GroundTruthEntry, PredictionSet, video_stem};
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

/// Metric used when neither the command line nor the config names one
pub const DEFAULT_METRIC: Metric = Metric::Mse;

/// Drives a scoring run: load inputs, score, write the report
pub struct Runner {
    config: Config,
}

impl Runner {
    /// Create a new runner with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Score every model in `pred_path` against `gt_path` and write the report to `out_path`
    ///
    /// Metric names and baseline settings are validated before any file is read.
    pub fn run_evaluation(&self, pred_path: &Path, gt_path: &Path, out_path: &Path) -> Result<ErrorReport> {
        let metrics = self.resolve_metrics()?;
        let baselines = self.config.baselines.models()?;

        let ground_truth = self.load_ground_truth(gt_path)?;
        let predictions: PredictionSet = read_json(pred_path, "predictions")?;

        let mut evaluator = Evaluator::new(&ground_truth, metrics);
        self.score_models(&mut evaluator, &predictions);
        self.score_baselines(&mut evaluator, &baselines);

        let report = evaluator.finish();
        store_json(&report, out_path)?;
        for metric in &report.metrics {
            tracing::info!("{} results saved to {}", metric.metric.name().to_uppercase(), out_path.display());
        }

        Ok(report)
    }

    /// Average one model's usable predictions per video and write them keyed by video stem
    pub fn export_scores(&self, pred_path: &Path, model: &str, out_path: &Path) -> Result<BTreeMap<String, EmotionScores>> {
        let predictions: PredictionSet = read_json(pred_path, "predictions")?;
        let videos = predictions.get(model).ok_or_else(|| EvalError::UnknownModel {
            name: model.to_string(),
            available: predictions.keys().cloned().collect::<Vec<_>>().join(", "),
        })?;

        let mut scores = BTreeMap::new();
        let mut stats = GateStats::default();
        for (video, entries) in videos {
            let (averaged, video_stats) = aggregate_predictions(entries);
            stats += video_stats;
            let Some(averaged) = averaged else {
                tracing::warn!("No usable prediction for {video}; skipping");
                continue;
            };
            if scores.insert(video_stem(video).to_string(), averaged).is_some() {
                tracing::warn!("Video stem {} appears more than once; keeping {video}", video_stem(video));
            }
        }

        self.log_gate_stats(model, stats);
        tracing::info!("Total videos: {}", scores.len());

        store_json(&scores, out_path)?;
        tracing::info!("Scores saved to {}", out_path.display());
        Ok(scores)
    }

    /// Metrics requested for this run, defaulting to mse
    fn resolve_metrics(&self) -> Result<Vec<Metric>, EvalError> {
        if self.config.metrics.is_empty() {
            return Ok(vec![DEFAULT_METRIC]);
        }
        parse_metrics(&self.config.metrics)
    }

    /// Load and average the annotated ratings
    fn load_ground_truth(&self, path: &Path) -> Result<GroundTruth> {
        let entries: Vec<GroundTruthEntry> = read_json(path, "ground truth")?;
        let (ground_truth, stats) = build_ground_truth(&entries);

        self.log_gate_stats("ground truth", stats);
        tracing::info!(
            "Loaded ground truth for {} videos ({} scores) from {} records",
            ground_truth.len(),
            score_count(&ground_truth),
            entries.len()
        );
        Ok(ground_truth)
    }

    /// Score the averaged predictions of every model in the prediction file
    fn score_models(&self, evaluator: &mut Evaluator<'_>, predictions: &PredictionSet) {
        for (model, videos) in predictions {
            let mut matched = 0usize;
            let mut unmatched = 0usize;
            let mut unusable = 0usize;
            let mut stats = GateStats::default();

            for (video, entries) in videos {
                let (averaged, video_stats) = aggregate_predictions(entries);
                stats += video_stats;
                let Some(averaged) = averaged else {
                    unusable += 1;
                    continue;
                };
                if evaluator.score_video(model, video, &averaged) {
                    matched += 1;
                } else {
                    unmatched += 1;
                }
            }

            self.log_gate_stats(model, stats);
            self.log_model_coverage(model, matched, unmatched, unusable);
        }
    }

    /// Score each baseline over the full ground truth
    ///
    /// One set of random draws is shared by every metric of the run.
    fn score_baselines(&self, evaluator: &mut Evaluator<'_>, baselines: &[BaselineModel]) {
        let mut rng = baseline_rng(self.config.baselines.seed);

        for model in baselines {
            if evaluator.has_model(&model.name) {
                tracing::warn!("Prediction model {:?} is replaced by the baseline of the same name", model.name);
                evaluator.discard_model(&model.name);
            }

            let predictions = model.baseline.predictions(evaluator.ground_truth(), &mut rng);
            for (video, scores) in &predictions {
                evaluator.score_video(&model.name, video, scores);
            }
            tracing::debug!("Baseline {} scored on {} videos", model.name, predictions.len());
        }
    }

    /// Log how many responses passed the completeness check
    fn log_gate_stats(&self, source: &str, stats: GateStats) {
        tracing::debug!(
            "{}: {} responses accepted, {} discarded",
            source,
            stats.accepted,
            stats.discarded
        );
    }

    /// Log how many of a model's videos could be scored
    fn log_model_coverage(&self, model: &str, matched: usize, unmatched: usize, unusable: usize) {
        if matched == 0 {
            tracing::warn!("Model {model} has no video matching the ground truth; it is left out of the report");
        }
        tracing::debug!(
            "{}: {} videos scored, {} without ground truth, {} without a usable prediction",
            model,
            matched,
            unmatched,
            unusable
        );
    }
}

/// Read and deserialize a JSON input file
fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file: {}", what, path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} JSON: {}", what, path.display()))
}

/// Write a value as pretty JSON, creating parent directories
fn store_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json_content = serde_json::to_string_pretty(value).context("Failed to serialize results to JSON")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    std::fs::write(path, json_content).with_context(|| format!("Failed to write results to: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaselineConfig;
    use crate::emotions::{EMOTION_COUNT, Emotion};
    use serde_json::{Value, json};
    use tempfile::tempdir;

    fn response(scores: &EmotionScores) -> String {
        scores
            .iter()
            .map(|(emotion, score)| format!("{}: {}", emotion.label(), score))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn varied_scores(offset: usize) -> EmotionScores {
        EmotionScores::from_fn(|e| 1.0 + ((e.index() + offset) % 5) as f64)
    }

    fn gt_json(videos: &[(&str, EmotionScores)]) -> Value {
        let records: Vec<Value> = videos
            .iter()
            .map(|(video, scores)| {
                json!({
                    "video": video,
                    "conversations": [
                        {"from": "human", "value": "How might someone feel after watching this clip?"},
                        {"from": "gpt", "value": response(scores)}
                    ]
                })
            })
            .collect();
        Value::Array(records)
    }

    fn write_json(dir: &Path, name: &str, value: &Value) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn no_baselines() -> Config {
        Config {
            metrics: vec![],
            baselines: BaselineConfig {
                enabled: false,
                ..BaselineConfig::default()
            },
        }
    }

    #[test]
    fn test_run_evaluation_end_to_end() {
        let dir = tempdir().unwrap();
        let gt = write_json(
            dir.path(),
            "gt.json",
            &gt_json(&[
                ("videos/a.mp4", EmotionScores::uniform(2.0)),
                ("videos/b.mp4", EmotionScores::uniform(4.0)),
            ]),
        );
        let pred = write_json(
            dir.path(),
            "pred.json",
            &json!({
                "model-x": {
                    "inference/a.mp4": [
                        {"prediction": response(&EmotionScores::uniform(3.0))},
                        {"prediction": response(&EmotionScores::uniform(5.0))},
                        {"prediction": "garbled output"}
                    ],
                    "inference/b.mp4": [
                        {"prediction": response(&EmotionScores::uniform(4.0))}
                    ],
                    "inference/unknown.mp4": [
                        {"prediction": response(&EmotionScores::uniform(1.0))}
                    ]
                }
            }),
        );
        let out = dir.path().join("results/errors.json");

        let config = Config {
            metrics: vec!["mse".to_string(), "mae".to_string()],
            ..no_baselines()
        };
        let report = Runner::new(config).run_evaluation(&pred, &gt, &out).unwrap();

        // a: mean prediction 4.0 vs 2.0, b: exact
        let mse = &report.metrics[0];
        let mae = &report.metrics[1];
        assert_eq!((mse.metric, mae.metric), (Metric::Mse, Metric::Mae));
        assert!((mse.overall["model-x"] - 2.0).abs() < 1e-12);
        assert!((mae.overall["model-x"] - 1.0).abs() < 1e-12);
        assert_eq!(mse.video_counts["model-x"], 2);

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["mse_overall"]["model-x"], 2.0);
        assert_eq!(written["mae_per_emotion"]["model-x"]["Moved"], 1.0);
        assert_eq!(
            written["mae_per_emotion"]["model-x"].as_object().unwrap().len(),
            EMOTION_COUNT
        );
    }

    #[test]
    fn test_run_evaluation_defaults_to_mse() {
        let dir = tempdir().unwrap();
        let gt = write_json(dir.path(), "gt.json", &gt_json(&[("a.mp4", EmotionScores::uniform(2.0))]));
        let pred = write_json(
            dir.path(),
            "pred.json",
            &json!({"m": {"a.mp4": [{"prediction": response(&EmotionScores::uniform(4.0))}]}}),
        );
        let out = dir.path().join("out.json");

        let report = Runner::new(no_baselines()).run_evaluation(&pred, &gt, &out).unwrap();
        assert_eq!(report.metrics.len(), 1);
        assert_eq!(report.metrics[0].metric, Metric::Mse);
        assert_eq!(report.metrics[0].overall["m"], 4.0);

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        let keys: Vec<&String> = written.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(written.get("mse_overall").is_some());
        assert!(written.get("mse_per_emotion").is_some());
    }

    #[test]
    fn test_constant_baseline_mae_is_mean_deviation_from_three() {
        let dir = tempdir().unwrap();
        let a = varied_scores(0);
        let b = varied_scores(2);
        let gt = write_json(dir.path(), "gt.json", &gt_json(&[("a.mp4", a), ("b.mp4", b)]));
        let pred = write_json(dir.path(), "pred.json", &json!({}));
        let out = dir.path().join("out.json");

        let config = Config {
            metrics: vec!["mae".to_string()],
            baselines: BaselineConfig {
                seed: Some(11),
                ..BaselineConfig::default()
            },
        };
        let report = Runner::new(config).run_evaluation(&pred, &gt, &out).unwrap();

        let expected = [a, b]
            .iter()
            .flat_map(|s| Emotion::ALL.map(|e| (s[e] - 3.0).abs()))
            .sum::<f64>()
            / (2 * EMOTION_COUNT) as f64;
        let mae = &report.metrics[0];
        assert!((mae.overall["baseline"] - expected).abs() < 1e-12);
        assert_eq!(mae.video_counts["baseline"], 2);

        let random = mae.overall["random_baseline"];
        assert!((0.0..=4.0).contains(&random));
        assert_eq!(mae.video_counts["random_baseline"], 2);
    }

    #[test]
    fn test_seeded_random_baseline_is_reproducible() {
        let dir = tempdir().unwrap();
        let gt = write_json(dir.path(), "gt.json", &gt_json(&[("a.mp4", varied_scores(1))]));
        let pred = write_json(dir.path(), "pred.json", &json!({}));
        let out = dir.path().join("out.json");

        let config = Config {
            metrics: vec!["mse".to_string()],
            baselines: BaselineConfig {
                seed: Some(5),
                ..BaselineConfig::default()
            },
        };
        let first = Runner::new(config.clone()).run_evaluation(&pred, &gt, &out).unwrap();
        let second = Runner::new(config).run_evaluation(&pred, &gt, &out).unwrap();
        assert_eq!(
            first.metrics[0].overall["random_baseline"],
            second.metrics[0].overall["random_baseline"]
        );
    }

    #[test]
    fn test_baseline_replaces_model_of_same_name() {
        let dir = tempdir().unwrap();
        let gt = write_json(dir.path(), "gt.json", &gt_json(&[("a.mp4", EmotionScores::uniform(3.0))]));
        let pred = write_json(
            dir.path(),
            "pred.json",
            &json!({"baseline": {"a.mp4": [{"prediction": response(&EmotionScores::uniform(1.0))}]}}),
        );
        let out = dir.path().join("out.json");

        let config = Config {
            metrics: vec!["mae".to_string()],
            ..Config::default()
        };
        let report = Runner::new(config).run_evaluation(&pred, &gt, &out).unwrap();
        assert_eq!(report.metrics[0].overall["baseline"], 0.0);
    }

    #[test]
    fn test_unsupported_metric_aborts_before_reading_inputs() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.json");
        let config = Config {
            metrics: vec!["mse".to_string(), "rmse".to_string()],
            ..Config::default()
        };

        let err = Runner::new(config)
            .run_evaluation(&dir.path().join("missing-pred.json"), &dir.path().join("missing-gt.json"), &out)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<EvalError>(),
            Some(&EvalError::UnsupportedMetric("rmse".to_string()))
        );
        assert!(!out.exists());
    }

    #[test]
    fn test_missing_ground_truth_file() {
        let dir = tempdir().unwrap();
        let pred = write_json(dir.path(), "pred.json", &json!({}));
        let out = dir.path().join("out.json");

        let err = Runner::new(no_baselines())
            .run_evaluation(&pred, &dir.path().join("gt.json"), &out)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read ground truth file"));
        assert!(!out.exists());
    }

    #[test]
    fn test_malformed_predictions_file() {
        let dir = tempdir().unwrap();
        let gt = write_json(dir.path(), "gt.json", &gt_json(&[("a.mp4", EmotionScores::uniform(3.0))]));
        let pred = dir.path().join("pred.json");
        std::fs::write(&pred, "{ not json").unwrap();
        let out = dir.path().join("out.json");

        let err = Runner::new(no_baselines()).run_evaluation(&pred, &gt, &out).unwrap_err();
        assert!(err.to_string().contains("Failed to parse predictions JSON"));
        assert!(!out.exists());
    }

    #[test]
    fn test_export_scores_by_stem() {
        let dir = tempdir().unwrap();
        let pred = write_json(
            dir.path(),
            "pred.json",
            &json!({
                "model-x": {
                    "trailers/first.mp4": [
                        {"prediction": response(&EmotionScores::uniform(2.0))},
                        {"prediction": response(&EmotionScores::uniform(3.0))}
                    ],
                    "trailers/second.mov": [
                        {"prediction": "Moved: 2"}
                    ]
                },
                "model-y": {}
            }),
        );
        let out = dir.path().join("scores.json");

        let scores = Runner::new(Config::default()).export_scores(&pred, "model-x", &out).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores["first"], EmotionScores::uniform(2.5));

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["first"]["Calm / Serene / Relaxed"], 2.5);
        assert!(written.get("second").is_none());
    }

    #[test]
    fn test_export_scores_unknown_model() {
        let dir = tempdir().unwrap();
        let pred = write_json(dir.path(), "pred.json", &json!({"model-a": {}, "model-b": {}}));
        let out = dir.path().join("scores.json");

        let err = Runner::new(Config::default()).export_scores(&pred, "model-c", &out).unwrap_err();
        match err.downcast_ref::<EvalError>() {
            Some(EvalError::UnknownModel { name, available }) => {
                assert_eq!(name, "model-c");
                assert_eq!(available, "model-a, model-b");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!out.exists());
    }
}
