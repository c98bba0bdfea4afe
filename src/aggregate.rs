use crate::emotions::{EMOTION_COUNT, EmotionScores};
use crate::models::{GroundTruthEntry, PredictionEntry, video_basename};
use crate::parser::parse_complete;
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Averaged human ratings keyed by video basename
pub type GroundTruth = BTreeMap<String, EmotionScores>;

/// How many responses passed or failed the completeness check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    pub accepted: usize,
    pub discarded: usize,
}

impl AddAssign for GateStats {
    fn add_assign(&mut self, other: Self) {
        self.accepted += other.accepted;
        self.discarded += other.discarded;
    }
}

/// Parse every response, keeping only those that rate all emotions
pub fn gated_scores<'a>(
    responses: impl IntoIterator<Item = &'a str>,
) -> (Vec<EmotionScores>, GateStats) {
    let mut samples = Vec::new();
    let mut stats = GateStats::default();

    for response in responses {
        match parse_complete(response) {
            Some(scores) => {
                samples.push(scores);
                stats.accepted += 1;
            }
            None => stats.discarded += 1,
        }
    }

    (samples, stats)
}

/// Per-emotion arithmetic mean across repeated samples
///
/// Returns `None` when there is nothing to average.
pub fn mean_scores(samples: &[EmotionScores]) -> Option<EmotionScores> {
    if samples.is_empty() {
        return None;
    }

    let count = samples.len() as f64;
    Some(EmotionScores::from_fn(|emotion| {
        samples.iter().map(|s| s.get(emotion)).sum::<f64>() / count
    }))
}

/// Average the usable predictions sampled for one video
pub fn aggregate_predictions(entries: &[PredictionEntry]) -> (Option<EmotionScores>, GateStats) {
    let (samples, stats) = gated_scores(entries.iter().map(|e| e.prediction.as_str()));
    (mean_scores(&samples), stats)
}

/// Average all usable annotations per video basename
///
/// Records that share a basename are pooled. Videos without a single
/// complete annotation are left out.
pub fn build_ground_truth(entries: &[GroundTruthEntry]) -> (GroundTruth, GateStats) {
    let mut pooled: BTreeMap<String, Vec<EmotionScores>> = BTreeMap::new();
    let mut stats = GateStats::default();

    for entry in entries {
        let (samples, entry_stats) = gated_scores(entry.annotations());
        stats += entry_stats;
        if samples.is_empty() {
            continue;
        }
        pooled
            .entry(video_basename(&entry.video).to_string())
            .or_default()
            .extend(samples);
    }

    let ground_truth = pooled
        .into_iter()
        .filter_map(|(video, samples)| mean_scores(&samples).map(|avg| (video, avg)))
        .collect();

    (ground_truth, stats)
}

/// Total number of individual scores held by a ground-truth table
pub fn score_count(ground_truth: &GroundTruth) -> usize {
    ground_truth.len() * EMOTION_COUNT
}
