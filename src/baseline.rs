use crate::aggregate::GroundTruth;
use crate::emotions::EmotionScores;
use crate::error::EvalError;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Synthetic prediction strategy used as a comparison floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Baseline {
    /// The same score for every emotion of every video
    Constant { score: f64 },
    /// An independent uniform draw per emotion per video
    Uniform { low: f64, high: f64 },
}

impl Baseline {
    /// Uniform baseline over `[low, high]`
    ///
    /// Both bounds and their difference must be finite for the range to be sampled.
    pub fn uniform(low: f64, high: f64) -> Result<Self, EvalError> {
        // also rejects NaN bounds
        if !(low <= high) || !(high - low).is_finite() {
            return Err(EvalError::InvalidBaselineRange { low, high });
        }
        Ok(Baseline::Uniform { low, high })
    }

    /// Predictions for every ground-truth video, keyed like the ground truth
    pub fn predictions<R: Rng>(
        &self,
        ground_truth: &GroundTruth,
        rng: &mut R,
    ) -> BTreeMap<String, EmotionScores> {
        match *self {
            Baseline::Constant { score } => ground_truth
                .keys()
                .map(|video| (video.clone(), EmotionScores::uniform(score)))
                .collect(),
            Baseline::Uniform { low, high } => {
                let dist = Uniform::new_inclusive(low, high);
                ground_truth
                    .keys()
                    .map(|video| {
                        let scores = EmotionScores::from_fn(|_| dist.sample(&mut *rng));
                        (video.clone(), scores)
                    })
                    .collect()
            }
        }
    }
}

/// A baseline together with the model name it is reported under
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineModel {
    pub name: String,
    pub baseline: Baseline,
}

/// Random source for the uniform baseline; unseeded draws from OS entropy
pub fn baseline_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
