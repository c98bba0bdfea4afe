use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Speaker tag marking annotation turns in a ground-truth conversation
pub const ANNOTATOR_ROLE: &str = "gpt";

/// One turn of a ground-truth conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Speaker tag ("human" for the prompt, "gpt" for the rating)
    pub from: String,
    /// Turn text
    pub value: String,
}

/// A ground-truth dataset record: one video and one prompt/rating exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruthEntry {
    /// Path to the video clip
    pub video: String,
    /// Prompt and annotated response turns
    pub conversations: Vec<ConversationTurn>,
}

impl GroundTruthEntry {
    /// Texts of the annotated rating turns
    pub fn annotations(&self) -> impl Iterator<Item = &str> {
        self.conversations
            .iter()
            .filter(|turn| turn.from == ANNOTATOR_ROLE)
            .map(|turn| turn.value.as_str())
    }
}

/// One sampled model output for a video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionEntry {
    /// Raw generated text
    pub prediction: String,
}

/// Model name -> video identifier -> repeated predictions
pub type PredictionSet = BTreeMap<String, BTreeMap<String, Vec<PredictionEntry>>>;

/// Final path segment of a video identifier
pub fn video_basename(video: &str) -> &str {
    video.rsplit('/').next().unwrap_or(video)
}

/// Basename up to its first `.`
pub fn video_stem(video: &str) -> &str {
    let basename = video_basename(video);
    basename.split('.').next().unwrap_or(basename)
}
