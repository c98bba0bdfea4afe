use crate::emotions::{Emotion, EmotionScores};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `<label>: <score>` at the start of a segment. Anything after the score is ignored.
const RATING_PATTERN: &str = r"^([^:]+):\s*([0-9]+(?:\.[0-9]+)?)";

static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(RATING_PATTERN).expect("valid rating regex"));

/// Parse a free-text rating such as `"Moved: 3, Sad / Downhearted / Blue: 1.5"`
///
/// Segments are separated by commas. Segments that don't look like
/// `label: score`, or whose label is not a known emotion, are dropped.
/// When a label repeats, the later score wins.
pub fn parse_response(text: &str) -> BTreeMap<Emotion, f64> {
    let mut ratings = BTreeMap::new();

    for segment in text.split(',') {
        if let Some((emotion, score)) = parse_segment(segment) {
            ratings.insert(emotion, score);
        }
    }

    ratings
}

/// Parse one comma-separated segment into a known emotion and its score
fn parse_segment(segment: &str) -> Option<(Emotion, f64)> {
    let captures = RATING_RE.captures(segment.trim())?;
    let emotion = Emotion::from_label(captures.get(1)?.as_str().trim())?;
    let score = captures.get(2)?.as_str().parse::<f64>().ok()?;
    Some((emotion, score))
}

/// Parse a response and keep it only if it rates all emotions
pub fn parse_complete(text: &str) -> Option<EmotionScores> {
    EmotionScores::from_parsed(&parse_response(text))
}
