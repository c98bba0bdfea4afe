use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

/// Number of emotion categories every rating covers
pub const EMOTION_COUNT: usize = 16;

/// Emotion categories a viewer rating covers, in canonical output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Emotion {
    Interested,
    Fearful,
    Anxious,
    Moved,
    Angry,
    Ashamed,
    WarmHearted,
    Joyful,
    Sad,
    Satisfied,
    Surprised,
    Loving,
    Guilty,
    Disgusted,
    Disdainful,
    Calm,
}

impl Emotion {
    /// Every emotion, in canonical order
    pub const ALL: [Emotion; EMOTION_COUNT] = [
        Emotion::Interested,
        Emotion::Fearful,
        Emotion::Anxious,
        Emotion::Moved,
        Emotion::Angry,
        Emotion::Ashamed,
        Emotion::WarmHearted,
        Emotion::Joyful,
        Emotion::Sad,
        Emotion::Satisfied,
        Emotion::Surprised,
        Emotion::Loving,
        Emotion::Guilty,
        Emotion::Disgusted,
        Emotion::Disdainful,
        Emotion::Calm,
    ];

    /// The label used for this emotion in prompts, responses and reports
    pub fn label(self) -> &'static str {
        match self {
            Emotion::Interested => "Interested / Concentrated / Alert",
            Emotion::Fearful => "Fearful / Scared / Afraid",
            Emotion::Anxious => "Anxious / Tense / Nervous",
            Emotion::Moved => "Moved",
            Emotion::Angry => "Angry / Irritated / Mad",
            Emotion::Ashamed => "Ashamed / Embarrassed",
            Emotion::WarmHearted => "Warm-hearted / Gleeful / Elated",
            Emotion::Joyful => "Joyful / Amused / Happy",
            Emotion::Sad => "Sad / Downhearted / Blue",
            Emotion::Satisfied => "Satisfied / Pleased",
            Emotion::Surprised => "Surprised / Amazed / Astonished",
            Emotion::Loving => "Loving / Affectionate / Friendly",
            Emotion::Guilty => "Guilty / Remorseful",
            Emotion::Disgusted => "Disgusted / Turned off / Repulsed",
            Emotion::Disdainful => "Disdainful / Scornful / Contemptuous",
            Emotion::Calm => "Calm / Serene / Relaxed",
        }
    }

    /// Look up an emotion by its exact (case-sensitive) label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|emotion| emotion.label() == label)
    }

    /// Position of this emotion in canonical order
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A complete set of scores, one per emotion
///
/// Partial ratings never become `EmotionScores`; they are rejected by
/// [`EmotionScores::from_parsed`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionScores([f64; EMOTION_COUNT]);

impl EmotionScores {
    /// The same score for every emotion
    pub fn uniform(score: f64) -> Self {
        Self([score; EMOTION_COUNT])
    }

    /// Build scores by evaluating `f` for each emotion in canonical order
    pub fn from_fn(mut f: impl FnMut(Emotion) -> f64) -> Self {
        let mut values = [0.0; EMOTION_COUNT];
        for emotion in Emotion::ALL {
            values[emotion.index()] = f(emotion);
        }
        Self(values)
    }

    /// Accept a parsed response only if it rates every emotion exactly once
    pub fn from_parsed(parsed: &BTreeMap<Emotion, f64>) -> Option<Self> {
        if parsed.len() != EMOTION_COUNT {
            return None;
        }

        let mut values = [0.0; EMOTION_COUNT];
        for emotion in Emotion::ALL {
            values[emotion.index()] = *parsed.get(&emotion)?;
        }
        Some(Self(values))
    }

    /// Score for a single emotion
    pub fn get(&self, emotion: Emotion) -> f64 {
        self.0[emotion.index()]
    }

    /// Iterate `(emotion, score)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL.into_iter().map(|emotion| (emotion, self.get(emotion)))
    }

    /// Unweighted mean across all emotions
    pub fn mean(&self) -> f64 {
        self.0.iter().sum::<f64>() / EMOTION_COUNT as f64
    }
}

impl Index<Emotion> for EmotionScores {
    type Output = f64;

    fn index(&self, emotion: Emotion) -> &f64 {
        &self.0[emotion.index()]
    }
}

impl Serialize for EmotionScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(EMOTION_COUNT))?;
        for (emotion, score) in self.iter() {
            map.serialize_entry(emotion.label(), &score)?;
        }
        map.end()
    }
}
