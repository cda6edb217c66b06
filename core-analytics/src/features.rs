//! Audio characteristics: selection, averaging and highlights

use crate::round_to;
use provider_spotify::{AudioFeatures, Track};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Scalar audio characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFeature {
    Danceability,
    Energy,
    Valence,
    Acousticness,
    Speechiness,
    Tempo,
}

impl AudioFeature {
    pub const ALL: [AudioFeature; 6] = [
        AudioFeature::Danceability,
        AudioFeature::Energy,
        AudioFeature::Valence,
        AudioFeature::Acousticness,
        AudioFeature::Speechiness,
        AudioFeature::Tempo,
    ];

    pub fn value(&self, features: &AudioFeatures) -> Option<f64> {
        match self {
            AudioFeature::Danceability => features.danceability,
            AudioFeature::Energy => features.energy,
            AudioFeature::Valence => features.valence,
            AudioFeature::Acousticness => features.acousticness,
            AudioFeature::Speechiness => features.speechiness,
            AudioFeature::Tempo => features.tempo,
        }
    }
}

/// Feature name to value, only for features that are present.
pub type FeatureValues = BTreeMap<AudioFeature, f64>;

/// Audio characteristics keyed by track id.
pub type FeatureMap = HashMap<String, AudioFeatures>;

pub(crate) fn features_for<'a>(track: &Track, features: &'a FeatureMap) -> Option<&'a AudioFeatures> {
    track.id.as_deref().and_then(|id| features.get(id))
}

/// The present subset of a track's features.
pub fn pick_features(features: Option<&AudioFeatures>) -> FeatureValues {
    let Some(features) = features else {
        return FeatureValues::new();
    };
    AudioFeature::ALL
        .iter()
        .filter_map(|feature| feature.value(features).map(|value| (*feature, value)))
        .collect()
}

/// Mean of each feature over the tracks that have characteristics.
///
/// Tracks without characteristics are left out of the denominator. Values
/// are rounded to 3 decimals. Empty when no track has characteristics.
pub fn average_features<'a, I>(tracks: I, features: &FeatureMap) -> FeatureValues
where
    I: IntoIterator<Item = &'a Track>,
{
    let mut totals = FeatureValues::new();
    let mut counted = 0u32;

    for found in tracks
        .into_iter()
        .filter_map(|track| features_for(track, features))
    {
        counted += 1;
        for feature in AudioFeature::ALL {
            if let Some(value) = feature.value(found) {
                *totals.entry(feature).or_insert(0.0) += value;
            }
        }
    }

    if counted == 0 {
        return FeatureValues::new();
    }

    totals
        .into_iter()
        .map(|(feature, total)| (feature, round_to(total / f64::from(counted), 3)))
        .collect()
}

/// Track standing out on one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<String>,
    pub feature_value: f64,
}

/// The four named highlights. A highlight is absent when no track has the feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlights {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_energetic: Option<Highlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_danceable: Option<Highlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_chill: Option<Highlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fastest: Option<Highlight>,
}

#[derive(Clone, Copy)]
enum Extreme {
    Max,
    Min,
}

/// Single pass keeping the first track that reaches the extreme value.
fn pick_by_feature(
    tracks: &[Track],
    features: &FeatureMap,
    feature: AudioFeature,
    extreme: Extreme,
) -> Option<Highlight> {
    let mut best: Option<(&Track, f64)> = None;

    for track in tracks {
        let Some(value) = features_for(track, features).and_then(|f| feature.value(f)) else {
            continue;
        };
        let replace = match best {
            None => true,
            Some((_, current)) => match extreme {
                Extreme::Max => value > current,
                Extreme::Min => value < current,
            },
        };
        if replace {
            best = Some((track, value));
        }
    }

    best.map(|(track, value)| Highlight {
        id: track.id.clone(),
        name: track.name.clone(),
        artists: track.artist_names(),
        feature_value: value,
    })
}

pub fn highlights(tracks: &[Track], features: &FeatureMap) -> Highlights {
    Highlights {
        most_energetic: pick_by_feature(tracks, features, AudioFeature::Energy, Extreme::Max),
        most_danceable: pick_by_feature(tracks, features, AudioFeature::Danceability, Extreme::Max),
        most_chill: pick_by_feature(tracks, features, AudioFeature::Valence, Extreme::Min),
        fastest: pick_by_feature(tracks, features, AudioFeature::Tempo, Extreme::Max),
    }
}
