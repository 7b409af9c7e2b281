//! Distance metrics and distance/similarity conversions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Distance metric used to compare vectors.
///
/// Parsing is case-insensitive and accepts the aliases `l2` (euclidean),
/// `ip` and `dot` (inner product).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`.
    #[default]
    #[strum(to_string = "cosine")]
    Cosine,
    /// Straight-line distance.
    #[strum(to_string = "euclidean", serialize = "l2")]
    Euclidean,
    /// `1 - a·b`, meaningful for unit-normalised vectors.
    #[strum(to_string = "inner_product", serialize = "ip", serialize = "dot")]
    InnerProduct,
    /// Sum of absolute differences.
    #[strum(to_string = "manhattan")]
    Manhattan,
    /// Chord length between the normalised vectors, `sqrt(2(1 - cos))`.
    #[strum(to_string = "angular")]
    Angular,
}

impl DistanceMetric {
    /// Computes the distance between two vectors of equal length.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => 1.0 - cosine(a, b),
            Self::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            Self::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            Self::Angular => (2.0 * (1.0 - cosine(a, b))).max(0.0).sqrt(),
            Self::InnerProduct => 1.0 - dot(a, b),
        }
    }

    /// Converts a distance into a similarity that never increases with
    /// distance.
    pub fn similarity(self, distance: f32) -> f32 {
        match self {
            Self::Cosine | Self::InnerProduct => 1.0 - distance,
            Self::Euclidean | Self::Manhattan => 1.0 / (1.0 + distance.max(0.0)),
            Self::Angular => 1.0 - distance * distance / 2.0,
        }
    }

    /// Inverse of [`similarity`](Self::similarity), used for engines that
    /// report similarities.
    pub fn distance_from_similarity(self, similarity: f32) -> f32 {
        match self {
            Self::Cosine | Self::InnerProduct => 1.0 - similarity,
            Self::Euclidean | Self::Manhattan => {
                if similarity > 0.0 {
                    (1.0 / similarity - 1.0).max(0.0)
                } else {
                    f32::INFINITY
                }
            }
            Self::Angular => (2.0 * (1.0 - similarity)).max(0.0).sqrt(),
        }
    }
}

impl Serialize for DistanceMetric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl<'de> Deserialize<'de> for DistanceMetric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown distance metric '{}'", raw)))
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

/// Cosine similarity; zero when either vector has zero norm.
fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    (dot(a, b) / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("COSINE".parse::<DistanceMetric>().unwrap(), DistanceMetric::Cosine);
        assert_eq!("l2".parse::<DistanceMetric>().unwrap(), DistanceMetric::Euclidean);
        assert_eq!("Dot".parse::<DistanceMetric>().unwrap(), DistanceMetric::InnerProduct);
        assert_eq!("ip".parse::<DistanceMetric>().unwrap(), DistanceMetric::InnerProduct);
        assert!("hamming".parse::<DistanceMetric>().is_err());
        assert_eq!(DistanceMetric::InnerProduct.to_string(), "inner_product");
    }

    #[test]
    fn serde_uses_canonical_names() {
        let metric: DistanceMetric = serde_json::from_str("\"L2\"").unwrap();
        assert_eq!(metric, DistanceMetric::Euclidean);
        assert_eq!(serde_json::to_string(&metric).unwrap(), "\"euclidean\"");
    }

    #[test]
    fn distances_match_definitions() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!(close(DistanceMetric::Cosine.distance(&a, &b), 1.0));
        assert!(close(DistanceMetric::Euclidean.distance(&a, &b), 2f32.sqrt()));
        assert!(close(DistanceMetric::Manhattan.distance(&a, &b), 2.0));
        assert!(close(DistanceMetric::Angular.distance(&a, &b), 2f32.sqrt()));
        assert!(close(DistanceMetric::InnerProduct.distance(&a, &b), 1.0));
        assert!(close(DistanceMetric::Cosine.distance(&a, &a), 0.0));
    }

    #[test]
    fn zero_vectors_have_zero_cosine() {
        let zero = [0.0, 0.0];
        assert!(close(DistanceMetric::Cosine.distance(&zero, &[1.0, 1.0]), 1.0));
    }

    #[test]
    fn similarity_round_trips_through_distance() {
        let metrics = [
            DistanceMetric::Cosine,
            DistanceMetric::Euclidean,
            DistanceMetric::Manhattan,
            DistanceMetric::Angular,
            DistanceMetric::InnerProduct,
        ];
        for metric in metrics {
            let d = 0.5;
            assert!(close(metric.distance_from_similarity(metric.similarity(d)), d));
        }
    }

    #[test]
    fn similarity_is_monotone_in_distance() {
        for metric in [DistanceMetric::Euclidean, DistanceMetric::Angular] {
            assert!(metric.similarity(0.1) >= metric.similarity(0.2));
            assert!(metric.similarity(0.2) >= metric.similarity(1.5));
        }
    }
}
