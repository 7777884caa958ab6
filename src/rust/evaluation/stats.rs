use serde::{Deserialize, Serialize};

use super::record::{Annotated, ResultSet};

/// Names of every statistic in the summary, counts first.
pub const STAT_KEYS: [&str; 11] = [
    "n_images",
    "n_dogs_img",
    "n_notdogs_img",
    "n_match",
    "n_correct_dogs",
    "n_correct_notdogs",
    "n_correct_breed",
    "pct_match",
    "pct_correct_dogs",
    "pct_correct_breed",
    "pct_correct_notdogs",
];

/// A single value from the summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Stat {
    Count(usize),
    Percent(f64),
}

impl Stat {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Count(n) => n as f64,
            Self::Percent(p) => p,
        }
    }
}

/// Counts and percentages describing how a classifier did on one result set.
///
/// Always recomputed from scratch; it keeps no state between calls.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub n_images: usize,
    pub n_dogs_img: usize,
    pub n_notdogs_img: usize,
    pub n_match: usize,
    pub n_correct_dogs: usize,
    pub n_correct_notdogs: usize,
    pub n_correct_breed: usize,
    pub pct_match: f64,
    pub pct_correct_dogs: f64,
    pub pct_correct_breed: f64,
    pub pct_correct_notdogs: f64,
}

impl Summary {
    /// Aggregates an annotated result set in a single pass.
    ///
    /// Breed correctness needs a dog image and an exact label match; dog
    /// correctness only needs both sides to name a dog.
    pub fn from_results(results: &ResultSet<Annotated>) -> Self {
        let mut summary = Self::default();

        for (_, record) in results.iter() {
            if record.is_match() {
                summary.n_match += 1;
            }
            if record.pet_is_dog() {
                summary.n_dogs_img += 1;
                if record.is_match() {
                    summary.n_correct_breed += 1;
                }
                if record.classifier_is_dog() {
                    summary.n_correct_dogs += 1;
                }
            } else if !record.classifier_is_dog() {
                summary.n_correct_notdogs += 1;
            }
        }

        summary.n_images = results.len();
        summary.n_notdogs_img = summary.n_images - summary.n_dogs_img;

        summary.pct_match = percentage(summary.n_match, summary.n_images);
        summary.pct_correct_dogs = percentage(summary.n_correct_dogs, summary.n_dogs_img);
        summary.pct_correct_breed = percentage(summary.n_correct_breed, summary.n_dogs_img);
        summary.pct_correct_notdogs = percentage(summary.n_correct_notdogs, summary.n_notdogs_img);

        summary
    }

    /// Looks a statistic up by its key, e.g. `"pct_correct_dogs"`.
    pub fn get(&self, key: &str) -> Option<Stat> {
        let stat = match key {
            "n_images" => Stat::Count(self.n_images),
            "n_dogs_img" => Stat::Count(self.n_dogs_img),
            "n_notdogs_img" => Stat::Count(self.n_notdogs_img),
            "n_match" => Stat::Count(self.n_match),
            "n_correct_dogs" => Stat::Count(self.n_correct_dogs),
            "n_correct_notdogs" => Stat::Count(self.n_correct_notdogs),
            "n_correct_breed" => Stat::Count(self.n_correct_breed),
            "pct_match" => Stat::Percent(self.pct_match),
            "pct_correct_dogs" => Stat::Percent(self.pct_correct_dogs),
            "pct_correct_breed" => Stat::Percent(self.pct_correct_breed),
            "pct_correct_notdogs" => Stat::Percent(self.pct_correct_notdogs),
            _ => return None,
        };
        Some(stat)
    }

    /// All statistics in [`STAT_KEYS`] order.
    pub fn entries(&self) -> Vec<(&'static str, Stat)> {
        STAT_KEYS
            .iter()
            .filter_map(|&key| self.get(key).map(|stat| (key, stat)))
            .collect()
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}
