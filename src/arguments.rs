//! Argument values for synthetic lookup entries
//!
//! Each configured argument lists its candidate values. Arguments with at
//! most one candidate are written as the wildcard `*`; otherwise one value
//! is chosen uniformly at random, independently per argument and per entry.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value written for arguments that match anything
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Pick the value for one entry
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        if self.values.len() <= 1 {
            return WILDCARD.to_string();
        }
        self.values
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| WILDCARD.to_string())
    }
}

/// Draw a fresh argument mapping for one synthetic entry
pub fn sample_arguments<R: Rng + ?Sized>(
    specs: &[ArgumentSpec],
    rng: &mut R,
) -> BTreeMap<String, String> {
    specs
        .iter()
        .map(|spec| (spec.name.clone(), spec.sample(rng)))
        .collect()
}
