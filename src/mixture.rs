//! Bounded Gaussian mixture sampling
//!
//! Synthetic durations are drawn from a weighted mixture of normal
//! distributions and clipped to an interval by rejection: draws outside
//! `[lower, upper]` are discarded and redrawn until the requested number of
//! samples is reached.
//!
//! Rejection has no natural end when the interval carries (almost) no
//! probability mass, so every sampler has a budget of total draws. Running
//! out of it is a [`SkillTimeError::BoundsUnreachable`] error.

use crate::duration::DurationBounds;
use crate::error::{Result, SkillTimeError};
use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Draw budget floor, used for small sample counts
const MIN_DRAW_BUDGET: u64 = 100_000;

/// Draw budget per requested sample
const DRAWS_PER_SAMPLE: u64 = 1_000;

/// Default total-draw budget for `quantity` samples
pub fn default_max_draws(quantity: usize) -> u64 {
    (quantity as u64)
        .saturating_mul(DRAWS_PER_SAMPLE)
        .max(MIN_DRAW_BUDGET)
}

/// One normal component of the mixture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianComponent {
    pub mean: f64,
    pub stddev: f64,
}

impl GaussianComponent {
    pub fn new(mean: f64, stddev: f64) -> Self {
        Self { mean, stddev }
    }
}

/// How weights were fitted to the component count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Matched,
    /// Missing weights were filled with 1
    Padded { added: usize },
    /// Trailing weights without a component were ignored
    Truncated { dropped: usize },
}

/// Fit `weights` to `components` entries: pad with 1, or truncate
pub fn reconcile_weights(mut weights: Vec<f64>, components: usize) -> (Vec<f64>, Reconciliation) {
    let given = weights.len();
    if given < components {
        weights.resize(components, 1.0);
        (
            weights,
            Reconciliation::Padded {
                added: components - given,
            },
        )
    } else if given > components {
        weights.truncate(components);
        (
            weights,
            Reconciliation::Truncated {
                dropped: given - components,
            },
        )
    } else {
        (weights, Reconciliation::Matched)
    }
}

/// Weighted Gaussian mixture with normalised weights
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureSpec {
    weights: Vec<f64>,
    components: Vec<GaussianComponent>,
    reconciliation: Reconciliation,
}

impl MixtureSpec {
    /// Build a mixture, reconciling and normalising the weights
    ///
    /// A count mismatch is repaired with a warning. Negative or non-finite
    /// weights, a zero weight sum, an empty component list, and a negative
    /// or non-finite stddev are rejected.
    pub fn new(weights: Vec<f64>, components: Vec<GaussianComponent>) -> Result<Self> {
        if components.is_empty() {
            return Err(SkillTimeError::InvalidMixture(
                "at least one component is required".to_string(),
            ));
        }
        for (idx, c) in components.iter().enumerate() {
            if !c.mean.is_finite() || !c.stddev.is_finite() || c.stddev < 0.0 {
                return Err(SkillTimeError::InvalidMixture(format!(
                    "component {} has mean {} and stddev {}",
                    idx, c.mean, c.stddev
                )));
            }
        }

        let (weights, reconciliation) = reconcile_weights(weights, components.len());
        match reconciliation {
            Reconciliation::Matched => {}
            Reconciliation::Padded { added } => tracing::warn!(
                added,
                "fewer distribution weights than distributions, assuming weight 1"
            ),
            Reconciliation::Truncated { dropped } => tracing::warn!(
                dropped,
                "more distribution weights than distributions, ignoring trailing weights"
            ),
        }

        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(SkillTimeError::InvalidMixture(format!(
                "weight {} is not a finite non-negative number",
                bad
            )));
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(SkillTimeError::InvalidMixture(format!(
                "weights sum to {}",
                total
            )));
        }

        Ok(Self {
            weights: weights.iter().map(|w| w / total).collect(),
            components,
            reconciliation,
        })
    }

    /// Normalised weights, summing to 1
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn components(&self) -> &[GaussianComponent] {
        &self.components
    }

    pub fn reconciliation(&self) -> Reconciliation {
        self.reconciliation
    }
}

/// Samples returned by a [`BoundedMixtureSampler`]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    /// Accepted samples in draw order
    pub samples: Vec<f64>,
    /// Smallest value drawn, accepted or not
    pub observed_min: f64,
    /// Largest value drawn, accepted or not
    pub observed_max: f64,
    /// Total number of draws
    pub draws: u64,
}

impl SampleSet {
    fn empty() -> Self {
        Self {
            samples: Vec::new(),
            observed_min: f64::INFINITY,
            observed_max: f64::NEG_INFINITY,
            draws: 0,
        }
    }

    /// Fraction of draws that were accepted
    pub fn acceptance_ratio(&self) -> f64 {
        if self.draws == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.draws as f64
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }
}

/// Rejection sampler over a [`MixtureSpec`] clipped to [`DurationBounds`]
#[derive(Debug, Clone)]
pub struct BoundedMixtureSampler {
    spec: MixtureSpec,
    bounds: DurationBounds,
    max_draws: Option<u64>,
    selector: WeightedIndex<f64>,
    normals: Vec<Normal<f64>>,
}

impl BoundedMixtureSampler {
    pub fn new(spec: MixtureSpec, bounds: DurationBounds) -> Result<Self> {
        let selector = WeightedIndex::new(spec.weights())
            .map_err(|e| SkillTimeError::InvalidMixture(e.to_string()))?;
        let normals = spec
            .components()
            .iter()
            .map(|c| {
                Normal::new(c.mean, c.stddev)
                    .map_err(|e| SkillTimeError::InvalidMixture(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            spec,
            bounds,
            max_draws: None,
            selector,
            normals,
        })
    }

    /// Override the total-draw budget (default: [`default_max_draws`])
    pub fn with_max_draws(mut self, max_draws: u64) -> Self {
        self.max_draws = Some(max_draws);
        self
    }

    pub fn spec(&self) -> &MixtureSpec {
        &self.spec
    }

    pub fn bounds(&self) -> DurationBounds {
        self.bounds
    }

    /// One unbounded draw from the mixture
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let idx = self.selector.sample(rng);
        self.normals[idx].sample(rng)
    }

    /// Draw exactly `quantity` samples inside the bounds
    ///
    /// Each round draws as many values as are still missing and keeps those
    /// inside the bounds.
    pub fn sample<R: Rng + ?Sized>(&self, quantity: usize, rng: &mut R) -> Result<SampleSet> {
        let budget = self.max_draws.unwrap_or_else(|| default_max_draws(quantity));
        let mut set = SampleSet::empty();

        while set.samples.len() < quantity {
            let remaining = (quantity - set.samples.len()) as u64;
            let batch = remaining.min(budget.saturating_sub(set.draws));
            if batch == 0 {
                return Err(SkillTimeError::BoundsUnreachable {
                    accepted: set.samples.len(),
                    requested: quantity,
                    draws: set.draws,
                });
            }

            let mut accepted_in_batch = 0usize;
            for _ in 0..batch {
                let x = self.draw(rng);
                set.observed_min = set.observed_min.min(x);
                set.observed_max = set.observed_max.max(x);
                if self.bounds.contains(x) {
                    set.samples.push(x);
                    accepted_in_batch += 1;
                }
            }
            set.draws += batch;
            tracing::trace!(batch, accepted_in_batch, total = set.samples.len(), "sampling round");
        }

        Ok(set)
    }
}
