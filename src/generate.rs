//! Synthetic lookup entries from a bounded Gaussian mixture

use crate::arguments::sample_arguments;
use crate::config::GenerateConfig;
use crate::duration::DurationBounds;
use crate::error::Result;
use crate::lookup::{InsertOutcome, LookupEntry, LookupWriter};
use crate::mixture::{BoundedMixtureSampler, MixtureSpec};
use crate::store::LookupStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded generator, or one seeded from the OS when no seed is given
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Summary of a finished generate pass
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateReport {
    /// Entries inserted, or that would be inserted in dry-run mode
    pub added: usize,
    /// Total mixture draws, rejected ones included
    pub draws: u64,
    pub observed_min: f64,
    pub observed_max: f64,
    pub mean: Option<f64>,
}

/// Sample durations and write one synthetic entry per sample
///
/// Entries are not checked for duplicates: each sample is its own
/// observation.
pub fn generate<S, R, F>(
    config: &GenerateConfig,
    writer: &mut LookupWriter<'_, S>,
    rng: &mut R,
    mut on_added: F,
) -> Result<GenerateReport>
where
    S: LookupStore + ?Sized,
    R: Rng + ?Sized,
    F: FnMut(&LookupEntry),
{
    config.validate()?;
    let bounds = DurationBounds::new(config.lower_bound, config.upper_bound)?;
    let spec = MixtureSpec::new(config.weights.clone(), config.components.clone())?;
    let mut sampler = BoundedMixtureSampler::new(spec, bounds)?;
    if let Some(max_draws) = config.max_draws {
        sampler = sampler.with_max_draws(max_draws);
    }

    let set = sampler.sample(config.quantity, rng)?;
    tracing::info!(
        accepted = set.samples.len(),
        draws = set.draws,
        acceptance = set.acceptance_ratio(),
        observed_min = set.observed_min,
        observed_max = set.observed_max,
        "sampled durations"
    );

    let mut added = 0;
    for duration in &set.samples {
        let args = sample_arguments(&config.args, rng);
        let entry = LookupEntry::synthetic(config.skill_name.clone(), args, *duration);
        match writer.record_unchecked(entry.clone())? {
            InsertOutcome::Inserted | InsertOutcome::Skipped => {
                added += 1;
                on_added(&entry);
            }
            InsertOutcome::Duplicate => {}
        }
    }

    Ok(GenerateReport {
        added,
        draws: set.draws,
        observed_min: set.observed_min,
        observed_max: set.observed_max,
        mean: set.mean(),
    })
}
