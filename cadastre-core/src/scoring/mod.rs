//! Parcel scoring: the pluggable [`Scorer`] and the background worker pool
//! that applies it to newly created parcels.

pub mod worker;

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use cadastre_model::{Parcel, round_score};
use rand::Rng;
use tracing::debug;

use crate::error::{CadastreError, Result};

pub use worker::{
    ScoringEvent, ScoringJob, ScoringOutcome, ScoringQueue, ScoringWorkerPool,
};

/// Tunables for the default scorer and the worker pool.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
    pub min_score: f64,
    pub max_score: f64,
    pub max_concurrent_jobs: usize,
    pub queue_capacity: usize,
    pub shutdown_grace: Duration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 10,
            max_delay_secs: 20,
            min_score: -100.0,
            max_score: 100.0,
            max_concurrent_jobs: 64,
            queue_capacity: 1024,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Computes a score for a parcel. Implementations may take arbitrarily long.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, parcel: &Parcel) -> Result<f64>;
}

/// Sleeps a random whole number of seconds, then draws a uniform score.
#[derive(Debug, Clone)]
pub struct RandomScorer {
    delay_secs: RangeInclusive<u64>,
    scores: RangeInclusive<f64>,
}

impl RandomScorer {
    pub fn new(
        delay_secs: RangeInclusive<u64>,
        scores: RangeInclusive<f64>,
    ) -> Result<Self> {
        if delay_secs.is_empty() {
            return Err(CadastreError::Internal(format!(
                "scoring delay range {}..={} is empty",
                delay_secs.start(),
                delay_secs.end()
            )));
        }
        // `is_empty` is also true when either bound is NaN.
        if scores.is_empty() {
            return Err(CadastreError::Internal(format!(
                "score range {}..={} is empty",
                scores.start(),
                scores.end()
            )));
        }
        // Uniform sampling needs a finite span, not just finite bounds.
        if !(scores.end() - scores.start()).is_finite() {
            return Err(CadastreError::Internal(format!(
                "score range {}..={} must have finite bounds",
                scores.start(),
                scores.end()
            )));
        }
        Ok(Self { delay_secs, scores })
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        Self::new(
            config.min_delay_secs..=config.max_delay_secs,
            config.min_score..=config.max_score,
        )
    }
}

#[async_trait]
impl Scorer for RandomScorer {
    async fn score(&self, parcel: &Parcel) -> Result<f64> {
        // ThreadRng is !Send; draw everything before the first await.
        let (delay, score) = {
            let mut rng = rand::rng();
            (
                rng.random_range(self.delay_secs.clone()),
                rng.random_range(self.scores.clone()),
            )
        };

        debug!(
            cadastral_number = %parcel.cadastral_number,
            delay_secs = delay,
            "simulating remote calculation"
        );
        tokio::time::sleep(Duration::from_secs(delay)).await;

        Ok(round_score(score))
    }
}

/// Returns the same score for every parcel after an optional delay.
#[derive(Debug, Clone)]
pub struct FixedScorer {
    score: f64,
    delay: Duration,
}

impl FixedScorer {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Scorer for FixedScorer {
    async fn score(&self, _parcel: &Parcel) -> Result<f64> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.score)
    }
}
