// kart_core/src/agent/episode.rs

use std::{
    fmt::Debug,
    sync::{Arc, Mutex},
};

/// Deferred termination. A threatening reading moves `Clear` to `Pending`;
/// the next decision boundary moves it through `Terminated` back to `Clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminationLatch {
    #[default]
    Clear,
    Pending,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EpisodeEndReason {
    /// A sensor reported an obstacle inside its alert distance.
    SensorHit,
    /// The caller cut the episode short, e.g. a decision limit.
    Truncated,
}

/// Bookkeeping for one finished episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// Zero-based episode counter of this agent.
    pub episode: u64,
    pub cumulative_reward: f64,
    pub decisions: u64,
    pub checkpoints_passed: u64,
    pub laps: u64,
    pub reason: EpisodeEndReason,
}

/// The learning side. Receives episode boundaries; how it trains, stores or
/// ships policies is its own business.
pub trait Trainer: Debug + Send + Sync {
    fn on_episode_begin(&mut self, _episode: u64) {}

    fn on_episode_end(&mut self, summary: &EpisodeSummary);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrainer;

impl Trainer for NullTrainer {
    fn on_episode_end(&mut self, _summary: &EpisodeSummary) {}
}

/// Records every summary. Clones share the same log, so a handle can be kept
/// after the trainer has been boxed into an agent.
#[derive(Debug, Clone, Default)]
pub struct EpisodeLog {
    summaries: Arc<Mutex<Vec<EpisodeSummary>>>,
    begun: Arc<Mutex<Vec<u64>>>,
}

impl EpisodeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summaries(&self) -> Vec<EpisodeSummary> {
        self.summaries.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Episode numbers in the order they were started.
    pub fn begun(&self) -> Vec<u64> {
        self.begun.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

impl Trainer for EpisodeLog {
    fn on_episode_begin(&mut self, episode: u64) {
        if let Ok(mut begun) = self.begun.lock() {
            begun.push(episode);
        }
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        if let Ok(mut summaries) = self.summaries.lock() {
            summaries.push(summary.clone());
        }
    }
}

/// Running totals of the active episode.
#[derive(Debug, Clone, Default)]
pub(crate) struct EpisodeStats {
    pub episode: u64,
    pub cumulative_reward: f64,
    pub decisions: u64,
    pub checkpoints_passed: u64,
    pub laps: u64,
}

impl EpisodeStats {
    pub fn summarize(&self, reason: EpisodeEndReason) -> EpisodeSummary {
        EpisodeSummary {
            episode: self.episode,
            cumulative_reward: self.cumulative_reward,
            decisions: self.decisions,
            checkpoints_passed: self.checkpoints_passed,
            laps: self.laps,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_log_clones_share_storage() {
        let log = EpisodeLog::new();
        let mut boxed: Box<dyn Trainer> = Box::new(log.clone());

        boxed.on_episode_begin(0);
        boxed.on_episode_end(&EpisodeStats::default().summarize(EpisodeEndReason::Truncated));

        assert_eq!(log.begun(), vec![0]);
        assert_eq!(log.summaries().len(), 1);
        assert_eq!(log.summaries()[0].reason, EpisodeEndReason::Truncated);
    }
}
