//! Outcome search
//!
//! The winning slot is fixed before the drop is animated, so the engine
//! replays natural drops with different starting conditions until one of them
//! ends in that slot. Attempts are generated by `AttemptPlan`, a deterministic
//! iterator keyed by the base seed, so the same request always finds the same
//! trajectory.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use super::board::{Board, DropZone};
use super::rng::SeededRng;
use super::state::{Landing, Outcome, SimulationParams};
use super::tick::simulate;
use crate::mix_seed;
use crate::settings::{BoardConfig, ConfigError, EngineSettings, PhysicsConfig, SearchConfig};

/// Golden-ratio conjugate, spreads bounce randomness evenly over its range
const GOLDEN: f32 = 0.618_034;
/// Starting-offset patterns cycled through by the attempt plan
const PATTERN_COUNT: u32 = 8;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("target slot {target} is out of range (board has {slot_count} slots)")]
    TargetOutOfRange { target: usize, slot_count: usize },
    #[error("drop zone {index} lies outside the board")]
    InvalidDropZone { index: usize },
    #[error("no drop landed in slot {target:?} after {attempts} attempts")]
    Exhausted {
        target: Option<usize>,
        attempts: u32,
    },
    #[error("search cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What counts as an acceptable landing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Physics must land in this slot
    Targeted(usize),
    /// Accept the first valid natural landing
    Classic,
}

impl SearchMode {
    fn accepts(&self, slot: usize) -> bool {
        match self {
            SearchMode::Targeted(target) => *target == slot,
            SearchMode::Classic => true,
        }
    }

    fn target(&self) -> Option<usize> {
        match self {
            SearchMode::Targeted(target) => Some(*target),
            SearchMode::Classic => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRequest {
    pub mode: SearchMode,
    pub seed: u64,
    /// Restrict starting positions to a player-chosen zone
    pub drop_zone: Option<DropZone>,
}

impl SearchRequest {
    pub fn targeted(target: usize, seed: u64) -> Self {
        Self {
            mode: SearchMode::Targeted(target),
            seed,
            drop_zone: None,
        }
    }

    pub fn classic(seed: u64) -> Self {
        Self {
            mode: SearchMode::Classic,
            seed,
            drop_zone: None,
        }
    }

    pub fn in_zone(mut self, zone: DropZone) -> Self {
        self.drop_zone = Some(zone);
        self
    }
}

/// Deterministic sequence of attempt parameters with a hard cap
///
/// Starting x is drawn around an anchor (the target slot's centre, or the
/// middle of the allowed range in classic mode) using a rotating set of
/// offset patterns whose spread widens every cycle. Bounce randomness walks
/// the configured range, and each attempt gets its own sub-seed.
#[derive(Debug, Clone)]
pub struct AttemptPlan {
    seed: u64,
    anchor: f32,
    min_x: f32,
    max_x: f32,
    config: SearchConfig,
    index: u32,
}

impl AttemptPlan {
    pub fn new(board: &Board, config: &SearchConfig, request: &SearchRequest) -> Self {
        let (min_x, max_x) = match request.drop_zone {
            Some(zone) => (
                zone.min_x.max(board.min_x()),
                zone.max_x.min(board.max_x()),
            ),
            None => (board.min_x(), board.max_x()),
        };
        let anchor = match request.mode {
            SearchMode::Targeted(target) => board.slot_center(target).clamp(min_x, max_x),
            SearchMode::Classic => (min_x + max_x) * 0.5,
        };
        Self {
            seed: request.seed,
            anchor,
            min_x,
            max_x,
            config: config.clone(),
            index: 0,
        }
    }

    /// Parameters for attempt `index`, independent of iteration order
    pub fn params(&self, index: u32) -> SimulationParams {
        let sub_seed = mix_seed(self.seed, index as u64);
        let mut jitter = SeededRng::new(mix_seed(sub_seed, 0xD209));

        let half_span = (self.max_x - self.min_x) * 0.5;
        let cycle = index / PATTERN_COUNT;
        let spread = (0.15 + cycle as f32 * 0.05).min(1.0);
        let i = index as f32;
        let offset = match index % PATTERN_COUNT {
            0 => 0.0,
            1 => -0.1,
            2 => 0.1,
            3 => -0.25,
            4 => 0.25,
            5 => (i * GOLDEN).sin(),
            6 => (i * 1.37 + 0.5).sin(),
            _ => jitter.next_signed(),
        };
        let start_x = (self.anchor + offset * spread * half_span).clamp(self.min_x, self.max_x);

        let phase = (i * GOLDEN + jitter.next_f32() * 0.25).fract();
        let bounce_randomness = self.config.min_bounce_randomness
            + (self.config.max_bounce_randomness - self.config.min_bounce_randomness) * phase;
        let start_vx = jitter.next_signed() * self.config.max_start_vx;

        SimulationParams {
            start_x,
            start_vx,
            bounce_randomness,
            seed: sub_seed,
        }
    }
}

impl Iterator for AttemptPlan {
    type Item = SimulationParams;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.config.max_attempts {
            return None;
        }
        let params = self.params(self.index);
        self.index += 1;
        Some(params)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.config.max_attempts.saturating_sub(self.index) as usize;
        (remaining, Some(remaining))
    }
}

/// Tagged search result
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    Found(Outcome),
    Exhausted,
    Cancelled,
}

/// Search result plus attempt statistics
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub result: SearchResult,
    pub attempts: u32,
    pub stuck: u32,
    pub never_reached: u32,
    pub wrong_slot: u32,
}

impl SearchReport {
    fn new(result: SearchResult) -> Self {
        Self {
            result,
            attempts: 0,
            stuck: 0,
            never_reached: 0,
            wrong_slot: 0,
        }
    }
}

/// Board, physics and budget bundled for repeated searches
#[derive(Debug, Clone)]
pub struct OutcomeSearch {
    board: Board,
    physics: PhysicsConfig,
    config: SearchConfig,
}

impl OutcomeSearch {
    pub fn new(settings: &EngineSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let board = Board::layout(&settings.board, &settings.physics)?;
        Ok(Self {
            board,
            physics: settings.physics.clone(),
            config: settings.search.clone(),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Attempt parameters this search would try for `request`
    pub fn plan(&self, request: &SearchRequest) -> Result<AttemptPlan, SearchError> {
        if let SearchMode::Targeted(target) = request.mode {
            if target >= self.board.slot_count() {
                return Err(SearchError::TargetOutOfRange {
                    target,
                    slot_count: self.board.slot_count(),
                });
            }
        }
        if let Some(zone) = request.drop_zone {
            let outside = zone.min_x > self.board.max_x() || zone.max_x < self.board.min_x();
            if outside || zone.min_x > zone.max_x {
                return Err(SearchError::InvalidDropZone { index: zone.index });
            }
        }
        Ok(AttemptPlan::new(&self.board, &self.config, request))
    }

    /// Run attempts until one is accepted, the budget runs out, or `cancel`
    /// is raised. Cancellation is checked between attempts only.
    pub fn run(
        &self,
        request: &SearchRequest,
        cancel: &AtomicBool,
    ) -> Result<SearchReport, SearchError> {
        let plan = self.plan(request)?;
        let mut report = SearchReport::new(SearchResult::Exhausted);

        for params in plan {
            if cancel.load(Ordering::Relaxed) {
                log::info!("Search cancelled after {} attempts", report.attempts);
                report.result = SearchResult::Cancelled;
                return Ok(report);
            }

            report.attempts += 1;
            let run = simulate(&self.board, &self.physics, &params);
            match run.landing {
                Landing::Slot(slot) if request.mode.accepts(slot) => {
                    log::info!(
                        "Found drop into slot {} after {} attempts ({} frames, start x={:.1})",
                        slot,
                        report.attempts,
                        run.trajectory.len(),
                        params.start_x
                    );
                    report.result = SearchResult::Found(Outcome {
                        trajectory: run.trajectory,
                        landed_slot: slot,
                        params,
                        attempts: report.attempts,
                    });
                    return Ok(report);
                }
                Landing::Slot(slot) => {
                    log::debug!("Attempt {}: landed in slot {}", report.attempts, slot);
                    report.wrong_slot += 1;
                }
                Landing::Stuck { frame } => {
                    log::debug!("Attempt {}: stuck at frame {}", report.attempts, frame);
                    report.stuck += 1;
                }
                Landing::NeverReachedBucket => {
                    log::debug!("Attempt {}: never reached the bucket", report.attempts);
                    report.never_reached += 1;
                }
            }
        }

        log::warn!(
            "Search for {:?} exhausted {} attempts ({} stuck, {} never reached, {} wrong slot)",
            request.mode,
            report.attempts,
            report.stuck,
            report.never_reached,
            report.wrong_slot
        );
        Ok(report)
    }

    /// Run a request to completion, turning non-success into an error
    pub fn find(&self, request: &SearchRequest) -> Result<Outcome, SearchError> {
        let report = self.run(request, &AtomicBool::new(false))?;
        match report.result {
            SearchResult::Found(outcome) => Ok(outcome),
            SearchResult::Exhausted => Err(SearchError::Exhausted {
                target: request.mode.target(),
                attempts: report.attempts,
            }),
            SearchResult::Cancelled => Err(SearchError::Cancelled {
                attempts: report.attempts,
            }),
        }
    }

    /// Find a natural-looking drop that lands in `target`
    pub fn search(&self, target: usize, seed: u64) -> Result<Outcome, SearchError> {
        self.find(&SearchRequest::targeted(target, seed))
    }

    /// Accept the first valid natural landing
    pub fn search_classic(&self, seed: u64) -> Result<Outcome, SearchError> {
        self.find(&SearchRequest::classic(seed))
    }

    /// Targeted search restricted to drop zone `zone` of `zone_count`
    pub fn search_in_zone(
        &self,
        target: usize,
        seed: u64,
        zone: usize,
        zone_count: usize,
    ) -> Result<Outcome, SearchError> {
        let zones = self.board.drop_zones(zone_count);
        let zone = zones
            .get(zone)
            .copied()
            .ok_or(SearchError::InvalidDropZone { index: zone })?;
        self.find(&SearchRequest::targeted(target, seed).in_zone(zone))
    }
}

/// Search with default physics and budget for a given board
pub fn search(target_slot: usize, board: &BoardConfig, seed: u64) -> Result<Outcome, SearchError> {
    let settings = EngineSettings {
        board: *board,
        ..Default::default()
    };
    OutcomeSearch::new(&settings)?.search(target_slot, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> OutcomeSearch {
        OutcomeSearch::new(&EngineSettings::default()).unwrap()
    }

    #[test]
    fn test_search_hits_every_slot() {
        let engine = engine();
        for target in 0..engine.board().slot_count() {
            let outcome = engine.search(target, 12345).unwrap();
            assert_eq!(outcome.landed_slot, target);
            let last = outcome.trajectory.last().unwrap();
            assert_eq!(engine.board().slot_at(last.x), target);
        }
    }

    #[test]
    fn test_reference_drop() {
        let board = BoardConfig::new(375.0, 500.0, 10, 7);
        let outcome = search(3, &board, 12345).unwrap();
        assert_eq!(outcome.landed_slot, 3);
        let last = outcome.trajectory.last().unwrap();
        assert_eq!((last.x / (375.0 / 7.0)).floor() as usize, 3);
        assert!(outcome.trajectory.len() < 900);
    }

    #[test]
    fn test_search_is_deterministic() {
        let engine = engine();
        let a = engine.search(1, 42).unwrap();
        let b = engine.search(1, 42).unwrap();
        assert_eq!(a.trajectory.len(), b.trajectory.len());
        let (la, lb) = (a.trajectory.last().unwrap(), b.trajectory.last().unwrap());
        assert_eq!((la.x, la.y), (lb.x, lb.y));
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn test_target_out_of_range() {
        let engine = engine();
        assert!(matches!(
            engine.search(7, 1),
            Err(SearchError::TargetOutOfRange { target: 7, slot_count: 7 })
        ));
    }

    #[test]
    fn test_exhausted_budget_is_an_error() {
        let mut settings = EngineSettings::default();
        settings.search.max_attempts = 3;
        // Frame cap too small to ever reach the bucket
        settings.physics.max_frames = 10;
        settings.physics.max_bucket_frames = 10;
        let engine = OutcomeSearch::new(&settings).unwrap();
        match engine.search(3, 1) {
            Err(SearchError::Exhausted { target, attempts }) => {
                assert_eq!(target, Some(3));
                assert_eq!(attempts, 3);
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_exhausted_report_counts_failures() {
        let mut settings = EngineSettings::default();
        settings.search.max_attempts = 4;
        settings.physics.max_frames = 10;
        settings.physics.max_bucket_frames = 10;
        let engine = OutcomeSearch::new(&settings).unwrap();
        let report = engine
            .run(&SearchRequest::classic(5), &AtomicBool::new(false))
            .unwrap();
        assert_eq!(report.result, SearchResult::Exhausted);
        assert_eq!(report.attempts, 4);
        assert_eq!(report.never_reached, 4);
    }

    #[test]
    fn test_cancelled_before_first_attempt() {
        let engine = engine();
        let cancel = AtomicBool::new(true);
        let report = engine.run(&SearchRequest::targeted(2, 9), &cancel).unwrap();
        assert_eq!(report.result, SearchResult::Cancelled);
        assert_eq!(report.attempts, 0);
    }

    #[test]
    fn test_classic_accepts_first_landing() {
        let engine = engine();
        let outcome = engine.search_classic(77).unwrap();
        assert!(outcome.landed_slot < engine.board().slot_count());
        // The first attempt is the natural drop unless it failed outright
        let plan = engine.plan(&SearchRequest::classic(77)).unwrap();
        let first = simulate(engine.board(), engine.physics(), &plan.params(0));
        if let Some(slot) = first.landing.slot() {
            assert_eq!(outcome.attempts, 1);
            assert_eq!(outcome.landed_slot, slot);
        }
    }

    #[test]
    fn test_plan_is_bounded_and_stable() {
        let engine = engine();
        let request = SearchRequest::targeted(2, 1234);
        let plan = engine.plan(&request).unwrap();
        assert_eq!(plan.size_hint(), (20_000, Some(20_000)));
        let first: Vec<_> = plan.clone().take(16).collect();
        let again: Vec<_> = engine.plan(&request).unwrap().take(16).collect();
        assert_eq!(first, again);
        for params in &first {
            assert!(params.start_x >= engine.board().min_x());
            assert!(params.start_x <= engine.board().max_x());
            assert!((0.2..=0.8).contains(&params.bounce_randomness));
        }
        // Sub-seeds differ between attempts
        assert_ne!(first[0].seed, first[1].seed);
    }

    #[test]
    fn test_zone_restricts_start() {
        let engine = engine();
        let zones = engine.board().drop_zones(3);
        let request = SearchRequest::targeted(6, 3).in_zone(zones[0]);
        for params in engine.plan(&request).unwrap().take(64) {
            assert!(zones[0].contains(params.start_x));
        }
        let outcome = engine.search_in_zone(1, 3, 0, 3).unwrap();
        assert_eq!(outcome.landed_slot, 1);
        assert!(zones[0].contains(outcome.params.start_x));
    }

    #[test]
    fn test_invalid_zone_index() {
        let engine = engine();
        assert!(matches!(
            engine.search_in_zone(1, 3, 5, 3),
            Err(SearchError::InvalidDropZone { index: 5 })
        ));
    }
}
