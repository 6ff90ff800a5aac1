//! Point calculators for memory and multiple-choice questions.
//!
//! Inputs always come from server-synchronized state; nothing here counts local events.

use crate::state::{
    ClientState,
    game::{Bumper, DEFAULT_POINTS_PER_PAIR, MemoryConfig, QcmConfig, Question, QuestionKind},
};

/// Progress of a memory question as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryProgress {
    /// Pairs found so far.
    pub matched_pairs: usize,
    /// Pairs in the grid.
    pub total_pairs: usize,
    /// Mismatches so far.
    pub errors: u32,
}

impl MemoryProgress {
    /// Every pair of a non-empty grid has been found.
    pub fn is_complete(&self) -> bool {
        self.total_pairs > 0 && self.matched_pairs == self.total_pairs
    }
}

fn points_per_pair(config: &MemoryConfig) -> i64 {
    if config.points_per_pair > 0 {
        i64::from(config.points_per_pair)
    } else {
        i64::from(DEFAULT_POINTS_PER_PAIR)
    }
}

/// `matched * per_pair + bonus_if_complete - errors * penalty`, never below zero.
pub fn memory_score(progress: MemoryProgress, config: &MemoryConfig) -> i64 {
    let matched = i64::try_from(progress.matched_pairs).unwrap_or(i64::MAX);
    let mut score = matched.saturating_mul(points_per_pair(config));
    if progress.is_complete() {
        score = score.saturating_add(i64::from(config.completion_bonus));
    }
    score = score.saturating_sub(i64::from(progress.errors) * i64::from(config.error_penalty));
    score.max(0)
}

/// Best possible memory score: every pair found without a mistake.
pub fn memory_max_points(total_pairs: usize, config: &MemoryConfig) -> i64 {
    let pairs = i64::try_from(total_pairs).unwrap_or(i64::MAX);
    pairs
        .saturating_mul(points_per_pair(config))
        .saturating_add(i64::from(config.completion_bonus))
}

fn current_memory_question(state: &ClientState) -> Option<&Question> {
    state
        .game
        .question
        .as_ref()
        .filter(|question| question.kind == QuestionKind::Memory)
}

/// Progress of the current question, `None` unless it is a memory question.
pub fn memory_progress(state: &ClientState) -> Option<MemoryProgress> {
    current_memory_question(state).map(|question| MemoryProgress {
        matched_pairs: state.game.memory_matched_pairs.len(),
        total_pairs: question.memory_pairs.len(),
        errors: state.game.memory_errors,
    })
}

/// Score of the current memory question.
pub fn current_memory_score(state: &ClientState) -> Option<i64> {
    let question = current_memory_question(state)?;
    let progress = memory_progress(state)?;
    let config = question.memory.clone().unwrap_or_default();
    Some(memory_score(progress, &config))
}

/// Multiplier applied to a QCM answer given after `hints` invalidations.
pub fn penalty_multiplier(hints: u32, penalty_1: f64, penalty_2: f64) -> f64 {
    match hints {
        0 => 1.0,
        1 => penalty_1,
        _ => penalty_2,
    }
}

/// Points for a correct QCM answer after `hints` invalidations, at least 1.
pub fn qcm_effective_points(base: i64, hints: u32, qcm: &QcmConfig) -> i64 {
    let multiplier = penalty_multiplier(hints, qcm.penalty_1, qcm.penalty_2);
    ((base as f64 * multiplier).round() as i64).max(1)
}

/// Points `bumper` would earn with a correct answer on the current question.
///
/// QCM questions use the hint count captured when the bumper buzzed, so two players who buzzed at
/// different moments can be worth different amounts. `None` when there is no question or the bumper
/// has not buzzed.
pub fn bumper_effective_points(state: &ClientState, bumper: &Bumper) -> Option<i64> {
    let question = state.game.question.as_ref()?;
    if bumper.buzz_time.is_none() {
        return None;
    }
    match (&question.kind, &question.qcm) {
        (QuestionKind::Qcm, Some(qcm)) => {
            let live = u32::try_from(state.game.qcm_invalidated.len()).unwrap_or(u32::MAX);
            let hints = bumper.hints_at_buzz.unwrap_or(live);
            Some(qcm_effective_points(question.points, hints, qcm))
        }
        (QuestionKind::Qcm, None) => {
            let hints = bumper.hints_at_buzz.unwrap_or(0);
            Some(qcm_effective_points(question.points, hints, &QcmConfig::default()))
        }
        _ => Some(question.points),
    }
}
