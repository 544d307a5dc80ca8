use rand::{seq::SliceRandom, Rng};
use std::fmt;
use tracing::{debug, info};

use crate::case_base::{similarity, CaseBase, FULL_MATCH};
use crate::puzzle::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalConfig {
    pub min_similarity: u8,
    pub min_total_similarity: u8,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_similarity: 5,
            min_total_similarity: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseScore {
    pub index: usize,
    pub initial: u8,
    pub goal: u8,
}

impl CaseScore {
    pub fn total(&self) -> u8 {
        self.initial + self.goal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    ExactMatch { case: usize },
    GoalAnchor { case: usize, anchor_goal: State },
    InitialAnchor { case: usize, anchor_initial: State },
    FuzzyAnchor {
        case: usize,
        anchor_initial: State,
        anchor_goal: State,
    },
    NoMatch,
}

impl Match {
    pub fn case(&self) -> Option<usize> {
        match *self {
            Match::ExactMatch { case }
            | Match::GoalAnchor { case, .. }
            | Match::InitialAnchor { case, .. }
            | Match::FuzzyAnchor { case, .. } => Some(case),
            Match::NoMatch => None,
        }
    }

    pub fn kind(&self) -> MatchKind {
        match self {
            Match::ExactMatch { .. } => MatchKind::Exact,
            Match::GoalAnchor { .. } => MatchKind::GoalAnchor,
            Match::InitialAnchor { .. } => MatchKind::InitialAnchor,
            Match::FuzzyAnchor { .. } => MatchKind::Fuzzy,
            Match::NoMatch => MatchKind::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    GoalAnchor,
    InitialAnchor,
    Fuzzy,
    None,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchKind::Exact => "exact match",
            MatchKind::GoalAnchor => "exact initial state, similar goal",
            MatchKind::InitialAnchor => "exact goal state, similar initial",
            MatchKind::Fuzzy => "similar initial and goal",
            MatchKind::None => "no similar case",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieval {
    pub scores: Vec<CaseScore>,
    pub matched: Match,
}

pub fn score_cases(initial: &State, goal: &State, cases: &CaseBase) -> Vec<CaseScore> {
    cases
        .iter()
        .enumerate()
        .map(|(index, case)| CaseScore {
            index,
            initial: similarity(initial, case.initial()),
            goal: similarity(goal, case.goal()),
        })
        .collect()
}

/// Scores `initial`/`goal` against every case and picks the match.
///
/// Tiers are tried in order: an exact match anywhere in the base, then the first case (in
/// insertion order) sharing the initial or the goal exactly with the other side similar,
/// then the best fuzzy match. Only the fuzzy tier compares scores between cases; ties there
/// are broken with `rng`.
pub fn retrieve<R: Rng + ?Sized>(
    initial: &State,
    goal: &State,
    cases: &CaseBase,
    config: &RetrievalConfig,
    rng: &mut R,
) -> Retrieval {
    let scores = score_cases(initial, goal, cases);
    for score in &scores {
        debug!(
            case = score.index,
            initial = score.initial,
            goal = score.goal,
            "case similarity"
        );
    }

    let matched = classify(&scores, cases, config, rng);
    info!(kind = %matched.kind(), case = ?matched.case(), "retrieval finished");
    Retrieval { scores, matched }
}

fn classify<R: Rng + ?Sized>(
    scores: &[CaseScore],
    cases: &CaseBase,
    config: &RetrievalConfig,
    rng: &mut R,
) -> Match {
    if let Some(score) = scores
        .iter()
        .find(|s| s.initial == FULL_MATCH && s.goal == FULL_MATCH)
    {
        return Match::ExactMatch { case: score.index };
    }

    let similar = |value: u8| value >= config.min_similarity;

    for score in scores {
        let Some(case) = cases.get(score.index) else {
            continue;
        };
        if score.initial == FULL_MATCH && similar(score.goal) {
            return Match::GoalAnchor {
                case: score.index,
                anchor_goal: *case.goal(),
            };
        }
        if score.goal == FULL_MATCH && similar(score.initial) {
            return Match::InitialAnchor {
                case: score.index,
                anchor_initial: *case.initial(),
            };
        }
    }

    let qualifying: Vec<&CaseScore> = scores
        .iter()
        .filter(|s| similar(s.initial) && similar(s.goal))
        .filter(|s| s.total() >= config.min_total_similarity)
        .collect();
    let Some(best) = qualifying.iter().map(|s| s.total()).max() else {
        return Match::NoMatch;
    };
    let candidates: Vec<usize> = qualifying
        .iter()
        .filter(|s| s.total() == best)
        .map(|s| s.index)
        .collect();

    match candidates
        .choose(rng)
        .and_then(|&index| cases.get(index).map(|case| (index, case)))
    {
        Some((index, case)) => {
            debug!(
                best,
                candidates = candidates.len(),
                chosen = index,
                "fuzzy tie-break"
            );
            Match::FuzzyAnchor {
                case: index,
                anchor_initial: *case.initial(),
                anchor_goal: *case.goal(),
            }
        }
        None => Match::NoMatch,
    }
}
