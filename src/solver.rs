use rand::Rng;
use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

use crate::case_base::{Case, CaseBase};
use crate::puzzle::State;
use crate::retrieval::{retrieve, CaseScore, Match, RetrievalConfig};
use crate::search::{breadth_first_search, Path, SearchError, DEFAULT_EXPANSION_LIMIT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverConfig {
    pub expansion_limit: usize,
    pub retrieval: RetrievalConfig,
    pub fallback_to_direct: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            expansion_limit: DEFAULT_EXPANSION_LIMIT,
            retrieval: RetrievalConfig::default(),
            fallback_to_direct: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Direct,
    LeadingBridge,
    TrailingBridge,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Leg::Direct => "direct",
            Leg::LeadingBridge => "leading bridge",
            Leg::TrailingBridge => "trailing bridge",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    #[error("goal {goal:?} is not reachable from {initial:?}")]
    Unreachable { initial: State, goal: State },
    #[error("{leg} search from {from:?} to {to:?} failed")]
    Leg {
        leg: Leg,
        from: State,
        to: State,
        #[source]
        source: SearchError,
    },
    #[error("case {0} does not fit the match it was retrieved for")]
    InconsistentCase(usize),
}

impl SolveError {
    pub fn search_error(&self) -> Option<SearchError> {
        match self {
            SolveError::Unreachable { .. } => Some(SearchError::NoSolution { expansions: 0 }),
            SolveError::Leg { source, .. } => Some(*source),
            SolveError::InconsistentCase(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stitched {
    pub path: Path,
    pub expansions: usize,
    pub searches: usize,
}

pub fn stitch(
    initial: State,
    goal: State,
    matched: &Match,
    cases: &CaseBase,
    expansion_limit: usize,
) -> Result<Stitched, SolveError> {
    let mut expansions = 0;
    let mut searches = 0;
    let mut search_leg = |leg: Leg, from: State, to: State| -> Result<Path, SolveError> {
        let outcome = run_leg(leg, from, to, expansion_limit)?;
        expansions += outcome.1;
        searches += 1;
        Ok(outcome.0)
    };

    let segments = match *matched {
        Match::NoMatch => vec![search_leg(Leg::Direct, initial, goal)?],
        Match::ExactMatch { case } => vec![stored_path(cases, case)?],
        Match::GoalAnchor { case, anchor_goal } => {
            let core = stored_path(cases, case)?;
            vec![core, search_leg(Leg::TrailingBridge, anchor_goal, goal)?]
        }
        Match::InitialAnchor {
            case,
            anchor_initial,
        } => {
            let bridge = search_leg(Leg::LeadingBridge, initial, anchor_initial)?;
            vec![bridge, stored_path(cases, case)?]
        }
        Match::FuzzyAnchor {
            case,
            anchor_initial,
            anchor_goal,
        } => {
            let core = stored_path(cases, case)?;
            vec![
                search_leg(Leg::LeadingBridge, initial, anchor_initial)?,
                core,
                search_leg(Leg::TrailingBridge, anchor_goal, goal)?,
            ]
        }
    };

    let inconsistent = || SolveError::InconsistentCase(matched.case().unwrap_or_default());
    let mut segments = segments.into_iter();
    let first = segments.next().ok_or_else(inconsistent)?;
    let path = segments.try_fold(first, |path, next| {
        path.join(&next).ok_or_else(inconsistent)
    })?;
    if *path.start() != initial || *path.end() != goal {
        return Err(inconsistent());
    }

    Ok(Stitched {
        path,
        expansions,
        searches,
    })
}

fn stored_path(cases: &CaseBase, index: usize) -> Result<Path, SolveError> {
    cases
        .get(index)
        .map(|case| case.path().clone())
        .ok_or(SolveError::InconsistentCase(index))
}

fn run_leg(
    leg: Leg,
    from: State,
    to: State,
    expansion_limit: usize,
) -> Result<(Path, usize), SolveError> {
    let fail = |source| SolveError::Leg {
        leg,
        from,
        to,
        source,
    };
    if !from.can_reach(&to) {
        return Err(fail(SearchError::NoSolution { expansions: 0 }));
    }

    let outcome = breadth_first_search(from, to, expansion_limit).map_err(fail)?;
    info!(%leg, expansions = outcome.expansions, cost = outcome.path.cost(), "leg solved");
    Ok((outcome.path, outcome.expansions))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub scores: Vec<CaseScore>,
    pub matched: Match,
    pub path: Path,
    pub expansions: usize,
    pub searches: usize,
    pub learned: Option<usize>,
    pub fell_back: bool,
}

/// Answers `initial` to `goal` and records the result in `cases`.
///
/// Exact matches return the stored path without searching and add nothing. Every other
/// outcome appends one new case, but only after all of its legs succeeded.
pub fn solve<R: Rng + ?Sized>(
    initial: State,
    goal: State,
    cases: &mut CaseBase,
    config: &SolverConfig,
    rng: &mut R,
) -> Result<Solution, SolveError> {
    let started = Instant::now();
    if !initial.can_reach(&goal) {
        return Err(SolveError::Unreachable { initial, goal });
    }

    let retrieval = retrieve(&initial, &goal, cases, &config.retrieval, rng);
    let matched = retrieval.matched;

    let can_fall_back = config.fallback_to_direct
        && !matches!(matched, Match::NoMatch | Match::ExactMatch { .. });
    let mut fell_back = false;
    let stitched = match stitch(initial, goal, &matched, cases, config.expansion_limit) {
        Ok(stitched) => stitched,
        Err(err) if can_fall_back => {
            warn!(error = %err, "stitching failed, searching directly");
            fell_back = true;
            let limit = config.expansion_limit;
            stitch(initial, goal, &Match::NoMatch, cases, limit)?
        }
        Err(err) => return Err(err),
    };

    let learned = match matched {
        Match::ExactMatch { .. } => None,
        _ => {
            let case = Case::new(initial, goal, stitched.path.clone())
                .ok_or(SolveError::InconsistentCase(cases.len()))?;
            let index = cases.add(case);
            info!(case = index, "query learned");
            Some(index)
        }
    };

    info!(
        elapsed = ?started.elapsed(),
        cost = stitched.path.cost(),
        expansions = stitched.expansions,
        searches = stitched.searches,
        "query answered"
    );

    Ok(Solution {
        scores: retrieval.scores,
        matched,
        path: stitched.path,
        expansions: stitched.expansions,
        searches: stitched.searches,
        learned,
        fell_back,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn state(text: &str) -> State {
        text.parse().unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(5)
    }

    fn learn(cases: &mut CaseBase, initial: &str, goal: &str) -> Solution {
        solve(
            state(initial),
            state(goal),
            cases,
            &SolverConfig::default(),
            &mut rng(),
        )
        .unwrap()
    }

    #[test]
    fn goal_anchor_keeps_stored_path_and_bridges_goal() {
        let mut cases = CaseBase::new();
        let first = learn(&mut cases, "2 _ 3 1 5 6 4 7 8", "1 2 3 4 5 6 7 8 _");
        let case = Match::GoalAnchor {
            case: 0,
            anchor_goal: State::solved(),
        };

        let stitched = stitch(
            state("2 _ 3 1 5 6 4 7 8"),
            state("1 2 3 4 5 6 _ 7 8"),
            &case,
            &cases,
            DEFAULT_EXPANSION_LIMIT,
        )
        .unwrap();

        assert_eq!(stitched.searches, 1);
        assert_eq!(stitched.path.cost(), first.path.cost() + 2);
        let prefix = &stitched.path.states()[..first.path.len()];
        assert_eq!(prefix, first.path.states());
        assert_eq!(*stitched.path.end(), state("1 2 3 4 5 6 _ 7 8"));
    }

    #[test]
    fn initial_anchor_prepends_leading_bridge() {
        let mut cases = CaseBase::new();
        let first = learn(&mut cases, "1 2 3 4 5 6 7 _ 8", "1 2 3 4 5 6 7 8 _");
        let case = Match::InitialAnchor {
            case: 0,
            anchor_initial: state("1 2 3 4 5 6 7 _ 8"),
        };

        let stitched = stitch(
            state("1 2 3 4 5 6 _ 7 8"),
            State::solved(),
            &case,
            &cases,
            DEFAULT_EXPANSION_LIMIT,
        )
        .unwrap();

        assert_eq!(stitched.path.cost(), 1 + first.path.cost());
        assert_eq!(
            stitched.path.states(),
            &[
                state("1 2 3 4 5 6 _ 7 8"),
                state("1 2 3 4 5 6 7 _ 8"),
                State::solved(),
            ]
        );
    }

    #[test]
    fn fuzzy_anchor_bridges_both_ends() {
        let mut cases = CaseBase::new();
        learn(&mut cases, "1 2 3 4 5 6 _ 7 8", "1 2 3 4 5 6 7 8 _");
        let case = Match::FuzzyAnchor {
            case: 0,
            anchor_initial: state("1 2 3 4 5 6 _ 7 8"),
            anchor_goal: State::solved(),
        };

        let stitched = stitch(
            state("1 2 3 4 5 6 7 _ 8"),
            state("1 2 3 4 5 _ 7 8 6"),
            &case,
            &cases,
            DEFAULT_EXPANSION_LIMIT,
        )
        .unwrap();

        // 1 leading + 2 stored + 1 trailing
        assert_eq!(stitched.searches, 2);
        assert_eq!(stitched.path.cost(), 4);
        assert_eq!(stitched.path.len(), 5);
        assert!(stitched
            .path
            .states()
            .windows(2)
            .all(|w| w[0].is_adjacent(&w[1])));
    }

    #[test]
    fn failed_leg_reports_which_leg() {
        let mut cases = CaseBase::new();
        learn(&mut cases, "2 _ 3 1 5 6 4 7 8", "1 2 3 4 5 6 7 8 _");
        let case = Match::GoalAnchor {
            case: 0,
            anchor_goal: State::solved(),
        };

        let err = stitch(
            state("2 _ 3 1 5 6 4 7 8"),
            state("1 2 3 4 5 6 _ 7 8"),
            &case,
            &cases,
            0,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            SolveError::Leg {
                leg: Leg::TrailingBridge,
                source: SearchError::LimitReached { expansions: 0 },
                ..
            }
        ));
    }

    #[test]
    fn failed_query_does_not_learn() {
        let mut cases = CaseBase::new();
        let config = SolverConfig {
            expansion_limit: 3,
            ..SolverConfig::default()
        };
        let err = solve(
            state("2 _ 3 1 5 6 4 7 8"),
            State::solved(),
            &mut cases,
            &config,
            &mut rng(),
        )
        .unwrap_err();

        assert_eq!(
            err.search_error(),
            Some(SearchError::LimitReached { expansions: 3 })
        );
        assert!(cases.is_empty());
    }

    #[test]
    fn unreachable_query_is_rejected_before_searching() {
        let mut cases = CaseBase::new();
        let err = solve(
            State::solved(),
            state("2 1 3 4 5 6 7 8 _"),
            &mut cases,
            &SolverConfig::default(),
            &mut rng(),
        )
        .unwrap_err();

        assert_eq!(
            err.search_error(),
            Some(SearchError::NoSolution { expansions: 0 })
        );
        assert!(cases.is_empty());
    }

    #[test]
    fn fallback_replaces_unreachable_anchor() {
        let mut cases = CaseBase::new();
        // odd permutations, reachable from each other but not from the solved board
        learn(&mut cases, "2 1 3 4 5 6 7 _ 8", "2 1 3 4 5 6 7 8 _");

        let initial = state("1 2 3 4 5 6 7 _ 8");
        let goal = State::solved();
        let strict = SolverConfig::default();
        let err = solve(initial, goal, &mut cases, &strict, &mut rng()).unwrap_err();
        assert!(matches!(
            err,
            SolveError::Leg {
                leg: Leg::LeadingBridge,
                ..
            }
        ));
        assert_eq!(cases.len(), 1);

        let lenient = SolverConfig {
            fallback_to_direct: true,
            ..strict
        };
        let solution = solve(initial, goal, &mut cases, &lenient, &mut rng()).unwrap();
        assert!(solution.fell_back);
        assert_eq!(solution.path.cost(), 1);
        assert_eq!(solution.learned, Some(1));
    }
}
