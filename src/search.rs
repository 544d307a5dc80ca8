use std::collections::{HashMap, VecDeque};
use std::fmt;

use tracing::debug;

use crate::puzzle::State;

pub const DEFAULT_EXPANSION_LIMIT: usize = 200_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("no solution exists (frontier exhausted after {expansions} expansions)")]
    NoSolution { expansions: usize },
    #[error("expansion limit reached after {expansions} expansions")]
    LimitReached { expansions: usize },
}

impl SearchError {
    pub fn expansions(&self) -> usize {
        match *self {
            SearchError::NoSolution { expansions } | SearchError::LimitReached { expansions } => {
                expansions
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Path {
    states: Vec<State>,
}

impl Path {
    pub fn single(state: State) -> Self {
        Self {
            states: vec![state],
        }
    }

    pub fn from_states(states: Vec<State>) -> Option<Self> {
        if states.is_empty() || states.windows(2).any(|w| !w[0].is_adjacent(&w[1])) {
            return None;
        }
        Some(Self { states })
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn cost(&self) -> usize {
        self.states.len() - 1
    }

    pub fn start(&self) -> &State {
        &self.states[0]
    }

    pub fn end(&self) -> &State {
        &self.states[self.states.len() - 1]
    }

    // Appends `next`, which must begin where `self` ends. The shared junction state is kept once.
    pub fn join(mut self, next: &Path) -> Option<Self> {
        if self.end() != next.start() {
            return None;
        }
        self.states.extend_from_slice(&next.states[1..]);
        Some(self)
    }

    pub fn into_states(self) -> Vec<State> {
        self.states
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.states).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub path: Path,
    pub expansions: usize,
}

/// Blind breadth-first search from `start` to `goal`.
///
/// Every dequeued state costs one unit of `expansion_limit` and is tested against the goal
/// before its successors are generated. Successors are queued in [`State::successors`] order
/// and a state is queued at most once, so the result is deterministic and, unless the limit
/// cuts the search short, a shortest path.
pub fn breadth_first_search(
    start: State,
    goal: State,
    expansion_limit: usize,
) -> Result<SearchOutcome, SearchError> {
    if start == goal {
        return Ok(SearchOutcome {
            path: Path::single(start),
            expansions: 0,
        });
    }

    // Discovered states and the state they were reached from.
    let mut parents: HashMap<State, Option<State>> = HashMap::new();
    parents.insert(start, None);
    let mut frontier = VecDeque::from([start]);
    let mut expansions = 0;

    while let Some(state) = frontier.pop_front() {
        if expansions == expansion_limit {
            debug!(expansions, ?start, ?goal, "expansion limit reached");
            return Err(SearchError::LimitReached { expansions });
        }
        expansions += 1;

        if state == goal {
            let path = trace_back(&parents, state);
            debug!(expansions, cost = path.cost(), ?start, ?goal, "goal reached");
            return Ok(SearchOutcome { path, expansions });
        }

        for next in state.successors() {
            if !parents.contains_key(&next) {
                parents.insert(next, Some(state));
                frontier.push_back(next);
            }
        }
    }

    debug!(expansions, ?start, ?goal, "frontier exhausted");
    Err(SearchError::NoSolution { expansions })
}

fn trace_back(parents: &HashMap<State, Option<State>>, end: State) -> Path {
    let mut states = vec![end];
    let mut cursor = end;
    while let Some(&Some(previous)) = parents.get(&cursor) {
        states.push(previous);
        cursor = previous;
    }
    states.reverse();
    Path { states }
}
