use tracing::debug;

use crate::puzzle::{State, CELLS};
use crate::search::Path;

pub fn similarity(a: &State, b: &State) -> u8 {
    a.tiles()
        .iter()
        .zip(b.tiles())
        .filter(|(x, y)| x == y)
        .count() as u8
}

pub const FULL_MATCH: u8 = CELLS as u8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    initial: State,
    goal: State,
    path: Path,
}

impl Case {
    pub fn new(initial: State, goal: State, path: Path) -> Option<Self> {
        if *path.start() != initial || *path.end() != goal {
            return None;
        }
        Some(Self {
            initial,
            goal,
            path,
        })
    }

    pub fn initial(&self) -> &State {
        &self.initial
    }

    pub fn goal(&self) -> &State {
        &self.goal
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaseBase {
    cases: Vec<Case>,
}

impl CaseBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, case: Case) -> usize {
        let index = self.cases.len();
        debug!(
            index,
            initial = ?case.initial,
            goal = ?case.goal,
            cost = case.path.cost(),
            "case added"
        );
        self.cases.push(case);
        index
    }

    pub fn get(&self, index: usize) -> Option<&Case> {
        self.cases.get(index)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Case> {
        self.cases.iter()
    }
}
