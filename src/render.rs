use crossterm::style::{style, Stylize};
use std::fmt::Display;
use std::io::{self, Write};

use crate::puzzle::{State, BLANK, SIDE};
use crate::retrieval::{CaseScore, Match};
use crate::search::{Path, SearchOutcome};
use crate::solver::{Solution, SolveError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub styled: bool,
}

impl Report {
    pub fn new(styled: bool) -> Self {
        Self { styled }
    }

    fn heading(&self, text: impl Display) -> String {
        if self.styled {
            style(text).cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn tile(&self, value: u8) -> String {
        if value == BLANK {
            " ".to_string()
        } else if self.styled {
            style(value).bold().to_string()
        } else {
            value.to_string()
        }
    }

    pub fn grid(&self, state: &State) -> String {
        state
            .tiles()
            .chunks(SIDE)
            .map(|row| {
                let cells: Vec<String> = row.iter().map(|&value| self.tile(value)).collect();
                format!("[ {} ]\n", cells.join(" | "))
            })
            .collect()
    }

    pub fn write_path<W: Write>(&self, out: &mut W, path: &Path) -> io::Result<()> {
        let mut previous: Option<&State> = None;
        for (index, state) in path.states().iter().enumerate() {
            let label = match previous.and_then(|p| p.move_towards(state)) {
                Some(movement) => format!("Game state {} (blank moved {})", index, movement),
                None => format!("Game state {}", index),
            };
            writeln!(out, "{}", self.heading(label))?;
            writeln!(out, "{}", self.grid(state))?;
            previous = Some(state);
        }
        Ok(())
    }

    pub fn write_search<W: Write>(&self, out: &mut W, outcome: &SearchOutcome) -> io::Result<()> {
        writeln!(out, "Total number of expansions: {}", outcome.expansions)?;
        writeln!(out, "Path cost: {}", outcome.path.cost())?;
        self.write_path(out, &outcome.path)
    }

    pub fn write_scores<W: Write>(&self, out: &mut W, scores: &[CaseScore]) -> io::Result<()> {
        for score in scores {
            writeln!(
                out,
                "case {:>3}: initial {}/9, goal {}/9",
                score.index, score.initial, score.goal
            )?;
        }
        Ok(())
    }

    pub fn write_failure<W: Write>(&self, out: &mut W, err: &SolveError) -> io::Result<()> {
        writeln!(out, "{} {}", self.heading("Query failed:"), err)?;
        if let Some(source) = err.search_error() {
            writeln!(out, "Reason: {}", source)?;
            writeln!(out, "Total number of expansions: {}", source.expansions())?;
        }
        Ok(())
    }

    pub fn write_solution<W: Write>(&self, out: &mut W, solution: &Solution) -> io::Result<()> {
        let summary = match solution.matched.case() {
            Some(case) => format!("{} (case {})", solution.matched.kind(), case),
            None => solution.matched.kind().to_string(),
        };
        writeln!(out, "{} {}", self.heading("Retrieval:"), summary)?;

        match solution.matched {
            Match::GoalAnchor { anchor_goal, .. } => {
                writeln!(out, "Anchor goal state:\n{}", self.grid(&anchor_goal))?;
            }
            Match::InitialAnchor { anchor_initial, .. } => {
                writeln!(out, "Anchor initial state:\n{}", self.grid(&anchor_initial))?;
            }
            Match::FuzzyAnchor {
                anchor_initial,
                anchor_goal,
                ..
            } => {
                writeln!(out, "Anchor initial state:\n{}", self.grid(&anchor_initial))?;
                writeln!(out, "Anchor goal state:\n{}", self.grid(&anchor_goal))?;
            }
            Match::ExactMatch { .. } | Match::NoMatch => {}
        }

        if solution.fell_back {
            writeln!(out, "Stitching failed; solved by direct search instead.")?;
        }
        writeln!(out, "Searches run: {}", solution.searches)?;
        writeln!(out, "Total number of expansions: {}", solution.expansions)?;
        writeln!(out, "Path cost: {}", solution.path.cost())?;
        if let Some(index) = solution.learned {
            writeln!(out, "Stored as case {}", index)?;
        }
        self.write_path(out, &solution.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case_base::CaseBase;
    use crate::search::breadth_first_search;
    use crate::solver::{solve, SolverConfig};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn plain_grid_leaves_blank_empty() {
        let state: State = "2 _ 3 1 5 6 4 7 8".parse().unwrap();
        assert_eq!(
            Report::new(false).grid(&state),
            "[ 2 |   | 3 ]\n[ 1 | 5 | 6 ]\n[ 4 | 7 | 8 ]\n"
        );
    }

    #[test]
    fn styled_grid_keeps_tiles() {
        let grid = Report::new(true).grid(&State::solved());
        assert!(grid.contains('\u{1b}'));
        for tile in 1..=8 {
            assert!(grid.contains(&tile.to_string()));
        }
    }

    #[test]
    fn search_report_lists_every_state() {
        let start: State = "1 2 3 4 5 6 _ 7 8".parse().unwrap();
        let outcome = breadth_first_search(start, State::solved(), 100).unwrap();
        let mut out = Vec::new();
        Report::new(false).write_search(&mut out, &outcome).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Path cost: 2"));
        assert!(text.contains("Game state 0\n"));
        assert!(text.contains("Game state 1 (blank moved right)"));
        assert!(text.contains("Game state 2 (blank moved right)"));
        assert!(!text.contains("Game state 3"));
    }

    #[test]
    fn failure_report_shows_expansions_used() {
        let start: State = "2 _ 3 1 5 6 4 7 8".parse().unwrap();
        let err = solve(
            start,
            State::solved(),
            &mut CaseBase::new(),
            &SolverConfig {
                expansion_limit: 7,
                ..SolverConfig::default()
            },
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();

        let mut out = Vec::new();
        Report::new(false).write_failure(&mut out, &err).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Query failed: direct search"));
        assert!(text.contains("expansion limit reached after 7 expansions"));
        assert!(text.contains("Total number of expansions: 7"));
    }
}
