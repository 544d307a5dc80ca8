use tracing::{info, warn};

use crate::case_base::{Case, CaseBase};
use crate::puzzle::State;
use crate::search::breadth_first_search;

pub const SAMPLE_PUZZLES: [[u8; 9]; 15] = [
    [2, 0, 3, 1, 5, 6, 4, 7, 8],
    [1, 2, 3, 0, 4, 6, 7, 5, 8],
    [1, 2, 3, 4, 5, 6, 7, 0, 8],
    [1, 0, 3, 5, 2, 6, 4, 7, 8],
    [1, 2, 3, 4, 8, 5, 7, 0, 6],
    [2, 8, 3, 1, 0, 5, 4, 7, 6],
    [1, 2, 3, 4, 5, 6, 0, 7, 8],
    [0, 2, 3, 1, 5, 6, 4, 7, 8],
    [1, 3, 0, 4, 2, 6, 7, 5, 8],
    [1, 3, 0, 4, 2, 5, 7, 8, 6],
    [0, 5, 3, 2, 1, 6, 4, 7, 8],
    [5, 1, 3, 2, 0, 6, 4, 7, 8],
    [2, 3, 8, 1, 6, 5, 4, 7, 0],
    [1, 2, 3, 5, 0, 6, 4, 7, 8],
    [0, 3, 6, 2, 1, 5, 4, 7, 8],
];

// Returns the number of cases added; puzzles that fail to solve are skipped.
pub fn seed_case_base(cases: &mut CaseBase, expansion_limit: usize) -> usize {
    let goal = State::solved();
    let mut added = 0;

    for tiles in SAMPLE_PUZZLES {
        let initial = match State::new(tiles) {
            Ok(state) => state,
            Err(err) => {
                warn!(error = %err, ?tiles, "skipping malformed sample puzzle");
                continue;
            }
        };

        match breadth_first_search(initial, goal, expansion_limit) {
            Ok(outcome) => {
                if let Some(case) = Case::new(initial, goal, outcome.path) {
                    cases.add(case);
                    added += 1;
                }
            }
            Err(err) => warn!(error = %err, ?initial, "sample puzzle not solved"),
        }
    }

    info!(added, total = cases.len(), "case base seeded");
    added
}
