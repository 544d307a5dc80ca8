pub mod case_base;
pub mod puzzle;
pub mod render;
pub mod retrieval;
pub mod search;
pub mod seed;
pub mod solver;

pub use case_base::{similarity, Case, CaseBase};
pub use puzzle::{Move, State, StateError};
pub use retrieval::{retrieve, Match, MatchKind, RetrievalConfig};
pub use search::{breadth_first_search, Path, SearchError, SearchOutcome};
pub use solver::{solve, Solution, SolveError, SolverConfig};
