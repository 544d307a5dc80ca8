use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, thread_rng, RngCore, SeedableRng};
use std::io::{self, BufRead, Write};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use eight_puzzle_cbr::puzzle::{parse_cell, CELLS, CELL_NAMES};
use eight_puzzle_cbr::render::Report;
use eight_puzzle_cbr::search::DEFAULT_EXPANSION_LIMIT;
use eight_puzzle_cbr::seed::seed_case_base;
use eight_puzzle_cbr::{breadth_first_search, solve, CaseBase, RetrievalConfig, SolverConfig, State};

#[derive(Parser)]
#[command(name = "eight-puzzle-cbr")]
#[command(about = "8-puzzle breadth-first search with case-based reasoning")]
struct Cli {
    /// Expansion budget for every search
    #[arg(long, global = true, default_value_t = DEFAULT_EXPANSION_LIMIT)]
    limit: usize,

    /// Start with an empty case base instead of the sample puzzles
    #[arg(long, global = true)]
    no_seed: bool,

    /// Seed for the tie-break random source
    #[arg(long, global = true)]
    rng_seed: Option<u64>,

    /// Fall back to a direct search when stitching fails
    #[arg(long, global = true)]
    fallback: bool,

    /// Per-side similarity needed to count as a match
    #[arg(long, global = true, default_value_t = 5)]
    min_similarity: u8,

    /// Combined similarity needed for a fuzzy match
    #[arg(long, global = true, default_value_t = 10)]
    min_total_similarity: u8,

    /// Plain output without terminal styling
    #[arg(long, global = true)]
    no_color: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plain breadth-first search, bypassing the case base
    Search {
        /// Nine cells, NW to SE, e.g. "2,_,3,1,5,6,4,7,8"
        initial: State,
        goal: State,
    },
    /// Answer one query through the case base
    Query { initial: State, goal: State },
    /// Prompt for puzzles until told to stop (default)
    Interactive,
    /// Answer random solvable queries
    Random {
        #[arg(long, default_value_t = 5)]
        count: usize,
        /// Goal for every query; the solved board when omitted
        #[arg(long)]
        goal: Option<State>,
    },
}

struct Session {
    cases: CaseBase,
    config: SolverConfig,
    rng: Box<dyn RngCore>,
    report: Report,
}

impl Session {
    fn answer<W: Write>(&mut self, out: &mut W, initial: State, goal: State) -> Result<()> {
        let started = Instant::now();
        match solve(
            initial,
            goal,
            &mut self.cases,
            &self.config,
            self.rng.as_mut(),
        ) {
            Ok(solution) => {
                self.report.write_scores(out, &solution.scores)?;
                self.report.write_solution(out, &solution)?;
            }
            Err(err) => self.report.write_failure(out, &err)?,
        }
        writeln!(
            out,
            "Time taken for search with case-based reasoning: {:.3?}",
            started.elapsed()
        )?;
        Ok(())
    }
}

fn prompt_state<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    label: &str,
) -> Result<Option<State>> {
    loop {
        writeln!(out, "Enter {} state (0 or _ for blank):", label)?;
        let mut cells = Vec::with_capacity(CELLS);
        for name in CELL_NAMES {
            loop {
                write!(out, "{} element: ", name)?;
                out.flush()?;
                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                match parse_cell(&line) {
                    Ok(value) => {
                        cells.push(value);
                        break;
                    }
                    Err(err) => writeln!(out, "{}", err)?,
                }
            }
        }

        match State::from_slice(&cells) {
            Ok(state) => return Ok(Some(state)),
            Err(err) => writeln!(out, "Invalid {} state: {}", label, err)?,
        }
    }
}

fn prompt_continue<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<bool> {
    write!(out, "Press 1 to continue and 0 to exit: ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(matches!(line.trim(), "1" | "y" | "yes"))
}

fn interactive(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    loop {
        let Some(initial) = prompt_state(&mut input, &mut out, "initial")? else {
            break;
        };
        let Some(goal) = prompt_state(&mut input, &mut out, "goal")? else {
            break;
        };
        session.answer(&mut out, initial, goal)?;
        if !prompt_continue(&mut input, &mut out)? {
            break;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = SolverConfig {
        expansion_limit: cli.limit,
        retrieval: RetrievalConfig {
            min_similarity: cli.min_similarity,
            min_total_similarity: cli.min_total_similarity,
        },
        fallback_to_direct: cli.fallback,
    };
    let report = Report::new(!cli.no_color);
    let mut out = io::stdout();

    if let Some(Commands::Search { initial, goal }) = cli.command {
        let outcome = breadth_first_search(initial, goal, config.expansion_limit)
            .with_context(|| format!("searching from {:?} to {:?}", initial, goal))?;
        report.write_search(&mut out, &outcome)?;
        return Ok(());
    }

    let rng: Box<dyn RngCore> = match cli.rng_seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(thread_rng()),
    };
    let mut session = Session {
        cases: CaseBase::new(),
        config,
        rng,
        report,
    };

    if !cli.no_seed {
        writeln!(out, "Pre-populating the case base...")?;
        let added = seed_case_base(&mut session.cases, config.expansion_limit);
        writeln!(out, "Case base is ready with {} cases", added)?;
    }

    match cli.command {
        Some(Commands::Query { initial, goal }) => session.answer(&mut out, initial, goal)?,
        Some(Commands::Random { count, goal }) => {
            let goal = goal.unwrap_or_else(State::solved);
            for round in 1..=count {
                let initial = State::shuffled_towards(&goal, session.rng.as_mut());
                writeln!(out, "Random query {} of {}:\n{}", round, count, initial)?;
                session.answer(&mut out, initial, goal)?;
            }
        }
        Some(Commands::Interactive) | None => interactive(&mut session)?,
        Some(Commands::Search { .. }) => {}
    }

    Ok(())
}
