extern crate tentai_rs;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::process;

use tentai_rs::config::SolveConfig;
use tentai_rs::puzzle::game_id_to_puzzle;
use tentai_rs::render;
use tentai_rs::solver::{self, SolveResult};

fn main() {
    let config = SolveConfig::parse_from_args();

    let file = match File::open(&config.input_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: cannot open {}: {}", config.input_path, e);
            process::exit(1);
        }
    };

    let mut line = String::new();
    if let Err(e) = BufReader::new(file).read_line(&mut line) {
        eprintln!("error: cannot read {}: {}", config.input_path, e);
        process::exit(1);
    }
    let line = line.trim_end_matches(|c| c == '\r' || c == '\n');

    const PREFIX: &str = "Game ID: ";
    let id = match line.find(PREFIX) {
        Some(pos) => &line[pos + PREFIX.len()..],
        None => line,
    };

    let puzzle = match game_id_to_puzzle(id) {
        Some(p) => p,
        None => {
            eprintln!("error: failed to parse puzzle");
            process::exit(1);
        }
    };

    let result = if config.parallel {
        solver::solve_parallel(&puzzle, config.threads)
    } else {
        solver::solve(&puzzle, config.strategy)
    };

    match result {
        SolveResult::Solved(s) => print!("{}", render::render_solution(&puzzle, &s)),
        SolveResult::Infeasible => {
            eprintln!("error: forced tiles conflict; the puzzle cannot be seeded");
            println!("No solution found.");
        }
        SolveResult::NoSolution => println!("No solution found."),
    }
}
