extern crate getopts;
use getopts::Options;
use std::env;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::solver::Strategy;

/// Accepted board dimensions. The historical tooling stopped at 20x20;
/// nothing in the search depends on that, so the cap is only a sanity
/// bound on the CLI.
pub const MIN_SIZE: i32 = 1;
pub const MAX_SIZE: i32 = 64;

pub fn parse_size(s: &str) -> Option<(i32, i32)> {
    let xpos = s.find('x')?;
    let w = s[..xpos].parse::<i32>().ok()?;
    let h = s[xpos + 1..].parse::<i32>().ok()?;
    if w < MIN_SIZE || w > MAX_SIZE || h < MIN_SIZE || h > MAX_SIZE {
        return None;
    }
    Some((w, h))
}

pub struct GenerateConfig {
    pub width: i32,
    pub height: i32,
    pub seed: u64,
    pub count: usize,
}

impl GenerateConfig {
    pub fn parse_from_args() -> GenerateConfig {
        let args = env::args().collect::<Vec<_>>();
        let mut opts = Options::new();
        opts.optopt("", "size", "Set puzzle size (default: 7x7)", "WxH");
        opts.optopt("", "seed", "Set random seed (default: time-derived)", "N");
        opts.optopt("", "count", "Generate N puzzles (default: 1)", "N");
        opts.optflag("h", "help", "Display this help");

        let brief = format!("Usage: {} [options]", args[0]);
        let matches = match opts.parse(&args[1..]) {
            Ok(m) => m,
            Err(f) => {
                println!("error: {}", f.to_string());
                print!("{}", opts.usage(&brief));
                process::exit(1);
            }
        };

        if matches.opt_present("h") {
            print!("{}", opts.usage(&brief));
            process::exit(0);
        }

        if !matches.free.is_empty() {
            println!("error: unexpected argument: {}", matches.free[0]);
            print!("{}", opts.usage(&brief));
            process::exit(1);
        }

        let (width, height) = match matches.opt_str("size") {
            Some(s) => match parse_size(&s) {
                Some(wh) => wh,
                None => {
                    println!(
                        "error: parse failed for --size: expected WxH with {} <= W, H <= {}",
                        MIN_SIZE, MAX_SIZE
                    );
                    print!("{}", opts.usage(&brief));
                    process::exit(1);
                }
            },
            None => (7, 7),
        };

        let seed = match matches.opt_str("seed") {
            Some(s) => match s.parse::<u64>() {
                Ok(v) => v,
                Err(f) => {
                    println!("error: parse failed for --seed: {}", f.to_string());
                    process::exit(1);
                }
            },
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };

        let count = match matches.opt_str("count") {
            Some(s) => match s.parse::<usize>() {
                Ok(v) => v,
                Err(f) => {
                    println!("error: parse failed for --count: {}", f.to_string());
                    process::exit(1);
                }
            },
            None => 1,
        };

        GenerateConfig {
            width,
            height,
            seed,
            count,
        }
    }
}

pub struct SolveConfig {
    pub input_path: String,
    pub strategy: Strategy,
    pub parallel: bool,
    pub threads: usize,
}

impl SolveConfig {
    pub fn parse_from_args() -> SolveConfig {
        let args = env::args().collect::<Vec<_>>();
        let mut opts = Options::new();
        opts.optflag("", "dfs", "Use depth-first search instead of BFS");
        opts.optflag("", "parallel", "Split root moves over worker threads (implies DFS)");
        opts.optopt("", "threads", "Worker count for --parallel (default: all cores)", "N");
        opts.optflag("h", "help", "Display this help");

        let brief = format!("Usage: {} [options] <input-file>", args[0]);
        let matches = match opts.parse(&args[1..]) {
            Ok(m) => m,
            Err(f) => {
                println!("error: {}", f.to_string());
                print!("{}", opts.usage(&brief));
                process::exit(1);
            }
        };

        if matches.opt_present("h") {
            print!("{}", opts.usage(&brief));
            process::exit(0);
        }

        if matches.free.len() != 1 {
            println!("error: expected exactly one input file");
            print!("{}", opts.usage(&brief));
            process::exit(1);
        }

        let threads = match matches.opt_str("threads") {
            Some(s) => match s.parse::<usize>() {
                Ok(v) => v,
                Err(f) => {
                    println!("error: parse failed for --threads: {}", f.to_string());
                    process::exit(1);
                }
            },
            None => 0,
        };

        SolveConfig {
            input_path: matches.free[0].clone(),
            strategy: if matches.opt_present("dfs") {
                Strategy::Dfs
            } else {
                Strategy::Bfs
            },
            parallel: matches.opt_present("parallel"),
            threads,
        }
    }
}
