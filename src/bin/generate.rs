extern crate tentai_rs;

use std::process;

use tentai_rs::config::GenerateConfig;
use tentai_rs::generator;
use tentai_rs::puzzle::{puzzle_to_game_id, Puzzle};
use tentai_rs::render;
use tentai_rs::rng::Random;

fn main() {
    let config = GenerateConfig::parse_from_args();
    let mut rng = Random::from_u64(config.seed);

    for i in 0..config.count {
        let board = generator::generate(config.width, config.height, &mut rng);
        let puzzle = Puzzle::from_board(&board);
        let id = match puzzle_to_game_id(&puzzle) {
            Some(id) => id,
            None => {
                eprintln!("error: failed to encode generated puzzle");
                process::exit(1);
            }
        };

        println!("Puzzle {}:", i + 1);
        println!("Game ID: {}", id);
        print!("{}", render::render_board(&board));
        if i + 1 < config.count {
            println!("\n---\n");
        }
    }
}
