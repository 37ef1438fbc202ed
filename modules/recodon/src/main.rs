use clap::{self, Parser};
use log::{error, info};
use simple_logger::init_with_level;

use recodon::{
    cli::{Args, Commands},
    combine::run_combine,
    database::run_database,
    stats::run_stats,
};

fn main() {
    let start = std::time::Instant::now();

    let args = Args::parse();

    if let Err(e) = init_with_level(args.level) {
        eprintln!("ERROR: could not initialize logger -> {e}");
    }

    let result = match args.command {
        Commands::Database(args) => run_database(args),
        Commands::Combine(args) => run_combine(args),
        Commands::Stats(args) => run_stats(args),
    };

    let code = match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{e}");
            1
        }
    };

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);

    if code != 0 {
        std::process::exit(code);
    }
}
