use clap::{Args, Parser, Subcommand};
use env_logger::{Builder, Env, Target};
use lineup_sim::ingest::{read_matchup_file, DataFormat};
use lineup_sim::lineup::{DeckSet, LineupCatalog, LineupWeightType};
use lineup_sim::matchup::{sanitize, synthetic_observations, SyntheticParams, WinRateTable};
use lineup_sim::rng::MetaRng;
use lineup_sim::simulation::{
    post_ban_grid, win_rate_grid, BanStrategy, BarProgress, RoundReport, SimulationConfig, SimulationDriver,
    SortType, WinRateGrid,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lineup-sim")]
#[command(about = "Metagame lineup simulator with pre-match deck bans", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank every valid lineup of a matchup data file
    Run {
        /// Matchup data file (matrix CSV, long CSV or JSON)
        file: PathBuf,

        /// File format, detected from the file when omitted
        #[arg(short, long, value_enum)]
        format: Option<DataFormat>,

        #[command(flatten)]
        options: SimOptions,
    },

    /// Resolve one lineup against another
    Matchup {
        /// Matchup data file
        file: PathBuf,

        #[arg(short, long, value_enum)]
        format: Option<DataFormat>,

        /// The player's three decks
        #[arg(short, long, num_args = 3, required = true)]
        player: Vec<String>,

        /// The opponent's three decks
        #[arg(short, long, num_args = 3, required = true)]
        opponent: Vec<String>,
    },

    /// Count the valid lineups of a matchup data file
    Lineups {
        /// Matchup data file
        file: PathBuf,

        #[arg(short, long, value_enum)]
        format: Option<DataFormat>,

        /// Print every lineup
        #[arg(short, long)]
        list: bool,
    },

    /// Run the simulation on a randomly generated metagame
    Synthetic {
        /// Number of decks in the metagame
        #[arg(short, long, default_value = "12")]
        num_decks: usize,

        /// Fraction of deck pairs with matchup data
        #[arg(long, default_value = "1.0")]
        coverage: f64,

        /// Seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        #[command(flatten)]
        options: SimOptions,
    },
}

#[derive(Args)]
struct SimOptions {
    /// JSON simulation config; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How bans are chosen
    #[arg(short, long, value_enum)]
    bans: Option<BanStrategy>,

    /// Statistic used to rank lineups
    #[arg(long, value_enum)]
    sort: Option<SortType>,

    /// Comma separated prune ratios, one per round
    #[arg(long, value_delimiter = ',')]
    prune: Option<Vec<f64>>,

    /// Number of lineups to report
    #[arg(short, long)]
    top: Option<usize>,

    /// How lineup weights combine deck play rates
    #[arg(long, value_enum)]
    weight_type: Option<LineupWeightType>,

    /// Score lineups on a single thread
    #[arg(long)]
    sequential: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Write every round's report as JSON
    #[arg(long)]
    json_out: Option<PathBuf>,
}

/// JSON report written by `--json-out`
#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    config: &'a SimulationConfig,
    rounds: &'a [RoundReport],
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { file, format, options } => {
            let table = load_table(&file, format);
            run_simulation(&table, &options);
        }
        Commands::Matchup {
            file,
            format,
            player,
            opponent,
        } => {
            let table = load_table(&file, format);
            resolve_matchup(&table, &player, &opponent);
        }
        Commands::Lineups { file, format, list } => {
            let table = load_table(&file, format);
            list_lineups(&table, list);
        }
        Commands::Synthetic {
            num_decks,
            coverage,
            seed,
            options,
        } => {
            let mut rng = MetaRng::new(seed);
            let params = SyntheticParams {
                num_decks,
                coverage,
                ..SyntheticParams::default()
            };
            let table = match WinRateTable::build(synthetic_observations(&params, &mut rng)) {
                Ok(table) => table,
                Err(e) => {
                    eprintln!("✗ Failed to generate metagame: {}", e);
                    std::process::exit(1);
                }
            };
            eprintln!("✓ Generated {} decks (seed {})", table.num_decks(), rng.seed());
            run_simulation(&table, &options);
        }
    }
}

fn load_table(file: &Path, format: Option<DataFormat>) -> WinRateTable {
    let table = read_matchup_file(file, format)
        .map_err(|e| e.to_string())
        .and_then(|data| data.into_table().map_err(|e| e.to_string()));
    match table {
        Ok(table) => {
            eprintln!("✓ Loaded {} decks from {}", table.num_decks(), file.display());
            table
        }
        Err(e) => {
            eprintln!("✗ Failed to load '{}': {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn build_config(options: &SimOptions) -> SimulationConfig {
    let mut config = match &options.config {
        Some(path) => {
            let parsed = std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
            match parsed {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("✗ Failed to read config '{}': {}", path.display(), e);
                    std::process::exit(1);
                }
            }
        }
        None => SimulationConfig::default(),
    };

    if let Some(bans) = options.bans {
        config.ban_strategy = bans;
    }
    if let Some(sort) = options.sort {
        config.sort_type = sort;
    }
    if let Some(prune) = &options.prune {
        config.prune_ratios = prune.clone();
    }
    if let Some(top) = options.top {
        config.output_limit = top;
    }
    if let Some(weight_type) = options.weight_type {
        config.weight_type = weight_type;
    }
    if options.sequential {
        config.parallel = false;
    }
    config
}

fn run_simulation(table: &WinRateTable, options: &SimOptions) {
    let config = build_config(options);
    let driver = match SimulationDriver::new(table, config) {
        Ok(driver) if options.quiet => driver,
        Ok(driver) => driver.with_progress(BarProgress::new()),
        Err(e) => {
            eprintln!("✗ Invalid simulation setup: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n=== Lineup Simulation ===\n");
    println!("Decks: {}", table.num_decks());
    println!("Bans: {:?}", driver.config().ban_strategy);
    println!("Sort: {:?}", driver.config().sort_type);
    println!("Rounds: {}", driver.config().prune_ratios.len());
    println!();

    let start = std::time::Instant::now();
    let reports = match driver.run() {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("✗ Simulation failed: {}", e);
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    for report in &reports {
        println!(
            "Round {}: {} lineups, field {}, {} matchups, {} skipped",
            report.round,
            report.candidates,
            report.field_size,
            report.matchups_resolved,
            report.pairs_skipped
        );
    }
    if let Some(last) = reports.last() {
        println!("\n=== Results ===\n");
        print!("{}", last.output);
    }
    println!("\nCompleted in {:.2?}", elapsed);

    if let Some(path) = &options.json_out {
        let report = JsonReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            config: driver.config(),
            rounds: &reports,
        };
        let written = serde_json::to_string_pretty(&report)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => eprintln!("✓ Report written to {}", path.display()),
            Err(e) => eprintln!("✗ Failed to write report: {}", e),
        }
    }
}

fn deck_set(table: &WinRateTable, names: &[String]) -> Result<DeckSet, String> {
    let sanitized: Vec<String> = names.iter().map(|n| sanitize(n)).collect();
    match sanitized.as_slice() {
        [a, b, c] => DeckSet::from_names(table, [a.as_str(), b.as_str(), c.as_str()]).map_err(|e| e.to_string()),
        _ => Err(format!("Expected 3 decks, found {}", names.len())),
    }
}

fn print_grid(title: &str, grid: &WinRateGrid, rows: &DeckSet, columns: &DeckSet) {
    println!("{}", title);
    print!("{:>30}", "");
    for name in columns.names() {
        print!(" {:>16.16}", name);
    }
    println!();
    for (name, row) in rows.names().iter().zip(grid) {
        print!("{:>30.30}", name);
        for rate in row {
            print!(" {:>15.2}%", rate * 100.0);
        }
        println!();
    }
    println!();
}

fn resolve_matchup(table: &WinRateTable, player: &[String], opponent: &[String]) {
    let sets = deck_set(table, player).and_then(|p| deck_set(table, opponent).map(|o| (p, o)));
    let (player, opponent) = match sets {
        Ok(sets) => sets,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };
    if !player.is_valid() {
        eprintln!("⚠ {} is not a valid lineup", player);
    }

    let grid = match win_rate_grid(table, &player, &opponent) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    println!("\n=== {} vs {} ===\n", player, opponent);
    print_grid("Win rates:", &grid, &player, &opponent);
    match post_ban_grid(&grid) {
        Ok(post_ban) => print_grid("Best of three by banned decks (row: ours, column: theirs):", &post_ban, &player, &opponent),
        Err(e) => eprintln!("✗ {}", e),
    }

    for strategy in [BanStrategy::Naive, BanStrategy::Nash] {
        match strategy.evaluate(&grid) {
            Ok(outcome) => {
                println!("{:?}: {:.2}%", strategy, outcome.win_rate * 100.0);
                for (name, ban) in opponent.names().iter().zip(outcome.bans) {
                    println!("  ban {:<40} {:>6.2}%", name, ban * 100.0);
                }
            }
            Err(e) => eprintln!("✗ {:?} failed: {}", strategy, e),
        }
    }
}

fn list_lineups(table: &WinRateTable, list: bool) {
    let catalog = LineupCatalog::new(table);
    let lineups = match catalog.all_valid_lineups(table.player_decks()) {
        Ok(lineups) => lineups,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    let mut count = 0;
    for lineup in lineups {
        if list {
            println!("{}", lineup);
        }
        count += 1;
    }
    println!("{} valid lineups from {} player decks", count, table.player_decks().len());
}
