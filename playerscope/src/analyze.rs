//! playerscope-analyze - CLI tool to run player analyses
//!
//! Runs one analysis for a player against the configured database and prints
//! a text summary or the full JSON result.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use playerscope_core::analytics::{
    GamePreferenceAnalysis, GamePreferenceAnalyzer, GamePreferenceRequest, PlayerStore,
    SpendingHabitsAnalysis, SpendingHabitsAnalyzer, TimeRange, ValueScoreAnalysis,
    ValueScoreAnalyzer, ValueScoreRequest,
};
use playerscope_core::{Config, Database};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone, Copy, ValueEnum)]
enum Analysis {
    GamePreference,
    SpendingHabits,
    ValueScore,
}

#[derive(Parser)]
#[command(name = "playerscope-analyze")]
#[command(about = "Run player analytics from the command line")]
#[command(version)]
struct Args {
    /// Analysis to run
    #[arg(value_enum)]
    analysis: Analysis,

    /// Player ID
    player: i64,

    /// Lookback: 7d, 30d, 90d, 180d or 365d (ignored by spending-habits)
    #[arg(short, long)]
    time_range: Option<TimeRange>,

    /// Minimum sessions per game type (game-preference only)
    #[arg(long)]
    min_games: Option<u32>,

    /// Skip trend, percentile, retention and potential (value-score only)
    #[arg(long)]
    no_details: bool,

    /// Do not append the result to analysis history
    #[arg(long)]
    no_persist: bool,

    /// Database file (defaults to the configured path)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    format: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        playerscope_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Open database
    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config.resolved_database_path());
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;
    let store: Arc<dyn PlayerStore> = Arc::new(db);

    let mut analytics = config.analytics.clone();
    if args.no_persist {
        analytics.persist_results = false;
    }
    let json = args.format == "json";

    match args.analysis {
        Analysis::GamePreference => {
            let request = GamePreferenceRequest {
                time_range: args.time_range.unwrap_or(TimeRange::Days30),
                include_graphs: Some(json),
                min_games: args.min_games,
            };
            let analysis = GamePreferenceAnalyzer::new(store, analytics)
                .analyze(args.player, &request)
                .context("game preference analysis failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print_game_preference(&analysis);
            }
        }
        Analysis::SpendingHabits => {
            let analysis = SpendingHabitsAnalyzer::new(store, analytics)
                .analyze(args.player)
                .context("spending habits analysis failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print_spending_habits(&analysis);
            }
        }
        Analysis::ValueScore => {
            let request = ValueScoreRequest {
                time_range: args.time_range.unwrap_or(TimeRange::Days90),
                include_details: Some(!args.no_details),
                weight_config: None,
            };
            let analysis = ValueScoreAnalyzer::new(store, analytics)
                .analyze(args.player, &request)
                .context("value score analysis failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print_value_score(&analysis);
            }
        }
    }

    Ok(())
}

fn print_game_preference(a: &GamePreferenceAnalysis) {
    println!("Game preferences for {} (#{}), last {}", a.username, a.player_id, a.time_range);
    println!("  Games played:   {}", a.total_games_played);
    if a.favorite_game_type.is_empty() {
        println!("  Favorite:       (none)");
    } else {
        println!("  Favorite:       {}", a.favorite_game_type);
    }
    println!("  Peak time:      {}", a.time_distribution.peak_playing_time);
    println!(
        "  Diversity:      {:.2} ({})",
        a.preference_metrics.diversity_index, a.preference_metrics.specialization_level
    );
    println!("  Play style:     {}", a.preference_metrics.play_style);

    if !a.game_type_stats.is_empty() {
        println!();
        println!("  {:<16} {:>6} {:>7} {:>8} {:>6}", "TYPE", "GAMES", "SHARE", "WIN %", "SCORE");
        for s in &a.game_type_stats {
            println!(
                "  {:<16} {:>6} {:>6.1}% {:>7.1}% {:>6.1}",
                s.game_type, s.games_played, s.participation_rate, s.win_rate, s.preference_score
            );
        }
    }

    print_list("Recommendations", &a.recommendations);
}

fn print_spending_habits(a: &SpendingHabitsAnalysis) {
    println!("Spending habits for {} (#{})", a.username, a.player_id);
    println!("  {}", a.summary);
    println!(
        "  Last 90 days:   {:.2} over {} transactions ({})",
        a.spending_amount.total_amount,
        a.spending_amount.transaction_count,
        a.spending_amount.spending_level
    );
    println!(
        "  Active days:    {} in 30 days ({})",
        a.spending_frequency.total_days_active, a.spending_frequency.frequency_level
    );
    println!(
        "  Risk:           {} ({})",
        a.spending_risk.risk_score, a.spending_risk.risk_level
    );
    println!(
        "  Capacity:       {} (budget {:.2}/month)",
        a.spending_capacity.capacity_level, a.spending_capacity.estimated_monthly_budget
    );

    let failed: Vec<&str> = [
        ("frequency", a.spending_frequency.error.is_some()),
        ("amount", a.spending_amount.error.is_some()),
        ("time pattern", a.spending_time_pattern.error.is_some()),
        ("channel", a.spending_channel.error.is_some()),
        ("risk", a.spending_risk.error.is_some()),
        ("capacity", a.spending_capacity.error.is_some()),
    ]
    .iter()
    .filter(|(_, failed)| *failed)
    .map(|(name, _)| *name)
    .collect();
    if !failed.is_empty() {
        eprintln!("  Unavailable sections: {}", failed.join(", "));
    }

    print_list("Recommended actions", &a.recommended_actions);
}

fn print_value_score(a: &ValueScoreAnalysis) {
    println!("Value score for {} (#{}), last {}", a.username, a.player_id, a.time_range);
    println!("  Overall:        {:.1} ({})", a.overall_score, a.value_category);
    println!("  Activity:       {:.1}", a.activity_score.score);
    println!("  Loyalty:        {:.1}", a.loyalty_score.score);
    println!("  Spending:       {:.1}", a.spending_score.score);
    println!("  Risk:           {:.1} ({})", a.risk_score.score, a.risk_score.risk_category);
    println!("  Profitability:  {:.1}", a.profitability_score.score);

    if let Some(ref c) = a.competitor_analysis {
        println!("  Percentile:     {:.0}", c.percentile);
    }
    if let Some(ref r) = a.retention_risk {
        println!(
            "  Churn risk:     {} ({:.0}%)",
            r.risk_level,
            r.churn_probability * 100.0
        );
    }

    print_list("Recommendations", &a.recommendations);
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("  {}:", title);
    for item in items {
        println!("    - {}", item);
    }
}
