use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use nuliga_ics::WebScraper;
use nuliga_ics::pipeline::{self, BatchReport, ClubConfig, PipelineConfig};

#[derive(Parser)]
#[command(name = "nuliga-ics")]
#[command(about = "Scrapes nuLiga club pages and writes one ICS calendar per team", long_about = None)]
struct Cli {
    #[arg(
        long,
        value_name = "LABEL",
        help = "Season label as rendered on the club page, e.g. 'Sommer 2023'"
    )]
    season: String,

    #[arg(
        long = "club",
        value_name = "NAME=URL",
        required = true,
        help = "Club name and roster page URL; repeat for multiple clubs"
    )]
    clubs: Vec<String>,

    #[arg(
        long,
        default_value = ".",
        help = "Directory to write the calendar files into"
    )]
    output_dir: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value = "text",
        help = "Report format (text or json)"
    )]
    format: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_clubs(specs: &[String]) -> Result<Vec<ClubConfig>, String> {
    specs
        .iter()
        .map(|spec| {
            let (name, url) = spec
                .split_once('=')
                .ok_or_else(|| format!("Invalid club '{}'. Expected NAME=URL", spec))?;
            if name.is_empty() || url.is_empty() {
                return Err(format!("Invalid club '{}'. Expected NAME=URL", spec));
            }
            Ok(ClubConfig {
                name: name.to_string(),
                roster_url: url.to_string(),
            })
        })
        .collect()
}

fn print_text_report(report: &BatchReport) {
    for club in &report.clubs {
        println!("\n{}", club.club);
        if let Some(error) = &club.error {
            println!("  Error: {}", error);
            continue;
        }
        if club.teams.is_empty() {
            println!("  No teams for season '{}'", report.season);
        }
        for team in &club.teams {
            match (&team.ics_file, &team.error) {
                (Some(path), _) => println!(
                    "  {} ({}) - {} event(s) -> {}",
                    team.team_name.as_deref().unwrap_or("?"),
                    team.league_name.as_deref().unwrap_or("?"),
                    team.events.unwrap_or(0),
                    path.display()
                ),
                (None, Some(error)) => println!("  {} - Error: {}", team.team_url, error),
                (None, None) => {}
            }
        }
    }

    println!("\nStatistics:");
    println!("  Calendars written: {}", report.written());
    println!("  Teams failed:      {}", report.failed());
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let clubs = match parse_clubs(&cli.clubs) {
        Ok(clubs) => clubs,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let scraper = match WebScraper::new() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error creating scraper: {}", e);
            process::exit(1);
        }
    };

    let config = PipelineConfig {
        season: cli.season,
        clubs,
        output_dir: cli.output_dir,
    };

    let report = pipeline::run(&scraper, &config).await;

    match cli.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing to JSON: {}", e);
                process::exit(1);
            }
        },
        OutputFormat::Text => print_text_report(&report),
    }
    // Failed teams are reported, not fatal: the process still exits 0.
}
