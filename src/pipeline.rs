use std::fs;
use std::path::{Path, PathBuf};

use crate::calendar::build_calendar;
use crate::parser::ParseError;
use crate::scraper::{ScraperError, WebScraper};
use crate::types::{Team, TeamPortrait};

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scrape(#[from] ScraperError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Failed to write calendar: {0}")]
    Io(#[from] std::io::Error),
}

/// Explicit configuration for one batch run. There is no process-wide state;
/// the driver only sees what it is handed here.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub season: String,
    pub clubs: Vec<ClubConfig>,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClubConfig {
    pub name: String,
    pub roster_url: String,
}

/// Per-team outcome. Failures carry the error text instead of aborting the
/// batch; "continue on failure" is this type, not control flow.
#[derive(Debug, Serialize)]
pub struct TeamOutcome {
    pub team_url: String,
    pub team_name: Option<String>,
    pub league_name: Option<String>,
    pub ics_file: Option<PathBuf>,
    pub events: Option<usize>,
    pub error: Option<String>,
}

impl TeamOutcome {
    fn written(team: &Team, portrait: &TeamPortrait, ics_file: PathBuf, events: usize) -> Self {
        TeamOutcome {
            team_url: team.team_url.clone(),
            team_name: Some(portrait.team_name.clone()),
            league_name: Some(portrait.league_name.clone()),
            ics_file: Some(ics_file),
            events: Some(events),
            error: None,
        }
    }

    fn failed(team: &Team, error: &PipelineError) -> Self {
        TeamOutcome {
            team_url: team.team_url.clone(),
            team_name: None,
            league_name: None,
            ics_file: None,
            events: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClubOutcome {
    pub club: String,
    /// Set when the roster page itself could not be fetched or resolved.
    pub error: Option<String>,
    pub teams: Vec<TeamOutcome>,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub season: String,
    pub clubs: Vec<ClubOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.teams().filter(|t| t.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.teams().filter(|t| t.error.is_some()).count()
    }

    fn teams(&self) -> impl Iterator<Item = &TeamOutcome> {
        self.clubs.iter().flat_map(|c| c.teams.iter())
    }
}

/// Deterministic output path: `{output_dir}/{club}/{season} {team} {league}.ics`.
pub fn ics_path(output_dir: &Path, club: &str, season: &str, portrait: &TeamPortrait) -> PathBuf {
    output_dir.join(club).join(format!(
        "{} {} {}.ics",
        season, portrait.team_name, portrait.league_name
    ))
}

/// Runs the batch: for every club resolve the season's teams, then process
/// each team independently. One fetch completes before the next begins; a
/// failing team (or club roster) is recorded and the run moves on.
pub async fn run(scraper: &WebScraper, config: &PipelineConfig) -> BatchReport {
    let mut report = BatchReport {
        season: config.season.clone(),
        clubs: Vec::new(),
    };

    for club in &config.clubs {
        let teams = match scraper
            .fetch_club_teams(&club.roster_url, &config.season)
            .await
        {
            Ok(teams) => teams,
            Err(e) => {
                log::warn!("Skipping club '{}': {}", club.name, e);
                report.clubs.push(ClubOutcome {
                    club: club.name.clone(),
                    error: Some(e.to_string()),
                    teams: Vec::new(),
                });
                continue;
            }
        };

        if teams.is_empty() {
            log::info!(
                "No teams found for '{}' in season '{}'",
                club.name,
                config.season
            );
        }

        let mut outcomes = Vec::new();
        for team in &teams {
            let outcome = match process_team(scraper, config, &club.name, team).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::warn!("Skipping team {}: {}", team.team_url, e);
                    TeamOutcome::failed(team, &e)
                }
            };
            outcomes.push(outcome);
        }

        report.clubs.push(ClubOutcome {
            club: club.name.clone(),
            error: None,
            teams: outcomes,
        });
    }

    report
}

async fn process_team(
    scraper: &WebScraper,
    config: &PipelineConfig,
    club_name: &str,
    team: &Team,
) -> Result<TeamOutcome, PipelineError> {
    let (portrait, rows) = scraper.fetch_team_page(team).await?;
    log::info!("{}: {}", portrait.team_name, portrait.league_name);

    let team_links = scraper.fetch_team_links(&team.group_url).await?;
    let calendar = build_calendar(&portrait, &team_links, &rows)?;

    let folder = config.output_dir.join(club_name);
    fs::create_dir_all(&folder)?;
    let path = ics_path(&config.output_dir, club_name, &config.season, &portrait);
    fs::write(&path, calendar.to_string())?;
    log::info!("wrote \"{}\"", path.display());

    Ok(TeamOutcome::written(team, &portrait, path, rows.len()))
}
