use std::collections::HashMap;
use std::time::Duration;

use crate::parser::{
    ParseError, parse_club_teams, parse_schedule, parse_team_links, parse_team_portrait,
};
use crate::types::{ScheduleRow, Team, TeamPortrait};

use reqwest::Client;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    base_url: String,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: crate::BASE_URL.to_string(),
        })
    }

    /// Teams of one club for one season, from the club's roster page.
    pub async fn fetch_club_teams(
        &self,
        club_url: &str,
        season: &str,
    ) -> Result<Vec<Team>, ScraperError> {
        let html = self.fetch(club_url).await?;
        let teams = parse_club_teams(&html, season)?;
        Ok(teams)
    }

    /// Portrait and schedule of a single team, both parsed from one fetch of
    /// the team page.
    pub async fn fetch_team_page(
        &self,
        team: &Team,
    ) -> Result<(TeamPortrait, Vec<ScheduleRow>), ScraperError> {
        let html = self.fetch(&team.team_url).await?;
        // Schedule first: its positional table check is the canary for
        // error pages and layout drift.
        let schedule = parse_schedule(&html)?;
        let portrait = parse_team_portrait(&html, &team.group_url)?;
        Ok((portrait, schedule))
    }

    /// Team-name to team-page mapping for cross-linking, from the group page.
    pub async fn fetch_team_links(
        &self,
        group_url: &str,
    ) -> Result<HashMap<String, String>, ScraperError> {
        let html = self.fetch(group_url).await?;
        let links = parse_team_links(&html)?;
        Ok(links)
    }

    async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        let full_url = if url.starts_with("http") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        };

        let html = self
            .client
            .get(&full_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(html)
    }
}
