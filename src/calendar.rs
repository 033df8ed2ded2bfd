use std::collections::HashMap;

use crate::parser::ParseError;
use crate::types::{ScheduleRow, TeamPortrait};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use chrono_tz::Tz;
use icalendar::{Calendar, Component, Event, EventLike, Property};

const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";
const DATE_FORMAT: &str = "%d.%m.%Y";
/// Placeholder kick-off for fixtures the site lists without a time.
const FALLBACK_TIME: (u32, u32) = (10, 1);
/// The source data never carries a match duration.
const EVENT_DURATION_HOURS: i64 = 6;
const ORGANIZER: &str = "TNB";
const MATCH_REPORT_LINK_TEXT: &str = "Spielbericht";

/// Parses a schedule date ("15.08.2023 18:30", or date-only with the
/// fallback time) into a Europe/Berlin timestamp.
pub fn parse_event_start(date: &str) -> Result<DateTime<Tz>, ParseError> {
    let (fallback_hour, fallback_minute) = FALLBACK_TIME;
    let fallback_time = NaiveTime::from_hms_opt(fallback_hour, fallback_minute, 0)
        .expect("invalid fallback time constant");

    let naive: NaiveDateTime = NaiveDateTime::parse_from_str(date.trim(), DATE_TIME_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map(|d| d.and_time(fallback_time))
        })
        .map_err(|_| ParseError::DateParse(date.to_string()))?;

    Berlin
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| ParseError::DateParse(date.to_string()))
}

/// Set difference {home, away} minus the portrait's own team name. Anything
/// but exactly one remaining name is a data-integrity violation.
pub fn opposing_team(own_team: &str, row: &ScheduleRow) -> Result<String, ParseError> {
    let mut candidates: Vec<&str> = [row.home_team.as_str(), row.away_team.as_str()]
        .into_iter()
        .filter(|name| *name != own_team)
        .collect();
    candidates.dedup();

    if candidates.len() != 1 {
        return Err(ParseError::Cardinality {
            what: "opposing team",
            found: candidates.len(),
        });
    }
    Ok(candidates[0].to_string())
}

/// Builds one calendar event from a schedule row.
///
/// The description is HTML-bearing: matchup line, league link, opponent link
/// and, when the row carries one, a match-report link, joined by `<br>`.
pub fn build_event(
    portrait: &TeamPortrait,
    team_links: &HashMap<String, String>,
    row: &ScheduleRow,
) -> Result<Event, ParseError> {
    let begin = parse_event_start(&row.date)?;
    let end = begin + Duration::hours(EVENT_DURATION_HOURS);

    let opponent = opposing_team(&portrait.team_name, row)?;
    let opponent_url = team_links
        .get(&opponent)
        .ok_or_else(|| ParseError::MissingField(format!("link for team '{}'", opponent)))?;

    let mut description = vec![
        format!("{} vs. {}", row.home_team, row.away_team),
        format!("<a href={}>{}</a>", portrait.group_url, portrait.league_name),
        format!("<a href={}>{}</a>", opponent_url, opponent),
    ];
    if let Some(report_url) = &row.match_report_url {
        description.push(format!(
            "<a href={}>{}</a>",
            report_url, MATCH_REPORT_LINK_TEXT
        ));
    }

    let event = Event::new()
        .uid(&format!(
            "{}: {} vs. {}",
            portrait.league_name, row.home_team, row.away_team
        ))
        .summary(&portrait.league_name)
        .description(&description.join("<br>"))
        .location(&row.home_team)
        .starts(begin.with_timezone(&Utc))
        .ends(end.with_timezone(&Utc))
        .timestamp(Utc::now())
        .add_property("ORGANIZER", ORGANIZER)
        .done();

    Ok(event)
}

/// One calendar per team, one event per schedule row, in table order.
pub fn build_calendar(
    portrait: &TeamPortrait,
    team_links: &HashMap<String, String>,
    rows: &[ScheduleRow],
) -> Result<Calendar, ParseError> {
    let mut calendar = Calendar::new();
    calendar.append_property(Property::new("METHOD", "REQUEST"));
    for row in rows {
        calendar.push(build_event(portrait, team_links, row)?);
    }
    Ok(calendar)
}
