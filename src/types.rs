use std::collections::BTreeMap;

use crate::parser::ParseError;

use serde::Serialize;

/// One roster within a club, as listed on the club's team overview page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub team_url: String,
    pub group_url: String,
}

/// Descriptive record for a team, parsed from the portrait table on its page.
///
/// The portrait table is a label/value listing; the team and league names are
/// the only fields the pipeline depends on, but everything else the site
/// renders is kept in `fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamPortrait {
    pub team_name: String,
    pub league_name: String,
    pub group_url: String,
    pub fields: BTreeMap<String, String>,
}

impl TeamPortrait {
    pub const TEAM_LABEL: &'static str = "Mannschaft";
    pub const LEAGUE_LABEL: &'static str = "Liga";

    pub fn from_fields(
        fields: BTreeMap<String, String>,
        group_url: &str,
    ) -> Result<Self, ParseError> {
        let team_name = fields
            .get(Self::TEAM_LABEL)
            .cloned()
            .ok_or_else(|| ParseError::MissingField(Self::TEAM_LABEL.to_string()))?;
        let league_name = fields
            .get(Self::LEAGUE_LABEL)
            .cloned()
            .ok_or_else(|| ParseError::MissingField(Self::LEAGUE_LABEL.to_string()))?;

        Ok(TeamPortrait {
            team_name,
            league_name,
            group_url: group_url.to_string(),
            fields,
        })
    }
}

/// One match fixture from the schedule table, validated at construction from
/// the header-name to cell-text mapping of its source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub day: String,
    pub date: String,
    pub home_team: String,
    pub away_team: String,
    pub match_report_url: Option<String>,
}

impl ScheduleRow {
    pub const DAY: &'static str = "Tag";
    pub const DATE: &'static str = "Datum";
    /// Synthetic name for the spacer column the site renders between the
    /// date and the first header cell. Dropped after parsing.
    pub const PLACEHOLDER: &'static str = "x";
    pub const HOME_TEAM: &'static str = "Heimmannschaft";
    pub const AWAY_TEAM: &'static str = "Gastmannschaft";
    pub const MATCH_REPORT: &'static str = "meeting_link";

    /// Builds a row by zipping column headers with cell texts. Trailing
    /// optional columns may be absent; a missing required column fails.
    pub fn from_columns(headers: &[String], cells: &[String]) -> Result<Self, ParseError> {
        let columns: BTreeMap<&str, &str> = headers
            .iter()
            .map(String::as_str)
            .zip(cells.iter().map(String::as_str))
            .filter(|(name, _)| *name != Self::PLACEHOLDER)
            .collect();

        let required = |name: &'static str| -> Result<String, ParseError> {
            columns
                .get(name)
                .map(|value| value.to_string())
                .ok_or_else(|| ParseError::MissingField(name.to_string()))
        };

        Ok(ScheduleRow {
            day: required(Self::DAY)?,
            date: required(Self::DATE)?,
            home_team: required(Self::HOME_TEAM)?,
            away_team: required(Self::AWAY_TEAM)?,
            match_report_url: columns
                .get(Self::MATCH_REPORT)
                .filter(|value| !value.is_empty())
                .map(|value| value.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        ["Tag", "Datum", "x", "Halle", "Heimmannschaft", "Gastmannschaft"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_schedule_row_from_columns() {
        let cells: Vec<String> = ["Di", "15.08.2023 18:30", "", "3", "SV A", "SV B"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let row = ScheduleRow::from_columns(&headers(), &cells).expect("row should parse");
        assert_eq!(row.day, "Di");
        assert_eq!(row.date, "15.08.2023 18:30");
        assert_eq!(row.home_team, "SV A");
        assert_eq!(row.away_team, "SV B");
        assert!(row.match_report_url.is_none());
    }

    #[test]
    fn test_schedule_row_missing_required_column() {
        let headers: Vec<String> = ["Tag", "Datum", "x"].iter().map(|s| s.to_string()).collect();
        let cells: Vec<String> = ["Di", "15.08.2023", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let err = ScheduleRow::from_columns(&headers, &cells).unwrap_err();
        assert!(matches!(err, ParseError::MissingField(ref f) if f == "Heimmannschaft"));
    }

    #[test]
    fn test_schedule_row_optional_report_link() {
        let mut headers = headers();
        headers.push("meeting_link".to_string());
        let cells: Vec<String> = [
            "Di",
            "15.08.2023 18:30",
            "",
            "3",
            "SV A",
            "SV B",
            "https://tnb.liga.nu/bericht/123",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let row = ScheduleRow::from_columns(&headers, &cells).expect("row should parse");
        assert_eq!(
            row.match_report_url.as_deref(),
            Some("https://tnb.liga.nu/bericht/123")
        );
    }

    #[test]
    fn test_portrait_requires_team_and_league() {
        let mut fields = BTreeMap::new();
        fields.insert("Mannschaft".to_string(), "SV A Herren".to_string());

        let err =
            TeamPortrait::from_fields(fields.clone(), "https://example.test/group").unwrap_err();
        assert!(matches!(err, ParseError::MissingField(ref f) if f == "Liga"));

        fields.insert("Liga".to_string(), "Bezirksliga".to_string());
        let portrait =
            TeamPortrait::from_fields(fields, "https://example.test/group").expect("portrait");
        assert_eq!(portrait.team_name, "SV A Herren");
        assert_eq!(portrait.league_name, "Bezirksliga");
        assert_eq!(portrait.group_url, "https://example.test/group");
    }
}
