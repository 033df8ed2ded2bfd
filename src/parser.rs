use std::collections::{BTreeMap, HashMap};

use crate::types::{ScheduleRow, Team, TeamPortrait};

use scraper::{ElementRef, Html, Selector};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Unexpected page structure: {0}")]
    TableStructure(String),
    #[error("Failed to parse date: {0}")]
    DateParse(String),
    #[error("Expected exactly one {what}, found {found}")]
    Cardinality { what: &'static str, found: usize },
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Row class the site uses to divide a club roster table into season sections.
const SEASON_DIVIDER_CLASS: &str = "table-split";

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Concatenates all stripped text nodes of a cell. Values the site splits
/// across nested tags come back as one string, markup is discarded.
fn cell_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<String>()
}

pub(crate) fn absolute_url(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", crate::BASE_URL, href)
    }
}

/// Positional table lookup. The site exposes no real schema; the fixed table
/// indices below are its only contract, so every caller goes through here.
fn nth_table<'a>(
    document: &'a Html,
    index: usize,
    min_count: usize,
) -> Result<ElementRef<'a>, ParseError> {
    let table_selector = Selector::parse("table").unwrap();
    let tables: Vec<ElementRef> = document.select(&table_selector).collect();
    if tables.len() < min_count {
        return Err(ParseError::TableStructure(format!(
            "expected at least {} tables, found {}",
            min_count,
            tables.len()
        )));
    }
    Ok(tables[index])
}

/// Scans the last table of a club roster page for teams of the given season.
///
/// Divider rows (class `table-split`) toggle whether subsequent rows belong
/// to the target season; the season label must appear as a token of the
/// divider's text. Rows before the first matching divider are skipped, and a
/// roster without any matching divider yields no teams.
pub fn parse_club_teams(html: &str, season: &str) -> Result<Vec<Team>, ParseError> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();
    let tr_selector = Selector::parse("tr").unwrap();
    let a_selector = Selector::parse("a").unwrap();

    let club_table = document
        .select(&table_selector)
        .last()
        .ok_or_else(|| ParseError::TableStructure("no tables on club page".to_string()))?;

    let mut in_season_section = false;
    let mut teams = Vec::new();

    for row in club_table.select(&tr_selector) {
        let class = row.value().attr("class").unwrap_or("");
        if class.contains(SEASON_DIVIDER_CLASS) {
            in_season_section = row.text().any(|t| t.trim() == season);
            continue;
        }
        if !in_season_section {
            continue;
        }

        let links: Vec<ElementRef> = row.select(&a_selector).collect();
        if links.is_empty() {
            continue;
        }
        if links.len() < 2 {
            return Err(ParseError::TableStructure(format!(
                "team row has {} link(s), expected team and group link",
                links.len()
            )));
        }

        let href = |anchor: ElementRef| -> Result<String, ParseError> {
            anchor
                .value()
                .attr("href")
                .map(absolute_url)
                .ok_or_else(|| ParseError::MissingField("href attribute".to_string()))
        };

        teams.push(Team {
            team_url: href(links[0])?,
            group_url: href(links[1])?,
        });
    }

    Ok(teams)
}

/// Parses the portrait table of a team page into a `TeamPortrait`.
///
/// The portrait is the one table carrying a `Mannschaft` label cell; zero or
/// several matching tables mean the page layout changed and parsing fails.
pub fn parse_team_portrait(html: &str, group_url: &str) -> Result<TeamPortrait, ParseError> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();

    let mut matches: Vec<BTreeMap<String, String>> = Vec::new();
    for table in document.select(&table_selector) {
        if let Some(fields) = portrait_fields(table)? {
            matches.push(fields);
        }
    }

    if matches.len() != 1 {
        return Err(ParseError::Cardinality {
            what: "portrait table",
            found: matches.len(),
        });
    }

    TeamPortrait::from_fields(matches.remove(0), group_url)
}

/// Reads a table as label/value rows. Returns `None` when the table carries
/// no `Mannschaft` label and is therefore not a portrait candidate.
fn portrait_fields(table: ElementRef) -> Result<Option<BTreeMap<String, String>>, ParseError> {
    let tr_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("th, td").unwrap();

    let rows: Vec<Vec<String>> = table
        .select(&tr_selector)
        .map(|row| row.select(&cell_selector).map(cell_text).collect())
        .collect();

    let has_team_label = rows
        .iter()
        .any(|cells| cells.first().is_some_and(|label| label == TeamPortrait::TEAM_LABEL));
    if !has_team_label {
        return Ok(None);
    }

    let mut fields = BTreeMap::new();
    for cells in rows {
        if cells.len() < 2 {
            continue;
        }
        if cells.len() > 2 {
            return Err(ParseError::Cardinality {
                what: "portrait value column",
                found: cells.len() - 1,
            });
        }
        fields.insert(cells[0].clone(), cells[1].clone());
    }

    Ok(Some(fields))
}

/// Normalizes the schedule table (4th table of a team page) into rows.
///
/// Header names are read from the table's `th` cells (the first one is a
/// spacer and skipped) and prefixed with the three synthetic columns `Tag`,
/// `Datum`, `x`. `Heimmannschaft` must be among the headers, otherwise the
/// positional lookup matched the wrong table. Rows without data cells are
/// skipped; row order is preserved.
pub fn parse_schedule(html: &str) -> Result<Vec<ScheduleRow>, ParseError> {
    let document = Html::parse_document(html);
    let table = nth_table(&document, 3, 4)?;

    let th_selector = Selector::parse("th").unwrap();
    let tr_selector = Selector::parse("tr").unwrap();
    let td_selector = Selector::parse("td").unwrap();

    let mut headers: Vec<String> = vec![
        ScheduleRow::DAY.to_string(),
        ScheduleRow::DATE.to_string(),
        ScheduleRow::PLACEHOLDER.to_string(),
    ];
    headers.extend(
        table
            .select(&th_selector)
            .skip(1)
            .map(|th| elem_text(th).trim().to_string()),
    );

    if !headers.iter().any(|h| h == ScheduleRow::HOME_TEAM) {
        return Err(ParseError::TableStructure(format!(
            "no '{}' column in schedule header: {:?}",
            ScheduleRow::HOME_TEAM,
            headers
        )));
    }

    let mut rows = Vec::new();
    for row in table.select(&tr_selector) {
        let cells: Vec<String> = row.select(&td_selector).map(cell_text).collect();
        if cells.is_empty() {
            continue;
        }
        rows.push(ScheduleRow::from_columns(&headers, &cells)?);
    }

    Ok(rows)
}

/// Builds the team-name to team-page mapping from a group page. Anchors of
/// the 3rd table are the group's roster; hrefs are absolutized.
pub fn parse_team_links(html: &str) -> Result<HashMap<String, String>, ParseError> {
    let document = Html::parse_document(html);
    let table = nth_table(&document, 2, 3)?;

    let a_selector = Selector::parse("a").unwrap();
    let mut links = HashMap::new();
    for anchor in table.select(&a_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        links.insert(elem_text(anchor).trim().to_string(), absolute_url(href));
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLUB_PAGE: &str = r#"
        <html><body>
        <table><tr><td>navigation</td></tr></table>
        <table>
            <tr class="table-split"><td>Sommer 2022</td></tr>
            <tr><td><a href="/team?old=1">SV A Herren</a></td>
                <td><a href="/group?old=1">Bezirksliga</a></td></tr>
            <tr class="table-split"><td>
                Sommer 2023
            </td></tr>
            <tr><td><a href="/team?id=1">SV A Herren</a></td>
                <td><a href="/group?id=7">Bezirksliga</a></td></tr>
            <tr><td>no links here</td></tr>
            <tr><td><a href="/team?id=2">SV A Damen</a></td>
                <td><a href="/group?id=9">Landesliga</a></td></tr>
            <tr class="table-split"><td>Winter 2023/24</td></tr>
            <tr><td><a href="/team?id=3">SV A Herren</a></td>
                <td><a href="/group?id=11">Bezirksliga</a></td></tr>
        </table>
        </body></html>
    "#;

    fn team_page(schedule_rows: &str) -> String {
        format!(
            r#"
            <html><body>
            <table><tr><td>navigation</td></tr></table>
            <table><tr><td>breadcrumbs</td></tr></table>
            <table>
                <tr><th>Mannschaft</th><td>SV A Herren</td></tr>
                <tr><th>Liga</th><td>Bezirksliga</td></tr>
            </table>
            <table>
                <tr>
                    <th></th><th>Halle</th><th>Heimmannschaft</th><th>Gastmannschaft</th>
                </tr>
                {schedule_rows}
            </table>
            </body></html>
            "#
        )
    }

    #[test]
    fn test_club_teams_for_season() {
        let teams = parse_club_teams(CLUB_PAGE, "Sommer 2023").expect("should parse");

        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].team_url, "https://tnb.liga.nu/team?id=1");
        assert_eq!(teams[0].group_url, "https://tnb.liga.nu/group?id=7");
        assert_eq!(teams[1].team_url, "https://tnb.liga.nu/team?id=2");
        assert_eq!(teams[1].group_url, "https://tnb.liga.nu/group?id=9");
    }

    #[test]
    fn test_club_teams_other_season() {
        let teams = parse_club_teams(CLUB_PAGE, "Sommer 2022").expect("should parse");
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].team_url, "https://tnb.liga.nu/team?old=1");
    }

    #[test]
    fn test_club_teams_unknown_season_is_empty() {
        let teams = parse_club_teams(CLUB_PAGE, "Sommer 2031").expect("should parse");
        assert!(teams.is_empty());
    }

    #[test]
    fn test_club_team_row_with_single_link_fails() {
        let html = r#"
            <table>
                <tr class="table-split"><td>Sommer 2023</td></tr>
                <tr><td><a href="/team?id=1">SV A Herren</a></td></tr>
            </table>
        "#;

        let err = parse_club_teams(html, "Sommer 2023").unwrap_err();
        assert!(matches!(err, ParseError::TableStructure(_)));
    }

    #[test]
    fn test_portrait_from_team_page() {
        let html = team_page("");
        let portrait =
            parse_team_portrait(&html, "https://tnb.liga.nu/group?id=7").expect("portrait");

        assert_eq!(portrait.team_name, "SV A Herren");
        assert_eq!(portrait.league_name, "Bezirksliga");
        assert_eq!(portrait.group_url, "https://tnb.liga.nu/group?id=7");
    }

    #[test]
    fn test_portrait_without_matching_table_fails() {
        let html = "<table><tr><th>Halle</th><td>3</td></tr></table>";
        let err = parse_team_portrait(html, "https://example.test/group").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Cardinality {
                what: "portrait table",
                found: 0
            }
        ));
    }

    #[test]
    fn test_portrait_with_two_matching_tables_fails() {
        let html = r#"
            <table><tr><th>Mannschaft</th><td>SV A</td></tr>
                   <tr><th>Liga</th><td>Bezirksliga</td></tr></table>
            <table><tr><th>Mannschaft</th><td>SV B</td></tr>
                   <tr><th>Liga</th><td>Landesliga</td></tr></table>
        "#;
        let err = parse_team_portrait(html, "https://example.test/group").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Cardinality {
                what: "portrait table",
                found: 2
            }
        ));
    }

    #[test]
    fn test_schedule_preserves_rows_in_order() {
        let html = team_page(
            r#"
            <tr><td>Di</td><td>15.08.2023 18:30</td><td></td><td>3</td>
                <td>SV A Herren</td><td>SV B</td></tr>
            <tr><th>Stand: 01.08.2023</th></tr>
            <tr><td>Sa</td><td>19.08.2023</td><td></td><td>1</td>
                <td>SV C</td><td>SV A Herren</td></tr>
            "#,
        );

        let rows = parse_schedule(&html).expect("schedule should parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].home_team, "SV A Herren");
        assert_eq!(rows[0].away_team, "SV B");
        assert_eq!(rows[1].day, "Sa");
        assert_eq!(rows[1].date, "19.08.2023");
        assert_eq!(rows[1].away_team, "SV A Herren");
    }

    #[test]
    fn test_schedule_cell_text_spans_nested_tags() {
        let html = team_page(
            r#"
            <tr><td>Di</td><td><span>15.08.2023</span> <span>18:30</span></td><td></td>
                <td>3</td><td><a href="/t">SV <b>A</b> Herren</a></td><td>SV B</td></tr>
            "#,
        );

        let rows = parse_schedule(&html).expect("schedule should parse");
        assert_eq!(rows[0].date, "15.08.202318:30");
        assert_eq!(rows[0].home_team, "SVAHerren");
    }

    #[test]
    fn test_schedule_requires_home_team_header() {
        let html = r#"
            <table></table><table></table><table></table>
            <table><tr><th></th><th>Spalte</th></tr></table>
        "#;

        let err = parse_schedule(html).unwrap_err();
        assert!(matches!(err, ParseError::TableStructure(_)));
    }

    #[test]
    fn test_schedule_with_too_few_tables_fails() {
        let html = "<table></table><table></table>";
        let err = parse_schedule(html).unwrap_err();
        assert!(matches!(err, ParseError::TableStructure(_)));
    }

    #[test]
    fn test_team_links_from_group_page() {
        let html = r#"
            <table></table><table></table>
            <table>
                <tr><td><a href="/team?id=1">SV A Herren</a></td></tr>
                <tr><td><a href="https://other.example/team">SV B</a></td></tr>
            </table>
        "#;

        let links = parse_team_links(html).expect("links should parse");
        assert_eq!(links.len(), 2);
        assert_eq!(
            links.get("SV A Herren").map(String::as_str),
            Some("https://tnb.liga.nu/team?id=1")
        );
        assert_eq!(
            links.get("SV B").map(String::as_str),
            Some("https://other.example/team")
        );
    }
}
