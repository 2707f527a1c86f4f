use log::{debug, info};
use std::collections::HashSet;

use crate::error::{Result, ScrapeError};
use crate::markup::{self, Page};
use crate::schema::{Divisions, Player, Team};

// ============================================================================
// HOMEPAGE: DIVISIONS AND TEAMS
// ============================================================================

/// Parses the event homepage into divisions and their teams.
///
/// Each division is a header row (`th`) followed by one row per team whose
/// first cell links to `?view=teamcard&team=<id>`. Divisions named in `skip`
/// are left out together with their teams.
pub fn parse_divisions(html: &str, skip: &[String]) -> Result<Divisions> {
    let page = Page::parse(html);
    let tables = page.content_tables();
    if tables.is_empty() {
        return Err(ScrapeError::malformed("homepage", "no division table found"));
    }

    let mut divisions = Divisions::new();
    let mut team_count = 0;

    for table in tables {
        // None while outside a division or inside a skipped one
        let mut current: Option<String> = None;

        for row in markup::rows(table) {
            let cells = markup::cells(row);
            let Some(&first) = cells.first() else {
                continue;
            };

            if markup::is_header_cell(first) {
                let name = markup::text(first);
                if skip.contains(&name) {
                    debug!("Skipping division {}", name);
                    current = None;
                } else {
                    divisions.entry(name.clone()).or_default();
                    current = Some(name);
                }
                continue;
            }

            let Some(division) = &current else {
                continue;
            };

            match parse_team_cell(first) {
                Some(team) => {
                    if let Some(teams) = divisions.get_mut(division) {
                        teams.push(team);
                        team_count += 1;
                    }
                }
                None => debug!("Row without team link in division {}", division),
            }
        }
    }

    info!(
        "Found {} divisions and {} teams",
        divisions.len(),
        team_count
    );

    Ok(divisions)
}

fn parse_team_cell(cell: scraper::ElementRef<'_>) -> Option<Team> {
    let link = cell.select(selector!("a")).next()?;
    let id = markup::href_id(link, regex!(r"(?i)team=([0-9]+)"))?;

    Some(Team {
        id,
        name: markup::text(link),
    })
}

// ============================================================================
// ROSTER PAGE
// ============================================================================

/// Parses a team's player list page. Every player link in the roster table
/// becomes a player of `team_id`.
pub fn parse_roster(html: &str, team_id: u32) -> Vec<Player> {
    let page = Page::parse(html);
    let mut players = Vec::new();

    for table in page.content_tables() {
        for row in markup::rows(table) {
            for cell in markup::cells(row) {
                for link in markup::child_elements(cell, "a") {
                    if let Some(id) = markup::href_id(link, regex!(r"(?i)player=([0-9]+)")) {
                        players.push(Player {
                            id,
                            name: markup::text(link),
                            team_id,
                        });
                    }
                }
            }
        }
    }

    players
}

// ============================================================================
// SCHEDULE PAGE
// ============================================================================

/// Game ids linked from a team's schedule page, in page order, each once.
///
/// The game link lives in the last cell of every schedule row.
pub fn parse_schedule(html: &str) -> Vec<u32> {
    let page = Page::parse(html);
    let mut seen = HashSet::new();
    let mut game_ids = Vec::new();

    for table in page.content_tables() {
        for row in markup::rows(table) {
            let cells = markup::cells(row);
            let Some(&last) = cells.last() else {
                continue;
            };

            for span in markup::child_elements(last, "span") {
                for link in markup::child_elements(span, "a") {
                    if let Some(id) = markup::href_id(link, regex!(r"(?i)game=([0-9]+)")) {
                        if seen.insert(id) {
                            game_ids.push(id);
                        }
                    }
                }
            }
        }
    }

    game_ids
}

// ============================================================================
// TESTS
// ============================================================================
