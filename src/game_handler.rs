use log::{debug, warn};
use scraper::ElementRef;
use std::collections::HashMap;

use crate::error::{Result, ScrapeError};
use crate::markup::{self, Page};
use crate::schema::{
    Assist, Game, Point, ScoreEntry, Side, Spirit, SpiritBreakdown, SpiritPair, Timeout,
};
use crate::utils::parse_time;

/// Scoring table width on a standard gameplay page. Used when the table has
/// no header row to count columns from.
const DEFAULT_SCORE_COLUMNS: u32 = 6;

/// Position of the scoring table among the content tables
const SCORE_TABLE_INDEX: usize = 2;

// ============================================================================
// GAME PAGE PARSING
// ============================================================================

/// Parses a `?view=gameplay` page into a [`Game`].
///
/// A missing team pairing link or scoring table is a hard error. Player
/// names that cannot be matched to the game roster are kept as `None`.
pub fn parse_game_html(html: &str, game_id: u32) -> Result<Game> {
    let page = Page::parse(html);
    let context = format!("game {}", game_id);

    let (home_team, away_team) = find_team_pair(&page)
        .ok_or_else(|| ScrapeError::malformed(&context, "no team1/team2 link found"))?;

    let tables = page.content_tables();
    let players = roster_lookup(&tables);

    let score_table = *tables
        .get(SCORE_TABLE_INDEX)
        .ok_or_else(|| ScrapeError::malformed(&context, "no scoring table found"))?;

    let scores = parse_score_table(score_table, &players, &context)?;

    let on_offence = match find_offence_indicator(score_table) {
        Some(side) => side,
        None => match scores.iter().find_map(ScoreEntry::as_point) {
            Some(first) => first.scoring_team,
            None => {
                warn!("{}: no offence indicator and no points, assuming home", context);
                Side::Home
            }
        },
    };

    let spirit = tables.last().and_then(|&table| parse_spirit_row(table));

    debug!(
        "Parsed {}: {} vs {}, {} score entries",
        context,
        home_team,
        away_team,
        scores.len()
    );

    Ok(Game {
        id: game_id,
        home_team,
        away_team,
        on_offence,
        scores,
        spirit,
    })
}

/// Home and away team ids from the head-to-head link
/// (`?view=gamecard&team1=<home>&team2=<away>`)
fn find_team_pair(page: &Page) -> Option<(u32, u32)> {
    let pattern = regex!(r"(?i)team1=([0-9]+)&team2=([0-9]+)");

    page.content_links().find_map(|link| {
        let caps = pattern.captures(link.value().attr("href")?)?;
        let home = caps.get(1)?.as_str().parse().ok()?;
        let away = caps.get(2)?.as_str().parse().ok()?;
        Some((home, away))
    })
}

/// Player name to id, from the two team rosters nested in the first content
/// tables. Names are whitespace-normalised before being used as keys.
fn roster_lookup(tables: &[ElementRef<'_>]) -> HashMap<String, u32> {
    let mut players = HashMap::new();

    for &table in tables {
        for row in markup::rows(table) {
            for cell in markup::cells(row) {
                for nested in markup::child_elements(cell, "table") {
                    for nested_row in markup::rows(nested) {
                        let nested_cells = markup::cells(nested_row);
                        let Some(&name_cell) = nested_cells.get(1) else {
                            continue;
                        };
                        for link in markup::child_elements(name_cell, "a") {
                            if let Some(id) =
                                markup::href_id(link, regex!(r"(?i)player=([0-9]+)"))
                            {
                                players.insert(markup::text(link), id);
                            }
                        }
                    }
                }
            }
        }
    }

    players
}

// ============================================================================
// SCORING TABLE
// ============================================================================

fn parse_score_table(
    table: ElementRef<'_>,
    players: &HashMap<String, u32>,
    context: &str,
) -> Result<Vec<ScoreEntry>> {
    let rows = markup::rows(table);
    let columns = header_width(&rows).unwrap_or(DEFAULT_SCORE_COLUMNS);

    let mut scores = Vec::new();
    for row in rows {
        let cells = markup::cells(row);
        let Some(&first) = cells.first() else {
            continue;
        };

        if markup::is_header_cell(first) {
            continue;
        }

        // A single cell spanning the whole table separates the halves
        if markup::colspan(first) >= columns {
            scores.push(ScoreEntry::Halftime);
            continue;
        }

        let point = parse_point_row(&cells, players, context)?;
        scores.push(ScoreEntry::Point(point));
    }

    Ok(scores)
}

fn header_width(rows: &[ElementRef<'_>]) -> Option<u32> {
    rows.iter().find_map(|&row| {
        let cells = markup::cells(row);
        let first = *cells.first()?;
        if !markup::is_header_cell(first) {
            return None;
        }
        Some(cells.iter().map(|&cell| markup::colspan(cell)).sum())
    })
}

/// Columns: scoring side (class marker), assist, goal, time, duration,
/// extra info (timeouts)
fn parse_point_row(
    cells: &[ElementRef<'_>],
    players: &HashMap<String, u32>,
    context: &str,
) -> Result<Point> {
    if cells.len() < 5 {
        return Err(ScrapeError::malformed(
            context,
            format!("scoring row has {} cells, expected at least 5", cells.len()),
        ));
    }

    let scoring_team = side_of(cells[0]);

    let assist = if markup::has_class(cells[1], "callahan") {
        Some(Assist::Callahan)
    } else {
        resolve_player(players, &markup::text(cells[1]), context).map(Assist::Player)
    };
    let scorer = resolve_player(players, &markup::text(cells[2]), context);

    // The page shows when a point ended, not when it started
    let ended_at = parse_clock(cells[3], context)?;
    let duration = parse_clock(cells[4], context)?;
    if duration > ended_at {
        warn!(
            "{}: point duration {}s exceeds its end time {}s",
            context, duration, ended_at
        );
    }
    let started_at = ended_at.saturating_sub(duration);

    let timeouts = cells
        .get(5)
        .map(|&cell| parse_timeouts(cell, context))
        .unwrap_or_default();

    Ok(Point {
        scoring_team,
        assist,
        scorer,
        started_at,
        duration,
        timeouts,
    })
}

fn parse_clock(cell: ElementRef<'_>, context: &str) -> Result<u32> {
    let value = markup::text(cell);
    parse_time(&value)
        .ok_or_else(|| ScrapeError::malformed(context, format!("invalid game clock {:?}", value)))
}

fn resolve_player(players: &HashMap<String, u32>, name: &str, context: &str) -> Option<u32> {
    if name.is_empty() {
        return None;
    }
    let id = players.get(name).copied();
    if id.is_none() {
        debug!("{}: no roster entry for {:?}", context, name);
    }
    id
}

fn side_of(element: ElementRef<'_>) -> Side {
    Side::from_guest_marker(markup::has_class(element, "guest"))
}

/// Each `div` in the extra-info cell mentioning "Timeout" is one timeout;
/// its text ends with the game clock at the call. A clock that cannot be
/// read is recorded as 0.
fn parse_timeouts(cell: ElementRef<'_>, context: &str) -> Vec<Timeout> {
    let mut timeouts = Vec::new();

    for div in markup::child_elements(cell, "div") {
        let text = markup::text(div);
        if !text.contains("Timeout") {
            continue;
        }

        let at = timeout_clock(&text).unwrap_or_else(|| {
            debug!("{}: timeout without a readable time: {:?}", context, text);
            0
        });

        timeouts.push(Timeout {
            called_by: side_of(div),
            at,
        });
    }

    timeouts
}

fn timeout_clock(text: &str) -> Option<u32> {
    let trimmed = text.trim_end_matches(|c: char| !c.is_ascii_digit());
    let caps = regex!(r"([0-9.]+)$").captures(trimmed)?;
    parse_time(caps.get(1)?.as_str())
}

/// The first non-timeout `div` in the first point row marks who started on
/// offence.
fn find_offence_indicator(table: ElementRef<'_>) -> Option<Side> {
    let first_row = markup::rows(table).into_iter().find(|&row| {
        markup::cells(row)
            .first()
            .is_some_and(|&cell| !markup::is_header_cell(cell))
    })?;

    markup::cells(first_row)
        .into_iter()
        .flat_map(|cell| markup::child_elements(cell, "div").collect::<Vec<_>>())
        .find(|div| !markup::text(*div).contains("Timeout"))
        .map(side_of)
}

// ============================================================================
// SPIRIT
// ============================================================================

/// Spirit scores sit in the last row of the last table, one `td.home` and
/// one `td.guest`. Returns `None` only when that table has no rows.
fn parse_spirit_row(table: ElementRef<'_>) -> Option<SpiritPair> {
    let row = *markup::rows(table).last()?;
    let cells = markup::cells(row);

    let side_cell = |class: &str| -> Option<Spirit> {
        let mut matching = cells.iter().filter(|&&cell| markup::has_class(cell, class));
        let cell = *matching.next()?;
        if matching.next().is_some() {
            return None;
        }
        parse_spirit(&markup::text(cell))
    };

    Some(SpiritPair {
        home: side_cell("home"),
        away: side_cell("guest"),
    })
}

/// Parses `<total> (<rules>+<fouls>+<fair>+<positive>+<communication>)`.
///
/// A total whose parenthesised part does not have five components keeps the
/// total and drops the breakdown.
pub fn parse_spirit(text: &str) -> Option<Spirit> {
    let caps = regex!(r"([0-9]+)\s*\(([0-9+]+)\)").captures(text)?;
    let total = caps.get(1)?.as_str().parse().ok()?;

    let parts: Vec<u32> = caps
        .get(2)?
        .as_str()
        .split('+')
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    let breakdown = match parts[..] {
        [rules, fouls, fair, positive, communication] => Some(SpiritBreakdown {
            rules,
            fouls,
            fair,
            positive,
            communication,
        }),
        _ => None,
    };

    Some(Spirit { total, breakdown })
}

// ============================================================================
// TESTS
// ============================================================================
