use indexmap::IndexMap;
use log::warn;
use std::io::{self, Write};

use crate::schema::{Document, Game, ScoreEntry, Side};

// ============================================================================
// BEST COMEBACK
// ============================================================================

/// A win after trailing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comeback {
    pub game_id: u32,
    pub team_id: u32,
    pub opponent_id: u32,
    /// Largest deficit the winner overturned
    pub deficit: u32,
}

/// The comeback in `game`, if the winner was ever behind. Drawn games have
/// no winner and so no comeback.
pub fn comeback(game: &Game) -> Option<Comeback> {
    let mut diff: i32 = 0;
    let mut home_lead: u32 = 0;
    let mut away_lead: u32 = 0;

    for point in game.points() {
        diff += match point.scoring_team {
            Side::Home => 1,
            Side::Away => -1,
        };

        if diff > 0 {
            home_lead = home_lead.max(diff.unsigned_abs());
        } else if diff < 0 {
            away_lead = away_lead.max(diff.unsigned_abs());
        }
    }

    let (winner, deficit) = if diff < 0 && home_lead > 0 {
        (Side::Away, home_lead)
    } else if diff > 0 && away_lead > 0 {
        (Side::Home, away_lead)
    } else {
        return None;
    };

    Some(Comeback {
        game_id: game.id,
        team_id: game.team_id(winner),
        opponent_id: game.team_id(winner.opponent()),
        deficit,
    })
}

/// Largest comeback per division (the home team's division). On equal
/// deficits the earlier game is kept.
pub fn best_comebacks(doc: &Document) -> IndexMap<String, Comeback> {
    let mut best: IndexMap<String, Comeback> = IndexMap::new();

    for game in &doc.games {
        let Some(candidate) = comeback(game) else {
            continue;
        };
        let Some(division) = division_of(doc, game) else {
            continue;
        };

        match best.get_mut(division) {
            Some(current) if current.deficit >= candidate.deficit => {}
            Some(current) => *current = candidate,
            None => {
                best.insert(division.to_string(), candidate);
            }
        }
    }

    best
}

// ============================================================================
// FEWEST BREAKS
// ============================================================================

/// Counts breaks in a game's score sequence:
/// - the first entry, if scored by the side not starting on offence;
/// - a point straight after halftime scored by the side that started the
///   game on offence (it starts the second half on defence);
/// - a point scored by the same side as the point right before it.
///
/// Points either side of a halftime marker are never compared.
pub fn count_breaks(game: &Game) -> u32 {
    let mut breaks = 0;

    for (k, entry) in game.scores.iter().enumerate() {
        let ScoreEntry::Point(point) = entry else {
            continue;
        };

        let is_break = match k.checked_sub(1).map(|i| &game.scores[i]) {
            None => point.scoring_team != game.on_offence,
            Some(ScoreEntry::Halftime) => point.scoring_team == game.on_offence,
            Some(ScoreEntry::Point(previous)) => point.scoring_team == previous.scoring_team,
        };

        if is_break {
            breaks += 1;
        }
    }

    breaks
}

/// Lowest break count in a division and every game that had it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FewestBreaks<'a> {
    pub breaks: u32,
    pub games: Vec<&'a Game>,
}

pub fn fewest_breaks(doc: &Document) -> IndexMap<String, FewestBreaks<'_>> {
    let mut fewest: IndexMap<String, FewestBreaks<'_>> = IndexMap::new();

    for game in &doc.games {
        let Some(division) = division_of(doc, game) else {
            continue;
        };
        let breaks = count_breaks(game);

        match fewest.get_mut(division) {
            Some(current) if breaks < current.breaks => {
                *current = FewestBreaks {
                    breaks,
                    games: vec![game],
                };
            }
            Some(current) if breaks == current.breaks => current.games.push(game),
            Some(_) => {}
            None => {
                fewest.insert(
                    division.to_string(),
                    FewestBreaks {
                        breaks,
                        games: vec![game],
                    },
                );
            }
        }
    }

    fewest
}

fn division_of<'a>(doc: &'a Document, game: &Game) -> Option<&'a str> {
    let division = doc.team_division(game.home_team);
    if division.is_none() {
        warn!(
            "Game {}: home team {} is not in any division",
            game.id, game.home_team
        );
    }
    division
}

// ============================================================================
// REPORT
// ============================================================================

/// Writes both analyses as plain text
pub fn write_report<W: Write>(out: &mut W, doc: &Document) -> io::Result<()> {
    write_banner(out, "Best comebacks")?;
    for (division, comeback) in best_comebacks(doc) {
        writeln!(
            out,
            "{} - {} beat {} after being {} points down",
            division,
            doc.team_name(comeback.team_id),
            doc.team_name(comeback.opponent_id),
            comeback.deficit
        )?;
    }
    writeln!(out)?;

    write_banner(out, "Fewest breaks")?;
    for (division, fewest) in fewest_breaks(doc) {
        writeln!(out, "{}: {} breaks", division, fewest.breaks)?;
        for game in fewest.games {
            writeln!(
                out,
                "\t{} vs. {}",
                doc.team_name(game.home_team),
                doc.team_name(game.away_team)
            )?;
        }
    }
    writeln!(out)?;

    Ok(())
}

fn write_banner<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    let rule = "#".repeat(title.len() + 4);
    writeln!(out, "{}", rule)?;
    writeln!(out, "# {} #", title)?;
    writeln!(out, "{}", rule)?;
    writeln!(out)
}

// ============================================================================
// TESTS
// ============================================================================
