use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::schema::{Assist, Document, Game, ScoreEntry, Side, Spirit};

const TEAMS_CSV: &str = "teams.csv";
const PLAYERS_CSV: &str = "players.csv";
const GAMES_CSV: &str = "games.csv";
const SCORES_CSV: &str = "scores.csv";
const TIMEOUTS_CSV: &str = "timeouts.csv";
const SPIRIT_CSV: &str = "spirit.csv";

pub const TEAMS_HEADER: [&str; 3] = ["id", "division", "name"];
pub const PLAYERS_HEADER: [&str; 3] = ["id", "name", "teamId"];
pub const GAMES_HEADER: [&str; 7] = [
    "id", "home", "away", "offence", "homeFinalScore", "awayFinalScore", "halftimeElapsedSeconds",
];
pub const SCORES_HEADER: [&str; 6] = [
    "gameId", "side", "assist", "scorer", "startedAtSeconds", "durationSeconds",
];
pub const TIMEOUTS_HEADER: [&str; 3] = ["gameId", "side", "atSeconds"];
pub const SPIRIT_HEADER: [&str; 8] = [
    "gameId", "teamId", "total", "rules", "fouls", "fair", "positive", "communication",
];

// ============================================================================
// JSON DOCUMENT
// ============================================================================

pub fn load_document(path: &Path) -> Result<Document> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub fn save_document(path: &Path, doc: &Document) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, doc)?;
    writer.flush()?;
    Ok(())
}

// ============================================================================
// ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRow {
    pub id: u32,
    pub division: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRow {
    pub id: u32,
    pub name: String,
    pub team_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRow {
    pub id: u32,
    pub home: u32,
    pub away: u32,
    pub offence: Side,
    pub home_final_score: u32,
    pub away_final_score: u32,
    pub halftime_elapsed_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRow {
    pub game_id: u32,
    pub side: Side,
    /// Player id, `callahan`, or empty
    pub assist: Option<String>,
    pub scorer: Option<u32>,
    pub started_at_seconds: u32,
    pub duration_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeoutRow {
    pub game_id: u32,
    pub side: Side,
    pub at_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpiritRow {
    pub game_id: u32,
    pub team_id: u32,
    pub total: u32,
    pub rules: Option<u32>,
    pub fouls: Option<u32>,
    pub fair: Option<u32>,
    pub positive: Option<u32>,
    pub communication: Option<u32>,
}

/// The document flattened into one row set per CSV file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
    pub teams: Vec<TeamRow>,
    pub players: Vec<PlayerRow>,
    pub games: Vec<GameRow>,
    pub scores: Vec<ScoreRow>,
    pub timeouts: Vec<TimeoutRow>,
    pub spirit: Vec<SpiritRow>,
}

pub fn flatten(doc: &Document) -> Tables {
    let mut tables = Tables::default();

    for (division, teams) in &doc.divisions {
        for team in teams {
            tables.teams.push(TeamRow {
                id: team.id,
                division: division.clone(),
                name: team.name.clone(),
            });
        }
    }

    tables.players = doc
        .players
        .iter()
        .map(|player| PlayerRow {
            id: player.id,
            name: player.name.clone(),
            team_id: player.team_id,
        })
        .collect();

    for game in &doc.games {
        flatten_game(game, &mut tables);
    }

    tables
}

fn flatten_game(game: &Game, tables: &mut Tables) {
    let score = game.final_score();

    tables.games.push(GameRow {
        id: game.id,
        home: game.home_team,
        away: game.away_team,
        offence: game.on_offence,
        home_final_score: score.home,
        away_final_score: score.away,
        halftime_elapsed_seconds: halftime_elapsed(game),
    });

    for point in game.points() {
        tables.scores.push(ScoreRow {
            game_id: game.id,
            side: point.scoring_team,
            assist: point.assist.map(|assist| match assist {
                Assist::Player(id) => id.to_string(),
                Assist::Callahan => "callahan".to_string(),
            }),
            scorer: point.scorer,
            started_at_seconds: point.started_at,
            duration_seconds: point.duration,
        });

        for timeout in &point.timeouts {
            tables.timeouts.push(TimeoutRow {
                game_id: game.id,
                side: timeout.called_by,
                at_seconds: timeout.at,
            });
        }
    }

    if let Some(spirit) = &game.spirit {
        for side in [Side::Home, Side::Away] {
            if let Some(value) = spirit.get(side) {
                tables.spirit.push(spirit_row(game.id, game.team_id(side), value));
            }
        }
    }
}

/// One second past the end of the last point before the halftime marker,
/// or 0 without a marker
pub fn halftime_elapsed(game: &Game) -> u32 {
    let Some(index) = game.scores.iter().position(ScoreEntry::is_halftime) else {
        return 0;
    };

    index
        .checked_sub(1)
        .and_then(|i| game.scores[i].as_point())
        .map(|point| point.ended_at() + 1)
        .unwrap_or(0)
}

fn spirit_row(game_id: u32, team_id: u32, spirit: &Spirit) -> SpiritRow {
    let breakdown = spirit.breakdown;
    SpiritRow {
        game_id,
        team_id,
        total: spirit.total,
        rules: breakdown.map(|b| b.rules),
        fouls: breakdown.map(|b| b.fouls),
        fair: breakdown.map(|b| b.fair),
        positive: breakdown.map(|b| b.positive),
        communication: breakdown.map(|b| b.communication),
    }
}

// ============================================================================
// CSV OUTPUT
// ============================================================================

/// Writes a header row followed by `rows`. The header is written even when
/// there are no rows.
pub fn write_rows<W: Write, R: Serialize>(writer: W, header: &[&str], rows: &[R]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_csv_file<R: Serialize>(
    folder: &Path,
    file_name: &str,
    header: &[&str],
    rows: &[R],
) -> Result<PathBuf> {
    let path = folder.join(file_name);
    info!("Writing to file {}", path.display());
    write_rows(File::create(&path)?, header, rows)?;
    Ok(path)
}

/// Writes the six CSV exports into `folder`, creating it when missing.
/// Returns the paths written.
pub fn write_csv_folder(doc: &Document, folder: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(folder)?;
    let tables = flatten(doc);

    Ok(vec![
        write_csv_file(folder, TEAMS_CSV, &TEAMS_HEADER, &tables.teams)?,
        write_csv_file(folder, PLAYERS_CSV, &PLAYERS_HEADER, &tables.players)?,
        write_csv_file(folder, GAMES_CSV, &GAMES_HEADER, &tables.games)?,
        write_csv_file(folder, SCORES_CSV, &SCORES_HEADER, &tables.scores)?,
        write_csv_file(folder, TIMEOUTS_CSV, &TIMEOUTS_HEADER, &tables.timeouts)?,
        write_csv_file(folder, SPIRIT_CSV, &SPIRIT_HEADER, &tables.spirit)?,
    ])
}

// ============================================================================
// TESTS
// ============================================================================
