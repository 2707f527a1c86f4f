use log::info;

use crate::schema::{Document, Game, ScoreEntry, SideMap};

/// When halftime would have been called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalftimeOptions {
    /// Points one side needs for halftime
    pub score_limit: u32,
    /// Game clock, in seconds, after which the half ends
    pub time_limit: u32,
}

impl Default for HalftimeOptions {
    fn default() -> Self {
        HalftimeOptions {
            score_limit: 8,
            time_limit: 50 * 60,
        }
    }
}

impl HalftimeOptions {
    pub fn new(score_limit: u32, time_limit_minutes: u32) -> HalftimeOptions {
        HalftimeOptions {
            score_limit,
            time_limit: time_limit_minutes.saturating_mul(60),
        }
    }
}

/// A halftime marker added by [`fix_halftime`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalftimeInsertion {
    pub game_id: u32,
    /// Position of the new marker in the score sequence
    pub index: usize,
    /// Score at the break
    pub score: SideMap<u32>,
}

/// Adds a halftime marker to every game that has none.
///
/// Games that already have one are untouched, so running this twice is the
/// same as running it once.
pub fn fix_halftime(doc: &mut Document, options: &HalftimeOptions) -> Vec<HalftimeInsertion> {
    doc.games
        .iter_mut()
        .filter_map(|game| insert_halftime(game, options))
        .collect()
}

/// Replays the points and puts the marker right after the first one that
/// brings a side to the score limit or ends past the time limit. If no
/// point qualifies the game stays without a halftime.
pub fn insert_halftime(game: &mut Game, options: &HalftimeOptions) -> Option<HalftimeInsertion> {
    if game.has_halftime() {
        return None;
    }

    info!("Game {} doesn't have a halftime", game.id);

    let mut score = SideMap::default();
    let mut position = None;

    for (index, entry) in game.scores.iter().enumerate() {
        let ScoreEntry::Point(point) = entry else {
            continue;
        };
        score[point.scoring_team] += 1;

        if score.home >= options.score_limit
            || score.away >= options.score_limit
            || point.ended_at() > options.time_limit
        {
            position = Some(index + 1);
            break;
        }
    }

    let Some(index) = position else {
        info!("Game {}: no point reached the halftime limits", game.id);
        return None;
    };

    info!("Halftime at {}-{}", score.home, score.away);
    game.scores.insert(index, ScoreEntry::Halftime);

    Some(HalftimeInsertion {
        game_id: game.id,
        index,
        score,
    })
}
