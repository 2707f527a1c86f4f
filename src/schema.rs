use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

// ============================================================================
// SIDES
// ============================================================================

/// Which side of a game a point, timeout or offence indicator belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    /// Ultiorganizer marks the away side with a `guest` class and leaves the
    /// home side as the default.
    pub fn from_guest_marker(is_guest: bool) -> Side {
        if is_guest {
            Side::Away
        } else {
            Side::Home
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value kept once per side, indexed by [`Side`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideMap<T> {
    pub home: T,
    pub away: T,
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }
}

// ============================================================================
// TEAMS AND PLAYERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: u32,
    pub name: String,
    #[serde(alias = "team_id")]
    pub team_id: u32,
}

/// Division name to its teams, in the order the homepage lists them
pub type Divisions = IndexMap<String, Vec<Team>>;

// ============================================================================
// SCORES
// ============================================================================

/// Who threw the goal. A Callahan has no thrower but is not the same thing
/// as an assist nobody recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireAssist", into = "WireAssist")]
pub enum Assist {
    Player(u32),
    Callahan,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireAssist {
    Player(u32),
    Marker(String),
}

impl TryFrom<WireAssist> for Assist {
    type Error = String;

    fn try_from(wire: WireAssist) -> Result<Self, Self::Error> {
        match wire {
            WireAssist::Player(id) => Ok(Assist::Player(id)),
            WireAssist::Marker(marker) if marker == "callahan" => Ok(Assist::Callahan),
            WireAssist::Marker(other) => Err(format!("unknown assist marker {other:?}")),
        }
    }
}

impl From<Assist> for WireAssist {
    fn from(assist: Assist) -> Self {
        match assist {
            Assist::Player(id) => WireAssist::Player(id),
            Assist::Callahan => WireAssist::Marker("callahan".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeout {
    #[serde(rename = "by")]
    pub called_by: Side,
    /// Game clock, in seconds, when the timeout was called
    pub at: u32,
}

/// One scored point. Times are game-clock seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    #[serde(alias = "team")]
    pub scoring_team: Side,
    pub assist: Option<Assist>,
    #[serde(rename = "score")]
    pub scorer: Option<u32>,
    #[serde(rename = "started")]
    pub started_at: u32,
    pub duration: u32,
    #[serde(default)]
    pub timeouts: Vec<Timeout>,
}

impl Point {
    /// Game clock when the point was scored
    pub fn ended_at(&self) -> u32 {
        self.started_at.saturating_add(self.duration)
    }
}

/// An entry of a game's score sequence. On the wire the halftime marker is
/// the bare string `"halftime"` sitting in the same array as point objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireScoreEntry", into = "WireScoreEntry")]
pub enum ScoreEntry {
    Point(Point),
    Halftime,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireScoreEntry {
    Marker(String),
    Point(Point),
}

impl TryFrom<WireScoreEntry> for ScoreEntry {
    type Error = String;

    fn try_from(wire: WireScoreEntry) -> Result<Self, Self::Error> {
        match wire {
            WireScoreEntry::Point(point) => Ok(ScoreEntry::Point(point)),
            WireScoreEntry::Marker(marker) if marker == "halftime" => Ok(ScoreEntry::Halftime),
            WireScoreEntry::Marker(other) => Err(format!("unknown score marker {other:?}")),
        }
    }
}

impl From<ScoreEntry> for WireScoreEntry {
    fn from(entry: ScoreEntry) -> Self {
        match entry {
            ScoreEntry::Point(point) => WireScoreEntry::Point(point),
            ScoreEntry::Halftime => WireScoreEntry::Marker("halftime".to_string()),
        }
    }
}

impl ScoreEntry {
    pub fn as_point(&self) -> Option<&Point> {
        match self {
            ScoreEntry::Point(point) => Some(point),
            ScoreEntry::Halftime => None,
        }
    }

    pub fn is_halftime(&self) -> bool {
        matches!(self, ScoreEntry::Halftime)
    }
}

// ============================================================================
// SPIRIT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiritBreakdown {
    pub rules: u32,
    pub fouls: u32,
    pub fair: u32,
    pub positive: u32,
    pub communication: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spirit {
    pub total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<SpiritBreakdown>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiritPair {
    pub home: Option<Spirit>,
    pub away: Option<Spirit>,
}

impl SpiritPair {
    pub fn get(&self, side: Side) -> Option<&Spirit> {
        match side {
            Side::Home => self.home.as_ref(),
            Side::Away => self.away.as_ref(),
        }
    }
}

// ============================================================================
// GAMES AND THE DOCUMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: u32,
    pub home_team: u32,
    pub away_team: u32,
    pub on_offence: Side,
    pub scores: Vec<ScoreEntry>,
    #[serde(default)]
    pub spirit: Option<SpiritPair>,
}

impl Game {
    pub fn team_id(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home_team,
            Side::Away => self.away_team,
        }
    }

    /// Points in order, halftime skipped
    pub fn points(&self) -> impl Iterator<Item = &Point> + '_ {
        self.scores.iter().filter_map(ScoreEntry::as_point)
    }

    pub fn halftime_count(&self) -> usize {
        self.scores.iter().filter(|entry| entry.is_halftime()).count()
    }

    pub fn has_halftime(&self) -> bool {
        self.scores.iter().any(ScoreEntry::is_halftime)
    }

    pub fn final_score(&self) -> SideMap<u32> {
        let mut score = SideMap::default();
        for point in self.points() {
            score[point.scoring_team] += 1;
        }
        score
    }
}

/// Everything one scrape produces. This is what gets written to
/// `output.json` and read back by every later command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub divisions: Divisions,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub games: Vec<Game>,
}

impl Document {
    pub fn team(&self, team_id: u32) -> Option<&Team> {
        self.divisions
            .values()
            .flatten()
            .find(|team| team.id == team_id)
    }

    pub fn team_division(&self, team_id: u32) -> Option<&str> {
        self.divisions
            .iter()
            .find(|(_, teams)| teams.iter().any(|team| team.id == team_id))
            .map(|(name, _)| name.as_str())
    }

    /// Team name, or the bare id when the team is not listed in any division
    pub fn team_name(&self, team_id: u32) -> String {
        self.team(team_id)
            .map(|team| team.name.clone())
            .unwrap_or_else(|| format!("#{team_id}"))
    }
}

// ============================================================================
// TESTS
// ============================================================================
