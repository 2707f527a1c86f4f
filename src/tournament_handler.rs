use log::{info, warn};
use std::collections::HashSet;

use crate::division_handler::{parse_divisions, parse_roster, parse_schedule};
use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::game_handler::parse_game_html;
use crate::schema::{Divisions, Document, Game, Player};
use crate::site::SiteUrls;

// ============================================================================
// OPTIONS
// ============================================================================

/// Knobs for a full scrape
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    /// Division names left out entirely
    pub skip_divisions: Vec<String>,
    /// Log and drop games whose page is malformed instead of aborting
    pub skip_malformed_games: bool,
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Scrapes a whole event starting from its homepage (the division/team
/// listing) and returns the normalised document.
///
/// Pages are fetched one after another. Any fetch failure aborts the run.
pub async fn scrape<F: PageFetcher>(
    fetcher: &F,
    homepage_url: &str,
    options: &ScrapeOptions,
) -> Result<Document> {
    let site = SiteUrls::parse(homepage_url)?;
    if site.uppercase_params() {
        info!("Site uses capitalised query parameters");
    }

    let homepage = fetcher.fetch(homepage_url).await?;
    let divisions = parse_divisions(&homepage, &options.skip_divisions)?;
    let players = collect_players(fetcher, &site, &divisions).await?;
    let games = collect_games(fetcher, &site, &divisions, options).await?;

    info!("Scraped {} players and {} games", players.len(), games.len());

    Ok(Document {
        divisions,
        players,
        games,
    })
}

/// Fetches every team's roster page
pub async fn collect_players<F: PageFetcher>(
    fetcher: &F,
    site: &SiteUrls,
    divisions: &Divisions,
) -> Result<Vec<Player>> {
    let mut players = Vec::new();

    for team in divisions.values().flatten() {
        let html = fetcher.fetch(&site.roster_url(team.id)).await?;
        players.extend(parse_roster(&html, team.id));
    }

    Ok(players)
}

/// Walks every team's schedule and parses each referenced game once.
///
/// A game shows up on both teams' schedules; ids already seen are not
/// fetched again.
pub async fn collect_games<F: PageFetcher>(
    fetcher: &F,
    site: &SiteUrls,
    divisions: &Divisions,
    options: &ScrapeOptions,
) -> Result<Vec<Game>> {
    let mut seen = HashSet::new();
    let mut games = Vec::new();

    for team in divisions.values().flatten() {
        let schedule = fetcher.fetch(&site.team_games_url(team.id)).await?;

        for game_id in parse_schedule(&schedule) {
            if !seen.insert(game_id) {
                continue;
            }

            let html = fetcher.fetch(&site.game_url(game_id)).await?;
            match parse_game_html(&html, game_id) {
                Ok(game) => games.push(game),
                Err(e) if options.skip_malformed_games && e.is_malformed_page() => {
                    warn!("Skipping game {}: {}", game_id, e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(games)
}
