use std::collections::HashMap;

use ultiorganizer_stats::output::{flatten, write_rows, GAMES_HEADER, SCORES_HEADER};
use ultiorganizer_stats::{
    best_comebacks, count_breaks, fewest_breaks, fix_halftime, load_document, save_document,
    scrape, write_csv_folder, HalftimeOptions, MemoryFetcher, ScrapeError, ScrapeOptions, Side,
};

const HOMEPAGE_URL: &str = "https://uo.example.org/?view=teams&season=EUC2015";
const BASE: &str = "https://uo.example.org/";

// ============================================================================
// FIXTURES
// ============================================================================

fn wrap(content: &str) -> String {
    format!(
        "<html><body><table><tr><td class=\"tdcontent\"><div>{}</div></td></tr></table></body></html>",
        content
    )
}

fn homepage() -> String {
    wrap(
        r#"<table>
            <tr><th>Open</th></tr>
            <tr><td><a href="?view=teamcard&team=1">Alpha</a></td></tr>
            <tr><td><a href="?view=teamcard&team=2">Beta</a></td></tr>
           </table>
           <table>
            <tr><th>Masters</th></tr>
            <tr><td><a href="?view=teamcard&team=3">Gamma</a></td></tr>
           </table>"#,
    )
}

fn roster(players: &[(u32, &str)]) -> String {
    let rows: String = players
        .iter()
        .map(|(id, name)| {
            format!(r#"<tr><td>#</td><td><a href="?view=playercard&player={id}">{name}</a></td></tr>"#)
        })
        .collect();
    wrap(&format!("<table>{rows}</table>"))
}

fn schedule(game_ids: &[u32]) -> String {
    let rows: String = game_ids
        .iter()
        .map(|id| format!(r#"<tr><td>Sat</td><td><span><a href="?view=gameplay&game={id}">Play-by-play</a></span></td></tr>"#))
        .collect();
    wrap(&format!("<table><tr><th>Date</th><th>Game</th></tr>{rows}</table>"))
}

/// `points`: (side, assist name, scorer name, end clock, duration clock)
fn game_page(home: u32, away: u32, points: &[(&str, &str, &str, &str, &str)], halftime_after: Option<usize>) -> String {
    let mut rows = String::new();
    for (i, (side, assist, scorer, end, duration)) in points.iter().enumerate() {
        rows.push_str(&format!(
            r#"<tr><td class="{side}">-</td><td>{assist}</td><td>{scorer}</td><td>{end}</td><td>{duration}</td><td></td></tr>"#
        ));
        if halftime_after == Some(i) {
            rows.push_str(r#"<tr><td colspan="6">Halftime</td></tr>"#);
        }
    }

    wrap(&format!(
        r#"<table><tr><td>teams</td></tr></table>
           <table><tr>
             <td><table><tr><td>1</td><td><a href="?view=playercard&player=101">Ann&nbsp;Lee</a></td></tr></table></td>
             <td><table><tr><td>2</td><td><a href="?view=playercard&player=201">Bo Ray</a></td></tr></table></td>
           </tr></table>
           <table>
             <tr><th>Score</th><th>Pass</th><th>Goal</th><th>Time</th><th>Dur.</th><th>Info</th></tr>
             {rows}
           </table>
           <table>
             <tr><th>Spirit</th></tr>
             <tr><td class="home">11 (2+2+2+3+2)</td><td class="guest">10 (2+2+2+2+2)</td></tr>
           </table>
           <p><a href="?view=gamecard&team1={home}&team2={away}">Head to head</a></p>"#
    ))
}

fn site_fetcher() -> MemoryFetcher {
    let mut pages: HashMap<String, String> = HashMap::new();
    pages.insert(HOMEPAGE_URL.to_string(), homepage());

    pages.insert(format!("{BASE}?view=playerlist&team=1"), roster(&[(101, "Ann&nbsp;Lee")]));
    pages.insert(format!("{BASE}?view=playerlist&team=2"), roster(&[(201, "Bo Ray")]));
    pages.insert(format!("{BASE}?view=playerlist&team=3"), roster(&[(301, "Cy Dee")]));

    // game 900 appears on both Open teams' schedules
    pages.insert(format!("{BASE}?view=games&team=1"), schedule(&[900, 901]));
    pages.insert(format!("{BASE}?view=games&team=2"), schedule(&[900, 901]));
    pages.insert(format!("{BASE}?view=games&team=3"), schedule(&[]));

    // Alpha trails 0-2, wins 3-2; no halftime row
    pages.insert(
        format!("{BASE}?view=gameplay&game=900"),
        game_page(
            1,
            2,
            &[
                ("guest", "", "Bo Ray", "2.00", "2.00"),
                ("guest", "", "", "4.00", "2.00"),
                ("home", "Ann Lee", "", "6.00", "2.00"),
                ("home", "", "Ann Lee", "8.00", "2.00"),
                ("home", "Nobody", "", "10.00", "2.00"),
            ],
            None,
        ),
    );

    // Beta at home, strict alternation with a halftime row
    pages.insert(
        format!("{BASE}?view=gameplay&game=901"),
        game_page(
            2,
            1,
            &[
                ("home", "", "", "1.00", "1.00"),
                ("guest", "", "", "2.00", "1.00"),
                ("guest", "", "", "3.00", "1.00"),
            ],
            Some(1),
        ),
    );

    let mut fetcher = MemoryFetcher::new();
    for (url, body) in pages {
        fetcher.insert(url, body);
    }
    fetcher
}

// ============================================================================
// SCRAPING
// ============================================================================

#[tokio::test]
async fn test_scrape_builds_document() {
    let doc = scrape(&site_fetcher(), HOMEPAGE_URL, &ScrapeOptions::default())
        .await
        .expect("scrape should succeed");

    assert_eq!(doc.divisions.len(), 2);
    assert_eq!(doc.divisions["Open"].len(), 2);
    assert_eq!(doc.players.len(), 3);
    assert_eq!(doc.players[0].name, "Ann Lee");
    assert_eq!(doc.players[0].team_id, 1);

    // de-duplicated by id, in first-seen order
    assert_eq!(doc.games.iter().map(|g| g.id).collect::<Vec<_>>(), vec![900, 901]);

    let game = &doc.games[0];
    assert_eq!((game.home_team, game.away_team), (1, 2));
    assert_eq!(game.on_offence, Side::Away);
    assert_eq!(game.scores.len(), 5);
    assert_eq!(game.halftime_count(), 0);
    assert_eq!(game.spirit.unwrap().home.unwrap().total, 11);

    let third = game.scores[2].as_point().unwrap();
    assert_eq!(third.started_at, 240);
    assert_eq!(third.duration, 120);

    assert_eq!(doc.games[1].halftime_count(), 1);
    assert!(doc.games[1].scores[2].is_halftime());
}

#[tokio::test]
async fn test_scrape_skips_division() {
    let options = ScrapeOptions {
        skip_divisions: vec!["Masters".to_string()],
        ..ScrapeOptions::default()
    };
    let doc = scrape(&site_fetcher(), HOMEPAGE_URL, &options).await.unwrap();

    assert_eq!(doc.divisions.keys().collect::<Vec<_>>(), vec!["Open"]);
    assert!(doc.players.iter().all(|p| p.team_id != 3));
}

#[tokio::test]
async fn test_missing_page_aborts_scrape() {
    let mut broken = MemoryFetcher::new();
    broken.insert(HOMEPAGE_URL, homepage());

    let err = scrape(&broken, HOMEPAGE_URL, &ScrapeOptions::default()).await.unwrap_err();
    assert!(matches!(err, ScrapeError::FetchStatus { .. }));
    assert!(err.to_string().contains("view=playerlist&team=1"));
}

#[tokio::test]
async fn test_malformed_game_aborts_unless_skipped() {
    let mut fetcher = site_fetcher();
    fetcher.insert(format!("{BASE}?view=gameplay&game=901"), wrap("<p>Game not played yet</p>"));

    let err = scrape(&fetcher, HOMEPAGE_URL, &ScrapeOptions::default()).await.unwrap_err();
    assert!(err.is_malformed_page());
    assert!(err.to_string().contains("game 901"));

    let options = ScrapeOptions {
        skip_malformed_games: true,
        ..ScrapeOptions::default()
    };
    let doc = scrape(&fetcher, HOMEPAGE_URL, &options).await.unwrap();
    assert_eq!(doc.games.iter().map(|g| g.id).collect::<Vec<_>>(), vec![900]);
}

#[tokio::test]
async fn test_uppercase_parameters_follow_homepage() {
    let upper_home = "https://uo.example.org/?view=teams&Season=EUC2015";
    let mut fetcher = MemoryFetcher::new();
    fetcher.insert(upper_home, wrap(
        r#"<table><tr><th>Open</th></tr><tr><td><a href="?view=teamcard&Team=1">Alpha</a></td></tr></table>"#,
    ));
    fetcher.insert(format!("{BASE}?view=playerlist&Team=1"), roster(&[]));
    fetcher.insert(format!("{BASE}?view=games&Team=1"), schedule(&[]));

    let doc = scrape(&fetcher, upper_home, &ScrapeOptions::default()).await.unwrap();
    assert_eq!(doc.divisions["Open"][0].id, 1);
    assert!(doc.games.is_empty());
}

// ============================================================================
// POST-PROCESSING
// ============================================================================

#[tokio::test]
async fn test_halftime_then_stats() {
    let mut doc = scrape(&site_fetcher(), HOMEPAGE_URL, &ScrapeOptions::default()).await.unwrap();

    let inserted = fix_halftime(&mut doc, &HalftimeOptions::new(3, 50));
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].game_id, 900);
    assert_eq!(inserted[0].index, 5);
    assert!(doc.games.iter().all(|g| g.halftime_count() <= 1));

    let repaired = doc.clone();
    assert!(fix_halftime(&mut doc, &HalftimeOptions::new(3, 50)).is_empty());
    assert_eq!(doc, repaired);

    let comebacks = best_comebacks(&doc);
    let open = comebacks["Open"];
    assert_eq!((open.game_id, open.team_id, open.deficit), (900, 1, 2));

    // 900: away starts on offence; A A H H H repeats a side three times
    assert_eq!(count_breaks(&doc.games[0]), 3);
    // 901: home starts; H A | A -> 0
    assert_eq!(count_breaks(&doc.games[1]), 0);

    let fewest = fewest_breaks(&doc);
    assert_eq!(fewest["Open"].breaks, 0);
    assert_eq!(fewest["Open"].games.iter().map(|g| g.id).collect::<Vec<_>>(), vec![901]);
    assert!(!fewest.contains_key("Masters"));
}

#[tokio::test]
async fn test_json_and_csv_round_trip() {
    let doc = scrape(&site_fetcher(), HOMEPAGE_URL, &ScrapeOptions::default()).await.unwrap();
    let dir = tempfile::tempdir().unwrap();

    let json = dir.path().join("output.json");
    save_document(&json, &doc).unwrap();
    let loaded = load_document(&json).unwrap();
    assert_eq!(loaded, doc);

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(raw["games"][1]["scores"][2], "halftime");

    let folder = dir.path().join("csv");
    let written = write_csv_folder(&doc, &folder).unwrap();
    assert_eq!(written.len(), 6);
    assert!(folder.join("spirit.csv").exists());

    // final scores re-aggregated from scores.csv match games.csv
    let mut scores = csv::Reader::from_path(folder.join("scores.csv")).unwrap();
    let mut totals: HashMap<(u32, String), u32> = HashMap::new();
    for record in scores.records() {
        let record = record.unwrap();
        let game_id: u32 = record[0].parse().unwrap();
        *totals.entry((game_id, record[1].to_string())).or_default() += 1;
    }

    let mut games = csv::Reader::from_path(folder.join("games.csv")).unwrap();
    assert_eq!(games.headers().unwrap(), GAMES_HEADER.as_slice());
    for record in games.records() {
        let record = record.unwrap();
        let game_id: u32 = record[0].parse().unwrap();
        let home: u32 = record[4].parse().unwrap();
        let away: u32 = record[5].parse().unwrap();
        assert_eq!(totals.get(&(game_id, "home".to_string())).copied().unwrap_or(0), home);
        assert_eq!(totals.get(&(game_id, "away".to_string())).copied().unwrap_or(0), away);
    }

    let mut buf = Vec::new();
    write_rows(&mut buf, &SCORES_HEADER, &flatten(&doc).scores).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("gameId,side,assist,scorer,startedAtSeconds,durationSeconds\n900,away,,201,0,120\n"));
}
