#[macro_use]
mod macros;

pub mod division_handler;
pub mod error;
pub mod fetcher;
pub mod game_handler;
pub mod halftime;
pub mod markup;
pub mod output;
pub mod schema;
pub mod site;
pub mod stats;
pub mod tournament_handler;
pub mod utils;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================
pub use error::{Result, ScrapeError};
pub use fetcher::{HttpFetcher, MemoryFetcher, PageCache, PageFetcher};
pub use game_handler::parse_game_html;
pub use halftime::{fix_halftime, insert_halftime, HalftimeInsertion, HalftimeOptions};
pub use output::{flatten, load_document, save_document, write_csv_folder, Tables};
pub use schema::{
    Assist, Divisions, Document, Game, Player, Point, ScoreEntry, Side, SideMap, Spirit,
    SpiritBreakdown, SpiritPair, Team, Timeout,
};
pub use site::SiteUrls;
pub use stats::{best_comebacks, count_breaks, fewest_breaks, write_report, Comeback, FewestBreaks};
pub use tournament_handler::{scrape, ScrapeOptions};
