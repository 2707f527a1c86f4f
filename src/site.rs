use url::Url;

use crate::error::{Result, ScrapeError};

/// Builds the per-team and per-game URLs for one Ultiorganizer instance.
///
/// Some instances use capitalised query parameters (`Season=`, `Team=`),
/// others lowercase ones. The casing of the `season` parameter in the
/// homepage URL decides which style the generated URLs follow.
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base: Url,
    uppercase_params: bool,
}

impl SiteUrls {
    pub fn parse(homepage: &str) -> Result<SiteUrls> {
        let base = Url::parse(homepage).map_err(|e| ScrapeError::InvalidUrl {
            url: homepage.to_string(),
            reason: e.to_string(),
        })?;

        if base.host_str().is_none() {
            return Err(ScrapeError::InvalidUrl {
                url: homepage.to_string(),
                reason: "missing host".to_string(),
            });
        }

        let uppercase_params = uses_uppercase_params(base.query().unwrap_or(""));
        Ok(SiteUrls {
            base,
            uppercase_params,
        })
    }

    pub fn uppercase_params(&self) -> bool {
        self.uppercase_params
    }

    pub fn team_games_url(&self, team_id: u32) -> String {
        self.view_url("games", "team", team_id)
    }

    pub fn roster_url(&self, team_id: u32) -> String {
        self.view_url("playerlist", "team", team_id)
    }

    pub fn game_url(&self, game_id: u32) -> String {
        self.view_url("gameplay", "game", game_id)
    }

    fn view_url(&self, view: &str, param: &str, id: u32) -> String {
        let param = if self.uppercase_params {
            capitalize(param)
        } else {
            param.to_string()
        };

        let mut url = self.base.clone();
        url.set_fragment(None);
        url.set_query(Some(&format!("view={view}&{param}={id}")));
        url.to_string()
    }
}

/// True when the query spells the season parameter `Season=`
pub fn uses_uppercase_params(query: &str) -> bool {
    regex!(r"(?i)(s)eason=")
        .captures(query)
        .and_then(|caps| caps.get(1))
        .is_some_and(|s| s.as_str() == "S")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
