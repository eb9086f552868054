use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::simulation::Entity;

/// Default roster document, matching the public rosters-data mirror layout.
pub const DEFAULT_LEAGUE: &str = "nba";
pub const DEFAULT_SEASON: &str = "2025-26";
pub const DEFAULT_SELECTED_TEAMS: [&str; 7] = ["GS", "LAL", "BOS", "MIA", "PHX", "MIL", "NYK"];

const DATA_URL_BASE: &str = "https://cdn.jsdelivr.net/gh/kevnkm/rosters-data@main";

const DEFAULT_PRIMARY_COLOR: &str = "#666666";
const DEFAULT_SECONDARY_COLOR: &str = "#cccccc";
const FALLBACK_LABEL: &str = "Unknown player";

pub fn data_url(league: &str, season: &str) -> String {
    format!("{DATA_URL_BASE}/{league}/{season}.json")
}

/// Why roster data could not be produced. None of these are fatal to the
/// visualization: callers fall back to the empty "data unavailable" graph.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to fetch roster data: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("roster request failed with status {0}")]
    Status(u16),
    #[error("failed to decode roster document: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterDocument {
    pub teams: HashMap<String, TeamEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamEntry {
    pub team_info: TeamInfo,
    #[serde(default)]
    pub roster: Roster,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamInfo {
    pub abbreviation: String,
    pub display_name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub alternate_color: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub athletes: Vec<Athlete>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Athlete {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub jersey: Option<String>,
}

/// Team colors for one simulation run. Built from the document by
/// [`build_entities`] and passed explicitly wherever colors are needed,
/// never stashed in process-wide state.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    colors: HashMap<String, TeamColors>,
}

#[derive(Debug, Clone)]
pub struct TeamColors {
    pub primary: String,
    pub secondary: String,
    pub display_name: String,
}

impl Palette {
    pub fn insert(&mut self, group: impl Into<String>, colors: TeamColors) {
        self.colors.insert(group.into(), colors);
    }

    pub fn colors_for(&self, group: &str) -> TeamColors {
        self.colors.get(group).cloned().unwrap_or(TeamColors {
            primary: DEFAULT_PRIMARY_COLOR.to_string(),
            secondary: DEFAULT_SECONDARY_COLOR.to_string(),
            display_name: group.to_string(),
        })
    }
}

/// Everything the graph needs from one parsed document + selection.
#[derive(Debug)]
pub struct BuiltRoster {
    pub entities: Vec<Entity>,
    pub groups: Vec<String>,
    pub palette: Palette,
    /// Athletes dropped because they carried no id.
    pub skipped: usize,
}

pub async fn fetch_roster(url: &str) -> Result<RosterDocument, RosterError> {
    let client = reqwest::Client::new();
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(RosterError::Status(response.status().as_u16()));
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

pub fn read_roster(path: &Path) -> Result<RosterDocument, RosterError> {
    let contents = std::fs::read_to_string(path).map_err(|source| RosterError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn parse_roster(source: &str) -> Result<RosterDocument, RosterError> {
    Ok(serde_json::from_str(source)?)
}

/// Turn a document into the entity set for the caller-selected teams.
///
/// Selection order defines group order; abbreviations not present in the
/// document are silently ignored, duplicates are collapsed. Athletes without
/// an id are skipped and counted rather than failing the build.
pub fn build_entities(document: &RosterDocument, selected: &[String]) -> BuiltRoster {
    let by_abbreviation: HashMap<&str, &TeamEntry> = document
        .teams
        .values()
        .map(|team| (team.team_info.abbreviation.as_str(), team))
        .collect();

    let mut entities = Vec::new();
    let mut groups = Vec::new();
    let mut palette = Palette::default();
    let mut skipped = 0usize;
    let mut seen = HashSet::new();

    for abbreviation in selected {
        if !seen.insert(abbreviation.as_str()) {
            continue;
        }
        let Some(team) = by_abbreviation.get(abbreviation.as_str()) else {
            continue;
        };
        let info = &team.team_info;
        groups.push(abbreviation.clone());
        palette.insert(
            abbreviation.clone(),
            TeamColors {
                primary: normalize_color(info.color.as_deref(), DEFAULT_PRIMARY_COLOR),
                secondary: normalize_color(info.alternate_color.as_deref(), DEFAULT_SECONDARY_COLOR),
                display_name: info.display_name.clone(),
            },
        );

        for athlete in &team.roster.athletes {
            let Some(id) = athlete.id.as_deref().filter(|id| !id.trim().is_empty()) else {
                skipped += 1;
                continue;
            };
            let label = athlete
                .short_name
                .as_deref()
                .or(athlete.full_name.as_deref())
                .unwrap_or(FALLBACK_LABEL);
            let jersey = athlete
                .jersey
                .as_deref()
                .and_then(|jersey| jersey.trim().parse().ok());
            entities.push(
                Entity::new(format!("{abbreviation}-{id}"), label, abbreviation.clone())
                    .with_jersey(jersey),
            );
        }
    }

    BuiltRoster {
        entities,
        groups,
        palette,
        skipped,
    }
}

fn normalize_color(raw: Option<&str>, fallback: &str) -> String {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) if value.starts_with('#') => value.to_string(),
        Some(value) => format!("#{value}"),
        None => fallback.to_string(),
    }
}
