use crate::types::TeamStrength;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const PREMIER_LEAGUE: [(&str, i32); 20] = [
    ("Manchester City", 95),
    ("Arsenal", 88),
    ("Liverpool", 87),
    ("Chelsea", 82),
    ("Newcastle United", 75),
    ("Manchester United", 78),
    ("Tottenham Hotspur", 76),
    ("Brighton & Hove Albion", 68),
    ("West Ham United", 65),
    ("Crystal Palace", 62),
    ("Aston Villa", 70),
    ("Fulham", 60),
    ("Wolverhampton Wanderers", 58),
    ("Everton", 55),
    ("Brentford", 57),
    ("Nottingham Forest", 52),
    ("Luton Town", 45),
    ("Burnley", 48),
    ("Sheffield United", 46),
    ("Bournemouth", 54),
];

const CHAMPIONSHIP: [(&str, i32); 24] = [
    ("Leicester City", 78),
    ("Leeds United", 75),
    ("Southampton", 73),
    ("West Bromwich Albion", 70),
    ("Norwich City", 68),
    ("Middlesbrough", 65),
    ("Hull City", 62),
    ("Coventry City", 60),
    ("Bristol City", 58),
    ("Preston North End", 55),
    ("Blackburn Rovers", 57),
    ("Cardiff City", 54),
    ("Swansea City", 56),
    ("Millwall", 53),
    ("Queens Park Rangers", 52),
    ("Stoke City", 51),
    ("Watford", 59),
    ("Sheffield Wednesday", 50),
    ("Birmingham City", 48),
    ("Rotherham United", 45),
    ("Plymouth Argyle", 42),
    ("Ipswich Town", 49),
    ("Derby County", 47),
    ("Portsmouth", 46),
];

/// Suggested ratings by team name for a known league; empty for anything else
pub fn suggest_team_strengths(league: &str) -> HashMap<&'static str, i32> {
    let table: &[(&'static str, i32)] = match league {
        "Premier League" => &PREMIER_LEAGUE,
        "Championship" => &CHAMPIONSHIP,
        _ => &[],
    };
    table.iter().copied().collect()
}

/// Spread of ratings across one league
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeagueStrengthAnalysis {
    pub league: String,
    pub team_count: usize,
    /// Rounded to one decimal place
    pub average_strength: f64,
    pub min_strength: i32,
    pub max_strength: i32,
    pub strength_range: i32,
    /// Strongest first; equal ratings keep team id order
    pub teams: Vec<TeamStrength>,
}

impl LeagueStrengthAnalysis {
    /// `None` when the league has no rated teams
    pub fn from_teams(league: &str, teams: &[TeamStrength]) -> Option<Self> {
        let min_strength = teams.iter().map(|t| t.rating).min()?;
        let max_strength = teams.iter().map(|t| t.rating).max()?;
        let total: i64 = teams.iter().map(|t| i64::from(t.rating)).sum();
        let average = total as f64 / teams.len() as f64;

        let mut sorted = teams.to_vec();
        sorted.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.team_id.cmp(&b.team_id)));

        Some(Self {
            league: league.to_string(),
            team_count: teams.len(),
            average_strength: (average * 10.0).round() / 10.0,
            min_strength,
            max_strength,
            strength_range: max_strength - min_strength,
            teams: sorted,
        })
    }
}
