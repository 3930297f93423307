use chrono::{DateTime, Utc};

/// One participant's outcome within a match.
#[derive(Clone, Debug)]
pub struct Participant {
    pub puuid: String,
    pub win: bool,
}

/// One completed game from the match detail endpoint.
#[derive(Clone, Debug)]
pub struct MatchSummary {
    pub match_id: String,
    pub created: DateTime<Utc>, // normalized from epoch millis
    pub participants: Vec<Participant>,
}

impl MatchSummary {
    /// Outcome for the given player; `None` if they were not in the match.
    pub fn participant_result(&self, puuid: &str) -> Option<bool> {
        self.participants
            .iter()
            .find(|p| p.puuid == puuid)
            .map(|p| p.win)
    }
}

/// Win/loss tally over the current day window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DailyRecord {
    pub wins: u32,
    pub losses: u32,
}

impl DailyRecord {
    pub fn add_result(&mut self, win: bool) {
        if win {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses
    }

    /// Win percentage, 0.0 when no games were played.
    pub fn win_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(total) * 100.0
        }
    }
}

/// A Riot account handle in `게임명#태그` form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
}
