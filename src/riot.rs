use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::model::{MatchSummary, Participant};

/// Riot API failures, split so the caller can reply differently to a missing
/// summoner than to a dead API key.
#[derive(Debug, Error)]
pub enum RiotError {
    #[error("not found")]
    NotFound,
    #[error("auth failure (HTTP {status})")]
    AuthFailure { status: u16 },
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub puuid: String,
}

// Wire shapes of /lol/match/v5/matches/{id}; extra fields are ignored.
#[derive(Debug, Deserialize)]
struct MatchDto {
    metadata: MetadataDto,
    info: InfoDto,
}

#[derive(Debug, Deserialize)]
struct MetadataDto {
    #[serde(rename = "matchId")]
    match_id: String,
}

#[derive(Debug, Deserialize)]
struct InfoDto {
    #[serde(rename = "gameCreation")]
    game_creation: i64, // epoch millis
    participants: Vec<ParticipantDto>,
}

#[derive(Debug, Deserialize)]
struct ParticipantDto {
    puuid: String,
    win: bool,
}

#[derive(Clone)]
pub struct RiotClient {
    http: reqwest::Client,
    host: String,
    api_key: String,
}

impl RiotClient {
    pub fn new(http: reqwest::Client, host: String, api_key: String) -> Self {
        Self {
            http,
            host,
            api_key,
        }
    }

    /// Resolve `게임명#태그` to an account; `NotFound` when no such summoner.
    pub async fn account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<Account, RiotError> {
        let url = format!(
            "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
            self.host, game_name, tag_line
        );
        let account: Account = self.get_json(&url).await?;
        if account.puuid.is_empty() {
            // a payload without a puuid is as good as no account
            return Err(RiotError::NotFound);
        }
        Ok(account)
    }

    /// Recent match ids for a player, newest first (upstream contract).
    pub async fn match_ids(
        &self,
        puuid: &str,
        queue: u32,
        count: u32,
    ) -> Result<Vec<String>, RiotError> {
        let url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids?queue={}&start=0&count={}",
            self.host, puuid, queue, count
        );
        self.get_json(&url).await
    }

    pub async fn match_detail(&self, match_id: &str) -> Result<MatchSummary, RiotError> {
        let url = format!("{}/lol/match/v5/matches/{}", self.host, match_id);
        let dto: MatchDto = self.get_json(&url).await?;
        Ok(summary_from_dto(dto))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, RiotError> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .header("X-Riot-Token", &self.api_key)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(error_for_status(status, body))
    }
}

/// Map a non-2xx status to the typed error the orchestration matches on.
fn error_for_status(status: StatusCode, body: String) -> RiotError {
    match status.as_u16() {
        404 => RiotError::NotFound,
        401 | 403 => RiotError::AuthFailure {
            status: status.as_u16(),
        },
        s => RiotError::Api { status: s, body },
    }
}

fn summary_from_dto(dto: MatchDto) -> MatchSummary {
    MatchSummary {
        match_id: dto.metadata.match_id,
        created: Utc
            .timestamp_millis_opt(dto.info.game_creation)
            .single()
            .unwrap_or_default(),
        participants: dto
            .info
            .participants
            .into_iter()
            .map(|p| Participant {
                puuid: p.puuid,
                win: p.win,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, String::new()),
            RiotError::NotFound
        ));
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, String::new()),
            RiotError::AuthFailure { status: 403 }
        ));
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, String::new()),
            RiotError::AuthFailure { status: 401 }
        ));
        assert!(matches!(
            error_for_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
            RiotError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn match_dto_maps_to_summary() {
        let raw = r#"{
            "metadata": { "matchId": "KR_7012345678", "participants": ["a", "b"] },
            "info": {
                "gameCreation": 1700000000000,
                "gameDuration": 1242,
                "participants": [
                    { "puuid": "a", "win": true, "championName": "Lux" },
                    { "puuid": "b", "win": false, "championName": "Jinx" }
                ]
            }
        }"#;
        let dto: MatchDto = serde_json::from_str(raw).unwrap();
        let summary = summary_from_dto(dto);
        assert_eq!(summary.match_id, "KR_7012345678");
        assert_eq!(summary.created.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(summary.participant_result("a"), Some(true));
        assert_eq!(summary.participant_result("b"), Some(false));
        assert_eq!(summary.participant_result("c"), None);
    }
}
