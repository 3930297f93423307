//! Command orchestration: trigger parsing, the fetch/aggregate/reply sequence
//! and the user-facing message texts.

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::{DailyRecord, RiotId};
use crate::riot::{RiotClient, RiotError};
use crate::tally;

#[derive(Debug, PartialEq, Eq)]
enum ParseError {
    MissingArgument, // nothing after the prefix
    MissingTag,      // no '#' separator
}

pub fn is_trigger(content: &str, prefix: &str) -> bool {
    content.starts_with(prefix)
}

/// Split `<prefix> 게임명#태그` into a Riot id.
fn parse_riot_id(content: &str) -> Result<RiotId, ParseError> {
    let arg = content
        .splitn(2, ' ')
        .nth(1)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingArgument)?;
    let (game_name, tag_line) = arg.split_once('#').ok_or(ParseError::MissingTag)?;
    Ok(RiotId {
        game_name: game_name.to_string(),
        tag_line: tag_line.to_string(),
    })
}

/// Run one invocation end to end and produce the reply text. Every failure
/// mode maps to a reply; nothing here is fatal to the process.
pub async fn handle(cfg: &Config, riot: &RiotClient, content: &str) -> String {
    let id = match parse_riot_id(content) {
        Ok(id) => id,
        Err(ParseError::MissingArgument) => {
            return format!("사용법: `{} 게임명#태그`", cfg.command_prefix)
        }
        Err(ParseError::MissingTag) => {
            return format!(
                "올바른 형식으로 입력해주세요: `{} 게임명#태그`",
                cfg.command_prefix
            )
        }
    };

    match run(cfg, riot, &id).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("command for {}#{} failed: {}", id.game_name, id.tag_line, e);
            reply_for_error(&id, e)
        }
    }
}

async fn run(cfg: &Config, riot: &RiotClient, id: &RiotId) -> Result<String, RiotError> {
    let account = riot.account_by_riot_id(&id.game_name, &id.tag_line).await?;

    let ids = riot
        .match_ids(&account.puuid, cfg.queue_id, cfg.match_count)
        .await?;
    if ids.is_empty() {
        // no history at all, as opposed to no games today
        return Ok(format!(
            "`{}#{}`님의 최근 {} 기록이 없습니다.",
            id.game_name, id.tag_line, cfg.mode_label
        ));
    }

    let now = Utc::now().with_timezone(&cfg.utc_offset());
    let start = tally::window_start(now, cfg.rollover_hour);
    let start_utc = start.with_timezone(&Utc);

    // Details are fetched newest-first and the loop stops once a match
    // predates the window, so at most one out-of-window fetch happens.
    let mut matches = Vec::new();
    for match_id in &ids {
        let summary = riot.match_detail(match_id).await?;
        debug!("fetched {} created {}", summary.match_id, summary.created);
        let outside = summary.created < start_utc;
        matches.push(summary);
        if outside {
            break;
        }
    }
    debug!(
        "{} of {} listed matches fetched for {}#{}",
        matches.len(),
        ids.len(),
        id.game_name,
        id.tag_line
    );

    let record = tally::daily_record(&account.puuid, &matches, start);
    Ok(format_record(
        &cfg.mode_label,
        &record,
        cfg.rollover_hour,
    ))
}

fn format_record(label: &str, record: &DailyRecord, rollover_hour: u32) -> String {
    format!(
        "{} 금일 {}승 {}패 ({:.1}%)\n* 오전 {}시 기준으로 갱신됨",
        label,
        record.wins,
        record.losses,
        record.win_rate(),
        rollover_hour
    )
}

fn reply_for_error(id: &RiotId, err: RiotError) -> String {
    match err {
        RiotError::NotFound => format!(
            "소환사 `{}#{}`를 찾을 수 없습니다.",
            id.game_name, id.tag_line
        ),
        RiotError::AuthFailure { status: 403 } => {
            "🚫 라이엇 API 키가 만료되었거나 잘못되었습니다. 새 키를 발급받아주세요.".to_string()
        }
        RiotError::AuthFailure { .. } => {
            "🚫 API 인증 오류: 키가 비어있거나 잘못되었습니다.".to_string()
        }
        err @ RiotError::Api { .. } => {
            format!("데이터를 가져오는 중 오류가 발생했습니다: {}", err)
        }
        err => format!("⚠️ 오류가 발생했습니다: {}", err),
    }
}
