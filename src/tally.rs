use chrono::{DateTime, Duration, FixedOffset, TimeZone, Timelike, Utc};

use crate::model::{DailyRecord, MatchSummary};

/// Start of the current day window: today at `rollover_hour`:00 in `now`'s
/// offset, or yesterday's if `now` is still before the rollover.
/// `rollover_hour` must be 0..=23 (validated at config load).
pub fn window_start(now: DateTime<FixedOffset>, rollover_hour: u32) -> DateTime<FixedOffset> {
    let day = if now.hour() < rollover_hour {
        now.date_naive() - Duration::days(1)
    } else {
        now.date_naive()
    };
    let naive = day.and_hms_opt(rollover_hour, 0, 0).expect("hour in 0..=23");
    // fixed offsets map local times uniquely
    now.offset().from_local_datetime(&naive).unwrap()
}

/// Count wins and losses over the newest-first `matches` that fall inside the
/// day window. Stops at the first match older than `start`: the listing is
/// newest-first by upstream contract, so everything after it is older too.
pub fn daily_record(
    puuid: &str,
    matches: &[MatchSummary],
    start: DateTime<FixedOffset>,
) -> DailyRecord {
    let start = start.with_timezone(&Utc);
    let mut record = DailyRecord::default();
    for m in matches {
        if m.created < start {
            break;
        }
        match m.participant_result(puuid) {
            Some(win) => record.add_result(win),
            None => {} // player missing from the roster; count neither
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Participant;

    const PLAYER: &str = "puuid-player";

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        kst().with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn game(created: DateTime<FixedOffset>, win: bool) -> MatchSummary {
        MatchSummary {
            match_id: format!("KR_{}", created.timestamp()),
            created: created.with_timezone(&Utc),
            participants: vec![Participant {
                puuid: PLAYER.to_string(),
                win,
            }],
        }
    }

    #[test]
    fn window_starts_yesterday_before_rollover() {
        // 05:59 local: the window still belongs to the previous day
        let now = at(2024, 3, 10, 5, 59, 0);
        assert_eq!(window_start(now, 6), at(2024, 3, 9, 6, 0, 0));

        let matches = vec![
            game(at(2024, 3, 9, 6, 0, 0), true),  // exactly on the boundary
            game(at(2024, 3, 9, 5, 59, 59), true), // one second before it
        ];
        let record = daily_record(PLAYER, &matches, window_start(now, 6));
        assert_eq!(record, DailyRecord { wins: 1, losses: 0 });
    }

    #[test]
    fn window_starts_today_at_rollover() {
        let now = at(2024, 3, 10, 6, 0, 0);
        assert_eq!(window_start(now, 6), at(2024, 3, 10, 6, 0, 0));

        let matches = vec![game(at(2024, 3, 10, 5, 59, 59), true)];
        let record = daily_record(PLAYER, &matches, window_start(now, 6));
        assert_eq!(record, DailyRecord { wins: 0, losses: 0 });
    }

    #[test]
    fn window_covers_past_midnight() {
        // 00:30 local is still "yesterday" until 06:00
        let now = at(2024, 3, 10, 0, 30, 0);
        let start = window_start(now, 6);
        assert_eq!(start, at(2024, 3, 9, 6, 0, 0));

        let matches = vec![
            game(at(2024, 3, 10, 0, 10, 0), false),
            game(at(2024, 3, 9, 23, 40, 0), true),
        ];
        let record = daily_record(PLAYER, &matches, start);
        assert_eq!(record, DailyRecord { wins: 1, losses: 1 });
    }

    #[test]
    fn stops_at_first_match_outside_window() {
        let now = at(2024, 3, 10, 12, 0, 0);
        let start = window_start(now, 6);

        // the two older matches are wins: a full scan would count them
        let matches = vec![
            game(at(2024, 3, 10, 10, 0, 0), true),
            game(at(2024, 3, 10, 8, 0, 0), false),
            game(at(2024, 3, 9, 20, 0, 0), true),
            game(at(2024, 3, 9, 5, 0, 0), true),
        ];
        let record = daily_record(PLAYER, &matches, start);
        assert_eq!(record, DailyRecord { wins: 1, losses: 1 });
    }

    #[test]
    fn empty_history_counts_nothing() {
        let record = daily_record(PLAYER, &[], window_start(at(2024, 3, 10, 12, 0, 0), 6));
        assert_eq!(record, DailyRecord::default());
        assert_eq!(record.win_rate(), 0.0);
    }

    #[test]
    fn counts_all_matches_inside_window() {
        let start = window_start(at(2024, 3, 10, 12, 0, 0), 6);
        let matches = vec![
            game(at(2024, 3, 10, 11, 0, 0), true),
            game(at(2024, 3, 10, 9, 0, 0), false),
            game(at(2024, 3, 10, 7, 0, 0), true),
        ];
        let record = daily_record(PLAYER, &matches, start);
        assert_eq!(record, DailyRecord { wins: 2, losses: 1 });
        assert_eq!(format!("{:.1}", record.win_rate()), "66.7");
    }

    #[test]
    fn roster_miss_skips_without_stopping() {
        let start = window_start(at(2024, 3, 10, 12, 0, 0), 6);
        let stranger = MatchSummary {
            match_id: "KR_other".to_string(),
            created: at(2024, 3, 10, 10, 0, 0).with_timezone(&Utc),
            participants: vec![Participant {
                puuid: "someone-else".to_string(),
                win: true,
            }],
        };
        let matches = vec![stranger, game(at(2024, 3, 10, 8, 0, 0), true)];
        let record = daily_record(PLAYER, &matches, start);
        // the unknown roster contributes nothing and the scan continues past it
        assert_eq!(record, DailyRecord { wins: 1, losses: 0 });
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        let record = DailyRecord { wins: 1, losses: 2 };
        assert_eq!(format!("{:.1}", record.win_rate()), "33.3");
    }
}
