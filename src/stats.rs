use crate::client::{decode, RemoteClient};
use crate::errors::{ApiError, ApiResult};
use crate::models::{DailyPoint, DirectoryStats, GymStats, Member, WeeklyPoint};
use chrono::{Datelike, Duration, Local, NaiveDate};
use std::collections::BTreeMap;
use tracing::warn;

pub fn gym_stats_path(gym_id: u64) -> String {
    format!("/api/gym/estadisticas/{gym_id}/")
}

/// Dashboard counters computed by the backend. Without a session token the
/// request is not attempted.
pub async fn fetch_gym_stats(client: &RemoteClient, gym_id: u64) -> ApiResult<GymStats> {
    if !client.has_token() {
        warn!("gym stats requested without a session token");
        return Err(ApiError::Unauthorized);
    }
    decode(client.get(&gym_stats_path(gym_id)).await?)
}

pub fn build_stats(members: &[Member]) -> DirectoryStats {
    build_stats_at(Local::now().date_naive(), members)
}

pub fn build_stats_at(today: NaiveDate, members: &[Member]) -> DirectoryStats {
    const WEEK_COUNT: usize = 8;

    let mut joins_per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut by_membership: BTreeMap<String, u64> = BTreeMap::new();
    let mut active = 0u64;
    for member in members {
        if member.is_active {
            active += 1;
        }
        *by_membership.entry(member.membership_type.label().to_string()).or_default() += 1;
        if let Some(joined) = member.joined_at {
            *joins_per_day.entry(joined.date()).or_default() += 1;
        }
    }
    let joined_on = |date: NaiveDate| joins_per_day.get(&date).copied().unwrap_or(0);

    let mut joined_last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset);
        joined_last_7_days.push(DailyPoint {
            date: date.to_string(),
            joined: joined_on(date),
        });
    }

    let current_week_start = week_start(today);
    let mut weekly_joins = Vec::with_capacity(WEEK_COUNT);
    for offset in (0..WEEK_COUNT as i64).rev() {
        let start = current_week_start - Duration::weeks(offset);
        let end = start + Duration::days(6);
        let joined = (0..7).map(|day| joined_on(start + Duration::days(day))).sum();

        weekly_joins.push(WeeklyPoint {
            week: week_label(start),
            start_date: start.to_string(),
            end_date: end.to_string(),
            joined,
        });
    }

    let total = members.len() as u64;
    DirectoryStats {
        total,
        active,
        inactive: total - active,
        by_membership,
        joined_last_7_days,
        weekly_joins,
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
