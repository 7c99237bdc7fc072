// src/common/dates.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

use crate::common::error::AppError;

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

// ---
// Configurações de calendário
// ---

/// Dia em que a semana da empresa começa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "week_start_day", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    Sunday,
    #[default]
    Monday,
    Saturday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Saturday => Weekday::Sat,
        }
    }
}

/// Granularidade dos buckets da agregação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    #[default]
    Week,
}

impl Granularity {
    pub fn span_days(self) -> i64 {
        match self {
            Granularity::Day => 1,
            Granularity::Week => 7,
        }
    }
}

// ---
// BucketKey
// ---

/// Chave canônica de um bucket: o próprio dia ou o primeiro dia da semana.
/// Serializa como `YYYY-MM-DD` (inclusive quando usada como chave de mapa).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey(NaiveDate);

impl BucketKey {
    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl From<BucketKey> for NaiveDate {
    fn from(key: BucketKey) -> Self {
        key.0
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

impl FromStr for BucketKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DAY_KEY_FORMAT)
            .map(BucketKey)
            .map_err(|_| AppError::InvalidDate(s.to_string()))
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BucketKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---
// Normalização
// ---

/// Interpreta uma data vinda de fora.
///
/// Aceita `YYYY-MM-DD` (data de calendário, sem fuso) ou um timestamp
/// RFC 3339, que é reduzido à data de calendário UTC do instante. Entrada
/// inválida é erro, nunca "hoje".
pub fn parse_date(input: &str) -> Result<NaiveDate, AppError> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DAY_KEY_FORMAT) {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|instant| instant_date(&instant))
        .map_err(|_| AppError::InvalidDate(input.to_string()))
}

/// Data de calendário UTC de um instante, independente do fuso de origem.
pub fn instant_date<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.with_timezone(&Utc).date_naive()
}

pub fn day_key(date: NaiveDate) -> BucketKey {
    BucketKey(date)
}

pub fn week_key(date: NaiveDate, week_start: WeekStart) -> BucketKey {
    let offset = (7 + date.weekday().num_days_from_monday()
        - week_start.weekday().num_days_from_monday())
        % 7;
    BucketKey(date - Duration::days(i64::from(offset)))
}

pub fn bucket_key(date: NaiveDate, granularity: Granularity, week_start: WeekStart) -> BucketKey {
    match granularity {
        Granularity::Day => day_key(date),
        Granularity::Week => week_key(date, week_start),
    }
}

/// Chaves de `count` buckets consecutivos a partir do bucket que contém `start`.
pub fn bucket_keys(
    start: NaiveDate,
    count: u32,
    granularity: Granularity,
    week_start: WeekStart,
) -> Vec<BucketKey> {
    let first = bucket_key(start, granularity, week_start).date();
    let span = granularity.span_days();

    (0..i64::from(count))
        .map(|i| BucketKey(first + Duration::days(i * span)))
        .collect()
}

/// Intervalo de datas coberto pela janela: `[início, fim)`.
/// Buckets parciais nas bordas entram inteiros.
pub fn window_range(
    start: NaiveDate,
    count: u32,
    granularity: Granularity,
    week_start: WeekStart,
) -> (NaiveDate, NaiveDate) {
    let first = bucket_key(start, granularity, week_start).date();
    let end = first + Duration::days(i64::from(count) * granularity.span_days());
    (first, end)
}

pub fn is_working_day(date: NaiveDate, working_days: &[Weekday]) -> bool {
    working_days.contains(&date.weekday())
}

/// Dias úteis dos sete dias que começam em `week_start_date`, em ordem.
pub fn working_days_of_week(week_start_date: NaiveDate, working_days: &[Weekday]) -> Vec<NaiveDate> {
    (0..7)
        .map(|i| week_start_date + Duration::days(i))
        .filter(|d| is_working_day(*d, working_days))
        .collect()
}

/// Todas as datas de `[from, to]`. Intervalo invertido vira um único dia.
pub fn expand_range(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let to = to.max(from);
    from.iter_days().take_while(|d| *d <= to).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::FixedOffset;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_key_for_each_start_day() {
        // 2025-01-08 é uma quarta-feira
        let wed = d(2025, 1, 8);
        assert_eq!(week_key(wed, WeekStart::Monday).date(), d(2025, 1, 6));
        assert_eq!(week_key(wed, WeekStart::Sunday).date(), d(2025, 1, 5));
        assert_eq!(week_key(wed, WeekStart::Saturday).date(), d(2025, 1, 4));
    }

    #[test]
    fn week_key_of_week_start_is_itself() {
        assert_eq!(week_key(d(2025, 1, 6), WeekStart::Monday).date(), d(2025, 1, 6));
        assert_eq!(week_key(d(2025, 1, 5), WeekStart::Sunday).date(), d(2025, 1, 5));
        // domingo numa semana que começa na segunda pertence à semana anterior
        assert_eq!(week_key(d(2025, 1, 12), WeekStart::Monday).date(), d(2025, 1, 6));
    }

    #[test]
    fn week_key_is_stable_across_caller_offsets() {
        let utc_instant = Utc.with_ymd_and_hms(2025, 1, 8, 21, 0, 0).unwrap();
        let far_west = utc_instant.with_timezone(&FixedOffset::west_opt(11 * 3600).unwrap());
        let far_east = utc_instant.with_timezone(&FixedOffset::east_opt(13 * 3600).unwrap());

        let west_key = week_key(instant_date(&far_west), WeekStart::Monday);
        let east_key = week_key(instant_date(&far_east), WeekStart::Monday);
        assert_eq!(west_key, east_key);
        assert_eq!(day_key(instant_date(&far_west)), day_key(instant_date(&far_east)));
    }

    #[test]
    fn parse_date_normalizes_rfc3339_to_utc_calendar_date() {
        let west = parse_date("2025-01-08T10:00:00-11:00").unwrap();
        let east = parse_date("2025-01-09T10:00:00+13:00").unwrap();
        assert_eq!(west, d(2025, 1, 8));
        assert_eq!(east, d(2025, 1, 8));
        assert_eq!(parse_date("2025-01-06").unwrap(), d(2025, 1, 6));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_matches!(parse_date(""), Err(AppError::InvalidDate(_)));
        assert_matches!(parse_date("2025-02-30"), Err(AppError::InvalidDate(_)));
        assert_matches!(parse_date("yesterday"), Err(AppError::InvalidDate(_)));
    }

    #[test]
    fn bucket_keys_cover_requested_window() {
        let weeks = bucket_keys(d(2025, 1, 8), 3, Granularity::Week, WeekStart::Monday);
        let rendered: Vec<String> = weeks.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["2025-01-06", "2025-01-13", "2025-01-20"]);

        let days = bucket_keys(d(2025, 1, 8), 2, Granularity::Day, WeekStart::Monday);
        assert_eq!(days, vec![day_key(d(2025, 1, 8)), day_key(d(2025, 1, 9))]);
    }

    #[test]
    fn window_range_includes_partial_boundary_bucket() {
        let (from, to) = window_range(d(2025, 1, 8), 1, Granularity::Week, WeekStart::Monday);
        assert_eq!(from, d(2025, 1, 6));
        assert_eq!(to, d(2025, 1, 13));
    }

    #[test]
    fn working_days_skip_weekend() {
        let weekdays = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];
        let days = working_days_of_week(d(2025, 1, 6), &weekdays);
        assert_eq!(days.len(), 5);
        assert_eq!(days[0], d(2025, 1, 6));
        assert_eq!(days[4], d(2025, 1, 10));
    }

    #[test]
    fn expand_range_is_inclusive() {
        assert_eq!(expand_range(d(2025, 1, 9), d(2025, 1, 10)), vec![d(2025, 1, 9), d(2025, 1, 10)]);
        assert_eq!(expand_range(d(2025, 1, 9), d(2025, 1, 1)), vec![d(2025, 1, 9)]);
    }

    #[test]
    fn bucket_key_serializes_as_string() {
        let key = day_key(d(2025, 1, 6));
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2025-01-06\"");
        let back: BucketKey = serde_json::from_str("\"2025-01-06\"").unwrap();
        assert_eq!(back, key);
    }
}
