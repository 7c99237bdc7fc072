// src/models/settings.rs

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::{dates::WeekStart, hours::Hours};

/// Jornada padrão quando a empresa não configurou nada.
pub const DEFAULT_WORK_WEEK_HOURS: Hours = Hours::from_whole(40);

pub const DEFAULT_WORKING_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// Unidade em que as células de alocação são exibidas e editadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "display_unit", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnit {
    #[default]
    Hours,
    Percentage,
}

// ---
// WorkloadSettings: o objeto de configuração passado explicitamente para o motor
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSettings {
    #[schema(ignore)] // O contexto (Header) já define a empresa
    pub company_id: Uuid,

    pub week_start_day: WeekStart,

    #[schema(value_type = f64, example = 40)]
    pub work_week_hours: Hours,

    pub display_unit: DisplayUnit,

    #[schema(value_type = Vec<String>)]
    pub working_days: Vec<Weekday>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl WorkloadSettings {
    pub fn defaults(company_id: Uuid) -> Self {
        Self {
            company_id,
            week_start_day: WeekStart::default(),
            work_week_hours: DEFAULT_WORK_WEEK_HOURS,
            display_unit: DisplayUnit::default(),
            working_days: DEFAULT_WORKING_DAYS.to_vec(),
            updated_at: None,
        }
    }

    pub fn working_days_per_week(&self) -> i64 {
        self.working_days.len() as i64
    }

    /// Um dia cheio de trabalho para uma capacidade semanal.
    pub fn daily_capacity(&self, weekly_capacity: Hours) -> Hours {
        weekly_capacity.div_round(self.working_days_per_week())
    }

    pub fn apply(mut self, input: UpdateSettingsRequest) -> Self {
        if let Some(week_start_day) = input.week_start_day {
            self.week_start_day = week_start_day;
        }
        if let Some(hours) = input.work_week_hours {
            self.work_week_hours = hours;
        }
        if let Some(unit) = input.display_unit {
            self.display_unit = unit;
        }
        if let Some(mut days) = input.working_days {
            days.sort_by_key(|d| d.num_days_from_monday());
            days.dedup();
            self.working_days = days;
        }
        self
    }
}

// Linha da tabela company_settings (dias úteis em ISO: 1 = segunda ... 7 = domingo)
#[derive(Debug, FromRow)]
pub struct CompanySettingsRow {
    pub company_id: Uuid,
    pub week_start_day: WeekStart,
    pub work_week_hours: Hours,
    pub display_unit: DisplayUnit,
    pub working_days: Vec<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<CompanySettingsRow> for WorkloadSettings {
    fn from(row: CompanySettingsRow) -> Self {
        let mut working_days: Vec<Weekday> = row
            .working_days
            .iter()
            .filter_map(|iso| weekday_from_iso(*iso))
            .collect();

        if working_days.is_empty() {
            working_days = DEFAULT_WORKING_DAYS.to_vec();
        }

        Self {
            company_id: row.company_id,
            week_start_day: row.week_start_day,
            work_week_hours: row.work_week_hours,
            display_unit: row.display_unit,
            working_days,
            updated_at: row.updated_at,
        }
    }
}

pub fn weekday_from_iso(iso: i32) -> Option<Weekday> {
    match iso {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn weekday_to_iso(day: Weekday) -> i32 {
    day.number_from_monday() as i32
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub week_start_day: Option<WeekStart>,

    #[validate(custom(function = "validate_work_week", message = "A jornada semanal deve estar entre 1 e 168 horas."))]
    #[schema(value_type = Option<f64>, example = 37.5)]
    pub work_week_hours: Option<Hours>,

    pub display_unit: Option<DisplayUnit>,

    #[validate(length(min = 1, max = 7, message = "Informe de 1 a 7 dias úteis."))]
    #[schema(value_type = Option<Vec<String>>)]
    pub working_days: Option<Vec<Weekday>>,
}

fn validate_work_week(hours: &Hours) -> Result<(), ValidationError> {
    if *hours < Hours::ONE || *hours > Hours::from_whole(168) {
        return Err(ValidationError::new("work_week_hours"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_monday_forty_hours_weekdays() {
        let settings = WorkloadSettings::defaults(Uuid::nil());
        assert_eq!(settings.week_start_day, WeekStart::Monday);
        assert_eq!(settings.work_week_hours, Hours::from_whole(40));
        assert_eq!(settings.daily_capacity(settings.work_week_hours), Hours::from_whole(8));
    }

    #[test]
    fn apply_overrides_only_present_fields() {
        let settings = WorkloadSettings::defaults(Uuid::nil()).apply(UpdateSettingsRequest {
            week_start_day: Some(WeekStart::Sunday),
            work_week_hours: None,
            display_unit: None,
            working_days: Some(vec![Weekday::Fri, Weekday::Mon, Weekday::Mon]),
        });

        assert_eq!(settings.week_start_day, WeekStart::Sunday);
        assert_eq!(settings.work_week_hours, DEFAULT_WORK_WEEK_HOURS);
        assert_eq!(settings.working_days, vec![Weekday::Mon, Weekday::Fri]);
    }

    #[test]
    fn row_with_unknown_weekdays_falls_back_to_defaults() {
        let row = CompanySettingsRow {
            company_id: Uuid::nil(),
            week_start_day: WeekStart::Saturday,
            work_week_hours: Hours::from_whole(36),
            display_unit: DisplayUnit::Percentage,
            working_days: vec![0, 9],
            updated_at: None,
        };
        let settings = WorkloadSettings::from(row);
        assert_eq!(settings.working_days, DEFAULT_WORKING_DAYS.to_vec());
        assert_eq!(settings.week_start_day, WeekStart::Saturday);
    }

    #[test]
    fn iso_weekday_round_trip() {
        for iso in 1..=7 {
            let day = weekday_from_iso(iso).unwrap();
            assert_eq!(weekday_to_iso(day), iso);
        }
    }

    #[test]
    fn work_week_validation_rejects_zero() {
        let request = UpdateSettingsRequest {
            week_start_day: None,
            work_week_hours: Some(Hours::ZERO),
            display_unit: None,
            working_days: None,
        };
        assert!(request.validate().is_err());
    }
}
