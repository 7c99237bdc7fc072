// src/models/leave.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::common::hours::Hours;

// ---
// 1. Férias (ponto diário)
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnnualLeave {
    pub company_id: Uuid,
    pub member_id: Uuid,
    pub leave_date: NaiveDate,
    pub hours: Hours,
}

// ---
// 2. Feriado do escritório (intervalo de datas, vale para a empresa ou um local)
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OfficeHoliday {
    pub company_id: Uuid,
    pub name: Option<String>,
    pub holiday_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    // None (ou "all") = todos os locais
    pub location: Option<String>,
}

pub const ALL_LOCATIONS: &str = "all";

impl OfficeHoliday {
    pub fn last_day(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.holiday_date)
    }

    /// Feriado sem local vale para todos; com local, só para quem está nele.
    pub fn applies_to(&self, member_location: Option<&str>) -> bool {
        match self.location.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(scope) if scope.eq_ignore_ascii_case(ALL_LOCATIONS) => true,
            Some(scope) => member_location
                .map(|loc| loc.trim().eq_ignore_ascii_case(scope))
                .unwrap_or(false),
        }
    }
}

// ---
// 3. Outras licenças (ponto semanal)
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OtherLeave {
    pub company_id: Uuid,
    pub member_id: Uuid,
    pub week_start_date: NaiveDate,
    pub hours: Hours,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holiday(location: Option<&str>) -> OfficeHoliday {
        OfficeHoliday {
            company_id: Uuid::nil(),
            name: None,
            holiday_date: NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
            end_date: None,
            location: location.map(String::from),
        }
    }

    #[test]
    fn company_wide_holiday_applies_to_everyone() {
        assert!(holiday(None).applies_to(None));
        assert!(holiday(Some("All")).applies_to(Some("Lisboa")));
        assert!(holiday(Some("")).applies_to(Some("Lisboa")));
    }

    #[test]
    fn located_holiday_only_applies_to_matching_members() {
        let h = holiday(Some("São Paulo"));
        assert!(h.applies_to(Some("São Paulo")));
        assert!(h.applies_to(Some("são paulo ")));
        assert!(!h.applies_to(Some("Lisboa")));
        assert!(!h.applies_to(None));
    }

    #[test]
    fn single_day_holiday_ends_on_its_start() {
        let h = holiday(None);
        assert_eq!(h.last_day(), h.holiday_date);
    }
}
