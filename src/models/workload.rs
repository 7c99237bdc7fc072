// src/models/workload.rs

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::{
    dates::{self, BucketKey, Granularity, WeekStart},
    hours::Hours,
};

// --- Enums ---
// As quatro fontes independentes que alimentam a agregação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    ProjectAllocations,
    AnnualLeave,
    OfficeHolidays,
    OtherLeave,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::ProjectAllocations => "project_allocations",
            SourceKind::AnnualLeave => "annual_leave",
            SourceKind::OfficeHolidays => "office_holidays",
            SourceKind::OtherLeave => "other_leave",
        };
        f.write_str(name)
    }
}

// ---
// 1. A janela pedida (escopo dos fetchers)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowQuery {
    pub company_id: Uuid,
    pub member_ids: Vec<Uuid>,
    pub start: NaiveDate,
    pub bucket_count: u32,
    pub granularity: Granularity,
    pub week_start: WeekStart,
}

impl WindowQuery {
    pub fn new(
        company_id: Uuid,
        member_ids: impl IntoIterator<Item = Uuid>,
        start: NaiveDate,
        bucket_count: u32,
        granularity: Granularity,
        week_start: WeekStart,
    ) -> Self {
        // Ordenado e sem repetição: o conjunto de membros também é chave de cache
        let mut member_ids: Vec<Uuid> = member_ids.into_iter().collect();
        member_ids.sort();
        member_ids.dedup();

        Self {
            company_id,
            member_ids,
            start,
            bucket_count,
            granularity,
            week_start,
        }
    }

    /// `[início, fim)` da janela, com os buckets das bordas inteiros.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        dates::window_range(self.start, self.bucket_count, self.granularity, self.week_start)
    }
}

// ---
// 2. Breakdown por membro x bucket
// ---
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHours {
    pub project_id: Uuid,
    #[schema(example = "Website Redesign")]
    pub name: Option<String>,
    #[schema(example = "WEB-01")]
    pub code: Option<String>,
    #[schema(value_type = f64)]
    pub hours: Hours,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadBreakdown {
    #[schema(value_type = f64)]
    pub project_hours: Hours,
    #[schema(value_type = f64)]
    pub annual_leave: Hours,
    #[schema(value_type = f64)]
    pub office_holidays: Hours,
    #[schema(value_type = f64)]
    pub other_leave: Hours,

    // Só o calculador de totais escreve aqui
    #[schema(value_type = f64)]
    total: Hours,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectHours>>,
}

impl WorkloadBreakdown {
    pub fn zeroed(itemize: bool) -> Self {
        Self {
            projects: itemize.then(Vec::new),
            ..Self::default()
        }
    }

    pub fn total(&self) -> Hours {
        self.total
    }

    pub fn component_sum(&self) -> Hours {
        self.project_hours + self.annual_leave + self.office_holidays + self.other_leave
    }

    pub(crate) fn refresh_total(&mut self) {
        self.total = self.component_sum();
    }

    /// Acumula horas de um projeto; linhas repetidas do mesmo projeto somam.
    pub fn add_project(
        &mut self,
        project_id: Uuid,
        name: Option<&str>,
        code: Option<&str>,
        hours: Hours,
    ) {
        let Some(projects) = self.projects.as_mut() else {
            return;
        };

        match projects.iter_mut().find(|p| p.project_id == project_id) {
            Some(existing) => existing.hours += hours,
            None => projects.push(ProjectHours {
                project_id,
                name: name.map(String::from),
                code: code.map(String::from),
                hours,
            }),
        }
    }

    pub fn project(&self, project_id: Uuid) -> Option<&ProjectHours> {
        self.projects
            .as_ref()
            .and_then(|projects| projects.iter().find(|p| p.project_id == project_id))
    }
}

// ---
// 3. O agregado (read-model efêmero)
// ---
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregationDiagnostics {
    // Contribuições fora da janela, descartadas
    pub out_of_window: u32,
    // Linhas de membros que não estão no conjunto pedido
    pub unknown_member: u32,
    // Fontes que falharam e entraram como vazias
    pub failed_sources: Vec<SourceKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub company_id: Uuid,
    pub granularity: Granularity,
    pub week_start: WeekStart,

    #[schema(value_type = Vec<String>)]
    pub bucket_keys: Vec<BucketKey>,

    // member_id -> bucket -> breakdown
    #[schema(value_type = Object)]
    pub members: BTreeMap<Uuid, BTreeMap<BucketKey, WorkloadBreakdown>>,

    pub diagnostics: AggregationDiagnostics,

    #[serde(skip)]
    pub itemized: bool,
}

impl Aggregate {
    pub fn bucket_for(&self, date: NaiveDate) -> BucketKey {
        dates::bucket_key(date, self.granularity, self.week_start)
    }

    pub fn contains_bucket(&self, key: &BucketKey) -> bool {
        self.bucket_keys.binary_search(key).is_ok()
    }

    pub fn breakdown(&self, member_id: Uuid, key: BucketKey) -> Option<&WorkloadBreakdown> {
        self.members.get(&member_id).and_then(|buckets| buckets.get(&key))
    }

    pub fn breakdown_mut(&mut self, member_id: Uuid, key: BucketKey) -> Option<&mut WorkloadBreakdown> {
        self.members
            .get_mut(&member_id)
            .and_then(|buckets| buckets.get_mut(&key))
    }

    pub fn breakdowns(&self) -> impl Iterator<Item = &WorkloadBreakdown> {
        self.members.values().flat_map(|buckets| buckets.values())
    }

    pub fn breakdowns_mut(&mut self) -> impl Iterator<Item = &mut WorkloadBreakdown> {
        self.members.values_mut().flat_map(|buckets| buckets.values_mut())
    }

    pub fn record_failure(&mut self, source: SourceKind) {
        if !self.diagnostics.failed_sources.contains(&source) {
            self.diagnostics.failed_sources.push(source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_project_merges_repeated_rows() {
        let project = Uuid::new_v4();
        let mut breakdown = WorkloadBreakdown::zeroed(true);

        breakdown.add_project(project, Some("Alpha"), Some("A"), Hours::from_whole(4));
        breakdown.add_project(project, Some("Alpha"), Some("A"), Hours::from_whole(3));

        let projects = breakdown.projects.as_ref().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].hours, Hours::from_whole(7));
    }

    #[test]
    fn add_project_is_a_no_op_without_itemization() {
        let mut breakdown = WorkloadBreakdown::zeroed(false);
        breakdown.add_project(Uuid::new_v4(), None, None, Hours::ONE);
        assert!(breakdown.projects.is_none());
    }

    #[test]
    fn window_query_normalizes_member_set() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

        let q1 = WindowQuery::new(Uuid::nil(), [b, a, b], start, 1, Granularity::Week, WeekStart::Monday);
        let q2 = WindowQuery::new(Uuid::nil(), [a, b], start, 1, Granularity::Week, WeekStart::Monday);
        assert_eq!(q1, q2);
    }

    #[test]
    fn record_failure_is_deduplicated() {
        let mut aggregate = Aggregate {
            company_id: Uuid::nil(),
            granularity: Granularity::Week,
            week_start: WeekStart::Monday,
            bucket_keys: vec![],
            members: BTreeMap::new(),
            diagnostics: AggregationDiagnostics::default(),
            itemized: false,
        };
        aggregate.record_failure(SourceKind::AnnualLeave);
        aggregate.record_failure(SourceKind::AnnualLeave);
        assert_eq!(aggregate.diagnostics.failed_sources, vec![SourceKind::AnnualLeave]);
    }
}
