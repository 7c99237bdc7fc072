// src/services/aggregation.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::dates::{self, Granularity, WeekStart},
    models::{
        members::Member,
        workload::{Aggregate, AggregationDiagnostics, WorkloadBreakdown},
    },
};

/// Monta o esqueleto zerado: todo membro x todo bucket da janela.
///
/// O conjunto de buckets devolvido é exatamente a janela pedida; os
/// processadores só somam em buckets que já existem aqui.
pub fn initialize(
    company_id: Uuid,
    members: &[Member],
    start: NaiveDate,
    bucket_count: u32,
    granularity: Granularity,
    week_start: WeekStart,
    itemize: bool,
) -> Aggregate {
    let bucket_keys = dates::bucket_keys(start, bucket_count, granularity, week_start);

    let members = members
        .iter()
        .map(|member| {
            let buckets = bucket_keys
                .iter()
                .map(|key| (*key, WorkloadBreakdown::zeroed(itemize)))
                .collect::<BTreeMap<_, _>>();
            (member.id, buckets)
        })
        .collect();

    Aggregate {
        company_id,
        granularity,
        week_start,
        bucket_keys,
        members,
        diagnostics: AggregationDiagnostics::default(),
        itemized: itemize,
    }
}

/// Recalcula `total` de cada bucket como a soma dos componentes.
/// Idempotente; deve rodar depois de todos os processadores.
pub fn recompute_totals(aggregate: &mut Aggregate) {
    for breakdown in aggregate.breakdowns_mut() {
        breakdown.refresh_total();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::hours::Hours;
    use crate::models::members::ResourceType;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    #[test]
    fn skeleton_has_every_member_and_bucket() {
        let members = vec![
            Member::new(Uuid::from_u128(1), ResourceType::Active),
            Member::new(Uuid::from_u128(2), ResourceType::PreRegistered),
        ];

        let aggregate = initialize(Uuid::nil(), &members, monday(), 4, Granularity::Week, WeekStart::Monday, false);

        assert_eq!(aggregate.bucket_keys.len(), 4);
        assert_eq!(aggregate.members.len(), 2);
        for buckets in aggregate.members.values() {
            assert_eq!(buckets.keys().copied().collect::<Vec<_>>(), aggregate.bucket_keys);
            assert!(buckets.values().all(|b| b.total() == Hours::ZERO && b.projects.is_none()));
        }
    }

    #[test]
    fn daily_skeleton_starts_on_requested_day() {
        let members = vec![Member::new(Uuid::from_u128(1), ResourceType::Active)];
        let wednesday = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();

        let aggregate = initialize(Uuid::nil(), &members, wednesday, 3, Granularity::Day, WeekStart::Monday, true);

        assert_eq!(aggregate.bucket_keys[0].date(), wednesday);
        assert!(aggregate.breakdowns().all(|b| b.projects.is_some()));
    }

    #[test]
    fn recompute_totals_is_idempotent() {
        let members = vec![Member::new(Uuid::from_u128(1), ResourceType::Active)];
        let mut aggregate = initialize(Uuid::nil(), &members, monday(), 1, Granularity::Week, WeekStart::Monday, false);

        let key = aggregate.bucket_keys[0];
        let breakdown = aggregate.breakdown_mut(Uuid::from_u128(1), key).unwrap();
        breakdown.project_hours = Hours::from_whole(20);
        breakdown.annual_leave = Hours::from_whole(8);
        breakdown.other_leave = Hours::from_tenths(5);

        recompute_totals(&mut aggregate);
        recompute_totals(&mut aggregate);

        let breakdown = aggregate.breakdown(Uuid::from_u128(1), key).unwrap();
        assert_eq!(breakdown.total(), Hours::from_tenths(285));
    }
}
