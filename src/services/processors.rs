// src/services/processors.rs

//! Processadores de fonte: cada um dobra suas linhas no agregado, convertendo
//! o período nativo da fonte (ponto diário, intervalo, ponto semanal) para a
//! granularidade dos buckets. Cada um escreve só no seu campo do breakdown,
//! então a ordem entre eles não importa.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    common::{
        dates::{self, Granularity},
        hours::Hours,
    },
    models::{
        allocation::AllocationRow,
        leave::{AnnualLeave, OfficeHoliday, OtherLeave},
        members::Member,
        settings::WorkloadSettings,
        workload::{Aggregate, SourceKind},
    },
};

/// Unidade da distribuição semanal -> diária: uma hora inteira.
pub const DISTRIBUTION_UNIT: Hours = Hours::ONE;

// ---
// Contexto compartilhado pelos processadores
// ---
pub struct ProcessingContext<'a> {
    pub settings: &'a WorkloadSettings,
    members: Vec<&'a Member>,
    by_id: HashMap<Uuid, &'a Member>,
}

impl<'a> ProcessingContext<'a> {
    pub fn new(settings: &'a WorkloadSettings, members: &'a [Member]) -> Self {
        Self {
            settings,
            members: members.iter().collect(),
            by_id: members.iter().map(|m| (m.id, m)).collect(),
        }
    }

    pub fn member(&self, id: Uuid) -> Option<&'a Member> {
        self.by_id.get(&id).copied()
    }
}

// Contadores locais, somados no diagnóstico ao final de cada processador
#[derive(Default)]
struct Tally {
    out_of_window: u32,
    unknown_member: u32,
}

impl Tally {
    fn flush(self, aggregate: &mut Aggregate, source: SourceKind) {
        if self.out_of_window > 0 || self.unknown_member > 0 {
            tracing::debug!(
                %source,
                out_of_window = self.out_of_window,
                unknown_member = self.unknown_member,
                "Contribuições descartadas"
            );
        }
        aggregate.diagnostics.out_of_window += self.out_of_window;
        aggregate.diagnostics.unknown_member += self.unknown_member;
    }
}

// =========================================================================
//  1. ALOCAÇÕES DE PROJETO (ponto diário)
// =========================================================================

pub fn process_allocations(ctx: &ProcessingContext<'_>, rows: &[AllocationRow], aggregate: &mut Aggregate) {
    let mut tally = Tally::default();

    for row in rows {
        let member = match ctx.member(row.resource_id) {
            Some(m) if m.resource_type == row.resource_type => m,
            _ => {
                tally.unknown_member += 1;
                continue;
            }
        };

        let key = aggregate.bucket_for(row.allocation_date);
        let Some(breakdown) = aggregate.breakdown_mut(member.id, key) else {
            tally.out_of_window += 1;
            continue;
        };

        breakdown.project_hours += row.hours;
        breakdown.add_project(
            row.project_id,
            row.project_name.as_deref(),
            row.project_code.as_deref(),
            row.hours,
        );
    }

    tally.flush(aggregate, SourceKind::ProjectAllocations);
}

// =========================================================================
//  2. FÉRIAS (ponto diário)
// =========================================================================

pub fn process_annual_leave(ctx: &ProcessingContext<'_>, rows: &[AnnualLeave], aggregate: &mut Aggregate) {
    let mut tally = Tally::default();

    for leave in rows {
        if ctx.member(leave.member_id).is_none() {
            tally.unknown_member += 1;
            continue;
        }

        // Na granularidade semanal o dia é levado à chave da semana
        let key = aggregate.bucket_for(leave.leave_date);
        match aggregate.breakdown_mut(leave.member_id, key) {
            Some(breakdown) => breakdown.annual_leave += leave.hours,
            None => tally.out_of_window += 1,
        }
    }

    tally.flush(aggregate, SourceKind::AnnualLeave);
}

// =========================================================================
//  3. FERIADOS (intervalo -> dias úteis -> todos os membros no escopo)
// =========================================================================

pub fn process_office_holidays(ctx: &ProcessingContext<'_>, rows: &[OfficeHoliday], aggregate: &mut Aggregate) {
    let mut tally = Tally::default();
    let settings = ctx.settings;

    for holiday in rows {
        for day in dates::expand_range(holiday.holiday_date, holiday.last_day()) {
            if !dates::is_working_day(day, &settings.working_days) {
                continue;
            }

            let key = aggregate.bucket_for(day);
            if !aggregate.contains_bucket(&key) {
                tally.out_of_window += 1;
                continue;
            }

            // Feriado é dado da empresa/local: o mesmo dia cheio vai para cada membro
            for member in &ctx.members {
                if !holiday.applies_to(member.location.as_deref()) {
                    continue;
                }
                let full_day = settings.daily_capacity(member.capacity(settings));
                if let Some(breakdown) = aggregate.breakdown_mut(member.id, key) {
                    breakdown.office_holidays += full_day;
                }
            }
        }
    }

    tally.flush(aggregate, SourceKind::OfficeHolidays);
}

// =========================================================================
//  4. OUTRAS LICENÇAS (ponto semanal)
// =========================================================================

pub fn process_other_leave(ctx: &ProcessingContext<'_>, rows: &[OtherLeave], aggregate: &mut Aggregate) {
    let mut tally = Tally::default();

    for leave in rows {
        if ctx.member(leave.member_id).is_none() {
            tally.unknown_member += 1;
            continue;
        }

        match aggregate.granularity {
            Granularity::Week => {
                let key = aggregate.bucket_for(leave.week_start_date);
                match aggregate.breakdown_mut(leave.member_id, key) {
                    Some(breakdown) => breakdown.other_leave += leave.hours,
                    None => tally.out_of_window += 1,
                }
            }
            Granularity::Day => {
                let days = dates::working_days_of_week(leave.week_start_date, &ctx.settings.working_days);
                if days.is_empty() {
                    tracing::warn!(
                        member_id = %leave.member_id,
                        week = %leave.week_start_date,
                        "Semana sem dias úteis; licença descartada"
                    );
                    tally.out_of_window += 1;
                    continue;
                }

                let shares = distribute(leave.hours, days.len());
                for (day, share) in days.into_iter().zip(shares) {
                    match aggregate.breakdown_mut(leave.member_id, dates::day_key(day)) {
                        Some(breakdown) => breakdown.other_leave += share,
                        None => tally.out_of_window += 1,
                    }
                }
            }
        }
    }

    tally.flush(aggregate, SourceKind::OtherLeave);
}

/// Distribui `total` em `parts` partes sem perda.
///
/// As horas inteiras são divididas com `base = H / n` e `resto = H mod n`;
/// as primeiras `resto` partes recebem uma hora a mais. A fração abaixo de
/// uma hora fica na primeira parte. A soma das partes é sempre `total`.
pub fn distribute(total: Hours, parts: usize) -> Vec<Hours> {
    if parts == 0 {
        return Vec::new();
    }

    let n = parts as i64;
    let unit = DISTRIBUTION_UNIT.tenths();
    let whole_units = total.tenths().div_euclid(unit);
    let residue = total.tenths().rem_euclid(unit);

    let base = whole_units.div_euclid(n);
    let remainder = whole_units.rem_euclid(n);

    (0..n)
        .map(|i| {
            let units = base + i64::from(i < remainder);
            let extra = if i == 0 { residue } else { 0 };
            Hours::from_tenths(units * unit + extra)
        })
        .collect()
}
