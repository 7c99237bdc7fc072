// src/services/allocation_input.rs

//! Controle de uma célula editável da grade de alocação.
//!
//! `Idle -> Editing -> Saving -> Idle`, ou `Saving -> Error -> Editing`
//! quando a gravação falha. A célula não faz I/O: `commit` devolve o
//! payload que o chamador envia ao caminho de escrita, e `complete_save`
//! recebe o resultado.

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    common::{
        dates::{BucketKey, Granularity},
        hours::Hours,
    },
    models::{
        allocation::SaveAllocationPayload,
        members::ResourceType,
        settings::{DisplayUnit, WorkloadSettings},
        workload::Aggregate,
    },
};

// Casas decimais do percentual exibido
const PERCENT_SCALE: u32 = 2;

// ---
// Conversão de unidade (pura e reversível)
// ---

/// Horas canônicas -> número exibido na unidade ativa.
pub fn to_display(hours: Hours, capacity: Hours, unit: DisplayUnit) -> Decimal {
    match unit {
        DisplayUnit::Hours => hours.to_decimal(),
        DisplayUnit::Percentage => {
            if !capacity.is_positive() {
                return Decimal::ZERO;
            }
            (Decimal::from(hours.tenths()) * Decimal::ONE_HUNDRED / Decimal::from(capacity.tenths()))
                .round_dp_with_strategy(PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero)
                .normalize()
        }
    }
}

/// Número exibido -> horas canônicas (arredondadas ao décimo).
/// Valores grandes demais param em `Hours::LIMIT`.
pub fn to_hours(display: Decimal, capacity: Hours, unit: DisplayUnit) -> Hours {
    let hours = match unit {
        DisplayUnit::Hours => Some(display),
        DisplayUnit::Percentage => display
            .checked_mul(capacity.to_decimal())
            .map(|scaled| scaled / Decimal::ONE_HUNDRED),
    };

    hours
        .and_then(Hours::from_decimal)
        .map_or(Hours::LIMIT, |h| h.min(Hours::LIMIT))
}

/// Lê o texto digitado. Texto não numérico ou negativo vira zero.
pub fn parse_input(text: &str) -> Decimal {
    let cleaned = text.trim().trim_end_matches('%').trim().replace(',', ".");
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    match cleaned.parse::<Decimal>() {
        Ok(value) if value.is_sign_positive() => value,
        _ => Decimal::ZERO,
    }
}

fn format_display(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Capacidade de um bucket: a semanal, ou um dia cheio na grade diária.
pub fn bucket_capacity(member_capacity: Hours, granularity: Granularity, settings: &WorkloadSettings) -> Hours {
    match granularity {
        Granularity::Week => member_capacity,
        Granularity::Day => settings.daily_capacity(member_capacity),
    }
}

// ---
// Estado da célula
// ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellPhase {
    Idle,
    Editing,
    Saving,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub phase: CellPhase,
    // Último valor persistido conhecido
    pub committed: Hours,
    pub draft: String,
    // Valor em voo enquanto Saving
    pub pending: Option<Hours>,
}

impl EditState {
    pub fn idle(committed: Hours) -> Self {
        Self {
            phase: CellPhase::Idle,
            committed,
            draft: String::new(),
            pending: None,
        }
    }
}

/// Reconciliação entre o estado local e o valor vindo do servidor.
///
/// Enquanto a célula edita ou grava, o valor local manda; parada ou em
/// erro, o remoto substitui o último valor conhecido.
pub fn merge(local: EditState, remote: Hours) -> EditState {
    match local.phase {
        CellPhase::Editing | CellPhase::Saving => local,
        CellPhase::Idle | CellPhase::Error(_) => EditState {
            committed: remote,
            draft: String::new(),
            pending: None,
            ..local
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn offset(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAddress {
    pub resource_id: Uuid,
    pub resource_type: ResourceType,
    pub project_id: Uuid,
    pub bucket: BucketKey,
    pub granularity: Granularity,
}

#[derive(Debug, Clone)]
pub struct AllocationCell {
    address: CellAddress,
    capacity: Hours,
    unit: DisplayUnit,
    state: EditState,
}

impl AllocationCell {
    pub fn new(address: CellAddress, persisted: Hours, capacity: Hours, unit: DisplayUnit) -> Self {
        Self {
            address,
            capacity,
            unit,
            state: EditState::idle(persisted),
        }
    }

    pub fn phase(&self) -> &CellPhase {
        &self.state.phase
    }

    // Célula gravando não aceita nova edição
    pub fn is_disabled(&self) -> bool {
        self.state.phase == CellPhase::Saving
    }

    /// Texto mostrado: o rascunho durante a edição, senão o valor persistido.
    pub fn display(&self) -> String {
        match self.state.phase {
            CellPhase::Editing => self.state.draft.clone(),
            _ => self.committed_text(),
        }
    }

    fn committed_text(&self) -> String {
        format_display(to_display(self.state.committed, self.capacity, self.unit))
    }

    pub fn focus(&mut self) {
        match self.state.phase {
            CellPhase::Idle | CellPhase::Error(_) => {
                self.state.draft = self.committed_text();
                self.state.phase = CellPhase::Editing;
            }
            CellPhase::Editing | CellPhase::Saving => {}
        }
    }

    pub fn input(&mut self, text: &str) {
        if self.state.phase == CellPhase::Editing {
            self.state.draft = text.to_string();
        }
    }

    /// Seta esquerda/direita: o foco vai para o bucket vizinho sem gravar.
    /// O rascunho é descartado.
    pub fn navigate(&mut self, direction: Direction) -> i32 {
        if self.state.phase == CellPhase::Editing {
            self.state.draft.clear();
            self.state.phase = CellPhase::Idle;
        }
        direction.offset()
    }

    /// Blur/Enter. Devolve o payload a gravar, ou `None` quando não há o que
    /// gravar (valor igual, ou célula fora de edição).
    pub fn commit(&mut self) -> Option<SaveAllocationPayload> {
        if self.state.phase != CellPhase::Editing {
            return None;
        }

        let hours = to_hours(parse_input(&self.state.draft), self.capacity, self.unit).max_zero();
        self.state.draft.clear();

        if hours == self.state.committed {
            self.state.phase = CellPhase::Idle;
            return None;
        }

        self.state.phase = CellPhase::Saving;
        self.state.pending = Some(hours);

        Some(SaveAllocationPayload {
            resource_id: self.address.resource_id,
            resource_type: self.address.resource_type,
            project_id: self.address.project_id,
            bucket_date: self.address.bucket.to_string(),
            hours,
            granularity: self.address.granularity,
        })
    }

    /// Resultado da gravação. Em sucesso devolve `(anterior, novo)` para o
    /// chamador atualizar o agregado; em falha a célula volta ao último
    /// valor bom e guarda a mensagem.
    pub fn complete_save(&mut self, result: Result<(), String>) -> Option<(Hours, Hours)> {
        if self.state.phase != CellPhase::Saving {
            return None;
        }
        let pending = self.state.pending.take()?;

        match result {
            Ok(()) => {
                let previous = self.state.committed;
                self.state.committed = pending;
                self.state.phase = CellPhase::Idle;
                Some((previous, pending))
            }
            Err(message) => {
                tracing::debug!(bucket = %self.address.bucket, %message, "Gravação da célula falhou");
                self.state.phase = CellPhase::Error(message);
                None
            }
        }
    }

    /// Aplica o valor autoritativo vindo de um novo agregado.
    pub fn reconcile(&mut self, remote: Hours) {
        self.state = merge(self.state.clone(), remote);
    }
}

// ---
// Leitura e atualização do agregado a partir de uma célula
// ---

/// Valor autoritativo da célula num agregado itemizado.
pub fn remote_hours(aggregate: &Aggregate, member_id: Uuid, project_id: Uuid, bucket: BucketKey) -> Hours {
    aggregate
        .breakdown(member_id, bucket)
        .and_then(|b| b.project(project_id))
        .map(|p| p.hours)
        .unwrap_or(Hours::ZERO)
}

/// Aplica uma gravação bem sucedida ao agregado já carregado, sem refazer
/// a agregação: ajusta o projeto, as horas de projeto e o total do bucket.
pub fn apply_saved(
    aggregate: &mut Aggregate,
    address: &CellAddress,
    previous: Hours,
    saved: Hours,
) -> bool {
    let Some(breakdown) = aggregate.breakdown_mut(address.resource_id, address.bucket) else {
        return false;
    };

    let delta = saved - previous;
    breakdown.project_hours = (breakdown.project_hours + delta).max_zero();
    breakdown.add_project(address.project_id, None, None, delta);
    if let Some(projects) = breakdown.projects.as_mut() {
        projects.retain(|p| p.hours.is_positive());
    }
    breakdown.refresh_total();
    true
}
