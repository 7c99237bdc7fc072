// src/services/utilization.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::common::hours::Hours;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationStatus {
    Empty,
    Low,
    Optimal,
    High,
    Over,
}

impl UtilizationStatus {
    pub fn from_percentage(percentage: i64) -> Self {
        match percentage {
            p if p > 100 => UtilizationStatus::Over,
            100 => UtilizationStatus::High,
            50..=99 => UtilizationStatus::Optimal,
            _ => UtilizationStatus::Low,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            UtilizationStatus::Empty => "#9ca3af",
            UtilizationStatus::Low => "#3b82f6",
            UtilizationStatus::Optimal => "#22c55e",
            UtilizationStatus::High => "#f59e0b",
            UtilizationStatus::Over => "#ef4444",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            UtilizationStatus::Empty => "utilization-empty",
            UtilizationStatus::Low => "utilization-low",
            UtilizationStatus::Optimal => "utilization-optimal",
            UtilizationStatus::High => "utilization-high",
            UtilizationStatus::Over => "utilization-over",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UtilizationStatus::Empty => "Sem capacidade",
            UtilizationStatus::Low => "Baixa",
            UtilizationStatus::Optimal => "Ideal",
            UtilizationStatus::High => "Cheia",
            UtilizationStatus::Over => "Sobrecarga",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Utilization {
    #[schema(example = 70)]
    pub percentage: i64,
    pub status: UtilizationStatus,
    #[schema(example = "#22c55e")]
    pub color: String,
    #[schema(example = "utilization-optimal")]
    pub css_class: String,
    #[schema(example = "Ideal")]
    pub label: String,
}

/// `round(100 * horas / capacidade)`, meio arredondado para cima.
/// Capacidade zero (ou negativa) dá 0%.
pub fn percentage(hours: Hours, capacity: Hours) -> i64 {
    let c = i128::from(capacity.tenths());
    if c <= 0 {
        return 0;
    }
    let h = i128::from(hours.tenths().max(0));
    i64::try_from((200 * h + c) / (2 * c)).unwrap_or(i64::MAX)
}

/// Classificação única usada por todas as telas.
pub fn classify(hours: Hours, capacity: Hours) -> Utilization {
    let (percentage, status) = if capacity.is_positive() {
        let p = percentage(hours, capacity);
        (p, UtilizationStatus::from_percentage(p))
    } else {
        (0, UtilizationStatus::Empty)
    };

    Utilization {
        percentage,
        status,
        color: status.color().to_string(),
        css_class: status.css_class().to_string(),
        label: status.label().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(whole: i64) -> Hours {
        Hours::from_whole(whole)
    }

    #[test]
    fn boundaries_around_full_capacity() {
        assert_eq!(classify(h(0), h(40)).status, UtilizationStatus::Low);
        assert_eq!(classify(h(0), h(40)).percentage, 0);

        let full = classify(h(40), h(40));
        assert_eq!((full.percentage, full.status), (100, UtilizationStatus::High));

        let over = classify(h(41), h(40));
        assert_eq!(over.percentage, 103);
        assert_eq!(over.status, UtilizationStatus::Over);
    }

    #[test]
    fn optimal_band_starts_at_half() {
        assert_eq!(classify(h(20), h(40)).status, UtilizationStatus::Optimal);
        assert_eq!(classify(h(28), h(40)).percentage, 70);
        assert_eq!(classify(Hours::from_tenths(195), h(40)).status, UtilizationStatus::Low);
    }

    #[test]
    fn banding_uses_rounded_percentage() {
        // 39.9 / 40 = 99.75% -> 100% -> cheia
        let almost = classify(Hours::from_tenths(399), h(40));
        assert_eq!(almost.percentage, 100);
        assert_eq!(almost.status, UtilizationStatus::High);
    }

    #[test]
    fn zero_capacity_is_empty() {
        let u = classify(h(8), Hours::ZERO);
        assert_eq!(u.percentage, 0);
        assert_eq!(u.status, UtilizationStatus::Empty);
        assert_eq!(u.css_class, "utilization-empty");
    }

    #[test]
    fn extreme_hours_do_not_overflow() {
        let u = classify(Hours::from_tenths(i64::MAX), Hours::ONE);
        assert_eq!(u.status, UtilizationStatus::Over);
        assert_eq!(u.percentage, i64::MAX);

        let u = classify(Hours::from_tenths(i64::MAX), Hours::from_tenths(i64::MAX));
        assert_eq!((u.percentage, u.status), (100, UtilizationStatus::High));
    }
}
