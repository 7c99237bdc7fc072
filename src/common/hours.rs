// src/common/hours.rs

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
use sqlx::{Decode, Encode, Postgres, Type};

/// Menor unidade armazenada: décimos de hora.
pub const TENTHS_PER_HOUR: i64 = 10;

/// Quantidade de horas em ponto fixo (décimos de hora).
///
/// Toda a aritmética do motor de agregação passa por aqui, então somas e
/// distribuições nunca sofrem deriva de ponto flutuante. No banco as horas
/// ficam em `NUMERIC(6,1)` e a conversão passa por `Decimal`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hours(i64);

impl Hours {
    pub const ZERO: Hours = Hours(0);
    pub const ONE: Hours = Hours(TENTHS_PER_HOUR);
    /// Maior valor que cabe numa coluna `NUMERIC(6,1)`.
    pub const LIMIT: Hours = Hours(99_999);

    pub const fn from_tenths(tenths: i64) -> Self {
        Hours(tenths)
    }

    pub const fn from_whole(hours: i64) -> Self {
        Hours(hours * TENTHS_PER_HOUR)
    }

    pub const fn tenths(self) -> i64 {
        self.0
    }

    /// Converte um decimal, arredondando ao décimo (meio para longe do zero).
    /// `None` quando o valor não cabe em décimos de hora.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        value
            .checked_mul(Decimal::from(TENTHS_PER_HOUR))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Hours)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 1).normalize()
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn max_zero(self) -> Self {
        Hours(self.0.max(0))
    }

    /// Divide por um inteiro, arredondando ao décimo mais próximo.
    /// Divisor zero ou negativo resulta em zero.
    pub fn div_round(self, divisor: i64) -> Hours {
        if divisor <= 0 {
            return Hours::ZERO;
        }
        let doubled = 2 * i128::from(self.0);
        let divisor = i128::from(divisor);
        let rounded = if doubled >= 0 {
            (doubled + divisor) / (2 * divisor)
        } else {
            (doubled - divisor) / (2 * divisor)
        };
        // |resultado| <= |self|, sempre cabe
        Hours(rounded as i64)
    }
}

impl Add for Hours {
    type Output = Hours;

    fn add(self, rhs: Hours) -> Hours {
        Hours(self.0 + rhs.0)
    }
}

impl AddAssign for Hours {
    fn add_assign(&mut self, rhs: Hours) {
        self.0 += rhs.0;
    }
}

impl Sub for Hours {
    type Output = Hours;

    fn sub(self, rhs: Hours) -> Hours {
        Hours(self.0 - rhs.0)
    }
}

impl Sum for Hours {
    fn sum<I: Iterator<Item = Hours>>(iter: I) -> Hours {
        iter.fold(Hours::ZERO, Add::add)
    }
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

// No JSON as horas viajam como número simples (20, 4.5).
impl Serialize for Hours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Hours {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Hours::from_decimal(value)
            .ok_or_else(|| serde::de::Error::custom(format!("horas fora do intervalo: {value}")))
    }
}

// No banco: NUMERIC, via Decimal.
impl Type<Postgres> for Hours {
    fn type_info() -> PgTypeInfo {
        <Decimal as Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Hours {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <Decimal as Decode<'r, Postgres>>::decode(value)?;
        Hours::from_decimal(raw).ok_or_else(|| format!("NUMERIC fora do intervalo: {raw}").into())
    }
}

impl Encode<'_, Postgres> for Hours {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        <Decimal as Encode<'_, Postgres>>::encode_by_ref(&self.to_decimal(), buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn from_decimal_rounds_to_tenths() {
        assert_eq!(Hours::from_decimal(Decimal::from_str("4.25").unwrap()), Some(Hours::from_tenths(43)));
        assert_eq!(Hours::from_decimal(Decimal::from_str("4.24").unwrap()), Some(Hours::from_tenths(42)));
        assert_eq!(Hours::from_decimal(Decimal::from(8)), Some(Hours::from_whole(8)));
    }

    #[test]
    fn from_decimal_rejects_values_that_do_not_fit() {
        assert_eq!(Hours::from_decimal(Decimal::MAX), None);
        assert_eq!(Hours::from_decimal(Decimal::from(i64::MAX)), None);
        assert_eq!(Hours::from_decimal(Decimal::from(i64::MIN)), None);
    }

    #[test]
    fn div_round_does_not_overflow_near_the_edges() {
        assert_eq!(Hours::from_tenths(i64::MAX).div_round(1), Hours::from_tenths(i64::MAX));
        assert_eq!(Hours::from_tenths(i64::MIN + 1).div_round(1), Hours::from_tenths(i64::MIN + 1));
    }

    #[test]
    fn to_decimal_is_normalized() {
        assert_eq!(Hours::from_whole(20).to_decimal().to_string(), "20");
        assert_eq!(Hours::from_tenths(45).to_string(), "4.5");
    }

    #[test]
    fn div_round_rounds_half_up() {
        // 40h / 5 dias = 8h
        assert_eq!(Hours::from_whole(40).div_round(5), Hours::from_whole(8));
        // 40h / 6 dias = 6,666.. -> 6,7
        assert_eq!(Hours::from_whole(40).div_round(6), Hours::from_tenths(67));
        assert_eq!(Hours::from_whole(40).div_round(0), Hours::ZERO);
    }

    #[test]
    fn sum_of_hours() {
        let total: Hours = [Hours::from_whole(4), Hours::from_tenths(5), Hours::ONE]
            .into_iter()
            .sum();
        assert_eq!(total, Hours::from_tenths(55));
    }

    #[test]
    fn serde_uses_plain_numbers() {
        let json = serde_json::to_string(&Hours::from_tenths(45)).unwrap();
        assert_eq!(json, "4.5");

        let parsed: Hours = serde_json::from_str("20").unwrap();
        assert_eq!(parsed, Hours::from_whole(20));

        let parsed: Hours = serde_json::from_str("4.5").unwrap();
        assert_eq!(parsed, Hours::from_tenths(45));
    }

    #[test]
    fn huge_json_number_is_a_deserialization_error() {
        assert!(serde_json::from_str::<Hours>("1e28").is_err());
        assert!(serde_json::from_str::<Hours>("1e20").is_err());
    }
}
