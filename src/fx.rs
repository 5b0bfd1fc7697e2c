//! Currency normalization against a USD base unit.
//!
//! Rates are an injected, versioned table rather than a hardcoded global,
//! so updates ship as configuration. Conversion is pure and deterministic;
//! nothing here touches the network.

use crate::error::{AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Decimal places carried on monetary amounts (matches NUMERIC(20, 6))
pub const MONEY_SCALE: u32 = 6;

/// Versioned exchange-rate table: USD value of one unit of each currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    pub version: u32,
    usd_per_unit: HashMap<String, Decimal>,
}

impl RateTable {
    /// Built-in table used when no override file is configured.
    pub fn builtin() -> Self {
        let mut usd_per_unit = HashMap::new();
        usd_per_unit.insert("USD".to_string(), Decimal::ONE);
        usd_per_unit.insert("EUR".to_string(), Decimal::new(109, 2)); // 1.09
        usd_per_unit.insert("GBP".to_string(), Decimal::new(127, 2)); // 1.27
        usd_per_unit.insert("CAD".to_string(), Decimal::new(73, 2)); // 0.73
        usd_per_unit.insert("AUD".to_string(), Decimal::new(66, 2)); // 0.66
        usd_per_unit.insert("CHF".to_string(), Decimal::new(113, 2)); // 1.13
        usd_per_unit.insert("NGN".to_string(), Decimal::new(65, 5)); // 0.00065
        usd_per_unit.insert("GHS".to_string(), Decimal::new(64, 3)); // 0.064

        Self {
            version: 1,
            usd_per_unit,
        }
    }

    /// Load a table from a JSON file of the shape
    /// `{"version": 2, "usd_per_unit": {"USD": "1", ...}}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("failed to read rate table: {}", e)))?;
        let table: RateTable = serde_json::from_str(&raw)?;

        if table.usd_per_unit.is_empty() {
            return Err(AppError::Config("rate table has no currencies".to_string()));
        }
        for (currency, rate) in &table.usd_per_unit {
            if *rate <= Decimal::ZERO {
                return Err(AppError::Config(format!(
                    "rate for {} must be positive, got {}",
                    currency, rate
                )));
            }
        }

        Ok(table.normalized())
    }

    fn normalized(self) -> Self {
        Self {
            version: self.version,
            usd_per_unit: self
                .usd_per_unit
                .into_iter()
                .map(|(k, v)| (k.to_uppercase(), v))
                .collect(),
        }
    }

    fn rate(&self, currency: &str) -> Option<Decimal> {
        self.usd_per_unit.get(&currency.to_uppercase()).copied()
    }
}

/// Pure converter between native currency amounts and the USD base unit.
#[derive(Clone)]
pub struct CurrencyConverter {
    table: Arc<RateTable>,
}

impl CurrencyConverter {
    pub fn new(table: RateTable) -> Self {
        Self {
            table: Arc::new(table.normalized()),
        }
    }

    pub fn table_version(&self) -> u32 {
        self.table.version
    }

    pub fn is_supported(&self, currency: &str) -> bool {
        self.table.rate(currency).is_some()
    }

    pub fn supported_currencies(&self) -> Vec<String> {
        let mut currencies: Vec<String> = self.table.usd_per_unit.keys().cloned().collect();
        currencies.sort();
        currencies
    }

    /// Convert a native-currency amount to USD.
    pub fn to_base(&self, amount: Decimal, currency: &str) -> AppResult<Decimal> {
        let rate = self
            .table
            .rate(currency)
            .ok_or_else(|| AppError::UnknownCurrency(currency.to_string()))?;
        Ok((amount * rate).round_dp(MONEY_SCALE))
    }

    /// Convert a USD amount back to a native currency.
    pub fn from_base(&self, usd_amount: Decimal, currency: &str) -> AppResult<Decimal> {
        let rate = self
            .table
            .rate(currency)
            .ok_or_else(|| AppError::UnknownCurrency(currency.to_string()))?;
        Ok((usd_amount / rate).round_dp(MONEY_SCALE))
    }
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(RateTable::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_trip_all_supported_currencies() {
        let fx = CurrencyConverter::default();
        let tolerance = dec!(0.000001);

        for currency in fx.supported_currencies() {
            let base = fx.to_base(dec!(100), &currency).unwrap();
            let back = fx.from_base(base, &currency).unwrap();
            assert!(
                (back - dec!(100)).abs() <= tolerance,
                "{currency}: round trip gave {back}"
            );
        }
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let fx = CurrencyConverter::default();
        let err = fx.to_base(dec!(10), "XYZ").unwrap_err();
        assert!(matches!(err, AppError::UnknownCurrency(c) if c == "XYZ"));
    }

    #[test]
    fn test_currency_codes_case_insensitive() {
        let fx = CurrencyConverter::default();
        assert_eq!(
            fx.to_base(dec!(100), "eur").unwrap(),
            fx.to_base(dec!(100), "EUR").unwrap()
        );
    }

    #[test]
    fn test_usd_is_identity() {
        let fx = CurrencyConverter::default();
        assert_eq!(fx.to_base(dec!(42.5), "USD").unwrap(), dec!(42.5));
        assert_eq!(fx.from_base(dec!(42.5), "USD").unwrap(), dec!(42.5));
    }
}
