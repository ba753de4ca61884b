use super::crop::CropType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Market price and cultivation cost for one crop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropPricing {
    pub price_per_tonne: f64,
    pub cost_per_hectare: f64,
}

/// Lookup table backing the profitability breakdown.
///
/// A crop without an entry simply gets no breakdown; callers must not treat
/// a missing price as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingTable {
    entries: HashMap<CropType, CropPricing>,
}

impl PricingTable {
    pub fn new(entries: HashMap<CropType, CropPricing>) -> Self {
        Self { entries }
    }

    /// Built-in prices (INR) used when no table file is configured.
    pub fn builtin() -> Self {
        let entries = [
            (CropType::Rice, 25_000.0, 45_000.0),
            (CropType::Wheat, 22_000.0, 35_000.0),
            (CropType::Maize, 18_000.0, 30_000.0),
            (CropType::Cotton, 65_000.0, 50_000.0),
            (CropType::Sugarcane, 3_500.0, 90_000.0),
        ]
        .into_iter()
        .map(|(crop, price_per_tonne, cost_per_hectare)| {
            (
                crop,
                CropPricing {
                    price_per_tonne,
                    cost_per_hectare,
                },
            )
        })
        .collect();

        Self { entries }
    }

    /// Load a table from a JSON object keyed by crop name.
    ///
    /// ```json
    /// { "Wheat": { "price_per_tonne": 22000, "cost_per_hectare": 35000 } }
    /// ```
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pricing table {:?}", path))?;
        Self::from_json_str(&raw).with_context(|| format!("Invalid pricing table {:?}", path))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let parsed: BTreeMap<String, CropPricing> = serde_json::from_str(raw)?;
        let mut entries = HashMap::with_capacity(parsed.len());
        for (name, pricing) in parsed {
            let crop = name
                .parse::<CropType>()
                .map_err(|e| anyhow::anyhow!("Unknown crop '{}' in pricing table: {}", name, e))?;
            if !pricing.price_per_tonne.is_finite() || pricing.price_per_tonne < 0.0 {
                anyhow::bail!("Negative or non-finite price for {}", crop);
            }
            if !pricing.cost_per_hectare.is_finite() || pricing.cost_per_hectare < 0.0 {
                anyhow::bail!("Negative or non-finite cost for {}", crop);
            }
            entries.insert(crop, pricing);
        }
        Ok(Self { entries })
    }

    pub fn lookup(&self, crop: CropType) -> Option<&CropPricing> {
        self.entries.get(&crop)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_crop() {
        let table = PricingTable::builtin();
        for crop in CropType::ALL {
            assert!(table.lookup(crop).is_some(), "missing price for {}", crop);
        }
    }

    #[test]
    fn test_partial_table_from_json() {
        let table = PricingTable::from_json_str(
            r#"{"rice": {"price_per_tonne": 30000, "cost_per_hectare": 40000}}"#,
        )
        .expect("valid table");
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(CropType::Rice).unwrap().price_per_tonne, 30000.0);
        assert!(table.lookup(CropType::Wheat).is_none());
    }

    #[test]
    fn test_rejects_unknown_crop_and_negative_price() {
        assert!(PricingTable::from_json_str(
            r#"{"Barley": {"price_per_tonne": 1, "cost_per_hectare": 1}}"#
        )
        .is_err());
        assert!(PricingTable::from_json_str(
            r#"{"Wheat": {"price_per_tonne": -5, "cost_per_hectare": 1}}"#
        )
        .is_err());
    }
}
