use super::advisory::round2;
use crate::domain::agronomy::PricingTable;
use crate::domain::features::FeatureRecord;
use std::collections::BTreeMap;

/// Revenue and margin for the estimated harvest.
///
/// Returns `None` when the table has no price for the crop, so the result
/// omits the breakdown instead of reporting a zero.
pub fn breakdown(
    pricing: &PricingTable,
    record: &FeatureRecord,
    predicted_tonnes: f64,
) -> Option<BTreeMap<String, f64>> {
    let entry = pricing.lookup(record.crop_type())?;

    let revenue = predicted_tonnes * entry.price_per_tonne;
    let estimated_cost = entry.cost_per_hectare * record.farm_area();
    let net_profit = revenue - estimated_cost;

    Some(BTreeMap::from([
        ("price_per_tonne".to_string(), round2(entry.price_per_tonne)),
        ("revenue".to_string(), round2(revenue)),
        ("estimated_cost".to_string(), round2(estimated_cost)),
        ("net_profit".to_string(), round2(net_profit)),
    ]))
}
