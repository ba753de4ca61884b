// Crop and soil catalogue with the agronomic policy tables
pub mod crop;

// Market prices and cultivation costs
pub mod pricing;

pub use crop::{CropDetails, CropProfile, CropType, SoilFit, SoilType};
pub use pricing::{CropPricing, PricingTable};
