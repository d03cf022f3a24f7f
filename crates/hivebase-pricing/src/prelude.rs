pub use crate::catalog::{default_catalog, RATES_2025_01, RATES_2025_06};
pub use crate::errors::PricingError;
pub use crate::money::{from_micro_pollen, round8, to_micro_pollen};
pub use crate::rates::{active_card, convert, RateCard};
pub use crate::registry::{Modality, ServiceDefinition, ServiceRegistry};
pub use crate::usage::{Usage, UsageKind, UsageMoney};
