use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use hivebase_types::prelude::{ServiceId, Tier, Timestamp};

use crate::errors::PricingError;
use crate::rates::{active_card, convert, RateCard};
use crate::usage::{Usage, UsageMoney};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
}

/// Canonical registry entry: the public, alias-resolvable service name and
/// the backend model it maps to, plus its dated cost and price tables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub service_id: ServiceId,
    pub aliases: Vec<String>,
    pub model_id: String,
    pub provider: String,
    pub required_tier: Tier,
    pub input_modalities: Vec<Modality>,
    pub output_modalities: Vec<Modality>,
    pub tools: bool,
    pub reasoning: bool,
    pub search: bool,
    /// Alternate identifier accepted by key permission allow-lists.
    pub pop_id: Option<String>,
    pub cost: Vec<RateCard>,
    pub price: Vec<RateCard>,
}

impl ServiceDefinition {
    pub fn new(service_id: &str, model_id: &str, provider: &str) -> Self {
        Self {
            service_id: ServiceId(service_id.to_string()),
            aliases: Vec::new(),
            model_id: model_id.to_string(),
            provider: provider.to_string(),
            required_tier: Tier::Anonymous,
            input_modalities: vec![Modality::Text],
            output_modalities: vec![Modality::Text],
            tools: false,
            reasoning: false,
            search: false,
            pop_id: None,
            cost: Vec::new(),
            price: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn tier(mut self, tier: Tier) -> Self {
        self.required_tier = tier;
        self
    }

    pub fn modalities(mut self, input: Vec<Modality>, output: Vec<Modality>) -> Self {
        self.input_modalities = input;
        self.output_modalities = output;
        self
    }

    pub fn tools(mut self) -> Self {
        self.tools = true;
        self
    }

    pub fn reasoning(mut self) -> Self {
        self.reasoning = true;
        self
    }

    pub fn search(mut self) -> Self {
        self.search = true;
        self
    }

    pub fn pop_id(mut self, pop: &str) -> Self {
        self.pop_id = Some(pop.to_string());
        self
    }

    pub fn cost_card(mut self, card: RateCard) -> Self {
        self.cost.push(card);
        self
    }

    pub fn price_card(mut self, card: RateCard) -> Self {
        self.price.push(card);
        self
    }

    /// Price equals cost: no margin.
    pub fn price_at_cost(mut self) -> Self {
        self.price = self.cost.clone();
        self
    }

    /// Price is cost with a multiplicative markup.
    pub fn price_markup(mut self, factor: f64) -> Self {
        self.price = self.cost.iter().map(|card| card.scaled(factor)).collect();
        self
    }

    /// The allow-list identifiers this service answers to.
    pub fn permission_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.service_id.as_str()).chain(self.pop_id.as_deref())
    }
}

/// Immutable service/pricing registry built once at process start.
pub struct ServiceRegistry {
    services: Vec<ServiceDefinition>,
    by_id: HashMap<String, usize>,
}

impl ServiceRegistry {
    pub fn new(mut services: Vec<ServiceDefinition>) -> Self {
        for service in &mut services {
            service
                .cost
                .sort_by(|a, b| b.effective_date.cmp(&a.effective_date));
            service
                .price
                .sort_by(|a, b| b.effective_date.cmp(&a.effective_date));
        }
        let by_id = services
            .iter()
            .enumerate()
            .map(|(idx, service)| (service.service_id.0.clone(), idx))
            .collect();
        Self { services, by_id }
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.services.iter()
    }

    pub fn service(&self, id: &ServiceId) -> Option<&ServiceDefinition> {
        self.by_id.get(&id.0).map(|idx| &self.services[*idx])
    }

    /// Exact id match wins; otherwise scan every alias list (case-sensitive,
    /// one flat namespace).
    pub fn resolve_service_id(&self, name: &str) -> Option<ServiceId> {
        if self.by_id.contains_key(name) {
            return Some(ServiceId(name.to_string()));
        }
        self.services
            .iter()
            .find(|service| service.aliases.iter().any(|alias| alias == name))
            .map(|service| service.service_id.clone())
    }

    /// Case-insensitive lookup by backend model id, service id, or alias,
    /// for callers holding a model name rather than a service name.
    pub fn resolve_model(&self, model_id: &str) -> Option<&ServiceDefinition> {
        let wanted = model_id.to_ascii_lowercase();
        self.services.iter().find(|service| {
            service.model_id.to_ascii_lowercase() == wanted
                || service.service_id.0.to_ascii_lowercase() == wanted
                || service
                    .aliases
                    .iter()
                    .any(|alias| alias.to_ascii_lowercase() == wanted)
        })
    }

    pub fn calculate_cost(
        &self,
        model_id: &str,
        usage: &Usage,
        now: Timestamp,
    ) -> Result<UsageMoney, PricingError> {
        let service = self
            .resolve_model(model_id)
            .ok_or_else(|| PricingError::not_found(model_id))?;
        let card = active_card(&service.cost, now)
            .ok_or_else(|| PricingError::no_active_definition(service.service_id.as_str()))?;
        convert(card, usage, service.service_id.as_str())
    }

    pub fn calculate_price(
        &self,
        service_id: &ServiceId,
        usage: &Usage,
        now: Timestamp,
    ) -> Result<UsageMoney, PricingError> {
        let service = self
            .service(service_id)
            .ok_or_else(|| PricingError::not_found(service_id.as_str()))?;
        let card = active_card(&service.price, now)
            .ok_or_else(|| PricingError::no_active_definition(service_id.as_str()))?;
        convert(card, usage, service_id.as_str())
    }

    /// Free means every rate in the active *price* card is zero. What the
    /// operator pays upstream (the cost card) does not matter here.
    pub fn is_free_service(&self, service_id: &ServiceId, now: Timestamp) -> bool {
        self.service(service_id)
            .and_then(|service| active_card(&service.price, now))
            .map(|card| card.is_all_zero())
            .unwrap_or(false)
    }
}
