use hivebase_types::prelude::{Tier, Timestamp};

use crate::rates::RateCard;
use crate::registry::{Modality, ServiceDefinition, ServiceRegistry};
use crate::usage::UsageKind;

// Rate-card generations. New cards are appended with a later date; the
// registry picks the newest one already effective.
pub const RATES_2025_01: Timestamp = Timestamp(1_735_689_600_000); // 2025-01-01
pub const RATES_2025_06: Timestamp = Timestamp(1_748_736_000_000); // 2025-06-01

fn text_card(date: Timestamp, prompt: f64, completion: f64) -> RateCard {
    RateCard::new(date)
        .rate(UsageKind::PromptTextTokens, prompt)
        .rate(UsageKind::PromptCachedTokens, prompt / 4.0)
        .rate(UsageKind::CompletionTextTokens, completion)
}

/// The stock service catalog. Rates are pollen per unit.
pub fn default_catalog() -> Vec<ServiceDefinition> {
    vec![
        ServiceDefinition::new("openai", "gpt-5-nano", "azure-openai")
            .alias("gpt-5-nano")
            .alias("openai-default")
            .tools()
            .cost_card(text_card(RATES_2025_01, 0.0000005, 0.000002))
            .price_at_cost(),
        // Loss-leader: real upstream cost, zero price.
        ServiceDefinition::new("openai-fast", "gpt-4.1-nano", "azure-openai")
            .alias("gpt-4.1-nano")
            .cost_card(text_card(RATES_2025_01, 0.0000002, 0.0000008))
            .price_card(RateCard::free(RATES_2025_01)),
        ServiceDefinition::new("openai-large", "gpt-5", "azure-openai")
            .alias("gpt-5")
            .tier(Tier::Flower)
            .tools()
            .cost_card(text_card(RATES_2025_01, 0.00000625, 0.000025))
            .cost_card(text_card(RATES_2025_06, 0.000005, 0.00002))
            .price_markup(1.25),
        // No explicit reasoning rate: reasoning tokens bill as text.
        ServiceDefinition::new("openai-reasoning", "o4-mini", "azure-openai")
            .alias("o4-mini")
            .tier(Tier::Seed)
            .reasoning()
            .cost_card(text_card(RATES_2025_01, 0.0000055, 0.000022))
            .price_at_cost(),
        ServiceDefinition::new("qwen-coder", "qwen3-coder", "scaleway")
            .alias("qwen")
            .tier(Tier::Seed)
            .tools()
            .cost_card(text_card(RATES_2025_01, 0.0000009, 0.0000036))
            .price_at_cost(),
        ServiceDefinition::new("mistral", "mistral-small", "scaleway")
            .alias("mistral-small")
            .search()
            .cost_card(text_card(RATES_2025_01, 0.0000004, 0.0000012))
            .price_at_cost(),
        ServiceDefinition::new("flux", "flux-schnell", "cloudflare")
            .alias("flux-dev")
            .pop_id("flux-pop")
            .modalities(vec![Modality::Text], vec![Modality::Image])
            .cost_card(
                RateCard::new(RATES_2025_01)
                    .rate(UsageKind::PromptTextTokens, 0.0000002)
                    .rate(UsageKind::CompletionImageTokens, 0.00003),
            )
            .price_at_cost(),
        ServiceDefinition::new("turbo", "sdxl-turbo", "cloudflare")
            .tier(Tier::Seed)
            .modalities(vec![Modality::Text], vec![Modality::Image])
            .cost_card(
                RateCard::new(RATES_2025_01)
                    .rate(UsageKind::PromptTextTokens, 0.0000002)
                    .rate(UsageKind::CompletionImageTokens, 0.00006),
            )
            .price_at_cost(),
        ServiceDefinition::new("openai-audio", "gpt-4o-mini-audio", "azure-openai")
            .alias("gpt-4o-mini-audio")
            .tier(Tier::Seed)
            .modalities(
                vec![Modality::Text, Modality::Audio],
                vec![Modality::Text, Modality::Audio],
            )
            .cost_card(
                text_card(RATES_2025_01, 0.0000006, 0.0000024)
                    .rate(UsageKind::PromptAudioTokens, 0.00001)
                    .rate(UsageKind::CompletionAudioTokens, 0.00002),
            )
            .price_at_cost(),
        ServiceDefinition::new("veo", "veo-3", "vertex-ai")
            .alias("veo-3")
            .tier(Tier::Nectar)
            .modalities(vec![Modality::Text], vec![Modality::Video])
            .cost_card(
                RateCard::new(RATES_2025_01)
                    .rate(UsageKind::PromptTextTokens, 0.000002)
                    .rate(UsageKind::CompletionVideoSeconds, 0.04)
                    .rate(UsageKind::CompletionVideoTokens, 0.00002),
            )
            .cost_card(
                RateCard::new(RATES_2025_06)
                    .rate(UsageKind::PromptTextTokens, 0.000002)
                    .rate(UsageKind::CompletionVideoSeconds, 0.025)
                    .rate(UsageKind::CompletionVideoTokens, 0.0000125),
            )
            .price_markup(1.2),
    ]
}

impl ServiceRegistry {
    pub fn with_default_catalog() -> Self {
        ServiceRegistry::new(default_catalog())
    }
}
