use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Billable usage dimensions reported by backend calls. Prompt kinds cover
/// what the caller sent, completion kinds what the model produced.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    PromptTextTokens,
    PromptCachedTokens,
    PromptAudioTokens,
    PromptImageTokens,
    CompletionTextTokens,
    CompletionReasoningTokens,
    CompletionAudioTokens,
    CompletionImageTokens,
    CompletionVideoSeconds,
    CompletionVideoTokens,
}

impl UsageKind {
    pub const ALL: [UsageKind; 10] = [
        UsageKind::PromptTextTokens,
        UsageKind::PromptCachedTokens,
        UsageKind::PromptAudioTokens,
        UsageKind::PromptImageTokens,
        UsageKind::CompletionTextTokens,
        UsageKind::CompletionReasoningTokens,
        UsageKind::CompletionAudioTokens,
        UsageKind::CompletionImageTokens,
        UsageKind::CompletionVideoSeconds,
        UsageKind::CompletionVideoTokens,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UsageKind::PromptTextTokens => "prompt_text_tokens",
            UsageKind::PromptCachedTokens => "prompt_cached_tokens",
            UsageKind::PromptAudioTokens => "prompt_audio_tokens",
            UsageKind::PromptImageTokens => "prompt_image_tokens",
            UsageKind::CompletionTextTokens => "completion_text_tokens",
            UsageKind::CompletionReasoningTokens => "completion_reasoning_tokens",
            UsageKind::CompletionAudioTokens => "completion_audio_tokens",
            UsageKind::CompletionImageTokens => "completion_image_tokens",
            UsageKind::CompletionVideoSeconds => "completion_video_seconds",
            UsageKind::CompletionVideoTokens => "completion_video_tokens",
        }
    }
}

/// Sparse record of non-negative usage quantities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage(BTreeMap<UsageKind, f64>);

impl Usage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: UsageKind, amount: f64) -> Self {
        self.set(kind, amount);
        self
    }

    pub fn set(&mut self, kind: UsageKind, amount: f64) {
        if amount > 0.0 {
            self.0.insert(kind, amount);
        }
    }

    pub fn get(&self, kind: UsageKind) -> f64 {
        self.0.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UsageKind, f64)> + '_ {
        self.0.iter().map(|(kind, amount)| (*kind, *amount))
    }

    pub fn scaled(&self, factor: f64) -> Usage {
        Usage(
            self.0
                .iter()
                .map(|(kind, amount)| (*kind, amount * factor))
                .collect(),
        )
    }
}

/// A usage record converted into pollen, one line per populated kind plus
/// the rounded total. Serves as both UsageCost and UsagePrice.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMoney {
    pub lines: BTreeMap<UsageKind, f64>,
    pub total: f64,
}
