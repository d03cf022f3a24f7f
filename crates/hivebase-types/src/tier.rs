use serde::{Deserialize, Serialize};

/// Access tier. The numeric level is the single canonical ordering used by
/// every tier comparison in the workspace; anonymous is level 0.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Anonymous,
    Seed,
    Flower,
    Nectar,
}

impl Tier {
    pub fn level(self) -> u8 {
        match self {
            Tier::Anonymous => 0,
            Tier::Seed => 1,
            Tier::Flower => 2,
            Tier::Nectar => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Anonymous => "anonymous",
            Tier::Seed => "seed",
            Tier::Flower => "flower",
            Tier::Nectar => "nectar",
        }
    }

    pub fn parse(value: &str) -> Option<Tier> {
        match value {
            "anonymous" => Some(Tier::Anonymous),
            "seed" => Some(Tier::Seed),
            "flower" => Some(Tier::Flower),
            "nectar" => Some(Tier::Nectar),
            _ => None,
        }
    }

    /// A principal at `self` may access a service requiring `required`.
    pub fn satisfies(self, required: Tier) -> bool {
        self.level() >= required.level()
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_levels() {
        assert!(Tier::Anonymous < Tier::Seed);
        assert!(Tier::Seed < Tier::Flower);
        assert!(Tier::Flower < Tier::Nectar);
        assert!(Tier::Nectar.satisfies(Tier::Seed));
        assert!(!Tier::Seed.satisfies(Tier::Flower));
        assert!(Tier::Seed.satisfies(Tier::Seed));
    }

    #[test]
    fn parse_round_trips() {
        for tier in [Tier::Anonymous, Tier::Seed, Tier::Flower, Tier::Nectar] {
            assert_eq!(Tier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(Tier::parse("queen"), None);
    }
}
