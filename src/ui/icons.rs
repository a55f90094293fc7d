use crate::project::Technology;

pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const STATS: &str = "📊";
    pub const DATABASE: &str = "🗄️";
    pub const SEED: &str = "🌱";
    pub const GLOBE: &str = "🌍";
    pub const MAP: &str = "🗺️";
    pub const SUN: &str = "🌞";
    pub const WIND: &str = "🌬️";
    pub const WATER: &str = "💧";
    pub const PLUG: &str = "🔌";
    pub const LEAF: &str = "🍃";
    pub const TARGET: &str = "🎯";
    pub const CHART: &str = "📈";
    pub const EMPTY: &str = "∅";

    pub fn technology(technology: Technology) -> &'static str {
        match technology {
            Technology::Solar => Self::SUN,
            Technology::Wind => Self::WIND,
            Technology::Hydro => Self::WATER,
            Technology::Other => Self::PLUG,
        }
    }
}
