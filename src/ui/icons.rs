pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const STATS: &str = "📊";
    pub const LINK: &str = "🔗";
    pub const SAVE: &str = "💾";
    pub const DATABASE: &str = "🗄️";
    pub const CLOCK: &str = "⏱️";
    pub const PERSON: &str = "👤";
    pub const ORDER: &str = "🧾";
    pub const TAG: &str = "🏷️";
}
