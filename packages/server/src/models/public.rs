use serde::Serialize;

/// One leaderboard row, ranked by score descending.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LeaderboardEntry {
    pub player_id: String,
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = 450)]
    pub score: i32,
    /// Number of distinct challenges solved.
    #[schema(example = 3)]
    pub solved_count: u64,
    #[schema(example = 1)]
    pub rank: u64,
}

/// Public site metadata from the settings table, with defaults.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SiteInfoResponse {
    #[schema(example = "CTF Platform")]
    pub site_name: String,
    #[schema(example = "Capture The Flag Platform")]
    pub site_description: String,
}
