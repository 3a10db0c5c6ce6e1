use uuid::Uuid;

use crate::models::{AudienceDemographics, Kol, KolStatus, Platform, PlatformAccount};

pub fn sample_kol(seed: u128, name: &str, accounts: &[(Platform, u64)]) -> Kol {
    let platforms: Vec<PlatformAccount> = accounts
        .iter()
        .map(|(platform, followers)| PlatformAccount {
            platform: *platform,
            username: format!("{}_{}", name.to_lowercase(), platform),
            followers: *followers,
            followers_growth: 2.5,
            avg_views: followers / 10,
            avg_engagement: 4.0,
            verified: false,
            url: format!("https://{platform}.com/{}", name.to_lowercase()),
        })
        .collect();

    Kol {
        id: Uuid::from_u128(seed),
        name: name.to_string(),
        verified: false,
        category: "Home".to_string(),
        total_followers: platforms.iter().map(|p| p.followers).sum(),
        avg_engagement_rate: 4.0,
        platforms,
        total_videos: 12,
        total_views: 48_000,
        status: KolStatus::Active,
        tags: vec!["air quality".to_string()],
        performance_score: 70.0,
        monthly_reach: 20_000,
        audience: AudienceDemographics::default(),
    }
}

/// Five creators with mixed platforms and follower counts.
pub fn five_kols() -> Vec<Kol> {
    let mut kols = vec![
        sample_kol(1, "Ava", &[(Platform::Tiktok, 250_000)]),
        sample_kol(2, "Ben", &[(Platform::Youtube, 400_000)]),
        sample_kol(3, "Chloe", &[(Platform::Tiktok, 40_000), (Platform::Instagram, 20_000)]),
        sample_kol(4, "Dev", &[(Platform::Instagram, 90_000), (Platform::Tiktok, 60_000)]),
        sample_kol(5, "Eli", &[(Platform::Tiktok, 100_000)]),
    ];
    kols[1].category = "Tech".to_string();
    kols[1].avg_engagement_rate = 2.1;
    kols[1].performance_score = 91.0;
    kols[2].status = KolStatus::Pending;
    kols[2].tags.push("Allergy Season".to_string());
    kols[3].avg_engagement_rate = 6.8;
    kols[3].performance_score = 70.0;
    kols[4].status = KolStatus::Inactive;
    kols
}
