use std::future::Future;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::metrics::{combine_channel_periods, recompute_kol_totals, round_to};
use crate::models::{
    AttributionSource, AudienceDemographics, BrandPerformance, CampaignRecord, ChannelOverview,
    ChannelPeriod, ChannelRecord, Kol, KolStatus, Period, Platform, PlatformAccount, Post,
    PrivateChannelRecord, ProductPricingRecord, Share,
};

/// Provider of raw dashboard records. Each call returns a complete collection.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    async fn campaign_metrics(&self, period: Period) -> Result<Vec<CampaignRecord>>;
    async fn channel_metrics(&self, period: ChannelPeriod) -> Result<ChannelOverview>;
    async fn private_channel_metrics(&self, period: Period) -> Result<Vec<PrivateChannelRecord>>;
    async fn kols(&self) -> Result<Vec<Kol>>;
    async fn posts(&self, period: Period) -> Result<Vec<Post>>;
    async fn pricing(&self) -> Result<Vec<ProductPricingRecord>>;
    async fn brand_performance(&self) -> Result<Vec<BrandPerformance>>;
    async fn attribution_sources(&self) -> Result<Vec<AttributionSource>>;
}

/// Awaits a source call, substituting the empty/zero aggregate on failure.
pub async fn load_or_default<T, F>(label: &str, request: F) -> T
where
    T: Default,
    F: Future<Output = Result<T>>,
{
    match request.await {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(source = label, error = %err, "data source failed, rendering zero state");
            T::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub period: Period,
    pub campaigns: Vec<CampaignRecord>,
    pub channels: ChannelOverview,
    pub private_channels: Vec<PrivateChannelRecord>,
    pub kols: Vec<Kol>,
    pub posts: Vec<Post>,
    pub pricing: Vec<ProductPricingRecord>,
    pub brands: Vec<BrandPerformance>,
    pub attribution: Vec<AttributionSource>,
}

/// Loads every domain independently; one failing call only blanks its own section.
pub async fn load_snapshot(
    source: &dyn DashboardSource,
    period: Period,
    channel_period: ChannelPeriod,
) -> DashboardSnapshot {
    let (campaigns, channels, private_channels, kols, posts, pricing, brands, attribution) =
        tokio::join!(
            load_or_default("campaigns", source.campaign_metrics(period)),
            load_or_default("channels", source.channel_metrics(channel_period)),
            load_or_default("private channels", source.private_channel_metrics(period)),
            load_or_default("kols", source.kols()),
            load_or_default("posts", source.posts(period)),
            load_or_default("pricing", source.pricing()),
            load_or_default("brand performance", source.brand_performance()),
            load_or_default("attribution", source.attribution_sources()),
        );

    DashboardSnapshot {
        period,
        campaigns,
        channels,
        private_channels,
        kols,
        posts,
        pricing,
        brands,
        attribution,
    }
}

const FIRST_NAMES: [&str; 12] = [
    "Avery", "Jules", "Kiara", "Mina", "Theo", "Lena", "Ravi", "Sofia", "Marco", "Hana", "Noah",
    "Priya",
];
const LAST_NAMES: [&str; 10] = [
    "Lee", "Moreno", "Patel", "Okafor", "Schmidt", "Tanaka", "Silva", "Novak", "Haddad", "Kim",
];
const CATEGORIES: [&str; 6] = ["Tech", "Home", "Lifestyle", "Health", "Parenting", "Pets"];
const TAGS: [&str; 8] = [
    "air quality",
    "smart home",
    "allergy",
    "unboxing",
    "reviews",
    "wellness",
    "minimalism",
    "pet care",
];
const AGE_GROUPS: [&str; 4] = ["18-24", "25-34", "35-44", "45+"];
const COUNTRIES: [&str; 4] = ["US", "GB", "DE", "CA"];

/// Fixed fixtures plus a seeded KOL/post generator. The same seed always yields
/// the same records.
#[derive(Debug, Clone)]
pub struct MockSource {
    seed: u64,
    kol_count: usize,
    reference_date: NaiveDate,
}

impl MockSource {
    pub fn new(seed: u64, kol_count: usize) -> Self {
        Self {
            seed,
            kol_count,
            reference_date: Utc::now().date_naive(),
        }
    }

    /// Date posts are generated backwards from.
    pub fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = reference_date;
        self
    }

    fn generate_kols(&self) -> Vec<Kol> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.kol_count).map(|_| generate_kol(&mut rng)).collect()
    }
}

fn generate_kol(rng: &mut StdRng) -> Kol {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Avery");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Lee");
    let name = format!("{first} {last}");
    let handle = format!("{}{}", first.to_lowercase(), last.to_lowercase());

    let platform_count = rng.gen_range(1..=3);
    let platforms: Vec<PlatformAccount> = Platform::ALL
        .choose_multiple(rng, platform_count)
        .copied()
        .collect::<Vec<_>>()
        .into_iter()
        .map(|platform| {
            let followers = rng.gen_range(5_000..2_000_000u64);
            PlatformAccount {
                platform,
                username: handle.clone(),
                followers,
                followers_growth: round_to(rng.gen_range(-2.0..15.0), 1),
                avg_views: (followers as f64 * rng.gen_range(0.05..0.4)) as u64,
                avg_engagement: round_to(rng.gen_range(1.0..12.0), 2),
                verified: rng.gen_bool(0.35),
                url: format!("https://{platform}.com/@{handle}"),
            }
        })
        .collect();

    let total_videos = rng.gen_range(20..800u64);
    let mean_views = if platforms.is_empty() {
        0
    } else {
        platforms.iter().map(|p| p.avg_views).sum::<u64>() / platforms.len() as u64
    };
    let status = match rng.gen_range(0..10) {
        0..=6 => KolStatus::Active,
        7..=8 => KolStatus::Pending,
        _ => KolStatus::Inactive,
    };
    let tag_count = rng.gen_range(1..=3);
    let tags = TAGS
        .choose_multiple(rng, tag_count)
        .map(|tag| tag.to_string())
        .collect();

    let female = round_to(rng.gen_range(35.0..75.0), 1);
    let audience = AudienceDemographics {
        gender: vec![
            Share {
                label: "female".to_string(),
                percentage: female,
            },
            Share {
                label: "male".to_string(),
                percentage: round_to(100.0 - female, 1),
            },
        ],
        age_groups: random_distribution(rng, &AGE_GROUPS),
        top_countries: random_distribution(rng, &COUNTRIES),
    };

    let mut kol = Kol {
        id: uuid::Builder::from_random_bytes(rng.gen()).into_uuid(),
        name,
        verified: platforms.iter().any(|p| p.verified),
        category: CATEGORIES.choose(rng).copied().unwrap_or("Home").to_string(),
        platforms,
        total_followers: 0,
        avg_engagement_rate: 0.0,
        total_videos,
        total_views: mean_views * total_videos,
        status,
        tags,
        performance_score: round_to(rng.gen_range(35.0..99.0), 1),
        monthly_reach: 0,
        audience,
    };
    recompute_kol_totals(&mut kol);
    kol.monthly_reach = (kol.total_followers as f64 * rng.gen_range(0.2..0.9)) as u64;
    kol
}

/// Random percentages over `labels`; the last share absorbs rounding so the total is 100.
fn random_distribution(rng: &mut StdRng, labels: &[&str]) -> Vec<Share> {
    let weights: Vec<f64> = labels.iter().map(|_| rng.gen_range(1.0..10.0)).collect();
    let total: f64 = weights.iter().sum();
    let mut shares: Vec<Share> = labels
        .iter()
        .zip(&weights)
        .map(|(label, weight)| Share {
            label: label.to_string(),
            percentage: round_to(weight / total * 100.0, 1),
        })
        .collect();

    let assigned: f64 = shares.iter().rev().skip(1).map(|s| s.percentage).sum();
    if let Some(last) = shares.last_mut() {
        last.percentage = round_to(100.0 - assigned, 1);
    }
    shares
}

fn generate_posts(
    rng: &mut StdRng,
    kols: &[Kol],
    reference_date: NaiveDate,
    period: Period,
) -> Vec<Post> {
    let mut posts = Vec::new();

    for kol in kols {
        let count = rng.gen_range(1..=4);
        for n in 0..count {
            let Some(account) = kol.platforms.choose(rng) else {
                continue;
            };
            let views = (account.avg_views as f64 * rng.gen_range(0.5..1.8)) as u64;
            let interactions = views as f64 * account.avg_engagement / 100.0;
            posts.push(Post {
                id: uuid::Builder::from_random_bytes(rng.gen()).into_uuid(),
                kol_id: kol.id,
                platform: account.platform,
                title: format!("{} feature #{}", kol.name, n + 1),
                published_on: reference_date - Duration::days(rng.gen_range(0..period.days())),
                views,
                likes: (interactions * 0.8) as u64,
                comments: (interactions * 0.15) as u64,
                shares: (interactions * 0.05) as u64,
            });
        }
    }

    posts
}

fn campaign(
    name: &str,
    platform: &str,
    product: &str,
    counts: [u64; 4],
    product_sales: f64,
    brand_referral_bonus: f64,
    rates: [f64; 3],
) -> CampaignRecord {
    CampaignRecord {
        name: name.to_string(),
        platform: platform.to_string(),
        product: product.to_string(),
        click_throughs: counts[0],
        total_dpv: counts[1],
        total_atc: counts[2],
        total_purchases: counts[3],
        product_sales,
        brand_referral_bonus,
        conversion_rate: rates[0],
        atc_rate: rates[1],
        purchase_rate: rates[2],
    }
}

fn channel(name: &str, traffic: u64, revenue: f64, color: &str) -> ChannelRecord {
    ChannelRecord {
        name: name.to_string(),
        traffic,
        revenue,
        color: color.to_string(),
    }
}

fn week1_channels() -> ChannelOverview {
    ChannelOverview::new(
        ChannelPeriod::Week1,
        vec![
            channel("Meta", 1840, 3259.44, "#1877f2"),
            channel("Amazon", 620, 479.98, "#ff9900"),
            channel("Official", 180, 55.99, "#2f855a"),
            channel("TikTok", 430, 0.0, "#111111"),
        ],
    )
}

fn week2_channels() -> ChannelOverview {
    ChannelOverview::new(
        ChannelPeriod::Week2,
        vec![
            channel("Meta", 1630, 2875.10, "#1877f2"),
            channel("Amazon", 702, 719.97, "#ff9900"),
            channel("Official", 205, 111.98, "#2f855a"),
            channel("TikTok", 512, 129.99, "#111111"),
        ],
    )
}

#[async_trait]
impl DashboardSource for MockSource {
    async fn campaign_metrics(&self, period: Period) -> Result<Vec<CampaignRecord>> {
        tracing::debug!(%period, "loading campaign fixtures");
        Ok(vec![
            campaign(
                "Meta Spring Awareness",
                "Meta",
                "Core 300",
                [1840, 912, 64, 17],
                3259.44,
                0.0,
                [0.92, 7.02, 26.56],
            ),
            campaign(
                "Amazon Sponsored Products",
                "Amazon",
                "Core 300S",
                [620, 244, 370, 3],
                479.98,
                47.99,
                [0.48, 151.5, 0.81],
            ),
            campaign(
                "TikTok Creator Push",
                "TikTok",
                "Vital 100",
                [430, 150, 8, 0],
                0.0,
                0.0,
                [0.0, 5.33, 0.0],
            ),
            campaign(
                "Official Store Retargeting",
                "Official",
                "Core 400S",
                [180, 80, 6, 1],
                55.99,
                0.0,
                [0.56, 7.5, 16.67],
            ),
            campaign(
                "Google Brand Referral Test",
                "Google",
                "Core 300",
                [0, 0, 0, 0],
                0.0,
                0.0,
                [0.0, 0.0, 0.0],
            ),
        ])
    }

    async fn channel_metrics(&self, period: ChannelPeriod) -> Result<ChannelOverview> {
        Ok(match period {
            ChannelPeriod::Week1 => week1_channels(),
            ChannelPeriod::Week2 => week2_channels(),
            ChannelPeriod::Overall => combine_channel_periods(&[week1_channels(), week2_channels()]),
        })
    }

    async fn private_channel_metrics(&self, period: Period) -> Result<Vec<PrivateChannelRecord>> {
        tracing::debug!(%period, "loading private channel fixtures");
        let record = |channel: &str, counts: [u64; 5], revenue: f64, cost: f64| {
            PrivateChannelRecord {
                channel: channel.to_string(),
                sent: counts[0],
                opened: counts[1],
                clicked: counts[2],
                users: counts[3],
                purchases: counts[4],
                revenue,
                cost,
            }
        };
        Ok(vec![
            record("Email newsletter", [12_000, 3_840, 612, 540, 22], 1869.78, 240.0),
            record("SMS", [3_000, 2_460, 188, 160, 9], 719.91, 150.0),
            record("Facebook group", [0, 0, 0, 85, 4], 239.96, 0.0),
            record("Discord", [0, 0, 0, 0, 0], 0.0, 0.0),
        ])
    }

    async fn kols(&self) -> Result<Vec<Kol>> {
        Ok(self.generate_kols())
    }

    async fn posts(&self, period: Period) -> Result<Vec<Post>> {
        let kols = self.generate_kols();
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(1));
        Ok(generate_posts(&mut rng, &kols, self.reference_date, period))
    }

    async fn pricing(&self) -> Result<Vec<ProductPricingRecord>> {
        Ok(vec![
            ProductPricingRecord {
                product: "Core 300".to_string(),
                currency: "USD".to_string(),
                list_price: Some(99.99),
                regular_price: Some(99.99),
                promo_price: Some(79.99),
                actual_payment: Some(79.99),
                amazon_price: Some(89.99),
                ..Default::default()
            },
            ProductPricingRecord {
                product: "Core 300S".to_string(),
                currency: "USD".to_string(),
                list_price: Some(159.99),
                regular_price: Some(149.99),
                discount_amount: Some(40.0),
                amazon_price: Some(119.99),
                ..Default::default()
            },
            ProductPricingRecord {
                product: "Vital 100".to_string(),
                currency: "EUR".to_string(),
                list_price: Some(139.99),
                discount_percentage: Some(20.0),
                actual_payment: Some(111.99),
                ..Default::default()
            },
        ])
    }

    async fn brand_performance(&self) -> Result<Vec<BrandPerformance>> {
        let brand = |brand: &str, videos, views, engagement| BrandPerformance {
            brand: brand.to_string(),
            videos,
            views,
            engagement,
        };
        Ok(vec![
            brand("Levoit", 128, 4_820_000, 312_000),
            brand("Coway", 64, 2_150_000, 121_500),
            brand("Dyson", 96, 3_900_000, 198_000),
            brand("Blueair", 22, 610_000, 41_200),
        ])
    }

    async fn attribution_sources(&self) -> Result<Vec<AttributionSource>> {
        let source = |source: &str, videos, views, engagement| AttributionSource {
            source: source.to_string(),
            videos,
            views,
            engagement,
        };
        Ok(vec![
            source("Creator seeding", 54, 2_300_000, 164_000),
            source("Paid collaborations", 31, 1_750_000, 88_000),
            source("Affiliate links", 19, 420_000, 25_300),
            source("Organic mentions", 24, 350_000, 34_700),
        ])
    }
}

/// Reads campaign rows from a CSV file and defers every other domain to `inner`.
pub struct CsvCampaignSource<S> {
    path: PathBuf,
    inner: S,
}

impl<S: DashboardSource> CsvCampaignSource<S> {
    pub fn new(path: impl Into<PathBuf>, inner: S) -> Self {
        Self {
            path: path.into(),
            inner,
        }
    }
}

pub fn read_campaigns_csv(path: &std::path::Path) -> Result<Vec<CampaignRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut campaigns = Vec::new();

    for row in reader.deserialize::<CampaignRecord>() {
        campaigns.push(row?);
    }

    tracing::info!(count = campaigns.len(), path = %path.display(), "loaded campaigns from csv");
    Ok(campaigns)
}

#[async_trait]
impl<S: DashboardSource> DashboardSource for CsvCampaignSource<S> {
    async fn campaign_metrics(&self, _period: Period) -> Result<Vec<CampaignRecord>> {
        read_campaigns_csv(&self.path)
    }

    async fn channel_metrics(&self, period: ChannelPeriod) -> Result<ChannelOverview> {
        self.inner.channel_metrics(period).await
    }

    async fn private_channel_metrics(&self, period: Period) -> Result<Vec<PrivateChannelRecord>> {
        self.inner.private_channel_metrics(period).await
    }

    async fn kols(&self) -> Result<Vec<Kol>> {
        self.inner.kols().await
    }

    async fn posts(&self, period: Period) -> Result<Vec<Post>> {
        self.inner.posts(period).await
    }

    async fn pricing(&self) -> Result<Vec<ProductPricingRecord>> {
        self.inner.pricing().await
    }

    async fn brand_performance(&self) -> Result<Vec<BrandPerformance>> {
        self.inner.brand_performance().await
    }

    async fn attribution_sources(&self) -> Result<Vec<AttributionSource>> {
        self.inner.attribution_sources().await
    }
}
