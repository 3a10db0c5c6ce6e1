use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DashboardError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub name: String,
    pub platform: String,
    pub product: String,
    pub click_throughs: u64,
    pub total_dpv: u64,
    pub total_atc: u64,
    pub total_purchases: u64,
    pub product_sales: f64,
    pub brand_referral_bonus: f64,
    pub conversion_rate: f64,
    pub atc_rate: f64,
    pub purchase_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub name: String,
    pub traffic: u64,
    pub revenue: f64,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelPeriod {
    Week1,
    Week2,
    #[default]
    Overall,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelOverview {
    pub period: ChannelPeriod,
    pub channels: Vec<ChannelRecord>,
    pub total_traffic: u64,
    pub total_revenue: f64,
}

impl ChannelOverview {
    pub fn new(period: ChannelPeriod, channels: Vec<ChannelRecord>) -> Self {
        let total_traffic = channels.iter().map(|c| c.traffic).sum();
        let total_revenue = channels.iter().map(|c| c.revenue).sum();
        Self {
            period,
            channels,
            total_traffic,
            total_revenue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateChannelRecord {
    pub channel: String,
    pub sent: u64,
    pub opened: u64,
    pub clicked: u64,
    pub users: u64,
    pub purchases: u64,
    pub revenue: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductPricingRecord {
    pub product: String,
    pub currency: String,
    pub list_price: Option<f64>,
    pub regular_price: Option<f64>,
    pub promo_price: Option<f64>,
    pub discount_amount: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub actual_payment: Option<f64>,
    pub amazon_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
    Twitter,
    Facebook,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Youtube,
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Facebook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| DashboardError::unknown_token("platform", value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KolStatus {
    Active,
    Inactive,
    Pending,
}

impl KolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KolStatus::Active => "active",
            KolStatus::Inactive => "inactive",
            KolStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for KolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KolStatus {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(KolStatus::Active),
            "inactive" => Ok(KolStatus::Inactive),
            "pending" => Ok(KolStatus::Pending),
            _ => Err(DashboardError::unknown_token("status", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformAccount {
    pub platform: Platform,
    pub username: String,
    pub followers: u64,
    pub followers_growth: f64,
    pub avg_views: u64,
    pub avg_engagement: f64,
    pub verified: bool,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub label: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudienceDemographics {
    pub gender: Vec<Share>,
    pub age_groups: Vec<Share>,
    pub top_countries: Vec<Share>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kol {
    pub id: Uuid,
    pub name: String,
    pub verified: bool,
    pub category: String,
    pub platforms: Vec<PlatformAccount>,
    pub total_followers: u64,
    pub avg_engagement_rate: f64,
    pub total_videos: u64,
    pub total_views: u64,
    pub status: KolStatus,
    pub tags: Vec<String>,
    pub performance_score: f64,
    pub monthly_reach: u64,
    pub audience: AudienceDemographics,
}

impl Kol {
    pub fn is_on(&self, platform: Platform) -> bool {
        self.platforms.iter().any(|account| account.platform == platform)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub kol_id: Uuid,
    pub platform: Platform,
    pub title: String,
    pub published_on: NaiveDate,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

impl Post {
    pub fn interactions(&self) -> u64 {
        self.likes + self.comments + self.shares
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandPerformance {
    pub brand: String,
    pub videos: u64,
    pub views: u64,
    pub engagement: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionSource {
    pub source: String,
    pub videos: u64,
    pub views: u64,
    pub engagement: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "7d")]
    Last7Days,
    #[default]
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
}

impl Period {
    pub fn days(&self) -> i64 {
        match self {
            Period::Last7Days => 7,
            Period::Last30Days => 30,
            Period::Last90Days => 90,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

impl FromStr for Period {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "7d" => Ok(Period::Last7Days),
            "30d" => Ok(Period::Last30Days),
            "90d" => Ok(Period::Last90Days),
            _ => Err(DashboardError::unknown_token("period", value)),
        }
    }
}

impl fmt::Display for ChannelPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChannelPeriod::Week1 => "week1",
            ChannelPeriod::Week2 => "week2",
            ChannelPeriod::Overall => "overall",
        };
        f.write_str(label)
    }
}

impl FromStr for ChannelPeriod {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "week1" => Ok(ChannelPeriod::Week1),
            "week2" => Ok(ChannelPeriod::Week2),
            "overall" | "total" => Ok(ChannelPeriod::Overall),
            _ => Err(DashboardError::unknown_token("channel period", value)),
        }
    }
}
