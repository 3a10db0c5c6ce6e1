use serde::Serialize;

use crate::error::{DashboardError, Result};
use crate::models::{CampaignRecord, Kol, PlatformAccount};

const KOL_HEADERS: [&str; 11] = [
    "id",
    "name",
    "category",
    "status",
    "verified",
    "platforms",
    "total_followers",
    "avg_engagement_rate",
    "performance_score",
    "monthly_reach",
    "tags",
];

const CAMPAIGN_HEADERS: [&str; 12] = [
    "name",
    "platform",
    "product",
    "click_throughs",
    "total_dpv",
    "total_atc",
    "total_purchases",
    "product_sales",
    "brand_referral_bonus",
    "conversion_rate",
    "atc_rate",
    "purchase_rate",
];

#[derive(Serialize)]
struct KolRow<'a> {
    id: String,
    name: &'a str,
    category: &'a str,
    status: &'static str,
    verified: bool,
    platforms: String,
    total_followers: u64,
    avg_engagement_rate: f64,
    performance_score: f64,
    monthly_reach: u64,
    tags: String,
}

/// `youtube(120000), tiktok(80000)`
pub fn format_platforms(platforms: &[PlatformAccount]) -> String {
    platforms
        .iter()
        .map(|account| format!("{}({})", account.platform, account.followers))
        .collect::<Vec<_>>()
        .join(", ")
}

fn into_text(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| DashboardError::Io(err.into_error()))?;
    String::from_utf8(bytes).map_err(|err| {
        DashboardError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}

/// Header row first, even when there are no records.
pub fn kols_to_csv<'a, I>(kols: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Kol>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(KOL_HEADERS)?;

    for kol in kols {
        writer.serialize(KolRow {
            id: kol.id.to_string(),
            name: &kol.name,
            category: &kol.category,
            status: kol.status.as_str(),
            verified: kol.verified,
            platforms: format_platforms(&kol.platforms),
            total_followers: kol.total_followers,
            avg_engagement_rate: kol.avg_engagement_rate,
            performance_score: kol.performance_score,
            monthly_reach: kol.monthly_reach,
            tags: kol.tags.join(", "),
        })?;
    }

    into_text(writer)
}

pub fn campaigns_to_csv(campaigns: &[CampaignRecord]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CAMPAIGN_HEADERS)?;

    for campaign in campaigns {
        writer.serialize(campaign)?;
    }

    into_text(writer)
}
