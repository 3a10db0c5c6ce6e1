use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{
    AttributionSource, BrandPerformance, CampaignRecord, ChannelOverview, ChannelPeriod,
    ChannelRecord, Kol, PrivateChannelRecord, ProductPricingRecord, Share,
};

pub const DISPLAY_DECIMALS: u32 = 2;

pub const DISTRIBUTION_TOLERANCE: f64 = 1.0;

/// Falls back to the unrounded value when scaling overflows.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// `numerator / denominator * 100`, rounded. A zero denominator yields 0.
pub fn rate_with_precision(numerator: f64, denominator: f64, decimals: u32) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }

    let value = numerator / denominator * 100.0;
    if !value.is_finite() {
        return 0.0;
    }
    round_to(value, decimals)
}

pub fn rate(numerator: f64, denominator: f64) -> f64 {
    rate_with_precision(numerator, denominator, DISPLAY_DECIMALS)
}

pub fn revenue_share(item_revenue: f64, total_revenue: f64) -> f64 {
    rate(item_revenue, total_revenue)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Roi {
    Multiplier(f64),
    Infinite,
}

impl Roi {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Roi::Infinite)
    }

    pub fn sort_value(&self) -> f64 {
        match self {
            Roi::Multiplier(value) => *value,
            Roi::Infinite => f64::INFINITY,
        }
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Roi::Multiplier(value) => write!(f, "{value:.2}x"),
            Roi::Infinite => f.write_str("∞"),
        }
    }
}

pub fn roi(revenue: f64, cost: f64) -> Roi {
    if cost == 0.0 {
        return if revenue > 0.0 {
            Roi::Infinite
        } else {
            Roi::Multiplier(0.0)
        };
    }

    let value = revenue / cost;
    if value.is_finite() {
        Roi::Multiplier(round_to(value, DISPLAY_DECIMALS))
    } else if value == f64::INFINITY {
        Roi::Infinite
    } else {
        Roi::Multiplier(0.0)
    }
}

/// Weighted mean over paired `values`/`weights`; extra entries on either side are ignored.
pub fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    let (weighted_sum, total_weight) = values
        .iter()
        .zip(weights)
        .fold((0.0, 0.0), |(sum, total), (value, weight)| {
            (sum + value * weight, total + weight)
        });

    if total_weight == 0.0 {
        return 0.0;
    }

    let value = weighted_sum / total_weight;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub fn average_order_value(revenue: f64, orders: u64) -> f64 {
    if orders == 0 {
        0.0
    } else {
        round_to(revenue / orders as f64, DISPLAY_DECIMALS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CampaignRates {
    pub conversion_rate: f64,
    pub atc_rate: f64,
    pub purchase_rate: f64,
}

pub fn derive_campaign_rates(campaign: &CampaignRecord) -> CampaignRates {
    CampaignRates {
        conversion_rate: rate(
            campaign.total_purchases as f64,
            campaign.click_throughs as f64,
        ),
        atc_rate: rate(campaign.total_atc as f64, campaign.total_dpv as f64),
        purchase_rate: rate(campaign.total_purchases as f64, campaign.total_atc as f64),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateAnomaly {
    pub campaign: String,
    pub field: &'static str,
    pub value: f64,
}

/// Stored rates outside `0..=100`. They are reported, never clamped.
pub fn rate_anomalies(campaigns: &[CampaignRecord]) -> Vec<RateAnomaly> {
    let mut anomalies = Vec::new();

    for campaign in campaigns {
        let fields = [
            ("conversion_rate", campaign.conversion_rate),
            ("atc_rate", campaign.atc_rate),
            ("purchase_rate", campaign.purchase_rate),
        ];
        for (field, value) in fields {
            if !(0.0..=100.0).contains(&value) {
                anomalies.push(RateAnomaly {
                    campaign: campaign.name.clone(),
                    field,
                    value,
                });
            }
        }
    }

    anomalies
}

pub fn blended_conversion_rate(campaigns: &[CampaignRecord]) -> f64 {
    let values: Vec<f64> = campaigns.iter().map(|c| c.conversion_rate).collect();
    let weights: Vec<f64> = campaigns.iter().map(|c| c.click_throughs as f64).collect();
    round_to(weighted_average(&values, &weights), DISPLAY_DECIMALS)
}

pub fn backfill_pricing(mut record: ProductPricingRecord) -> ProductPricingRecord {
    match (record.list_price, record.discount_amount, record.actual_payment) {
        (Some(list), None, Some(paid)) => {
            record.discount_amount = Some(round_to(list - paid, DISPLAY_DECIMALS));
        }
        (Some(list), Some(discount), None) => {
            record.actual_payment = Some(round_to(list - discount, DISPLAY_DECIMALS));
        }
        _ => {}
    }

    if record.discount_percentage.is_none() {
        if let (Some(list), Some(discount)) = (record.list_price, record.discount_amount) {
            record.discount_percentage = Some(rate(discount, list));
        }
    }

    record
}

/// Actual payment minus the Amazon price; negative means cheaper than Amazon.
pub fn amazon_price_gap(record: &ProductPricingRecord) -> Option<f64> {
    match (record.actual_payment, record.amazon_price) {
        (Some(paid), Some(amazon)) => Some(round_to(paid - amazon, DISPLAY_DECIMALS)),
        _ => None,
    }
}

pub fn recompute_kol_totals(kol: &mut Kol) {
    kol.total_followers = kol.platforms.iter().map(|p| p.followers).sum();
    let engagement: Vec<f64> = kol.platforms.iter().map(|p| p.avg_engagement).collect();
    kol.avg_engagement_rate = round_to(mean(&engagement), DISPLAY_DECIMALS);
}

pub fn distribution_total(shares: &[Share]) -> f64 {
    shares.iter().map(|s| s.percentage).sum()
}

pub fn is_balanced_distribution(shares: &[Share]) -> bool {
    (distribution_total(shares) - 100.0).abs() <= DISTRIBUTION_TOLERANCE
}

pub fn audience_anomalies(kol: &Kol) -> Vec<&'static str> {
    let audience = &kol.audience;
    [
        ("gender", &audience.gender),
        ("age_groups", &audience.age_groups),
        ("top_countries", &audience.top_countries),
    ]
    .into_iter()
    .filter(|(_, shares)| !shares.is_empty() && !is_balanced_distribution(shares))
    .map(|(name, _)| name)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrivateChannelKpis {
    pub channel: String,
    pub open_rate: f64,
    pub click_through_rate: f64,
    pub conversion_rate: f64,
    pub average_order_value: f64,
    pub roi: Roi,
}

pub fn private_channel_kpis(record: &PrivateChannelRecord) -> PrivateChannelKpis {
    PrivateChannelKpis {
        channel: record.channel.clone(),
        open_rate: rate(record.opened as f64, record.sent as f64),
        click_through_rate: rate(record.clicked as f64, record.opened as f64),
        conversion_rate: rate(record.purchases as f64, record.users as f64),
        average_order_value: average_order_value(record.revenue, record.purchases),
        roi: roi(record.revenue, record.cost),
    }
}

pub trait EngagementTotals {
    fn label(&self) -> &str;
    fn videos(&self) -> u64;
    fn views(&self) -> u64;
    fn engagement(&self) -> u64;
}

impl EngagementTotals for BrandPerformance {
    fn label(&self) -> &str {
        &self.brand
    }
    fn videos(&self) -> u64 {
        self.videos
    }
    fn views(&self) -> u64 {
        self.views
    }
    fn engagement(&self) -> u64 {
        self.engagement
    }
}

impl EngagementTotals for AttributionSource {
    fn label(&self) -> &str {
        &self.source
    }
    fn videos(&self) -> u64 {
        self.videos
    }
    fn views(&self) -> u64 {
        self.views
    }
    fn engagement(&self) -> u64 {
        self.engagement
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementSummary {
    pub label: String,
    pub videos: u64,
    pub views: u64,
    pub engagement: u64,
    pub engagement_rate: f64,
    pub market_share: f64,
}

pub fn engagement_summary<T: EngagementTotals>(items: &[T]) -> Vec<EngagementSummary> {
    let total_views: u64 = items.iter().map(|item| item.views()).sum();

    items
        .iter()
        .map(|item| EngagementSummary {
            label: item.label().to_string(),
            videos: item.videos(),
            views: item.views(),
            engagement: item.engagement(),
            engagement_rate: rate(item.engagement() as f64, item.views() as f64),
            market_share: revenue_share(item.views() as f64, total_views as f64),
        })
        .collect()
}

pub fn combine_channel_periods(periods: &[ChannelOverview]) -> ChannelOverview {
    let mut channels: Vec<ChannelRecord> = Vec::new();

    for overview in periods {
        for channel in &overview.channels {
            match channels.iter_mut().find(|c| c.name == channel.name) {
                Some(existing) => {
                    existing.traffic += channel.traffic;
                    existing.revenue = round_to(existing.revenue + channel.revenue, DISPLAY_DECIMALS);
                }
                None => channels.push(channel.clone()),
            }
        }
    }

    ChannelOverview::new(ChannelPeriod::Overall, channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AudienceDemographics, KolStatus, Platform, PlatformAccount};
    use uuid::Uuid;

    fn campaign(atc: u64, purchases: u64) -> CampaignRecord {
        CampaignRecord {
            name: "Spring Launch".to_string(),
            platform: "Meta".to_string(),
            product: "Air Purifier".to_string(),
            click_throughs: 200,
            total_dpv: 120,
            total_atc: atc,
            total_purchases: purchases,
            product_sales: 0.0,
            brand_referral_bonus: 0.0,
            conversion_rate: 0.0,
            atc_rate: 0.0,
            purchase_rate: 0.0,
        }
    }

    fn account(platform: Platform, followers: u64, engagement: f64) -> PlatformAccount {
        PlatformAccount {
            platform,
            username: "creator".to_string(),
            followers,
            followers_growth: 1.2,
            avg_views: 1000,
            avg_engagement: engagement,
            verified: false,
            url: "https://example.com/creator".to_string(),
        }
    }

    #[test]
    fn rate_guards_zero_denominator() {
        assert_eq!(rate(0.0, 0.0), 0.0);
        assert_eq!(rate(42.0, 0.0), 0.0);
        assert_eq!(rate(0.0, 17.0), 0.0);
        assert_eq!(rate(1.0, 3.0), 33.33);
        assert_eq!(rate_with_precision(1.0, 3.0, 1), 33.3);
    }

    #[test]
    fn rounding_overflow_keeps_rates_finite() {
        let huge = rate(1e306, 1.0);
        assert!(huge.is_finite());
        assert!((huge / 1e308 - 1.0).abs() < 1e-12);
        let precise = rate_with_precision(1.0, 3.0, 400);
        assert!(precise.is_finite());
        assert!((precise - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(round_to(0.0, u32::MAX), 0.0);
    }

    #[test]
    fn roi_overflow_and_negative_cost() {
        assert_eq!(roi(1e306, 1e-3), Roi::Infinite);
        assert_eq!(roi(-1e306, 1e-3), Roi::Multiplier(0.0));
        assert_eq!(roi(100.0, -50.0), Roi::Multiplier(-2.0));
        assert_eq!(roi(0.0, -50.0), Roi::Multiplier(0.0));
    }

    #[test]
    fn revenue_share_guards_zero_total() {
        assert_eq!(revenue_share(10.0, 0.0), 0.0);
        assert_eq!(revenue_share(25.0, 100.0), 25.0);
    }

    #[test]
    fn roi_distinguishes_infinite_from_zero() {
        assert_eq!(roi(500.0, 0.0), Roi::Infinite);
        assert_eq!(roi(0.0, 0.0), Roi::Multiplier(0.0));
        assert_eq!(roi(300.0, 120.0), Roi::Multiplier(2.5));
        assert_eq!(roi(0.0, 50.0), Roi::Multiplier(0.0));
        assert_eq!(Roi::Infinite.to_string(), "∞");
        assert_eq!(Roi::Multiplier(2.5).to_string(), "2.50x");
        assert!(Roi::Infinite.sort_value() > Roi::Multiplier(1e9).sort_value());
    }

    #[test]
    fn weighted_average_guards_empty_and_zero_weights() {
        assert_eq!(weighted_average(&[], &[]), 0.0);
        assert_eq!(weighted_average(&[3.0, 4.0], &[0.0, 0.0]), 0.0);
        assert!((weighted_average(&[2.0, 4.0], &[1.0, 3.0]) - 3.5).abs() < 1e-9);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn average_order_value_guards_zero_orders() {
        assert_eq!(average_order_value(120.0, 0), 0.0);
        assert_eq!(average_order_value(100.0, 3), 33.33);
    }

    #[test]
    fn campaign_with_cart_but_no_purchases_has_zero_purchase_rate() {
        let rates = derive_campaign_rates(&campaign(8, 0));
        assert_eq!(rates.purchase_rate, 0.0);
        assert!(!rates.purchase_rate.is_nan());
    }

    #[test]
    fn campaign_with_no_traffic_derives_zero_rates() {
        let mut empty = campaign(0, 0);
        empty.click_throughs = 0;
        empty.total_dpv = 0;
        let rates = derive_campaign_rates(&empty);
        assert_eq!(rates.conversion_rate, 0.0);
        assert_eq!(rates.atc_rate, 0.0);
        assert_eq!(rates.purchase_rate, 0.0);
    }

    #[test]
    fn stored_rates_above_hundred_are_flagged_not_clamped() {
        let mut odd = campaign(8, 2);
        odd.atc_rate = 151.5;
        let anomalies = rate_anomalies(&[odd.clone()]);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].field, "atc_rate");
        assert_eq!(anomalies[0].value, 151.5);
        assert_eq!(odd.atc_rate, 151.5);
    }

    #[test]
    fn blended_conversion_weights_by_clicks() {
        let mut a = campaign(0, 0);
        a.click_throughs = 100;
        a.conversion_rate = 2.0;
        let mut b = campaign(0, 0);
        b.click_throughs = 300;
        b.conversion_rate = 6.0;
        assert_eq!(blended_conversion_rate(&[a, b]), 5.0);
        assert_eq!(blended_conversion_rate(&[]), 0.0);
    }

    #[test]
    fn pricing_backfills_discount_from_payment() {
        let record = backfill_pricing(ProductPricingRecord {
            product: "Purifier".to_string(),
            currency: "USD".to_string(),
            list_price: Some(199.99),
            actual_payment: Some(149.99),
            ..Default::default()
        });
        assert_eq!(record.discount_amount, Some(50.0));
        assert_eq!(record.discount_percentage, Some(25.0));
    }

    #[test]
    fn pricing_backfills_payment_from_discount() {
        let record = backfill_pricing(ProductPricingRecord {
            product: "Filter".to_string(),
            currency: "USD".to_string(),
            list_price: Some(40.0),
            discount_amount: Some(10.0),
            amazon_price: Some(32.0),
            ..Default::default()
        });
        assert_eq!(record.actual_payment, Some(30.0));
        assert_eq!(amazon_price_gap(&record), Some(-2.0));
    }

    #[test]
    fn pricing_without_list_price_keeps_zero_guarded_percentage_absent() {
        let record = backfill_pricing(ProductPricingRecord {
            product: "Bundle".to_string(),
            discount_amount: Some(5.0),
            ..Default::default()
        });
        assert_eq!(record.discount_percentage, None);
        assert_eq!(record.actual_payment, None);

        let free = backfill_pricing(ProductPricingRecord {
            product: "Sample".to_string(),
            list_price: Some(0.0),
            actual_payment: Some(0.0),
            ..Default::default()
        });
        assert_eq!(free.discount_percentage, Some(0.0));
    }

    #[test]
    fn kol_totals_follow_platform_accounts() {
        let mut kol = Kol {
            id: Uuid::nil(),
            name: "Mina".to_string(),
            verified: true,
            category: "Tech".to_string(),
            platforms: vec![
                account(Platform::Youtube, 120_000, 4.0),
                account(Platform::Tiktok, 80_000, 7.0),
            ],
            total_followers: 0,
            avg_engagement_rate: 0.0,
            total_videos: 10,
            total_views: 100,
            status: KolStatus::Active,
            tags: vec![],
            performance_score: 80.0,
            monthly_reach: 1000,
            audience: AudienceDemographics::default(),
        };
        recompute_kol_totals(&mut kol);
        assert_eq!(kol.total_followers, 200_000);
        assert_eq!(kol.avg_engagement_rate, 5.5);

        kol.platforms.clear();
        recompute_kol_totals(&mut kol);
        assert_eq!(kol.total_followers, 0);
        assert_eq!(kol.avg_engagement_rate, 0.0);
    }

    #[test]
    fn distributions_are_checked_against_hundred() {
        let balanced = vec![
            Share {
                label: "female".to_string(),
                percentage: 58.5,
            },
            Share {
                label: "male".to_string(),
                percentage: 41.0,
            },
        ];
        assert!(is_balanced_distribution(&balanced));
        let skewed = vec![Share {
            label: "US".to_string(),
            percentage: 70.0,
        }];
        assert!(!is_balanced_distribution(&skewed));
    }

    #[test]
    fn private_channel_kpis_guard_every_ratio() {
        let idle = PrivateChannelRecord {
            channel: "SMS".to_string(),
            sent: 0,
            opened: 0,
            clicked: 0,
            users: 0,
            purchases: 0,
            revenue: 0.0,
            cost: 0.0,
        };
        let kpis = private_channel_kpis(&idle);
        assert_eq!(kpis.open_rate, 0.0);
        assert_eq!(kpis.click_through_rate, 0.0);
        assert_eq!(kpis.conversion_rate, 0.0);
        assert_eq!(kpis.average_order_value, 0.0);
        assert_eq!(kpis.roi, Roi::Multiplier(0.0));

        let community = PrivateChannelRecord {
            channel: "Community".to_string(),
            sent: 1000,
            opened: 400,
            clicked: 100,
            users: 80,
            purchases: 4,
            revenue: 220.0,
            cost: 0.0,
        };
        let kpis = private_channel_kpis(&community);
        assert_eq!(kpis.open_rate, 40.0);
        assert_eq!(kpis.click_through_rate, 25.0);
        assert_eq!(kpis.conversion_rate, 5.0);
        assert_eq!(kpis.average_order_value, 55.0);
        assert!(kpis.roi.is_infinite());
    }

    #[test]
    fn engagement_summary_shares_views() {
        let brands = vec![
            BrandPerformance {
                brand: "Levoit".to_string(),
                videos: 10,
                views: 750,
                engagement: 75,
            },
            BrandPerformance {
                brand: "Coway".to_string(),
                videos: 4,
                views: 250,
                engagement: 0,
            },
        ];
        let summary = engagement_summary(&brands);
        assert_eq!(summary[0].market_share, 75.0);
        assert_eq!(summary[0].engagement_rate, 10.0);
        assert_eq!(summary[1].market_share, 25.0);

        let silent = vec![AttributionSource {
            source: "Organic".to_string(),
            videos: 0,
            views: 0,
            engagement: 0,
        }];
        let summary = engagement_summary(&silent);
        assert_eq!(summary[0].engagement_rate, 0.0);
        assert_eq!(summary[0].market_share, 0.0);
    }

    #[test]
    fn combining_weeks_preserves_channel_order() {
        let channel = |name: &str, traffic: u64, revenue: f64| ChannelRecord {
            name: name.to_string(),
            traffic,
            revenue,
            color: "#000".to_string(),
        };
        let week1 = ChannelOverview::new(
            ChannelPeriod::Week1,
            vec![channel("Meta", 10, 1.5), channel("Amazon", 5, 2.0)],
        );
        let week2 = ChannelOverview::new(
            ChannelPeriod::Week2,
            vec![channel("Amazon", 7, 1.0), channel("TikTok", 3, 0.0)],
        );
        let overall = combine_channel_periods(&[week1, week2]);
        let names: Vec<&str> = overall.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Meta", "Amazon", "TikTok"]);
        assert_eq!(overall.channels[1].traffic, 12);
        assert_eq!(overall.total_traffic, 25);
        assert!((overall.total_revenue - 4.5).abs() < 1e-9);
    }
}
