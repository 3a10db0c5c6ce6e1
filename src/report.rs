use std::fmt::Write;

use crate::charts::{
    campaign_stage_defs, format_value, to_funnel_stages, to_share_slices, ValueFormat,
};
use crate::filter::{sort_by_key, SortDirection, SortKey};
use crate::metrics::{
    amazon_price_gap, backfill_pricing, blended_conversion_rate, engagement_summary,
    private_channel_kpis, rate_anomalies, PrivateChannelKpis,
};
use crate::models::PrivateChannelRecord;
use crate::sources::DashboardSnapshot;

/// KPIs ordered by ROI, best first; infinite ROI ranks above any multiplier.
pub fn sorted_private_kpis(records: &[PrivateChannelRecord]) -> Vec<PrivateChannelKpis> {
    let mut kpis: Vec<PrivateChannelKpis> = records.iter().map(private_channel_kpis).collect();
    kpis.sort_by(|a, b| b.roi.sort_value().total_cmp(&a.roi.sort_value()));
    kpis
}

pub fn build_report(snapshot: &DashboardSnapshot, top_kols: usize) -> String {
    let mut output = String::new();
    let money = ValueFormat::Money {
        currency: "USD".to_string(),
    };

    let _ = writeln!(output, "# Marketing Dashboard Report");
    let _ = writeln!(
        output,
        "Generated for the last {} (channels: {})",
        snapshot.period, snapshot.channels.period
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Channel Mix");

    if snapshot.channels.channels.is_empty() {
        let _ = writeln!(output, "No channel data for this window.");
    } else {
        let slices = to_share_slices(
            &snapshot.channels.channels,
            |c| c.revenue,
            |c| c.name.clone(),
        );
        for (slice, channel) in slices.iter().zip(&snapshot.channels.channels) {
            let _ = writeln!(
                output,
                "- {}: {} ({:.1}% of revenue, {} visits)",
                slice.label,
                format_value(slice.value, &money),
                slice.percentage,
                channel.traffic
            );
        }
        let _ = writeln!(
            output,
            "- Total: {} across {} visits",
            format_value(snapshot.channels.total_revenue, &money),
            snapshot.channels.total_traffic
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Campaign Funnels");

    if snapshot.campaigns.is_empty() {
        let _ = writeln!(output, "No campaigns recorded for this window.");
    } else {
        let _ = writeln!(
            output,
            "Blended conversion rate {:.2}%",
            blended_conversion_rate(&snapshot.campaigns)
        );
        for campaign in &snapshot.campaigns {
            let stages = to_funnel_stages(campaign_stage_defs(campaign));
            let path = stages
                .iter()
                .map(|stage| format!("{} {} (-{:.1}%)", stage.name, stage.value, stage.dropoff))
                .collect::<Vec<_>>()
                .join(" > ");
            let _ = writeln!(
                output,
                "- {} on {}: {} | sales {} | CVR {:.2}% ATC {:.2}% purchase {:.2}%",
                campaign.name,
                campaign.platform,
                path,
                format_value(campaign.product_sales, &money),
                campaign.conversion_rate,
                campaign.atc_rate,
                campaign.purchase_rate
            );
        }

        let anomalies = rate_anomalies(&snapshot.campaigns);
        if !anomalies.is_empty() {
            let _ = writeln!(output);
            let _ = writeln!(output, "Stored rates outside 0-100% (shown as recorded):");
            for anomaly in anomalies {
                let _ = writeln!(
                    output,
                    "- {} {} = {}",
                    anomaly.campaign, anomaly.field, anomaly.value
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Private Channels");

    let kpis = sorted_private_kpis(&snapshot.private_channels);
    if kpis.is_empty() {
        let _ = writeln!(output, "No private channel activity for this window.");
    } else {
        for kpi in kpis {
            let _ = writeln!(
                output,
                "- {}: ROI {} | open {:.1}% | CTR {:.1}% | CVR {:.1}% | AOV {}",
                kpi.channel,
                kpi.roi,
                kpi.open_rate,
                kpi.click_through_rate,
                kpi.conversion_rate,
                format_value(kpi.average_order_value, &money)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top KOLs");

    let ranked = sort_by_key(
        snapshot.kols.iter().collect(),
        SortKey::PerformanceScore,
        SortDirection::Desc,
    );
    if ranked.is_empty() {
        let _ = writeln!(output, "No KOLs loaded.");
    } else {
        for kol in ranked.iter().take(top_kols) {
            let _ = writeln!(
                output,
                "- {} ({}, {}) score {:.1}, {} followers, {:.2}% engagement",
                kol.name,
                kol.category,
                kol.status,
                kol.performance_score,
                format_value(kol.total_followers as f64, &ValueFormat::Integer),
                kol.avg_engagement_rate
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Share of Voice");

    let brands = engagement_summary(&snapshot.brands);
    let sources = engagement_summary(&snapshot.attribution);
    if brands.is_empty() && sources.is_empty() {
        let _ = writeln!(output, "No brand or attribution data.");
    }
    for summary in brands.iter().chain(&sources) {
        let _ = writeln!(
            output,
            "- {}: {:.1}% of views, {:.2}% engagement across {} videos",
            summary.label, summary.market_share, summary.engagement_rate, summary.videos
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Pricing");

    if snapshot.pricing.is_empty() {
        let _ = writeln!(output, "No pricing records.");
    } else {
        for record in snapshot.pricing.iter().cloned().map(backfill_pricing) {
            let currency = ValueFormat::Money {
                currency: record.currency.clone(),
            };
            let price = |value: Option<f64>| {
                value.map_or_else(|| "n/a".to_string(), |v| format_value(v, &currency))
            };
            let gap = amazon_price_gap(&record)
                .map_or_else(|| "n/a".to_string(), |v| format_value(v, &currency));
            let _ = writeln!(
                output,
                "- {}: list {} paid {} discount {} ({}) vs Amazon {}",
                record.product,
                price(record.list_price),
                price(record.actual_payment),
                price(record.discount_amount),
                record
                    .discount_percentage
                    .map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%")),
                gap
            );
        }
    }

    output
}
