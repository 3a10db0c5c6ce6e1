use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use marketing_insights::charts::{
    campaign_stage_defs, format_tooltip, post_activity_matrix, to_category_series,
    to_funnel_stages, to_radar, to_share_slices, FormatterContext, SeriesSpec, ValueFormat,
};
use marketing_insights::export::{campaigns_to_csv, kols_to_csv};
use marketing_insights::filter::{posts_in_range, KolFilter, SortDirection};
use marketing_insights::metrics::{
    amazon_price_gap, audience_anomalies, backfill_pricing, derive_campaign_rates,
    rate, rate_anomalies,
};
use marketing_insights::models::{
    CampaignRecord, ChannelPeriod, ChannelRecord, Kol, KolStatus, Period, Platform,
};
use marketing_insights::report::{build_report, sorted_private_kpis};
use marketing_insights::sources::{
    load_or_default, load_snapshot, CsvCampaignSource, DashboardSource, MockSource,
};
use marketing_insights::store::KolStore;

#[derive(Parser)]
#[command(name = "marketing-insights")]
#[command(about = "Campaign, channel and KOL metrics for the marketing dashboard", long_about = None)]
struct Cli {
    /// Seed for generated KOL and post records
    #[arg(long, global = true, env = "DASHBOARD_SEED", default_value_t = 42)]
    seed: u64,
    #[arg(long, global = true, env = "DASHBOARD_KOL_COUNT", default_value_t = 24)]
    kol_count: usize,
    /// Read campaign rows from a CSV file instead of the built-in fixtures
    #[arg(long, global = true, env = "DASHBOARD_CAMPAIGNS_CSV")]
    campaigns_csv: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Revenue share and traffic by channel
    Channels {
        #[arg(long, default_value = "overall")]
        period: ChannelPeriod,
        #[arg(long)]
        json: bool,
    },
    /// Campaign counts, stored rates and rate anomalies
    Campaigns {
        #[arg(long, default_value = "30d")]
        period: Period,
        #[arg(long)]
        json: bool,
    },
    /// Funnel stages for one campaign
    Funnel {
        #[arg(long)]
        campaign: String,
        #[arg(long, default_value = "30d")]
        period: Period,
        #[arg(long)]
        json: bool,
    },
    /// Private-domain channel KPIs ranked by ROI
    Private {
        #[arg(long, default_value = "30d")]
        period: Period,
        #[arg(long)]
        json: bool,
    },
    /// Filter, rank and optionally re-status KOLs
    Kols {
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "category")]
        categories: Vec<String>,
        #[arg(long = "platform")]
        platforms: Vec<Platform>,
        #[arg(long = "status")]
        statuses: Vec<KolStatus>,
        #[arg(long)]
        min_followers: Option<u64>,
        #[arg(long)]
        max_followers: Option<u64>,
        #[arg(long)]
        min_engagement: Option<f64>,
        #[arg(long)]
        max_engagement: Option<f64>,
        /// followers, engagement or performanceScore
        #[arg(long, default_value = "performanceScore")]
        sort: String,
        #[arg(long, default_value = "desc")]
        direction: SortDirection,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Apply this status to every matching KOL before listing
        #[arg(long)]
        set_status: Option<KolStatus>,
        /// Print radar axes for the listed KOLs
        #[arg(long)]
        radar: bool,
        #[arg(long)]
        json: bool,
    },
    /// Post views by platform and weekday
    Posts {
        #[arg(long, default_value = "30d")]
        period: Period,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Product pricing with back-filled discounts
    Pricing {
        #[arg(long)]
        json: bool,
    },
    /// Write KOLs or campaigns as CSV
    Export {
        #[arg(long, default_value = "kols", value_parser = ["kols", "campaigns"])]
        dataset: String,
        #[arg(long, default_value = "30d")]
        period: Period,
        #[arg(long, default_value = "export.csv")]
        out: PathBuf,
    },
    /// Generate a markdown dashboard report
    Report {
        #[arg(long, default_value = "30d")]
        period: Period,
        #[arg(long, default_value = "overall")]
        channel_period: ChannelPeriod,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mock = MockSource::new(cli.seed, cli.kol_count);
    let source: Box<dyn DashboardSource> = match cli.campaigns_csv {
        Some(path) => Box::new(CsvCampaignSource::new(path, mock)),
        None => Box::new(mock),
    };

    match cli.command {
        Commands::Channels { period, json } => {
            let overview = load_or_default("channels", source.channel_metrics(period)).await;
            let slices = to_share_slices(
                &overview.channels,
                |c: &ChannelRecord| c.revenue,
                |c| c.name.clone(),
            );

            if json {
                let series = to_category_series(
                    &overview.channels,
                    |c| c.name.clone(),
                    &[
                        SeriesSpec::new("Traffic", |c: &ChannelRecord| c.traffic as f64),
                        SeriesSpec::new("Revenue", |c: &ChannelRecord| c.revenue),
                    ],
                );
                return print_json(&serde_json::json!({
                    "overview": overview,
                    "series": series,
                    "slices": slices,
                }));
            }

            if overview.channels.is_empty() {
                println!("No channel data for {period}.");
                return Ok(());
            }

            let revenue = to_category_series(
                &overview.channels,
                |c| c.name.clone(),
                &[SeriesSpec::new("Revenue", |c: &ChannelRecord| c.revenue)],
            );
            let money = ValueFormat::Money {
                currency: "USD".to_string(),
            };
            println!("Channel mix ({period}):");
            for (index, slice) in slices.iter().enumerate() {
                if let Some(context) = FormatterContext::from_series(&revenue, index) {
                    println!(
                        "- {} | share {:.1}% | traffic {}",
                        format_tooltip(&context, &money).replace('\n', " | "),
                        slice.percentage,
                        overview.channels[index].traffic
                    );
                }
            }
        }
        Commands::Campaigns { period, json } => {
            let campaigns = load_or_default("campaigns", source.campaign_metrics(period)).await;
            let anomalies = rate_anomalies(&campaigns);
            for anomaly in &anomalies {
                tracing::warn!(
                    campaign = %anomaly.campaign,
                    field = anomaly.field,
                    value = anomaly.value,
                    "stored rate outside 0-100%"
                );
            }

            if json {
                let series = to_category_series(
                    &campaigns,
                    |c| c.name.clone(),
                    &[
                        SeriesSpec::new("Click-throughs", |c: &CampaignRecord| {
                            c.click_throughs as f64
                        }),
                        SeriesSpec::new("Purchases", |c: &CampaignRecord| c.total_purchases as f64),
                        SeriesSpec::new("Sales", |c: &CampaignRecord| c.product_sales),
                    ],
                );
                return print_json(&serde_json::json!({
                    "campaigns": campaigns,
                    "series": series,
                    "anomalies": anomalies,
                }));
            }

            if campaigns.is_empty() {
                println!("No campaigns recorded for {period}.");
                return Ok(());
            }

            println!("Campaigns ({period}):");
            for campaign in &campaigns {
                let derived = derive_campaign_rates(campaign);
                println!(
                    "- {} on {} ({}): CVR {:.2}% (derived {:.2}%), ATC {:.2}% (derived {:.2}%), purchase {:.2}% (derived {:.2}%)",
                    campaign.name,
                    campaign.platform,
                    campaign.product,
                    campaign.conversion_rate,
                    derived.conversion_rate,
                    campaign.atc_rate,
                    derived.atc_rate,
                    campaign.purchase_rate,
                    derived.purchase_rate
                );
            }
        }
        Commands::Funnel {
            campaign,
            period,
            json,
        } => {
            let campaigns = load_or_default("campaigns", source.campaign_metrics(period)).await;
            let record = campaigns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(&campaign))
                .with_context(|| format!("no campaign named {campaign:?}"))?;
            let stages = to_funnel_stages(campaign_stage_defs(record));

            if json {
                return print_json(&stages);
            }

            println!("Funnel for {}:", record.name);
            for stage in &stages {
                println!(
                    "- {}: {} ({:.1}% of top, -{:.1}% from previous)",
                    stage.name, stage.value, stage.conversion_from_top, stage.dropoff
                );
            }
        }
        Commands::Private { period, json } => {
            let records =
                load_or_default("private channels", source.private_channel_metrics(period)).await;
            let kpis = sorted_private_kpis(&records);

            if json {
                return print_json(&kpis);
            }

            if kpis.is_empty() {
                println!("No private channel activity for {period}.");
                return Ok(());
            }

            println!("Private channels by ROI ({period}):");
            for kpi in &kpis {
                println!(
                    "- {} ROI {} | open {:.1}% | CTR {:.1}% | CVR {:.1}% | AOV {:.2}",
                    kpi.channel,
                    kpi.roi,
                    kpi.open_rate,
                    kpi.click_through_rate,
                    kpi.conversion_rate,
                    kpi.average_order_value
                );
            }
        }
        Commands::Kols {
            search,
            categories,
            platforms,
            statuses,
            min_followers,
            max_followers,
            min_engagement,
            max_engagement,
            sort,
            direction,
            limit,
            set_status,
            radar,
            json,
        } => {
            let mut store = KolStore::new(load_or_default("kols", source.kols()).await);
            let filter = KolFilter {
                search,
                categories,
                platforms,
                statuses,
                min_followers,
                max_followers,
                min_engagement,
                max_engagement,
            };

            if let Some(status) = set_status {
                let ids: Vec<Uuid> = store.query(&filter, None)?.iter().map(|k| k.id).collect();
                let updated = store.batch_update_status(&ids, status);
                println!("Marked {updated} KOLs as {status}.");
            }

            let ranked = store.query(&filter, Some((sort.as_str(), direction)))?;
            let listed: Vec<Kol> = ranked.into_iter().take(limit).cloned().collect();

            for kol in &listed {
                let skewed = audience_anomalies(kol);
                if !skewed.is_empty() {
                    tracing::warn!(kol = %kol.name, distributions = ?skewed, "audience shares do not sum to 100");
                }
            }

            if radar {
                let chart = to_radar(
                    &listed,
                    |k| k.name.clone(),
                    &[
                        SeriesSpec::new("Followers", |k: &Kol| k.total_followers as f64),
                        SeriesSpec::new("Engagement", |k: &Kol| k.avg_engagement_rate),
                        SeriesSpec::new("Performance", |k: &Kol| k.performance_score),
                        SeriesSpec::new("Monthly reach", |k: &Kol| k.monthly_reach as f64),
                    ],
                );
                return print_json(&chart);
            }

            if json {
                return print_json(&listed);
            }

            if listed.is_empty() {
                println!("No KOLs match these filters.");
                return Ok(());
            }

            println!("KOLs by {sort} ({} of {}):", listed.len(), store.len());
            for kol in &listed {
                let on: Vec<&str> = kol.platforms.iter().map(|p| p.platform.as_str()).collect();
                println!(
                    "- {} [{}] {} followers, {:.2}% engagement, score {:.1}, {} on {}",
                    kol.name,
                    kol.category,
                    kol.total_followers,
                    kol.avg_engagement_rate,
                    kol.performance_score,
                    kol.status,
                    on.join("/")
                );
            }
        }
        Commands::Posts {
            period,
            from,
            to,
            json,
        } => {
            let posts = load_or_default("posts", source.posts(period)).await;
            let in_range: Vec<_> = posts_in_range(&posts, from, to).into_iter().cloned().collect();
            let matrix = post_activity_matrix(&in_range, &Platform::ALL);
            let cells = matrix.cells()?;

            if json {
                return print_json(&serde_json::json!({
                    "rows": matrix.rows,
                    "cols": matrix.cols,
                    "cells": cells,
                }));
            }

            let views: u64 = in_range.iter().map(|post| post.views).sum();
            let interactions: u64 = in_range.iter().map(|post| post.interactions()).sum();
            println!(
                "{} posts, {} views, {} interactions ({:.2}% engagement)",
                in_range.len(),
                views,
                interactions,
                rate(interactions as f64, views as f64)
            );
            println!("Post views by weekday:");
            println!("{:<10} {}", "", matrix.cols.join("\t"));
            for (label, row) in matrix.rows.iter().zip(&matrix.values) {
                let values: Vec<String> = row.iter().map(|v| format!("{v:.0}")).collect();
                println!("{label:<10} {}", values.join("\t"));
            }
        }
        Commands::Pricing { json } => {
            let pricing: Vec<_> = load_or_default("pricing", source.pricing())
                .await
                .into_iter()
                .map(backfill_pricing)
                .collect();

            if json {
                return print_json(&pricing);
            }

            if pricing.is_empty() {
                println!("No pricing records.");
                return Ok(());
            }

            for record in &pricing {
                println!(
                    "- {} ({}): list {:?} paid {:?} discount {:?} ({:?}%) Amazon gap {:?}",
                    record.product,
                    record.currency,
                    record.list_price,
                    record.actual_payment,
                    record.discount_amount,
                    record.discount_percentage,
                    amazon_price_gap(record)
                );
            }
        }
        Commands::Export {
            dataset,
            period,
            out,
        } => {
            let (contents, rows) = if dataset == "campaigns" {
                let campaigns = load_or_default("campaigns", source.campaign_metrics(period)).await;
                (campaigns_to_csv(&campaigns)?, campaigns.len())
            } else {
                let kols = load_or_default("kols", source.kols()).await;
                (kols_to_csv(&kols)?, kols.len())
            };
            std::fs::write(&out, contents)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Exported {rows} {dataset} to {}.", out.display());
        }
        Commands::Report {
            period,
            channel_period,
            top,
            out,
        } => {
            let snapshot = load_snapshot(source.as_ref(), period, channel_period).await;
            let report = build_report(&snapshot, top);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
