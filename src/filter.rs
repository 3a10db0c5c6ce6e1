use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::models::{Kol, KolStatus, Platform, Post};

/// KOL narrowing options. Every field is optional and the present ones are ANDed;
/// list fields match when any entry matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KolFilter {
    /// Case-insensitive substring over name, category and tags.
    pub search: Option<String>,
    pub categories: Vec<String>,
    pub platforms: Vec<Platform>,
    pub statuses: Vec<KolStatus>,
    pub min_followers: Option<u64>,
    pub max_followers: Option<u64>,
    pub min_engagement: Option<f64>,
    pub max_engagement: Option<f64>,
}

impl KolFilter {
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none()
            && self.categories.is_empty()
            && self.platforms.is_empty()
            && self.statuses.is_empty()
            && self.min_followers.is_none()
            && self.max_followers.is_none()
            && self.min_engagement.is_none()
            && self.max_engagement.is_none()
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, kol: &Kol) -> bool {
        if let Some(term) = self.search_term() {
            let hit = kol.name.to_lowercase().contains(&term)
                || kol.category.to_lowercase().contains(&term)
                || kol.tags.iter().any(|tag| tag.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        if !self.categories.is_empty()
            && !self
                .categories
                .iter()
                .any(|category| category.eq_ignore_ascii_case(&kol.category))
        {
            return false;
        }

        if !self.platforms.is_empty() && !self.platforms.iter().any(|p| kol.is_on(*p)) {
            return false;
        }

        if !self.statuses.is_empty() && !self.statuses.contains(&kol.status) {
            return false;
        }

        if self.min_followers.is_some_and(|min| kol.total_followers < min)
            || self.max_followers.is_some_and(|max| kol.total_followers > max)
        {
            return false;
        }

        if self.min_engagement.is_some_and(|min| kol.avg_engagement_rate < min)
            || self.max_engagement.is_some_and(|max| kol.avg_engagement_rate > max)
        {
            return false;
        }

        true
    }
}

/// Matching records in their original order.
pub fn filter_by<'a>(records: &'a [Kol], filter: &KolFilter) -> Vec<&'a Kol> {
    records.iter().filter(|kol| filter.matches(kol)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Followers,
    Engagement,
    PerformanceScore,
}

impl FromStr for SortKey {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "followers" | "totalFollowers" | "total_followers" => Ok(SortKey::Followers),
            "engagement" | "avgEngagementRate" | "avg_engagement_rate" => Ok(SortKey::Engagement),
            "performanceScore" | "performance_score" => Ok(SortKey::PerformanceScore),
            other => Err(DashboardError::InvalidSortKey(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(DashboardError::unknown_token("sort direction", value)),
        }
    }
}

fn compare(a: &Kol, b: &Kol, key: SortKey) -> Ordering {
    match key {
        SortKey::Followers => a.total_followers.cmp(&b.total_followers),
        SortKey::Engagement => a.avg_engagement_rate.total_cmp(&b.avg_engagement_rate),
        SortKey::PerformanceScore => a.performance_score.total_cmp(&b.performance_score),
    }
}

/// Stable ordering: ties keep their incoming relative order in both directions.
pub fn sort_by_key(mut records: Vec<&Kol>, key: SortKey, direction: SortDirection) -> Vec<&Kol> {
    records.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    records
}

pub fn sort_by<'a>(
    records: Vec<&'a Kol>,
    key: &str,
    direction: SortDirection,
) -> Result<Vec<&'a Kol>> {
    let key = key.parse::<SortKey>()?;
    Ok(sort_by_key(records, key, direction))
}

/// Posts published within `from..=to`; a missing bound is open.
pub fn posts_in_range(
    posts: &[Post],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<&Post> {
    posts
        .iter()
        .filter(|post| from.map_or(true, |from| post.published_on >= from))
        .filter(|post| to.map_or(true, |to| post.published_on <= to))
        .collect()
}
