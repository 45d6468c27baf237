//! bioRxiv preprint client.
//!
//! The details API has no search, so the adapter pulls several pages of the
//! recent listing in parallel and keyword-filters titles and abstracts:
//!   https://api.biorxiv.org/details/biorxiv/{start}/{end}/{cursor}/json
//!
//! The listing is date-ordered, so pages are split between the last 30 days
//! and the older part of the window; both rate periods get the same sample.
//!
//! Each page holds up to 100 preprints. A failed page is recorded as a
//! diagnostic; the adapter only fails when every page does.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use ferrovet_common::validation::{FieldSpec, JsonKind};
use ferrovet_common::{GeneSymbol, RequestClient, SourceCache, SourceError, SourceId};
use futures::future::join_all;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{check_shape, str_field, Fetched, SourceAdapter};
use crate::models::{CategoryCount, PreprintRecord, PreprintSummary, VelocityTrend};

const BIORXIV_DETAILS_URL: &str = "https://api.biorxiv.org/details/biorxiv";
const PAGE_SIZE: u32 = 100;
const RATE_WINDOW_DAYS: i64 = 30;
const TOP_CATEGORIES: usize = 5;
const RECENT_PREPRINTS: usize = 10;

const PAGE_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("collection", JsonKind::Array),
    FieldSpec::optional("collection.0.doi", JsonKind::String),
    FieldSpec::optional("collection.0.date", JsonKind::String),
    FieldSpec::optional("messages", JsonKind::Array),
];

/// One listing page: a date interval and an offset into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub cursor: u32,
}

/// Splits `pages` between `[today-30, today]` and `[today-window, today-31]`.
/// The recent interval takes the odd page.
pub fn page_plan(today: NaiveDate, pages: u32, window_days: u32) -> Vec<PageRequest> {
    let recent_pages = pages.div_ceil(2);
    let prior_pages = pages - recent_pages;
    let recent_start = today - Duration::days(RATE_WINDOW_DAYS);
    let prior_end = today - Duration::days(RATE_WINDOW_DAYS + 1);
    let prior_start = today - Duration::days(i64::from(window_days));

    let interval = |start: NaiveDate, end: NaiveDate, count: u32| {
        (0..count).map(move |p| PageRequest { start, end, cursor: p * PAGE_SIZE })
    };
    interval(recent_start, today, recent_pages)
        .chain(interval(prior_start, prior_end, prior_pages))
        .collect()
}

/// bioRxiv adapter.
pub struct BioRxivSource {
    client: Arc<RequestClient>,
    cache: Arc<SourceCache>,
    pages: u32,
    window_days: u32,
}

impl BioRxivSource {
    pub fn new(client: Arc<RequestClient>, cache: Arc<SourceCache>, pages: u32, window_days: u32) -> Self {
        Self {
            client,
            cache,
            pages: pages.max(2),
            window_days: window_days.max(RATE_WINDOW_DAYS as u32 * 2),
        }
    }

    async fn page(&self, request: PageRequest) -> Result<Value, SourceError> {
        let PageRequest { start, end, cursor } = request;
        let url = format!("{BIORXIV_DETAILS_URL}/{start}/{end}/{cursor}/json");
        Ok(self.client.get_json(&url, &[]).await?)
    }
}

#[async_trait]
impl SourceAdapter for BioRxivSource {
    type Record = PreprintRecord;

    fn source(&self) -> SourceId {
        SourceId::BioRxiv
    }

    fn cache(&self) -> &SourceCache {
        &self.cache
    }

    #[instrument(skip(self), fields(gene = %gene))]
    async fn fetch(&self, gene: &GeneSymbol) -> Result<Fetched<PreprintRecord>, SourceError> {
        let today = Utc::now().date_naive();
        let plan = page_plan(today, self.pages, self.window_days);

        let results = join_all(plan.iter().map(|request| self.page(*request))).await;

        let mut diagnostics = Vec::new();
        let mut entries = Vec::new();
        let mut failed_pages = 0;
        let mut last_error = None;
        for (request, result) in plan.iter().zip(results) {
            match result {
                Ok(payload) => {
                    check_shape(SourceId::BioRxiv, "details", &payload, PAGE_SHAPE, &mut diagnostics);
                    if let Some(collection) = payload["collection"].as_array() {
                        entries.extend(collection.iter().cloned());
                    }
                }
                Err(e) => {
                    warn!(start = %request.start, cursor = request.cursor, error = %e, "bioRxiv page failed");
                    diagnostics.push(format!(
                        "details {}..{} cursor {}: {e}",
                        request.start, request.end, request.cursor
                    ));
                    failed_pages += 1;
                    last_error = Some(e);
                }
            }
        }
        if failed_pages == plan.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let record = summarize(&entries, gene.as_str(), today, self.window_days)?;
        debug!(
            scanned = record.preprints_scanned,
            matched = record.total_preprints,
            velocity = ?record.velocity,
            "bioRxiv record normalized"
        );
        Ok(Fetched::with_diagnostics(record, diagnostics))
    }
}

// ── Normalization ───────────────────────────────────────────────────────────

/// Word-boundary matcher for the symbol as given and its upper-case form.
pub fn keyword_pattern(symbol: &str) -> Result<Regex, SourceError> {
    let exact = regex::escape(symbol);
    let upper = regex::escape(&symbol.to_uppercase());
    Regex::new(&format!(r"\b(?:{exact}|{upper})\b"))
        .map_err(|e| SourceError::Payload(format!("keyword pattern: {e}")))
}

/// Filters the scanned listing down to preprints mentioning `symbol` and
/// derives the velocity and diversity metrics. Later versions of the same
/// DOI are counted once.
pub fn summarize(
    entries: &[Value],
    symbol: &str,
    today: NaiveDate,
    window_days: u32,
) -> Result<PreprintRecord, SourceError> {
    let pattern = keyword_pattern(symbol)?;
    let mut seen = HashSet::new();
    let mut matched: Vec<(PreprintSummary, Option<String>)> = Vec::new();

    for entry in entries {
        let Some(doi) = str_field(entry, "doi") else { continue };
        let title = str_field(entry, "title").unwrap_or_default();
        let abstract_text = entry["abstract"].as_str().unwrap_or_default();
        if !pattern.is_match(&title) && !pattern.is_match(abstract_text) {
            continue;
        }
        let Some(date) = entry["date"]
            .as_str()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };
        let age = (today - date).num_days();
        if age < 0 || age > i64::from(window_days) || !seen.insert(doi.clone()) {
            continue;
        }
        let institution = str_field(entry, "author_corresponding_institution")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let category = str_field(entry, "category")
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        matched.push((PreprintSummary { doi, title, date, category }, institution));
    }

    let age_of = |p: &PreprintSummary| (today - p.date).num_days();
    let last_30_days = matched
        .iter()
        .filter(|(p, _)| age_of(p) <= RATE_WINDOW_DAYS)
        .count() as u32;
    let days_30_to_60 = matched
        .iter()
        .filter(|(p, _)| (RATE_WINDOW_DAYS + 1..=RATE_WINDOW_DAYS * 2).contains(&age_of(p)))
        .count() as u32;
    let recent_rate = f64::from(last_30_days) / RATE_WINDOW_DAYS as f64;
    let prior_rate = f64::from(days_30_to_60) / RATE_WINDOW_DAYS as f64;

    let mut categories: BTreeMap<&str, u32> = BTreeMap::new();
    for (p, _) in &matched {
        if let Some(c) = p.category.as_deref() {
            *categories.entry(c).or_default() += 1;
        }
    }
    let distinct_categories = categories.len() as u32;
    let mut top_categories: Vec<CategoryCount> = categories
        .into_iter()
        .map(|(category, count)| CategoryCount { category: category.to_string(), count })
        .collect();
    top_categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    top_categories.truncate(TOP_CATEGORIES);

    let distinct_institutions = matched
        .iter()
        .filter_map(|(_, inst)| inst.as_deref().map(str::to_lowercase))
        .collect::<HashSet<_>>()
        .len() as u32;

    let total_preprints = matched.len() as u32;
    let mut recent_preprints: Vec<PreprintSummary> = matched.into_iter().map(|(p, _)| p).collect();
    recent_preprints.sort_by(|a, b| b.date.cmp(&a.date));
    recent_preprints.truncate(RECENT_PREPRINTS);

    Ok(PreprintRecord {
        total_preprints,
        last_30_days,
        days_30_to_60,
        recent_rate,
        prior_rate,
        velocity: VelocityTrend::classify(recent_rate, prior_rate),
        distinct_categories,
        distinct_institutions,
        top_categories,
        recent_preprints,
        preprints_scanned: entries.len() as u32,
        window_days,
    })
}
