// src/ingest/providers/google_news.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::types::ItemSource;
use crate::record::RawItem;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> u64 {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
        .unwrap_or(0)
}

/// Google News RSS search feed for the configured keyword.
pub struct GoogleNewsSource {
    mode: Mode,
}

enum Mode {
    // Own copy so tests can pass any decoded &str.
    Fixture(String),
    Http { client: reqwest::Client },
}

impl GoogleNewsSource {
    pub fn from_http(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building news http client")?;
        Ok(Self {
            mode: Mode::Http { client },
        })
    }

    /// Parse a canned RSS document instead of hitting the network.
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    fn search_url(keyword: &str) -> String {
        let q = keyword.trim().replace(' ', "+");
        format!("https://news.google.com/rss/search?q={q}&hl=en-US&gl=US&ceid=US:en")
    }

    fn parse_items_from_str(s: &str, limit: usize) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing google news rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len().min(limit));
        for it in rss.channel.item.into_iter().take(limit) {
            // Item text is "{title}. {description}"; the pipeline normalizes
            // embedded markup, so pass it through raw here.
            let text = format!(
                "{}. {}",
                it.title.as_deref().unwrap_or_default(),
                it.description.as_deref().unwrap_or_default()
            );

            // guid is the stable id across refreshes; link is the fallback.
            let id = it
                .guid
                .or(it.link)
                .map(|s| s.trim().to_string())
                .unwrap_or_default();

            out.push(RawItem {
                id,
                text,
                published_at: it
                    .pub_date
                    .as_deref()
                    .map(parse_rfc2822_to_unix)
                    .unwrap_or(0),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("monitor_feed_parse_ms").record(ms);
        counter!("monitor_feed_items_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl ItemSource for GoogleNewsSource {
    async fn fetch(&self, keyword: &str, limit: usize) -> Result<Vec<RawItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s, limit),

            Mode::Http { client } => {
                let url = Self::search_url(keyword);
                let body = match client.get(&url).send().await {
                    Ok(resp) => resp.text().await.context("news http .text()")?,
                    Err(e) => {
                        tracing::warn!(error = ?e, provider = "GoogleNews", "provider http error");
                        counter!("monitor_feed_errors_total").increment(1);
                        return Err(e).context("news http get()");
                    }
                };
                Self::parse_items_from_str(&body, limit)
            }
        }
    }

    fn name(&self) -> &'static str {
        "GoogleNews"
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
