use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};

use crate::{
    config::Settings,
    product::{PriceRecord, Snapshot},
    utils::parse_price,
};

const CONTAINER_SELECTOR: &str =
    "div.ecom-collection__product-container.ecom-collection__product-container_collection";
const ENTRY_SELECTOR: &str = "div > div > div";
const NAME_SELECTOR: &str = "h3 > a";
const SALE_PRICE_SELECTOR: &str = "span.ecom-collection__product-price--sale";
const REGULAR_PRICE_SELECTOR: &str = "span.ecom-collection__product-price--regular";
const PRICE_SELECTOR: &str = "span.ecom-collection__product-price";

/// Anything that can produce the current catalog.
///
/// An empty snapshot means the fetch failed and the run must not continue.
pub trait CatalogSource {
    fn fetch(&self) -> Snapshot;
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("bad selector {css:?}: {e}"))
}

struct CatalogSelectors {
    container: Selector,
    entry: Selector,
    name: Selector,
    sale_price: Selector,
    regular_price: Selector,
    price: Selector,
}

impl CatalogSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            container: selector(CONTAINER_SELECTOR)?,
            entry: selector(ENTRY_SELECTOR)?,
            name: selector(NAME_SELECTOR)?,
            sale_price: selector(SALE_PRICE_SELECTOR)?,
            regular_price: selector(REGULAR_PRICE_SELECTOR)?,
            price: selector(PRICE_SELECTOR)?,
        })
    }
}

/// Text content with each text node trimmed, joined without separators.
fn element_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

fn first_price(entry: ElementRef<'_>, sel: &Selector) -> Option<rust_decimal::Decimal> {
    entry.select(sel).next().and_then(|el| parse_price(&element_text(el)))
}

fn extract_record(entry: ElementRef<'_>, sels: &CatalogSelectors) -> Option<PriceRecord> {
    let name = entry
        .select(&sels.name)
        .next()
        .map(element_text)
        .filter(|n| !n.is_empty())?;

    let (regular_price, sale_price) = if let Some(sale_el) = entry.select(&sels.sale_price).next() {
        let sale = parse_price(&element_text(sale_el));
        (first_price(entry, &sels.regular_price), sale)
    } else {
        (first_price(entry, &sels.price), None)
    };

    Some(PriceRecord::new(name, regular_price, sale_price))
}

/// Extracts a snapshot from a catalog page.
///
/// Fails only when the product container is missing; a container without
/// recognizable entries yields an empty snapshot.
pub fn parse_catalog(html: &str) -> Result<Snapshot> {
    let sels = CatalogSelectors::new()?;
    let doc = Html::parse_document(html);
    let container = doc
        .select(&sels.container)
        .next()
        .ok_or_else(|| anyhow!("product container not found"))?;

    let mut snapshot = Snapshot::new();
    for entry in container.select(&sels.entry).filter(|e| e.id() != container.id()) {
        if let Some(record) = extract_record(entry, &sels) {
            snapshot.insert(record.name.clone(), record);
        }
    }
    Ok(snapshot)
}

pub struct CatalogFetcher {
    url: String,
    client: Client,
}

impl CatalogFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .gzip(true)
            .build()
            .context("build http client")?;
        Ok(Self {
            url: settings.scrape_url.clone(),
            client,
        })
    }

    pub fn try_fetch(&self) -> Result<Snapshot> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .with_context(|| format!("GET {}", self.url))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("GET {} returned {status}", self.url));
        }
        let body = resp.text().with_context(|| format!("read body of {}", self.url))?;
        parse_catalog(&body)
    }
}

impl CatalogSource for CatalogFetcher {
    fn fetch(&self) -> Snapshot {
        log::info!("fetch.start url={}", self.url);
        match self.try_fetch() {
            Ok(snapshot) => {
                let on_sale = snapshot.values().filter(|r| r.is_on_sale()).count();
                log::info!(
                    "fetch.ok url={} products={} on_sale={}",
                    self.url,
                    snapshot.len(),
                    on_sale
                );
                snapshot
            }
            Err(e) => {
                log::error!("fetch.error url={} err={:#}", self.url, e);
                Snapshot::new()
            }
        }
    }
}
