//! HTML parser for GSMArena results listings and device pages.
//!
//! Nothing here fails: malformed entries are skipped and pages that match no
//! known markup produce empty output.

use crate::gsmarena::models::{DeviceStub, RawSpecMap};
use crate::gsmarena::selectors::detail::{self, Cells, SpecStrategy};
use crate::gsmarena::selectors::results::{self, ListVariant};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Hard ceiling on stubs returned from one listing.
pub const MAX_RESULTS: usize = 5;

/// Category used when a specification block has no heading.
pub const DEFAULT_CATEGORY: &str = "General";

/// Everything read from a device detail page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevicePage {
    pub name: Option<String>,
    pub image_url: Option<String>,
    /// Raw price text from the page header, if shown
    pub price_text: Option<String>,
    pub specs: RawSpecMap,
}

/// Parser for GSMArena HTML pages.
#[derive(Debug, Clone)]
pub struct Parser {
    base_url: String,
    max_results: usize,
}

impl Parser {
    /// Creates a parser resolving relative links against `base_url`.
    /// `max_results` is clamped to `1..=MAX_RESULTS`.
    pub fn new(base_url: impl Into<String>, max_results: usize) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_results: max_results.clamp(1, MAX_RESULTS),
        }
    }

    /// Parses a search results page into ordered, deduplicated stubs.
    pub fn parse_results(&self, html: &str, query: &str) -> Vec<DeviceStub> {
        let document = Html::parse_document(html);
        let stubs = self.parse_listing(&document, results::SEARCH.iter());
        debug!("Parsed {} results for '{}'", stubs.len(), query);
        stubs
    }

    /// Parses the home page device lists used for the popular listing.
    pub fn parse_popular(&self, html: &str) -> Vec<DeviceStub> {
        let document = Html::parse_document(html);
        let stubs =
            self.parse_listing(&document, results::SEARCH.iter().chain(results::POPULAR.iter()));
        debug!("Parsed {} popular devices", stubs.len());
        stubs
    }

    /// Parses only the specification tables of a detail page.
    pub fn parse_specs(&self, html: &str) -> RawSpecMap {
        extract_specs(&Html::parse_document(html))
    }

    /// Parses header fields and specification tables of a detail page.
    pub fn parse_device_page(&self, html: &str) -> DevicePage {
        let document = Html::parse_document(html);

        let name = first_text(&document, &detail::NAME);
        let image_url = detail::IMAGE
            .iter()
            .filter_map(|sel| document.select(sel).next())
            .find_map(|img| img.value().attr("src"))
            .map(|src| self.absolute_url(src));
        let price_text = first_text(&document, &detail::PRICE);

        DevicePage { name, image_url, price_text, specs: extract_specs(&document) }
    }

    /// Result cap applied to listings.
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Resolves a possibly relative link against the base URL.
    pub fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if let Some(rest) = href.strip_prefix("//") {
            format!("https://{}", rest)
        } else {
            format!("{}/{}", self.base_url, href.trim_start_matches('/'))
        }
    }

    /// Tries each list variant in order; the first yielding a stub wins.
    fn parse_listing<'a>(
        &self,
        document: &Html,
        variants: impl Iterator<Item = &'a ListVariant>,
    ) -> Vec<DeviceStub> {
        for variant in variants {
            let Some(container) = document.select(&variant.container).next() else {
                continue;
            };

            let mut seen = HashSet::new();
            let mut stubs = Vec::new();

            for entry in container.select(&variant.entry) {
                let Some(stub) = self.parse_entry(entry) else {
                    trace!("Skipping malformed result entry");
                    continue;
                };
                if !seen.insert(stub.detail_url.clone()) {
                    trace!("Skipping duplicate: {}", stub.detail_url);
                    continue;
                }
                stubs.push(stub);
                if stubs.len() == self.max_results {
                    break;
                }
            }

            if !stubs.is_empty() {
                return stubs;
            }
        }

        Vec::new()
    }

    fn parse_entry(&self, entry: ElementRef) -> Option<DeviceStub> {
        let anchor = if entry.value().name() == "a" {
            entry
        } else {
            entry.select(&results::ANCHOR).next()?
        };

        let href = anchor.value().attr("href")?.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || !href.ends_with(".php")
        {
            return None;
        }

        let name = clean_text(anchor);
        if name.is_empty() {
            return None;
        }

        let id = href.rsplit('/').next()?.trim_end_matches(".php").to_string();
        if id.is_empty() {
            return None;
        }

        let image_url = entry
            .select(&results::IMAGE)
            .next()
            .and_then(|img| img.value().attr("src"))
            .filter(|src| !src.trim().is_empty())
            .map(|src| self.absolute_url(src.trim()));

        trace!("Parsed entry: {} ({})", name, id);

        Some(DeviceStub {
            brand: brand_of(&name),
            detail_url: self.absolute_url(href),
            id,
            name,
            image_url,
        })
    }
}

/// First whitespace-separated token of a multi-word name, else "Unknown".
pub fn brand_of(name: &str) -> String {
    let mut tokens = name.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(first), Some(_)) => first.to_string(),
        _ => "Unknown".to_string(),
    }
}

/// Element text with text nodes joined by a space and whitespace collapsed.
fn clean_text(element: ElementRef) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_text(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors
        .iter()
        .filter_map(|sel| document.select(sel).next())
        .map(clean_text)
        .find(|text| !text.is_empty())
}

fn extract_specs(document: &Html) -> RawSpecMap {
    for strategy in detail::SPEC_STRATEGIES.iter() {
        let specs = apply_strategy(document, strategy);
        if !specs.is_empty() {
            debug!(
                strategy = strategy.name,
                categories = specs.len(),
                "Parsed specification tables"
            );
            return specs;
        }
        trace!("Spec strategy {} matched nothing", strategy.name);
    }

    debug!("No specification markup recognized");
    RawSpecMap::new()
}

fn apply_strategy(document: &Html, strategy: &SpecStrategy) -> RawSpecMap {
    let mut specs = RawSpecMap::new();

    for block in document.select(&strategy.block) {
        let mut category = block
            .select(&strategy.heading)
            .next()
            .map(clean_text)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let mut last_label: Option<String> = None;

        for row in block.select(&strategy.row) {
            if let Some(heading) = row_heading(row, &strategy.heading) {
                if heading != category {
                    category = heading;
                    last_label = None;
                }
            }

            let Some((label, value)) = read_cells(row, &strategy.cells) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }

            let fields = specs.entry(category.clone()).or_default();

            // Continuation row: extends the previous field
            if label.is_empty() {
                if let Some(existing) = last_label.as_ref().and_then(|l| fields.get_mut(l)) {
                    existing.push('\n');
                    existing.push_str(&value);
                }
                continue;
            }

            fields.insert(label.clone(), value);
            last_label = Some(label);
        }
    }

    specs.retain(|_, fields| !fields.is_empty());
    specs
}

fn row_heading(row: ElementRef, heading: &Selector) -> Option<String> {
    let element = if heading.matches(&row) { Some(row) } else { row.select(heading).next() };
    element.map(clean_text).filter(|text| !text.is_empty())
}

fn read_cells(row: ElementRef, cascade: &[Cells]) -> Option<(String, String)> {
    cascade.iter().find_map(|cells| match cells {
        Cells::Pair(label, value) => {
            let label = row.select(label).next()?;
            let value = row.select(value).map(clean_text).find(|v| !v.is_empty())?;
            Some((clean_text(label), value))
        }
        Cells::Positional => {
            let mut tds = row.select(&detail::CELL);
            let label = tds.next()?;
            let value = clean_text(tds.next()?);
            (!value.is_empty()).then(|| (clean_text(label), value))
        }
    })
}
