//! Maps raw specification tables onto the canonical record.
//!
//! Each canonical field has an ordered alias list of (category, label) pairs.
//! Lookup runs three passes over the list: exact, case-insensitive, then
//! label substring. The first hit in the earliest pass wins.

use crate::gsmarena::models::{
    DeviceRecord, DeviceStub, Price, RawSpecMap, Specifications, NOT_AVAILABLE, SOURCE,
};
use crate::gsmarena::parser::{brand_of, DevicePage};
use chrono::{NaiveDate, Utc};
use regex_lite::Regex;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// A (category, label) pair naming one phrasing of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alias {
    pub category: &'static str,
    pub label: &'static str,
}

const fn alias(category: &'static str, label: &'static str) -> Alias {
    Alias { category, label }
}

pub mod aliases {
    use super::{alias, Alias};

    pub const DISPLAY: &[Alias] =
        &[alias("Display", "Size"), alias("Display", "Screen size"), alias("Display", "Display size")];
    pub const RESOLUTION: &[Alias] =
        &[alias("Display", "Resolution"), alias("Display", "Screen resolution")];
    pub const DISPLAY_TYPE: &[Alias] =
        &[alias("Display", "Type"), alias("Display", "Display type"), alias("Display", "Panel")];
    pub const CPU: &[Alias] = &[
        alias("Platform", "Chipset"),
        alias("Platform", "CPU"),
        alias("Hardware", "Processor"),
        alias("Hardware", "CPU"),
    ];
    pub const RAM: &[Alias] = &[
        alias("Hardware", "RAM"),
        alias("Memory", "RAM"),
        alias("Memory", "Memory"),
        alias("Memory", "Internal"),
    ];
    pub const STORAGE: &[Alias] = &[
        alias("Memory", "Storage"),
        alias("Hardware", "Storage"),
        alias("Memory", "Internal"),
        alias("Memory", "Card slot"),
    ];
    pub const GPU: &[Alias] =
        &[alias("Platform", "GPU"), alias("Hardware", "GPU"), alias("Hardware", "Graphics")];
    pub const CAMERA: &[Alias] = &[
        alias("Main Camera", "Single"),
        alias("Main Camera", "Dual"),
        alias("Main Camera", "Triple"),
        alias("Main Camera", "Quad"),
        alias("Main Camera", "Five"),
        alias("Camera", "Main"),
        alias("Camera", "Primary"),
        alias("Camera", "Rear"),
    ];
    pub const FRONT_CAMERA: &[Alias] = &[
        alias("Selfie camera", "Single"),
        alias("Selfie camera", "Dual"),
        alias("Camera", "Front"),
        alias("Camera", "Selfie"),
        alias("Camera", "Secondary"),
    ];
    pub const VIDEO: &[Alias] = &[
        alias("Main Camera", "Video"),
        alias("Camera", "Video"),
        alias("Selfie camera", "Video"),
    ];
    pub const BATTERY: &[Alias] =
        &[alias("Battery", "Type"), alias("Battery", "Capacity"), alias("Battery", "Battery")];
    pub const CHARGING: &[Alias] =
        &[alias("Battery", "Charging"), alias("Battery", "Fast charging"), alias("Battery", "Charger")];
    pub const RELEASE: &[Alias] =
        &[alias("Launch", "Announced"), alias("Launch", "Status"), alias("Launch", "Released")];
    pub const PRICE: &[Alias] = &[alias("Misc", "Price"), alias("Pricing", "Price")];
}

type MatchPass = fn(&RawSpecMap, &Alias) -> Option<String>;

/// Lookup passes, strictest first.
const PASSES: [(&str, MatchPass); 3] =
    [("exact", exact_match), ("case-insensitive", case_insensitive_match), ("substring", substring_match)];

fn usable(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn exact_match(specs: &RawSpecMap, alias: &Alias) -> Option<String> {
    specs.get(alias.category)?.get(alias.label).and_then(|v| usable(v))
}

fn case_insensitive_match(specs: &RawSpecMap, alias: &Alias) -> Option<String> {
    specs
        .iter()
        .filter(|(category, _)| category.eq_ignore_ascii_case(alias.category))
        .flat_map(|(_, fields)| fields.iter())
        .filter(|(label, _)| label.eq_ignore_ascii_case(alias.label))
        .find_map(|(_, value)| usable(value))
}

fn substring_match(specs: &RawSpecMap, alias: &Alias) -> Option<String> {
    let needle = alias.label.to_lowercase();
    specs
        .iter()
        .filter(|(category, _)| category.eq_ignore_ascii_case(alias.category))
        .flat_map(|(_, fields)| fields.iter())
        .filter(|(label, _)| label.to_lowercase().contains(&needle))
        .find_map(|(_, value)| usable(value))
}

/// Resolves a field through its alias list, or `None` if nothing matches.
pub fn resolve(specs: &RawSpecMap, aliases: &[Alias]) -> Option<String> {
    for (pass, matcher) in PASSES {
        for alias in aliases {
            if let Some(value) = matcher(specs, alias) {
                trace!("Resolved {}/{} via {} match", alias.category, alias.label, pass);
                return Some(value);
            }
        }
    }
    None
}

fn resolve_or_na(specs: &RawSpecMap, aliases: &[Alias]) -> String {
    resolve(specs, aliases).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Maps a raw specification map onto the twelve canonical fields.
pub fn normalize_specs(specs: &RawSpecMap) -> Specifications {
    Specifications {
        display: resolve_or_na(specs, aliases::DISPLAY),
        resolution: resolve_or_na(specs, aliases::RESOLUTION),
        display_type: resolve_or_na(specs, aliases::DISPLAY_TYPE),
        cpu: resolve_or_na(specs, aliases::CPU),
        ram: resolve_or_na(specs, aliases::RAM),
        storage: resolve_or_na(specs, aliases::STORAGE),
        gpu: resolve_or_na(specs, aliases::GPU),
        camera: resolve_or_na(specs, aliases::CAMERA),
        front_camera: resolve_or_na(specs, aliases::FRONT_CAMERA),
        video: resolve_or_na(specs, aliases::VIDEO),
        battery: resolve_or_na(specs, aliases::BATTERY),
        charging: resolve_or_na(specs, aliases::CHARGING),
    }
}

enum DateShape {
    /// Complete date
    Full(&'static str),
    /// Month and year only; resolves to the first of the month
    YearMonth(&'static str),
    /// Bare year; resolves to January 1st
    Year,
}

const DATE_SHAPES: &[DateShape] = &[
    DateShape::Full("%Y, %B %d"),
    DateShape::YearMonth("%Y, %B"),
    DateShape::YearMonth("%B %Y"),
    DateShape::Year,
];

/// Strips trailing annotations such as `. Released 2023, September 22`.
fn clean_date_text(raw: &str) -> &str {
    let mut text = raw;
    for marker in [".", "Released", "Status"] {
        if let Some(idx) = text.find(marker) {
            text = &text[..idx];
        }
    }
    text.trim().trim_end_matches(',').trim()
}

/// Parses a launch announcement string.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let text = clean_date_text(raw);
    if text.is_empty() {
        return None;
    }

    DATE_SHAPES.iter().find_map(|shape| match shape {
        DateShape::Full(fmt) => NaiveDate::parse_from_str(text, fmt).ok(),
        DateShape::YearMonth(fmt) => {
            NaiveDate::parse_from_str(&format!("{text} 1"), &format!("{fmt} %d")).ok()
        }
        DateShape::Year => {
            if text.len() != 4 {
                return None;
            }
            text.parse::<i32>().ok().and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        }
    })
}

/// Release date from the first launch alias whose value parses.
pub fn release_date(specs: &RawSpecMap) -> Option<NaiveDate> {
    aliases::RELEASE
        .iter()
        .filter_map(|alias| resolve(specs, std::slice::from_ref(alias)))
        .find_map(|value| parse_release_date(&value))
}

static PRICE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?")
        .unwrap_or_else(|e| panic!("invalid price pattern: {e}"))
});

const CURRENCY_MARKERS: &[(&str, &str)] = &[
    ("$", "USD"),
    ("USD", "USD"),
    ("€", "EUR"),
    ("EUR", "EUR"),
    ("£", "GBP"),
    ("GBP", "GBP"),
    ("₹", "INR"),
    ("INR", "INR"),
];

/// Default currency when the fragment carries no marker.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Extracts the first amount in a price fragment, with its currency.
///
/// The currency is taken from the earliest symbol or code in the text.
pub fn extract_price(fragment: &str) -> Option<Price> {
    let number = PRICE_NUMBER.find(fragment)?;
    let amount: f64 = number.as_str().replace(',', "").parse().ok()?;

    let currency = CURRENCY_MARKERS
        .iter()
        .filter_map(|(marker, code)| fragment.find(marker).map(|idx| (idx, *code)))
        .min_by_key(|(idx, _)| *idx)
        .map(|(_, code)| code)
        .unwrap_or(DEFAULT_CURRENCY);

    Some(Price::new(amount, currency))
}

/// Builds the canonical record for a parsed detail page.
///
/// Name and image fall back to the search stub when the page lacks them,
/// then to the id.
pub fn build_record(
    id: &str,
    source_url: &str,
    page: &DevicePage,
    stub: Option<&DeviceStub>,
) -> DeviceRecord {
    let name = page
        .name
        .clone()
        .or_else(|| stub.map(|s| s.name.clone()))
        .unwrap_or_else(|| id.to_string());

    let price = page
        .price_text
        .as_deref()
        .and_then(extract_price)
        .or_else(|| resolve(&page.specs, aliases::PRICE).and_then(|p| extract_price(&p)));

    let specifications = normalize_specs(&page.specs);
    debug!("Normalized {}: {}/12 fields resolved", id, specifications.resolved_count());

    DeviceRecord {
        id: id.to_string(),
        brand: brand_of(&name),
        name,
        image_url: page.image_url.clone().or_else(|| stub.and_then(|s| s.image_url.clone())),
        release_date: release_date(&page.specs),
        price,
        specifications,
        source_url: source_url.to_string(),
        source: SOURCE.to_string(),
        last_updated: Utc::now(),
    }
}
