//! CSS selectors for GSMArena HTML parsing.
//!
//! Every lookup that has changed across site generations is an ordered list
//! of variants, tried first to last by the parser. When parsing starts coming
//! back empty, capture the page, add the new variant at the front of the
//! relevant list, and add a fixture.

use scraper::Selector;
use std::sync::LazyLock;

fn compile(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

/// Selectors for search results and the popular-devices listing.
pub mod results {
    use super::*;

    /// A container variant and the entry selector used inside it.
    pub struct ListVariant {
        pub container: Selector,
        pub entry: Selector,
    }

    fn variant(container: &str, entry: &str) -> ListVariant {
        ListVariant { container: compile(container), entry: compile(entry) }
    }

    /// Search results containers, newest markup first.
    pub static SEARCH: LazyLock<Vec<ListVariant>> = LazyLock::new(|| {
        vec![
            variant(".makers", "li"),
            variant("#review-body .makers", "li"),
            variant(".section-body .makers", "li"),
            variant("#review-body", "li"),
        ]
    });

    /// Home page lists used for the popular listing. Tried after [`SEARCH`].
    pub static POPULAR: LazyLock<Vec<ListVariant>> = LazyLock::new(|| {
        vec![
            variant(".module-phones.module-latest", "a.module-phones-link"),
            variant("table.module-fit", "td a"),
            variant(".module-phones", "li"),
        ]
    });

    /// Marker that the rendered home page lists are ready.
    pub const POPULAR_READY_MARKER: &str = ".module-phones, table.module-fit";

    /// Anchor inside an entry.
    pub static ANCHOR: LazyLock<Selector> = LazyLock::new(|| compile("a"));

    /// Thumbnail inside an entry.
    pub static IMAGE: LazyLock<Selector> = LazyLock::new(|| compile("img"));
}

/// Selectors for device detail pages.
pub mod detail {
    use super::*;

    /// How label and value are located within a row.
    pub enum Cells {
        /// Dedicated label and value elements.
        Pair(Selector, Selector),
        /// First and second `td` of the row.
        Positional,
    }

    /// One generation of specification markup.
    pub struct SpecStrategy {
        pub name: &'static str,
        /// Blocks holding one or more categories
        pub block: Selector,
        /// Category heading; checked on the block and on every row
        pub heading: Selector,
        pub row: Selector,
        /// Label/value lookups tried in order for each row
        pub cells: Vec<Cells>,
    }

    fn pair(label: &str, value: &str) -> Cells {
        Cells::Pair(compile(label), compile(value))
    }

    /// Specification strategies, current layout first.
    pub static SPEC_STRATEGIES: LazyLock<Vec<SpecStrategy>> = LazyLock::new(|| {
        vec![
            SpecStrategy {
                name: "specs-list",
                block: compile("#specs-list table"),
                heading: compile("th"),
                row: compile("tr"),
                cells: vec![pair("td.ttl", "td.nfo"), Cells::Positional],
            },
            SpecStrategy {
                name: "legacy-table",
                block: compile("table.specs, div.specs-list table"),
                heading: compile("tr.head, th"),
                row: compile("tr"),
                cells: vec![Cells::Positional, pair("td.ttl", "td.nfo")],
            },
            SpecStrategy {
                name: "spec-group",
                block: compile("div.spec-group"),
                heading: compile("h3, .spec-title"),
                row: compile("li"),
                cells: vec![pair("span.label", "span.value"), pair(".label", ".value")],
            },
        ]
    });

    /// Any table cell, for positional lookup.
    pub static CELL: LazyLock<Selector> = LazyLock::new(|| compile("td"));

    /// Device name heading, in order of preference.
    pub static NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        vec![
            compile("h1.specs-phone-name-title"),
            compile("h1[data-spec=modelname]"),
            compile("h1"),
        ]
    });

    /// Main product photo.
    pub static IMAGE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        vec![compile(".specs-photo-main img"), compile(".review-header img")]
    });

    /// Price fragment shown on the page.
    pub static PRICE: LazyLock<Vec<Selector>> =
        LazyLock::new(|| vec![compile("td[data-spec=price]"), compile(".price")]);

    /// Marker that the rendered detail page is ready.
    pub const READY_MARKER: &str = "#specs-list, .specs-phone-name-title";
}

/// Marker that the rendered results page is ready.
pub const RESULTS_READY_MARKER: &str = ".makers, #review-body";
