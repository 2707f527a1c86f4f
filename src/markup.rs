use regex::Regex;
use scraper::{ElementRef, Html};

use crate::utils::clean_text;

// ============================================================================
// PAGE
// ============================================================================

/// A parsed Ultiorganizer page.
///
/// Every view renders its payload inside `td.tdcontent > div`, so the
/// structural queries here are all scoped to that block.
pub struct Page {
    document: Html,
}

impl Page {
    pub fn parse(html: &str) -> Page {
        Page {
            document: Html::parse_document(html),
        }
    }

    /// Tables directly under the content block, in document order
    pub fn content_tables(&self) -> Vec<ElementRef<'_>> {
        self.document
            .select(selector!("td.tdcontent > div > table"))
            .collect()
    }

    /// Every link in the content block
    pub fn content_links(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.document.select(selector!("td.tdcontent a"))
    }
}

// ============================================================================
// TABLE NAVIGATION
// ============================================================================

/// Rows of `table`, not descending into nested tables.
///
/// The HTML parser wraps bare rows in an implicit `tbody`, so section
/// elements are looked through.
pub fn rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child_elements(child, "tr"));
            }
            _ => {}
        }
    }
    rows
}

/// `td` and `th` cells of a row
pub fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .collect()
}

/// Direct element children with the given tag name
pub fn child_elements<'a>(
    element: ElementRef<'a>,
    name: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

pub fn is_header_cell(cell: ElementRef<'_>) -> bool {
    cell.value().name() == "th"
}

pub fn colspan(cell: ElementRef<'_>) -> u32 {
    cell.value()
        .attr("colspan")
        .and_then(|span| span.trim().parse().ok())
        .unwrap_or(1)
}

/// Whether the element carries `class` among its class tokens
pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Concatenated, whitespace-normalised text content
pub fn text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Runs `pattern` against the element's `href` and parses the first capture
/// group as an id.
pub fn href_id(element: ElementRef<'_>, pattern: &Regex) -> Option<u32> {
    let href = element.value().attr("href")?;
    pattern.captures(href)?.get(1)?.as_str().parse().ok()
}

// ============================================================================
// TESTS
// ============================================================================
