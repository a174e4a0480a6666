use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::truncate;
use crate::heuristics::{detect_industry, detect_plant_part, is_subject_related};
use crate::record::RawRecord;

// Constant selectors; parse cannot fail.
static LI: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());
static DL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dl").unwrap());

static NAME_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.{3,120}?)\s*(?::|\s[-–—]\s)\s*(.+)$").unwrap());

const MAX_ITEM_NAME: usize = 100;

/// Scan list items, two-column table rows and definition lists independently.
/// The same fact can come back from more than one pattern.
pub fn extract(content: &str, source_url: &str) -> Vec<RawRecord> {
    let doc = Html::parse_document(content);
    let mut records = Vec::new();
    records.extend(list_items(&doc, source_url));
    records.extend(table_rows(&doc, source_url));
    records.extend(definition_lists(&doc, source_url));
    records
}

fn element_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn build(name: &str, description: &str, source_url: &str) -> RawRecord {
    let combined = format!("{} {}", name, description);
    RawRecord::new(
        name,
        description,
        detect_plant_part(&combined),
        detect_industry(&combined),
        source_url,
    )
}

fn list_items(doc: &Html, source_url: &str) -> Vec<RawRecord> {
    doc.select(&LI)
        .filter_map(|li| {
            let text = element_text(&li);
            if text.is_empty() || !is_subject_related(&text) {
                return None;
            }
            let record = match NAME_SPLIT_RE.captures(&text) {
                Some(caps) => build(caps[1].trim(), caps[2].trim(), source_url),
                None => build(&truncate(&text, MAX_ITEM_NAME), &text, source_url),
            };
            Some(record)
        })
        .collect()
}

fn table_rows(doc: &Html, source_url: &str) -> Vec<RawRecord> {
    doc.select(&TR)
        .filter_map(|tr| {
            let cells: Vec<String> = tr.select(&CELL).map(|c| element_text(&c)).collect();
            if cells.len() != 2 || cells[0].is_empty() {
                return None;
            }
            let combined = format!("{} {}", cells[0], cells[1]);
            if !is_subject_related(&combined) {
                return None;
            }
            Some(build(&cells[0], &cells[1], source_url))
        })
        .collect()
}

fn definition_lists(doc: &Html, source_url: &str) -> Vec<RawRecord> {
    let mut records = Vec::new();
    for dl in doc.select(&DL) {
        let mut term: Option<String> = None;
        for child in dl.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "dt" => term = Some(element_text(&child)),
                "dd" => {
                    let Some(name) = term.take().filter(|t| !t.is_empty()) else {
                        continue;
                    };
                    let description = element_text(&child);
                    if is_subject_related(&format!("{} {}", name, description)) {
                        records.push(build(&name, &description, source_url));
                    }
                }
                _ => {}
            }
        }
    }
    records
}
