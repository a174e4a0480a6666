use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::HarvestError;
use crate::heuristics::{detect_industry, detect_plant_part};
use crate::record::RawRecord;

const NAME_ALIASES: &[&str] = &["product", "name", "title", "item", "product_name"];
const DESCRIPTION_ALIASES: &[&str] = &["description", "details", "use", "uses", "application"];
const PART_ALIASES: &[&str] = &["plant_part", "plantpart", "part", "component"];
const INDUSTRY_ALIASES: &[&str] = &["industry", "sector", "category"];
const BENEFIT_ALIASES: &[&str] = &["benefits", "benefit"];
const SPEC_ALIASES: &[&str] = &["technical_specs", "technicalspecs", "specs", "specifications"];
const SUSTAINABILITY_ALIASES: &[&str] = &["sustainability_aspects", "sustainabilityaspects", "sustainability"];
const KEYWORD_ALIASES: &[&str] = &["keywords", "tags"];
const SOURCE_ALIASES: &[&str] = &["source_url", "sourceurl", "source", "url"];

pub fn extract(content: &str, source_url: &str) -> Result<Vec<RawRecord>, HarvestError> {
    let root: Value =
        serde_json::from_str(content).map_err(|e| HarvestError::unsupported(source_url, e))?;

    let items: Vec<&Value> = match &root {
        Value::Array(arr) => arr.iter().collect(),
        Value::Object(obj) => {
            let nested: Vec<&Value> = obj
                .values()
                .filter_map(Value::as_array)
                .flatten()
                .collect();
            if nested.is_empty() {
                vec![&root]
            } else {
                nested
            }
        }
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| RawRecord::from_value(item, source_url))
        .collect())
}

impl RawRecord {
    /// Resolve field aliases on an untyped JSON object. Returns `None` when
    /// the value is not an object or carries no usable name.
    pub fn from_value(value: &Value, source_url: &str) -> Option<RawRecord> {
        let obj = value.as_object()?;
        let name = lookup(obj, NAME_ALIASES).and_then(as_text)?;
        let description = lookup(obj, DESCRIPTION_ALIASES)
            .and_then(as_text)
            .unwrap_or_default();

        let context = format!("{} {}", name, description);
        let plant_part = lookup(obj, PART_ALIASES)
            .and_then(as_text)
            .unwrap_or_else(|| detect_plant_part(&context));
        let industry = lookup(obj, INDUSTRY_ALIASES)
            .and_then(as_text)
            .unwrap_or_else(|| detect_industry(&context));
        let source = lookup(obj, SOURCE_ALIASES)
            .and_then(as_text)
            .unwrap_or_else(|| source_url.to_string());

        Some(RawRecord {
            benefits: lookup(obj, BENEFIT_ALIASES).and_then(as_list),
            technical_specs: lookup(obj, SPEC_ALIASES).and_then(as_map),
            sustainability_aspects: lookup(obj, SUSTAINABILITY_ALIASES).and_then(as_list),
            keywords: lookup(obj, KEYWORD_ALIASES).and_then(as_list),
            ..RawRecord::new(name, description, plant_part, industry, source)
        })
    }
}

/// First alias present on the object, compared case-insensitively.
fn lookup<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        obj.iter()
            .find(|(k, v)| k.to_lowercase() == *alias && !v.is_null())
            .map(|(_, v)| v)
    })
}

fn as_text(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn as_list(v: &Value) -> Option<Vec<String>> {
    let list: Vec<String> = match v {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        _ => return None,
    };
    (!list.is_empty()).then_some(list)
}

fn as_map(v: &Value) -> Option<BTreeMap<String, String>> {
    let obj = v.as_object()?;
    let map: BTreeMap<String, String> = obj
        .iter()
        .filter_map(|(k, v)| match v {
            Value::Bool(b) => Some((k.clone(), b.to_string())),
            other => as_text(other).map(|t| (k.clone(), t)),
        })
        .collect();
    (!map.is_empty()).then_some(map)
}
