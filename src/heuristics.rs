//! Single-label text classifiers shared by the extractors and the validator.
//!
//! Each classifier is an ordered table of `(label, keywords)` rows evaluated
//! top to bottom; the first row with a keyword contained in the lowercased
//! text wins. Row order is part of the behaviour.

pub const SUBJECT_KEYWORDS: &[&str] = &["hemp", "cannabis", "cbd", "cannabinoid"];

pub const UNSPECIFIED_PART: &str = "unspecified";
pub const OTHER_INDUSTRY: &str = "Other";

pub const PLANT_PART_RULES: &[(&str, &[&str])] = &[
    // "oil" is pressed from seed; must come before any row that could claim it.
    ("seed", &["oil"]),
    ("seed", &["seed", "grain", "kernel", "heart", "protein"]),
    ("fiber", &["fiber", "fibre", "bast", "textile", "rope", "fabric", "yarn"]),
    ("flower", &["flower", "bud", "inflorescence", "cbd", "cannabinoid", "terpene"]),
    ("leaf", &["leaf", "leaves", "foliage"]),
    ("root", &["root", "rhizome"]),
    ("stem", &["stem", "stalk", "hurd", "shiv", "hempcrete"]),
];

pub const INDUSTRY_RULES: &[(&str, &[&str])] = &[
    ("Food & Nutrition", &["food", "nutrition", "dietary", "supplement", "protein", "cooking", "beverage"]),
    ("Textiles", &["textile", "fabric", "clothing", "apparel", "fashion", "rope", "yarn"]),
    ("Construction", &["construction", "building", "insulation", "concrete", "hempcrete"]),
    ("Automotive", &["automotive", "vehicle", "automobile", "car part"]),
    ("Cosmetics", &["cosmetic", "beauty", "skincare", "skin care", "personal care", "lotion"]),
    ("Pharmaceutical", &["pharmaceutical", "medicine", "medical", "drug", "therapy", "therapeutic"]),
    ("Paper", &["paper", "pulp", "cardboard"]),
    ("Bioplastics", &["bioplastic", "plastic", "polymer", "composite"]),
    ("Energy", &["energy", "biofuel", "fuel", "biomass", "battery"]),
    ("Agriculture", &["animal bedding", "bedding", "mulch", "feed", "agricultur"]),
];

pub fn is_subject_related(text: &str) -> bool {
    let lower = text.to_lowercase();
    SUBJECT_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub fn detect_plant_part(text: &str) -> String {
    first_match(PLANT_PART_RULES, text)
        .unwrap_or(UNSPECIFIED_PART)
        .to_string()
}

pub fn detect_industry(text: &str) -> String {
    first_match(INDUSTRY_RULES, text)
        .unwrap_or(OTHER_INDUSTRY)
        .to_string()
}

fn first_match(rules: &[(&'static str, &[&str])], text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(label, _)| *label)
}

/// True for strings made only of digits plus number punctuation, e.g. "42" or "1,200.5".
pub fn is_numeric(s: &str) -> bool {
    let t = s.trim();
    !t.is_empty()
        && t.chars().any(|c| c.is_ascii_digit())
        && t.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+' | ' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_detection_is_case_insensitive() {
        assert!(is_subject_related("Industrial HEMP fibres"));
        assert!(is_subject_related("Full-spectrum CBD tincture"));
        assert!(!is_subject_related("Cotton t-shirt"));
    }

    #[test]
    fn oil_maps_to_seed_before_other_rows() {
        assert_eq!(detect_plant_part("hemp oil"), "seed");
        // "cbd" alone is a flower term but "oil" is evaluated first
        assert_eq!(detect_plant_part("CBD oil drops"), "seed");
        assert_eq!(detect_plant_part("CBD isolate"), "flower");
    }

    #[test]
    fn plant_part_table_order() {
        assert_eq!(detect_plant_part("Hemp seed protein powder"), "seed");
        assert_eq!(detect_plant_part("bast fibre yarn"), "fiber");
        // seed row shadows the stem row when both appear
        assert_eq!(detect_plant_part("stalk and seed blend"), "seed");
        assert_eq!(detect_plant_part("hurd bedding"), "stem");
        assert_eq!(detect_plant_part("hemp leaves tea"), "leaf");
        assert_eq!(detect_plant_part("something else"), UNSPECIFIED_PART);
    }

    #[test]
    fn industry_table_order() {
        assert_eq!(detect_industry("Used in cooking"), "Food & Nutrition");
        assert_eq!(detect_industry("Used in textiles"), "Textiles");
        assert_eq!(detect_industry("hempcrete blocks"), "Construction");
        assert_eq!(detect_industry("natural skincare balm"), "Cosmetics");
        assert_eq!(detect_industry("no idea"), OTHER_INDUSTRY);
    }

    #[test]
    fn every_rule_row_has_keywords() {
        for (label, keywords) in PLANT_PART_RULES.iter().chain(INDUSTRY_RULES) {
            assert!(!keywords.is_empty(), "{label} has no keywords");
            assert!(keywords.iter().all(|k| *k == k.to_lowercase()));
        }
    }

    #[test]
    fn numeric_strings() {
        assert!(is_numeric("12345"));
        assert!(is_numeric(" 42 "));
        assert!(is_numeric("1,200.50"));
        assert!(!is_numeric("Hemp 42"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("--"));
    }
}
