use crate::heuristics::{detect_industry, detect_plant_part};
use crate::record::RawRecord;

const NAME_KEYS: &[&str] = &["name", "product"];
const DESCRIPTION_KEYS: &[&str] = &["description", "use"];
const PART_KEYS: &[&str] = &["part", "component"];
const INDUSTRY_KEYS: &[&str] = &["industry", "sector"];
const BENEFIT_KEYS: &[&str] = &["benefit"];
const SOURCE_KEYS: &[&str] = &["source", "url"];

/// Split one CSV line into trimmed fields.
///
/// A `"` opens a quoted field when nothing but whitespace precedes it in the
/// field; inside quotes `""` is a literal quote and commas are data. An
/// unterminated quote runs to the end of the line.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[derive(Debug, Default, PartialEq)]
struct Columns {
    name: Option<usize>,
    description: Option<usize>,
    part: Option<usize>,
    industry: Option<usize>,
    benefits: Option<usize>,
    source: Option<usize>,
}

impl Columns {
    /// Each target claims the first header containing one of its keys that no
    /// earlier target has claimed.
    fn map(headers: &[String]) -> Self {
        let mut claimed: Vec<usize> = Vec::new();
        let mut pick = |keys: &[&str]| -> Option<usize> {
            let idx = headers
                .iter()
                .enumerate()
                .find(|(i, h)| !claimed.contains(i) && keys.iter().any(|k| h.contains(k)))
                .map(|(i, _)| i)?;
            claimed.push(idx);
            Some(idx)
        };
        Columns {
            name: pick(NAME_KEYS),
            description: pick(DESCRIPTION_KEYS),
            part: pick(PART_KEYS),
            industry: pick(INDUSTRY_KEYS),
            benefits: pick(BENEFIT_KEYS),
            source: pick(SOURCE_KEYS),
        }
    }
}

fn cell(fields: &[String], col: Option<usize>) -> Option<&str> {
    col.and_then(|i| fields.get(i))
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
}

pub fn extract(content: &str, source_url: &str) -> Vec<RawRecord> {
    let mut lines = content
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}'))
        .filter(|l| !l.trim().is_empty());

    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = parse_line(header).into_iter().map(|h| h.to_lowercase()).collect();
    let cols = Columns::map(&headers);

    lines
        .filter_map(|line| {
            let fields = parse_line(line);
            let name = cell(&fields, cols.name)?;

            let plant_part = cell(&fields, cols.part)
                .map(str::to_string)
                .unwrap_or_else(|| detect_plant_part(line));
            let industry = cell(&fields, cols.industry)
                .map(str::to_string)
                .unwrap_or_else(|| detect_industry(line));
            let benefits = cell(&fields, cols.benefits).map(|b| {
                b.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            });

            Some(RawRecord {
                benefits: benefits.filter(|b| !b.is_empty()),
                ..RawRecord::new(
                    name,
                    cell(&fields, cols.description).unwrap_or(""),
                    plant_part,
                    industry,
                    cell(&fields, cols.source).unwrap_or(source_url),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_comma_is_preserved() {
        let fields = parse_line(r#"Hemp Seed, "High in Omega-3, Omega-6",seed"#);
        assert_eq!(fields, vec!["Hemp Seed", "High in Omega-3, Omega-6", "seed"]);
    }

    #[test]
    fn doubled_quotes_escape() {
        let fields = parse_line(r#""The ""original"" hemp rope",fiber"#);
        assert_eq!(fields, vec![r#"The "original" hemp rope"#, "fiber"]);
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_line() {
        let fields = parse_line(r#"Hempcrete,"Blocks, panels, and render"#);
        assert_eq!(fields, vec!["Hempcrete", "Blocks, panels, and render"]);
    }

    #[test]
    fn empty_fields_kept() {
        assert_eq!(parse_line("a,,c,"), vec!["a", "", "c", ""]);
    }

    #[test]
    fn fuzzy_header_mapping() {
        let csv = "Product Name,Use Case,Plant Part\nHemp Fiber Rope,Used in textiles,fiber\n";
        let records = extract(csv, "https://a.org/ropes.csv");
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.name, "Hemp Fiber Rope");
        assert_eq!(r.description, "Used in textiles");
        assert_eq!(r.plant_part, "fiber");
        // no industry column: detected from the whole line
        assert_eq!(r.industry, "Textiles");
        assert_eq!(r.source_url, "https://a.org/ropes.csv");
    }

    #[test]
    fn columns_are_not_claimed_twice() {
        let headers: Vec<String> = ["product use", "description", "sector"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cols = Columns::map(&headers);
        assert_eq!(cols.name, Some(0));
        assert_eq!(cols.description, Some(1));
        assert_eq!(cols.industry, Some(2));
        assert_eq!(cols.part, None);
    }

    #[test]
    fn rows_without_name_are_skipped() {
        let csv = "name,description,benefits,source\n,orphan hemp row,,\nHemp Milk,Dairy-free drink,\"rich in protein, creamy\",https://milk.org\n";
        let records = extract(csv, "https://a.org/x.csv");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Hemp Milk");
        assert_eq!(
            records[0].benefits.as_deref(),
            Some(&["rich in protein".to_string(), "creamy".to_string()][..])
        );
        assert_eq!(records[0].source_url, "https://milk.org");
        // no part column: detected from the line ("protein" is a seed term)
        assert_eq!(records[0].plant_part, "seed");
    }

    #[test]
    fn no_name_column_yields_nothing() {
        let csv = "title,notes\nHemp Rope,fiber\n";
        assert!(extract(csv, "https://a.org/x.csv").is_empty());
    }

    #[test]
    fn fixture_file() {
        let csv = std::fs::read_to_string("tests/fixtures/products.csv").unwrap();
        let records = extract(&csv, "https://a.org/products.csv");
        assert_eq!(records.len(), 4);
        assert!(records.iter().any(|r| r.description.contains(',')));
    }
}
