//! Flat form submissions to a session config document.
//!
//! Keys map structurally, with no validation: `a.b` nests objects and a
//! trailing `[]` accumulates values into an array in submission order.
//! Everything else is a plain string assignment, the last one winning.
use serde_json::{Map, Value};

/// Sections every generated document carries, even when left empty.
const SKELETON: [(&str, fn() -> Value); 6] = [
    ("personalInfo", object),
    ("jobPreferences", object),
    ("experience", array),
    ("education", array),
    ("preferences", object),
    ("blacklist", object),
];

fn object() -> Value {
    Value::Object(Map::new())
}

fn array() -> Value {
    Value::Array(Vec::new())
}

/// Build a config document from form entries.
///
/// ```
/// use applybot_config::generate_config;
/// use serde_json::json;
///
/// let doc = generate_config([
///     ("personalInfo.fullName", "Jane Doe"),
///     ("jobPreferences.jobTitles[]", "Backend Engineer"),
///     ("jobPreferences.jobTitles[]", "SRE"),
/// ]);
/// assert_eq!(doc["personalInfo"]["fullName"], "Jane Doe");
/// assert_eq!(doc["jobPreferences"]["jobTitles"], json!(["Backend Engineer", "SRE"]));
/// assert_eq!(doc["experience"], json!([]));
/// ```
pub fn generate_config<I, K, V>(entries: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut root: Map<String, Value> = SKELETON
        .iter()
        .map(|(key, empty)| (key.to_string(), empty()))
        .collect();

    'entries: for (key, value) in entries {
        let key = key.as_ref().trim();
        let (path, push) = match key.strip_suffix("[]") {
            Some(base) => (base, true),
            None => (key, false),
        };
        let mut segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        let Some(leaf) = segments.pop() else {
            continue;
        };

        let mut node = &mut root;
        for segment in segments {
            let slot = node.entry(segment.to_string()).or_insert_with(object);
            if !slot.is_object() {
                *slot = object();
            }
            let Value::Object(next) = slot else {
                continue 'entries;
            };
            node = next;
        }

        let value = Value::String(value.into());
        if push {
            let slot = node.entry(leaf.to_string()).or_insert_with(array);
            match slot {
                Value::Array(items) => items.push(value),
                other => *other = Value::Array(vec![value]),
            }
        } else {
            node.insert(leaf.to_string(), value);
        }
    }
    Value::Object(root)
}
