use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::lookup::Lookup;
use super::parse::parse_flag;
use super::types::{Filter, LookupValue, MAX_PATH_DEPTH};

pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Lookup { path, lookup, value } => eval_lookup(get_path(doc, path), *lookup, value),
    }
}

fn eval_lookup(v: Option<&Bson>, lookup: Lookup, value: &LookupValue) -> bool {
    if let (Lookup::IsNull, LookupValue::Flag(want_null)) = (lookup, value) {
        let is_null = matches!(v, None | Some(Bson::Null));
        return is_null == *want_null;
    }
    let Some(v) = v else { return false };
    match (lookup, value) {
        (Lookup::Exact, LookupValue::Text(raw)) => coerced_cmp(v, raw) == Some(Ordering::Equal),
        (Lookup::IExact, LookupValue::Text(raw)) => render(v).to_lowercase() == raw.to_lowercase(),
        (Lookup::Contains, LookupValue::Text(raw)) => render(v).contains(raw.as_str()),
        (Lookup::IContains, LookupValue::Text(raw)) => {
            render(v).to_lowercase().contains(&raw.to_lowercase())
        }
        (Lookup::StartsWith, LookupValue::Text(raw)) => render(v).starts_with(raw.as_str()),
        (Lookup::IStartsWith, LookupValue::Text(raw)) => {
            render(v).to_lowercase().starts_with(&raw.to_lowercase())
        }
        (Lookup::EndsWith, LookupValue::Text(raw)) => render(v).ends_with(raw.as_str()),
        (Lookup::IEndsWith, LookupValue::Text(raw)) => {
            render(v).to_lowercase().ends_with(&raw.to_lowercase())
        }
        (Lookup::Gt, LookupValue::Text(raw)) => coerced_cmp(v, raw) == Some(Ordering::Greater),
        (Lookup::Gte, LookupValue::Text(raw)) => {
            matches!(coerced_cmp(v, raw), Some(Ordering::Greater | Ordering::Equal))
        }
        (Lookup::Lt, LookupValue::Text(raw)) => coerced_cmp(v, raw) == Some(Ordering::Less),
        (Lookup::Lte, LookupValue::Text(raw)) => {
            matches!(coerced_cmp(v, raw), Some(Ordering::Less | Ordering::Equal))
        }
        (Lookup::In, LookupValue::List(items)) => {
            items.iter().any(|raw| coerced_cmp(v, raw) == Some(Ordering::Equal))
        }
        (Lookup::Range, LookupValue::Range(lo, hi)) => {
            matches!(coerced_cmp(v, lo), Some(Ordering::Greater | Ordering::Equal))
                && matches!(coerced_cmp(v, hi), Some(Ordering::Less | Ordering::Equal))
        }
        #[cfg(feature = "regex")]
        (Lookup::Regex | Lookup::IRegex, LookupValue::Pattern(re)) => re.is_match(&render(v)),
        _ => false,
    }
}

/// Compares a stored value against a raw query-string value, coercing the raw
/// text to the stored value's type. `None` when the text does not convert.
pub fn coerced_cmp(v: &Bson, raw: &str) -> Option<Ordering> {
    match v {
        Bson::Int32(i) => cmp_int(i64::from(*i), raw),
        Bson::Int64(i) => cmp_int(*i, raw),
        Bson::Double(f) => raw.trim().parse::<f64>().ok().map(|r| f.total_cmp(&r)),
        Bson::Decimal128(d) => {
            let l = d.to_string().parse::<f64>().ok()?;
            raw.trim().parse::<f64>().ok().map(|r| l.total_cmp(&r))
        }
        Bson::Boolean(b) => parse_flag(raw).map(|r| b.cmp(&r)),
        Bson::String(s) => Some(s.as_str().cmp(raw)),
        Bson::Null => None,
        Bson::DateTime(_) => Some(render(v).as_str().cmp(raw)),
        other => Some(render(other).as_str().cmp(raw)),
    }
}

fn cmp_int(l: i64, raw: &str) -> Option<Ordering> {
    let raw = raw.trim();
    if let Ok(r) = raw.parse::<i64>() {
        return Some(l.cmp(&r));
    }
    #[allow(clippy::cast_precision_loss)]
    let l = l as f64;
    raw.parse::<f64>().ok().map(|r| l.total_cmp(&r))
}

/// Plain-text form of a value, shared by lookups and tabular writers.
pub fn render(v: &Bson) -> String {
    match v {
        Bson::String(s) => s.clone(),
        Bson::Int32(i) => i.to_string(),
        Bson::Int64(i) => i.to_string(),
        Bson::Double(f) => f.to_string(),
        Bson::Boolean(b) => b.to_string(),
        Bson::Null | Bson::Undefined => String::new(),
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::DateTime(dt) => chrono::DateTime::<chrono::Utc>::from_timestamp_millis(dt.timestamp_millis())
            .map(|d| d.to_rfc3339())
            .unwrap_or_default(),
        Bson::Document(_) | Bson::Array(_) => {
            serde_json::to_string(&to_json(v)).unwrap_or_default()
        }
        other => other.to_string(),
    }
}

/// Relaxed JSON form of a value: numbers stay numbers, datetimes become RFC 3339 strings.
pub fn to_json(v: &Bson) -> serde_json::Value {
    use serde_json::Value;
    match v {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(items) => Value::Array(items.iter().map(to_json).collect()),
        Bson::Document(d) => {
            Value::Object(d.iter().map(|(k, v)| (k.clone(), to_json(v))).collect())
        }
        other => Value::String(render(other)),
    }
}

/// Converts parsed JSON into BSON. Integers that fit `i64` stay integers.
pub fn from_json(v: &serde_json::Value) -> Bson {
    use serde_json::Value;
    match v {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => n
            .as_i64()
            .map(Bson::Int64)
            .or_else(|| n.as_f64().map(Bson::Double))
            .unwrap_or(Bson::Null),
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(from_json).collect()),
        Value::Object(map) => {
            let mut d = BsonDocument::new();
            for (k, v) in map {
                d.insert(k.clone(), from_json(v));
            }
            Bson::Document(d)
        }
    }
}

/// Resolves a dotted path, descending into embedded documents.
pub fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut cur = doc;
    let mut parts = path.split('.').peekable();
    let mut segs = 0usize;
    while let Some(part) = parts.next() {
        segs += 1;
        if segs > MAX_PATH_DEPTH {
            return None;
        }
        let v = cur.get(part)?;
        if parts.peek().is_none() {
            return Some(v);
        }
        match v {
            Bson::Document(d) => cur = d,
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse::lookup_filter;
    use bson::doc;

    fn matches(doc: &BsonDocument, key: &str, raw: &str) -> bool {
        eval_filter(doc, &lookup_filter(key, raw).unwrap())
    }

    #[test]
    fn exact_coerces_to_stored_type() {
        let d = doc! {"name": "foo", "age": 30i64, "score": 2.5, "active": true};
        assert!(matches(&d, "name", "foo"));
        assert!(!matches(&d, "name", "Foo"));
        assert!(matches(&d, "age", "30"));
        assert!(!matches(&d, "age", "thirty"));
        assert!(matches(&d, "score__exact", "2.5"));
        assert!(matches(&d, "active", "True"));
    }

    #[test]
    fn text_lookups() {
        let d = doc! {"name": "Widget Pro"};
        assert!(matches(&d, "name__iexact", "widget pro"));
        assert!(matches(&d, "name__contains", "Pro"));
        assert!(!matches(&d, "name__contains", "pro"));
        assert!(matches(&d, "name__icontains", "pro"));
        assert!(matches(&d, "name__startswith", "Wid"));
        assert!(matches(&d, "name__istartswith", "wid"));
        assert!(matches(&d, "name__endswith", "Pro"));
        assert!(matches(&d, "name__iendswith", "PRO"));
    }

    #[test]
    fn ordering_lookups() {
        let d = doc! {"qty": 10i32};
        assert!(matches(&d, "qty__gt", "9"));
        assert!(!matches(&d, "qty__gt", "10"));
        assert!(matches(&d, "qty__gte", "10"));
        assert!(matches(&d, "qty__lt", "10.5"));
        assert!(matches(&d, "qty__lte", "10"));
        assert!(matches(&d, "qty__range", "1,10"));
        assert!(!matches(&d, "qty__range", "11,20"));
        assert!(matches(&d, "qty__in", "3,10,12"));
    }

    #[test]
    fn isnull_and_missing_fields() {
        let d = doc! {"a": bson::Bson::Null, "b": 1i64};
        assert!(matches(&d, "a__isnull", "true"));
        assert!(matches(&d, "missing__isnull", "1"));
        assert!(matches(&d, "b__isnull", "false"));
        assert!(!matches(&d, "missing", "1"));
        assert!(!matches(&d, "a", ""));
    }

    #[test]
    fn nested_paths() {
        let d = doc! {"owner": {"name": "Ada", "team": {"id": 7i64}}};
        assert!(matches(&d, "owner__name__exact", "Ada"));
        assert!(matches(&d, "owner__team__id__gte", "7"));
        assert_eq!(get_path(&d, "owner.missing"), None);
        assert_eq!(get_path(&d, "owner.name.deeper"), None);
    }

    #[test]
    fn render_and_json_forms() {
        assert_eq!(render(&Bson::Int64(5)), "5");
        assert_eq!(render(&Bson::Null), "");
        assert_eq!(render(&Bson::Document(doc! {"k": 1i64})), "{\"k\":1}");
        let j = serde_json::json!({"a": [1, 2.5, "x", null, true]});
        assert_eq!(to_json(&from_json(&j)), j);
    }
}
