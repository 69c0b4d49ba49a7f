use serde_json::Value;

/// Renders a server-assigned identifier for use in a URL path.
///
/// The API is inconsistent about identifier types; keys and rules carry
/// numeric ids while jobs and integration instances use strings.
pub(crate) fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Stringified boolean the way the platform stores flag fields
/// (`"true"` / `"false"`).
pub(crate) fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Picks the single element matching `pred`, or `None` when there are
/// zero or several. Ambiguous matches are never disambiguated.
pub(crate) fn unique<I: IntoIterator>(
    items: I,
    pred: impl Fn(&I::Item) -> bool,
) -> Option<I::Item> {
    let mut matches = items.into_iter().filter(|item| pred(item));
    match (matches.next(), matches.next()) {
        (Some(item), None) => Some(item),
        _ => None,
    }
}
