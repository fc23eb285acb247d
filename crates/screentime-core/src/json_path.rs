//! Dot-separated key access over a serde_json tree.
//!
//! Used by [`crate::model::Settings`] and [`crate::storage::Config`] to expose
//! every field as a typed `key = value` pair. The new value is parsed against
//! the type of the value it replaces.

pub(crate) fn get_json_value_by_path<'a>(
    root: &'a serde_json::Value,
    key: &str,
) -> Option<&'a serde_json::Value> {
    if key.is_empty() {
        return None;
    }

    let mut current = root;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

pub(crate) fn set_json_value_by_path(
    root: &mut serde_json::Value,
    key: &str,
    value: &str,
) -> Result<(), String> {
    let mut parts = key.split('.').peekable();
    if key.is_empty() {
        return Err("key is empty".into());
    }

    let mut current = root;
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            let obj = current
                .as_object_mut()
                .ok_or_else(|| "unknown key".to_string())?;
            let existing = obj.get(part).ok_or_else(|| "unknown key".to_string())?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| format!("cannot parse '{value}' as bool"))?,
                ),
                serde_json::Value::Number(_) => value
                    .trim()
                    .parse::<i64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| format!("cannot parse '{value}' as a whole number"))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| e.to_string())?
                }
                // Nullable strings: blank clears the value.
                _ if value.trim().is_empty() => serde_json::Value::Null,
                _ => serde_json::Value::String(value.trim().to_string()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        current = current
            .get_mut(part)
            .ok_or_else(|| "unknown key".to_string())?;
    }

    Err("unknown key".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested() {
        let root = json!({"a": {"b": 3}});
        assert_eq!(get_json_value_by_path(&root, "a.b"), Some(&json!(3)));
        assert_eq!(get_json_value_by_path(&root, "a.c"), None);
        assert_eq!(get_json_value_by_path(&root, ""), None);
    }

    #[test]
    fn test_set_keeps_existing_type() {
        let mut root = json!({"flag": true, "n": 1, "name": "x", "pin": null});
        set_json_value_by_path(&mut root, "flag", "false").unwrap();
        set_json_value_by_path(&mut root, "n", "42").unwrap();
        set_json_value_by_path(&mut root, "name", "y").unwrap();
        set_json_value_by_path(&mut root, "pin", "0000").unwrap();
        assert_eq!(root, json!({"flag": false, "n": 42, "name": "y", "pin": "0000"}));

        set_json_value_by_path(&mut root, "pin", " ").unwrap();
        assert!(root["pin"].is_null());
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut root = json!({"flag": true, "n": 1});
        assert!(set_json_value_by_path(&mut root, "flag", "yes").is_err());
        assert!(set_json_value_by_path(&mut root, "n", "1.5").is_err());
        assert!(set_json_value_by_path(&mut root, "missing", "1").is_err());
        assert!(set_json_value_by_path(&mut root, "n.deeper", "1").is_err());
        assert!(set_json_value_by_path(&mut root, "", "1").is_err());
    }
}
