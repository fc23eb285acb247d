//! Reward settings.
//!
//! Every field is externally configurable through dot-separated keys over the
//! camelCase JSON form, e.g. `penalties.perMissing` or `minimumScreenTime`.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::json_path::{get_json_value_by_path, set_json_value_by_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
}

/// Minutes subtracted per occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Penalties {
    #[serde(default = "default_per_missing")]
    pub per_missing: i64,
    #[serde(default = "default_class_with_d")]
    pub class_with_d: i64,
    #[serde(default = "default_class_with_f")]
    pub class_with_f: i64,
}

/// Minutes added per occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bonuses {
    #[serde(default = "default_zero_missing_all")]
    pub zero_missing_all: i64,
    #[serde(default = "default_class_improved")]
    pub class_improved: i64,
    #[serde(default = "default_class_with_a")]
    pub class_with_a: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_baseline")]
    pub baseline: i64,
    #[serde(default)]
    pub penalties: Penalties,
    #[serde(default)]
    pub bonuses: Bonuses,
    #[serde(default = "default_minimum_screen_time")]
    pub minimum_screen_time: i64,
    #[serde(default)]
    pub admin_pin: Option<String>,
    #[serde(default)]
    pub theme: Theme,
}

// Default functions
fn default_baseline() -> i64 {
    180
}
fn default_per_missing() -> i64 {
    5
}
fn default_class_with_d() -> i64 {
    10
}
fn default_class_with_f() -> i64 {
    20
}
fn default_zero_missing_all() -> i64 {
    30
}
fn default_class_improved() -> i64 {
    10
}
fn default_class_with_a() -> i64 {
    5
}
fn default_minimum_screen_time() -> i64 {
    15
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            per_missing: default_per_missing(),
            class_with_d: default_class_with_d(),
            class_with_f: default_class_with_f(),
        }
    }
}

impl Default for Bonuses {
    fn default() -> Self {
        Self {
            zero_missing_all: default_zero_missing_all(),
            class_improved: default_class_improved(),
            class_with_a: default_class_with_a(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            penalties: Penalties::default(),
            bonuses: Bonuses::default(),
            minimum_screen_time: default_minimum_screen_time(),
            admin_pin: None,
            theme: Theme::default(),
        }
    }
}

impl Settings {
    pub fn has_pin(&self) -> bool {
        self.admin_pin.as_deref().is_some_and(|pin| !pin.is_empty())
    }

    /// Admin gate check. Without a configured PIN every input passes.
    pub fn verify_pin(&self, input: &str) -> bool {
        match self.admin_pin.as_deref() {
            Some(pin) if !pin.is_empty() => pin == input,
            _ => true,
        }
    }

    /// Get a setting as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a setting by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidSetting`] if the key is unknown or the
    /// value does not parse as the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let invalid = |message: String| StoreError::InvalidSetting {
            key: key.to_string(),
            message,
        };

        let mut json = serde_json::to_value(&*self)?;
        set_json_value_by_path(&mut json, key, value).map_err(invalid)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_values() {
        let s = Settings::default();
        assert_eq!(s.baseline, 180);
        assert_eq!(s.penalties.per_missing, 5);
        assert_eq!(s.penalties.class_with_d, 10);
        assert_eq!(s.penalties.class_with_f, 20);
        assert_eq!(s.bonuses.zero_missing_all, 30);
        assert_eq!(s.bonuses.class_improved, 10);
        assert_eq!(s.bonuses.class_with_a, 5);
        assert_eq!(s.minimum_screen_time, 15);
        assert_eq!(s.admin_pin, None);
        assert_eq!(s.theme, Theme::Auto);
    }

    #[test]
    fn settings_json_uses_browser_key_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["penalties"]["perMissing"], 5);
        assert_eq!(json["penalties"]["classWithD"], 10);
        assert_eq!(json["bonuses"]["zeroMissingAll"], 30);
        assert_eq!(json["minimumScreenTime"], 15);
        assert!(json["adminPin"].is_null());
        assert_eq!(json["theme"], "auto");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let s = Settings::default();
        assert_eq!(s.get("penalties.perMissing").as_deref(), Some("5"));
        assert_eq!(s.get("theme").as_deref(), Some("auto"));
        assert!(s.get("penalties.missing").is_none());
        assert!(s.get("").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut s = Settings::default();
        s.set("bonuses.classWithA", "8").unwrap();
        assert_eq!(s.bonuses.class_with_a, 8);
        s.set("baseline", " 240 ").unwrap();
        assert_eq!(s.baseline, 240);
    }

    #[test]
    fn set_pin_and_clear_it() {
        let mut s = Settings::default();
        s.set("adminPin", "4321").unwrap();
        assert!(s.has_pin());
        assert!(s.verify_pin("4321"));
        assert!(!s.verify_pin("1234"));

        s.set("adminPin", "").unwrap();
        assert_eq!(s.admin_pin, None);
        assert!(s.verify_pin("anything"));
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_values() {
        let mut s = Settings::default();
        assert!(matches!(
            s.set("penalties.perLate", "3"),
            Err(StoreError::InvalidSetting { .. })
        ));
        assert!(s.set("baseline", "lots").is_err());
        assert!(s.set("baseline", "12.5").is_err());
        assert!(s.set("theme", "purple").is_err());
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn set_theme_variant() {
        let mut s = Settings::default();
        s.set("theme", "dark").unwrap();
        assert_eq!(s.theme, Theme::Dark);
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let s: Settings = serde_json::from_str(r#"{"baseline": 120, "penalties": {"perMissing": 7}}"#).unwrap();
        assert_eq!(s.baseline, 120);
        assert_eq!(s.penalties.per_missing, 7);
        assert_eq!(s.penalties.class_with_f, 20);
        assert_eq!(s.bonuses, Bonuses::default());
    }
}
