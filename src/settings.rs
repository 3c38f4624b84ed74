/// User settings stored alongside tracked threads
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_UNREAD_COMMENT_COLOR: &str = "#B3ECB7";

/// Storage keys for setting records
pub const UNREAD_COMMENT_COLOR_KEY: &str = "unreadCommentColor";
pub const DELETE_FREQUENCY_KEY: &str = "deleteFrequency";
pub const AUTO_FOLLOW_KEY: &str = "autoFollow";

pub const SETTING_KEYS: [&str; 3] = [
    UNREAD_COMMENT_COLOR_KEY,
    DELETE_FREQUENCY_KEY,
    AUTO_FOLLOW_KEY,
];

/// Every stored value carries one of these tags so queries can filter by record type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageType {
    Setting,
    Comment,
}

impl StorageType {
    /// Read the `type` tag of a stored value, if it has a known one
    pub fn of(value: &Value) -> Option<StorageType> {
        value
            .get("type")
            .cloned()
            .and_then(|tag| serde_json::from_value(tag).ok())
    }
}

/// How many days a thread may go unvisited before its history is deleted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum RetentionFrequency {
    #[serde(rename = "DAY_1")]
    Day1,
    #[serde(rename = "DAY_2")]
    Day2,
    #[serde(rename = "DAY_3")]
    Day3,
    #[serde(rename = "DAY_4")]
    Day4,
    #[serde(rename = "DAY_5")]
    Day5,
    #[default]
    #[serde(rename = "DAY_7")]
    Day7,
    #[serde(rename = "DAY_14")]
    Day14,
}

impl RetentionFrequency {
    pub const ALL: [RetentionFrequency; 7] = [
        RetentionFrequency::Day1,
        RetentionFrequency::Day2,
        RetentionFrequency::Day3,
        RetentionFrequency::Day4,
        RetentionFrequency::Day5,
        RetentionFrequency::Day7,
        RetentionFrequency::Day14,
    ];

    pub fn days(self) -> i64 {
        match self {
            RetentionFrequency::Day1 => 1,
            RetentionFrequency::Day2 => 2,
            RetentionFrequency::Day3 => 3,
            RetentionFrequency::Day4 => 4,
            RetentionFrequency::Day5 => 5,
            RetentionFrequency::Day7 => 7,
            RetentionFrequency::Day14 => 14,
        }
    }

    pub fn label(self) -> String {
        match self {
            RetentionFrequency::Day1 => "1 day".to_string(),
            RetentionFrequency::Day7 => "1 week".to_string(),
            RetentionFrequency::Day14 => "2 weeks".to_string(),
            other => format!("{} days", other.days()),
        }
    }

    /// Stable string form, matching the stored representation
    pub fn as_key(self) -> &'static str {
        match self {
            RetentionFrequency::Day1 => "DAY_1",
            RetentionFrequency::Day2 => "DAY_2",
            RetentionFrequency::Day3 => "DAY_3",
            RetentionFrequency::Day4 => "DAY_4",
            RetentionFrequency::Day5 => "DAY_5",
            RetentionFrequency::Day7 => "DAY_7",
            RetentionFrequency::Day14 => "DAY_14",
        }
    }

    pub fn from_key(key: &str) -> Option<RetentionFrequency> {
        RetentionFrequency::ALL.into_iter().find(|f| f.as_key() == key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ColorRecord {
    #[serde(rename = "type")]
    kind: StorageType,
    color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct FrequencyRecord {
    #[serde(rename = "type")]
    kind: StorageType,
    frequency: RetentionFrequency,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct AutoFollowRecord {
    #[serde(rename = "type")]
    kind: StorageType,
    enabled: bool,
}

/// All user settings, with defaults filled in for anything not stored
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub unread_comment_color: String,
    pub delete_frequency: RetentionFrequency,
    pub auto_follow: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            unread_comment_color: DEFAULT_UNREAD_COMMENT_COLOR.to_string(),
            delete_frequency: RetentionFrequency::default(),
            auto_follow: true,
        }
    }
}

impl Settings {
    /// Build settings from stored entries. Missing or undecodable records use defaults.
    pub fn from_entries(entries: &Map<String, Value>) -> Settings {
        let defaults = Settings::default();

        let unread_comment_color = decode::<ColorRecord>(entries, UNREAD_COMMENT_COLOR_KEY)
            .map(|r| r.color)
            .unwrap_or(defaults.unread_comment_color);

        let delete_frequency = decode::<FrequencyRecord>(entries, DELETE_FREQUENCY_KEY)
            .map(|r| r.frequency)
            .unwrap_or(defaults.delete_frequency);

        let auto_follow = decode::<AutoFollowRecord>(entries, AUTO_FOLLOW_KEY)
            .map(|r| r.enabled)
            .unwrap_or(defaults.auto_follow);

        Settings {
            unread_comment_color,
            delete_frequency,
            auto_follow,
        }
    }

    pub fn to_entries(&self) -> Map<String, Value> {
        let mut entries = Map::new();
        entries.insert(
            UNREAD_COMMENT_COLOR_KEY.to_string(),
            record(ColorRecord {
                kind: StorageType::Setting,
                color: self.unread_comment_color.clone(),
            }),
        );
        entries.insert(
            DELETE_FREQUENCY_KEY.to_string(),
            record(FrequencyRecord {
                kind: StorageType::Setting,
                frequency: self.delete_frequency,
            }),
        );
        entries.insert(
            AUTO_FOLLOW_KEY.to_string(),
            record(AutoFollowRecord {
                kind: StorageType::Setting,
                enabled: self.auto_follow,
            }),
        );
        entries
    }

    /// Default records for the settings not present in `entries`
    pub fn missing_defaults(entries: &Map<String, Value>) -> Map<String, Value> {
        Settings::default()
            .to_entries()
            .into_iter()
            .filter(|(key, _)| !entries.contains_key(key))
            .collect()
    }
}

/// Accept `#rrggbb` colors only, the format produced by `<input type="color">`
pub fn is_valid_hex_color(color: &str) -> bool {
    Regex::new(r"^#[0-9a-fA-F]{6}$")
        .map(|re| re.is_match(color))
        .unwrap_or(false)
}

fn record<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn decode<T: serde::de::DeserializeOwned>(entries: &Map<String, Value>, key: &str) -> Option<T> {
    entries
        .get(key)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_days_is_total() {
        let days: Vec<i64> = RetentionFrequency::ALL.iter().map(|f| f.days()).collect();
        assert_eq!(days, vec![1, 2, 3, 4, 5, 7, 14]);
    }

    #[test]
    fn test_frequency_key_round_trip() {
        for frequency in RetentionFrequency::ALL {
            assert_eq!(RetentionFrequency::from_key(frequency.as_key()), Some(frequency));
            let json = serde_json::to_value(frequency).unwrap();
            assert_eq!(json, Value::String(frequency.as_key().to_string()));
        }
        assert_eq!(RetentionFrequency::from_key("DAY_6"), None);
    }

    #[test]
    fn test_frequency_labels() {
        assert_eq!(RetentionFrequency::Day1.label(), "1 day");
        assert_eq!(RetentionFrequency::Day3.label(), "3 days");
        assert_eq!(RetentionFrequency::Day14.label(), "2 weeks");
    }

    #[test]
    fn test_storage_type_of() {
        assert_eq!(
            StorageType::of(&serde_json::json!({"type": "COMMENT"})),
            Some(StorageType::Comment)
        );
        assert_eq!(
            StorageType::of(&serde_json::json!({"type": "SETTING"})),
            Some(StorageType::Setting)
        );
        assert_eq!(StorageType::of(&serde_json::json!({"type": "OTHER"})), None);
        assert_eq!(StorageType::of(&serde_json::json!(5)), None);
    }

    #[test]
    fn test_settings_from_empty_entries_uses_defaults() {
        let settings = Settings::from_entries(&Map::new());
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.unread_comment_color, "#B3ECB7");
        assert!(settings.auto_follow);
    }

    #[test]
    fn test_settings_entries_round_trip() {
        let settings = Settings {
            unread_comment_color: "#112233".to_string(),
            delete_frequency: RetentionFrequency::Day3,
            auto_follow: false,
        };

        let entries = settings.to_entries();

        assert_eq!(entries[DELETE_FREQUENCY_KEY]["frequency"], "DAY_3");
        assert_eq!(entries[UNREAD_COMMENT_COLOR_KEY]["type"], "SETTING");
        assert_eq!(Settings::from_entries(&entries), settings);
    }

    #[test]
    fn test_undecodable_setting_falls_back() {
        let mut entries = Map::new();
        entries.insert(
            DELETE_FREQUENCY_KEY.to_string(),
            serde_json::json!({"type": "SETTING", "frequency": "FOREVER"}),
        );

        let settings = Settings::from_entries(&entries);

        assert_eq!(settings.delete_frequency, RetentionFrequency::Day7);
    }

    #[test]
    fn test_missing_defaults() {
        let mut entries = Map::new();
        entries.insert(
            UNREAD_COMMENT_COLOR_KEY.to_string(),
            serde_json::json!({"type": "SETTING", "color": "#000000"}),
        );

        let missing = Settings::missing_defaults(&entries);

        assert_eq!(missing.len(), 2);
        assert!(missing.contains_key(DELETE_FREQUENCY_KEY));
        assert!(missing.contains_key(AUTO_FOLLOW_KEY));
    }

    #[test]
    fn test_is_valid_hex_color() {
        assert!(is_valid_hex_color("#B3ECB7"));
        assert!(is_valid_hex_color("#ffffff"));
        assert!(!is_valid_hex_color("B3ECB7"));
        assert!(!is_valid_hex_color("#B3ECB"));
        assert!(!is_valid_hex_color("#GGGGGG"));
    }
}
