//! User settings
//!
//! Preferences that the app keeps in shared storage, passed around as an
//! explicit value and persisted in the `preferences` table.

use std::collections::{BTreeMap, HashMap};

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::field_states::{FieldStates, RECIPE_FIELDS};
use crate::db::DbResult;

/// Persisted preference keys
pub mod keys {
    /// `sort_name` | `sort_calories` | `sort_due_score`
    pub const RECIPES_SORT_MODE: &str = "recipes_sort_mode";
    /// `true` | `false`
    pub const RECIPES_SORT_ASCENDING: &str = "recipes_sort_ascending";
    /// `true` | `false`
    pub const BEGINNER_MODE: &str = "beginner_mode";
    /// Non-negative integer, max decimal places shown for amounts
    pub const STOCK_DECIMAL_PLACES_AMOUNT: &str = "stock_decimal_places_amount";
    /// Recipe list field toggles, `name%=true%0name2%=false`
    pub const RECIPES_FIELDS: &str = "recipes_fields";
}

/// Largest accepted value for `stock_decimal_places_amount`
pub const MAX_DECIMAL_PLACES_AMOUNT: u32 = 10;

/// Recipe list sort mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecipesSortMode {
    #[default]
    Name,
    Calories,
    DueScore,
}

impl RecipesSortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipesSortMode::Name => "sort_name",
            RecipesSortMode::Calories => "sort_calories",
            RecipesSortMode::DueScore => "sort_due_score",
        }
    }

    /// Accepts the stored form (`sort_name`) and the short form (`name`)
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        match lower.strip_prefix("sort_").unwrap_or(lower.as_str()) {
            "name" => Some(RecipesSortMode::Name),
            "calories" => Some(RecipesSortMode::Calories),
            "due_score" => Some(RecipesSortMode::DueScore),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub recipes_sort_mode: RecipesSortMode,
    pub recipes_sort_ascending: bool,
    pub beginner_mode: bool,
    pub stock_decimal_places_amount: u32,
    pub recipes_fields: FieldStates,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recipes_sort_mode: RecipesSortMode::Name,
            recipes_sort_ascending: true,
            beginner_mode: true,
            stock_decimal_places_amount: 2,
            recipes_fields: FieldStates::defaults(RECIPE_FIELDS),
        }
    }
}

/// Partial update; `None` keeps the current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub recipes_sort_mode: Option<RecipesSortMode>,
    pub recipes_sort_ascending: Option<bool>,
    pub beginner_mode: Option<bool>,
    pub stock_decimal_places_amount: Option<u32>,
    /// Field name -> shown; fields not listed keep their state
    pub recipes_fields: Option<BTreeMap<String, bool>>,
}

impl Settings {
    /// Load settings; missing or unreadable keys fall back to their defaults
    pub fn load(conn: &Connection) -> DbResult<Self> {
        let mut stmt = conn.prepare("SELECT key, value FROM preferences")?;
        let stored: HashMap<String, String> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;

        let defaults = Settings::default();
        Ok(Self {
            recipes_sort_mode: read(&stored, keys::RECIPES_SORT_MODE, RecipesSortMode::parse)
                .unwrap_or(defaults.recipes_sort_mode),
            recipes_sort_ascending: read(&stored, keys::RECIPES_SORT_ASCENDING, parse_bool)
                .unwrap_or(defaults.recipes_sort_ascending),
            beginner_mode: read(&stored, keys::BEGINNER_MODE, parse_bool)
                .unwrap_or(defaults.beginner_mode),
            stock_decimal_places_amount: read(&stored, keys::STOCK_DECIMAL_PLACES_AMOUNT, |s| {
                s.trim().parse::<u32>().ok().filter(|n| *n <= MAX_DECIMAL_PLACES_AMOUNT)
            })
            .unwrap_or(defaults.stock_decimal_places_amount),
            recipes_fields: FieldStates::parse(
                stored.get(keys::RECIPES_FIELDS).map(String::as_str),
                RECIPE_FIELDS,
            ),
        })
    }

    /// Persist every key (upsert)
    pub fn save(&self, conn: &Connection) -> DbResult<()> {
        let entries = [
            (keys::RECIPES_SORT_MODE, self.recipes_sort_mode.as_str().to_string()),
            (keys::RECIPES_SORT_ASCENDING, self.recipes_sort_ascending.to_string()),
            (keys::BEGINNER_MODE, self.beginner_mode.to_string()),
            (keys::STOCK_DECIMAL_PLACES_AMOUNT, self.stock_decimal_places_amount.to_string()),
            (keys::RECIPES_FIELDS, self.recipes_fields.encode()),
        ];

        for (key, value) in entries {
            conn.execute(
                r#"
                INSERT INTO preferences (key, value)
                VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = datetime('now')
                "#,
                params![key, value],
            )?;
        }
        Ok(())
    }

    /// Copy of `self` with the update applied. Unknown field names are
    /// ignored.
    pub fn apply(&self, update: &SettingsUpdate) -> Self {
        let mut recipes_fields = self.recipes_fields.clone();
        for (name, enabled) in update.recipes_fields.iter().flatten() {
            recipes_fields.set(name, *enabled);
        }

        Self {
            recipes_sort_mode: update.recipes_sort_mode.unwrap_or(self.recipes_sort_mode),
            recipes_sort_ascending: update
                .recipes_sort_ascending
                .unwrap_or(self.recipes_sort_ascending),
            beginner_mode: update.beginner_mode.unwrap_or(self.beginner_mode),
            stock_decimal_places_amount: update
                .stock_decimal_places_amount
                .unwrap_or(self.stock_decimal_places_amount),
            recipes_fields,
        }
    }
}

fn read<T>(stored: &HashMap<String, String>, key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = stored.get(key)?;
    let parsed = parse(raw);
    if parsed.is_none() {
        tracing::warn!("Ignoring invalid preference {}='{}', using default", key, raw);
    }
    parsed
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_defaults_when_nothing_stored() {
        let conn = conn();
        assert_eq!(Settings::load(&conn).unwrap(), Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let conn = conn();
        let settings = Settings::default().apply(&SettingsUpdate {
            recipes_sort_mode: Some(RecipesSortMode::DueScore),
            recipes_sort_ascending: Some(false),
            stock_decimal_places_amount: Some(4),
            ..Default::default()
        });
        settings.save(&conn).unwrap();

        let loaded = Settings::load(&conn).unwrap();
        assert_eq!(loaded, settings);
        assert!(loaded.beginner_mode);

        let raw: String = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                [keys::RECIPES_SORT_MODE],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(raw, "sort_due_score");
    }

    #[test]
    fn test_invalid_stored_value_falls_back() {
        let conn = conn();
        conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, 'sideways')",
            [keys::RECIPES_SORT_MODE],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, '99')",
            [keys::STOCK_DECIMAL_PLACES_AMOUNT],
        )
        .unwrap();

        let loaded = Settings::load(&conn).unwrap();
        assert_eq!(loaded.recipes_sort_mode, RecipesSortMode::Name);
        assert_eq!(loaded.stock_decimal_places_amount, 2);
    }

    #[test]
    fn test_sort_mode_parse() {
        assert_eq!(RecipesSortMode::parse("sort_calories"), Some(RecipesSortMode::Calories));
        assert_eq!(RecipesSortMode::parse("Due_Score"), Some(RecipesSortMode::DueScore));
        assert_eq!(RecipesSortMode::parse("price"), None);
    }

    #[test]
    fn test_recipe_fields_persisted_encoded() {
        let conn = conn();
        let settings = Settings::default().apply(&SettingsUpdate {
            recipes_fields: Some(BTreeMap::from([
                ("calories".to_string(), true),
                ("picture".to_string(), false),
            ])),
            ..Default::default()
        });
        settings.save(&conn).unwrap();

        let raw: String = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                [keys::RECIPES_FIELDS],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(
            raw,
            "due_score%=true%0fulfillment%=true%0calories%=true%0desired_servings%=false%0picture%=false"
        );
        assert_eq!(Settings::load(&conn).unwrap().recipes_fields, settings.recipes_fields);
    }

    #[test]
    fn test_recipe_fields_partial_stored_value() {
        let conn = conn();
        conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, 'calories%=true%0broken%0picture%=false')",
            [keys::RECIPES_FIELDS],
        )
        .unwrap();

        let fields = Settings::load(&conn).unwrap().recipes_fields;
        assert_eq!(fields.is_enabled("calories"), Some(true));
        assert_eq!(fields.is_enabled("picture"), Some(false));
        assert_eq!(fields.is_enabled("due_score"), Some(true));
        assert_eq!(fields.is_enabled("desired_servings"), Some(false));
    }
}
