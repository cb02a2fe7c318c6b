//! Settings tools

use std::collections::BTreeMap;

use crate::db::Database;
use crate::models::{
    RecipesSortMode, Settings, SettingsUpdate, MAX_DECIMAL_PLACES_AMOUNT, RECIPE_FIELDS,
};

pub fn get_settings(db: &Database) -> Result<Settings, String> {
    db.with_conn(Settings::load)
        .map_err(|e| format!("Failed to load settings: {}", e))
}

/// Apply a partial update and return the stored result.
///
/// `recipes_sort_mode` accepts `name`, `calories`, `due_score` or the
/// stored `sort_*` form. `recipes_fields` toggles individual recipe list
/// fields by name.
pub fn update_settings(
    db: &Database,
    recipes_sort_mode: Option<&str>,
    recipes_sort_ascending: Option<bool>,
    beginner_mode: Option<bool>,
    stock_decimal_places_amount: Option<u32>,
    recipes_fields: Option<BTreeMap<String, bool>>,
) -> Result<Settings, String> {
    let recipes_sort_mode = recipes_sort_mode
        .map(|s| {
            RecipesSortMode::parse(s).ok_or_else(|| {
                format!(
                    "Invalid recipes_sort_mode '{}'. Use name, calories or due_score",
                    s
                )
            })
        })
        .transpose()?;

    if let Some(places) = stock_decimal_places_amount {
        if places > MAX_DECIMAL_PLACES_AMOUNT {
            return Err(format!(
                "stock_decimal_places_amount must be between 0 and {}",
                MAX_DECIMAL_PLACES_AMOUNT
            ));
        }
    }

    if let Some(fields) = &recipes_fields {
        if let Some(unknown) = fields
            .keys()
            .find(|name| !RECIPE_FIELDS.iter().any(|(known, _)| *known == name.as_str()))
        {
            let known: Vec<&str> = RECIPE_FIELDS.iter().map(|(name, _)| *name).collect();
            return Err(format!(
                "Unknown recipe field '{}'. Use one of: {}",
                unknown,
                known.join(", ")
            ));
        }
    }

    let update = SettingsUpdate {
        recipes_sort_mode,
        recipes_sort_ascending,
        beginner_mode,
        stock_decimal_places_amount,
        recipes_fields,
    };

    db.with_conn(|conn| {
        let settings = Settings::load(conn)?.apply(&update);
        settings.save(conn)?;
        tracing::info!("Settings updated: {:?}", settings);
        Ok(settings)
    })
    .map_err(|e| format!("Failed to update settings: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn database() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(run_migrations).unwrap();
        db
    }

    #[test]
    fn test_defaults_before_any_update() {
        let db = database();
        assert_eq!(get_settings(&db).unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_update_keeps_other_values() {
        let db = database();
        update_settings(&db, Some("calories"), None, None, Some(4), None).unwrap();
        let settings = update_settings(&db, None, Some(false), None, None, None).unwrap();

        assert_eq!(settings.recipes_sort_mode, RecipesSortMode::Calories);
        assert!(!settings.recipes_sort_ascending);
        assert!(settings.beginner_mode);
        assert_eq!(settings.stock_decimal_places_amount, 4);
        assert_eq!(get_settings(&db).unwrap(), settings);
    }

    #[test]
    fn test_invalid_update_rejected() {
        let db = database();
        assert!(update_settings(&db, Some("random"), None, None, None, None).is_err());
        assert!(update_settings(&db, None, None, None, Some(11), None).is_err());

        let fields = BTreeMap::from([("colour".to_string(), true)]);
        let err = update_settings(&db, None, None, None, None, Some(fields)).unwrap_err();
        assert!(err.contains("Unknown recipe field 'colour'"), "{}", err);

        assert_eq!(get_settings(&db).unwrap(), Settings::default());
    }

    #[test]
    fn test_toggle_recipe_fields() {
        let db = database();
        let fields = BTreeMap::from([("calories".to_string(), true)]);
        update_settings(&db, None, None, None, None, Some(fields)).unwrap();

        let fields = BTreeMap::from([("picture".to_string(), false)]);
        let settings = update_settings(&db, None, None, None, None, Some(fields)).unwrap();

        assert_eq!(
            settings.recipes_fields.active(),
            vec!["due_score", "fulfillment", "calories"]
        );
        assert_eq!(get_settings(&db).unwrap(), settings);
    }
}
