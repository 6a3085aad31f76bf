use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    constants::{
        COST_FILTERS, CUISINE_REGIONS, CUISINE_TYPE_FILTERS, DIET_FILTERS, DIFFICULTY_FILTERS,
        DISH_TYPE_FILTERS, FILTER_CATEGORIES, PREPARATION_TIME_FILTERS, UNITS,
    },
    error::TypeError,
};

pub type RecipeId = i64;
pub type IngredientId = i64;
pub type UserId = uuid::Uuid;

fn value_as_str(value: &Value) -> Result<&str, TypeError> {
    value
        .as_str()
        .ok_or_else(|| TypeError::new("Failed to parse value as string"))
}

#[derive(
    Clone, Copy, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Deserialize, Eq, Ord, Hash,
)]
#[sqlx(type_name = "tag_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    PreparationTime,
    Difficulty,
    CuisineType,
    DishType,
    Diet,
    Cost,
}

impl TagCategory {
    pub const ALL: [TagCategory; 6] = [
        TagCategory::PreparationTime,
        TagCategory::Difficulty,
        TagCategory::CuisineType,
        TagCategory::DishType,
        TagCategory::Diet,
        TagCategory::Cost,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            TagCategory::PreparationTime => "preparation_time",
            TagCategory::Difficulty => "difficulty",
            TagCategory::CuisineType => "cuisine_type",
            TagCategory::DishType => "dish_type",
            TagCategory::Diet => "diet",
            TagCategory::Cost => "cost",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.key() == key)
    }

    pub fn label(&self) -> &'static str {
        FILTER_CATEGORIES
            .iter()
            .find(|(key, _, _)| *key == self.key())
            .map(|(_, label, _)| *label)
            .unwrap_or_else(|| self.key())
    }

    pub fn options(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            TagCategory::PreparationTime => PREPARATION_TIME_FILTERS,
            TagCategory::Difficulty => DIFFICULTY_FILTERS,
            TagCategory::CuisineType => CUISINE_TYPE_FILTERS,
            TagCategory::DishType => DISH_TYPE_FILTERS,
            TagCategory::Diet => DIET_FILTERS,
            TagCategory::Cost => COST_FILTERS,
        }
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.option_label(value).is_some()
    }

    pub fn option_label(&self, value: &str) -> Option<&'static str> {
        self.options()
            .iter()
            .find(|(key, _)| *key == value)
            .map(|(_, label)| *label)
    }

    /// Label of `value`, or the value itself when it is not part of the taxonomy.
    pub fn label_or_value<'a>(&self, value: &'a str) -> &'a str {
        match self.option_label(value) {
            Some(label) => label,
            None => value,
        }
    }
}

impl Display for TagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl TryFrom<Value> for TagCategory {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_key(value_as_str(&value)?).ok_or_else(|| TypeError::new("Invalid variant"))
    }
}

pub fn cuisine_region(value: &str) -> Option<&'static str> {
    CUISINE_REGIONS
        .iter()
        .find(|(_, values)| values.contains(&value))
        .map(|(region, _)| *region)
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    PartialOrd,
    sqlx::Type,
    Serialize,
    Deserialize,
    Eq,
    Ord,
    Hash,
)]
#[sqlx(type_name = "difficulty_level", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn key(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn label(&self) -> &'static str {
        TagCategory::Difficulty
            .option_label(self.key())
            .unwrap_or_else(|| self.key())
    }
}

impl TryFrom<Value> for Difficulty {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value_as_str(&value)? {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(TypeError::new("Invalid variant")),
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Deserialize, Eq, Ord, Hash,
)]
#[sqlx(type_name = "unit_type")]
pub enum UnitType {
    #[sqlx(rename = "g")]
    #[serde(rename = "g")]
    Gram,
    #[sqlx(rename = "kg")]
    #[serde(rename = "kg")]
    Kilogram,
    #[sqlx(rename = "ml")]
    #[serde(rename = "ml")]
    Millilitre,
    #[sqlx(rename = "cl")]
    #[serde(rename = "cl")]
    Centilitre,
    #[sqlx(rename = "l")]
    #[serde(rename = "l")]
    Litre,
    #[sqlx(rename = "cs")]
    #[serde(rename = "cs")]
    Tablespoon,
    #[sqlx(rename = "cc")]
    #[serde(rename = "cc")]
    Teaspoon,
    #[sqlx(rename = "pincée")]
    #[serde(rename = "pincée")]
    Pinch,
    #[sqlx(rename = "unité")]
    #[serde(rename = "unité")]
    Piece,
}

impl UnitType {
    pub const ALL: [UnitType; 9] = [
        UnitType::Gram,
        UnitType::Kilogram,
        UnitType::Millilitre,
        UnitType::Centilitre,
        UnitType::Litre,
        UnitType::Tablespoon,
        UnitType::Teaspoon,
        UnitType::Pinch,
        UnitType::Piece,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            UnitType::Gram => "g",
            UnitType::Kilogram => "kg",
            UnitType::Millilitre => "ml",
            UnitType::Centilitre => "cl",
            UnitType::Litre => "l",
            UnitType::Tablespoon => "cs",
            UnitType::Teaspoon => "cc",
            UnitType::Pinch => "pincée",
            UnitType::Piece => "unité",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|unit| unit.key() == key)
    }

    pub fn label(&self) -> &'static str {
        UNITS
            .iter()
            .find(|(key, _)| *key == self.key())
            .map(|(_, label)| *label)
            .unwrap_or_else(|| self.key())
    }
}

impl Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl TryFrom<Value> for UnitType {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_key(value_as_str(&value)?).ok_or_else(|| TypeError::new("Invalid variant"))
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub servings: i32,
    pub instructions: String,
    pub image_url: Option<String>,
    pub user_id: UserId,
    pub is_public: bool,
    pub preparation_time: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    pub fn is_visible_to(&self, viewer: Option<&UserId>) -> bool {
        self.is_public || viewer.is_some_and(|viewer| self.is_owned_by(viewer))
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub quantity: f64,
    pub unit: UnitType,
    pub name: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeTag {
    pub recipe_id: RecipeId,
    pub category: TagCategory,
    pub value: String,
    pub label: String,
}

/// A recipe with its ingredient line items and tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetails {
    #[serde(flatten)]
    pub recipe: Recipe,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub tags: Vec<RecipeTag>,
}

impl RecipeDetails {
    pub fn has_tag(&self, category: TagCategory, value: &str) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.category == category && tag.value == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecipeIngredient {
    pub ingredient_id: IngredientId,
    pub quantity: f64,
    pub unit: UnitType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipeTag {
    pub category: TagCategory,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    pub servings: i32,
    pub instructions: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub preparation_time: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub ingredients: Vec<NewRecipeIngredient>,
    #[serde(default)]
    pub tags: Vec<NewRecipeTag>,
}

impl NewRecipe {
    /// Tag rows to persist: duplicates on (category, value) dropped, labels
    /// copied from the taxonomy.
    pub fn tag_rows(&self, recipe_id: RecipeId) -> Vec<RecipeTag> {
        let mut rows: Vec<RecipeTag> = vec![];

        for tag in self.tags.iter() {
            if rows
                .iter()
                .any(|row| row.category == tag.category && row.value == tag.value)
            {
                continue;
            }

            rows.push(RecipeTag {
                recipe_id,
                category: tag.category,
                value: tag.value.to_owned(),
                label: tag.category.label_or_value(&tag.value).to_string(),
            });
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_has_expected_option_counts() {
        let counts: Vec<usize> = TagCategory::ALL
            .iter()
            .map(|category| category.options().len())
            .collect();

        assert_eq!(counts, vec![6, 3, 16, 5, 5, 3]);
    }

    #[test]
    fn category_keys_round_trip() {
        for category in TagCategory::ALL {
            assert_eq!(TagCategory::from_key(category.key()), Some(category));
        }
        assert_eq!(TagCategory::from_key("season"), None);
    }

    #[test]
    fn every_cuisine_belongs_to_one_region() {
        for (value, _) in CUISINE_TYPE_FILTERS {
            assert!(cuisine_region(value).is_some(), "{value} has no region");
        }
        assert_eq!(cuisine_region("korean"), Some("Asie"));
        assert_eq!(cuisine_region("martian"), None);
    }

    #[test]
    fn unknown_option_label_falls_back_to_value() {
        assert_eq!(TagCategory::Cost.label_or_value("budget"), "Économique");
        assert_eq!(TagCategory::Cost.label_or_value("free"), "free");
    }

    #[test]
    fn units_parse_from_form_values() {
        let unit = UnitType::try_from(Value::String(String::from("pincée"))).unwrap();
        assert_eq!(unit, UnitType::Pinch);
        assert!(UnitType::try_from(Value::String(String::from("oz"))).is_err());
        assert!(UnitType::try_from(Value::from(3)).is_err());
    }

    #[test]
    fn difficulty_defaults_to_medium() {
        assert_eq!(Difficulty::default(), Difficulty::Medium);
        assert_eq!(Difficulty::Hard.label(), "Difficile");
    }

    #[test]
    fn tag_rows_are_deduplicated_and_labelled() {
        let recipe = NewRecipe {
            title: String::from("Ratatouille"),
            servings: 4,
            instructions: String::new(),
            image_url: None,
            is_public: false,
            preparation_time: None,
            difficulty: None,
            ingredients: vec![],
            tags: vec![
                NewRecipeTag {
                    category: TagCategory::Diet,
                    value: String::from("vegan"),
                },
                NewRecipeTag {
                    category: TagCategory::Diet,
                    value: String::from("vegan"),
                },
                NewRecipeTag {
                    category: TagCategory::CuisineType,
                    value: String::from("french"),
                },
            ],
        };

        let rows = recipe.tag_rows(7);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "Végan");
        assert_eq!(rows[1].label, "Française");
        assert!(rows.iter().all(|row| row.recipe_id == 7));
    }
}
