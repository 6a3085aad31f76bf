use std::{collections::HashMap, str::FromStr};

use serde_json::Value;

use super::{
    error::{Error, TypeError},
    schema::{Difficulty, NewRecipe, NewRecipeIngredient, NewRecipeTag, TagCategory, UnitType},
};
use crate::constants::DEFAULT_SERVINGS;

pub type FormData = HashMap<String, Value>;

/// Loosely typed submission, as posted by the recipe editor.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, Error>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| TypeError::new("Invalid type conversion").into()),
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    /// Accepts both JSON numbers and numeric strings.
    pub fn get_number<T>(&self, key: &str) -> Result<T, Error>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(value) => parse_number(value).map_err(Error::from),
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new("Invalid key")),
            },
            None => Err(TypeError::new("Invalid key")),
        }
    }

    fn get_optional_str(&self, key: &str) -> Option<String> {
        self.get_str(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_bool(&self, key: &str) -> bool {
        match self.inner.get(key) {
            Some(Value::Bool(v)) => *v,
            Some(Value::String(v)) => matches!(v.as_str(), "true" | "on" | "1"),
            _ => false,
        }
    }

    fn get_array(&self, key: &str) -> &[Value] {
        self.inner
            .get(key)
            .and_then(|v| v.as_array())
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    /// Builds a recipe submission. Ingredient rows with a missing or
    /// non-positive quantity, an unknown unit or no ingredient id are dropped.
    pub fn to_new_recipe(&self) -> Result<NewRecipe, Error> {
        let title = self.get_str("title")?;
        let instructions = self.get_str("instructions").unwrap_or_default();
        let servings = match self.inner.get("servings") {
            Some(_) => self.get_number("servings")?,
            None => DEFAULT_SERVINGS,
        };
        let difficulty = match self.get_optional_str("difficulty") {
            Some(_) => Some(self.get_value::<Difficulty>("difficulty")?),
            None => None,
        };

        let ingredients = self
            .get_array("ingredients")
            .iter()
            .enumerate()
            .filter_map(|(index, row)| match ingredient_row(row) {
                Ok(part) => Some(part),
                Err(e) => {
                    log::warn!("> Dropping ingredient row {index}: {e}");
                    None
                }
            })
            .collect();

        let tags = self
            .get_array("tags")
            .iter()
            .map(tag_row)
            .collect::<Result<Vec<NewRecipeTag>, TypeError>>()?;

        Ok(NewRecipe {
            title,
            servings,
            instructions,
            image_url: self.get_optional_str("image_url"),
            is_public: self.get_bool("is_public"),
            preparation_time: self.get_optional_str("preparation_time"),
            difficulty,
            ingredients,
            tags,
        })
    }
}

fn parse_number<T: FromStr>(value: &Value) -> Result<T, TypeError> {
    let raw = match value {
        Value::String(v) => v.trim().to_string(),
        Value::Number(v) => v.to_string(),
        _ => return Err(TypeError::new("Failed to parse value as str")),
    };

    raw.parse()
        .map_err(|_e| TypeError::new("Invalid type conversion"))
}

fn ingredient_row(row: &Value) -> Result<NewRecipeIngredient, TypeError> {
    let field = |key: &str| {
        row.get(key)
            .ok_or_else(|| TypeError::new(&format!("Missing {key}")))
    };

    let ingredient_id = parse_number(field("ingredient_id")?)?;
    let quantity: f64 = parse_number(field("quantity")?)?;
    if !quantity.is_finite() || quantity <= 0. {
        return Err(TypeError::new("Quantity must be positive"));
    }
    let unit = UnitType::try_from(field("unit")?.to_owned())?;

    Ok(NewRecipeIngredient {
        ingredient_id,
        quantity,
        unit,
    })
}

fn tag_row(row: &Value) -> Result<NewRecipeTag, TypeError> {
    let category = row
        .get("category")
        .ok_or_else(|| TypeError::new("Missing tag category"))?;
    let value = row
        .get("value")
        .and_then(|v| v.as_str())
        .ok_or_else(|| TypeError::new("Missing tag value"))?;

    Ok(NewRecipeTag {
        category: TagCategory::try_from(category.to_owned())?,
        value: value.to_string(),
    })
}
