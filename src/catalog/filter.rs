use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schema::{Recipe, RecipeDetails, TagCategory};

/// Integer prefix of a free-form minutes string: leading whitespace is
/// skipped, an optional sign is read, then as many decimal digits as follow.
/// Always base 10, so `"0x1e"` reads as 0.
pub fn parse_minutes(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let digits: &str = &rest[..rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len())];
    if digits.is_empty() {
        return None;
    }

    let minutes = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -minutes } else { minutes })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreparationTimeBucket {
    #[serde(rename = "under_20")]
    Under20,
    #[serde(rename = "20_30")]
    From20To30,
    #[serde(rename = "30_45")]
    From30To45,
    #[serde(rename = "45_60")]
    From45To60,
    #[serde(rename = "60_90")]
    From60To90,
    #[serde(rename = "over_90")]
    Over90,
}

impl PreparationTimeBucket {
    pub const ALL: [PreparationTimeBucket; 6] = [
        PreparationTimeBucket::Under20,
        PreparationTimeBucket::From20To30,
        PreparationTimeBucket::From30To45,
        PreparationTimeBucket::From45To60,
        PreparationTimeBucket::From60To90,
        PreparationTimeBucket::Over90,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            PreparationTimeBucket::Under20 => "under_20",
            PreparationTimeBucket::From20To30 => "20_30",
            PreparationTimeBucket::From30To45 => "30_45",
            PreparationTimeBucket::From45To60 => "45_60",
            PreparationTimeBucket::From60To90 => "60_90",
            PreparationTimeBucket::Over90 => "over_90",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.key() == key)
    }

    pub fn from_minutes(minutes: i64) -> Self {
        match minutes {
            m if m < 20 => PreparationTimeBucket::Under20,
            m if m <= 30 => PreparationTimeBucket::From20To30,
            m if m <= 45 => PreparationTimeBucket::From30To45,
            m if m <= 60 => PreparationTimeBucket::From45To60,
            m if m <= 90 => PreparationTimeBucket::From60To90,
            _ => PreparationTimeBucket::Over90,
        }
    }

    pub fn contains(&self, minutes: i64) -> bool {
        Self::from_minutes(minutes) == *self
    }

    pub fn label(&self) -> &'static str {
        TagCategory::PreparationTime
            .option_label(self.key())
            .unwrap_or_else(|| self.key())
    }
}

/// Whether a stored preparation time falls in the bucket named `filter_value`.
/// Missing or non-numeric times and unknown bucket keys never match.
pub fn time_filter_predicate(preparation_time: Option<&str>, filter_value: &str) -> bool {
    let minutes = match preparation_time.and_then(parse_minutes) {
        Some(minutes) => minutes,
        None => return false,
    };

    PreparationTimeBucket::from_key(filter_value)
        .map(|bucket| bucket.contains(minutes))
        .unwrap_or(false)
}

pub fn time_label(preparation_time: Option<&str>) -> &'static str {
    preparation_time
        .and_then(parse_minutes)
        .map(|minutes| PreparationTimeBucket::from_minutes(minutes).label())
        .unwrap_or("Non défini")
}

/// Selected filter values per category. Categories without a selected value
/// are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSelection {
    inner: BTreeMap<TagCategory, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.values().all(|values| values.is_empty())
    }

    pub fn values(&self, category: TagCategory) -> Option<&BTreeSet<String>> {
        self.inner.get(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&TagCategory, &BTreeSet<String>)> {
        self.inner.iter()
    }

    pub fn select(&mut self, category: TagCategory, value: &str) {
        self.inner
            .entry(category)
            .or_default()
            .insert(value.to_string());
    }

    /// Adds `value` if absent, removes it otherwise. Returns whether it is now selected.
    pub fn toggle(&mut self, category: TagCategory, value: &str) -> bool {
        let values = self.inner.entry(category).or_default();
        let selected = if values.remove(value) {
            false
        } else {
            values.insert(value.to_string());
            true
        };

        if values.is_empty() {
            self.inner.remove(&category);
        }

        selected
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn total(&self) -> usize {
        self.inner.values().map(|values| values.len()).sum()
    }

    /// Display labels of every selected value, in taxonomy category order.
    pub fn labels(&self) -> Vec<(TagCategory, &str)> {
        TagCategory::ALL
            .iter()
            .filter_map(|category| self.inner.get(category).map(|values| (*category, values)))
            .flat_map(|(category, values)| {
                values
                    .iter()
                    .map(move |value| (category, category.label_or_value(value)))
            })
            .collect()
    }
}

impl FromIterator<(TagCategory, String)> for FilterSelection {
    fn from_iter<I: IntoIterator<Item = (TagCategory, String)>>(iter: I) -> Self {
        let mut selection = Self::new();
        iter.into_iter()
            .for_each(|(category, value)| selection.select(category, &value));
        selection
    }
}

/// How selected tag filters combine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Every selected category must be satisfied; values within one category are alternatives.
    #[default]
    AllCategories,
    /// A single tag satisfying its own category's selection is enough.
    AnyTag,
}

pub fn matches_query(recipe: &Recipe, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    recipe.title.to_lowercase().contains(&query.to_lowercase())
}

pub fn matches_selection(
    recipe: &RecipeDetails,
    selection: &FilterSelection,
    mode: MatchMode,
) -> bool {
    if selection.is_empty() {
        return true;
    }

    let preparation_time = recipe.recipe.preparation_time.as_deref();

    match mode {
        MatchMode::AllCategories => selection
            .categories()
            .filter(|(_, values)| !values.is_empty())
            .all(|(category, values)| {
                if *category == TagCategory::PreparationTime {
                    return values
                        .iter()
                        .any(|value| time_filter_predicate(preparation_time, value));
                }

                values.iter().any(|value| recipe.has_tag(*category, value))
            }),
        MatchMode::AnyTag => recipe.tags.iter().any(|tag| {
            match (tag.category, selection.values(tag.category)) {
                (_, None) => false,
                (TagCategory::PreparationTime, Some(values)) => values
                    .iter()
                    .any(|value| time_filter_predicate(preparation_time, value)),
                (_, Some(values)) => values.contains(&tag.value),
            }
        }),
    }
}

pub fn matches(
    recipe: &RecipeDetails,
    query: &str,
    selection: &FilterSelection,
    mode: MatchMode,
) -> bool {
    matches_query(&recipe.recipe, query) && matches_selection(recipe, selection, mode)
}

/// Recipes matching the text query and the selection, in input order.
pub fn filter_recipes(
    recipes: Vec<RecipeDetails>,
    query: &str,
    selection: &FilterSelection,
    mode: MatchMode,
) -> Vec<RecipeDetails> {
    recipes
        .into_iter()
        .filter(|recipe| matches(recipe, query, selection, mode))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::schema::RecipeTag;

    fn recipe(
        id: i64,
        title: &str,
        time: Option<&str>,
        tags: &[(TagCategory, &str)],
    ) -> RecipeDetails {
        let now = Utc::now();
        RecipeDetails {
            recipe: Recipe {
                id,
                title: title.to_string(),
                servings: 4,
                instructions: String::new(),
                image_url: None,
                user_id: Uuid::nil(),
                is_public: true,
                preparation_time: time.map(|t| t.to_string()),
                difficulty: None,
                created_at: now,
                updated_at: now,
            },
            ingredients: vec![],
            tags: tags
                .iter()
                .map(|(category, value)| RecipeTag {
                    recipe_id: id,
                    category: *category,
                    value: value.to_string(),
                    label: category.label_or_value(value).to_string(),
                })
                .collect(),
        }
    }

    fn ids(recipes: &[RecipeDetails]) -> Vec<i64> {
        recipes.iter().map(|r| r.recipe.id).collect()
    }

    fn catalog() -> Vec<RecipeDetails> {
        vec![
            recipe(
                1,
                "Tarte aux pommes",
                Some("45"),
                &[(TagCategory::Difficulty, "easy"), (TagCategory::DishType, "dessert")],
            ),
            recipe(
                2,
                "Boeuf bourguignon",
                Some("180"),
                &[(TagCategory::Difficulty, "hard"), (TagCategory::CuisineType, "french")],
            ),
            recipe(
                3,
                "Pad thaï",
                Some("25 min"),
                &[(TagCategory::CuisineType, "thai"), (TagCategory::PreparationTime, "20_30")],
            ),
            recipe(4, "Pommes sautées", None, &[]),
        ]
    }

    #[test]
    fn parse_minutes_reads_integer_prefix() {
        assert_eq!(parse_minutes("25"), Some(25));
        assert_eq!(parse_minutes("  25 min"), Some(25));
        assert_eq!(parse_minutes("20.5"), Some(20));
        assert_eq!(parse_minutes("-5"), Some(-5));
        assert_eq!(parse_minutes("abc"), None);
        assert_eq!(parse_minutes(""), None);
        assert_eq!(parse_minutes("min 25"), None);
        assert_eq!(parse_minutes("0x1e"), Some(0));
    }

    #[test]
    fn bucket_boundaries() {
        assert!(time_filter_predicate(Some("20"), "20_30"));
        assert!(time_filter_predicate(Some("30"), "20_30"));
        assert!(!time_filter_predicate(Some("19"), "20_30"));
        assert!(!time_filter_predicate(Some("31"), "20_30"));
        assert!(time_filter_predicate(Some("31"), "30_45"));
        assert!(time_filter_predicate(Some("19"), "under_20"));
        assert!(time_filter_predicate(Some("60"), "45_60"));
        assert!(time_filter_predicate(Some("90"), "60_90"));
        assert!(time_filter_predicate(Some("91"), "over_90"));
    }

    #[test]
    fn unparseable_times_never_match() {
        for bucket in PreparationTimeBucket::ALL {
            assert!(!time_filter_predicate(None, bucket.key()));
            assert!(!time_filter_predicate(Some("quick"), bucket.key()));
        }
        assert!(!time_filter_predicate(Some("25"), "quick"));
    }

    #[test]
    fn every_minute_lands_in_exactly_one_bucket() {
        for minutes in -5..200 {
            let hits = PreparationTimeBucket::ALL
                .iter()
                .filter(|bucket| bucket.contains(minutes))
                .count();
            assert_eq!(hits, 1, "{minutes} minutes");
        }
    }

    #[test]
    fn time_labels() {
        assert_eq!(time_label(None), "Non défini");
        assert_eq!(time_label(Some("soon")), "Non défini");
        assert_eq!(time_label(Some("15")), "Moins de 20 min");
        assert_eq!(time_label(Some("75")), "1h-1h30");
        assert_eq!(time_label(Some("120")), "Plus de 1h30");
    }

    #[test]
    fn empty_query_and_selection_is_identity() {
        let recipes = catalog();
        let filtered = filter_recipes(
            recipes.clone(),
            "",
            &FilterSelection::new(),
            MatchMode::default(),
        );
        assert_eq!(filtered, recipes);

        let filtered = filter_recipes(
            recipes.clone(),
            "",
            &FilterSelection::new(),
            MatchMode::AnyTag,
        );
        assert_eq!(filtered, recipes);
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        let filtered = filter_recipes(
            catalog(),
            "POMMES",
            &FilterSelection::new(),
            MatchMode::default(),
        );
        assert_eq!(ids(&filtered), vec![1, 4]);

        let filtered = filter_recipes(
            catalog(),
            "risotto",
            &FilterSelection::new(),
            MatchMode::default(),
        );
        assert!(filtered.is_empty());
    }

    #[test]
    fn single_category_selection() {
        let selection: FilterSelection =
            [(TagCategory::Difficulty, String::from("easy"))].into_iter().collect();

        for mode in [MatchMode::AllCategories, MatchMode::AnyTag] {
            let filtered = filter_recipes(catalog(), "", &selection, mode);
            assert_eq!(ids(&filtered), vec![1]);
        }
    }

    #[test]
    fn untagged_recipes_fail_tag_filters() {
        let selection: FilterSelection =
            [(TagCategory::Cost, String::from("budget"))].into_iter().collect();
        let filtered = filter_recipes(catalog(), "pommes", &selection, MatchMode::AnyTag);
        assert!(filtered.is_empty());
    }

    #[test]
    fn values_within_a_category_are_alternatives() {
        let selection: FilterSelection = [
            (TagCategory::CuisineType, String::from("french")),
            (TagCategory::CuisineType, String::from("thai")),
        ]
        .into_iter()
        .collect();

        let filtered = filter_recipes(catalog(), "", &selection, MatchMode::AllCategories);
        assert_eq!(ids(&filtered), vec![2, 3]);
    }

    #[test]
    fn all_categories_mode_requires_every_category() {
        let selection: FilterSelection = [
            (TagCategory::Difficulty, String::from("easy")),
            (TagCategory::CuisineType, String::from("french")),
        ]
        .into_iter()
        .collect();

        let strict = filter_recipes(catalog(), "", &selection, MatchMode::AllCategories);
        assert!(strict.is_empty());

        let loose = filter_recipes(catalog(), "", &selection, MatchMode::AnyTag);
        assert_eq!(ids(&loose), vec![1, 2]);
    }

    #[test]
    fn preparation_time_uses_stored_minutes() {
        let selection: FilterSelection =
            [(TagCategory::PreparationTime, String::from("30_45"))].into_iter().collect();

        // Recipe 1 takes 45 minutes but carries no preparation_time tag.
        let strict = filter_recipes(catalog(), "", &selection, MatchMode::AllCategories);
        assert_eq!(ids(&strict), vec![1]);

        let loose = filter_recipes(catalog(), "", &selection, MatchMode::AnyTag);
        assert!(loose.is_empty());

        let selection: FilterSelection =
            [(TagCategory::PreparationTime, String::from("20_30"))].into_iter().collect();
        let loose = filter_recipes(catalog(), "", &selection, MatchMode::AnyTag);
        assert_eq!(ids(&loose), vec![3]);
    }

    #[test]
    fn toggle_adds_then_removes_and_drops_empty_categories() {
        let mut selection = FilterSelection::new();
        assert!(selection.toggle(TagCategory::Diet, "vegan"));
        assert!(selection.toggle(TagCategory::Diet, "vegetarian"));
        assert_eq!(selection.total(), 2);

        assert!(!selection.toggle(TagCategory::Diet, "vegan"));
        assert!(!selection.toggle(TagCategory::Diet, "vegetarian"));
        assert!(selection.is_empty());
        assert_eq!(selection.values(TagCategory::Diet), None);
    }

    #[test]
    fn labels_follow_taxonomy_order() {
        let mut selection = FilterSelection::new();
        selection.select(TagCategory::Cost, "budget");
        selection.select(TagCategory::Difficulty, "hard");
        selection.select(TagCategory::Cost, "unheard_of");

        assert_eq!(
            selection.labels(),
            vec![
                (TagCategory::Difficulty, "Difficile"),
                (TagCategory::Cost, "Économique"),
                (TagCategory::Cost, "unheard_of"),
            ]
        );

        selection.clear();
        assert_eq!(selection.total(), 0);
    }

    #[test]
    fn selection_deserializes_from_category_map() {
        let selection: FilterSelection =
            serde_json::from_str(r#"{"difficulty": ["easy"], "preparation_time": ["20_30"]}"#)
                .unwrap();
        assert_eq!(selection.total(), 2);
        assert!(selection
            .values(TagCategory::PreparationTime)
            .unwrap()
            .contains("20_30"));
    }
}
