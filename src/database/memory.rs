use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{Error, HtmlError, QueryError},
    schema::{
        Ingredient, IngredientId, NewRecipe, NewRecipeIngredient, Recipe, RecipeDetails,
        RecipeId, RecipeIngredient, RecipeTag, User, UserId,
    },
    store::{IngredientCatalog, RecipeStore, UserStore},
};

/// Write step of recipe creation that a [`MemoryStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    RecipeInsert,
    IngredientInsert,
    TagInsert,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,
    recipe_ingredients: Vec<(RecipeId, NewRecipeIngredient)>,
    recipe_tags: Vec<RecipeTag>,
    next_recipe_id: RecipeId,
    next_ingredient_id: IngredientId,
    failure: Option<FailurePoint>,
}

impl MemoryState {
    fn details(&self, recipe: &Recipe) -> RecipeDetails {
        let mut ingredients: Vec<RecipeIngredient> = self
            .recipe_ingredients
            .iter()
            .filter(|(recipe_id, _)| *recipe_id == recipe.id)
            .map(|(recipe_id, part)| RecipeIngredient {
                recipe_id: *recipe_id,
                ingredient_id: part.ingredient_id,
                quantity: part.quantity,
                unit: part.unit,
                name: self
                    .ingredients
                    .iter()
                    .find(|ingredient| ingredient.id == part.ingredient_id)
                    .map(|ingredient| ingredient.name.to_owned())
                    .unwrap_or_default(),
            })
            .collect();
        ingredients.sort_by(|a, b| a.name.cmp(&b.name));

        let mut tags: Vec<RecipeTag> = self
            .recipe_tags
            .iter()
            .filter(|tag| tag.recipe_id == recipe.id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| (a.category, &a.value).cmp(&(b.category, &b.value)));

        RecipeDetails {
            recipe: recipe.clone(),
            ingredients,
            tags,
        }
    }

    fn owned_mut(&mut self, id: RecipeId, owner: UserId) -> Result<&mut Recipe, Error> {
        self.recipes
            .iter_mut()
            .find(|recipe| recipe.id == id && recipe.is_owned_by(&owner))
            .ok_or_else(|| {
                HtmlError::Unauthorized.new("Recipe not found or not owned by the current user")
            })
    }

    fn fail_at(&self, point: FailurePoint) -> Result<(), Error> {
        if self.failure == Some(point) {
            return Err(QueryError::new(format!("Injected failure at {point:?}")).into());
        }
        Ok(())
    }
}

/// In-process store implementing every store trait. Recipe creation is
/// staged and only committed once every write step has succeeded.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following recipe creation fail at `point`; `None` clears it.
    pub async fn fail_on(&self, point: Option<FailurePoint>) {
        self.state.lock().await.failure = point;
    }

    pub async fn recipe_count(&self) -> usize {
        self.state.lock().await.recipes.len()
    }

    pub async fn recipe_ingredient_count(&self) -> usize {
        self.state.lock().await.recipe_ingredients.len()
    }

    pub async fn recipe_tag_count(&self) -> usize {
        self.state.lock().await.recipe_tags.len()
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn list_recipes(&self, viewer: Option<UserId>) -> Result<Vec<RecipeDetails>, Error> {
        let state = self.state.lock().await;

        let mut rows: Vec<&Recipe> = state
            .recipes
            .iter()
            .filter(|recipe| recipe.is_visible_to(viewer.as_ref()))
            .collect();
        rows.sort_by_key(|recipe| Reverse((recipe.created_at, recipe.id)));

        Ok(rows.into_iter().map(|recipe| state.details(recipe)).collect())
    }

    async fn get_recipe(
        &self,
        id: RecipeId,
        viewer: Option<UserId>,
    ) -> Result<RecipeDetails, Error> {
        let state = self.state.lock().await;

        state
            .recipes
            .iter()
            .find(|recipe| recipe.id == id && recipe.is_visible_to(viewer.as_ref()))
            .map(|recipe| state.details(recipe))
            .ok_or_else(|| HtmlError::NotFound.new("No recipe exists with specified id"))
    }

    async fn create_recipe(
        &self,
        owner: UserId,
        recipe: &NewRecipe,
    ) -> Result<RecipeDetails, Error> {
        let mut state = self.state.lock().await;

        state.fail_at(FailurePoint::RecipeInsert)?;
        let now = Utc::now();
        let row = Recipe {
            id: state.next_recipe_id + 1,
            title: recipe.title.to_owned(),
            servings: recipe.servings,
            instructions: recipe.instructions.to_owned(),
            image_url: recipe.image_url.to_owned(),
            user_id: owner,
            is_public: recipe.is_public,
            preparation_time: recipe.preparation_time.to_owned(),
            difficulty: recipe.difficulty,
            created_at: now,
            updated_at: now,
        };

        if !recipe.ingredients.is_empty() {
            state.fail_at(FailurePoint::IngredientInsert)?;
        }
        for part in recipe.ingredients.iter() {
            if !state
                .ingredients
                .iter()
                .any(|ingredient| ingredient.id == part.ingredient_id)
            {
                return Err(QueryError::new(format!(
                    "Foreign key violation: ingredient {} does not exist",
                    part.ingredient_id
                ))
                .into());
            }
        }

        let tags = recipe.tag_rows(row.id);
        if !tags.is_empty() {
            state.fail_at(FailurePoint::TagInsert)?;
        }

        state.next_recipe_id = row.id;
        state.recipe_ingredients.extend(
            recipe
                .ingredients
                .iter()
                .map(|part| (row.id, part.clone())),
        );
        state.recipe_tags.extend(tags);
        state.recipes.push(row.clone());

        Ok(state.details(&row))
    }

    async fn update_recipe_visibility(
        &self,
        id: RecipeId,
        owner: UserId,
        is_public: bool,
    ) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        let recipe = state.owned_mut(id, owner)?;

        recipe.is_public = is_public;
        recipe.updated_at = Utc::now();
        Ok(())
    }

    async fn toggle_recipe_visibility(&self, id: RecipeId, owner: UserId) -> Result<bool, Error> {
        let mut state = self.state.lock().await;
        let recipe = state.owned_mut(id, owner)?;

        recipe.is_public = !recipe.is_public;
        recipe.updated_at = Utc::now();
        Ok(recipe.is_public)
    }

    async fn update_recipe_image(
        &self,
        id: RecipeId,
        owner: UserId,
        image_url: Option<&str>,
    ) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        let recipe = state.owned_mut(id, owner)?;

        recipe.image_url = image_url.map(|url| url.to_string());
        recipe.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl IngredientCatalog for MemoryStore {
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, Error> {
        let mut rows = self.state.lock().await.ingredients.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_ingredient(&self, name: &str) -> Result<Option<Ingredient>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .ingredients
            .iter()
            .find(|ingredient| ingredient.name == name)
            .cloned())
    }

    async fn create_ingredient(&self, name: &str) -> Result<Ingredient, Error> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state.ingredients.iter().find(|i| i.name == name) {
            return Ok(existing.clone());
        }

        state.next_ingredient_id += 1;
        let row = Ingredient {
            id: state.next_ingredient_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.ingredients.push(row.clone());

        Ok(row)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, Error> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|user| user.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn register_user(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> Result<Option<User>, Error> {
        let mut state = self.state.lock().await;

        if state
            .users
            .iter()
            .any(|user| user.email.eq_ignore_ascii_case(email))
        {
            return Ok(None);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password: password.map(|p| p.to_string()),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());

        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NewRecipeTag, TagCategory, UnitType};

    fn new_recipe(
        title: &str,
        is_public: bool,
        ingredients: Vec<NewRecipeIngredient>,
    ) -> NewRecipe {
        NewRecipe {
            title: title.to_string(),
            servings: 4,
            instructions: String::from("<p>Mélanger.</p>"),
            image_url: None,
            is_public,
            preparation_time: Some(String::from("25")),
            difficulty: None,
            ingredients,
            tags: vec![NewRecipeTag {
                category: TagCategory::Difficulty,
                value: String::from("easy"),
            }],
        }
    }

    async fn two_ingredients(store: &MemoryStore) -> Vec<NewRecipeIngredient> {
        let flour = store.create_ingredient("Farine").await.unwrap();
        let butter = store.create_ingredient("Beurre").await.unwrap();
        vec![
            NewRecipeIngredient {
                ingredient_id: flour.id,
                quantity: 250.,
                unit: UnitType::Gram,
            },
            NewRecipeIngredient {
                ingredient_id: butter.id,
                quantity: 125.,
                unit: UnitType::Gram,
            },
        ]
    }

    #[tokio::test]
    async fn created_recipe_carries_joined_details() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let parts = two_ingredients(&store).await;

        let created = store
            .create_recipe(owner, &new_recipe("Sablés", false, parts))
            .await
            .unwrap();

        let names: Vec<&str> = created.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Beurre", "Farine"]);
        assert_eq!(created.tags.len(), 1);
        assert_eq!(created.tags[0].label, "Facile");
        assert!(!created.recipe.is_public);
    }

    #[tokio::test]
    async fn failed_ingredient_insert_leaves_nothing_behind() {
        let store = MemoryStore::new();
        let parts = two_ingredients(&store).await;
        store.fail_on(Some(FailurePoint::IngredientInsert)).await;

        let result = store
            .create_recipe(Uuid::new_v4(), &new_recipe("Sablés", true, parts))
            .await;

        assert!(result.is_err());
        assert_eq!(store.recipe_count().await, 0);
        assert_eq!(store.recipe_ingredient_count().await, 0);
        assert_eq!(store.recipe_tag_count().await, 0);
    }

    #[tokio::test]
    async fn failed_tag_insert_rolls_back_ingredients() {
        let store = MemoryStore::new();
        let parts = two_ingredients(&store).await;
        store.fail_on(Some(FailurePoint::TagInsert)).await;

        assert!(store
            .create_recipe(Uuid::new_v4(), &new_recipe("Sablés", true, parts))
            .await
            .is_err());
        assert_eq!(store.recipe_count().await, 0);
        assert_eq!(store.recipe_ingredient_count().await, 0);

        store.fail_on(None).await;
        let parts = two_ingredients(&store).await;
        store
            .create_recipe(Uuid::new_v4(), &new_recipe("Sablés", true, parts))
            .await
            .unwrap();
        assert_eq!(store.recipe_count().await, 1);
        assert_eq!(store.recipe_ingredient_count().await, 2);
    }

    #[tokio::test]
    async fn unknown_ingredient_is_rejected() {
        let store = MemoryStore::new();
        let parts = vec![NewRecipeIngredient {
            ingredient_id: 99,
            quantity: 1.,
            unit: UnitType::Piece,
        }];

        assert!(store
            .create_recipe(Uuid::new_v4(), &new_recipe("Omelette", true, parts))
            .await
            .is_err());
        assert_eq!(store.recipe_count().await, 0);
    }

    #[tokio::test]
    async fn listing_respects_visibility() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.create_recipe(alice, &new_recipe("Public", true, vec![])).await.unwrap();
        let private = store
            .create_recipe(alice, &new_recipe("Privée", false, vec![]))
            .await
            .unwrap();

        assert_eq!(store.list_recipes(None).await.unwrap().len(), 1);
        assert_eq!(store.list_recipes(Some(bob)).await.unwrap().len(), 1);

        let mine = store.list_recipes(Some(alice)).await.unwrap();
        let titles: Vec<&str> = mine.iter().map(|r| r.recipe.title.as_str()).collect();
        assert_eq!(titles, vec!["Privée", "Public"]);

        let e = store
            .get_recipe(private.recipe.id, Some(bob))
            .await
            .unwrap_err();
        assert_eq!(e.code, 404);
        assert!(store.get_recipe(private.recipe.id, Some(alice)).await.is_ok());
    }

    #[tokio::test]
    async fn non_owner_cannot_change_visibility() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let created = store
            .create_recipe(alice, &new_recipe("Privée", false, vec![]))
            .await
            .unwrap();

        let e = store
            .update_recipe_visibility(created.recipe.id, Uuid::new_v4(), true)
            .await
            .unwrap_err();
        assert_eq!(e.code, 403);

        let row = store.get_recipe(created.recipe.id, Some(alice)).await.unwrap();
        assert!(!row.recipe.is_public);

        store
            .update_recipe_visibility(created.recipe.id, alice, true)
            .await
            .unwrap();
        assert!(store.get_recipe(created.recipe.id, None).await.is_ok());
    }

    #[tokio::test]
    async fn toggling_flips_owned_rows_only() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let id = store
            .create_recipe(alice, &new_recipe("Privée", false, vec![]))
            .await
            .unwrap()
            .recipe
            .id;

        assert!(store.toggle_recipe_visibility(id, alice).await.unwrap());
        assert!(!store.toggle_recipe_visibility(id, alice).await.unwrap());

        let e = store
            .toggle_recipe_visibility(id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(e.code, 403);
        let row = store.get_recipe(id, Some(alice)).await.unwrap();
        assert!(!row.recipe.is_public);
    }

    #[tokio::test]
    async fn image_url_changes_for_the_owner_only() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let id = store
            .create_recipe(alice, &new_recipe("Tarte", true, vec![]))
            .await
            .unwrap()
            .recipe
            .id;

        store
            .update_recipe_image(id, alice, Some("/uploads/a.png"))
            .await
            .unwrap();
        assert_eq!(
            store
                .update_recipe_image(id, Uuid::new_v4(), None)
                .await
                .unwrap_err()
                .code,
            403
        );

        let row = store.get_recipe(id, None).await.unwrap();
        assert_eq!(row.recipe.image_url.as_deref(), Some("/uploads/a.png"));
    }

    #[tokio::test]
    async fn ingredient_catalog_reuses_names() {
        let store = MemoryStore::new();
        let first = store.create_ingredient("Sel").await.unwrap();
        let second = store.create_ingredient("Sel").await.unwrap();
        store.create_ingredient("Ail").await.unwrap();

        assert_eq!(first.id, second.id);
        let names: Vec<String> = store
            .list_ingredients()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Ail", "Sel"]);
        assert!(store.find_ingredient("sel").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_emails_are_not_registered() {
        let store = MemoryStore::new();
        assert!(store
            .register_user("chef@foodflow.example", Some("hash"))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .register_user("CHEF@foodflow.example", None)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get_user_by_email("Chef@FoodFlow.example")
            .await
            .unwrap()
            .is_some());
    }
}
