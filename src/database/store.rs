use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::{
    actions::{ingredients, recipes, users},
    config::Config,
    error::{Error, QueryError},
    schema::{Ingredient, NewRecipe, RecipeDetails, RecipeId, User, UserId},
};

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Public recipes plus the viewer's own, newest first.
    async fn list_recipes(&self, viewer: Option<UserId>) -> Result<Vec<RecipeDetails>, Error>;

    /// Fails with 404 unless the recipe is public or owned by the viewer.
    async fn get_recipe(
        &self,
        id: RecipeId,
        viewer: Option<UserId>,
    ) -> Result<RecipeDetails, Error>;

    /// All-or-nothing: the recipe row, ingredient rows and tag rows are
    /// persisted together or not at all.
    async fn create_recipe(
        &self,
        owner: UserId,
        recipe: &NewRecipe,
    ) -> Result<RecipeDetails, Error>;

    async fn update_recipe_visibility(
        &self,
        id: RecipeId,
        owner: UserId,
        is_public: bool,
    ) -> Result<(), Error>;

    /// Flips visibility atomically and returns the new value.
    async fn toggle_recipe_visibility(&self, id: RecipeId, owner: UserId) -> Result<bool, Error>;

    async fn update_recipe_image(
        &self,
        id: RecipeId,
        owner: UserId,
        image_url: Option<&str>,
    ) -> Result<(), Error>;
}

#[async_trait]
pub trait IngredientCatalog: Send + Sync {
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, Error>;
    async fn find_ingredient(&self, name: &str) -> Result<Option<Ingredient>, Error>;
    async fn create_ingredient(&self, name: &str) -> Result<Ingredient, Error>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, Error>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, Error>;
    async fn register_user(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> Result<Option<User>, Error>;
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await
            .map_err(QueryError::from)?;

        log::info!("> Connected to database");
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| QueryError::new(format!("Migration failed: {e}")))?;

        Ok(())
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl RecipeStore for PgStore {
    async fn list_recipes(&self, viewer: Option<UserId>) -> Result<Vec<RecipeDetails>, Error> {
        recipes::list_recipes(viewer, &self.pool).await
    }

    async fn get_recipe(
        &self,
        id: RecipeId,
        viewer: Option<UserId>,
    ) -> Result<RecipeDetails, Error> {
        recipes::get_recipe(id, viewer, &self.pool).await
    }

    async fn create_recipe(
        &self,
        owner: UserId,
        recipe: &NewRecipe,
    ) -> Result<RecipeDetails, Error> {
        recipes::create_recipe(owner, recipe, &self.pool).await
    }

    async fn update_recipe_visibility(
        &self,
        id: RecipeId,
        owner: UserId,
        is_public: bool,
    ) -> Result<(), Error> {
        recipes::update_recipe_visibility(id, owner, is_public, &self.pool).await
    }

    async fn toggle_recipe_visibility(&self, id: RecipeId, owner: UserId) -> Result<bool, Error> {
        recipes::toggle_recipe_visibility(id, owner, &self.pool).await
    }

    async fn update_recipe_image(
        &self,
        id: RecipeId,
        owner: UserId,
        image_url: Option<&str>,
    ) -> Result<(), Error> {
        recipes::update_recipe_image(id, owner, image_url, &self.pool).await
    }
}

#[async_trait]
impl IngredientCatalog for PgStore {
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, Error> {
        ingredients::list_ingredients(&self.pool).await
    }

    async fn find_ingredient(&self, name: &str) -> Result<Option<Ingredient>, Error> {
        ingredients::find_ingredient(name, &self.pool).await
    }

    async fn create_ingredient(&self, name: &str) -> Result<Ingredient, Error> {
        ingredients::create_ingredient(name, &self.pool).await
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, Error> {
        users::get_user_by_id(id, &self.pool).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        users::get_user_by_email(email, &self.pool).await
    }

    async fn register_user(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> Result<Option<User>, Error> {
        users::register_user(email, password, &self.pool).await
    }
}
