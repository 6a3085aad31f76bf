use std::sync::Arc;

use crate::{
    error::{Error, HtmlError},
    filter::{filter_recipes, FilterSelection, MatchMode},
    images::{ImageStorage, ImageUpload},
    jwt::SessionData,
    permissions::{authorize, can_manage, viewer_id, ActionType},
    sampling::suggest_recipes,
    schema::{Ingredient, NewRecipe, RecipeDetails, RecipeId},
    store::{IngredientCatalog, RecipeStore},
};

/// Recipe, catalog and image operations on behalf of an optional session.
#[derive(Clone)]
pub struct RecipeService {
    recipes: Arc<dyn RecipeStore>,
    ingredients: Arc<dyn IngredientCatalog>,
    images: Arc<dyn ImageStorage>,
}

impl RecipeService {
    pub fn new(
        recipes: Arc<dyn RecipeStore>,
        ingredients: Arc<dyn IngredientCatalog>,
        images: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            recipes,
            ingredients,
            images,
        }
    }

    pub async fn list_recipes(
        &self,
        session: Option<&SessionData>,
    ) -> Result<Vec<RecipeDetails>, Error> {
        authorize_view(session)?;
        self.recipes.list_recipes(viewer_id(session).copied()).await
    }

    /// Visible recipes narrowed by a title query and a tag selection.
    pub async fn browse_recipes(
        &self,
        session: Option<&SessionData>,
        query: &str,
        selection: &FilterSelection,
        mode: MatchMode,
    ) -> Result<Vec<RecipeDetails>, Error> {
        let recipes = self.list_recipes(session).await?;
        Ok(filter_recipes(recipes, query, selection, mode))
    }

    pub async fn get_recipe(
        &self,
        id: RecipeId,
        session: Option<&SessionData>,
    ) -> Result<RecipeDetails, Error> {
        authorize_view(session)?;
        self.recipes.get_recipe(id, viewer_id(session).copied()).await
    }

    /// Up to `limit` visible recipes in random order.
    pub async fn suggestions(
        &self,
        session: Option<&SessionData>,
        limit: usize,
    ) -> Result<Vec<RecipeDetails>, Error> {
        let recipes = self.list_recipes(session).await?;
        Ok(suggest_recipes(recipes, limit))
    }

    /// Validates and stores a recipe. An accompanying image is uploaded
    /// first and removed again if the recipe cannot be written.
    pub async fn create_recipe(
        &self,
        session: Option<&SessionData>,
        recipe: NewRecipe,
        image: Option<ImageUpload>,
    ) -> Result<RecipeDetails, Error> {
        let session = authorize(session, ActionType::CreateRecipes)?;
        let mut recipe = validate_recipe(recipe)?;

        let uploaded = match image {
            Some(image) => {
                authorize(Some(session), ActionType::UploadImages)?;
                let url = self.images.upload_image(&image).await?;
                recipe.image_url = Some(url.to_owned());
                Some(url)
            }
            None => None,
        };

        match self.recipes.create_recipe(session.user_id, &recipe).await {
            Ok(created) => Ok(created),
            Err(e) => {
                if let Some(url) = uploaded {
                    if let Err(cleanup) = self.images.delete_image(&url).await {
                        log::warn!("> Failed to remove orphaned image {url}: {cleanup}");
                    }
                }
                Err(e)
            }
        }
    }

    pub async fn set_visibility(
        &self,
        session: Option<&SessionData>,
        id: RecipeId,
        is_public: bool,
    ) -> Result<(), Error> {
        let session = authorize(session, ActionType::ManageOwnRecipes)?;
        self.recipes
            .update_recipe_visibility(id, session.user_id, is_public)
            .await
    }

    /// Flips the visibility of an owned recipe and returns the new value.
    pub async fn toggle_visibility(
        &self,
        session: Option<&SessionData>,
        id: RecipeId,
    ) -> Result<bool, Error> {
        let session = authorize(session, ActionType::ManageOwnRecipes)?;
        self.recipes.toggle_recipe_visibility(id, session.user_id).await
    }

    pub async fn list_ingredients(&self) -> Result<Vec<Ingredient>, Error> {
        self.ingredients.list_ingredients().await
    }

    /// Returns the existing ingredient with this name, creating it otherwise.
    pub async fn add_ingredient(
        &self,
        session: Option<&SessionData>,
        name: &str,
    ) -> Result<Ingredient, Error> {
        authorize(session, ActionType::CreateIngredients)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(HtmlError::InvalidRequest.new("Ingredient name is empty"));
        }

        match self.ingredients.find_ingredient(name).await? {
            Some(existing) => Ok(existing),
            None => self.ingredients.create_ingredient(name).await,
        }
    }

    pub async fn upload_image(
        &self,
        session: Option<&SessionData>,
        image: &ImageUpload,
    ) -> Result<String, Error> {
        authorize(session, ActionType::UploadImages)?;
        self.images.upload_image(image).await
    }

    /// Removes the image attached to an owned recipe and detaches it from
    /// the recipe. `name_or_url` must be the recipe's current image.
    pub async fn delete_image(
        &self,
        session: Option<&SessionData>,
        id: RecipeId,
        name_or_url: &str,
    ) -> Result<(), Error> {
        let session = authorize(session, ActionType::ManageOwnRecipes)?;
        let current = self.recipes.get_recipe(id, Some(session.user_id)).await?;

        if !can_manage(&current.recipe, session) {
            log::warn!("> {} tried to delete the image of recipe {id}", session.user_id);
            return Err(HtmlError::Unauthorized.default());
        }
        if current.recipe.image_url.as_deref() != Some(name_or_url) {
            return Err(HtmlError::InvalidRequest.new("Image does not belong to this recipe"));
        }

        self.recipes
            .update_recipe_image(id, session.user_id, None)
            .await?;
        self.images.delete_image(name_or_url).await
    }
}

fn authorize_view(session: Option<&SessionData>) -> Result<(), Error> {
    if !ActionType::ViewPublicRecipes.authenticate(session) {
        return Err(HtmlError::Unauthorized.default());
    }
    Ok(())
}

fn validate_recipe(mut recipe: NewRecipe) -> Result<NewRecipe, Error> {
    recipe.title = recipe.title.trim().to_string();
    if recipe.title.is_empty() {
        return Err(HtmlError::InvalidRequest.new("Title is required"));
    }
    if recipe.servings < 1 {
        return Err(HtmlError::InvalidRequest.new("Servings must be at least 1"));
    }
    if recipe
        .ingredients
        .iter()
        .any(|part| !part.quantity.is_finite() || part.quantity <= 0.)
    {
        return Err(HtmlError::InvalidRequest.new(
            "Ingredient quantities must be positive",
        ));
    }

    recipe.preparation_time = recipe
        .preparation_time
        .map(|time| time.trim().to_string())
        .filter(|time| !time.is_empty());

    Ok(recipe)
}
