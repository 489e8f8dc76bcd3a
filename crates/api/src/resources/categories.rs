//! Categories.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use vitrine_core::{Category, CategoryId};

use super::segment;
use crate::cache::Resource;
use crate::client::Api;
use crate::error::ApiError;

/// Product listings embed category summaries.
const CATEGORY_DEPENDENTS: &[Resource] = &[Resource::Categories, Resource::Products];

/// Category create/update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Api {
    /// Every category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.read_cached(Resource::Categories, "", "/categories", &[])
            .await
    }

    /// A single category by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the category does not exist or the request fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn category(&self, id: &CategoryId) -> Result<Category, ApiError> {
        self.read_cached(
            Resource::Categories,
            format!("id={id}"),
            &format!("/categories/{}", segment(id.as_str())),
            &[],
        )
        .await
    }

    /// Find a category by slug in the (cached) category list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be fetched.
    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, ApiError> {
        Ok(self
            .categories()
            .await?
            .into_iter()
            .find(|c| c.slug == slug))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the category or the call fails.
    #[instrument(skip_all, fields(slug = %input.slug))]
    pub async fn create_category(&self, input: &CategoryInput) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(Method::POST, "/categories", Some(input), CATEGORY_DEPENDENTS)
            .await
    }

    /// Replace a category's fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the change or the call fails.
    #[instrument(skip(self, input), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        id: &CategoryId,
        input: &CategoryInput,
    ) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(
            Method::PUT,
            &format!("/categories/{}", segment(id.as_str())),
            Some(input),
            CATEGORY_DEPENDENTS,
        )
        .await
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the deletion or the call fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: &CategoryId) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(
            Method::DELETE,
            &format!("/categories/{}", segment(id.as_str())),
            None::<&()>,
            CATEGORY_DEPENDENTS,
        )
        .await
    }
}
