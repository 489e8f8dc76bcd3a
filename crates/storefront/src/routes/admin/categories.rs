//! Back-office category management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use vitrine_api::{Api, CategoryInput};
use vitrine_core::validation;
use vitrine_core::{Category, CategoryId, slugify};

use super::upload::{IMAGE_URL_FIELD, MultipartForm};
use crate::error::{Result, form_error};
use crate::middleware::RequireAdmin;
use crate::middleware::session_store::set_flash;
use crate::models::{Flash, Layout};
use crate::routes::views::{CategoryView, non_blank};
use crate::state::AppState;

/// Category form values, as typed.
#[derive(Debug, Clone, Default)]
pub struct CategoryFormView {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: String,
}

impl CategoryFormView {
    fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            name: form.text("name").to_string(),
            slug: form.text("slug").to_string(),
            description: form.text("description").to_string(),
            image: form.text(IMAGE_URL_FIELD).to_string(),
        }
    }

    fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone().unwrap_or_default(),
            image: category.image.clone().unwrap_or_default(),
        }
    }

    /// The slug to store: the typed one normalized, or one derived from the name.
    fn effective_slug(&self) -> String {
        match non_blank(Some(self.slug.as_str())) {
            Some(slug) => slugify(&slug),
            None => slugify(&self.name),
        }
    }

    fn to_input(&self, image: Option<String>) -> std::result::Result<CategoryInput, String> {
        validation::require_name(&self.name).map_err(|e| e.to_string())?;
        let slug = self.effective_slug();
        if slug.is_empty() {
            return Err("Informe um slug com letras ou números.".to_string());
        }
        Ok(CategoryInput {
            name: self.name.trim().to_string(),
            slug,
            description: non_blank(Some(self.description.as_str())),
            image,
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/categories.html")]
pub struct CategoriesTemplate {
    pub layout: Layout,
    pub categories: Vec<CategoryView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/category_form.html")]
pub struct CategoryFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub form: CategoryFormView,
    pub error: Option<String>,
}

fn render_form(
    layout: Layout,
    id: Option<&str>,
    form: CategoryFormView,
    error: Option<String>,
) -> Response {
    CategoryFormTemplate {
        layout,
        title: if id.is_some() { "Editar categoria" } else { "Nova categoria" },
        action: id.map_or_else(
            || "/admin/categories".to_string(),
            |id| format!("/admin/categories/{}", urlencoding::encode(id)),
        ),
        form,
        error,
    }
    .into_response()
}

/// Every category.
#[instrument(skip_all, fields(admin_id = %admin.user.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    layout: Layout,
) -> Result<CategoriesTemplate> {
    let categories = state.api_as(&admin).categories().await?;
    Ok(CategoriesTemplate {
        layout,
        categories: categories.iter().map(CategoryView::from).collect(),
    })
}

/// Empty category form.
pub async fn new(RequireAdmin(_): RequireAdmin, layout: Layout) -> Response {
    render_form(layout, None, CategoryFormView::default(), None)
}

/// Create a category.
#[instrument(skip_all, fields(admin_id = %admin.user.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    multipart: Multipart,
) -> Result<Response> {
    save(&state.api_as(&admin), &session, layout, None, multipart).await
}

/// Category form filled with the current values.
#[instrument(skip(admin, state, layout), fields(admin_id = %admin.user.id))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    layout: Layout,
) -> Result<Response> {
    let category = state
        .api_as(&admin)
        .category(&CategoryId::from(id.as_str()))
        .await?;
    Ok(render_form(
        layout,
        Some(&id),
        CategoryFormView::from_category(&category),
        None,
    ))
}

/// Save changes to a category.
#[instrument(skip(admin, state, session, layout, multipart), fields(admin_id = %admin.user.id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    layout: Layout,
    multipart: Multipart,
) -> Result<Response> {
    save(&state.api_as(&admin), &session, layout, Some(&id), multipart).await
}

async fn save(
    api: &Api,
    session: &Session,
    layout: Layout,
    id: Option<&str>,
    multipart: Multipart,
) -> Result<Response> {
    let mut multipart = MultipartForm::read(multipart).await?;
    let view = CategoryFormView::from_multipart(&multipart);

    if let Err(error) = view.to_input(None) {
        return Ok(render_form(layout, id, view, Some(error)));
    }
    let image = match multipart.resolve_image(api).await {
        Ok(image) => image,
        Err(e) => return Ok(render_form(layout, id, view, Some(form_error(e)?))),
    };
    let input = match view.to_input(image) {
        Ok(input) => input,
        Err(error) => return Ok(render_form(layout, id, view, Some(error))),
    };

    let result = match id {
        Some(id) => api.update_category(&CategoryId::from(id), &input).await,
        None => api.create_category(&input).await,
    };
    match result {
        Ok(()) => {
            let message = if id.is_some() { "Categoria atualizada." } else { "Categoria criada." };
            set_flash(session, Flash::success(message)).await?;
            Ok(Redirect::to("/admin/categories").into_response())
        }
        Err(e) => {
            let error = Some(form_error(e)?);
            let view = CategoryFormView {
                slug: input.slug,
                image: input.image.unwrap_or_default(),
                ..view
            };
            Ok(render_form(layout, id, view, error))
        }
    }
}

/// Delete a category.
#[instrument(skip(admin, state, session), fields(admin_id = %admin.user.id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    match state
        .api_as(&admin)
        .delete_category(&CategoryId::from(id.as_str()))
        .await
    {
        Ok(()) => set_flash(&session, Flash::info("Categoria excluída.")).await?,
        Err(e) => set_flash(&session, Flash::error(form_error(e)?)).await?,
    }
    Ok(Redirect::to("/admin/categories"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> CategoryFormView {
        CategoryFormView::from_multipart(&MultipartForm::from_pairs(pairs))
    }

    #[test]
    fn test_slug_derived_from_name() {
        let input = form(&[("name", "Vestidos")]).to_input(None).unwrap();
        assert_eq!(input.slug, "vestidos");
        assert!(input.description.is_none());
    }

    #[test]
    fn test_typed_slug_is_normalized() {
        let input = form(&[("name", "Saias"), ("slug", "Saias Longas")])
            .to_input(Some("https://cdn/x.png".into()))
            .unwrap();
        assert_eq!(input.slug, "saias-longas");
        assert_eq!(input.image.as_deref(), Some("https://cdn/x.png"));
    }

    #[test]
    fn test_name_required() {
        assert!(form(&[("slug", "x")]).to_input(None).is_err());
        assert!(form(&[("name", "!!!")]).to_input(None).is_err());
    }
}
