//! Back-office product management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use vitrine_api::{Api, ProductInput, VariantInput};
use vitrine_core::validation::{self, ValidationError};
use vitrine_core::{CategoryId, Money, Product, ProductId, ProductQuery, Variant};

use super::upload::MultipartForm;
use crate::error::{Result, form_error};
use crate::middleware::RequireAdmin;
use crate::middleware::session_store::set_flash;
use crate::models::{Flash, Layout};
use crate::routes::views::{SelectOption, non_blank};
use crate::state::AppState;

const PAGE_SIZE: u32 = 20;

// =============================================================================
// Variant lines
// =============================================================================

/// A `size:color:stock` line that could not be read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Variação inválida na linha {line}: use tamanho:cor:estoque.")]
pub struct VariantLineError {
    pub line: usize,
}

/// Parse one variant per line: `size:color:stock`, `size:stock` or `size`.
///
/// Blank lines are skipped; a missing stock means zero.
///
/// # Errors
///
/// Returns the first line that has no size, a non-numeric or negative
/// stock, or too many fields.
pub fn parse_variants(text: &str) -> std::result::Result<Vec<VariantInput>, VariantLineError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let error = VariantLineError { line: i + 1 };
            let parts: Vec<&str> = line.split(':').map(str::trim).collect();
            let (size, color, stock) = match parts.as_slice() {
                [size] => (*size, "", "0"),
                [size, stock] => (*size, "", *stock),
                [size, color, stock] => (*size, *color, *stock),
                _ => return Err(error),
            };
            if size.is_empty() {
                return Err(error);
            }
            let stock = if stock.is_empty() {
                0
            } else {
                stock.parse::<i32>().map_err(|_| error.clone())?
            };
            if stock < 0 {
                return Err(error);
            }
            Ok(VariantInput {
                size: size.to_string(),
                color: (!color.is_empty()).then(|| color.to_string()),
                stock,
            })
        })
        .collect()
}

/// Inverse of [`parse_variants`], for editing.
#[must_use]
pub fn format_variants(variants: &[Variant]) -> String {
    variants
        .iter()
        .map(|v| {
            format!(
                "{}:{}:{}",
                v.size,
                v.color.as_deref().unwrap_or_default(),
                v.stock
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Form
// =============================================================================

/// Product form values, as typed.
#[derive(Debug, Clone, Default)]
pub struct ProductFormView {
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub category_id: String,
    pub is_active: bool,
    pub variants: String,
}

impl ProductFormView {
    fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            name: form.text("name").to_string(),
            description: form.text("description").to_string(),
            price: form.text("price").to_string(),
            image: form.text(super::upload::IMAGE_URL_FIELD).to_string(),
            category_id: form.text("category_id").to_string(),
            is_active: form.checked("is_active"),
            variants: form.text("variants").to_string(),
        }
    }

    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_form_value(),
            image: product.image.clone().unwrap_or_default(),
            category_id: product
                .category_id
                .as_ref()
                .or(product.category.as_ref().map(|c| &c.id))
                .map(ToString::to_string)
                .unwrap_or_default(),
            is_active: product.is_active,
            variants: format_variants(&product.variants),
        }
    }

    /// Local checks. The image is resolved separately.
    fn to_input(&self, image: Option<String>) -> std::result::Result<ProductInput, String> {
        validation::require_name(&self.name).map_err(|e| e.to_string())?;
        let price = self
            .price
            .parse::<Money>()
            .ok()
            .filter(|p| *p >= Money::ZERO)
            .ok_or_else(|| ValidationError::InvalidPrice.to_string())?;
        let variants = parse_variants(&self.variants).map_err(|e| e.to_string())?;

        Ok(ProductInput {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price,
            image,
            category_id: non_blank(Some(self.category_id.as_str())).map(CategoryId::from),
            is_active: self.is_active,
            variants,
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub form: ProductFormView,
    pub categories: Vec<SelectOption>,
    pub error: Option<String>,
}

async fn render_form(
    api: &Api,
    layout: Layout,
    id: Option<&str>,
    form: ProductFormView,
    error: Option<String>,
) -> Result<Response> {
    let categories = api
        .categories()
        .await?
        .iter()
        .map(|c| {
            let id = c.id.to_string();
            let selected = id == form.category_id;
            SelectOption::new(id, c.name.clone(), selected)
        })
        .collect();

    Ok(ProductFormTemplate {
        layout,
        title: if id.is_some() { "Editar produto" } else { "Novo produto" },
        action: id.map_or_else(
            || "/admin/products".to_string(),
            |id| format!("/admin/products/{}", urlencoding::encode(id)),
        ),
        form,
        categories,
        error,
    }
    .into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// Product row in the list.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub price: String,
    pub category: String,
    pub stock: i64,
    pub is_active: bool,
    pub image: Option<String>,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.display(),
            category: product
                .category
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            stock: product.total_stock(),
            is_active: product.is_active,
            image: product.image.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct ProductsTemplate {
    pub layout: Layout,
    pub products: Vec<ProductRow>,
    pub search: String,
    pub page: u32,
    pub total_pages: u32,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

fn list_href(search: &str, page: u32) -> String {
    if search.is_empty() {
        format!("/admin/products?page={page}")
    } else {
        format!(
            "/admin/products?search={}&page={page}",
            urlencoding::encode(search)
        )
    }
}

/// Every product, inactive ones included.
#[instrument(skip(admin, state, layout), fields(admin_id = %admin.user.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    layout: Layout,
) -> Result<ProductsTemplate> {
    let search = non_blank(query.search.as_deref()).unwrap_or_default();
    let product_query = ProductQuery {
        search: non_blank(Some(search.as_str())),
        limit: Some(PAGE_SIZE),
        page: query.page,
        ..ProductQuery::default()
    }
    .normalized();

    let page = state.api_as(&admin).admin_products(&product_query).await?;
    let current = page.pagination.page.max(1);
    let total_pages = page.pagination.total_pages.max(1);

    Ok(ProductsTemplate {
        layout,
        products: page.products.iter().map(ProductRow::from).collect(),
        prev_href: (current > 1).then(|| list_href(&search, current - 1)),
        next_href: (current < total_pages).then(|| list_href(&search, current + 1)),
        search,
        page: current,
        total_pages,
    })
}

/// Empty product form.
#[instrument(skip_all, fields(admin_id = %admin.user.id))]
pub async fn new(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    layout: Layout,
) -> Result<Response> {
    let form = ProductFormView {
        is_active: true,
        ..ProductFormView::default()
    };
    render_form(&state.api_as(&admin), layout, None, form, None).await
}

/// Create a product.
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

/// Product form filled with the current values.
#[instrument(skip(admin, state, layout), fields(admin_id = %admin.user.id))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    layout: Layout,
) -> Result<Response> {
    let api = state.api_as(&admin);
    let product = api.product(&ProductId::from(id.as_str())).await?;
    render_form(&api, layout, Some(&id), ProductFormView::from_product(&product), None).await
}

/// Save changes to a product.
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
    let view = ProductFormView::from_multipart(&multipart);

    // Validate before uploading so a bad form never sends a file.
    if let Err(error) = view.to_input(None) {
        return render_form(api, layout, id, view, Some(error)).await;
    }

    let image = match multipart.resolve_image(api).await {
        Ok(image) => image,
        Err(e) => return render_form(api, layout, id, view, Some(form_error(e)?)).await,
    };
    let input = match view.to_input(image) {
        Ok(input) => input,
        Err(error) => return render_form(api, layout, id, view, Some(error)).await,
    };

    let result = match id {
        Some(id) => api.update_product(&ProductId::from(id), &input).await,
        None => api.create_product(&input).await,
    };
    match result {
        Ok(()) => {
            let message = if id.is_some() { "Produto atualizado." } else { "Produto criado." };
            set_flash(session, Flash::success(message)).await?;
            Ok(Redirect::to("/admin/products").into_response())
        }
        Err(e) => {
            let error = Some(form_error(e)?);
            let view = ProductFormView {
                image: input.image.unwrap_or_default(),
                ..view
            };
            render_form(api, layout, id, view, error).await
        }
    }
}

/// Delete a product.
#[instrument(skip(admin, state, session), fields(admin_id = %admin.user.id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    match state
        .api_as(&admin)
        .delete_product(&ProductId::from(id.as_str()))
        .await
    {
        Ok(()) => set_flash(&session, Flash::info("Produto excluído.")).await?,
        Err(e) => set_flash(&session, Flash::error(form_error(e)?)).await?,
    }
    Ok(Redirect::to("/admin/products"))
}
