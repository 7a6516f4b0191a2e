//! Category management route handlers.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use yakimoto_core::CategoryId;
use yakimoto_core::catalog::{self, Category};
use yakimoto_core::images::ImageUrls;

use super::failure_message;
use crate::backend::CategorySubmission;
use crate::error::Result;
use crate::filters;
use crate::flash::{self, Flash};
use crate::layout::Layout;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::uploads::MultipartForm;

/// Category row for templates.
#[derive(Debug, Clone)]
pub struct CategoryRowView {
    pub id: CategoryId,
    pub name: String,
    pub display_name: String,
    pub position: usize,
    pub image_url: Option<String>,
}

impl CategoryRowView {
    fn new(category: &Category, position: usize, images: &ImageUrls) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            display_name: category.display_name(),
            position,
            image_url: category
                .image_filename
                .as_deref()
                .filter(|f| !f.is_empty())
                .map(|f| images.thumbnail(f)),
        }
    }
}

/// Category list page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub layout: Layout,
    pub categories: Vec<CategoryRowView>,
}

/// Delete form data; the backend deletes categories by name.
#[derive(Debug, Deserialize)]
pub struct DeleteCategoryForm {
    pub name: String,
}

/// Read a category form: a required name and an optional image.
fn parse_category(mut form: MultipartForm) -> std::result::Result<CategorySubmission, String> {
    let name = form
        .text("name")
        .ok_or_else(|| "Kategorinamn måste anges.".to_string())?
        .to_string();
    let image = form.take_files("image").into_iter().next();
    Ok(CategorySubmission { name, image })
}

/// Read the reorder form: one `order_<id>` field per category.
///
/// Blank or unreadable positions keep the category where it was, after the
/// ones that were given a position.
fn parse_order(
    fields: &BTreeMap<String, String>,
    current: &[Category],
) -> BTreeMap<CategoryId, u32> {
    let mut ranked: Vec<(u32, usize, CategoryId)> = current
        .iter()
        .enumerate()
        .map(|(index, category)| {
            let position = fields
                .get(&format!("order_{}", category.id))
                .and_then(|raw| raw.trim().parse::<u32>().ok())
                .unwrap_or(u32::MAX);
            (position, index, category.id)
        })
        .collect();
    ranked.sort_unstable();

    ranked
        .into_iter()
        .zip(0u32..)
        .map(|((_, _, id), order)| (id, order))
        .collect()
}

/// List categories in display order.
#[instrument(skip(state, session, _admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<impl IntoResponse> {
    let mut categories = state.backend().categories().await?;
    catalog::sort_for_display(&mut categories);

    Ok(CategoriesTemplate {
        layout: Layout::build(&session, "Kategorier", "/categories").await,
        categories: categories
            .iter()
            .enumerate()
            .map(|(position, c)| CategoryRowView::new(c, position + 1, state.images()))
            .collect(),
    })
}

/// Create a category.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    multipart: Multipart,
) -> Result<Redirect> {
    let form = MultipartForm::read(multipart).await?;
    let message = match parse_category(form) {
        Err(message) => Flash::error(message),
        Ok(category) => {
            let name = category.name.clone();
            match state.backend().create_category(&admin.token, category).await {
                Ok(()) => {
                    tracing::info!(category = %name, "Category created");
                    Flash::success(format!("Kategorin {name} skapades."))
                }
                Err(e) => Flash::error(failure_message(e)?),
            }
        }
    };
    flash::push(&session, message).await?;
    Ok(Redirect::to("/categories"))
}

/// Rename a category or replace its image.
#[instrument(skip(state, session, admin, multipart))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
    multipart: Multipart,
) -> Result<Redirect> {
    let form = MultipartForm::read(multipart).await?;
    let message = match parse_category(form) {
        Err(message) => Flash::error(message),
        Ok(category) => match state.backend().update_category(&admin.token, id, category).await {
            Ok(()) => Flash::success("Kategorin sparades."),
            Err(e) => Flash::error(failure_message(e)?),
        },
    };
    flash::push(&session, message).await?;
    Ok(Redirect::to("/categories"))
}

/// Delete a category. Products keep existing; they lose the link.
#[instrument(skip(state, session, admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<CategoryId>,
    Form(form): Form<DeleteCategoryForm>,
) -> Result<Redirect> {
    let message = match state.backend().delete_category(&admin.token, &form.name).await {
        Ok(()) => {
            tracing::info!(category_id = %id, "Category deleted");
            Flash::success(format!("Kategorin {} togs bort.", form.name))
        }
        Err(e) => Flash::error(failure_message(e)?),
    };
    flash::push(&session, message).await?;
    Ok(Redirect::to("/categories"))
}

/// Store a new display order.
#[instrument(skip(state, session, admin, fields))]
pub async fn reorder(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(fields): Form<BTreeMap<String, String>>,
) -> Result<Redirect> {
    let mut current = state.backend().categories().await?;
    catalog::sort_for_display(&mut current);
    let order = parse_order(&fields, &current);

    let message = match state.backend().reorder_categories(&admin.token, &order).await {
        Ok(()) => Flash::success("Ordningen sparades."),
        Err(e) => Flash::error(failure_message(e)?),
    };
    flash::push(&session, message).await?;
    Ok(Redirect::to("/categories"))
}
