//! Product management route handlers.
//!
//! Products are created and edited through multipart forms (they carry
//! images). Validation happens here before the backend is called; a rejected
//! form is rendered again with the submitted values and a message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use yakimoto_core::catalog::{Category, Product};
use yakimoto_core::images::ImageUrls;
use yakimoto_core::inventory::{InventoryError, Location, SizeInventory, SizeStock};
use yakimoto_core::pricing::{Discount, PricingError};
use yakimoto_core::{CategoryId, Price, ProductId};

use super::failure_message;
use crate::backend::{InventoryMove, ProductSubmission};
use crate::error::Result;
use crate::filters;
use crate::flash::{self, Flash};
use crate::layout::Layout;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::uploads::MultipartForm;

// =============================================================================
// View Types
// =============================================================================

/// Stock of one size for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeRowView {
    pub size: String,
    pub online: u32,
    pub club: u32,
    pub total: u32,
}

/// Product row on the list page.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    /// Sale price with its percent, e.g. `399 kr (-20%)`
    pub sale: Option<String>,
    pub categories: String,
    pub sizes: Vec<SizeRowView>,
    pub total: u32,
    pub stock_label: &'static str,
    pub stock_class: &'static str,
    pub image_url: Option<String>,
}

impl ProductRowView {
    #[must_use]
    pub fn new(product: &Product, images: &ImageUrls) -> Self {
        let sale = product.effective_sale_price().map(|sale| {
            match product.discount_label() {
                Some(pct) => format!("{} (-{pct}%)", sale.display()),
                None => sale.display(),
            }
        });
        let categories = if product.categories.is_empty() {
            product.category.clone().unwrap_or_default()
        } else {
            product
                .categories
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let status = product.stock_status();

        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price.display(),
            sale,
            categories,
            sizes: size_rows(&product.sizes),
            total: product.sizes.total(),
            stock_label: status.label(),
            stock_class: status.css_class(),
            image_url: product.primary_image().map(|f| images.thumbnail(f)),
        }
    }

    /// Sizes that have stock somewhere, for the move form.
    #[must_use]
    pub fn movable_sizes(&self) -> Vec<&SizeRowView> {
        self.sizes.iter().filter(|s| s.total > 0).collect()
    }
}

fn size_rows(sizes: &SizeInventory) -> Vec<SizeRowView> {
    sizes
        .iter()
        .map(|(size, stock)| SizeRowView {
            size: size.to_string(),
            online: stock.online,
            club: stock.club,
            total: stock.total(),
        })
        .collect()
}

/// An editable size row of the product form; values are kept as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeFieldView {
    pub label: String,
    pub online: String,
    pub club: String,
}

/// A category checkbox.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: CategoryId,
    pub name: String,
    pub checked: bool,
}

/// An uploaded image of the product being edited.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub filename: String,
    pub url: String,
    pub is_main: bool,
}

/// Values of the create/edit form.
#[derive(Debug, Clone, Default)]
pub struct ProductFormView {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub price: String,
    pub sale_price: String,
    pub discount_percent: String,
    pub color: String,
    pub gsm: String,
    pub age_group: String,
    pub description: String,
    pub sizes: Vec<SizeFieldView>,
    pub categories: Vec<CategoryOption>,
    pub images: Vec<ImageView>,
}

impl ProductFormView {
    /// Empty form with one blank size row.
    #[must_use]
    pub fn empty(categories: &[Category]) -> Self {
        Self {
            sizes: vec![SizeFieldView::default()],
            categories: category_options(categories, |_| false),
            ..Self::default()
        }
    }

    /// Form filled from a stored product.
    #[must_use]
    pub fn from_product(product: &Product, categories: &[Category], images: &ImageUrls) -> Self {
        let (sale_price, discount_percent) = product.discount().form_fields();
        let main = product.primary_image();

        let mut sizes: Vec<SizeFieldView> = product
            .sizes
            .iter()
            .map(|(size, stock)| SizeFieldView {
                label: size.to_string(),
                online: stock.online.to_string(),
                club: stock.club.to_string(),
            })
            .collect();
        sizes.push(SizeFieldView::default());

        Self {
            product_id: Some(product.id),
            name: product.name.clone(),
            price: product.price.to_plain_string(),
            sale_price: sale_price.unwrap_or_default(),
            discount_percent: discount_percent.unwrap_or_default(),
            color: product.color.clone().unwrap_or_default(),
            gsm: product.gsm.clone().unwrap_or_default(),
            age_group: product.age_group.clone().unwrap_or_default(),
            description: product.description.clone().unwrap_or_default(),
            sizes,
            categories: category_options(categories, |category| {
                product.categories.iter().any(|c| c.id == category.id)
                    || (product.categories.is_empty()
                        && product
                            .category
                            .as_deref()
                            .is_some_and(|c| c.eq_ignore_ascii_case(&category.name)))
            }),
            images: product
                .images
                .iter()
                .map(|filename| ImageView {
                    filename: filename.clone(),
                    url: images.thumbnail(filename),
                    is_main: main == Some(filename.as_str()),
                })
                .collect(),
        }
    }

    /// Form showing what was submitted, so a rejected form keeps its input.
    #[must_use]
    pub fn from_submitted(form: &MultipartForm, categories: &[Category]) -> Self {
        let text = |name: &str| form.text(name).unwrap_or_default().to_string();
        let checked = selected_category_ids(form);

        let mut sizes: Vec<SizeFieldView> = size_fields(form)
            .filter(|row| !row.label.trim().is_empty())
            .collect();
        sizes.push(SizeFieldView::default());

        Self {
            product_id: None,
            name: text("name"),
            price: text("price"),
            sale_price: text("sale_price"),
            discount_percent: text("discount_percent"),
            color: text("color"),
            gsm: text("gsm"),
            age_group: text("age_group"),
            description: text("description"),
            sizes,
            categories: category_options(categories, |c| checked.contains(&c.id)),
            images: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_edit(&self) -> bool {
        self.product_id.is_some()
    }

    /// Where the form posts.
    #[must_use]
    pub fn action(&self) -> String {
        self.product_id
            .map_or_else(|| "/products".to_string(), |id| format!("/products/{id}"))
    }
}

fn category_options(
    categories: &[Category],
    checked: impl Fn(&Category) -> bool,
) -> Vec<CategoryOption> {
    categories
        .iter()
        .map(|category| CategoryOption {
            id: category.id,
            name: category.display_name(),
            checked: checked(category),
        })
        .collect()
}

// =============================================================================
// Form Parsing
// =============================================================================

/// Size rows as submitted: parallel `size_label`, `size_online`, `size_club`.
fn size_fields(form: &MultipartForm) -> impl Iterator<Item = SizeFieldView> + '_ {
    let mut online = form.all("size_online");
    let mut club = form.all("size_club");
    form.all("size_label").map(move |label| SizeFieldView {
        label: label.to_string(),
        online: online.next().unwrap_or_default().to_string(),
        club: club.next().unwrap_or_default().to_string(),
    })
}

fn selected_category_ids(form: &MultipartForm) -> Vec<CategoryId> {
    form.all("category_ids")
        .filter_map(|raw| raw.trim().parse().ok())
        .collect()
}

/// Parse a stock count; blank means zero.
fn parse_count(raw: &str, size: &str) -> std::result::Result<u32, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u32>()
        .map_err(|_| format!("Ogiltigt antal för storlek {size}: {raw}"))
}

/// Parse the size table; rows without a label are ignored.
fn parse_sizes(form: &MultipartForm) -> std::result::Result<SizeInventory, String> {
    let mut sizes = SizeInventory::new();
    for row in size_fields(form) {
        let label = row.label.trim();
        if label.is_empty() {
            continue;
        }
        if sizes.contains(label) {
            return Err(format!("Storleken {label} finns flera gånger."));
        }
        let stock = SizeStock {
            online: parse_count(&row.online, label)?,
            club: parse_count(&row.club, label)?,
        };
        sizes.insert(label, stock);
    }
    Ok(sizes)
}

/// Price in whole kronor; the backend stores integers.
fn parse_price(raw: Option<&str>) -> std::result::Result<Price, String> {
    raw.and_then(|p| p.parse::<i64>().ok())
        .filter(|p| *p > 0)
        .map(Price::from_kronor)
        .ok_or_else(|| "Pris måste vara ett positivt heltal i kronor.".to_string())
}

fn pricing_message(err: &PricingError) -> String {
    match err {
        PricingError::InvalidNumber { field, value } => {
            let field = if *field == "discount_percent" {
                "Rabatt (%)"
            } else {
                "Reapris"
            };
            format!("{field} är inte ett tal: {value}")
        }
        PricingError::PercentOutOfRange(_) => "Rabatten måste vara mellan 1 och 99 %.".to_string(),
        PricingError::FractionalSalePrice(_) => {
            "Reapris måste vara ett heltal i kronor.".to_string()
        }
        PricingError::SalePriceNotBelowPrice => "Reapriset måste vara lägre än priset.".to_string(),
        PricingError::NonPositivePrice => "Priset måste vara större än noll.".to_string(),
    }
}

/// Validate a submitted product form.
///
/// Images are taken out of `form`; `require_image` is set on create, where
/// the backend needs at least one.
///
/// # Errors
///
/// Returns the first problem as a message for the admin.
pub fn parse_product(
    form: &mut MultipartForm,
    categories: &[Category],
    require_image: bool,
) -> std::result::Result<ProductSubmission, String> {
    let name = form
        .text("name")
        .ok_or_else(|| "Namn måste anges.".to_string())?
        .to_string();
    let price = parse_price(form.text("price"))?;
    let discount = Discount::from_form(price, form.text("sale_price"), form.text("discount_percent"))
        .map_err(|e| pricing_message(&e))?;
    let sizes = parse_sizes(form)?;

    let category_ids = selected_category_ids(form);
    let category = category_ids.first().and_then(|id| {
        categories
            .iter()
            .find(|c| c.id == *id)
            .map(|c| c.name.clone())
    });

    let optional = |field: &str| form.text(field).map(ToString::to_string);
    let color = optional("color");
    let gsm = optional("gsm");
    let age_group = optional("age_group");
    let description = optional("description");

    let images = form.take_files("images");
    if require_image && images.is_empty() {
        return Err("Ladda upp minst en bild.".to_string());
    }

    Ok(ProductSubmission {
        name,
        price,
        sizes,
        category_ids,
        category,
        color,
        gsm,
        age_group,
        description,
        discount,
        images,
    })
}

// =============================================================================
// Templates
// =============================================================================

/// Product list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductRowView>,
    pub locations: [Location; 2],
}

/// Product create/edit page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub form: ProductFormView,
    pub error: Option<String>,
}

// =============================================================================
// Forms
// =============================================================================

/// Image selection form data.
#[derive(Debug, Deserialize)]
pub struct ImageForm {
    pub filename: String,
}

/// Inventory move form data; the quantity arrives raw so a blank field
/// becomes a message.
#[derive(Debug, Deserialize)]
pub struct MoveInventoryForm {
    pub size: String,
    pub quantity: String,
    pub from_location: Location,
    pub to_location: Location,
}

fn inventory_message(err: &InventoryError) -> String {
    match err {
        InventoryError::SameLocation => "Välj två olika lager.".to_string(),
        InventoryError::NonPositiveQuantity => "Antalet måste vara minst 1.".to_string(),
        InventoryError::SizeNotFound(size) => format!("Storleken {size} finns inte."),
        InventoryError::InsufficientStock {
            location,
            available,
            requested,
        } => format!(
            "Otillräckligt lager i {}: {available} st finns, {requested} st begärda.",
            location.label()
        ),
        InventoryError::UnknownLocation(location) => format!("Okänt lager: {location}"),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List every product with its stock per location.
#[instrument(skip(state, session, _admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<impl IntoResponse> {
    let mut products = state.backend().products().await?;
    products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    Ok(ProductsIndexTemplate {
        layout: Layout::build(&session, "Produkter", "/products").await,
        products: products
            .iter()
            .map(|p| ProductRowView::new(p, state.images()))
            .collect(),
        locations: [Location::Online, Location::Club],
    })
}

/// Show the empty create form.
#[instrument(skip(state, session, _admin))]
pub async fn new_form(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<impl IntoResponse> {
    let categories = state.backend().categories().await?;
    Ok(ProductFormTemplate {
        layout: Layout::build(&session, "Ny produkt", "/products/new").await,
        form: ProductFormView::empty(&categories),
        error: None,
    })
}

/// Create a product.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    multipart: Multipart,
) -> Result<Response> {
    let mut form = MultipartForm::read(multipart).await?;
    let categories = state.backend().categories().await?;

    let result = match parse_product(&mut form, &categories, true) {
        Ok(product) => {
            let name = product.name.clone();
            match state.backend().create_product(&admin.token, product).await {
                Ok(()) => Ok(name),
                Err(e) => Err(failure_message(e)?),
            }
        }
        Err(message) => Err(message),
    };

    match result {
        Ok(name) => {
            tracing::info!(product = %name, "Product created");
            flash::push(&session, Flash::success(format!("{name} skapades."))).await?;
            Ok(Redirect::to("/products").into_response())
        }
        Err(message) => Ok(ProductFormTemplate {
            layout: Layout::build(&session, "Ny produkt", "/products/new").await,
            form: ProductFormView::from_submitted(&form, &categories),
            error: Some(message),
        }
        .into_response()),
    }
}

/// Show the edit form of a product.
#[instrument(skip(state, session, _admin))]
pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(_admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state.backend().product(id).await?;
    let categories = state.backend().categories().await?;
    Ok(ProductFormTemplate {
        layout: Layout::build(&session, format!("Redigera {}", product.name), "/products").await,
        form: ProductFormView::from_product(&product, &categories, state.images()),
        error: None,
    })
}

/// Update a product; uploaded images are added to the existing ones.
#[instrument(skip(state, session, admin, multipart))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let mut form = MultipartForm::read(multipart).await?;
    let categories = state.backend().categories().await?;

    let result = match parse_product(&mut form, &categories, false) {
        Ok(product) => {
            let name = product.name.clone();
            match state.backend().update_product(&admin.token, id, product).await {
                Ok(()) => Ok(name),
                Err(e) => Err(failure_message(e)?),
            }
        }
        Err(message) => Err(message),
    };

    match result {
        Ok(name) => {
            tracing::info!(product_id = %id, "Product updated");
            flash::push(&session, Flash::success(format!("{name} sparades."))).await?;
            Ok(Redirect::to("/products").into_response())
        }
        Err(message) => {
            // Keep the gallery of the stored product next to the submitted values
            let stored = state.backend().product(id).await?;
            let mut view = ProductFormView::from_submitted(&form, &categories);
            view.product_id = Some(id);
            view.images = ProductFormView::from_product(&stored, &categories, state.images()).images;

            Ok(ProductFormTemplate {
                layout: Layout::build(&session, format!("Redigera {}", stored.name), "/products")
                    .await,
                form: view,
                error: Some(message),
            }
            .into_response())
        }
    }
}

/// Delete a product.
#[instrument(skip(state, session, admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    let message = match state.backend().delete_product(&admin.token, id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            Flash::success("Produkten togs bort.")
        }
        Err(e) => Flash::error(failure_message(e)?),
    };
    flash::push(&session, message).await?;
    Ok(Redirect::to("/products"))
}

/// Make an uploaded image the product's main image.
#[instrument(skip(state, session, admin))]
pub async fn set_main_image(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<ImageForm>,
) -> Result<Redirect> {
    let message = match state
        .backend()
        .set_main_image(&admin.token, id, &form.filename)
        .await
    {
        Ok(()) => Flash::success("Huvudbilden uppdaterades."),
        Err(e) => Flash::error(failure_message(e)?),
    };
    flash::push(&session, message).await?;
    Ok(Redirect::to(&format!("/products/{id}/edit")))
}

/// Delete one image of a product.
#[instrument(skip(state, session, admin))]
pub async fn delete_image(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<ImageForm>,
) -> Result<Redirect> {
    let message = match state
        .backend()
        .delete_image(&admin.token, id, &form.filename)
        .await
    {
        Ok(()) => Flash::success("Bilden togs bort."),
        Err(e) => Flash::error(failure_message(e)?),
    };
    flash::push(&session, message).await?;
    Ok(Redirect::to(&format!("/products/{id}/edit")))
}

/// Move stock of one size between the online shop and the club.
///
/// The move is checked against freshly read stock before the backend is
/// asked to perform it.
#[instrument(skip(state, session, admin))]
pub async fn move_inventory(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<MoveInventoryForm>,
) -> Result<Redirect> {
    let message = match plan_move(&state, id, &form).await? {
        Err(message) => Flash::error(message),
        Ok(movement) => match state.backend().move_inventory(&admin.token, id, &movement).await {
            Ok(()) => {
                tracing::info!(
                    product_id = %id,
                    size = %movement.size,
                    quantity = movement.quantity,
                    from = %movement.from,
                    to = %movement.to,
                    "Inventory moved"
                );
                Flash::success(format!(
                    "Flyttade {} st av storlek {} från {} till {}.",
                    movement.quantity,
                    movement.size,
                    movement.from.label(),
                    movement.to.label()
                ))
            }
            Err(e) => Flash::error(failure_message(e)?),
        },
    };
    flash::push(&session, message).await?;
    Ok(Redirect::to("/products"))
}

/// Validate a move request against the product's current stock.
async fn plan_move(
    state: &AppState,
    id: ProductId,
    form: &MoveInventoryForm,
) -> Result<std::result::Result<InventoryMove, String>> {
    let Some(quantity) = form.quantity.trim().parse::<u32>().ok() else {
        return Ok(Err("Ange ett antal att flytta.".to_string()));
    };
    let movement = InventoryMove {
        size: form.size.trim().to_string(),
        quantity,
        from: form.from_location,
        to: form.to_location,
    };
    let product = state.backend().product(id).await?;
    Ok(match movement.apply(&product.sizes) {
        Ok(_) => Ok(movement),
        Err(e) => Err(inventory_message(&e)),
    })
}
