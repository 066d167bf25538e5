//! Order reads and the print PDF workflow.

use chrono::Utc;
use printshop_core::canonical_json::parse_stored;
use printshop_core::error::CoreError;
use printshop_core::naming;
use printshop_core::storage::StorageLayout;
use printshop_core::types::{Cents, DbId, Timestamp};
use printshop_db::models::order::{Address, Order, OrderItemDetail};
use printshop_db::repositories::OrderRepo;
use printshop_db::DbPool;
use printshop_print::geometry::MugDimensions;
use printshop_print::{render_order_pdf, DispatchedPdf, PdfDispatcher, PrintItem, PrintJob};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::PipelineError;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub id: Uuid,
    pub article_id: DbId,
    pub article_name: String,
    pub article_type: String,
    pub variant_id: DbId,
    pub variant_name: String,
    pub quantity: i32,
    pub price_per_item: Cents,
    pub total_price: Cents,
    pub prompt_id: Option<DbId>,
    pub generated_image_id: Option<DbId>,
    pub generated_image_url: Option<String>,
    pub custom_data: Value,
    pub position: i32,
}

impl From<&OrderItemDetail> for OrderItemView {
    fn from(detail: &OrderItemDetail) -> Self {
        let item = &detail.item;
        Self {
            id: item.id,
            article_id: item.article_id,
            article_name: detail.article_name.clone(),
            article_type: detail.article_type.clone(),
            variant_id: item.variant_id,
            variant_name: detail.variant_name.clone(),
            quantity: item.quantity,
            price_per_item: item.price_per_item,
            total_price: item.total_price,
            prompt_id: item.prompt_id,
            generated_image_id: item.generated_image_id,
            generated_image_url: detail
                .generated_image_filename
                .as_deref()
                .map(naming::user_image_url),
            custom_data: parse_stored(&item.custom_data),
            position: item.position,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: DbId,
    pub cart_id: DbId,
    pub status: String,
    pub customer_email: String,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub notes: Option<String>,
    pub subtotal: Cents,
    pub tax_amount: Cents,
    pub shipping_amount: Cents,
    pub total_amount: Cents,
    pub items: Vec<OrderItemView>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OrderView {
    fn build(order: Order, details: &[OrderItemDetail]) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            user_id: order.user_id,
            cart_id: order.cart_id,
            status: order.status,
            customer_email: order.customer_email,
            customer_first_name: order.customer_first_name,
            customer_last_name: order.customer_last_name,
            customer_phone: order.customer_phone,
            shipping_address: order.shipping_address.0,
            billing_address: order.billing_address.0,
            notes: order.notes,
            subtotal: order.subtotal,
            tax_amount: order.tax_amount,
            shipping_amount: order.shipping_amount,
            total_amount: order.total_amount,
            items: details.iter().map(OrderItemView::from).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// `?page=&size=` with a 0-based page.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageParams {
    /// `(page, size)` with defaults applied and the size clamped.
    pub fn resolve(self) -> (i64, i64) {
        let page = self.page.unwrap_or(0).max(0);
        let size = self
            .size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, size)
    }

    /// Row offset of the resolved page. Pages past `i64::MAX` rows are invalid.
    pub fn offset(page: i64, size: i64) -> Result<i64, PipelineError> {
        page.checked_mul(size)
            .ok_or_else(|| PipelineError::validation(format!("Page {page} is out of range")))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T: Serialize> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

fn total_pages(total: i64, size: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + size - 1) / size
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// One of the caller's orders with its items.
pub async fn get_order(
    pool: &DbPool,
    user_id: DbId,
    order_id: Uuid,
) -> Result<OrderView, PipelineError> {
    let order = OrderRepo::find_for_user(pool, order_id, user_id)
        .await?
        .ok_or(PipelineError::OrderNotFound(order_id))?;
    let details = OrderRepo::item_details(pool, order.id).await?;
    Ok(OrderView::build(order, &details))
}

/// The caller's orders, newest first.
pub async fn list_orders(
    pool: &DbPool,
    user_id: DbId,
    params: PageParams,
) -> Result<Page<OrderView>, PipelineError> {
    let (page, size) = params.resolve();
    let offset = PageParams::offset(page, size)?;
    let total = OrderRepo::count_for_user(pool, user_id).await?;
    let orders = OrderRepo::list_for_user(pool, user_id, size, offset).await?;

    let mut content = Vec::with_capacity(orders.len());
    for order in orders {
        let details = OrderRepo::item_details(pool, order.id).await?;
        content.push(OrderView::build(order, &details));
    }

    Ok(Page {
        content,
        page,
        size,
        total_elements: total,
        total_pages: total_pages(total, size),
    })
}

// ---------------------------------------------------------------------------
// Print PDF
// ---------------------------------------------------------------------------

/// Describe an order for the renderer. Artwork is referenced by path under
/// the owning user's private directory.
pub fn print_job(
    layout: &StorageLayout,
    order: &Order,
    details: &[OrderItemDetail],
    qr_pixels: u32,
) -> PrintJob {
    let items = details
        .iter()
        .map(|detail| PrintItem {
            quantity: u32::try_from(detail.item.quantity).unwrap_or(0),
            inline_image: None,
            image_path: detail.generated_image_filename.as_deref().and_then(|name| {
                let owner = detail.generated_image_user_id.unwrap_or(order.user_id);
                layout.user_file(owner, name).ok()
            }),
            dimensions: MugDimensions {
                print_template_width_mm: detail.print_template_width_mm,
                print_template_height_mm: detail.print_template_height_mm,
                document_format_width_mm: detail.document_format_width_mm,
                document_format_height_mm: detail.document_format_height_mm,
                document_format_margin_bottom_mm: detail.document_format_margin_bottom_mm,
            },
            supplier_article_name: detail.supplier_article_name.clone(),
            supplier_article_number: detail.supplier_article_number.clone(),
            variant_name: Some(detail.variant_name.clone()),
        })
        .collect();

    PrintJob {
        order_id: order.id,
        order_number: Some(order.order_number.clone()).filter(|n| !n.is_empty()),
        items,
        qr_pixels,
    }
}

/// Render the order's print PDF and push it to the print shop.
///
/// The bytes are returned only after the upload has finished.
pub async fn render_and_dispatch(
    pool: &DbPool,
    layout: &StorageLayout,
    dispatcher: &PdfDispatcher,
    user_id: DbId,
    order_id: Uuid,
    qr_pixels: u32,
) -> Result<DispatchedPdf, PipelineError> {
    let order = OrderRepo::find_for_user(pool, order_id, user_id)
        .await?
        .ok_or(PipelineError::OrderNotFound(order_id))?;
    let details = OrderRepo::item_details(pool, order.id).await?;

    let job = print_job(layout, &order, &details, qr_pixels);
    let pdf = tokio::task::spawn_blocking(move || render_order_pdf(&job))
        .await
        .map_err(|e| CoreError::Internal(format!("PDF render task failed: {e}")))??;

    let dispatched = dispatcher.dispatch(&order.order_number, pdf, Utc::now()).await?;
    tracing::info!(
        user_id,
        order_id = %order.id,
        remote_path = %dispatched.remote_path,
        bytes = dispatched.bytes.len(),
        "Order PDF uploaded",
    );
    Ok(dispatched)
}
