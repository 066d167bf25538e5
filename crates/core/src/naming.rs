//! Filename and path conventions for artwork and order documents.
//!
//! - Uploaded source: `{upload_uuid}_original.png`
//! - Generated candidate: `{upload_uuid}_generated_{k}.png` (`k` starts at 1)
//! - Order PDF: `order_{order_number}_{YYYYMMDD_HHMMSS}.pdf`
//! - SFTP destination: `orders/{pdf_filename}`

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// URL prefix under which a user's private images are served.
pub const USER_IMAGE_URL_PREFIX: &str = "/api/user/images/";

/// Remote directory receiving order PDFs.
pub const REMOTE_ORDERS_DIR: &str = "orders";

/// Filename of the canonicalized upload.
pub fn original_filename(upload_uuid: Uuid) -> String {
    format!("{upload_uuid}_original.png")
}

/// Filename of the `index`-th generated candidate (1-based).
pub fn generated_filename(upload_uuid: Uuid, index: usize) -> String {
    format!("{upload_uuid}_generated_{index}.png")
}

/// Public URL of a stored user image.
pub fn user_image_url(filename: &str) -> String {
    format!("{USER_IMAGE_URL_PREFIX}{filename}")
}

/// Filename of the print PDF for an order.
pub fn order_pdf_filename(order_number: &str, at: DateTime<Utc>) -> String {
    format!("order_{order_number}_{}.pdf", at.format("%Y%m%d_%H%M%S"))
}

/// Remote SFTP path of an order PDF.
pub fn remote_pdf_path(filename: &str) -> String {
    format!("{REMOTE_ORDERS_DIR}/{filename}")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn artwork_names() {
        let id = Uuid::parse_str("3f2504e0-4f89-11d3-9a0c-0305e82c3301").unwrap();
        assert_eq!(
            original_filename(id),
            "3f2504e0-4f89-11d3-9a0c-0305e82c3301_original.png"
        );
        assert_eq!(
            generated_filename(id, 3),
            "3f2504e0-4f89-11d3-9a0c-0305e82c3301_generated_3.png"
        );
        assert_eq!(user_image_url("a.png"), "/api/user/images/a.png");
    }

    #[test]
    fn pdf_names_are_bit_exact() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let name = order_pdf_filename("ORD-000042", at);
        assert_eq!(name, "order_ORD-000042_20240309_070501.pdf");
        assert_eq!(remote_pdf_path(&name), "orders/order_ORD-000042_20240309_070501.pdf");
    }
}
