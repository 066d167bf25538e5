//! Names an order PDF and pushes it to the print shop before it is released
//! to the client.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use printshop_core::naming;

use crate::sftp::{FtpError, PdfUploader};

/// A PDF that reached the remote drop.
#[derive(Debug, Clone)]
pub struct DispatchedPdf {
    pub filename: String,
    pub remote_path: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct PdfDispatcher {
    uploader: Arc<dyn PdfUploader>,
}

impl PdfDispatcher {
    pub fn new(uploader: Arc<dyn PdfUploader>) -> Self {
        Self { uploader }
    }

    /// Upload `pdf` as `orders/order_<number>_<timestamp>.pdf`.
    ///
    /// The bytes are handed back only after the upload has completed.
    pub async fn dispatch(
        &self,
        order_number: &str,
        pdf: Vec<u8>,
        at: DateTime<Utc>,
    ) -> Result<DispatchedPdf, FtpError> {
        let filename = naming::order_pdf_filename(order_number, at);
        let remote_path = naming::remote_pdf_path(&filename);

        self.uploader.upload(&remote_path, pdf.clone()).await?;

        Ok(DispatchedPdf {
            filename,
            remote_path,
            bytes: pdf,
        })
    }
}
