//! Print-ready PDF rendering and SFTP delivery of order documents.

pub mod dispatcher;
pub mod geometry;
pub mod pdf;
pub mod sftp;

pub use dispatcher::{DispatchedPdf, PdfDispatcher};
pub use pdf::{render_order_pdf, PdfError, PrintItem, PrintJob};
pub use sftp::{FtpError, PdfUploader, SftpConfig, SftpUploader};
