use std::path::PathBuf;
use std::time::Duration;

use printshop_ai::gemini::GeminiConfig;
use printshop_ai::openai::OpenAiImageConfig;
use printshop_ai::provider::Provider;
use printshop_ai::registry::ProviderSettings;

use crate::auth::jwt::JwtConfig;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_QR_PIXELS: u32 = 100;

/// Server configuration loaded from environment variables.
///
/// Required values panic at startup when missing; everything else has a
/// default suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0:8080`).
    pub addr: String,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Root of the on-disk storage layout.
    pub storage_root: PathBuf,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ALLOWED_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Outer HTTP request timeout in seconds (default: `180`).
    pub request_timeout_secs: u64,
    /// Multipart body limit in bytes (default: 20 MiB).
    pub max_upload_bytes: usize,
    /// QR raster size in the order PDF (default: `100`).
    pub qr_pixels: u32,
    /// Built SPA to serve as the fallback route, if any.
    pub frontend_dist: Option<PathBuf>,
    pub providers: ProviderSettings,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                          |
    /// |---------------------------|----------------------------------|
    /// | `ADDR`                    | `0.0.0.0:8080`                   |
    /// | `DATABASE_URL`            | **required**, `postgres://` only |
    /// | `STORAGE_ROOT`            | **required**                     |
    /// | `CORS_ALLOWED_ORIGINS`    | `http://localhost:5173`          |
    /// | `REQUEST_TIMEOUT_SECS`    | `180`                            |
    /// | `MAX_UPLOAD_BYTES`        | `20971520`                       |
    /// | `ORDER_PDF_QR_PIXELS`     | `100`                            |
    /// | `FRONTEND_DIST`           | unset                            |
    ///
    /// Provider variables are documented on [`provider_settings_from_env`].
    /// SFTP variables are read per upload by the print crate.
    pub fn from_env() -> Self {
        let addr = std::env::var("ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in the environment");
        check_database_url(&database_url).unwrap_or_else(|msg| panic!("{msg}"));

        let storage_root: PathBuf = std::env::var("STORAGE_ROOT")
            .expect("STORAGE_ROOT must be set in the environment")
            .into();

        let cors_origins = parse_origins(
            &std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "180".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let qr_pixels: u32 = std::env::var("ORDER_PDF_QR_PIXELS")
            .unwrap_or_else(|_| DEFAULT_QR_PIXELS.to_string())
            .parse()
            .expect("ORDER_PDF_QR_PIXELS must be a valid u32");

        let frontend_dist = std::env::var("FRONTEND_DIST")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            addr,
            database_url,
            storage_root,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            qr_pixels,
            frontend_dist,
            providers: provider_settings_from_env(),
            jwt: JwtConfig::from_env(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Image-provider settings.
///
/// | Env Var                    | Default                          |
/// |----------------------------|----------------------------------|
/// | `TEST_MODE`                | `false`                          |
/// | `IMAGE_PROVIDER`           | `gemini`                         |
/// | `GOOGLE_API_KEY`           | unset (Gemini disabled)          |
/// | `GEMINI_IMAGE_MODEL`       | `gemini-2.5-flash-image-preview` |
/// | `GEMINI_MAX_OUTPUT_TOKENS` | unset                            |
/// | `GEMINI_TEMPERATURE`       | unset                            |
/// | `OPENAI_API_KEY`           | unset (OpenAI disabled)          |
/// | `OPENAI_IMAGE_MODEL`       | `gpt-image-1`                    |
pub fn provider_settings_from_env() -> ProviderSettings {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

    let default_provider = match var("IMAGE_PROVIDER") {
        Some(name) => Provider::parse(&name)
            .unwrap_or_else(|e| panic!("IMAGE_PROVIDER is invalid: {e}")),
        None => Provider::Gemini,
    };

    let gemini = var("GOOGLE_API_KEY").map(|key| {
        let mut config = GeminiConfig::new(key);
        if let Some(model) = var("GEMINI_IMAGE_MODEL") {
            config.model = model;
        }
        config.max_output_tokens = var("GEMINI_MAX_OUTPUT_TOKENS").map(|v| {
            v.parse()
                .expect("GEMINI_MAX_OUTPUT_TOKENS must be a valid u32")
        });
        config.temperature = var("GEMINI_TEMPERATURE")
            .map(|v| v.parse().expect("GEMINI_TEMPERATURE must be a valid f32"));
        config
    });

    let openai = var("OPENAI_API_KEY").map(|key| {
        let mut config = OpenAiImageConfig::new(key);
        if let Some(model) = var("OPENAI_IMAGE_MODEL") {
            config.model = model;
        }
        config
    });

    ProviderSettings {
        test_mode: var("TEST_MODE").is_some_and(|v| is_truthy(&v)),
        default_provider,
        gemini,
        openai,
    }
}

/// Only PostgreSQL is supported.
fn check_database_url(url: &str) -> Result<(), String> {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Ok(())
    } else if url.starts_with("sqlite:") {
        Err("DATABASE_URL: sqlite is not supported, use a postgres:// URL".into())
    } else {
        Err(format!("DATABASE_URL: unsupported scheme in '{url}'"))
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
