use std::env;

/// Runtime configuration for the API server
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum upload size in bytes (default: 256 MB)
    pub max_upload_size: usize,

    /// JWT signing secret
    pub jwt_secret: String,

    /// Lifetime of presigned download URLs in seconds (default: 1 hour)
    pub presign_expiry_secs: u64,

    /// Allowed CORS origins (comma separated)
    pub allowed_origins: Vec<String>,

    /// Username of the seeded admin account
    pub admin_username: String,

    /// Password of the seeded admin account
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 256 * 1024 * 1024,
            jwt_secret: "secret".to_string(),
            presign_expiry_secs: 3600,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            presign_expiry_secs: env::var("PRESIGN_EXPIRY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.presign_expiry_secs),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),

            admin_username: env::var("ADMIN_USERNAME").unwrap_or(default.admin_username),

            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(default.admin_password),
        }
    }

    /// Config for development and tests (small limits, fixed secret)
    pub fn development() -> Self {
        Self {
            max_upload_size: 32 * 1024 * 1024,
            ..Self::default()
        }
    }
}
