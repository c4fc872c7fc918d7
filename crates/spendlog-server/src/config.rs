use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub sqlite_path: String,
    pub uploads_dir: String,
    pub public_dir: String,
    pub cors_origin: String,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a valid port number"),
            sqlite_path: env::var("SQLITE_PATH")
                .unwrap_or_else(|_| "./data/spendlog.db".to_string()),
            uploads_dir: env::var("UPLOADS_DIR")
                .unwrap_or_else(|_| "./data/uploads".to_string()),
            public_dir: env::var("PUBLIC_DIR")
                .unwrap_or_else(|_| "./public".to_string()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            secure_cookies: env::var("SECURE_COOKIES")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        }
    }
}
