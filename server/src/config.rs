use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

pub struct Config {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub is_production: bool,
}

impl Config {
    pub fn new() -> Self {
        dotenv().ok();
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".to_string());
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let is_production = env::var("APP_ENV")
            .map(|val| val == "production")
            .unwrap_or(false);
        Self {
            bind_addr,
            data_dir,
            is_production,
        }
    }
}
