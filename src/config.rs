use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-memory collections flushed to one JSON file each.
    File,
    /// SQLite-backed key-value collections.
    Kv,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "kv" | "sqlite" => Ok(StoreBackend::Kv),
            other => Err(AppError::Config(format!("unknown STORE_BACKEND: {}", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
    pub database_url: String,
    pub uploads_dir: PathBuf,
    pub static_dir: PathBuf,
    pub bcrypt_cost: u32,
    pub admin: Option<(String, String)>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            backend: StoreBackend::File,
            data_dir: PathBuf::from("data"),
            database_url: "sqlite://enrollment.db?mode=rwc".to_string(),
            uploads_dir: PathBuf::from("uploads"),
            static_dir: PathBuf::from("static"),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source; unset keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        let host = match lookup("HOST") {
            Some(h) => h
                .parse::<IpAddr>()
                .map_err(|_| AppError::Config(format!("HOST is not an IP address: {}", h)))?,
            None => cfg.addr.ip(),
        };
        let port = match lookup("PORT") {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("PORT is not a port number: {}", p)))?,
            None => cfg.addr.port(),
        };
        cfg.addr = SocketAddr::new(host, port);

        if let Some(b) = lookup("STORE_BACKEND") {
            cfg.backend = b.parse()?;
        }
        if let Some(d) = lookup("DATA_DIR") {
            cfg.data_dir = PathBuf::from(d);
        }
        if let Some(u) = lookup("DATABASE_URL") {
            cfg.database_url = u;
        }
        if let Some(d) = lookup("UPLOADS_DIR") {
            cfg.uploads_dir = PathBuf::from(d);
        }
        if let Some(d) = lookup("STATIC_DIR") {
            cfg.static_dir = PathBuf::from(d);
        }
        if let Some(c) = lookup("BCRYPT_COST") {
            let cost = c
                .parse::<u32>()
                .map_err(|_| AppError::Config(format!("BCRYPT_COST is not a number: {}", c)))?;
            if !(4..=31).contains(&cost) {
                return Err(AppError::Config(format!("BCRYPT_COST out of range: {}", cost)));
            }
            cfg.bcrypt_cost = cost;
        }

        cfg.admin = match (lookup("ADMIN_SID"), lookup("ADMIN_PASSWORD")) {
            (Some(sid), Some(pw)) if !sid.is_empty() && !pw.is_empty() => Some((sid, pw)),
            (None, None) => None,
            _ => {
                return Err(AppError::Config(
                    "ADMIN_SID and ADMIN_PASSWORD must be set together".to_string(),
                ));
            }
        };

        Ok(cfg)
    }
}
