//! mirror of the settings tree where every field is optional so files can
//! override only the keys they carry

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub data: Option<PathBuf>,
    pub master_key: Option<String>,
    pub origin: Option<String>,

    pub listeners: Option<HashMap<String, Listener>>,

    pub sec: Option<Sec>,
    pub captcha: Option<Captcha>,
    pub rate_limit: Option<RateLimit>,
    pub db: Option<Db>,
}

#[derive(Debug, Deserialize)]
pub struct Listener {
    pub addr: String,
}

#[derive(Debug, Deserialize)]
pub struct Sec {
    pub session: Option<Session>,
    pub totp: Option<Totp>,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub secure: Option<bool>,
    pub domain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Totp {
    pub issuer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Captcha {
    pub secret: Option<String>,
    pub verify_url: Option<String>,
    pub timeout: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RateLimit {
    pub window: Option<u64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Db {
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub password: Option<String>,
}
