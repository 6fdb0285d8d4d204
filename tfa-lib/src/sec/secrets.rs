pub const ACCESS_TOKEN_KEY_INFO: &[u8; 12] = b"access_token";
pub const REFRESH_TOKEN_KEY_INFO: &[u8; 13] = b"refresh_token";

pub const TOKEN_KEY_LEN: usize = 64;
