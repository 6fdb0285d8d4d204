use tfa_lib::sec::secrets::{ACCESS_TOKEN_KEY_INFO, REFRESH_TOKEN_KEY_INFO, TOKEN_KEY_LEN};

use crate::{config, error};

use super::authn::ticket::TicketStore;
use super::authn::token::TokenKeys;
use super::captcha::Captcha;

fn expand_key(kdf: &config::Kdf, info: &[u8], label: &str) -> error::Result<[u8; TOKEN_KEY_LEN]> {
    let mut okm = [0u8; TOKEN_KEY_LEN];

    kdf.expand(info, &mut okm).map_err(|_| {
        error::Error::new()
            .kind("KDFExpandFailed")
            .message(format!("failed to expand {label} key"))
    })?;

    Ok(okm)
}

/// token keys and cookie attributes shared by every session handler
#[derive(Debug)]
pub struct Sessions {
    keys: TokenKeys,
    secure: bool,
    domain: Option<String>,
}

impl Sessions {
    pub fn from_config(config: &config::Config) -> error::Result<Self> {
        tracing::debug!("deriving session token keys");

        let keys = TokenKeys {
            access: expand_key(&config.kdf, ACCESS_TOKEN_KEY_INFO, "access token")?,
            refresh: expand_key(&config.kdf, REFRESH_TOKEN_KEY_INFO, "refresh token")?,
        };

        let session = &config.settings.sec.session;

        Ok(Sessions {
            keys,
            secure: session.secure,
            domain: session.domain.clone(),
        })
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn secure(&self) -> bool {
        self.secure
    }
}

#[derive(Debug)]
pub struct Sec {
    sessions: Sessions,
    tickets: TicketStore,
    captcha: Captcha,
    totp_issuer: String,
}

impl Sec {
    pub fn from_config(config: &config::Config) -> error::Result<Sec> {
        tracing::debug!("building security state");

        Ok(Sec {
            sessions: Sessions::from_config(config)?,
            tickets: TicketStore::new(),
            captcha: Captcha::from_config(config)?,
            totp_issuer: config.settings.sec.totp.issuer.clone(),
        })
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub fn tickets(&self) -> &TicketStore {
        &self.tickets
    }

    pub fn captcha(&self) -> &Captcha {
        &self.captcha
    }

    pub fn totp_issuer(&self) -> &str {
        &self.totp_issuer
    }
}
