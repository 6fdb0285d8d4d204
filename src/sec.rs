pub mod authn;
pub mod captcha;
pub mod state;
