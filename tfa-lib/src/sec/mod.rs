pub mod authn;
pub mod secrets;
