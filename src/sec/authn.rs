pub mod initiator;
pub mod password;
pub mod session;
pub mod ticket;
pub mod token;
pub mod totp;
