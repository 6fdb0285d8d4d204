pub mod body;
pub mod cookie;
pub mod error;
pub mod layer;
