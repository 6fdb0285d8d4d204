use serde::{Deserialize, Serialize};

use tfa_lib::ids;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: ids::UserId,
    pub email: String,
    pub totp_enabled: bool,
}
