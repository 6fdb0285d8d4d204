use serde::{Serialize, Deserialize};

use crate::users::User;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub recaptcha_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub email: String,
    pub password: String,
    pub recaptcha_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTotp {
    pub ticket_id: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnableTotp {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Authed {
    pub ok: bool,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondFactorRequired {
    pub need2fa: bool,
    pub ticket_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpEnrollment {
    pub enrollment_uri: String,
    pub qr_image: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpState {
    pub ok: bool,
    pub totp_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_field_names() {
        let parsed: RegisterUser = serde_json::from_str(
            r#"{"email":"a@x.com","password":"longenough","recaptchaToken":"tok"}"#
        ).unwrap();

        assert_eq!(parsed.recaptcha_token, "tok");

        let required = SecondFactorRequired {
            need2fa: true,
            ticket_id: String::from("abc"),
        };
        let value = serde_json::to_value(&required).unwrap();

        assert_eq!(value["need2fa"], true);
        assert_eq!(value["ticketId"], "abc");

        let enrollment = TotpEnrollment {
            enrollment_uri: String::from("otpauth://totp/x"),
            qr_image: String::from("data:image/png;base64,xyz"),
        };
        let value = serde_json::to_value(&enrollment).unwrap();

        assert_eq!(value["enrollmentUri"], "otpauth://totp/x");
        assert_eq!(value["qrImage"], "data:image/png;base64,xyz");

        let state = TotpState { ok: true, totp_enabled: false };
        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(value["totpEnabled"], false);
    }
}
