use crate::validation::check_control_whitespace;

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 512;

pub fn password_valid(given: &str) -> bool {
    let mut count = 0;

    for ch in given.chars() {
        count += 1;

        if ch.is_control() || count > PASSWORD_MAX_CHARS {
            return false;
        }
    }

    count >= PASSWORD_MIN_CHARS
}

pub const CAPTCHA_TOKEN_MAX_CHARS: usize = 2048;

pub fn captcha_token_valid(given: &str) -> bool {
    !given.is_empty() && check_control_whitespace(given, Some(CAPTCHA_TOKEN_MAX_CHARS))
}

pub mod totp {
    pub const CODE_DIGITS: usize = 6;

    pub fn code_valid(given: &str) -> bool {
        given.len() == CODE_DIGITS && given.bytes().all(|b| b.is_ascii_digit())
    }

    #[cfg(test)]
    mod test {
        use super::*;

        #[test]
        fn code_validation() {
            for given in ["000000", "123456"] {
                assert!(code_valid(given), "expected valid: {given:?}");
            }

            for given in ["", "12345", "1234567", "12a456", "１２３４５６"] {
                assert!(!code_valid(given), "expected invalid: {given:?}");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn captcha_token_validation() {
        let valid = [
            String::from("03AGdBq26_token-payload"),
            crate::string_of_len(CAPTCHA_TOKEN_MAX_CHARS),
        ];

        for given in valid {
            assert!(captcha_token_valid(&given), "expected valid: {given:?}");
        }

        let invalid = [
            String::new(),
            String::from("has spaces"),
            String::from("ctl\u{0000}char"),
            crate::string_of_len(CAPTCHA_TOKEN_MAX_CHARS + 1),
        ];

        for given in invalid {
            assert!(!captcha_token_valid(&given), "expected invalid: {given:?}");
        }
    }

    #[test]
    fn password_validation() {
        let valid = [
            String::from("pàsswörd🔑 with Ünïcode châracters™"),
            String::from("Quartz Lantern Orbit Mango Halide7"),
        ];

        for given in valid {
            assert!(password_valid(&given), "expected valid: {given:?}");
        }

        let invalid = [
            String::from("bell\u{0007}and tab\u{0009}chars"),
            crate::string_of_len(PASSWORD_MIN_CHARS - 1),
            crate::string_of_len(PASSWORD_MAX_CHARS + 1),
        ];

        for given in invalid {
            assert!(!password_valid(&given), "expected invalid: {given:?}");
        }
    }
}
