use email_address::EmailAddress;

pub fn email_valid(given: &str) -> bool {
    EmailAddress::is_valid(given)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn email_validation() {
        let valid = ["a@x.com", "first.last+tag@example.co.uk"];

        for given in valid {
            assert!(email_valid(given), "expected valid: {given:?}");
        }

        let invalid = ["", "not-an-email", "missing@tld@double", "user@"];

        for given in invalid {
            assert!(!email_valid(given), "expected invalid: {given:?}");
        }
    }
}
