pub fn check_control_whitespace<G: AsRef<str>>(given: G, max_chars: Option<usize>) -> bool {
    let value = given.as_ref();

    if value.chars().any(|ch| ch.is_control() || ch.is_whitespace()) {
        return false;
    }

    match max_chars {
        Some(max) => value.chars().count() <= max,
        None => true,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_whitespace() {
        assert!(!check_control_whitespace(" front", None), "leading whitespace");
        assert!(!check_control_whitespace("back ", None), "trailing whitespace");
        assert!(!check_control_whitespace("in the middle", None), "inner whitespace");
    }

    #[test]
    fn rejects_control_chars() {
        assert!(!check_control_whitespace("tail\u{0000}", None), "trailing control");
        assert!(!check_control_whitespace("\u{0008}head", None), "leading control");
        assert!(!check_control_whitespace("sp\u{001b}lit", None), "inner control");
    }

    #[test]
    fn enforces_max_chars() {
        let value = crate::string_of_len(40);

        assert!(check_control_whitespace(&value, Some(40)));
        assert!(!check_control_whitespace(&value, Some(39)));
    }

    #[test]
    fn accepts_plain_values() {
        assert!(check_control_whitespace("plain-value_01", None));
        assert!(check_control_whitespace("short", Some(16)));
    }
}
