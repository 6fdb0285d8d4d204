pub type TicketId = String;
pub type UserId = i64;

pub const TICKET_ID_SIZE: usize = 32;

/// url safe characters used for ticket identifiers
pub const TICKET_ID_ALPHABET: [char; 63] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C',
    'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P',
    'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c',
    'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p',
    'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '_',
];

pub fn create_ticket_id() -> TicketId {
    nanoid::format(nanoid::rngs::default, &TICKET_ID_ALPHABET, TICKET_ID_SIZE)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ticket_id_shape() {
        let id = create_ticket_id();

        assert_eq!(id.chars().count(), TICKET_ID_SIZE);

        for ch in id.chars() {
            assert!(TICKET_ID_ALPHABET.contains(&ch), "unexpected character {ch:?} in {id:?}");
        }
    }

    #[test]
    fn ticket_ids_unique() {
        let first = create_ticket_id();
        let second = create_ticket_id();

        assert_ne!(first, second);
    }
}
