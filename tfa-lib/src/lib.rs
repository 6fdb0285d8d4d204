pub mod error;
pub mod ids;
pub mod sec;
pub mod users;
pub mod validation;

pub fn string_of_len_char(length: usize, ch: char) -> String {
    std::iter::repeat(ch).take(length).collect()
}

pub fn string_of_len(length: usize) -> String {
    string_of_len_char(length, 'a')
}
