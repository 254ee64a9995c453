use rand::{thread_rng, Rng};

/// Generates a new 24 character hexadecimal entity id
pub fn object_id() -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.gen_range(0..16u8))
        .map(|n| char::from_digit(n as u32, 16).expect("digit is in range"))
        .take(24)
        .collect()
}

/// Returns true if the string is a well-formed 24 character hexadecimal id
pub fn is_object_id(id: &str) -> bool {
    id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit())
}

/// Strips markup-significant characters from user supplied text before it is stored
pub fn sanitize_text(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '<' | '>')).collect()
}
