use deunicode::deunicode_char;

use super::arguments::MAX_SLUG_LENGTH;

/// Builds a CamelCase event slug out of a free-form title, e.g.
/// `"Office santa 2024!"` becomes `OfficeSanta2024`.
///
/// Non-ASCII letters are transliterated, everything else is dropped. The
/// result is cut to the maximum slug length and may be empty.
pub fn slug_from_title(title: &str) -> String {
    let mut slug = String::with_capacity(title.len().min(MAX_SLUG_LENGTH));
    let mut is_start_of_word = true;

    let mut push = |c: char| {
        if c.is_ascii_alphanumeric() {
            if is_start_of_word {
                slug.push(c.to_ascii_uppercase());
            } else {
                slug.push(c);
            }
        }

        is_start_of_word = !c.is_ascii_alphanumeric();
    };

    for c in title.chars() {
        if c.is_ascii() {
            push(c);
        } else if let Some(transliterated) = deunicode_char(c) {
            transliterated.chars().for_each(&mut push);
        }
    }

    slug.truncate(MAX_SLUG_LENGTH);
    slug
}
