/// normalize
///
/// Turns free text into a URL-safe slug: lowercases every character, collapses each run
/// of anything that is not alphanumeric (whitespace, punctuation, symbols) into a single
/// hyphen, and trims hyphens from both ends.
///
/// The output only contains lowercase alphanumerics separated by single hyphens, so
/// `normalize(normalize(x)) == normalize(x)` for every input.
pub fn normalize(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for lowered in text.chars().flat_map(char::to_lowercase) {
        if lowered.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(lowered);
        } else {
            pending_separator = true;
        }
    }

    slug
}
