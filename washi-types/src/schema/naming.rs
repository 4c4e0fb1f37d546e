//! snake_case naming convention for schema identifiers.

/// Converts a Pascal- or camel-case identifier to snake_case.
///
/// An underscore is inserted before an uppercase character (never the first)
/// when the previous character is lowercase or a digit, or when it ends an
/// acronym run: previous uppercase, next lowercase. Every letter is
/// lowercased and all other characters are copied, so `PK_Orders` becomes
/// `pk_orders` and `HTTPServer` becomes `http_server`.
///
/// Input that is already snake_case is returned unchanged.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + chars.len() / 2);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower)
                {
                    out.push('_');
                }
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
