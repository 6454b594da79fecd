//! Converts Rust-style identifiers (model and field names) into database identifiers.

/// Converts an identifier from the caller's naming convention into the form stored in the
/// catalog.
pub trait NameTransformer: Send + Sync {
    fn get(&self, name: &str) -> String;
}

/// The default transformer: acronym-aware snake_case.
///
/// Unlike a naive "insert `_` before every uppercase letter" pass, this collapses runs of
/// uppercase letters that form an acronym, so `APISnakeNAME` becomes `api_snake_name` rather
/// than `a_p_i_snake_n_a_m_e`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCase;

impl NameTransformer for SnakeCase {
    fn get(&self, name: &str) -> String {
        snake_case(name)
    }
}

fn snake_case(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / 3);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            out.push('_');
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let prev_is_lower = prev.is_lowercase();
            let next_is_lower = next.map(|n| n.is_lowercase()).unwrap_or(false);
            if prev != '_' && (prev_is_lower || next_is_lower) {
                out.push('_');
            }
        }

        for lower in c.to_lowercase() {
            out.push(lower);
        }
    }

    out
}
