use rand::Rng;

/// Derive a username from the email local part when the client did not pick
/// one. The random numeric suffix keeps collisions cheap to retry.
pub fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let base: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase();
    let base = if base.is_empty() { "user".to_string() } else { base };

    let suffix: u32 = rand::thread_rng().gen_range(100..10_000);
    format!("{base}{suffix}")
}

/// Deterministic identicon URL seeded by the username.
pub fn avatar_url(username: &str) -> String {
    format!("https://api.dicebear.com/7.x/identicon/svg?seed={username}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_strips_punctuation_and_case() {
        let name = username_from_email("Jane.Doe+spam@example.com");
        assert!(name.starts_with("janedoespam"), "got {name}");
        assert!(name.len() > "janedoespam".len());
    }

    #[test]
    fn empty_local_part_falls_back() {
        let name = username_from_email("@example.com");
        assert!(name.starts_with("user"));
    }
}
