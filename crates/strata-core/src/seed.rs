// crates/strata-core/src/seed.rs
//
// The seed-from-identity transform: the one pure, stateless function that
// turns a derived identity into the next layer's seed. Implemented exactly
// once here and shared by every caller.

/// Length of a derivation seed: 55 lowercase ASCII letters.
pub const SEED_LEN: usize = 55;

/// Length of a derived identity: 60 uppercase ASCII alphanumerics.
pub const IDENTITY_LEN: usize = 60;

/// Check whether a string is a well-formed seed (exactly 55 lowercase
/// ASCII letters).
pub fn is_valid_seed(seed: &str) -> bool {
    seed.len() == SEED_LEN && seed.bytes().all(|b| b.is_ascii_lowercase())
}

/// Check whether a string is a well-formed identity (exactly 60 uppercase
/// ASCII alphanumeric characters).
pub fn is_valid_identity(identity: &str) -> bool {
    identity.len() == IDENTITY_LEN
        && identity
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Compute the next layer's seed from a derived identity.
///
/// Canonicalizes to lowercase and takes the first [`SEED_LEN`] characters.
/// Returns `None` when the prefix is not exactly 55 alphabetic characters
/// (e.g., the identity contains a digit in its body), in which case the
/// chain cannot continue past this identity.
pub fn seed_from_identity(identity: &str) -> Option<String> {
    let body: String = identity
        .chars()
        .take(SEED_LEN)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if body.len() == SEED_LEN && body.bytes().all(|b| b.is_ascii_lowercase()) {
        Some(body)
    } else {
        None
    }
}
