//! Structural IBAN validation.

/// Port for IBAN validation.
///
/// The engine only requires structural validity; deployments that
/// need full MOD-97 checksum verification plug in a stricter
/// implementation here.
pub trait IbanValidator: Send + Sync {
    /// Whether the given string is an acceptable IBAN.
    fn is_valid(&self, iban: &str) -> bool;
}

/// Shape-only validator: country prefix, check digits, length bounds
/// and charset. Does not verify the MOD-97 checksum.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralIbanValidator;

impl StructuralIbanValidator {
    /// Create the validator.
    pub fn new() -> Self {
        Self
    }
}

impl IbanValidator for StructuralIbanValidator {
    fn is_valid(&self, iban: &str) -> bool {
        let s = iban.trim();
        // ISO 13616: two uppercase letters, two digits, then 11 to 30
        // alphanumeric BBAN characters.
        if !(15..=34).contains(&s.len()) {
            return false;
        }
        let bytes = s.as_bytes();
        bytes[0].is_ascii_uppercase()
            && bytes[1].is_ascii_uppercase()
            && bytes[2].is_ascii_digit()
            && bytes[3].is_ascii_digit()
            && s.chars().all(|c| c.is_ascii_alphanumeric())
    }
}
