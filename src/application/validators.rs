use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// ISO 3166-1 alpha-2 shape: exactly two ASCII letters.
pub fn is_valid_country_code(country: &str) -> bool {
    country.len() == 2 && country.chars().all(|c| c.is_ascii_alphabetic())
}

/// Business types accepted by the connected-account onboarding.
pub fn is_valid_business_type(business_type: &str) -> bool {
    matches!(business_type, "individual" | "company" | "non_profit")
}

/// Tip messages are shown to the creator verbatim; keep them short.
pub const MAX_TIP_MESSAGE_LEN: usize = 500;

pub fn is_valid_tip_message(message: &str) -> bool {
    message.chars().count() <= MAX_TIP_MESSAGE_LEN
}
