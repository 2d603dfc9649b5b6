use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{LoginRequest, SignupRequest};
use crate::error::FieldError;

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalizes the request in place and reports every invalid field.
pub fn validate_signup(req: &mut SignupRequest) -> Result<(), Vec<FieldError>> {
    req.name = req.name.trim().to_string();
    req.email = normalize_email(&req.email);

    let mut errors = Vec::new();
    if req.name.is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }
    if !is_valid_email(&req.email) {
        errors.push(FieldError::new("email", "Invalid email"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_login(req: &mut LoginRequest) -> Result<(), Vec<FieldError>> {
    req.email = normalize_email(&req.email);

    let mut errors = Vec::new();
    if !is_valid_email(&req.email) {
        errors.push(FieldError::new("email", "Invalid email"));
    }
    if req.password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
