use crate::domain::error::FieldError;
use crate::infrastructure::assets::ImageUpload;
use crate::presentation::dto::{AdminForm, PostForm};

const MAX_TEXT_LEN: usize = 2000;
const MAX_FIELD_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// A plausible address is enough here; deliverability is not our problem.
fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

fn check_required_text(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    max_len: usize,
) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "is required"));
    } else if value.chars().count() > max_len {
        errors.push(FieldError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }
}

pub fn validate_post_form(form: &PostForm) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_required_text(&mut errors, "name", &form.name, MAX_FIELD_LEN);
    check_required_text(&mut errors, "email", &form.email, MAX_FIELD_LEN);
    if !form.email.trim().is_empty() && !looks_like_email(&form.email) {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
    check_required_text(&mut errors, "text", &form.text, MAX_TEXT_LEN);
    errors
}

pub fn validate_admin_form(form: &AdminForm) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_required_text(&mut errors, "name", &form.name, MAX_FIELD_LEN);
    check_required_text(&mut errors, "email", &form.email, MAX_FIELD_LEN);
    if !form.email.trim().is_empty() && !looks_like_email(&form.email) {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }

    // Password is required and confirmed on create; on edit an absent password
    // leaves the stored hash untouched.
    let is_update = form.id.is_some();
    match form.password.as_deref() {
        None | Some("") if is_update => {}
        None | Some("") => errors.push(FieldError::new("password", "is required")),
        Some(password) => {
            if password.chars().count() < MIN_PASSWORD_LEN {
                errors.push(FieldError::new(
                    "password",
                    format!("must be at least {} characters", MIN_PASSWORD_LEN),
                ));
            } else if password.chars().count() > MAX_FIELD_LEN {
                errors.push(FieldError::new(
                    "password",
                    format!("must be at most {} characters", MAX_FIELD_LEN),
                ));
            }
            if form.password_confirmation.as_deref() != Some(password) {
                errors.push(FieldError::new("password", "confirmation does not match"));
            }
        }
    }
    errors
}

pub fn validate_upload(upload: &ImageUpload) -> Vec<FieldError> {
    let mut errors = Vec::new();
    match upload.extension() {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {}
        _ => errors.push(FieldError::new("image", "must be an image file")),
    }
    if upload.bytes.is_empty() {
        errors.push(FieldError::new("image", "is empty"));
    } else if upload.bytes.len() > MAX_IMAGE_BYTES {
        errors.push(FieldError::new("image", "is too large"));
    }
    errors
}
