use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::validation::validate_admin_form;
use crate::data::admin_repository::AdminRepository;
use crate::domain::admin::Admin;
use crate::domain::error::DomainError;
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};
use crate::presentation::dto::AdminForm;

#[derive(Clone)]
pub struct AdminService<R: AdminRepository + 'static> {
    repo: Arc<R>,
    keys: JwtKeys,
}

impl<R> AdminService<R>
where
    R: AdminRepository + 'static,
{
    pub fn new(repo: Arc<R>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_admin(&self, id: Uuid) -> Result<Admin, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Admin>, DomainError> {
        self.repo.list().await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, DomainError> {
        let admin = self
            .repo
            .find_by_email(&email.to_lowercase())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &admin.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        self.keys
            .generate_token(admin.id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    /// Create-or-update by optional id. Email uniqueness ignores the record
    /// under edit; an absent password on edit leaves the stored hash alone.
    #[instrument(skip(self, form))]
    pub async fn store(&self, form: AdminForm) -> Result<Admin, DomainError> {
        let errors = validate_admin_form(&form);
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let email = form.email.to_lowercase();
        if self.repo.email_taken_by_other(&email, form.id).await? {
            return Err(DomainError::EmailTaken(email));
        }

        match form.id {
            Some(id) => {
                let existing = self
                    .repo
                    .find_by_id(id)
                    .await?
                    .ok_or(DomainError::NotFound(id))?;

                let password_hash = match form.password.as_deref() {
                    Some(password) if !password.is_empty() => hash_password(password)
                        .map_err(|err| DomainError::Internal(err.to_string()))?,
                    _ => existing.password_hash.clone(),
                };

                let admin = Admin {
                    name: form.name,
                    email,
                    password_hash,
                    updated_at: Utc::now(),
                    ..existing
                };
                self.repo
                    .update(&admin)
                    .await?
                    .ok_or(DomainError::NotFound(id))
            }
            None => {
                // validation guarantees a password on create
                let password = form.password.as_deref().unwrap_or_default();
                let hash = hash_password(password)
                    .map_err(|err| DomainError::Internal(err.to_string()))?;
                self.repo.create(Admin::new(form.name, email, hash)).await
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn destroy(&self, id: Uuid) -> Result<(), DomainError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound(id))
        }
    }

    /// Bootstrap seed: inserts the configured admin when the table is empty.
    pub async fn seed(&self, email: &str, password: &str) -> Result<(), DomainError> {
        if self.repo.count().await? > 0 {
            return Ok(());
        }
        let hash =
            hash_password(password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let admin = self
            .repo
            .create(Admin::new("admin".into(), email.to_lowercase(), hash))
            .await?;
        info!(admin_id = %admin.id, email = %admin.email, "seed admin created");
        Ok(())
    }
}
