//! Authentication and account endpoints

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, MessageResponse};
use crate::models::{FileUpload, ProfileUpdate, RegistrationForm, UserPayload, Warning, WarningsResponse};

/// Login request
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Login response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: UserPayload,
    pub token: String,
}

/// Response of endpoints that return the current user
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub user: UserPayload,
}

/// `POST /auth/update-modules`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateModulesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserPayload>,
}

#[derive(Debug, Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
    otp: &'a str,
}

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    email: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Serialize)]
struct ModulesRequest<'a> {
    modules: &'a [String],
}

impl ApiClient {
    /// POST /auth/login
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/login")
            .json(&LoginRequest { email, password });
        self.send(request).await
    }

    /// GET /auth/me
    pub async fn me(&self) -> Result<UserPayload, ApiError> {
        let res: UserResponse = self.send(self.request(Method::GET, "auth/me")).await?;
        Ok(res.user)
    }

    /// PUT /auth/update-profile/{id}
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<UserPayload, ApiError> {
        let mut form = Form::new()
            .text("username", update.username.clone())
            .text("email", update.email.clone());
        if let Some(id_card) = &update.id_card {
            form = form.part("idCard", file_part(id_card)?);
        }

        let path = format!("auth/update-profile/{}", urlencoding::encode(user_id));
        let res: UserResponse = self
            .send(self.request(Method::PUT, &path).multipart(form))
            .await?;
        Ok(res.user)
    }

    /// POST /auth/register
    pub async fn register(&self, registration: &RegistrationForm) -> Result<MessageResponse, ApiError> {
        let mut form = Form::new()
            .text("name", registration.username.clone())
            .text("email", registration.email.clone())
            .text("password", registration.password.clone());
        if let Some(id_card) = &registration.id_card {
            form = form.part("idCard", file_part(id_card)?);
        }

        self.send(self.request(Method::POST, "auth/register").multipart(form))
            .await
    }

    /// POST /auth/verify-otp
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<MessageResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/verify-otp")
            .json(&OtpRequest { email, otp });
        self.send(request).await
    }

    /// POST /auth/update-modules
    pub async fn update_modules(&self, modules: &[String]) -> Result<UpdateModulesResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/update-modules")
            .json(&ModulesRequest { modules });
        self.send(request).await
    }

    /// GET /auth/warnings
    pub async fn warnings(&self) -> Result<WarningsResponse, ApiError> {
        self.send(self.request(Method::GET, "auth/warnings")).await
    }

    /// GET /auth/warnings/all, newest first
    pub async fn all_warnings(&self) -> Result<Vec<Warning>, ApiError> {
        let res: WarningsResponse = self
            .send(self.request(Method::GET, "auth/warnings/all"))
            .await?;
        let mut warnings = res.warnings;
        warnings.sort_by(|a, b| b.at.cmp(&a.at));
        Ok(warnings)
    }

    /// PATCH /auth/warnings/mark-seen
    pub async fn mark_warnings_seen(&self) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .send(self.request(Method::PATCH, "auth/warnings/mark-seen"))
            .await?;
        Ok(())
    }

    /// POST /auth/resend-otp
    pub async fn resend_otp(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/resend-otp")
            .json(&EmailRequest { email });
        self.send(request).await
    }

    /// POST /auth/resend-reset-otp
    pub async fn resend_reset_otp(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/resend-reset-otp")
            .json(&EmailRequest { email });
        self.send(request).await
    }

    /// POST /auth/request-reset-password
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/request-reset-password")
            .json(&EmailRequest { email });
        self.send(request).await
    }

    /// POST /auth/verify-reset-otp
    pub async fn verify_reset_otp(&self, email: &str, otp: &str) -> Result<MessageResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/verify-reset-otp")
            .json(&OtpRequest { email, otp });
        self.send(request).await
    }

    /// POST /auth/reset-password
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/reset-password")
            .json(&ResetPasswordRequest { email, new_password });
        self.send(request).await
    }
}

pub(super) fn file_part(upload: &FileUpload) -> Result<Part, ApiError> {
    Part::bytes(upload.bytes.clone())
        .file_name(upload.file_name.clone())
        .mime_str(&upload.mime_type)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid MIME type for {}: {}", upload.file_name, e)))
}
