use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    model::entity::{UserEntity, UserEntityCreateUpdate},
    utils::validation::{
        ValidationResult, require, validate_email, validate_password, validate_phone,
        validate_wallet,
    },
};

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    pub wallet_address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub learning_goals: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UpdateUserBody {
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub wallet_address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub learning_goals: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserEntity,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RefreshBody {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LogoutBody {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RoleBody {
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionCount {
    pub active: i64,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LogoutAllResponse {
    pub deleted: u64,
}

fn validate_profile(
    email: &str,
    full_name: &str,
    phone: &str,
    wallet: Option<&str>,
) -> ValidationResult<()> {
    require("email", email)?;
    require("full_name", full_name)?;
    require("phone", phone)?;
    validate_email(email.trim())?;
    validate_phone(phone.trim())?;
    if let Some(wallet) = wallet.filter(|w| !w.trim().is_empty()) {
        validate_wallet(wallet.trim())?;
    }
    Ok(())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RegisterBody {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_profile(
            &self.email,
            &self.full_name,
            &self.phone,
            self.wallet_address.as_deref(),
        )?;
        require("password", &self.password)?;
        validate_password(&self.password)
    }

    pub fn into_entity(self, password_hash: String) -> UserEntityCreateUpdate {
        UserEntityCreateUpdate {
            email: self.email.trim().to_lowercase(),
            password_hash,
            full_name: self.full_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            wallet_address: blank_to_none(self.wallet_address),
            date_of_birth: self.date_of_birth,
            gender: blank_to_none(self.gender),
            learning_goals: blank_to_none(self.learning_goals),
        }
    }
}

impl UpdateUserBody {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_profile(
            &self.email,
            &self.full_name,
            &self.phone,
            self.wallet_address.as_deref(),
        )
    }

    pub fn into_entity(self) -> UserEntityCreateUpdate {
        UserEntityCreateUpdate {
            email: self.email.trim().to_lowercase(),
            password_hash: String::new(), // not in use
            full_name: self.full_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            wallet_address: blank_to_none(self.wallet_address),
            date_of_birth: self.date_of_birth,
            gender: blank_to_none(self.gender),
            learning_goals: blank_to_none(self.learning_goals),
        }
    }
}
