use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequestDto {
    #[schema(example = "ayu.lestari@company.com")]
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyTokenDto {
    #[schema(example = "ayu.lestari@company.com")]
    pub email: String,
    /// six-digit code from the login email
    #[schema(example = "482913")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// employee id, as a string
    pub sub: String,
    pub employee_id: u64,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}
