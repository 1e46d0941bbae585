use crate::{
    errors::AppError,
    models::user::{LoginRequest, LoginResponse, RegisterRequest, UserProfile, UserRole},
    services::{profile, token::TokenCodec},
    store::{NewUser, UserStore},
};

pub struct AuthService;

impl AuthService {
    /// Create an account and return its public profile. New accounts always
    /// start with the `user` role; elevated roles are provisioned out of
    /// band, never through registration.
    pub async fn register(
        store: &dyn UserStore,
        req: RegisterRequest,
    ) -> Result<UserProfile, AppError> {
        let email = req.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation("a valid email is required".into()));
        }
        if req.password.len() < 8 {
            return Err(AppError::Validation(
                "password must be at least 8 characters".into(),
            ));
        }

        let username = match req.username {
            Some(u) => {
                let u = u.trim().to_lowercase();
                if u.len() < 3 {
                    return Err(AppError::Validation(
                        "username must be at least 3 characters".into(),
                    ));
                }
                u
            }
            None => profile::username_from_email(&email),
        };

        if store
            .username_or_email_taken(&username, &email)
            .await
            .map_err(AppError::Internal)?
        {
            return Err(AppError::Conflict(
                "username or email already registered".into(),
            ));
        }

        let password_hash =
            bcrypt::hash(&req.password, 12).map_err(|e| AppError::Internal(e.into()))?;
        let avatar_url = Some(profile::avatar_url(&username));

        let user = store
            .create(NewUser {
                username,
                email,
                password_hash,
                role: UserRole::User,
                avatar_url,
            })
            .await
            .map_err(AppError::Internal)?;

        Ok(user.into())
    }

    /// Verify credentials and issue an access token. Unknown username and
    /// wrong password collapse into the same rejection so neither leaks
    /// account existence.
    pub async fn login(
        store: &dyn UserStore,
        codec: &TokenCodec,
        req: LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let username = req.username.trim().to_lowercase();

        let user = store
            .find_by_username(&username)
            .await
            .map_err(AppError::Internal)?
            .ok_or(AppError::InvalidCredentials)?;

        let valid = bcrypt::verify(&req.password, &user.password_hash)
            .map_err(|e| AppError::Internal(e.into()))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let role: UserRole = user.role.parse().unwrap_or(UserRole::User);
        let access_token = codec
            .issue_access_token(user.id, role)
            .map_err(AppError::Internal)?;

        Ok(LoginResponse {
            access_token,
            user: user.into(),
        })
    }
}
