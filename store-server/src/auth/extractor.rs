//! Identity Extractor
//!
//! Reads the caller identity forwarded by the gateway

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{CurrentUser, Role, USER_ID_HEADER, USER_ROLE_HEADER};
use crate::utils::AppError;

/// 管理员身份，非管理员调用返回 403
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let Some(user_id) = header(parts, USER_ID_HEADER) else {
            tracing::debug!(uri = %parts.uri, "Request without caller identity");
            return Err(AppError::not_authenticated());
        };

        let role = match header(parts, USER_ROLE_HEADER) {
            None => Role::Customer,
            Some(raw) => raw.parse().map_err(|_| {
                tracing::warn!(uri = %parts.uri, role = %raw, "Unknown caller role");
                AppError::not_authenticated().with_detail("role", raw)
            })?,
        };

        let user = CurrentUser::new(user_id, role);
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.user_id, uri = %parts.uri, "Admin route denied");
            return Err(AppError::admin_required());
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = http::Request::builder().uri("/api/v1/orders");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthenticated() {
        let mut p = parts(&[]);
        let err = CurrentUser::from_request_parts(&mut p, &()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_role_defaults_to_customer() {
        let mut p = parts(&[("x-user-id", "alice")]);
        let user = CurrentUser::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(user, CurrentUser::customer("alice"));
    }

    #[tokio::test]
    async fn test_unknown_role_rejected() {
        let mut p = parts(&[("x-user-id", "alice"), ("x-user-role", "root")]);
        let err = CurrentUser::from_request_parts(&mut p, &()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_admin_extractor() {
        let mut p = parts(&[("x-user-id", "root"), ("x-user-role", "Admin")]);
        let AdminUser(user) = AdminUser::from_request_parts(&mut p, &()).await.unwrap();
        assert!(user.is_admin());

        let mut p = parts(&[("x-user-id", "alice")]);
        let err = AdminUser::from_request_parts(&mut p, &()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
    }
}
