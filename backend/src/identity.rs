//! The requester's identity, as forwarded by the authentication layer in
//! front of this service.

use actix_web::dev::Payload;
use actix_web::{error, FromRequest, HttpRequest};
use common::model::user::Role;
use futures_util::future::{ready, Ready};

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";
/// Optional; when present the user directory is refreshed with it.
pub const USER_NAME_HEADER: &str = "X-User-Name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
    pub username: Option<String>,
}

impl Identity {
    pub fn new(user_id: i64, role: Role) -> Self {
        Identity {
            user_id,
            role,
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }
}

fn identity_from_request(req: &HttpRequest) -> Result<Identity, actix_web::Error> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .ok_or_else(|| error::ErrorUnauthorized("No autorizado, falta la identidad del usuario."))?;
    let role = req
        .headers()
        .get(USER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(Role::from_claim)
        .unwrap_or(Role::Editor);
    let username = req
        .headers()
        .get(USER_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    Ok(Identity {
        user_id,
        role,
        username,
    })
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(identity_from_request(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn reads_user_and_role_headers() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "7"))
            .insert_header((USER_ROLE_HEADER, "admin"))
            .to_http_request();
        let identity = identity_from_request(&req).unwrap();
        assert_eq!(identity, Identity::new(7, Role::Admin));
    }

    #[test]
    fn role_defaults_to_editor() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "3"))
            .to_http_request();
        let identity = identity_from_request(&req).unwrap();
        assert_eq!(identity.role, Role::Editor);
        assert_eq!(identity.username, None);
    }

    #[test]
    fn reads_optional_username() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "5"))
            .insert_header((USER_NAME_HEADER, " marta "))
            .to_http_request();
        assert_eq!(
            identity_from_request(&req).unwrap(),
            Identity::new(5, Role::Editor).with_username("marta")
        );
    }

    #[test]
    fn missing_or_bad_user_id_is_rejected() {
        let req = TestRequest::default().to_http_request();
        assert!(identity_from_request(&req).is_err());

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "ana"))
            .to_http_request();
        assert!(identity_from_request(&req).is_err());
    }
}
