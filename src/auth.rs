use actix_web::{
    dev::Payload, error::ErrorForbidden, error::ErrorUnauthorized, FromRequest, HttpRequest,
};
use futures_util::future::{ready, Ready};

use crate::models::Role;

/// Header the fronting academy backend stamps onto proxied requests.
pub const ROLE_HEADER: &str = "x-academy-role";

// Extractor for the caller's role. The node does not hold sessions itself;
// it trusts the role header the backend attaches after its own auth.
pub struct CallerRole {
    pub role: Role,
}

impl FromRequest for CallerRole {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let header = req
            .headers()
            .get(ROLE_HEADER)
            .and_then(|value| value.to_str().ok());

        match header {
            Some(raw) => match Role::parse(raw) {
                Some(role) => ready(Ok(CallerRole { role })),
                None => {
                    tracing::warn!("Unknown role header value received: {:?}", raw);
                    ready(Err(ErrorUnauthorized("Unknown role")))
                }
            },
            None => {
                tracing::debug!("Role header missing.");
                ready(Err(ErrorUnauthorized("Role header missing")))
            }
        }
    }
}

impl CallerRole {
    /// Gate for the mutating endpoints.
    pub fn require_manage(&self) -> Result<(), actix_web::Error> {
        if self.role.can_manage_analysis() {
            Ok(())
        } else {
            tracing::debug!("Role {:?} refused analysis management.", self.role);
            Err(ErrorForbidden("Insufficient role"))
        }
    }
}
