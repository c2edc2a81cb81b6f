//! Who is making the request. Accounts and logins live in a separate identity service, which hands
//! out HS256 session tokens signed with a secret shared with this server. Here we only verify them.
use actix_web::{
    dev::Payload,
    http::{header, header::Header, StatusCode},
    web, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use url::form_urlencoded;
use uuid::Uuid;

/// Name of the cookie the identity service stores the session token in.
pub const SESSION_COOKIE: &str = "session";

pub const DEFAULT_LOGIN_URL: &str = "/auth/login/";

/// Claims inside a session token.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionClaims {
    /// The user's id.
    pub sub: Uuid,
    pub username: String,
    /// Expiry, seconds since the epoch.
    pub exp: usize,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
}

/// Verifies session tokens and knows where to send anonymous users.
#[derive(Clone)]
pub struct Sessions {
    secret: String,
    login_url: String,
}

impl Sessions {
    pub fn new(secret: String, login_url: String) -> Self {
        Self { secret, login_url }
    }

    /// The user a token belongs to, if it's correctly signed and not expired.
    pub fn verify(&self, token: &str) -> Option<SessionUser> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        match decode::<SessionClaims>(token, &key, &Validation::default()) {
            Ok(data) => Some(SessionUser {
                id: data.claims.sub,
                username: data.claims.username,
            }),
            Err(e) => {
                debug!(error = %e, "rejected session token");
                None
            }
        }
    }

    /// The login page, told to come back to `next` afterwards.
    pub fn login_redirect(&self, next: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("next", next)
            .finish();
        format!("{}?{}", self.login_url, query)
    }
}

fn session_user(req: &HttpRequest) -> Option<SessionUser> {
    guard!(let Some(sessions) = req.app_data::<web::Data<Sessions>>() else {
        warn!("no session verifier configured; treating request as anonymous");
        return None
    });
    let token = match req.cookie(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_owned(),
        None => Authorization::<Bearer>::parse(req)
            .ok()?
            .into_scheme()
            .token()
            .to_string(),
    };
    sessions.verify(&token)
}

/// The caller, who may be anonymous. Extracting this never fails.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<SessionUser>);

impl Viewer {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequest for Viewer {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Viewer(session_user(req))))
    }
}

/// An authenticated caller. Handlers taking this send anonymous callers to the login page.
#[derive(Debug, Clone)]
pub struct LoggedIn(pub SessionUser);

impl FromRequest for LoggedIn {
    type Error = LoginRedirect;
    type Future = Ready<Result<Self, Self::Error>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(match session_user(req) {
            Some(user) => Ok(LoggedIn(user)),
            None => {
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                let location = match req.app_data::<web::Data<Sessions>>() {
                    Some(sessions) => sessions.login_redirect(next),
                    None => Sessions::new(String::new(), DEFAULT_LOGIN_URL.to_owned())
                        .login_redirect(next),
                };
                Err(LoginRedirect { location })
            }
        })
    }
}

/// Sends an anonymous caller to the login page.
#[derive(Debug)]
pub struct LoginRedirect {
    pub location: String,
}

impl fmt::Display for LoginRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "login required, redirecting to {}", self.location)
    }
}

impl ResponseError for LoginRedirect {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Found()
            .header(header::LOCATION, self.location.as_str())
            .finish()
    }
}

#[cfg(test)]
impl Sessions {
    /// Sign a token the way the identity service does.
    pub fn issue(&self, user: &SessionUser, valid_for: chrono::Duration) -> String {
        use jsonwebtoken::{encode, EncodingKey, Header};
        let claims = SessionClaims {
            sub: user.id,
            username: user.username.clone(),
            exp: (chrono::Utc::now() + valid_for).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .unwrap()
    }
}
