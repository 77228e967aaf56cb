use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{Method, Status, StatusClass},
    request::{FromRequest, Outcome},
    Data, Orbit, Request, Response, Rocket,
};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::api::BASE;

/// A unique identifier for a particular request, so that handler log lines
/// can be matched up with the access log lines of [`AccessLogFairing`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(pub usize);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "req{}", self.0)
    }
}

impl RequestId {
    /// Atomically get the next ID. Wraps back to zero on overflow.
    pub fn next() -> RequestId {
        static REQUEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestId(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for &'r RequestId {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(req.local_cache(RequestId::next))
    }
}

/// Which part of the voting API a request is aimed at.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Audience {
    /// Election and roster management, behind the admin token.
    Admin,
    /// Admin login, logout and credential changes.
    Auth,
    /// Voter registration, voter login and ballot casting.
    Voter,
    /// Election listings, rosters and results.
    Public,
    /// Anything outside the API.
    Other,
}

impl Audience {
    /// Classify a request path by its first segment under the API base.
    pub fn of(path: &str) -> Self {
        let segment = path
            .strip_prefix(BASE)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.split('/').next());
        match segment {
            Some("admin") => Self::Admin,
            Some("auth") => Self::Auth,
            Some("voters" | "votes") => Self::Voter,
            Some("elections") => Self::Public,
            _ => Self::Other,
        }
    }
}

impl Display for Audience {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Admin => "admin",
            Self::Auth => "auth",
            Self::Voter => "voter",
            Self::Public => "public",
            Self::Other => "other",
        };
        write!(f, "{label}")
    }
}

/// When the request reached the server.
struct Arrival(Instant);

/// Whether the response settles a ballot, and how. Only `POST /api/votes`
/// responses get a verdict.
fn ballot_verdict(method: Method, path: &str, status: Status) -> Option<&'static str> {
    if method != Method::Post || path != format!("{BASE}/votes") {
        return None;
    }
    let verdict = if status == Status::Ok {
        "ballot recorded"
    } else if status == Status::Conflict {
        "repeat ballot refused"
    } else {
        "ballot rejected"
    };
    Some(verdict)
}

/// A rocket fairing that writes the access log: one line per request and
/// response, tagged with the [`Audience`] and the time taken.
#[derive(Debug, Copy, Clone)]
pub struct AccessLogFairing;

#[rocket::async_trait]
impl Fairing for AccessLogFairing {
    fn info(&self) -> Info {
        Info {
            name: "Access log",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let protocol = if rocket.config().tls_enabled() {
            "https"
        } else {
            "http"
        };
        let ip = &rocket.config().address;
        let port = &rocket.config().port;
        info!("Voting server launched on {protocol}://{ip}:{port}");

        for audience in [Audience::Admin, Audience::Auth, Audience::Voter, Audience::Public] {
            let count = rocket
                .routes()
                .filter(|route| Audience::of(route.uri.path()) == audience)
                .count();
            debug!("{count} {audience} routes under {BASE}");
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        req.local_cache(|| Arrival(Instant::now()));
        let id = req.local_cache(RequestId::next);
        let audience = Audience::of(req.uri().path().as_str());
        info!("->{id} [{audience}] {} {}", req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let id = req.local_cache(RequestId::next);
        let elapsed = req.local_cache(|| Arrival(Instant::now())).0.elapsed();
        let path = req.uri().path();
        let audience = Audience::of(path.as_str());
        let code = res.status();
        let route = match req.route() {
            Some(r) => match r.name {
                Some(ref name) => name.to_string(),
                None => r.uri.to_string(),
            },
            None => "no route".to_string(),
        };

        let mut log_msg = format!(
            "<-{id} [{audience}] {code} {route} in {}ms",
            elapsed.as_millis()
        );
        if let Some(verdict) = ballot_verdict(req.method(), path.as_str(), code) {
            log_msg = format!("{log_msg}: {verdict}");
        }
        match code.class() {
            StatusClass::ServerError => error!("{log_msg}"),
            StatusClass::ClientError => warn!("{log_msg}"),
            _ => info!("{log_msg}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutdown requested, closing the polls to new requests...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_increase() {
        let first = RequestId::next();
        let second = RequestId::next();
        assert!(second > first);
        assert_eq!(format!("{}", RequestId(7)), "req7");
    }

    #[test]
    fn paths_map_to_audiences() {
        assert_eq!(Audience::of("/api/admin/elections/3/start"), Audience::Admin);
        assert_eq!(Audience::of("/api/auth/admin"), Audience::Auth);
        assert_eq!(Audience::of("/api/voters/login"), Audience::Voter);
        assert_eq!(Audience::of("/api/votes"), Audience::Voter);
        assert_eq!(Audience::of("/api/elections/3/results"), Audience::Public);
        assert_eq!(Audience::of("/api/elections"), Audience::Public);
        assert_eq!(Audience::of("/api"), Audience::Other);
        assert_eq!(Audience::of("/apiary/votes"), Audience::Other);
        assert_eq!(Audience::of("/favicon.ico"), Audience::Other);
        assert_eq!(Audience::Voter.to_string(), "voter");
    }

    #[test]
    fn only_cast_responses_get_a_verdict() {
        let votes = "/api/votes";
        assert_eq!(
            ballot_verdict(Method::Post, votes, Status::Ok),
            Some("ballot recorded")
        );
        assert_eq!(
            ballot_verdict(Method::Post, votes, Status::Conflict),
            Some("repeat ballot refused")
        );
        assert_eq!(
            ballot_verdict(Method::Post, votes, Status::UnprocessableEntity),
            Some("ballot rejected")
        );
        assert_eq!(ballot_verdict(Method::Get, votes, Status::Ok), None);
        assert_eq!(ballot_verdict(Method::Post, "/api/voters", Status::Ok), None);
    }
}
