//! Request helpers shared by the endpoint tests.

use rocket::{
    http::{ContentType, Status},
    local::asynchronous::{Client, LocalResponse},
    serde::json::serde_json,
};
use serde::Serialize;

use crate::error::{ErrorBody, ErrorKind};
use crate::model::{
    api::{
        election::ElectionSpec,
        roster::{CandidateSpec, PartySpec},
        vote::VoteRequest,
        voter::VoterRegistration,
        Created,
    },
    common::election::{CandidateId, ElectionId, PartyId},
};

pub async fn post_json<'c, T: Serialize>(
    client: &'c Client,
    uri: impl Into<String>,
    body: &T,
) -> LocalResponse<'c> {
    client
        .post(uri.into())
        .header(ContentType::JSON)
        .body(serde_json::to_string(body).unwrap())
        .dispatch()
        .await
}

pub async fn put_json<'c, T: Serialize>(
    client: &'c Client,
    uri: impl Into<String>,
    body: &T,
) -> LocalResponse<'c> {
    client
        .put(uri.into())
        .header(ContentType::JSON)
        .body(serde_json::to_string(body).unwrap())
        .dispatch()
        .await
}

/// Assert that a request failed with the given status and error kind.
pub async fn assert_error(response: LocalResponse<'_>, status: Status, kind: ErrorKind) {
    assert_eq!(status, response.status());
    let body: ErrorBody = response.into_json().await.unwrap();
    assert_eq!(kind, body.kind);
}

async fn created(response: LocalResponse<'_>) -> u32 {
    assert_eq!(Status::Ok, response.status());
    response.into_json::<Created>().await.unwrap().id
}

pub async fn create_election(client: &Client, name: &str) -> ElectionId {
    let spec = ElectionSpec {
        name: name.to_string(),
    };
    created(post_json(client, "/api/admin/elections", &spec).await).await
}

/// POST one of `start`, `stop` or `reset`.
pub async fn transition<'c>(
    client: &'c Client,
    election_id: ElectionId,
    action: &str,
) -> LocalResponse<'c> {
    client
        .post(format!("/api/admin/elections/{election_id}/{action}"))
        .dispatch()
        .await
}

pub async fn add_party(client: &Client, spec: &PartySpec) -> PartyId {
    created(post_json(client, "/api/admin/parties", spec).await).await
}

pub async fn add_candidate(client: &Client, spec: &CandidateSpec) -> CandidateId {
    created(post_json(client, "/api/admin/candidates", spec).await).await
}

pub async fn register<'c>(client: &'c Client, registration: &VoterRegistration) -> LocalResponse<'c> {
    post_json(client, "/api/voters", registration).await
}

pub async fn cast<'c>(client: &'c Client, request: &VoteRequest) -> LocalResponse<'c> {
    post_json(client, "/api/votes", request).await
}

/// An election with parties P1 and P2 and one candidate each, not yet started.
pub async fn election_with_roster(client: &Client) -> (ElectionId, CandidateId, CandidateId) {
    let election_id = create_election(client, "General 2025").await;
    add_party(client, &PartySpec::example(election_id)).await;
    add_party(client, &PartySpec::example2(election_id)).await;
    let ann = add_candidate(client, &CandidateSpec::example(election_id)).await;
    let bob = add_candidate(client, &CandidateSpec::example2(election_id)).await;
    (election_id, ann, bob)
}
