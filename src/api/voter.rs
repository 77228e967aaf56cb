use mongodb::bson::doc;
use rocket::{serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::logging::RequestId;
use crate::model::{
    api::{
        vote::VoteRequest,
        voter::{VoterIdentity, VoterLogin, VoterRegistration},
    },
    common::cnic::Cnic,
    db::{
        candidate::Candidate,
        election::Election,
        vote::Vote,
        voter::{NewVoter, Voter},
    },
    mongodb::{is_duplicate_key_error, Coll},
};

use super::find_election;

pub fn routes() -> Vec<Route> {
    routes![register, login, cast_vote]
}

#[post("/voters", data = "<registration>", format = "json")]
async fn register(
    registration: Json<VoterRegistration>,
    new_voters: Coll<NewVoter>,
    request_id: &RequestId,
) -> Result<Json<VoterIdentity>> {
    let voter = registration.into_inner().into_voter()?;
    match new_voters.insert_one(&voter, None).await {
        Ok(_) => {}
        Err(e) if is_duplicate_key_error(&e) => {
            return Err(Error::Conflict(format!(
                "A voter with CNIC {} is already registered",
                voter.cnic
            )))
        }
        Err(e) => return Err(e.into()),
    }

    info!("{request_id} Registered voter {}", voter.cnic);
    Ok(Json(voter.into()))
}

#[post("/voters/login", data = "<login>", format = "json")]
async fn login(
    login: Json<VoterLogin>,
    voters: Coll<Voter>,
    request_id: &RequestId,
) -> Result<Json<VoterIdentity>> {
    let cnic: Cnic = login.cnic.parse()?;
    let voter = voters
        .find_one(doc! { "cnic": &cnic }, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter with CNIC {cnic}")))?;

    info!("{request_id} Voter {} logged in", voter.id);
    Ok(Json(voter.voter.into()))
}

#[post("/votes", data = "<request>", format = "json")]
async fn cast_vote(
    request: Json<VoteRequest>,
    elections: Coll<Election>,
    voters: Coll<Voter>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    request_id: &RequestId,
) -> Result<()> {
    let request = request.into_inner();
    let election_id = request.election_id;

    // Election state is checked before anything about the voter or ballot.
    let election = find_election(&elections, election_id).await?;
    if !election.status.accepts_votes() {
        return Err(Error::InvalidState(format!(
            "Election {election_id} is {}, not running",
            election.status
        )));
    }

    let cnic: Cnic = request.cnic.parse()?;
    if voters.find_one(doc! { "cnic": &cnic }, None).await?.is_none() {
        return Err(Error::Forbidden(format!(
            "CNIC {cnic} is not registered to vote"
        )));
    }

    let candidate_filter = doc! {
        "_id": request.candidate_id,
        "election_id": election_id,
        "active": true,
    };
    let candidate = candidates
        .find_one(candidate_filter, None)
        .await?
        .ok_or_else(|| {
            Error::Validation(format!(
                "Candidate {} is not standing in election {election_id}",
                request.candidate_id
            ))
        })?;
    let party_code = request.party_code.trim();
    if candidate.party_code != party_code {
        return Err(Error::Validation(format!(
            "Candidate {} does not stand for party '{party_code}'",
            candidate.id
        )));
    }

    // The unique index on (election, voter) decides between concurrent casts.
    let vote = Vote::new(election_id, cnic, candidate.party_code, candidate.id);
    match votes.insert_one(&vote, None).await {
        Ok(_) => {}
        Err(e) if is_duplicate_key_error(&e) => {
            return Err(Error::Conflict(format!(
                "CNIC {} has already voted in election {election_id}",
                vote.voter_cnic
            )))
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        "{request_id} Vote cast in election {election_id} for candidate {}",
        vote.candidate_id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use crate::api::testing::{
        assert_error, cast, election_with_roster, post_json, register, transition,
    };
    use crate::error::ErrorKind;
    use crate::model::common::election::{CandidateId, ElectionId};

    use super::*;

    #[backend_test]
    async fn register_normalises_and_rejects_duplicates(client: Client, voters: Coll<Voter>) {
        let response = register(&client, &VoterRegistration::example()).await;
        assert_eq!(Status::Ok, response.status());
        let identity: VoterIdentity = response.into_json().await.unwrap();
        assert_eq!(identity.cnic.as_str(), "12345-1234567-1");

        let stored = voters
            .find_one(doc! { "cnic": "12345-1234567-1" }, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.voter, NewVoter::example());

        // Same CNIC, different spelling.
        let mut again = VoterRegistration::example();
        again.cnic = " 12345-1234567-1 ".to_string();
        let response = register(&client, &again).await;
        assert_error(response, Status::Conflict, ErrorKind::Conflict).await;
        assert_eq!(voters.count_documents(None, None).await.unwrap(), 1);
    }

    #[backend_test]
    async fn register_rejects_bad_input(client: Client, voters: Coll<Voter>) {
        let mut bad_cnic = VoterRegistration::example();
        bad_cnic.cnic = "12345-123456-12".to_string();
        let response = register(&client, &bad_cnic).await;
        assert_error(response, Status::BadRequest, ErrorKind::ValidationError).await;

        let mut no_name = VoterRegistration::example();
        no_name.name = String::new();
        let response = register(&client, &no_name).await;
        assert_error(response, Status::BadRequest, ErrorKind::ValidationError).await;

        // Not JSON at all.
        let response = client
            .post("/api/voters")
            .header(rocket::http::ContentType::JSON)
            .body("{\"cnic\":")
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        assert_eq!(voters.count_documents(None, None).await.unwrap(), 0);
    }

    #[backend_test]
    async fn login_by_cnic(client: Client) {
        let login = VoterLogin {
            cnic: "1234512345671".to_string(),
        };
        let response = post_json(&client, "/api/voters/login", &login).await;
        assert_error(response, Status::NotFound, ErrorKind::NotFound).await;

        register(&client, &VoterRegistration::example()).await;
        let response = post_json(&client, "/api/voters/login", &login).await;
        assert_eq!(Status::Ok, response.status());
        let identity: VoterIdentity = response.into_json().await.unwrap();
        assert_eq!(identity.cnic.as_str(), "12345-1234567-1");
        assert_eq!(identity.name, NewVoter::example().name);

        let garbage = VoterLogin {
            cnic: "abc".to_string(),
        };
        let response = post_json(&client, "/api/voters/login", &garbage).await;
        assert_error(response, Status::BadRequest, ErrorKind::ValidationError).await;
    }

    #[backend_test(admin)]
    async fn cast_vote_checks_in_order(client: Client, votes: Coll<Vote>) {
        let (id, ann, bob) = election_with_roster(&client).await;

        // Unknown election, even with a malformed CNIC.
        let response = cast(&client, &VoteRequest::example(999, ann)).await;
        assert_error(response, Status::NotFound, ErrorKind::NotFound).await;
        let mut malformed = VoteRequest::example(999, ann);
        malformed.cnic = "123".to_string();
        let response = cast(&client, &malformed).await;
        assert_error(response, Status::NotFound, ErrorKind::NotFound).await;

        // Not running yet.
        let response = cast(&client, &VoteRequest::example(id, ann)).await;
        assert_error(response, Status::UnprocessableEntity, ErrorKind::InvalidState).await;

        transition(&client, id, "start").await;

        // Not registered.
        let response = cast(&client, &VoteRequest::example(id, ann)).await;
        assert_error(response, Status::Forbidden, ErrorKind::Forbidden).await;

        register(&client, &VoterRegistration::example()).await;

        // Unknown candidate.
        let response = cast(&client, &VoteRequest::example(id, 999)).await;
        assert_error(response, Status::BadRequest, ErrorKind::ValidationError).await;

        // Bob stands for P2, not P1.
        let response = cast(&client, &VoteRequest::example(id, bob)).await;
        assert_error(response, Status::BadRequest, ErrorKind::ValidationError).await;

        // Malformed CNIC.
        let mut malformed = VoteRequest::example(id, ann);
        malformed.cnic = "123".to_string();
        let response = cast(&client, &malformed).await;
        assert_error(response, Status::BadRequest, ErrorKind::ValidationError).await;

        assert_eq!(votes.count_documents(None, None).await.unwrap(), 0);

        // Bare CNIC is the same voter.
        let mut bare = VoteRequest::example(id, ann);
        bare.cnic = "1234512345671".to_string();
        let response = cast(&client, &bare).await;
        assert_eq!(Status::Ok, response.status());

        let vote = votes.find_one(None, None).await.unwrap().unwrap();
        assert_eq!(vote.election_id, id);
        assert_eq!(vote.voter_cnic.as_str(), "12345-1234567-1");
        assert_eq!(vote.party_code, "P1");
        assert_eq!(vote.candidate_id, ann);
    }

    /// Whatever else is wrong with the ballot, a closed election says so first.
    async fn assert_closed_to_any_ballot(
        client: &Client,
        election_id: ElectionId,
        ann: CandidateId,
    ) {
        let mut unregistered = VoteRequest::example(election_id, ann);
        unregistered.cnic = "99999-9999999-9".to_string();
        let mut malformed = VoteRequest::example(election_id, ann);
        malformed.cnic = "not a cnic".to_string();
        let unknown_candidate = VoteRequest::example(election_id, 999);

        for request in [unregistered, malformed, unknown_candidate] {
            let response = cast(client, &request).await;
            assert_error(response, Status::UnprocessableEntity, ErrorKind::InvalidState).await;
        }
    }

    #[backend_test(admin)]
    async fn closed_elections_reject_before_ballot_checks(client: Client, votes: Coll<Vote>) {
        let (id, ann, _) = election_with_roster(&client).await;
        register(&client, &VoterRegistration::example()).await;

        // CREATED.
        assert_closed_to_any_ballot(&client, id, ann).await;

        // ENDED.
        transition(&client, id, "start").await;
        transition(&client, id, "stop").await;
        assert_closed_to_any_ballot(&client, id, ann).await;

        assert_eq!(votes.count_documents(None, None).await.unwrap(), 0);
    }

    #[backend_test(admin)]
    async fn one_vote_per_election(client: Client, votes: Coll<Vote>) {
        let (first, ann, bob) = election_with_roster(&client).await;
        transition(&client, first, "start").await;
        register(&client, &VoterRegistration::example()).await;

        let response = cast(&client, &VoteRequest::example(first, ann)).await;
        assert_eq!(Status::Ok, response.status());

        // A different choice is still a second vote.
        let mut change = VoteRequest::example(first, bob);
        change.party_code = "P2".to_string();
        let response = cast(&client, &change).await;
        assert_error(response, Status::Conflict, ErrorKind::Conflict).await;
        assert_eq!(votes.count_documents(None, None).await.unwrap(), 1);

        // The same voter can vote in another election.
        let (second, ann2, _) = election_with_roster(&client).await;
        transition(&client, second, "start").await;
        let response = cast(&client, &VoteRequest::example(second, ann2)).await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(votes.count_documents(None, None).await.unwrap(), 2);

        // Closed elections take no votes.
        transition(&client, first, "stop").await;
        let response = cast(&client, &VoteRequest::example(first, ann)).await;
        assert_error(response, Status::UnprocessableEntity, ErrorKind::InvalidState).await;
    }

    #[backend_test(admin)]
    async fn concurrent_casts_record_one_vote(client: Client, votes: Coll<Vote>) {
        let (id, ann, _) = election_with_roster(&client).await;
        transition(&client, id, "start").await;
        register(&client, &VoterRegistration::example()).await;

        let request = VoteRequest::example(id, ann);
        let (a, b) = rocket::tokio::join!(cast(&client, &request), cast(&client, &request));
        let mut statuses = vec![a.status(), b.status()];
        statuses.sort_by_key(|s| s.code);
        assert_eq!(statuses, vec![Status::Ok, Status::Conflict]);
        assert_eq!(votes.count_documents(None, None).await.unwrap(), 1);
    }
}
