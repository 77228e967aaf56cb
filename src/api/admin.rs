use mongodb::{
    bson::{doc, Bson, DateTime, Document},
    Client,
};
use rocket::{serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::logging::RequestId;
use crate::model::{
    api::{
        auth::AuthToken,
        election::{ElectionOverview, ElectionSpec},
        roster::{CandidateSpec, PartySpec},
        Created,
    },
    common::election::{CandidateId, ElectionId, ElectionStatus, PartyId, Transition},
    db::{candidate::Candidate, election::Election, party::Party, vote::Vote},
    mongodb::{is_duplicate_key_error, u32_id_filter, Coll, Counter, CounterId},
};

use super::{find_election, public::newest_elections};

pub fn routes() -> Vec<Route> {
    routes![
        elections,
        create_election,
        rename_election,
        start_election,
        stop_election,
        reset_election,
        delete_election,
        add_party,
        remove_party,
        add_candidate,
        remove_candidate,
    ]
}

#[get("/admin/elections?<status>")]
async fn elections(
    _token: AuthToken,
    status: Option<ElectionStatus>,
    elections: Coll<Election>,
    parties: Coll<Party>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
) -> Result<Json<Vec<ElectionOverview>>> {
    let elections = newest_elections(&elections, status).await?;

    let mut overviews = Vec::with_capacity(elections.len());
    for election in elections {
        let active = doc! {
            "election_id": election.id,
            "active": true,
        };
        let party_count = parties.count_documents(active.clone(), None).await?;
        let candidate_count = candidates.count_documents(active, None).await?;
        let vote_count = votes
            .count_documents(doc! { "election_id": election.id }, None)
            .await?;
        overviews.push(ElectionOverview {
            summary: election.into(),
            party_count,
            candidate_count,
            vote_count,
        });
    }

    Ok(Json(overviews))
}

#[post("/admin/elections", data = "<spec>", format = "json")]
async fn create_election(
    token: AuthToken,
    spec: Json<ElectionSpec>,
    elections: Coll<Election>,
    counters: Coll<Counter>,
    request_id: &RequestId,
) -> Result<Json<Created>> {
    let name = spec.validated_name()?;
    let id = Counter::next(&counters, CounterId::Elections).await?;
    elections.insert_one(Election::new(id, name), None).await?;

    info!("{request_id} Admin '{}' created election {id}", token.admin_id);
    Ok(Json(Created { id }))
}

#[put("/admin/elections/<election_id>", data = "<spec>", format = "json")]
async fn rename_election(
    _token: AuthToken,
    election_id: ElectionId,
    spec: Json<ElectionSpec>,
    elections: Coll<Election>,
    request_id: &RequestId,
) -> Result<()> {
    let election = find_election(&elections, election_id).await?;
    let name = spec.validated_name()?;
    if !election.status.renamable() {
        return Err(Error::InvalidState(format!(
            "Election {election_id} cannot be renamed while it is {}",
            election.status
        )));
    }

    // Re-check the status in the update itself, in case it was started meanwhile.
    let filter = doc! {
        "_id": election_id,
        "status": { "$ne": ElectionStatus::Running },
    };
    let update = doc! {
        "$set": { "name": &name },
    };
    let result = elections.update_one(filter, update, None).await?;
    if result.matched_count == 0 {
        return Err(Error::InvalidState(format!(
            "Election {election_id} cannot be renamed while it is running"
        )));
    }

    info!("{request_id} Renamed election {election_id} to '{name}'");
    Ok(())
}

#[post("/admin/elections/<election_id>/start")]
async fn start_election(
    _token: AuthToken,
    election_id: ElectionId,
    elections: Coll<Election>,
    request_id: &RequestId,
) -> Result<()> {
    apply_transition(&elections, election_id, Transition::Start, request_id).await
}

#[post("/admin/elections/<election_id>/stop")]
async fn stop_election(
    _token: AuthToken,
    election_id: ElectionId,
    elections: Coll<Election>,
    request_id: &RequestId,
) -> Result<()> {
    apply_transition(&elections, election_id, Transition::Stop, request_id).await
}

#[post("/admin/elections/<election_id>/reset")]
async fn reset_election(
    _token: AuthToken,
    election_id: ElectionId,
    elections: Coll<Election>,
    votes: Coll<Vote>,
    db_client: &State<Client>,
    request_id: &RequestId,
) -> Result<()> {
    // Atomically discard the votes and rewind the election. Dropping the
    // session without committing aborts the transaction.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let filter = doc! {
        "_id": election_id,
        "status": Transition::Reset.source_filter(),
    };
    let result = elections
        .update_one_with_session(filter, transition_update(Transition::Reset), None, &mut session)
        .await?;
    if result.matched_count == 0 {
        return Err(Error::not_found(format!("Election {election_id}")));
    }

    let deleted = votes
        .delete_many_with_session(doc! { "election_id": election_id }, None, &mut session)
        .await?;

    session.commit_transaction().await?;

    info!(
        "{request_id} Reset election {election_id}, discarding {} votes",
        deleted.deleted_count
    );
    Ok(())
}

#[delete("/admin/elections/<election_id>")]
async fn delete_election(
    _token: AuthToken,
    election_id: ElectionId,
    elections: Coll<Election>,
    parties: Coll<Party>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    db_client: &State<Client>,
    request_id: &RequestId,
) -> Result<()> {
    find_election(&elections, election_id).await?;

    // Atomically delete the election, its roster and its votes.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let in_election = doc! { "election_id": election_id };
    let vote_count = votes
        .count_documents_with_session(in_election.clone(), None, &mut session)
        .await?;
    if vote_count > 0 {
        return Err(Error::Conflict(format!(
            "Election {election_id} has {vote_count} votes; reset it before deleting"
        )));
    }

    let result = elections
        .delete_one_with_session(u32_id_filter(election_id), None, &mut session)
        .await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!("Election {election_id}")));
    }
    parties
        .delete_many_with_session(in_election.clone(), None, &mut session)
        .await?;
    candidates
        .delete_many_with_session(in_election.clone(), None, &mut session)
        .await?;
    // Catches votes cast since the count above.
    votes
        .delete_many_with_session(in_election, None, &mut session)
        .await?;

    session.commit_transaction().await?;

    info!("{request_id} Deleted election {election_id}");
    Ok(())
}

#[post("/admin/parties", data = "<spec>", format = "json")]
async fn add_party(
    _token: AuthToken,
    spec: Json<PartySpec>,
    elections: Coll<Election>,
    parties: Coll<Party>,
    counters: Coll<Counter>,
    request_id: &RequestId,
) -> Result<Json<Created>> {
    let spec = spec.into_inner().validated()?;
    let election = find_election(&elections, spec.election_id).await?;
    ensure_roster_open(&election)?;

    let id = Counter::next(&counters, CounterId::Parties).await?;
    let party = spec.into_party(id);
    match parties.insert_one(&party, None).await {
        Ok(_) => {}
        // The partial unique index only covers active parties.
        Err(e) if is_duplicate_key_error(&e) => {
            return Err(Error::Conflict(format!(
                "Election {} already has an active party with code '{}'",
                party.election_id, party.code
            )))
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        "{request_id} Added party {id} '{}' to election {}",
        party.code, party.election_id
    );
    Ok(Json(Created { id }))
}

#[post("/admin/candidates", data = "<spec>", format = "json")]
async fn add_candidate(
    _token: AuthToken,
    spec: Json<CandidateSpec>,
    elections: Coll<Election>,
    parties: Coll<Party>,
    candidates: Coll<Candidate>,
    counters: Coll<Counter>,
    request_id: &RequestId,
) -> Result<Json<Created>> {
    let spec = spec.into_inner().validated()?;
    let election = find_election(&elections, spec.election_id).await?;
    ensure_roster_open(&election)?;

    let party_filter = doc! {
        "election_id": spec.election_id,
        "code": &spec.party_code,
        "active": true,
    };
    if parties.find_one(party_filter, None).await?.is_none() {
        return Err(Error::not_found(format!(
            "Active party '{}' in election {}",
            spec.party_code, spec.election_id
        )));
    }

    let id = Counter::next(&counters, CounterId::Candidates).await?;
    let candidate = spec.into_candidate(id);
    candidates.insert_one(&candidate, None).await?;

    info!(
        "{request_id} Added candidate {id} for party '{}' to election {}",
        candidate.party_code, candidate.election_id
    );
    Ok(Json(Created { id }))
}

#[delete("/admin/parties/<party_id>")]
async fn remove_party(
    _token: AuthToken,
    party_id: PartyId,
    parties: Coll<Party>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    request_id: &RequestId,
) -> Result<()> {
    let active_party = doc! {
        "_id": party_id,
        "active": true,
    };
    let party = parties
        .find_one(active_party.clone(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Active party {party_id}")))?;

    let vote_filter = doc! {
        "election_id": party.election_id,
        "party_code": &party.code,
    };
    let vote_count = votes.count_documents(vote_filter, None).await?;
    if vote_count > 0 {
        return Err(Error::Conflict(format!(
            "Party {party_id} has received {vote_count} votes"
        )));
    }

    let standing = candidates
        .count_documents(
            doc! {
                "election_id": party.election_id,
                "party_code": &party.code,
                "active": true,
            },
            None,
        )
        .await?;
    if standing > 0 {
        return Err(Error::Conflict(format!(
            "Party {party_id} still has {standing} active candidates"
        )));
    }

    deactivate(&parties, active_party, || format!("Active party {party_id}")).await?;

    info!(
        "{request_id} Removed party {party_id} '{}' from election {}",
        party.code, party.election_id
    );
    Ok(())
}

#[delete("/admin/candidates/<candidate_id>")]
async fn remove_candidate(
    _token: AuthToken,
    candidate_id: CandidateId,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    request_id: &RequestId,
) -> Result<()> {
    let active_candidate = doc! {
        "_id": candidate_id,
        "active": true,
    };
    let candidate = candidates
        .find_one(active_candidate.clone(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Active candidate {candidate_id}")))?;

    let vote_filter = doc! {
        "election_id": candidate.election_id,
        "candidate_id": candidate_id,
    };
    let vote_count = votes.count_documents(vote_filter, None).await?;
    if vote_count > 0 {
        return Err(Error::Conflict(format!(
            "Candidate {candidate_id} has received {vote_count} votes"
        )));
    }

    deactivate(&candidates, active_candidate, || {
        format!("Active candidate {candidate_id}")
    })
    .await?;

    info!(
        "{request_id} Removed candidate {candidate_id} from election {}",
        candidate.election_id
    );
    Ok(())
}

/// Move an election along the lifecycle, checking the source state both
/// up front (for a helpful error) and in the update (to stay correct under
/// concurrent transitions).
async fn apply_transition(
    elections: &Coll<Election>,
    election_id: ElectionId,
    transition: Transition,
    request_id: &RequestId,
) -> Result<()> {
    let election = find_election(elections, election_id).await?;
    let target = transition.apply(election.status).ok_or_else(|| {
        Error::InvalidState(format!(
            "Cannot {transition} election {election_id} while it is {}",
            election.status
        ))
    })?;

    let filter = doc! {
        "_id": election_id,
        "status": transition.source_filter(),
    };
    let result = elections
        .update_one(filter, transition_update(transition), None)
        .await?;
    if result.matched_count == 0 {
        return Err(Error::InvalidState(format!(
            "Election {election_id} changed state during {transition}"
        )));
    }

    info!(
        "{request_id} Election {election_id}: {} -> {target}",
        election.status
    );
    Ok(())
}

/// The update that records `transition` on an election document.
fn transition_update(transition: Transition) -> Document {
    let status = transition.target();
    match transition {
        Transition::Start => doc! {
            "$set": { "status": status, "started_at": DateTime::now() },
        },
        Transition::Stop => doc! {
            "$set": { "status": status, "ended_at": DateTime::now() },
        },
        Transition::Reset => doc! {
            "$set": { "status": status, "started_at": Bson::Null, "ended_at": Bson::Null },
        },
    }
}

fn ensure_roster_open(election: &Election) -> Result<()> {
    if election.status.roster_open() {
        Ok(())
    } else {
        Err(Error::Conflict(format!(
            "Election {} has ended; its roster is closed",
            election.id
        )))
    }
}

/// Soft-delete the roster entry matching `filter`.
async fn deactivate<T>(
    coll: &Coll<T>,
    filter: Document,
    describe: impl FnOnce() -> String,
) -> Result<()> {
    let update = doc! {
        "$set": { "active": false },
    };
    let result = coll.update_one(filter, update, None).await?;
    if result.matched_count == 0 {
        // Removed concurrently.
        return Err(Error::NotFound(describe()));
    }
    Ok(())
}
