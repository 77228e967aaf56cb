use mongodb::{
    bson::{doc, Document},
    options::{FindOptions, SessionOptions},
    Client,
};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        election::ElectionSummary,
        results::ElectionResults,
        roster::{CandidateDescription, PartyDescription, Roster},
    },
    common::election::{ElectionId, ElectionStatus},
    db::{candidate::Candidate, election::Election, party::Party, vote::Vote},
    mongodb::{u32_id_filter, Coll},
};

use super::find_election;

pub fn routes() -> Vec<Route> {
    routes![elections, roster, results]
}

#[get("/elections?<status>")]
async fn elections(
    status: Option<ElectionStatus>,
    elections: Coll<Election>,
) -> Result<Json<Vec<ElectionSummary>>> {
    let elections = newest_elections(&elections, status).await?;
    Ok(Json(elections.into_iter().map(Into::into).collect()))
}

#[get("/elections/<election_id>/roster")]
async fn roster(
    election_id: ElectionId,
    elections: Coll<Election>,
    parties: Coll<Party>,
    candidates: Coll<Candidate>,
) -> Result<Json<Roster>> {
    find_election(&elections, election_id).await?;

    let active = doc! {
        "election_id": election_id,
        "active": true,
    };
    let by_id = FindOptions::builder().sort(doc! { "_id": 1 }).build();
    let parties = parties
        .find(active.clone(), by_id.clone())
        .await?
        .map_ok(PartyDescription::from)
        .try_collect::<Vec<_>>()
        .await?;
    let candidates = candidates
        .find(active, by_id)
        .await?
        .map_ok(CandidateDescription::from)
        .try_collect::<Vec<_>>()
        .await?;

    Ok(Json(Roster {
        election_id,
        parties,
        candidates,
    }))
}

#[get("/elections/<election_id>/results")]
async fn results(
    election_id: ElectionId,
    elections: Coll<Election>,
    parties: Coll<Party>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    db_client: &State<Client>,
) -> Result<Json<ElectionResults>> {
    // Ensure we read a consistent snapshot of the election data.
    let session_options = SessionOptions::builder().snapshot(true).build();
    let mut session = db_client.start_session(Some(session_options)).await?;

    let election = elections
        .find_one_with_session(u32_id_filter(election_id), None, &mut session)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    if !election.status.results_available() {
        return Err(Error::Forbidden(format!(
            "Results for election {election_id} are not available until it has ended"
        )));
    }

    let in_election = doc! { "election_id": election_id };
    let mut party_cursor = parties
        .find_with_session(in_election.clone(), None, &mut session)
        .await?;
    let mut all_parties = Vec::new();
    while let Some(party) = party_cursor.next(&mut session).await {
        all_parties.push(party?);
    }

    let active = doc! {
        "election_id": election_id,
        "active": true,
    };
    let mut candidate_cursor = candidates
        .find_with_session(active, None, &mut session)
        .await?;
    let mut active_candidates = Vec::new();
    while let Some(candidate) = candidate_cursor.next(&mut session).await {
        active_candidates.push(candidate?);
    }

    let mut vote_cursor = votes
        .find_with_session(in_election, None, &mut session)
        .await?;
    let mut chosen = Vec::new();
    while let Some(vote) = vote_cursor.next(&mut session).await {
        chosen.push(vote?.candidate_id);
    }

    Ok(Json(ElectionResults::tabulate(
        election_id,
        all_parties,
        active_candidates,
        chosen,
    )))
}

/// Elections, newest first, optionally restricted to one status.
/// Ended elections are ordered by when they finished.
pub(super) async fn newest_elections(
    elections: &Coll<Election>,
    status: Option<ElectionStatus>,
) -> Result<Vec<Election>> {
    let filter = match status {
        Some(status) => doc! { "status": status },
        None => Document::new(),
    };
    let sort = match status {
        Some(ElectionStatus::Ended) => doc! { "ended_at": -1, "_id": -1 },
        _ => doc! { "created_at": -1, "_id": -1 },
    };
    let newest_first = FindOptions::builder().sort(sort).build();
    let elections = elections
        .find(filter, newest_first)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    Ok(elections)
}
