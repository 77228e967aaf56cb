use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar},
    serde::json::Json,
    Route, State,
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::RequestId;
use crate::model::{
    api::{
        admin::{AdminCredentials, CredentialsChange},
        auth::{AuthResponse, AuthToken, AUTH_TOKEN_COOKIE},
    },
    db::admin::Admin,
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![admin_login, logout, change_credentials]
}

#[post("/auth/admin", data = "<credentials>", format = "json")]
pub async fn admin_login(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
    config: &State<Config>,
    request_id: &RequestId,
) -> Result<Json<AuthResponse>> {
    let admin = authenticate(&admins, &credentials.admin_id, &credentials.password).await?;

    let token = AuthToken::new(&admin).encode(config)?;
    cookies.add(AuthToken::cookie(token.clone(), config));

    info!("{request_id} Admin '{}' logged in", admin.admin_id);
    Ok(Json(AuthResponse { token }))
}

#[delete("/auth")]
pub async fn logout(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
}

/// The old password is the proof of identity here, so no token is needed.
#[put("/auth/admin/credentials", data = "<change>", format = "json")]
pub async fn change_credentials(
    change: Json<CredentialsChange>,
    admins: Coll<Admin>,
    request_id: &RequestId,
) -> Result<()> {
    let change = change.into_inner();
    let admin = authenticate(&admins, &change.admin_id, &change.old_password).await?;

    let updated = Admin::try_from(AdminCredentials {
        admin_id: admin.admin_id,
        password: change.new_password,
    })?;
    let update = doc! {
        "$set": { "password_hash": &updated.password_hash },
    };
    admins
        .update_one(doc! { "_id": &updated.admin_id }, update, None)
        .await?;

    info!("{request_id} Admin '{}' changed their password", updated.admin_id);
    Ok(())
}

/// Find the admin with these credentials. Unknown IDs and wrong passwords
/// are indistinguishable to the caller.
async fn authenticate(admins: &Coll<Admin>, admin_id: &str, password: &str) -> Result<Admin> {
    let admin = admins
        .find_one(doc! { "_id": admin_id.trim() }, None)
        .await?;
    match admin {
        Some(admin) if admin.verify_password(password)? => Ok(admin),
        _ => Err(Error::Unauthorized(
            "Invalid admin ID or password".to_string(),
        )),
    }
}
