use axum::http::{HeaderMap, StatusCode};
use domain::Actor;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use storage::Db;

type HmacSha256 = Hmac<Sha256>;

// Actor Token 格式: "<actor_id>.<hex(hmac_sha256(actor_id))>"
// 签名只证明身份，角色以账号表为准（角色可能被升降）

pub fn sign_actor_token(actor_id: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(actor_id.as_bytes());
    format!("{}.{}", actor_id, hex::encode(mac.finalize().into_bytes()))
}

fn verify_token(token: &str, secret: &str) -> Option<String> {
    let (actor_id, sig_hex) = token.rsplit_once('.')?;
    let sig = hex::decode(sig_hex).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(actor_id.as_bytes());
    mac.verify_slice(&sig).ok()?;
    Some(actor_id.to_string())
}

pub async fn require_actor(
    headers: &HeaderMap,
    db: &Db,
    secret: &str,
) -> Result<Actor, (StatusCode, String)> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".to_string(),
        ))?;
    let token = auth_header.strip_prefix("Bearer ").ok_or((
        StatusCode::UNAUTHORIZED,
        "Expected Bearer token".to_string(),
    ))?;

    let actor_id = verify_token(token, secret)
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid actor token".to_string()))?;

    let account = db
        .get_account(&actor_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "Unknown actor".to_string()))?;
    if account.is_deactivated() {
        return Err((StatusCode::FORBIDDEN, "Account is deactivated".to_string()));
    }

    Ok(Actor {
        id: account.id,
        role: account.role,
    })
}
