use domain::ModerationEvent;
use engine::{ModerationEngine, PublishService};
use std::sync::Arc;
use storage::Db;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub publish: Arc<PublishService>,
    pub moderation: Arc<ModerationEngine>,
    pub tx_events: broadcast::Sender<ModerationEvent>,
    pub token_secret: String,
}
