use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use powerbot_core::ChatMessage;
use powerbot_economy::AwardOutcome;
use powerbot_identity::{IdentityResolver, ResolvedIdentity};
use rusqlite::Connection;
use tracing::{debug, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Awards message-earning points for every fresh chat message (the Chat
/// Listener already dedups by `source_id` before a handler ever sees it).
/// Each message resolves its author to an Identity first, then awards
/// against that identity's numeric user id, idempotent on `source_id`.
pub struct EconomyMessageHandler {
    db: Arc<Mutex<Connection>>,
    resolver: Arc<IdentityResolver>,
    platform: String,
    scope_id: String,
    scope_guild_id: u64,
    amount: f64,
    interval_seconds: i64,
    data_root: PathBuf,
}

impl EconomyMessageHandler {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        data_root: &powerbot_core::DataRoot,
        platform: String,
        scope_id: String,
        amount: f64,
        interval_seconds: i64,
    ) -> Self {
        let resolver = Arc::new(IdentityResolver::new(db.clone()));
        let scope_guild_id = scope_id.parse().unwrap_or(0);
        Self {
            db,
            resolver,
            platform,
            scope_id,
            scope_guild_id,
            amount,
            interval_seconds,
            data_root: data_root.root().to_path_buf(),
        }
    }
}

/// Resolves the author and awards points on a blocking thread: both
/// `IdentityResolver::resolve` and `award_message_points` make synchronous
/// `rusqlite` calls and must not run on the pump's cooperative task (§5).
/// The award itself runs inside one `begin_immediate` transaction so two
/// messages for the same identity never interleave their credit (§4.1).
fn resolve_and_award(
    db: Arc<Mutex<Connection>>,
    resolver: Arc<IdentityResolver>,
    platform: String,
    scope_id: String,
    amount: f64,
    interval_seconds: i64,
    author_external_id: String,
    author_display_name: String,
    source_id: String,
) -> Result<(i64, bool, AwardOutcome), BoxError> {
    let resolved = resolver.resolve(&platform, &author_external_id, &author_display_name)?;
    let user_id = resolved.identity().user_id;
    let newly_created = matches!(resolved, ResolvedIdentity::NewlyCreated(_));

    let mut conn = db.lock().unwrap();
    let outcome = powerbot_store::begin_immediate(&mut conn, |tx| {
        powerbot_economy::award_message_points(
            tx,
            &platform,
            user_id,
            &scope_id,
            amount,
            interval_seconds,
            Some(source_id.as_str()),
        )
    })?;

    Ok((user_id, newly_created, outcome))
}

#[async_trait]
impl powerbot_chatlistener::MessageHandler for EconomyMessageHandler {
    async fn handle(&self, message: &ChatMessage) -> Result<(), BoxError> {
        let db = self.db.clone();
        let resolver = self.resolver.clone();
        let platform = self.platform.clone();
        let scope_id = self.scope_id.clone();
        let amount = self.amount;
        let interval_seconds = self.interval_seconds;
        let author_external_id = message.author_external_id.clone();
        let author_display_name = message.author_display_name.clone();
        let source_id = message.source_id.clone();

        let (user_id, newly_created, outcome) = tokio::task::spawn_blocking(move || {
            resolve_and_award(
                db,
                resolver,
                platform,
                scope_id,
                amount,
                interval_seconds,
                author_external_id,
                author_display_name,
                source_id,
            )
        })
        .await
        .map_err(|e| Box::new(e) as BoxError)??;

        if newly_created {
            debug!(user_id, "auto-created identity for chat message author");
        }

        if !outcome.awarded {
            return Ok(());
        }
        debug!(
            user_id,
            points_added = outcome.points_added,
            new_total = outcome.new_total,
            "awarded message points"
        );

        if let Some(new_total) = outcome.new_total {
            let guild_path = powerbot_progress::store::guild_state_path(&self.data_root, self.scope_guild_id);
            let mut state = powerbot_progress::store::load(&guild_path);
            let previous_balance = new_total - outcome.points_added;
            let result = powerbot_progress::update(&mut state, &user_id.to_string(), previous_balance, new_total);
            if let Err(e) = powerbot_progress::store::save(&guild_path, &state) {
                warn!(error = %e, "failed to persist progress state");
            }
            if !result.is_empty() {
                debug!(
                    user_id,
                    milestones_reached = ?result.milestones_reached,
                    bankrupt = result.bankrupt,
                    "progress outcome"
                );
            }
        }

        Ok(())
    }
}
