use crate::client::RemoteClient;
use crate::errors::{ApiError, ApiResult};
use crate::models::{Member, MemberId, MemberPayload};
use crate::query::{PageView, QueryState};
use crate::store::MemberStore;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Answer to the "are you sure?" prompt that guards deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// Runs member writes against the backend and reconciles the answers into
/// the local store.
///
/// The store is only touched after the server confirmed a write, and the
/// lock is never held across a request, so a failed call leaves the cached
/// collection exactly as it was. Results commit in the order responses
/// arrive, which is not necessarily the order requests were issued.
pub struct MemberDirectory {
    client: RemoteClient,
    store: Mutex<MemberStore>,
}

impl MemberDirectory {
    pub fn new(client: RemoteClient) -> Self {
        Self {
            client,
            store: Mutex::new(MemberStore::new()),
        }
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }

    pub async fn read<R>(&self, f: impl FnOnce(&MemberStore) -> R) -> R {
        let store = self.store.lock().await;
        f(&store)
    }

    pub async fn members(&self) -> Vec<Member> {
        self.read(|store| store.list().to_vec()).await
    }

    pub async fn get(&self, id: MemberId) -> Option<Member> {
        self.read(|store| store.get(id).cloned()).await
    }

    pub async fn page(&self, query: &mut QueryState) -> PageView {
        self.read(|store| query.apply(store.list())).await
    }

    /// Fetches the whole collection and replaces the cache with it.
    pub async fn reload(&self) -> ApiResult<usize> {
        let ticket = self.store.lock().await.begin_reload();
        let members = self.client.list_members().await.inspect_err(|err| {
            warn!("member reload failed: {err}");
        })?;

        let count = members.len();
        let mut store = self.store.lock().await;
        if store.finish_reload(ticket, members) {
            info!(count, "member list reloaded");
        } else {
            debug!("discarding superseded member reload");
        }
        Ok(store.len())
    }

    /// Forgets the cached collection, e.g. when the session ends.
    pub async fn forget(&self) {
        self.store.lock().await.reset();
    }

    pub async fn ensure_loaded(&self) -> ApiResult<()> {
        if !self.read(MemberStore::is_loaded).await {
            self.reload().await?;
        }
        Ok(())
    }

    pub async fn create(&self, payload: &MemberPayload) -> ApiResult<Member> {
        payload.validate().map_err(ApiError::ValidationFailed)?;

        let created = self.client.create_member(payload).await.inspect_err(|err| {
            warn!("member create failed: {err}");
        })?;
        info!(id = %created.id, "member created");
        self.store.lock().await.upsert(created.clone());
        Ok(created)
    }

    pub async fn update(&self, id: MemberId, payload: &MemberPayload) -> ApiResult<Member> {
        payload.validate().map_err(ApiError::ValidationFailed)?;

        let updated = self.client.replace_member(id, payload).await.inspect_err(|err| {
            warn!(%id, "member update failed: {err}");
        })?;
        info!(%id, "member updated");
        self.reconcile(updated.clone()).await;
        Ok(updated)
    }

    /// Flips the active flag with a partial patch. The boolean flip needs no
    /// local validation.
    pub async fn toggle_active(&self, member: &Member) -> ApiResult<Member> {
        let id = member.id;
        let updated = self
            .client
            .set_member_active(id, !member.is_active)
            .await
            .inspect_err(|err| warn!(%id, "member toggle failed: {err}"))?;
        info!(%id, is_active = updated.is_active, "member active flag changed");
        self.reconcile(updated.clone()).await;
        Ok(updated)
    }

    pub async fn delete(&self, id: MemberId, confirmation: Confirmation) -> ApiResult<DeleteOutcome> {
        if confirmation == Confirmation::Declined {
            debug!(%id, "member delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        self.client
            .delete_member(id)
            .await
            .inspect_err(|err| warn!(%id, "member delete failed: {err}"))?;
        info!(%id, "member deleted");
        self.store.lock().await.remove(id);
        Ok(DeleteOutcome::Deleted)
    }

    /// Applies an update answer only while the member is still cached; an
    /// answer for a member deleted or reloaded away meanwhile is dropped.
    async fn reconcile(&self, member: Member) {
        let mut store = self.store.lock().await;
        if store.contains(member.id) {
            store.upsert(member);
        } else {
            debug!(id = %member.id, "ignoring result for member no longer cached");
        }
    }
}
