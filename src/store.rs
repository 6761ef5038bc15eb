use crate::models::{Member, MemberId};
use std::cmp::Reverse;

/// Cached copy of the remote member collection, newest member first.
///
/// Identifiers are unique and the list is re-sorted by join timestamp
/// (descending, members without one last) after every insert.
#[derive(Debug, Default)]
pub struct MemberStore {
    members: Vec<Member>,
    loaded: bool,
    reload_generation: u64,
}

/// Handed out when a reload starts; only the most recent ticket may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket(u64);

impl MemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a full load has ever been committed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn replace_all(&mut self, members: Vec<Member>) {
        self.members.clear();
        for member in members {
            self.insert_or_replace(member);
        }
        self.sort();
        self.loaded = true;
    }

    pub fn upsert(&mut self, member: Member) {
        self.insert_or_replace(member);
        self.sort();
    }

    /// Returns the removed member; absent ids are a no-op.
    pub fn remove(&mut self, id: MemberId) -> Option<Member> {
        let index = self.members.iter().position(|member| member.id == id)?;
        Some(self.members.remove(index))
    }

    pub fn list(&self) -> &[Member] {
        &self.members
    }

    pub fn get(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }

    pub fn contains(&self, id: MemberId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Drops the cache and invalidates reloads still in flight.
    pub fn reset(&mut self) {
        self.members.clear();
        self.loaded = false;
        self.reload_generation = self.reload_generation.wrapping_add(1);
    }

    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.reload_generation = self.reload_generation.wrapping_add(1);
        ReloadTicket(self.reload_generation)
    }

    /// Installs a reload result unless a newer reload has started since the
    /// ticket was issued. Returns whether the result was applied.
    pub fn finish_reload(&mut self, ticket: ReloadTicket, members: Vec<Member>) -> bool {
        if ticket.0 != self.reload_generation {
            return false;
        }
        self.replace_all(members);
        true
    }

    fn insert_or_replace(&mut self, member: Member) {
        match self.members.iter_mut().find(|existing| existing.id == member.id) {
            Some(existing) => *existing = member,
            None => self.members.push(member),
        }
    }

    fn sort(&mut self) {
        // Stable sort: equal timestamps keep their relative order.
        self.members.sort_by_key(|member| Reverse(member.joined_at));
    }
}
