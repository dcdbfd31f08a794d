//! Member management service

use crate::{
    error::{AppError, AppResult},
    models::member::{MemberLoanCount, MemberRecord, NewMember},
    repository::Change,
    resolver::IdentifierResolver,
};

use super::Context;

#[derive(Clone)]
pub struct MembersService {
    context: Context,
    resolver: IdentifierResolver,
}

impl MembersService {
    pub(crate) fn new(context: Context) -> Self {
        Self {
            context,
            resolver: IdentifierResolver::default(),
        }
    }

    /// Add a member, or update the one already holding the same roll
    pub async fn save_member(&self, member: NewMember) -> AppResult<MemberRecord> {
        let mut state = self.context.lock().await;
        let record = state.members.prepare_upsert(&member)?;

        self.context.commit(vec![Change::PutMember(record.clone())]).await?;
        state.members.save(record.clone())?;

        tracing::info!(id = record.id, "Member saved");
        Ok(record)
    }

    pub async fn update_member(&self, id: i32, member: NewMember) -> AppResult<MemberRecord> {
        let mut state = self.context.lock().await;
        let record = state.members.prepare_update(id, &member)?;

        self.context.commit(vec![Change::PutMember(record.clone())]).await?;
        state.members.save(record.clone())?;

        tracing::info!(id, "Member updated");
        Ok(record)
    }

    /// Remove a member. Refused while they still hold books.
    pub async fn delete_member(&self, id: i32) -> AppResult<MemberRecord> {
        let mut state = self.context.lock().await;
        if state.members.get(id).is_none() {
            return Err(AppError::MemberNotFound(id.to_string()));
        }
        if state.ledger.member_has_open_loans(id) {
            tracing::warn!(id, "Delete refused, member has open loans");
            return Err(AppError::HasOpenLoans(format!("member {id}")));
        }

        self.context.commit(vec![Change::DeleteMember(id)]).await?;
        let removed = state.members.delete(id)?;

        tracing::info!(id, "Member deleted");
        Ok(removed)
    }

    pub async fn get_member(&self, id: i32) -> Option<MemberRecord> {
        self.context.lock().await.members.get(id).cloned()
    }

    /// Resolve a loosely typed token (id, roll or part of a name)
    pub async fn find_member(&self, token: &str) -> AppResult<MemberRecord> {
        let state = self.context.lock().await;
        self.resolver.resolve_member(&state.members, token).cloned()
    }

    /// Members in registration order
    pub async fn list_members(&self) -> Vec<MemberRecord> {
        self.context.lock().await.members.iter().cloned().collect()
    }

    /// Members currently holding at least one book, with how many
    pub async fn members_with_loans(&self) -> Vec<MemberLoanCount> {
        let state = self.context.lock().await;
        state
            .ledger
            .open_counts_by_member()
            .into_iter()
            .filter_map(|(id, open_loans)| {
                state.members.get(id).map(|member| MemberLoanCount {
                    member: member.clone(),
                    open_loans,
                })
            })
            .collect()
    }
}
