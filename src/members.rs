//! Member directory

use std::collections::HashMap;

use indexmap::IndexMap;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        id_after,
        member::{MemberRecord, NewMember},
    },
};

/// In-memory borrower store. Enumerates in insertion order and keeps rolls unique.
#[derive(Debug, Clone, Default)]
pub struct MemberDirectory {
    members: IndexMap<i32, MemberRecord>,
    rolls: HashMap<String, i32>,
    next_id: i32,
}

impl MemberDirectory {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: i32) -> Option<&MemberRecord> {
        self.members.get(&id)
    }

    pub fn by_roll(&self, roll: &str) -> Option<&MemberRecord> {
        self.rolls.get(roll).and_then(|id| self.members.get(id))
    }

    /// Members in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &MemberRecord> + '_ {
        self.members.values()
    }

    fn ensure_roll_free(&self, roll: Option<&str>, owner: Option<i32>) -> AppResult<()> {
        match roll.and_then(|r| self.rolls.get(r)) {
            Some(&id) if Some(id) != owner => Err(AppError::DuplicateKey(format!(
                "Roll {} already belongs to member {}",
                roll.unwrap_or_default(),
                id
            ))),
            _ => Ok(()),
        }
    }

    /// Build the record `insert` would store
    pub fn prepare_insert(&self, member: &NewMember) -> AppResult<MemberRecord> {
        member.validate()?;
        self.ensure_roll_free(member.roll.as_deref(), None)?;

        Ok(MemberRecord {
            id: self.next_id.max(1),
            name: member.name.clone(),
            roll: member.roll.clone(),
            email: member.email.clone(),
            phone: member.phone.clone(),
        })
    }

    /// Build the record `update` would store
    pub fn prepare_update(&self, id: i32, member: &NewMember) -> AppResult<MemberRecord> {
        member.validate()?;
        if !self.members.contains_key(&id) {
            return Err(AppError::MemberNotFound(id.to_string()));
        }
        self.ensure_roll_free(member.roll.as_deref(), Some(id))?;

        Ok(MemberRecord {
            id,
            name: member.name.clone(),
            roll: member.roll.clone(),
            email: member.email.clone(),
            phone: member.phone.clone(),
        })
    }

    /// Update the member holding the same roll, or add a new one
    pub fn prepare_upsert(&self, member: &NewMember) -> AppResult<MemberRecord> {
        match member.roll.as_deref().and_then(|r| self.by_roll(r)) {
            Some(existing) => self.prepare_update(existing.id, member),
            None => self.prepare_insert(member),
        }
    }

    pub fn insert(&mut self, member: &NewMember) -> AppResult<MemberRecord> {
        let record = self.prepare_insert(member)?;
        self.save(record.clone())?;
        Ok(record)
    }

    pub fn update(&mut self, id: i32, member: &NewMember) -> AppResult<MemberRecord> {
        let record = self.prepare_update(id, member)?;
        self.save(record.clone())?;
        Ok(record)
    }

    /// Insert or replace a record by id, keeping its position when replaced
    pub fn save(&mut self, record: MemberRecord) -> AppResult<()> {
        self.ensure_roll_free(record.roll.as_deref(), Some(record.id))?;
        let next_id = id_after(record.id)?;

        if let Some(previous) = self.members.get(&record.id).and_then(|m| m.roll.clone()) {
            self.rolls.remove(&previous);
        }
        if let Some(roll) = &record.roll {
            self.rolls.insert(roll.clone(), record.id);
        }
        self.next_id = self.next_id.max(next_id);
        self.members.insert(record.id, record);
        Ok(())
    }

    /// Keep ids below `next_id` from being handed out again
    pub fn reserve_ids(&mut self, next_id: i32) {
        self.next_id = self.next_id.max(next_id);
    }

    pub fn delete(&mut self, id: i32) -> AppResult<MemberRecord> {
        let removed = self
            .members
            .shift_remove(&id)
            .ok_or_else(|| AppError::MemberNotFound(id.to_string()))?;
        if let Some(roll) = &removed.roll {
            self.rolls.remove(roll);
        }
        Ok(removed)
    }
}
