//! Loose identifier resolution.
//!
//! Librarians type "a book" or "a member" as whatever they have at hand: a
//! numeric id, an ISBN or roll, or part of a title or name. The resolver tries
//! a fixed list of strategies in order and stops at the first hit:
//!
//! 1. [`Strategy::NumericId`]: the token parses as an integer and a record has that id.
//! 2. [`Strategy::ExactKey`]: the token equals a unique key (ISBN, roll).
//! 3. [`Strategy::Substring`]: the token occurs, ignoring case, in a title or
//!    name. The first record in ascending id order wins.
//!
//! A numeric id hit wins even when the same token would also match another
//! record's key or title.

use crate::{
    catalog::CatalogIndex,
    error::{AppError, AppResult},
    members::MemberDirectory,
    models::{book::BookRecord, member::MemberRecord},
};

/// A record source the resolver can search
pub trait Resolvable {
    type Record;

    fn by_id(&self, id: i32) -> Option<&Self::Record>;

    fn by_key(&self, key: &str) -> Option<&Self::Record>;

    /// Enumeration used by the substring stage. Must be stable.
    fn records(&self) -> Box<dyn Iterator<Item = &Self::Record> + '_>;

    /// Text matched by the substring stage
    fn label(record: &Self::Record) -> &str;
}

impl Resolvable for CatalogIndex {
    type Record = BookRecord;

    fn by_id(&self, id: i32) -> Option<&BookRecord> {
        self.lookup_by_id(id)
    }

    fn by_key(&self, key: &str) -> Option<&BookRecord> {
        self.lookup(key)
    }

    fn records(&self) -> Box<dyn Iterator<Item = &BookRecord> + '_> {
        Box::new(self.iter_by_id())
    }

    fn label(record: &BookRecord) -> &str {
        &record.title
    }
}

impl Resolvable for MemberDirectory {
    type Record = MemberRecord;

    fn by_id(&self, id: i32) -> Option<&MemberRecord> {
        self.get(id)
    }

    fn by_key(&self, key: &str) -> Option<&MemberRecord> {
        self.by_roll(key)
    }

    fn records(&self) -> Box<dyn Iterator<Item = &MemberRecord> + '_> {
        Box::new(self.iter())
    }

    fn label(record: &MemberRecord) -> &str {
        &record.name
    }
}

/// One way of interpreting a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NumericId,
    ExactKey,
    Substring,
}

impl Strategy {
    pub fn apply<'a, S: Resolvable>(self, source: &'a S, token: &str) -> Option<&'a S::Record> {
        match self {
            Strategy::NumericId => token.parse::<i32>().ok().and_then(|id| source.by_id(id)),
            Strategy::ExactKey => source.by_key(token),
            Strategy::Substring => {
                let needle = token.to_lowercase();
                source
                    .records()
                    .find(|r| S::label(r).to_lowercase().contains(&needle))
            }
        }
    }
}

/// Default precedence
pub const PRECEDENCE: [Strategy; 3] = [Strategy::NumericId, Strategy::ExactKey, Strategy::Substring];

#[derive(Debug, Clone)]
pub struct IdentifierResolver {
    strategies: Vec<Strategy>,
}

impl Default for IdentifierResolver {
    fn default() -> Self {
        Self::with_strategies(&PRECEDENCE)
    }
}

impl IdentifierResolver {
    pub fn with_strategies(strategies: &[Strategy]) -> Self {
        Self {
            strategies: strategies.to_vec(),
        }
    }

    /// Resolve a token, reporting which strategy matched. Blank tokens match nothing.
    pub fn resolve<'a, S: Resolvable>(&self, source: &'a S, token: &str) -> Option<(Strategy, &'a S::Record)> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        self.strategies.iter().find_map(|strategy| {
            strategy.apply(source, token).map(|record| {
                tracing::debug!(token, ?strategy, "Resolved identifier");
                (*strategy, record)
            })
        })
    }

    pub fn resolve_book<'a>(&self, catalog: &'a CatalogIndex, token: &str) -> AppResult<&'a BookRecord> {
        self.resolve(catalog, token)
            .map(|(_, book)| book)
            .ok_or_else(|| AppError::BookNotFound(token.trim().to_string()))
    }

    pub fn resolve_member<'a>(&self, members: &'a MemberDirectory, token: &str) -> AppResult<&'a MemberRecord> {
        self.resolve(members, token)
            .map(|(_, member)| member)
            .ok_or_else(|| AppError::MemberNotFound(token.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{book::NewBook, member::NewMember};

    fn catalog() -> CatalogIndex {
        let mut catalog = CatalogIndex::default();
        catalog.insert(&NewBook::new("9780000000001", "Dune")).unwrap();
        catalog.insert(&NewBook::new("9780000000002", "Catch-22")).unwrap();
        catalog.insert(&NewBook::new("42", "Hitchhiker")).unwrap();
        catalog.insert(&NewBook::new("9780000000004", "Dune Messiah")).unwrap();
        catalog
    }

    #[test]
    fn test_numeric_id_wins() {
        let catalog = catalog();
        let resolver = IdentifierResolver::default();

        let (strategy, book) = resolver.resolve(&catalog, "2").unwrap();
        assert_eq!(strategy, Strategy::NumericId);
        assert_eq!(book.title, "Catch-22");
    }

    #[test]
    fn test_numeric_miss_falls_through() {
        let mut catalog = catalog();
        catalog.insert(&NewBook::new("9780000000005", "Answer 42")).unwrap();
        let resolver = IdentifierResolver::default();

        // No id 42, but the ISBN "42" exists
        let (strategy, book) = resolver.resolve(&catalog, "42").unwrap();
        assert_eq!(strategy, Strategy::ExactKey);
        assert_eq!(book.title, "Hitchhiker");

        // No id, no key: the title substring matches
        let (strategy, book) = resolver.resolve(&catalog, "22").unwrap();
        assert_eq!(strategy, Strategy::Substring);
        assert_eq!(book.title, "Catch-22");
    }

    #[test]
    fn test_id_beats_title_containing_token() {
        let mut catalog = CatalogIndex::default();
        for n in 1..=42 {
            catalog.insert(&NewBook::new(format!("isbn-{n}"), format!("Volume {n}"))).unwrap();
        }
        catalog.insert(&NewBook::new("isbn-x", "42 Stories")).unwrap();

        let book = IdentifierResolver::default().resolve_book(&catalog, "42").unwrap();
        assert_eq!(book.title, "Volume 42");
    }

    #[test]
    fn test_substring_takes_lowest_id() {
        let catalog = catalog();
        let book = IdentifierResolver::default().resolve_book(&catalog, " dUNe ").unwrap();
        assert_eq!(book.id, 1);
    }

    #[test]
    fn test_not_found() {
        let catalog = catalog();
        let resolver = IdentifierResolver::default();
        assert!(matches!(
            resolver.resolve_book(&catalog, "Neuromancer"),
            Err(AppError::BookNotFound(_))
        ));
        assert!(resolver.resolve(&catalog, "   ").is_none());
    }

    #[test]
    fn test_strategies_in_isolation() {
        let catalog = catalog();
        assert!(Strategy::NumericId.apply(&catalog, "Dune").is_none());
        assert!(Strategy::ExactKey.apply(&catalog, "Dune").is_none());
        assert_eq!(Strategy::Substring.apply(&catalog, "Messiah").unwrap().id, 4);

        let key_only = IdentifierResolver::with_strategies(&[Strategy::ExactKey]);
        assert!(key_only.resolve(&catalog, "1").is_none());
    }

    #[test]
    fn test_members() {
        let mut members = MemberDirectory::new();
        members.insert(&NewMember::new("Asha Rao").roll("CS-01")).unwrap();
        members.insert(&NewMember::new("Ben Rao").roll("1")).unwrap();
        let resolver = IdentifierResolver::default();

        assert_eq!(resolver.resolve_member(&members, "1").unwrap().name, "Asha Rao");
        assert_eq!(resolver.resolve_member(&members, "CS-01").unwrap().id, 1);
        assert_eq!(resolver.resolve_member(&members, "ben").unwrap().id, 2);
        assert_eq!(resolver.resolve_member(&members, "rao").unwrap().id, 1);
        assert!(matches!(
            resolver.resolve_member(&members, "Zed"),
            Err(AppError::MemberNotFound(_))
        ));
    }
}
