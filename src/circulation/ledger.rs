//! Circulation ledger: issue, return and loan projections

use chrono::{Days, NaiveDate};
use indexmap::IndexMap;

use crate::{
    catalog::CatalogIndex,
    config::CirculationConfig,
    error::{AppError, AppResult},
    members::MemberDirectory,
    models::{
        book::BookRecord,
        id_after,
        loan::{LoanRecord, ReturnReceipt},
    },
    resolver::IdentifierResolver,
};

/// A validated issue that has not been applied yet
#[derive(Debug, Clone)]
pub struct IssuePlan {
    pub loan: LoanRecord,
    /// The book as it will read once the copy is taken
    pub book: BookRecord,
}

/// A validated return that has not been applied yet
#[derive(Debug, Clone)]
pub struct ReturnPlan {
    /// The loan as it will read once closed
    pub loan: LoanRecord,
    pub book: BookRecord,
    pub receipt: ReturnReceipt,
}

/// Owns every loan record.
///
/// Books and members are referenced by id and looked up again in the catalog
/// and directory on every operation, so copy counts always change on the
/// canonical record. Each mutation comes in two halves: `plan_*` checks every
/// rule without side effects, `apply_*` commits. `issue` and `return_loan`
/// run both back to back.
#[derive(Debug, Clone)]
pub struct CirculationLedger {
    loans: IndexMap<i32, LoanRecord>,
    next_id: i32,
    config: CirculationConfig,
    resolver: IdentifierResolver,
}

impl CirculationLedger {
    pub fn new(config: CirculationConfig) -> Self {
        Self {
            loans: IndexMap::new(),
            next_id: 1,
            config,
            resolver: IdentifierResolver::default(),
        }
    }

    pub fn config(&self) -> &CirculationConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }

    pub fn get(&self, loan_id: i32) -> Option<&LoanRecord> {
        self.loans.get(&loan_id)
    }

    /// Loan length for a raw day offset.
    ///
    /// A missing or non-numeric offset silently falls back to the configured
    /// default. A negative number is an input error.
    pub fn loan_days(&self, day_offset: Option<&str>) -> AppResult<u64> {
        match day_offset.map(str::trim).and_then(|raw| raw.parse::<i64>().ok()) {
            None => Ok(self.config.default_loan_days.max(0) as u64),
            Some(days) if days < 0 => Err(AppError::Validation(format!(
                "Loan length cannot be negative ({days} days)"
            ))),
            Some(days) => Ok(days as u64),
        }
    }

    pub fn plan_issue(
        &self,
        catalog: &CatalogIndex,
        members: &MemberDirectory,
        book_token: &str,
        member_token: &str,
        day_offset: Option<&str>,
        today: NaiveDate,
    ) -> AppResult<IssuePlan> {
        let book = self.resolver.resolve_book(catalog, book_token);
        let member = self.resolver.resolve_member(members, member_token);
        let (book, member) = (book?, member?);

        if !book.is_available() {
            tracing::warn!(isbn = %book.isbn, "Issue refused, no copies available");
            return Err(AppError::Unavailable(book.isbn.clone()));
        }

        let days = self.loan_days(day_offset)?;
        let due_date = today
            .checked_add_days(Days::new(days))
            .ok_or_else(|| AppError::Validation(format!("Loan length of {days} days is out of range")))?;

        let loan = LoanRecord {
            id: self.next_id,
            book_id: book.id,
            member_id: member.id,
            issue_date: today,
            due_date,
            return_date: None,
        };
        let mut book = book.clone();
        book.copies -= 1;

        Ok(IssuePlan { loan, book })
    }

    pub fn apply_issue(&mut self, catalog: &mut CatalogIndex, plan: IssuePlan) -> AppResult<LoanRecord> {
        let loan = plan.loan;
        if self.loans.contains_key(&loan.id) {
            return Err(AppError::DuplicateKey(format!("Loan {} already exists", loan.id)));
        }

        let next_id = id_after(loan.id)?;
        catalog.adjust_copies(loan.book_id, -1)?;
        self.next_id = self.next_id.max(next_id);
        self.loans.insert(loan.id, loan.clone());

        tracing::info!(
            loan_id = loan.id,
            book_id = loan.book_id,
            member_id = loan.member_id,
            due_date = %loan.due_date,
            "Book issued"
        );
        Ok(loan)
    }

    /// Issue a book to a member and return the new open loan
    pub fn issue(
        &mut self,
        catalog: &mut CatalogIndex,
        members: &MemberDirectory,
        book_token: &str,
        member_token: &str,
        day_offset: Option<&str>,
        today: NaiveDate,
    ) -> AppResult<LoanRecord> {
        let plan = self.plan_issue(catalog, members, book_token, member_token, day_offset, today)?;
        self.apply_issue(catalog, plan)
    }

    pub fn plan_return(&self, catalog: &CatalogIndex, loan_id: i32, today: NaiveDate) -> AppResult<ReturnPlan> {
        let loan = self.loans.get(&loan_id).ok_or(AppError::LoanNotFound(loan_id))?;
        if !loan.is_open() {
            return Err(AppError::AlreadyReturned(loan_id));
        }

        let mut book = catalog
            .lookup_by_id(loan.book_id)
            .cloned()
            .ok_or_else(|| AppError::BookNotFound(loan.book_id.to_string()))?;
        book.copies += 1;

        let days_late = loan.days_late(today);
        let receipt = ReturnReceipt {
            loan_id,
            fine: days_late * self.config.fine_per_day,
            days_late,
        };
        let mut loan = loan.clone();
        loan.return_date = Some(today);

        Ok(ReturnPlan { loan, book, receipt })
    }

    pub fn apply_return(&mut self, catalog: &mut CatalogIndex, plan: ReturnPlan) -> AppResult<ReturnReceipt> {
        let current = self
            .loans
            .get_mut(&plan.loan.id)
            .ok_or(AppError::LoanNotFound(plan.loan.id))?;
        if !current.is_open() {
            return Err(AppError::AlreadyReturned(plan.loan.id));
        }

        catalog.adjust_copies(current.book_id, 1)?;
        current.return_date = plan.loan.return_date;

        tracing::info!(
            loan_id = plan.receipt.loan_id,
            days_late = plan.receipt.days_late,
            fine = plan.receipt.fine,
            "Book returned"
        );
        Ok(plan.receipt)
    }

    /// Close an open loan, put the copy back and work out the fine
    pub fn return_loan(&mut self, catalog: &mut CatalogIndex, loan_id: i32, today: NaiveDate) -> AppResult<ReturnReceipt> {
        let plan = self.plan_return(catalog, loan_id, today)?;
        self.apply_return(catalog, plan)
    }

    /// Load a loan from a snapshot. Copy counts are taken as already accounted for.
    pub fn restore(&mut self, loan: LoanRecord) -> AppResult<()> {
        if self.loans.contains_key(&loan.id) {
            return Err(AppError::DuplicateKey(format!("Loan {} already exists", loan.id)));
        }
        self.next_id = self.next_id.max(id_after(loan.id)?);
        self.loans.insert(loan.id, loan);
        Ok(())
    }

    /// Open loans, soonest due first
    pub fn open_loans(&self) -> Vec<LoanRecord> {
        let mut open: Vec<_> = self.loans.values().filter(|l| l.is_open()).cloned().collect();
        open.sort_by_key(|l| (l.due_date, l.id));
        open
    }

    /// Open loans due before `as_of`, most days late first
    pub fn overdue_loans(&self, as_of: NaiveDate) -> Vec<LoanRecord> {
        let mut overdue: Vec<_> = self
            .loans
            .values()
            .filter(|l| l.is_overdue(as_of))
            .cloned()
            .collect();
        overdue.sort_by_key(|l| (l.due_date, l.id));
        overdue
    }

    /// Open loans held by one member
    pub fn loans_for_member(&self, member_id: i32) -> Vec<LoanRecord> {
        self.loans
            .values()
            .filter(|l| l.is_open() && l.member_id == member_id)
            .cloned()
            .collect()
    }

    /// Every loan, most recently issued first
    pub fn history(&self) -> Vec<LoanRecord> {
        let mut all: Vec<_> = self.loans.values().cloned().collect();
        all.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then(b.id.cmp(&a.id)));
        all
    }

    pub fn has_open_loans(&self, book_id: i32) -> bool {
        self.loans.values().any(|l| l.is_open() && l.book_id == book_id)
    }

    pub fn member_has_open_loans(&self, member_id: i32) -> bool {
        self.loans.values().any(|l| l.is_open() && l.member_id == member_id)
    }

    /// Member id to number of open loans, for members holding at least one
    pub fn open_counts_by_member(&self) -> IndexMap<i32, usize> {
        let mut counts = IndexMap::new();
        for loan in self.loans.values().filter(|l| l.is_open()) {
            *counts.entry(loan.member_id).or_insert(0) += 1;
        }
        counts.sort_keys();
        counts
    }
}
