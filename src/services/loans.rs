//! Loan management service

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::loan::{LoanDetails, LoanRecord, ReturnReceipt},
    repository::Change,
};

use super::{Context, LibraryState};

#[derive(Clone)]
pub struct LoansService {
    context: Context,
}

impl LoansService {
    pub(crate) fn new(context: Context) -> Self {
        Self { context }
    }

    /// Issue a book to a member.
    ///
    /// Both tokens go through the identifier resolver. `day_offset` is the raw
    /// loan length as typed; missing or non-numeric text means the default.
    pub async fn issue(&self, book_token: &str, member_token: &str, day_offset: Option<&str>) -> AppResult<LoanRecord> {
        let today = self.context.clock().today();
        let mut guard = self.context.lock().await;
        let state = &mut *guard;

        let plan = state
            .ledger
            .plan_issue(&state.catalog, &state.members, book_token, member_token, day_offset, today)?;

        self.context
            .commit(vec![Change::PutBook(plan.book.clone()), Change::PutLoan(plan.loan.clone())])
            .await?;
        state.ledger.apply_issue(&mut state.catalog, plan)
    }

    /// Return a loan and report any fine
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<ReturnReceipt> {
        let today = self.context.clock().today();
        let mut guard = self.context.lock().await;
        let state = &mut *guard;

        let plan = state.ledger.plan_return(&state.catalog, loan_id, today)?;

        self.context
            .commit(vec![Change::PutLoan(plan.loan.clone()), Change::PutBook(plan.book.clone())])
            .await?;
        state.ledger.apply_return(&mut state.catalog, plan)
    }

    /// Return a loan from a raw loan id as typed
    pub async fn return_loan_by_token(&self, raw: &str) -> AppResult<ReturnReceipt> {
        let loan_id = raw
            .trim()
            .parse()
            .map_err(|_| AppError::Validation("Loan id must be a number".to_string()))?;
        self.return_loan(loan_id).await
    }

    pub async fn get_loan(&self, loan_id: i32) -> AppResult<LoanDetails> {
        let today = self.context.clock().today();
        let state = self.context.lock().await;
        let loan = state.ledger.get(loan_id).ok_or(AppError::LoanNotFound(loan_id))?;
        Ok(details(&state, loan, today))
    }

    /// Open loans, soonest due first
    pub async fn open_loans(&self) -> Vec<LoanDetails> {
        let today = self.context.clock().today();
        let state = self.context.lock().await;
        state
            .ledger
            .open_loans()
            .iter()
            .map(|loan| details(&state, loan, today))
            .collect()
    }

    /// Open loans due before `as_of`, most days late first
    pub async fn overdue_loans(&self, as_of: NaiveDate) -> Vec<LoanDetails> {
        let state = self.context.lock().await;
        state
            .ledger
            .overdue_loans(as_of)
            .iter()
            .map(|loan| details(&state, loan, as_of))
            .collect()
    }

    /// Loans still open for a member
    pub async fn loans_for_member(&self, member_id: i32) -> AppResult<Vec<LoanDetails>> {
        let today = self.context.clock().today();
        let state = self.context.lock().await;
        if state.members.get(member_id).is_none() {
            return Err(AppError::MemberNotFound(member_id.to_string()));
        }
        Ok(state
            .ledger
            .loans_for_member(member_id)
            .iter()
            .map(|loan| details(&state, loan, today))
            .collect())
    }

    /// Every loan, most recently issued first
    pub async fn history(&self) -> Vec<LoanDetails> {
        let today = self.context.clock().today();
        let state = self.context.lock().await;
        state
            .ledger
            .history()
            .iter()
            .map(|loan| details(&state, loan, today))
            .collect()
    }

    /// Count active loans
    pub async fn count_active(&self) -> usize {
        self.context.lock().await.ledger.open_loans().len()
    }

    /// Count overdue loans as of today
    pub async fn count_overdue(&self) -> usize {
        let today = self.context.clock().today();
        self.context.lock().await.ledger.overdue_loans(today).len()
    }
}

fn details(state: &LibraryState, loan: &LoanRecord, as_of: NaiveDate) -> LoanDetails {
    LoanDetails {
        loan: loan.clone(),
        book_title: state.catalog.lookup_by_id(loan.book_id).map(|b| b.title.clone()),
        member_name: state.members.get(loan.member_id).map(|m| m.name.clone()),
        days_late: loan.days_late(loan.return_date.unwrap_or(as_of)),
    }
}
