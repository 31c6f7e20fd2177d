/// Withdrawal rules per account type. Pure functions, no state.
pub mod policy;

/// Validated inputs. Amounts, account references and owners are checked
/// here, before anything reaches [`ledger`] or [`processor`].
pub mod command;

/// Account entity. Balance is modified using events, which are created by
/// handling commands.
pub mod account;

/// Injected source of fresh account numbers.
pub mod numbering;

/// Injected UTC clock, so tests can pin record dates.
pub mod clock;

/// Transaction records, their shape rules and history filters.
pub mod record;

/// Persistence collaborators, plus "in memory" implementations and
/// wrappers that fail on demand.
pub mod store;

/// Opens accounts and applies deposits and withdrawals, one at a time per
/// account.
pub mod ledger;

/// Append-only journal of transaction records and its lazy history.
pub mod journal;

/// The operations offered to callers, and the transfer state machine.
///
/// NOTE: [`processor::TransactionProcessor`] is the integration point for
/// an HTTP layer or a scheduler; [`processor::bank_processor::BankProcessor`]
/// is the only implementation for now.
pub mod processor;

/// Error taxonomy shared by every operation.
pub mod error;

/// Settings loaded from an optional JSON file.
pub mod config;

/// Bootstraps the core from a CSV batch. Lives here rather than in the
/// binary so the integration tests can drive it.
pub mod bin_utils;
