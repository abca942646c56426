//! Tax-lot inventory and gain recognition
//!
//! Besides keeping accurate tallies, the main purpose of this module is to
//! match opening and closing transactions in order to calculate the amount
//! and character of realized gains.
//!
//! Each [`Lot`] tracks the current state of a particular bunch of securities
//! (units, cost).  Lots are collected in lists called "positions", which are
//! the values of a [`Portfolio`] keyed by an (FI account, security) pair
//! called a "pocket".
//!
//! Each Lot keeps a reference to its opening transaction, i.e. the
//! transaction which started its holding period for tax purposes, and to its
//! "creating" transaction, i.e. the transaction which booked the Lot into its
//! current pocket.  For an opening trade these are the same; for transfers,
//! spinoffs and exercises they differ.
//!
//! [`Gain`]s link opening transactions to realizing transactions - usually
//! closing transactions, but return of capital distributions that exceed cost
//! basis also realize gains.  Return of capital doesn't carry per-share
//! distribution information, so Gains keep state for the realizing price.
//!
//! To compute realized capital gains from a Gain instance:
//! * Proceeds - `gain.lot.units * gain.price`
//! * Basis - `gain.lot.units * gain.lot.price`
//! * Holding period start - `gain.lot.opentransaction.datetime()`
//! * Holding period end - `gain.transaction.datetime()`
//!
//! Lots and transactions are immutable.  Everything about a Lot (except its
//! opening transaction) can be changed by booking; the changes are reflected
//! in a newly-created Lot, leaving the old Lot undisturbed.

pub mod api;
pub mod functions;
pub mod predicates;
pub mod sortkeys;
pub mod types;

pub use api::{Portfolio, UNITS_RESOLUTION};
pub use functions::{part_basis, part_units};
pub use predicates::{closable_by, long_as_of, open_as_of};
pub use sortkeys::LotSort;
pub use types::{
    Exercise, Gain, Lot, Opening, ReturnOfCapital, Spinoff, Split, Trade, Transaction, Transfer,
};
