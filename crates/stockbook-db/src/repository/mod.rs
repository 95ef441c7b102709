//! # Repository Layer
//!
//! One repository per aggregate. Each owns a pool clone and wraps its
//! SQL behind domain-shaped methods.
//!
//! ## Repository Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product   - CRUD, stock adjustment, damage/restore                     │
//! │  contact   - CRUD                                                       │
//! │  sale      - sale + items transactionally, paid-amount edits            │
//! │  purchase  - bulk purchase + items, stock and price effects             │
//! │  returns   - sale returns + items, restock/deduct effects               │
//! │  audit     - append-only field-change log                               │
//! │  ledger    - row fetching for the contact statement builder             │
//! │  daybook   - per-day sale listing with original paid amounts            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod contact;
pub mod daybook;
pub mod ledger;
pub mod product;
pub mod purchase;
pub mod returns;
pub mod sale;
