//! Database instructions.
//!
//! Each instruction is a small value describing one operation. Executing it borrows the
//! [`Database`] immutably, so instructions can be built up front and run in any order.

use rusqlite::{params, OptionalExtension};

use super::*;

pub mod lookup;
pub mod upsert;

pub use self::{lookup::*, upsert::*};

/// An operation on the papers database.
#[async_trait]
pub trait DatabaseInstruction {
  /// What the operation returns.
  type Output;

  /// Runs the operation against `db`.
  async fn execute(&self, db: &Database) -> Result<Self::Output>;
}
