//! Database layer: pool pair with read/write routing, request-scoped
//! transactions, and a narrow query capability set.

mod conn;
mod params;
mod postgres;
mod scope;

pub use conn::DbConn;
pub use params::{bind_named, BindValue};
pub use postgres::Database;
pub use scope::{ReadPreference, RequestScope, TxDecision, TxOutcome};
