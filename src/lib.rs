#[macro_use]
extern crate serde;

mod audit;
mod authority;
mod block;
mod dlog;
mod elgamal;
mod error;
mod joint;
mod ledger;
mod portal;
mod schnorr;
pub mod serde_bigint;
mod transaction;
mod voter;

pub use audit::*;
pub use authority::*;
pub use block::*;
pub use dlog::*;
pub use elgamal::*;
pub use error::*;
pub use joint::*;
pub use ledger::*;
pub use portal::*;
pub use schnorr::*;
pub use transaction::*;
pub use voter::*;
