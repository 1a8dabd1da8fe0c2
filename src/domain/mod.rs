//! Domain Layer - Key custody types
//!
//! Pure wallet types with no filesystem scanning or configuration. Discovery
//! lives in the keystore adapter and builds on these.
//!
//! - `keypair_record`: strict parsing of the solana-keygen format and the
//!   validated per-wallet record
//! - `registry`: the immutable label -> wallet map that signs on behalf of callers
//! - `error`: error taxonomy shared by every layer

pub mod error;
pub mod keypair_record;
pub mod registry;

pub use error::{AbortedLoad, ErrorKind, LoadFailure, ValidationError, WalletError};
pub use keypair_record::{parse_keypair_json, KeypairRecord, KEYPAIR_LENGTH, SEED_LENGTH};
pub use registry::WalletRegistry;
