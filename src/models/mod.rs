mod address;
pub use address::*;

mod error;
pub use error::*;

mod secret;
pub use secret::*;

mod signer;
pub use signer::*;

mod transaction;
pub use transaction::*;
