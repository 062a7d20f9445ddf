pub mod aws_kms;
pub use aws_kms::*;

pub mod signer;
pub use signer::*;
