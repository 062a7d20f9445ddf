mod address_derivation;
pub use address_derivation::*;

mod der;
pub use der::*;

mod secp256k;
pub use secp256k::*;
