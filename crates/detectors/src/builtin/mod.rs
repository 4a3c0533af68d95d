mod manual_lamports_zeroing;
mod missing_signer;
mod unchecked_arithmetic;

pub use manual_lamports_zeroing::ManualLamportsZeroing;
pub use missing_signer::MissingSigner;
pub use unchecked_arithmetic::UncheckedArithmetic;
