pub(crate) mod crypto;
pub(crate) mod encoding;
pub(crate) mod hash;
pub(crate) mod time;

pub use crypto::MinerAccount;
pub use crypto::SpendingKey;

pub use crate::utilities::encoding::from_base58;
pub use crate::utilities::encoding::to_base58;
