mod address;
mod file_id;
mod identifier;
mod public_key;
mod quota;

pub use address::Address;
pub use file_id::FileId;
pub use identifier::Identifier;
pub use public_key::PublicKey;
pub use quota::QuotaSnapshot;
