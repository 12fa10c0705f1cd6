mod file_record;
mod identity;
mod share_grant;

pub use file_record::FileRecord;
pub use identity::Identity;
pub use share_grant::ShareGrant;
