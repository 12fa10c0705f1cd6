use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};

use crate::application::ports::TransportError;
use crate::domain::value_objects::QuotaSnapshot;

/// Port for the caller's storage and bandwidth accounting
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuotaSource: Send + Sync {
    async fn usage(&self) -> Result<QuotaSnapshot, TransportError>;
}
