use dashmap::DashMap;

/// Points in the in-memory network where a failure can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Put,
    Get,
    Rewrite,
    Delete,
    Describe,
    /// Fail before the owner changes
    ReassignOwner,
    /// Change the owner, then report a failure as if the response was lost
    ReassignOwnerLostResponse,
    UpsertGrant,
    RemoveGrant,
    ReplaceGrants,
    StoreOwnerCapability,
    Usage,
}

/// Armed failures, consumed one per call at the matching point
#[derive(Debug, Default)]
pub struct FaultInjector {
    armed: DashMap<FaultPoint, u32>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call at `point`
    pub fn fail_next(&self, point: FaultPoint) {
        self.fail_times(point, 1);
    }

    pub fn fail_times(&self, point: FaultPoint, times: u32) {
        *self.armed.entry(point).or_insert(0) += times;
    }

    pub fn clear(&self) {
        self.armed.clear();
    }

    /// Consume one armed failure for `point`, if any
    pub(crate) fn trip(&self, point: FaultPoint) -> bool {
        let mut tripped = false;
        self.armed.remove_if_mut(&point, |_, remaining| {
            tripped = true;
            *remaining -= 1;
            *remaining == 0
        });
        tripped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faults_are_consumed() {
        let faults = FaultInjector::new();
        faults.fail_times(FaultPoint::Put, 2);

        assert!(faults.trip(FaultPoint::Put));
        assert!(faults.trip(FaultPoint::Put));
        assert!(!faults.trip(FaultPoint::Put));
        assert!(!faults.trip(FaultPoint::Get));
    }
}
