//! Reachability Probe Port

use crate::domain::entities::ReachabilityReport;
use crate::domain::value_objects::TargetUrl;
use async_trait::async_trait;

/// Checks whether a URL answers at all.
///
/// Never fails: an unreachable target is a valid report.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self, target: &TargetUrl) -> ReachabilityReport;
}
