//! AWS integration module.
//!
//! This module defines the narrow tag-fetch, tag-apply and tag-delete
//! interfaces the reconciler consumes, the SDK-backed implementation of
//! those interfaces, and the pagination helper shared by every describe
//! call.

mod api;
mod pagination;
mod sdk;
mod types;

pub use api::{AutoScalingApi, AwsResult, Ec2Api, EksApi};
#[cfg(test)]
pub use api::{MockAutoScalingApi, MockEc2Api, MockEksApi};
pub use pagination::{Page, drain_pages};
pub use sdk::AwsClients;
pub use types::{
    AutoScalingGroupInfo, ClusterInfo, FargateProfileInfo, InstanceInfo, NodegroupInfo,
    VolumeInfo,
};
