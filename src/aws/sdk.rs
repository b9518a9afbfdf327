//! AWS SDK implementation of the collaborator interfaces.

use async_trait::async_trait;
use aws_sdk_autoscaling::types as asg_types;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types as ec2_types;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::error::AwsError;
use crate::tags::TagSet;

use super::api::{AutoScalingApi, AwsResult, Ec2Api, EksApi};
use super::pagination::Page;
use super::types::{
    AutoScalingGroupInfo, ClusterInfo, FargateProfileInfo, InstanceInfo, NodegroupInfo,
    VolumeInfo,
};

/// Resource type string required by the Auto Scaling tag APIs.
const ASG_RESOURCE_TYPE: &str = "auto-scaling-group";

/// SDK clients for every service whose resources are tagged.
#[derive(Debug, Clone)]
pub struct AwsClients {
    /// EKS client.
    eks: aws_sdk_eks::Client,
    /// Auto Scaling client.
    autoscaling: aws_sdk_autoscaling::Client,
    /// EC2 client.
    ec2: aws_sdk_ec2::Client,
}

impl AwsClients {
    /// Creates clients from the standard AWS configuration chain.
    ///
    /// `region` overrides the region resolved from the environment.
    pub async fn from_env(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let config = loader.load().await;

        debug!(region = ?config.region(), "Loaded AWS configuration");

        Self {
            eks: aws_sdk_eks::Client::new(&config),
            autoscaling: aws_sdk_autoscaling::Client::new(&config),
            ec2: aws_sdk_ec2::Client::new(&config),
        }
    }
}

/// Formats an SDK error with its full source chain.
fn sdk_message<E: std::error::Error>(err: &E) -> String {
    DisplayErrorContext(err).to_string()
}

/// Converts optional key/value pairs into a tag set, skipping incomplete tags.
fn collect_tags<'a>(pairs: impl Iterator<Item = (Option<&'a str>, Option<&'a str>)>) -> TagSet {
    pairs
        .filter_map(|(key, value)| Some((key?.to_string(), value?.to_string())))
        .collect()
}

/// Converts an EKS tag map.
fn eks_tags(tags: Option<&HashMap<String, String>>) -> TagSet {
    tags.map(|tags| {
        tags.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    })
    .unwrap_or_default()
}

/// Builds the Auto Scaling tag for an add/update on `group_name`.
///
/// New instances launched by the group inherit the tag.
fn asg_upsert_tag(group_name: &str, key: &str, value: &str) -> asg_types::Tag {
    asg_types::Tag::builder()
        .resource_id(group_name)
        .resource_type(ASG_RESOURCE_TYPE)
        .key(key)
        .value(value)
        .propagate_at_launch(true)
        .build()
}

/// Builds the Auto Scaling tag that removes `key` from `group_name`.
fn asg_delete_tag(group_name: &str, key: &str) -> asg_types::Tag {
    asg_types::Tag::builder()
        .resource_id(group_name)
        .resource_type(ASG_RESOURCE_TYPE)
        .key(key)
        .build()
}

/// Maps a described group, skipping groups without a name.
fn asg_info(group: &asg_types::AutoScalingGroup) -> Option<AutoScalingGroupInfo> {
    Some(AutoScalingGroupInfo {
        name: group.auto_scaling_group_name()?.to_string(),
        tags: collect_tags(group.tags().iter().map(|tag| (tag.key(), tag.value()))),
        instance_ids: group
            .instances()
            .iter()
            .filter_map(|instance| instance.instance_id().map(str::to_string))
            .collect(),
    })
}

/// Maps a described instance and its attached EBS volume ids.
fn instance_info(instance: &ec2_types::Instance) -> Option<InstanceInfo> {
    Some(InstanceInfo {
        id: instance.instance_id()?.to_string(),
        tags: collect_tags(instance.tags().iter().map(|tag| (tag.key(), tag.value()))),
        volume_ids: instance
            .block_device_mappings()
            .iter()
            .filter_map(|mapping| mapping.ebs()?.volume_id().map(str::to_string))
            .collect(),
    })
}

/// Maps a described volume.
fn volume_info(volume: &ec2_types::Volume) -> Option<VolumeInfo> {
    Some(VolumeInfo {
        id: volume.volume_id()?.to_string(),
        tags: collect_tags(volume.tags().iter().map(|tag| (tag.key(), tag.value()))),
    })
}

#[async_trait]
impl EksApi for AwsClients {
    async fn describe_cluster(&self, name: &str) -> AwsResult<Option<ClusterInfo>> {
        const OP: &str = "DescribeCluster";

        let output = match self.eks.describe_cluster().name(name).send().await {
            Ok(output) => output,
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    return Ok(None);
                }
                return Err(AwsError::request(OP, name, sdk_message(&service_err)));
            }
        };

        let cluster = output
            .cluster()
            .ok_or_else(|| AwsError::missing(OP, "cluster"))?;
        let arn = cluster
            .arn()
            .ok_or_else(|| AwsError::missing(OP, "cluster.arn"))?;

        Ok(Some(ClusterInfo {
            name: cluster.name().unwrap_or(name).to_string(),
            arn: arn.to_string(),
            tags: eks_tags(cluster.tags()),
        }))
    }

    async fn describe_nodegroup(
        &self,
        cluster_name: &str,
        nodegroup_name: &str,
    ) -> AwsResult<Option<NodegroupInfo>> {
        const OP: &str = "DescribeNodegroup";

        let result = self
            .eks
            .describe_nodegroup()
            .cluster_name(cluster_name)
            .nodegroup_name(nodegroup_name)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    return Ok(None);
                }
                return Err(AwsError::request(
                    OP,
                    nodegroup_name,
                    sdk_message(&service_err),
                ));
            }
        };

        let nodegroup = output
            .nodegroup()
            .ok_or_else(|| AwsError::missing(OP, "nodegroup"))?;
        let arn = nodegroup
            .nodegroup_arn()
            .ok_or_else(|| AwsError::missing(OP, "nodegroup.nodegroupArn"))?;

        let auto_scaling_groups = nodegroup
            .resources()
            .map(|resources| {
                resources
                    .auto_scaling_groups()
                    .iter()
                    .filter_map(|group| group.name().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(NodegroupInfo {
            name: nodegroup
                .nodegroup_name()
                .unwrap_or(nodegroup_name)
                .to_string(),
            arn: arn.to_string(),
            tags: eks_tags(nodegroup.tags()),
            auto_scaling_groups,
        }))
    }

    async fn describe_fargate_profile(
        &self,
        cluster_name: &str,
        profile_name: &str,
    ) -> AwsResult<Option<FargateProfileInfo>> {
        const OP: &str = "DescribeFargateProfile";

        let result = self
            .eks
            .describe_fargate_profile()
            .cluster_name(cluster_name)
            .fargate_profile_name(profile_name)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    return Ok(None);
                }
                return Err(AwsError::request(OP, profile_name, sdk_message(&service_err)));
            }
        };

        let profile = output
            .fargate_profile()
            .ok_or_else(|| AwsError::missing(OP, "fargateProfile"))?;
        let arn = profile
            .fargate_profile_arn()
            .ok_or_else(|| AwsError::missing(OP, "fargateProfile.fargateProfileArn"))?;

        Ok(Some(FargateProfileInfo {
            name: profile
                .fargate_profile_name()
                .unwrap_or(profile_name)
                .to_string(),
            arn: arn.to_string(),
            tags: eks_tags(profile.tags()),
        }))
    }

    async fn list_nodegroups(
        &self,
        cluster_name: &str,
        next_token: Option<String>,
    ) -> AwsResult<Page<String>> {
        let output = self
            .eks
            .list_nodegroups()
            .cluster_name(cluster_name)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| AwsError::request("ListNodegroups", cluster_name, sdk_message(&e)))?;

        Ok(Page::new(
            output.nodegroups().to_vec(),
            output.next_token().map(str::to_string),
        ))
    }

    async fn list_fargate_profiles(
        &self,
        cluster_name: &str,
        next_token: Option<String>,
    ) -> AwsResult<Page<String>> {
        let output = self
            .eks
            .list_fargate_profiles()
            .cluster_name(cluster_name)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                AwsError::request("ListFargateProfiles", cluster_name, sdk_message(&e))
            })?;

        Ok(Page::new(
            output.fargate_profile_names().to_vec(),
            output.next_token().map(str::to_string),
        ))
    }

    async fn tag_resource(&self, arn: &str, tags: &TagSet) -> AwsResult<()> {
        let tags: HashMap<String, String> = tags
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        self.eks
            .tag_resource()
            .resource_arn(arn)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| AwsError::request("TagResource", arn, sdk_message(&e)))?;

        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: &BTreeSet<String>) -> AwsResult<()> {
        self.eks
            .untag_resource()
            .resource_arn(arn)
            .set_tag_keys(Some(keys.iter().cloned().collect()))
            .send()
            .await
            .map_err(|e| AwsError::request("UntagResource", arn, sdk_message(&e)))?;

        Ok(())
    }
}

#[async_trait]
impl AutoScalingApi for AwsClients {
    async fn describe_auto_scaling_groups(
        &self,
        names: &[String],
        next_token: Option<String>,
    ) -> AwsResult<Page<AutoScalingGroupInfo>> {
        let output = self
            .autoscaling
            .describe_auto_scaling_groups()
            .set_auto_scaling_group_names(Some(names.to_vec()))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                AwsError::request(
                    "DescribeAutoScalingGroups",
                    names.join(","),
                    sdk_message(&e),
                )
            })?;

        let groups = output
            .auto_scaling_groups()
            .iter()
            .filter_map(asg_info)
            .collect();

        Ok(Page::new(groups, output.next_token().map(str::to_string)))
    }

    async fn create_or_update_tags(&self, group_name: &str, tags: &TagSet) -> AwsResult<()> {
        let request_tags = tags
            .iter()
            .map(|(key, value)| asg_upsert_tag(group_name, key, value))
            .collect();

        self.autoscaling
            .create_or_update_tags()
            .set_tags(Some(request_tags))
            .send()
            .await
            .map_err(|e| AwsError::request("CreateOrUpdateTags", group_name, sdk_message(&e)))?;

        Ok(())
    }

    async fn delete_tags(&self, group_name: &str, keys: &BTreeSet<String>) -> AwsResult<()> {
        let request_tags = keys
            .iter()
            .map(|key| asg_delete_tag(group_name, key))
            .collect();

        self.autoscaling
            .delete_tags()
            .set_tags(Some(request_tags))
            .send()
            .await
            .map_err(|e| AwsError::request("DeleteTags", group_name, sdk_message(&e)))?;

        Ok(())
    }
}

#[async_trait]
impl Ec2Api for AwsClients {
    async fn describe_instances(
        &self,
        instance_ids: &[String],
        next_token: Option<String>,
    ) -> AwsResult<Page<InstanceInfo>> {
        let output = self
            .ec2
            .describe_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                AwsError::request("DescribeInstances", instance_ids.join(","), sdk_message(&e))
            })?;

        let instances = output
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .filter_map(instance_info)
            .collect();

        Ok(Page::new(instances, output.next_token().map(str::to_string)))
    }

    async fn describe_volumes(
        &self,
        volume_ids: &[String],
        next_token: Option<String>,
    ) -> AwsResult<Page<VolumeInfo>> {
        let output = self
            .ec2
            .describe_volumes()
            .set_volume_ids(Some(volume_ids.to_vec()))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                AwsError::request("DescribeVolumes", volume_ids.join(","), sdk_message(&e))
            })?;

        let volumes = output.volumes().iter().filter_map(volume_info).collect();

        Ok(Page::new(volumes, output.next_token().map(str::to_string)))
    }

    async fn create_tags(&self, resource_ids: &[String], tags: &TagSet) -> AwsResult<()> {
        let request_tags = tags
            .iter()
            .map(|(key, value)| {
                ec2_types::Tag::builder()
                    .key(key)
                    .value(value)
                    .build()
            })
            .collect();

        self.ec2
            .create_tags()
            .set_resources(Some(resource_ids.to_vec()))
            .set_tags(Some(request_tags))
            .send()
            .await
            .map_err(|e| {
                AwsError::request("CreateTags", resource_ids.join(","), sdk_message(&e))
            })?;

        Ok(())
    }

    async fn delete_tags(
        &self,
        resource_ids: &[String],
        keys: &BTreeSet<String>,
    ) -> AwsResult<()> {
        let request_tags = keys
            .iter()
            .map(|key| ec2_types::Tag::builder().key(key).build())
            .collect();

        self.ec2
            .delete_tags()
            .set_resources(Some(resource_ids.to_vec()))
            .set_tags(Some(request_tags))
            .send()
            .await
            .map_err(|e| {
                AwsError::request("DeleteTags", resource_ids.join(","), sdk_message(&e))
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_tags_skips_incomplete_pairs() {
        let pairs = vec![
            (Some("team"), Some("platform")),
            (None, Some("orphan")),
            (Some("no-value"), None),
        ];

        let tags = collect_tags(pairs.into_iter());

        assert_eq!(tags.len(), 1);
        assert_eq!(tags["team"], "platform");
    }

    #[test]
    fn test_eks_tags_missing_map() {
        assert!(eks_tags(None).is_empty());

        let map = HashMap::from([(String::from("a"), String::from("1"))]);
        assert_eq!(eks_tags(Some(&map))["a"], "1");
    }

    #[test]
    fn test_asg_upsert_tag_propagates_at_launch() {
        let tag = asg_upsert_tag("asg-1", "team", "platform");

        assert_eq!(tag.resource_id(), Some("asg-1"));
        assert_eq!(tag.resource_type(), Some("auto-scaling-group"));
        assert_eq!(tag.key(), Some("team"));
        assert_eq!(tag.value(), Some("platform"));
        assert_eq!(tag.propagate_at_launch(), Some(true));
    }

    #[test]
    fn test_asg_delete_tag_carries_key_only() {
        let tag = asg_delete_tag("asg-1", "stale");

        assert_eq!(tag.resource_id(), Some("asg-1"));
        assert_eq!(tag.resource_type(), Some("auto-scaling-group"));
        assert_eq!(tag.key(), Some("stale"));
        assert_eq!(tag.value(), None);
    }

    #[test]
    fn test_asg_info_maps_tags_and_instances() {
        let group = asg_types::AutoScalingGroup::builder()
            .auto_scaling_group_name("asg-1")
            .tags(
                asg_types::TagDescription::builder()
                    .key("eks:nodegroup-name")
                    .value("ng-1")
                    .build(),
            )
            .instances(asg_types::Instance::builder().instance_id("i-1").build())
            .instances(asg_types::Instance::builder().build())
            .build();

        let info = asg_info(&group).expect("named group should map");

        assert_eq!(info.name, "asg-1");
        assert_eq!(info.tags["eks:nodegroup-name"], "ng-1");
        assert_eq!(info.instance_ids, vec![String::from("i-1")]);
        assert!(asg_info(&asg_types::AutoScalingGroup::builder().build()).is_none());
    }

    #[test]
    fn test_instance_info_collects_ebs_volumes() {
        let ebs = |id: &str| {
            ec2_types::InstanceBlockDeviceMapping::builder()
                .device_name("/dev/xvda")
                .ebs(ec2_types::EbsInstanceBlockDevice::builder().volume_id(id).build())
                .build()
        };
        let instance = ec2_types::Instance::builder()
            .instance_id("i-1")
            .tags(ec2_types::Tag::builder().key("launched-by").value("asg").build())
            .block_device_mappings(ebs("vol-1"))
            .block_device_mappings(ebs("vol-2"))
            .block_device_mappings(
                ec2_types::InstanceBlockDeviceMapping::builder()
                    .device_name("/dev/sdb")
                    .build(),
            )
            .build();

        let info = instance_info(&instance).expect("instance with id should map");

        assert_eq!(info.id, "i-1");
        assert_eq!(info.tags["launched-by"], "asg");
        assert_eq!(info.volume_ids, vec![String::from("vol-1"), String::from("vol-2")]);
    }

    #[test]
    fn test_volume_info_requires_id() {
        let volume = ec2_types::Volume::builder()
            .volume_id("vol-1")
            .tags(ec2_types::Tag::builder().key("device").value("xvda").build())
            .build();

        let info = volume_info(&volume).expect("volume with id should map");

        assert_eq!(info.id, "vol-1");
        assert_eq!(info.tags["device"], "xvda");
        assert!(volume_info(&ec2_types::Volume::builder().build()).is_none());
    }
}
