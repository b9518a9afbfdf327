//! In-memory AWS used by the reconciler tests.
//!
//! Holds a small cluster topology, applies tag mutations to it, and records
//! every call in order so tests can assert on sequencing and pagination.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::aws::{
    AutoScalingApi, AutoScalingGroupInfo, AwsResult, ClusterInfo, Ec2Api, EksApi,
    FargateProfileInfo, InstanceInfo, NodegroupInfo, Page, VolumeInfo,
};
use crate::tags::{
    EKS_CLUSTER_AUTOSCALER_ENABLED_TAG, EKS_CLUSTER_NAME_TAG, EKS_NODEGROUP_NAME_TAG,
    ResourceKind, TagSet,
};

/// A recorded API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListNodegroups,
    ListFargateProfiles,
    DescribeAsgs { names: Vec<String>, token: Option<String> },
    DescribeInstances { ids: Vec<String>, token: Option<String> },
    DescribeVolumes { ids: Vec<String>, token: Option<String> },
    TagResource { kind: ResourceKind, arn: String, tags: TagSet },
    UntagResource { kind: ResourceKind, arn: String, keys: BTreeSet<String> },
    AsgUpsert { name: String, tags: TagSet },
    AsgDelete { name: String, keys: BTreeSet<String> },
    Ec2Create { ids: Vec<String>, tags: TagSet },
    Ec2Delete { ids: Vec<String>, keys: BTreeSet<String> },
}

impl Call {
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::TagResource { .. }
                | Self::UntagResource { .. }
                | Self::AsgUpsert { .. }
                | Self::AsgDelete { .. }
                | Self::Ec2Create { .. }
                | Self::Ec2Delete { .. }
        )
    }

    pub const fn is_upsert(&self) -> bool {
        matches!(
            self,
            Self::TagResource { .. } | Self::AsgUpsert { .. } | Self::Ec2Create { .. }
        )
    }

    /// Kind and address of the resource a mutating call targets.
    pub fn target(&self) -> (ResourceKind, String) {
        match self {
            Self::TagResource { kind, arn, .. } | Self::UntagResource { kind, arn, .. } => {
                (*kind, arn.clone())
            }
            Self::AsgUpsert { name, .. } | Self::AsgDelete { name, .. } => {
                (ResourceKind::AutoScalingGroup, name.clone())
            }
            Self::Ec2Create { ids, .. } | Self::Ec2Delete { ids, .. } => {
                let id = ids.join(",");
                let kind = if id.starts_with("vol-") {
                    ResourceKind::Volume
                } else {
                    ResourceKind::Instance
                };
                (kind, id)
            }
            other => panic!("{other:?} does not target a resource"),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    clusters: BTreeMap<String, ClusterInfo>,
    nodegroups: BTreeMap<String, NodegroupInfo>,
    profiles: BTreeMap<String, FargateProfileInfo>,
    asgs: BTreeMap<String, AutoScalingGroupInfo>,
    instances: BTreeMap<String, InstanceInfo>,
    volumes: BTreeMap<String, VolumeInfo>,
    calls: Vec<Call>,
}

/// In-memory EKS, Auto Scaling and EC2.
#[derive(Debug)]
pub struct FakeAws {
    state: Mutex<State>,
    page_size: usize,
}

fn tags(pairs: &[(&str, &str)]) -> TagSet {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Returns the page of `items` starting at `token`.
fn paginate<T: Clone>(items: &[T], token: Option<&str>, page_size: usize) -> Page<T> {
    let start: usize = token.map_or(0, |t| t.parse().expect("fake page token"));
    let end = start.saturating_add(page_size).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    Page::new(items[start..end].to_vec(), next)
}

impl FakeAws {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: usize::MAX,
        }
    }

    /// Cluster `prod` with nodegroup `ng-1` backed by `asg_count` groups,
    /// each running one instance with one volume.
    pub fn with_nodegroup_topology(asg_count: usize) -> Self {
        let aws = Self::new();
        aws.add_cluster("prod", TagSet::new());
        {
            let mut state = aws.lock();
            let asg_names: Vec<String> = (1..=asg_count).map(|i| format!("asg-{i}")).collect();
            state.nodegroups.insert(
                String::from("ng-1"),
                NodegroupInfo {
                    name: String::from("ng-1"),
                    arn: String::from("arn:aws:eks:ng-1"),
                    tags: TagSet::new(),
                    auto_scaling_groups: asg_names,
                },
            );

            for i in 1..=asg_count {
                state.asgs.insert(
                    format!("asg-{i}"),
                    AutoScalingGroupInfo {
                        name: format!("asg-{i}"),
                        tags: tags(&[
                            (EKS_CLUSTER_NAME_TAG, "prod"),
                            (EKS_NODEGROUP_NAME_TAG, "ng-1"),
                            (EKS_CLUSTER_AUTOSCALER_ENABLED_TAG, "true"),
                            ("k8s.io/cluster-autoscaler/prod", "owned"),
                            ("kubernetes.io/cluster/prod", "owned"),
                            ("stale", "remove-me"),
                        ]),
                        instance_ids: vec![format!("i-{i}")],
                    },
                );
                state.instances.insert(
                    format!("i-{i}"),
                    InstanceInfo {
                        id: format!("i-{i}"),
                        tags: tags(&[("launched-by", "asg")]),
                        volume_ids: vec![format!("vol-{i}")],
                    },
                );
                state.volumes.insert(
                    format!("vol-{i}"),
                    VolumeInfo {
                        id: format!("vol-{i}"),
                        tags: tags(&[("device", "xvda")]),
                    },
                );
            }
        }
        aws
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake state poisoned")
    }

    pub fn add_cluster(&self, name: &str, tags: TagSet) {
        self.lock().clusters.insert(
            name.to_string(),
            ClusterInfo {
                name: name.to_string(),
                arn: format!("arn:aws:eks:{name}"),
                tags,
            },
        );
    }

    pub fn add_fargate_profile(&self, name: &str, tags: TagSet) {
        self.lock().profiles.insert(
            name.to_string(),
            FargateProfileInfo {
                name: name.to_string(),
                arn: format!("arn:aws:eks:fargate:{name}"),
                tags,
            },
        );
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn cluster_tags(&self, name: &str) -> TagSet {
        self.lock().clusters[name].tags.clone()
    }

    pub fn fargate_profile_tags(&self, name: &str) -> TagSet {
        self.lock().profiles[name].tags.clone()
    }

    pub fn asg_tags(&self, name: &str) -> TagSet {
        self.lock().asgs[name].tags.clone()
    }

    pub fn instance_tags(&self, id: &str) -> TagSet {
        self.lock().instances[id].tags.clone()
    }

    pub fn volume_tags(&self, id: &str) -> TagSet {
        self.lock().volumes[id].tags.clone()
    }
}

impl State {
    /// Finds the tags of the EKS resource with `arn`.
    fn eks_tags_mut(&mut self, arn: &str) -> (ResourceKind, &mut TagSet) {
        if let Some(c) = self.clusters.values_mut().find(|c| c.arn == arn) {
            return (ResourceKind::Cluster, &mut c.tags);
        }
        if let Some(n) = self.nodegroups.values_mut().find(|n| n.arn == arn) {
            return (ResourceKind::Nodegroup, &mut n.tags);
        }
        if let Some(p) = self.profiles.values_mut().find(|p| p.arn == arn) {
            return (ResourceKind::FargateProfile, &mut p.tags);
        }
        panic!("unknown arn {arn}");
    }

    fn ec2_tags_mut(&mut self, id: &str) -> &mut TagSet {
        if let Some(instance) = self.instances.get_mut(id) {
            return &mut instance.tags;
        }
        &mut self.volumes.get_mut(id).expect("unknown ec2 resource").tags
    }
}

fn upsert(target: &mut TagSet, tags: &TagSet) {
    target.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
}

fn remove(target: &mut TagSet, keys: &BTreeSet<String>) {
    target.retain(|k, _| !keys.contains(k));
}

#[async_trait]
impl EksApi for FakeAws {
    async fn describe_cluster(&self, name: &str) -> AwsResult<Option<ClusterInfo>> {
        Ok(self.lock().clusters.get(name).cloned())
    }

    async fn describe_nodegroup(
        &self,
        _cluster_name: &str,
        nodegroup_name: &str,
    ) -> AwsResult<Option<NodegroupInfo>> {
        Ok(self.lock().nodegroups.get(nodegroup_name).cloned())
    }

    async fn describe_fargate_profile(
        &self,
        _cluster_name: &str,
        profile_name: &str,
    ) -> AwsResult<Option<FargateProfileInfo>> {
        Ok(self.lock().profiles.get(profile_name).cloned())
    }

    async fn list_nodegroups(
        &self,
        _cluster_name: &str,
        next_token: Option<String>,
    ) -> AwsResult<Page<String>> {
        let mut state = self.lock();
        state.calls.push(Call::ListNodegroups);
        let names: Vec<String> = state.nodegroups.keys().cloned().collect();
        Ok(paginate(&names, next_token.as_deref(), self.page_size))
    }

    async fn list_fargate_profiles(
        &self,
        _cluster_name: &str,
        next_token: Option<String>,
    ) -> AwsResult<Page<String>> {
        let mut state = self.lock();
        state.calls.push(Call::ListFargateProfiles);
        let names: Vec<String> = state.profiles.keys().cloned().collect();
        Ok(paginate(&names, next_token.as_deref(), self.page_size))
    }

    async fn tag_resource(&self, arn: &str, tags: &TagSet) -> AwsResult<()> {
        let mut state = self.lock();
        let (kind, target) = state.eks_tags_mut(arn);
        upsert(target, tags);
        state.calls.push(Call::TagResource {
            kind,
            arn: arn.to_string(),
            tags: tags.clone(),
        });
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: &BTreeSet<String>) -> AwsResult<()> {
        let mut state = self.lock();
        let (kind, target) = state.eks_tags_mut(arn);
        remove(target, keys);
        state.calls.push(Call::UntagResource {
            kind,
            arn: arn.to_string(),
            keys: keys.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl AutoScalingApi for FakeAws {
    async fn describe_auto_scaling_groups(
        &self,
        names: &[String],
        next_token: Option<String>,
    ) -> AwsResult<Page<AutoScalingGroupInfo>> {
        let mut state = self.lock();
        state.calls.push(Call::DescribeAsgs {
            names: names.to_vec(),
            token: next_token.clone(),
        });
        let groups: Vec<AutoScalingGroupInfo> = names
            .iter()
            .filter_map(|name| state.asgs.get(name).cloned())
            .collect();
        Ok(paginate(&groups, next_token.as_deref(), self.page_size))
    }

    async fn create_or_update_tags(&self, group_name: &str, tags: &TagSet) -> AwsResult<()> {
        let mut state = self.lock();
        let group = state.asgs.get_mut(group_name).expect("unknown asg");
        upsert(&mut group.tags, tags);
        state.calls.push(Call::AsgUpsert {
            name: group_name.to_string(),
            tags: tags.clone(),
        });
        Ok(())
    }

    async fn delete_tags(&self, group_name: &str, keys: &BTreeSet<String>) -> AwsResult<()> {
        let mut state = self.lock();
        let group = state.asgs.get_mut(group_name).expect("unknown asg");
        remove(&mut group.tags, keys);
        state.calls.push(Call::AsgDelete {
            name: group_name.to_string(),
            keys: keys.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl Ec2Api for FakeAws {
    async fn describe_instances(
        &self,
        instance_ids: &[String],
        next_token: Option<String>,
    ) -> AwsResult<Page<InstanceInfo>> {
        let mut state = self.lock();
        state.calls.push(Call::DescribeInstances {
            ids: instance_ids.to_vec(),
            token: next_token.clone(),
        });
        let instances: Vec<InstanceInfo> = instance_ids
            .iter()
            .filter_map(|id| state.instances.get(id).cloned())
            .collect();
        Ok(paginate(&instances, next_token.as_deref(), self.page_size))
    }

    async fn describe_volumes(
        &self,
        volume_ids: &[String],
        next_token: Option<String>,
    ) -> AwsResult<Page<VolumeInfo>> {
        let mut state = self.lock();
        state.calls.push(Call::DescribeVolumes {
            ids: volume_ids.to_vec(),
            token: next_token.clone(),
        });
        let volumes: Vec<VolumeInfo> = volume_ids
            .iter()
            .filter_map(|id| state.volumes.get(id).cloned())
            .collect();
        Ok(paginate(&volumes, next_token.as_deref(), self.page_size))
    }

    async fn create_tags(&self, resource_ids: &[String], tags: &TagSet) -> AwsResult<()> {
        let mut state = self.lock();
        for id in resource_ids {
            upsert(state.ec2_tags_mut(id), tags);
        }
        state.calls.push(Call::Ec2Create {
            ids: resource_ids.to_vec(),
            tags: tags.clone(),
        });
        Ok(())
    }

    async fn delete_tags(
        &self,
        resource_ids: &[String],
        keys: &BTreeSet<String>,
    ) -> AwsResult<()> {
        let mut state = self.lock();
        for id in resource_ids {
            remove(state.ec2_tags_mut(id), keys);
        }
        state.calls.push(Call::Ec2Delete {
            ids: resource_ids.to_vec(),
            keys: keys.clone(),
        });
        Ok(())
    }
}
