//! Configuration module for the EKS tag reconciler.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `eks-tags.yaml`
//! - Environment variable overrides
//! - Validation of cluster names and user tags

mod parser;
mod spec;
mod validator;

pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, ENV_CLUSTER_NAME, ENV_REGION, find_config_file,
};
pub use spec::{ClusterConfig, TagSyncConfig};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
