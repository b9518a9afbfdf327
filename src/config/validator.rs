//! Configuration validation.
//!
//! Checks the cluster name and user tags against the limits AWS enforces,
//! so that invalid input fails before any API call is made.

use crate::error::{ConfigError, Result, TagSyncError};
use crate::tags::{AWS_RESERVED_PREFIX, NAME_TAG, ROLE_TAG, cluster_tag_key, is_aws_reserved};
use std::collections::HashSet;
use tracing::debug;

use super::spec::TagSyncConfig;

/// Maximum tag key length accepted by AWS.
const MAX_TAG_KEY_LEN: usize = 128;

/// Maximum tag value length accepted by AWS.
const MAX_TAG_VALUE_LEN: usize = 256;

/// Maximum EKS cluster name length.
const MAX_CLUSTER_NAME_LEN: usize = 100;

/// Validator for tag reconciliation configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any check fails.
    pub fn validate(&self, config: &TagSyncConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_cluster(config, &mut result);
        Self::validate_tags(config, &mut result);
        Self::validate_names("nodegroups", config.nodegroups.as_deref(), &mut result);
        Self::validate_names(
            "fargate_profiles",
            config.fargate_profiles.as_deref(),
            &mut result,
        );

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(TagSyncError::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )))
        }
    }

    /// Validates cluster configuration.
    fn validate_cluster(config: &TagSyncConfig, result: &mut ValidationResult) {
        let name = &config.cluster.name;
        if name.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("cluster.name"),
                message: String::from("Cluster name cannot be empty"),
            });
        } else if !is_valid_cluster_name(name) {
            result.errors.push(ValidationError {
                field: String::from("cluster.name"),
                message: format!(
                    "Cluster name '{name}' is invalid. Must start with an alphanumeric \
                     character and contain only alphanumerics, hyphens and underscores \
                     (max {MAX_CLUSTER_NAME_LEN})."
                ),
            });
        }

        if config.cluster.region.as_ref().is_some_and(String::is_empty) {
            result.errors.push(ValidationError {
                field: String::from("cluster.region"),
                message: String::from("Region cannot be empty when set"),
            });
        }
    }

    /// Validates additional tags.
    fn validate_tags(config: &TagSyncConfig, result: &mut ValidationResult) {
        let reserved = [
            NAME_TAG.to_string(),
            ROLE_TAG.to_string(),
            cluster_tag_key(&config.cluster.name),
        ];

        for (key, value) in &config.additional_tags {
            let field = format!("additional_tags.{key}");

            if key.is_empty() || key.chars().count() > MAX_TAG_KEY_LEN {
                result.errors.push(ValidationError {
                    field: field.clone(),
                    message: format!("Tag key must be 1-{MAX_TAG_KEY_LEN} characters"),
                });
            }

            if is_aws_reserved(key) {
                result.errors.push(ValidationError {
                    field: field.clone(),
                    message: format!(
                        "Tag keys starting with '{AWS_RESERVED_PREFIX}' are reserved by AWS"
                    ),
                });
            }

            if value.chars().count() > MAX_TAG_VALUE_LEN {
                result.errors.push(ValidationError {
                    field: field.clone(),
                    message: format!("Tag value must be at most {MAX_TAG_VALUE_LEN} characters"),
                });
            }

            if reserved.contains(key) {
                result.warnings.push(format!(
                    "Tag '{key}' is managed by the reconciler and will be ignored on the cluster"
                ));
            }
        }
    }

    /// Validates an explicit list of resource names.
    fn validate_names(field: &str, names: Option<&[String]>, result: &mut ValidationResult) {
        let Some(names) = names else {
            return;
        };

        let mut seen = HashSet::new();
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                result.errors.push(ValidationError {
                    field: format!("{field}[{i}]"),
                    message: String::from("Name cannot be empty"),
                });
            } else if !seen.insert(name.as_str()) {
                result.errors.push(ValidationError {
                    field: format!("{field}[{i}]"),
                    message: format!("Duplicate name '{name}'"),
                });
            }
        }
    }
}

/// Validates an EKS cluster name.
/// Names start with an alphanumeric and contain alphanumerics, hyphens and underscores.
fn is_valid_cluster_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_CLUSTER_NAME_LEN {
        return false;
    }

    let mut chars = name.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
