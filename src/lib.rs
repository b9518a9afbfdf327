// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # EKS Tag Sync
//!
//! Idempotent tag reconciliation for Amazon EKS clusters and the AWS
//! resources they own.
//!
//! ## Overview
//!
//! Given a cluster name and a set of user tags, the reconciler:
//!
//! - Derives the desired tags for each resource from cluster metadata
//! - Diffs them against the tags currently set
//! - Adds, updates and removes tags until the two match
//! - Pushes nodegroup tags down to the Auto Scaling Groups, EC2 instances
//!   and EBS volumes backing each nodegroup
//!
//! Tags that EKS and the cluster autoscaler manage on Auto Scaling Groups
//! are never removed.
//!
//! ## Modules
//!
//! - [`tags`]: Tag sets, diffing and desired-tag construction
//! - [`aws`]: EKS, Auto Scaling and EC2 tagging APIs
//! - [`reconciler`]: Per-resource reconciliation and the nodegroup cascade
//! - [`config`]: Configuration parsing and validation
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! cluster:
//!   name: prod
//!   region: us-west-2
//! additional_tags:
//!   team: platform
//!   cost-center: "1234"
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod aws;
pub mod cli;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod tags;

// ============================================================================
// Re-exports
// ============================================================================

pub use aws::{AutoScalingApi, AwsClients, Ec2Api, EksApi};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, TagSyncConfig};
pub use error::{Result, TagSyncError};
pub use reconciler::{ReconciliationReport, ResourceOutcome, TagReconciler, TagScope};
pub use tags::{ResourceKind, TagDiff, TagSet, diff, diff_with_exemption};
