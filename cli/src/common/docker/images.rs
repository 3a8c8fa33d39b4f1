//! # Tawa Docker Image Naming and Lookup
//!
//! File: cli/src/common/docker/images.rs
//!
//! ## Overview
//!
//! Every runtime environment produces two images:
//!
//! | role      | tag                                  |
//! |-----------|--------------------------------------|
//! | project   | `<repository>-<environment>:<version>`      |
//! | base      | `<repository>-<environment>-base:<version>` |
//!
//! The project image is the one containers run. `image_exists` asks the
//! Docker daemon whether a tag is already present locally, which is how
//! `--build-policy missing` decides whether to build.
//!
use crate::core::environments::DockerfileRole;
use crate::core::error::{Result, TawaError};
use anyhow::anyhow;
use tracing::{debug, error, instrument};

use super::connect::connect_docker;

/// Tag of the project image for `environment`.
pub fn project_image(repository: &str, environment: &str, version: &str) -> String {
    format!("{}-{}:{}", repository, environment, version)
}

/// Tag of the base image for `environment`.
pub fn base_image(repository: &str, environment: &str, version: &str) -> String {
    format!("{}-{}-base:{}", repository, environment, version)
}

/// Tag of the image built from the Dockerfile with the given role.
pub fn image_for_role(
    role: DockerfileRole,
    repository: &str,
    environment: &str,
    version: &str,
) -> String {
    match role {
        DockerfileRole::Base => base_image(repository, environment, version),
        DockerfileRole::Project => project_image(repository, environment, version),
    }
}

/// Checks if a Docker image exists locally by name or ID.
///
/// # Returns
///
/// * `Result<bool>` - `Ok(true)` if the image exists locally, `Ok(false)` on a 404.
///
/// # Errors
///
/// * `TawaError::DockerApi` - For other errors talking to the Docker daemon.
#[instrument(skip(name_or_id), fields(image = %name_or_id))]
pub async fn image_exists(name_or_id: &str) -> Result<bool> {
    let docker = connect_docker().await?;
    debug!("Checking existence of image: {}", name_or_id);

    match docker.inspect_image(name_or_id).await {
        Ok(_) => {
            debug!("Image '{}' found locally.", name_or_id);
            Ok(true)
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {
            debug!("Image '{}' not found locally.", name_or_id);
            Ok(false)
        }
        Err(e) => {
            error!(
                "Error during existence check for image '{}': {:?}",
                name_or_id, e
            );
            Err(anyhow!(TawaError::DockerApi { source: e }).context(format!(
                "Failed to check existence for image '{}'",
                name_or_id
            )))
        }
    }
}
