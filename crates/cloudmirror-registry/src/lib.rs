//! cloudmirror registry adapters
//!
//! One adapter per destination kind. Every adapter derives the target
//! reference from the source image, provisions the destination repository
//! or registry when it is missing, and copies the image with crane.
//!
//! | Tag   | Target                                                          |
//! |-------|-----------------------------------------------------------------|
//! | ECR   | `{account}.dkr.ecr.{region}.amazonaws.com/{repo}:{tag}`         |
//! | GAR   | `{region}-docker.pkg.dev/{project}/{repository}/{repo}:{tag}`   |
//! | ACR   | `{registry}.azurecr.io/{repo}:{tag}`                            |
//! | JFROG | `{host}/artifactory/{repository}/{repo}:{tag}`                  |
//! | DOCR  | `registry.digitalocean.com/{registry}/{repo}:{tag}`             |

pub mod acr;
pub mod adapter;
pub mod auth;
pub mod command;
pub mod crane;
pub mod docr;
pub mod ecr;
pub mod error;
pub mod gar;
pub mod jfrog;

#[cfg(test)]
mod testing;

pub use acr::AcrAdapter;
pub use adapter::{RegistryAdapter, RegistrySet};
pub use auth::{Authenticator, RegistryAuthenticator};
pub use command::{CommandOutput, CommandRunner, Invocation, ProcessRunner};
pub use crane::Crane;
pub use docr::DocrAdapter;
pub use ecr::EcrAdapter;
pub use error::{RegistryError, Result};
pub use gar::GarAdapter;
pub use jfrog::JfrogAdapter;
