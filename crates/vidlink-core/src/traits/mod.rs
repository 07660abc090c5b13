//! Core traits for the vidlink system
//!
//! This module defines the abstract interfaces for the external
//! collaborators this core consumes.
//!
//! - [`BlobStore`]: create/delete/permission operations on an external
//!   cloud file store
//! - [`CredentialProvider`]: bearer tokens for blob-store calls, with
//!   expiry reporting and refresh
//! - [`DocumentStore`]: the optional secondary persistence tier

pub mod blob_store;
pub mod credential;
pub mod document_store;

pub use blob_store::BlobStore;
pub use credential::{CredentialProvider, StaticCredentials};
pub use document_store::{DocumentStore, DocumentStoreConnector};
