//! # MiniCA - A Minimal Pure Rust Certificate Authority
//!
//! MiniCA builds X.509 certificates for tests and local development, entirely with
//! rustcrypto libraries. It creates self-signed roots, intermediate CAs and leaf
//! certificates, tracks who issued what, and hands out PEM for certificates, chains,
//! bundles and private keys.
//!
//! ## Supported Key Types
//!
//! - **RSA**: any size supported by the `rsa` crate; 2048-bit keys are generated by default
//! - **ECDSA**: P-256 and P-384 curves
//! - **Ed25519**: Edwards curve digital signature algorithm
//!
//! ## Certificate Contents
//!
//! - **Subject**: common name plus optional country, state, locality and organization
//! - **Issuer**: the issuing certificate's subject, or the certificate's own when self-signed
//! - **Serial**: caller chosen for roots, allocated 1, 2, 3... by [`Certificate::issue`]
//! - **Extensions**: `basicConstraints` (critical) on every certificate; leaf certificates
//!   also carry `subjectAltName` with their common name appended as a DNS entry
//!
//! ## Quick Start
//!
//! ### Creating a Root and Issuing a Leaf
//!
//! ```rust,no_run
//! use minica::{Certificate, CertificateParams};
//!
//! # fn main() -> Result<(), minica::MiniCaError> {
//! let root = Certificate::new(
//!     CertificateParams::builder()
//!         .common_name("Example Root")
//!         .organization("Example Corp")
//!         .is_ca(true)
//!         .build(),
//! )?;
//!
//! let leaf = root.issue(
//!     CertificateParams::builder()
//!         .common_name("www.example.com")
//!         .sans(vec!["DNS:example.com".to_string(), "IP:127.0.0.1".to_string()])
//!         .build(),
//! )?;
//!
//! assert_eq!(leaf.serial(), 1);
//! println!("{}", leaf.certificate_pem()?);
//! println!("{}", leaf.private_key_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Intermediates, Chains and Trust
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use minica::{Certificate, CertificateParams, KeyPair};
//!
//! # fn main() -> Result<(), minica::MiniCaError> {
//! let root = Certificate::new(
//!     CertificateParams::builder()
//!         .common_name("root")
//!         .is_ca(true)
//!         .private_key(Arc::new(KeyPair::generate_ecdsa_p256()))
//!         .build(),
//! )?;
//! let intermediate = root.issue(
//!     CertificateParams::builder()
//!         .common_name("intermediate")
//!         .is_ca(true)
//!         .build(),
//! )?;
//! let server = intermediate.issue(CertificateParams::builder().common_name("server").build())?;
//!
//! // The chain stops below the root; the bundle adds the certificate itself.
//! assert_eq!(server.chain(), vec![intermediate.clone()]);
//! let bundle_pem = server.bundle_pem()?;
//!
//! let store = root.trust_store()?;
//! assert!(store.verify_with_intermediates(server.x509(), &[intermediate.x509().clone()]));
//! # let _ = bundle_pem;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`MiniCaError`]:
//!
//! ```rust
//! use minica::{Certificate, CertificateParams, KeyPair, MiniCaError};
//!
//! # fn main() {
//! let key = std::sync::Arc::new(KeyPair::generate_ecdsa_p256());
//! let leaf = Certificate::new(
//!     CertificateParams::builder()
//!         .common_name("leaf")
//!         .private_key(key)
//!         .build(),
//! )
//! .unwrap();
//! match leaf.issue(CertificateParams::builder().common_name("child").build()) {
//!     Err(MiniCaError::NotPermitted(msg)) => println!("not a CA: {msg}"),
//!     Err(e) => println!("Other error: {e}"),
//!     Ok(_) => unreachable!(),
//! }
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cert`]: The [`Certificate`] handle, its parameters and extensions
//! - [`key`]: Key generation, PEM import/export and signing
//! - [`store`]: Trust anchors and path verification
//! - [`error`]: Error types
//! - [`tbs_certificate`], [`pki`]: Low-level certificate assembly and signatures
//! - [`pem_utils`]: Reading certificates back out of PEM documents

pub mod cert;
pub mod error;
pub mod key;
pub mod pem_utils;
pub mod pki;
pub mod store;
pub mod tbs_certificate;

pub use cert::Certificate;
pub use cert::params::CertificateParams;
pub use error::{MiniCaError, Result};
pub use key::KeyPair;
pub use store::TrustStore;
