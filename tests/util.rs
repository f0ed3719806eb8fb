#![allow(dead_code)]

use std::sync::Arc;

use minica::{Certificate, CertificateParams, KeyPair};

pub fn ec_key() -> Arc<KeyPair> {
    Arc::new(KeyPair::generate_ecdsa_p256())
}

/// A self-signed CA with a P-256 key; RSA generation is too slow to repeat in every test.
pub fn generate_ca_cert(common_name: &str) -> Certificate {
    Certificate::new(
        CertificateParams::builder()
            .common_name(common_name)
            .is_ca(true)
            .private_key(ec_key())
            .build(),
    )
    .unwrap()
}

pub fn issue_ca(issuer: &Certificate, common_name: &str) -> Certificate {
    issuer
        .issue(
            CertificateParams::builder()
                .common_name(common_name)
                .is_ca(true)
                .private_key(ec_key())
                .build(),
        )
        .unwrap()
}

pub fn issue_leaf(issuer: &Certificate, common_name: &str) -> Certificate {
    issuer
        .issue(
            CertificateParams::builder()
                .common_name(common_name)
                .private_key(ec_key())
                .build(),
        )
        .unwrap()
}
