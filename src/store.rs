//! Trust anchors and certificate path verification.

use time::OffsetDateTime;
use tracing::{debug, trace};

use crate::cert::extensions::{BasicConstraints, find_extension};
use crate::cert::params::{Validity, oneline};
use crate::error::Result;
use crate::pem_utils;
use crate::pki::verify_certificate;

/// Longest issuer path walked before giving up.
pub const MAX_CHAIN_DEPTH: usize = 16;

/// A set of trusted certificates that other certificates are verified against.
///
/// Verification is pass/fail. A certificate is trusted when it is an anchor
/// itself, or when a path of CA certificates, each signing the next, leads
/// from an anchor down to it and every certificate on the path is currently
/// valid.
#[derive(Clone, Debug, Default)]
pub struct TrustStore {
    anchors: Vec<x509_cert::Certificate>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_certificate(&mut self, cert: x509_cert::Certificate) {
        if !self.anchors.contains(&cert) {
            self.anchors.push(cert);
        }
    }

    /// Adds every certificate of a PEM document; returns how many were read.
    pub fn add_pem(&mut self, pem_str: &str) -> Result<usize> {
        let certs = pem_utils::parse_certificates(pem_str)?;
        let count = certs.len();
        for cert in certs {
            self.add_certificate(cert);
        }
        Ok(count)
    }

    pub fn anchors(&self) -> &[x509_cert::Certificate] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Whether `cert` chains directly to one of the anchors.
    pub fn verify(&self, cert: &x509_cert::Certificate) -> bool {
        self.verify_with_intermediates(cert, &[])
    }

    /// Whether `cert` chains to an anchor, possibly through the untrusted
    /// `intermediates`.
    pub fn verify_with_intermediates(
        &self,
        cert: &x509_cert::Certificate,
        intermediates: &[x509_cert::Certificate],
    ) -> bool {
        self.verify_at(cert, intermediates, OffsetDateTime::now_utc())
    }

    /// Like [`TrustStore::verify_with_intermediates`], at a given time.
    pub fn verify_at(
        &self,
        cert: &x509_cert::Certificate,
        intermediates: &[x509_cert::Certificate],
        at: OffsetDateTime,
    ) -> bool {
        let subject = oneline(&cert.tbs_certificate.subject);
        if !valid_at(cert, at) {
            debug!(%subject, "certificate is not valid at verification time");
            return false;
        }

        let mut current = cert;
        for depth in 0..MAX_CHAIN_DEPTH {
            if self.anchors.contains(current) {
                debug!(%subject, depth, "certificate is trusted");
                return true;
            }
            if self
                .anchors
                .iter()
                .any(|anchor| valid_at(anchor, at) && signs(anchor, current))
            {
                debug!(%subject, depth, "certificate chains to a trust anchor");
                return true;
            }
            match intermediates
                .iter()
                .find(|issuer| valid_at(issuer, at) && signs(issuer, current))
            {
                Some(issuer) => {
                    trace!(
                        issuer = %oneline(&issuer.tbs_certificate.subject),
                        depth,
                        "following intermediate"
                    );
                    current = issuer;
                }
                None => {
                    debug!(%subject, depth, "no trusted issuer found");
                    return false;
                }
            }
        }
        debug!(%subject, max = MAX_CHAIN_DEPTH, "issuer path too long");
        false
    }
}

fn valid_at(cert: &x509_cert::Certificate, at: OffsetDateTime) -> bool {
    Validity::from_x509_validity(&cert.tbs_certificate.validity)
        .map(|validity| validity.contains(at))
        .unwrap_or(false)
}

/// Whether `issuer` is a CA whose name and key match `cert`'s issuer.
fn signs(issuer: &x509_cert::Certificate, cert: &x509_cert::Certificate) -> bool {
    if issuer.tbs_certificate.subject != cert.tbs_certificate.issuer {
        return false;
    }
    let is_ca = matches!(
        find_extension::<BasicConstraints>(issuer),
        Ok(Some(BasicConstraints { is_ca: true, .. }))
    );
    is_ca && verify_certificate(cert, &issuer.tbs_certificate.subject_public_key_info).is_ok()
}
