pub mod extensions;
pub mod params;

use std::fmt;
use std::iter;
use std::sync::{Arc, Mutex, PoisonError};

use der::pem::LineEnding;
use der::{Encode, EncodePem};
use extensions::{BasicConstraints, SubjectAltName, ToAndFromX509Extension};
use params::{CertificateParams, DistinguishedName, ExtensionParam, Validity, oneline};
use time::OffsetDateTime;
use tracing::debug;
use x509_cert::name::Name;

use crate::error::{MiniCaError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::pki::sign_certificate;
use crate::store::TrustStore;
use crate::tbs_certificate::TbsCertificate;

/// Size of the RSA key generated when no private key is supplied.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// An X.509 certificate together with its private key and issuer.
///
/// `Certificate` is a cheap, shared handle: clones refer to the same
/// certificate, and issued certificates keep their issuer alive through it.
/// Two handles compare equal when their X.509 encodings are equal.
#[derive(Clone)]
pub struct Certificate {
    inner: Arc<Inner>,
}

struct Inner {
    private_key: Arc<KeyPair>,
    x509: x509_cert::Certificate,
    issuer: Option<Certificate>,
    is_ca: bool,
    serial: u64,
    validity: Validity,
    // Last serial handed out by `issue`.
    serial_counter: Mutex<u64>,
}

impl Certificate {
    /// Builds and signs a certificate.
    ///
    /// Without an issuer the certificate is self-signed. With one, it is signed
    /// by the issuer's key, named after the issuer's subject, and its validity
    /// must fall within the issuer's.
    ///
    /// # Errors
    /// * [`MiniCaError::NotValidBeforeIssuer`] / [`MiniCaError::ExpiresAfterIssuer`]
    ///   when the window escapes the issuer's.
    /// * [`MiniCaError::InvalidInput`] for malformed subject alternative names
    ///   or subject fields.
    /// * Key generation, encoding and signing failures.
    pub fn new(params: CertificateParams) -> Result<Self> {
        let CertificateParams {
            common_name,
            sans,
            issuer,
            is_ca,
            serial,
            not_before,
            not_after,
            country,
            state,
            location,
            organization,
            private_key,
        } = params;

        let validity = match &issuer {
            Some(issuer) => issuer.validity().within(not_before, not_after)?,
            None => Validity::self_signed(not_before, not_after)?,
        };

        let extensions = if is_ca {
            vec![ExtensionParam::from_extension(
                BasicConstraints {
                    is_ca: true,
                    max_path_length: None,
                },
                true,
            )?]
        } else {
            let dns_common_name = format!("DNS:{common_name}");
            let names = sans
                .iter()
                .map(String::as_str)
                .chain(iter::once(dns_common_name.as_str()))
                .collect::<Vec<_>>();
            vec![
                ExtensionParam::from_extension(BasicConstraints::default(), true)?,
                ExtensionParam::from_extension(SubjectAltName::parse(&names)?, false)?,
            ]
        };

        let subject = DistinguishedName {
            common_name,
            country,
            state,
            location,
            organization,
        }
        .as_x509_name()?;
        let issuer_name = match &issuer {
            Some(issuer) => issuer.subject().clone(),
            None => subject.clone(),
        };

        let private_key = match private_key {
            Some(key) => key,
            None => Arc::new(KeyPair::generate_rsa(DEFAULT_RSA_BITS)?),
        };
        let signing_key = match &issuer {
            Some(issuer) => issuer.private_key().as_ref(),
            None => private_key.as_ref(),
        };

        let serial = serial.unwrap_or(0);
        let tbs = TbsCertificate {
            serial_number: serial,
            signature_algorithm: signing_key.signature_algorithm(),
            issuer: issuer_name,
            validity,
            subject,
            subject_public_key: private_key.public_key(),
            extensions,
        };
        let x509 = sign_certificate(tbs.to_tbs_certificate_inner()?, signing_key)?;

        debug!(
            subject = %oneline(&x509.tbs_certificate.subject),
            issuer = %oneline(&x509.tbs_certificate.issuer),
            serial,
            is_ca,
            self_signed = issuer.is_none(),
            "certificate created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                private_key,
                x509,
                issuer,
                is_ca,
                serial,
                validity,
                serial_counter: Mutex::new(0),
            }),
        })
    }

    /// Issues a certificate signed by this CA.
    ///
    /// The issuer of `params` is replaced by `self` and its serial by the next
    /// serial of this CA: 1 for the first issued certificate, then 2, and so on.
    /// A serial is only consumed when the certificate is created.
    ///
    /// # Errors
    /// [`MiniCaError::NotPermitted`] when this certificate is not a CA, plus
    /// every error of [`Certificate::new`].
    pub fn issue(&self, params: CertificateParams) -> Result<Certificate> {
        if !self.is_ca() {
            return Err(MiniCaError::NotPermitted(
                "CA must be set to use issue".to_string(),
            ));
        }

        let mut counter = self
            .inner
            .serial_counter
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let serial = *counter + 1;
        let cert = Certificate::new(CertificateParams {
            issuer: Some(self.clone()),
            serial: Some(serial),
            ..params
        })?;
        *counter = serial;

        debug!(
            issuer = %self.subject_oneline(),
            subject = %cert.subject_oneline(),
            serial,
            "certificate issued"
        );
        Ok(cert)
    }

    /// A trust store holding this CA as its only anchor.
    pub fn trust_store(&self) -> Result<TrustStore> {
        if !self.is_ca() {
            return Err(MiniCaError::NotPermitted(
                "CA must be set to use trust_store".to_string(),
            ));
        }
        let mut store = TrustStore::new();
        store.add_certificate(self.x509().clone());
        Ok(store)
    }

    /// Issuers between this certificate and its root, nearest first.
    ///
    /// The root itself is not part of the chain, so roots and certificates
    /// issued directly by a root have an empty chain.
    pub fn chain(&self) -> Vec<Certificate> {
        let mut chain: Vec<Certificate> =
            iter::successors(self.issuer().cloned(), |cert| cert.issuer().cloned()).collect();
        chain.pop();
        chain
    }

    /// This certificate followed by its [`chain`](Certificate::chain).
    pub fn bundle(&self) -> Vec<Certificate> {
        iter::once(self.clone()).chain(self.chain()).collect()
    }

    pub fn certificate_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.x509.to_der()?)
    }

    pub fn certificate_pem(&self) -> Result<String> {
        Ok(self.inner.x509.to_pem(LineEnding::LF)?)
    }

    /// PEM of every [`chain`](Certificate::chain) entry; empty for an empty chain.
    pub fn chain_pem(&self) -> Result<String> {
        concat_pem(&self.chain())
    }

    /// PEM of every [`bundle`](Certificate::bundle) entry, leaf first.
    pub fn bundle_pem(&self) -> Result<String> {
        concat_pem(&self.bundle())
    }

    pub fn private_key_pem(&self) -> Result<String> {
        self.inner.private_key.to_pem()
    }

    pub fn x509(&self) -> &x509_cert::Certificate {
        &self.inner.x509
    }

    pub fn private_key(&self) -> &Arc<KeyPair> {
        &self.inner.private_key
    }

    pub fn public_key(&self) -> PublicKey {
        self.inner.private_key.public_key()
    }

    pub fn issuer(&self) -> Option<&Certificate> {
        self.inner.issuer.as_ref()
    }

    pub fn is_ca(&self) -> bool {
        self.inner.is_ca
    }

    pub fn serial(&self) -> u64 {
        self.inner.serial
    }

    pub fn validity(&self) -> Validity {
        self.inner.validity
    }

    pub fn not_before(&self) -> OffsetDateTime {
        self.inner.validity.not_before
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.inner.validity.not_after
    }

    pub fn subject(&self) -> &Name {
        &self.inner.x509.tbs_certificate.subject
    }

    /// The issuer name field; equal to [`subject`](Certificate::subject) when self-signed.
    pub fn issuer_name(&self) -> &Name {
        &self.inner.x509.tbs_certificate.issuer
    }

    pub fn subject_dn(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(self.subject())
    }

    /// Subject in OpenSSL's one-line form, e.g. `/CN=www/O=Example`.
    pub fn subject_oneline(&self) -> String {
        oneline(self.subject())
    }

    pub fn issuer_oneline(&self) -> String {
        oneline(self.issuer_name())
    }

    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .x509
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .map(ExtensionParam::from_x509)
            .collect()
    }

    /// Finds and decodes extension `E`, if the certificate carries it.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        extensions::find_extension(&self.inner.x509)
    }
}

fn concat_pem(certs: &[Certificate]) -> Result<String> {
    certs.iter().map(Certificate::certificate_pem).collect()
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.x509 == other.inner.x509
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject_oneline())
            .field("issuer", &self.issuer_oneline())
            .field("serial", &self.inner.serial)
            .field("is_ca", &self.inner.is_ca)
            .field("validity", &self.inner.validity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ec_key() -> Arc<KeyPair> {
        Arc::new(KeyPair::generate_ecdsa_p256())
    }

    fn ca() -> Certificate {
        Certificate::new(
            CertificateParams::builder()
                .common_name("ca")
                .is_ca(true)
                .private_key(ec_key())
                .build(),
        )
        .unwrap()
    }

    #[test]
    fn test_failed_issue_keeps_serial() {
        let ca = ca();
        let too_early = ca.not_before() - time::Duration::seconds(1);
        let err = ca
            .issue(
                CertificateParams::builder()
                    .common_name("early")
                    .not_before(too_early)
                    .private_key(ec_key())
                    .build(),
            )
            .unwrap_err();
        assert_eq!(err, MiniCaError::NotValidBeforeIssuer);

        let cert = ca
            .issue(
                CertificateParams::builder()
                    .common_name("ok")
                    .private_key(ec_key())
                    .build(),
            )
            .unwrap();
        assert_eq!(cert.serial(), 1);
    }

    #[test]
    fn test_issue_overrides_issuer_and_serial() {
        let ca = ca();
        let other = ca.clone();
        let cert = ca
            .issue(
                CertificateParams::builder()
                    .common_name("leaf")
                    .serial(99)
                    .issuer(other)
                    .private_key(ec_key())
                    .build(),
            )
            .unwrap();
        assert_eq!(cert.serial(), 1);
        assert_eq!(cert.issuer(), Some(&ca));
    }

    #[test]
    fn test_handles_compare_by_certificate() {
        let ca = ca();
        assert_eq!(ca, ca.clone());
        assert_ne!(ca, self::ca());
    }

    #[test]
    fn test_issuer_graph_is_shared() {
        let ca = ca();
        let leaf = ca
            .issue(
                CertificateParams::builder()
                    .common_name("leaf")
                    .private_key(ec_key())
                    .build(),
            )
            .unwrap();
        let issuer = leaf.issuer().unwrap();
        assert!(Arc::ptr_eq(&issuer.inner, &ca.inner));
    }

    #[test]
    fn test_concurrent_issue_allocates_distinct_serials() {
        let ca = ca();
        let serials = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let ca = &ca;
                    scope.spawn(move || {
                        ca.issue(
                            CertificateParams::builder()
                                .common_name(format!("leaf{i}"))
                                .private_key(ec_key())
                                .build(),
                        )
                        .unwrap()
                        .serial()
                    })
                })
                .collect();
            let mut serials: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            serials.sort_unstable();
            serials
        });
        assert_eq!(serials, vec![1, 2, 3, 4]);
    }
}
