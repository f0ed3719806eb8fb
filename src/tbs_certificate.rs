use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::cert::params::{ExtensionParam, Validity};
use crate::error::Result;
use crate::key::{PublicKey, SignatureAlgorithm};

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// # Fields
/// * `serial_number` - The serial number assigned by the issuer.
/// * `signature_algorithm` - The algorithm the issuer signs with.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `validity` - The certificate's validity window.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - X.509 extensions, in encoding order.
pub struct TbsCertificate {
    pub serial_number: u64,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: Name,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key: PublicKey,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a v3 `TbsCertificateInner` ready to sign.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509)
            .collect::<Result<Vec<_>>>()?;

        // Leading zero bytes are stripped by the INTEGER encoding.
        let serial_number = SerialNumber::new(&self.serial_number.to_be_bytes())?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.clone(),
            validity: self.validity.to_x509_validity()?,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }
}

#[cfg(test)]
mod tests {
    use der::Encode;
    use time::OffsetDateTime;

    use super::*;
    use crate::cert::params::DistinguishedName;
    use crate::key::KeyPair;

    fn tbs(serial_number: u64) -> TbsCertificate {
        let key = KeyPair::generate_ecdsa_p256();
        let name = DistinguishedName::builder()
            .common_name("tbs")
            .build()
            .as_x509_name()
            .unwrap();
        let now = OffsetDateTime::now_utc();
        TbsCertificate {
            serial_number,
            signature_algorithm: key.signature_algorithm(),
            issuer: name.clone(),
            validity: Validity::new(now, now).unwrap(),
            subject: name,
            subject_public_key: key.public_key(),
            extensions: vec![],
        }
    }

    #[test]
    fn test_serial_numbers() {
        for serial in [0, 1, 255, u64::MAX] {
            let inner = tbs(serial).to_tbs_certificate_inner().unwrap();
            let bytes = inner.serial_number.as_bytes();
            let decoded = bytes.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b));
            assert_eq!(decoded, u128::from(serial));
        }
    }

    #[test]
    fn test_version_and_encoding() {
        let inner = tbs(7).to_tbs_certificate_inner().unwrap();
        assert_eq!(inner.version, Version::V3);
        assert!(inner.extensions.is_none());
        assert!(!inner.to_der().unwrap().is_empty());
    }
}
