use der::Encode;
use der::asn1::BitString;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{MiniCaError, Result};
use crate::key::{KeyPair, PublicKey};

/// Signs the DER encoding of `tbs` with `key` and assembles the certificate.
pub fn sign_certificate(tbs: TbsCertificateInner, key: &KeyPair) -> Result<x509_cert::Certificate> {
    let signature = key.sign(&tbs.to_der()?)?;
    Ok(x509_cert::Certificate {
        signature_algorithm: tbs.signature.clone(),
        tbs_certificate: tbs,
        signature: BitString::from_bytes(&signature)?,
    })
}

/// Verifies a certificate's signature using the issuer's public key.
pub fn verify_certificate(
    cert: &x509_cert::Certificate,
    issuer_key: &SubjectPublicKeyInfoOwned,
) -> Result<()> {
    if cert.signature_algorithm != cert.tbs_certificate.signature {
        return Err(MiniCaError::SignatureError(
            "outer and inner signature algorithms differ".to_string(),
        ));
    }
    let signature = cert.signature.as_bytes().ok_or_else(|| {
        MiniCaError::DecodingError("signature has unused bits".to_string())
    })?;
    PublicKey::from_x509spki(issuer_key)?.verify(
        &cert.signature_algorithm,
        &cert.tbs_certificate.to_der()?,
        signature,
    )
}
