use der::Decode;

use crate::error::Result;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Parses every `CERTIFICATE` block of a PEM document, in order.
///
/// Blocks with other labels (keys, requests) are skipped.
pub fn parse_certificates(pem_str: &str) -> Result<Vec<x509_cert::Certificate>> {
    pem::parse_many(pem_str)?
        .iter()
        .filter(|block| block.tag() == CERTIFICATE_LABEL)
        .map(|block| Ok(x509_cert::Certificate::from_der(block.contents())?))
        .collect()
}

/// Number of `CERTIFICATE` blocks in a PEM document.
pub fn count_certificates(pem_str: &str) -> Result<usize> {
    Ok(pem::parse_many(pem_str)?
        .iter()
        .filter(|block| block.tag() == CERTIFICATE_LABEL)
        .count())
}
