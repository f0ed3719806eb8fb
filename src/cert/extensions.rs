use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use x509_cert::ext::pkix::name::GeneralName;

use super::params::ExtensionParam;
use crate::error::{MiniCaError, Result};

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use minica::cert::extensions::{GeneralNameEntry, SubjectAltName, ToAndFromX509Extension};
/// let san = SubjectAltName {
///     names: vec![GeneralNameEntry::Dns("example.com".to_string())],
/// };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san.names, decoded.names);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// Finds and decodes extension `E` in a certificate, if present.
pub fn find_extension<E: ToAndFromX509Extension>(
    cert: &x509_cert::Certificate,
) -> Result<Option<E>> {
    cert.tbs_certificate
        .extensions
        .iter()
        .flatten()
        .find(|ext| ext.extn_id == E::OID)
        .map(|ext| ExtensionParam::from_x509(ext).to_extension())
        .transpose()
}

/// One subject alternative name, written `TYPE:value`.
///
/// Recognized types are `DNS`, `IP`, `email` and `URI` (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneralNameEntry {
    Dns(String),
    Ip(IpAddr),
    Email(String),
    Uri(String),
}

impl FromStr for GeneralNameEntry {
    type Err = MiniCaError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, value) = s.split_once(':').ok_or_else(|| {
            MiniCaError::InvalidInput(format!("subject alt name must be TYPE:value, got {s}"))
        })?;
        match kind.to_ascii_lowercase().as_str() {
            "dns" => Ok(Self::Dns(value.to_string())),
            "ip" => value.parse().map(Self::Ip).map_err(|_| {
                MiniCaError::InvalidInput(format!("invalid IP address in subject alt name: {value}"))
            }),
            "email" => Ok(Self::Email(value.to_string())),
            "uri" => Ok(Self::Uri(value.to_string())),
            _ => Err(MiniCaError::InvalidInput(format!(
                "unsupported subject alt name type: {kind}"
            ))),
        }
    }
}

impl fmt::Display for GeneralNameEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns(name) => write!(f, "DNS:{name}"),
            Self::Ip(addr) => write!(f, "IP:{addr}"),
            Self::Email(email) => write!(f, "email:{email}"),
            Self::Uri(uri) => write!(f, "URI:{uri}"),
        }
    }
}

impl GeneralNameEntry {
    fn to_general_name(&self) -> Result<GeneralName> {
        let ia5 = |s: &String| {
            Ia5String::try_from(s.clone()).map_err(|e| MiniCaError::InvalidInput(e.to_string()))
        };
        Ok(match self {
            Self::Dns(name) => GeneralName::DnsName(ia5(name)?),
            Self::Email(email) => GeneralName::Rfc822Name(ia5(email)?),
            Self::Uri(uri) => GeneralName::UniformResourceIdentifier(ia5(uri)?),
            Self::Ip(IpAddr::V4(addr)) => GeneralName::IpAddress(OctetString::new(addr.octets())?),
            Self::Ip(IpAddr::V6(addr)) => GeneralName::IpAddress(OctetString::new(addr.octets())?),
        })
    }

    fn from_general_name(name: &GeneralName) -> Result<Self> {
        match name {
            GeneralName::DnsName(dns) => Ok(Self::Dns(dns.to_string())),
            GeneralName::Rfc822Name(email) => Ok(Self::Email(email.to_string())),
            GeneralName::UniformResourceIdentifier(uri) => Ok(Self::Uri(uri.to_string())),
            GeneralName::IpAddress(octets) => {
                let bytes = octets.as_bytes();
                if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
                    Ok(Self::Ip(IpAddr::from(v4)))
                } else if let Ok(v6) = <[u8; 16]>::try_from(bytes) {
                    Ok(Self::Ip(IpAddr::from(v6)))
                } else {
                    Err(MiniCaError::DecodingError(format!(
                        "IP address of {} bytes",
                        bytes.len()
                    )))
                }
            }
            _ => Err(MiniCaError::InvalidInput(
                "Unsupported general name type".to_string(),
            )),
        }
    }
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// This extension specifies additional identities for the subject of the certificate.
///
/// # Fields
/// * `names` - The alternative names, in order.
#[derive(Debug, Clone)]
pub struct SubjectAltName {
    pub names: Vec<GeneralNameEntry>,
}

impl SubjectAltName {
    /// Parses `TYPE:value` entries.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let names = entries
            .iter()
            .map(|entry| entry.as_ref().parse())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { names })
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.names.iter().any(|name| name.to_string() == entry)
    }
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.names
                .iter()
                .map(GeneralNameEntry::to_general_name)
                .collect::<Result<Vec<_>>>()?,
        );

        Ok(san.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let names = san
            .0
            .iter()
            .map(GeneralNameEntry::from_general_name)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { names })
    }
}

/// Represents the Basic Constraints extension.
///
/// This extension indicates whether the certificate is a CA certificate and its path length.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = <x509_cert::ext::pkix::BasicConstraints as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}
