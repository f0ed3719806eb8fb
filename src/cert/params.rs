use std::sync::Arc;
use std::time::Duration as StdDuration;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::DateTime;
use der::asn1::{
    Any, GeneralizedTime, OctetString, PrintableStringRef, SetOfVec, UtcTime, Utf8StringRef,
};
use time::{Duration, OffsetDateTime, UtcOffset};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::Certificate;
use super::extensions::ToAndFromX509Extension;
use crate::error::{MiniCaError, Result};
use crate::key::KeyPair;

pub(crate) const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
pub(crate) const COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
pub(crate) const LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
pub(crate) const STATE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
pub(crate) const ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");

/// How far a root certificate's default validity reaches into the past.
pub const DEFAULT_BACKDATE: Duration = Duration::hours(24);

/// How far a root certificate's default validity reaches into the future.
pub const DEFAULT_LIFETIME: Duration = Duration::hours(24);

/// Everything a [`Certificate`] can be constructed from.
///
/// Only `common_name` is required. For non-CA certificates it is also added
/// as a `DNS` subject alternative name, so it must be ASCII; internationalized
/// host names need to be passed in their punycode (`xn--`) form.
///
/// * `sans` - extra subject alternative names in `TYPE:value` form
///   (`DNS`, `IP`, `email`, `URI`). `DNS:<common_name>` is always appended.
/// * `issuer` - signing certificate. Without one the certificate is self-signed.
/// * `is_ca` - whether the certificate may issue others. Defaults to `false`.
/// * `serial` - serial number. Defaults to `0`.
/// * `not_before` / `not_after` - validity window. Defaults to the issuer's
///   window, or to [`DEFAULT_BACKDATE`] before and [`DEFAULT_LIFETIME`] after
///   now for self-signed certificates. Bounds are truncated to whole seconds
///   and must lie between 1970 and 9999; earlier times fail with
///   [`MiniCaError::InvalidValidity`].
/// * `country`, `state`, `location`, `organization` - optional subject fields.
/// * `private_key` - key of the certificate. A fresh RSA-2048 key is generated
///   when absent.
#[derive(Clone, Debug, Builder)]
pub struct CertificateParams {
    #[builder(into)]
    pub common_name: String,
    #[builder(default)]
    pub sans: Vec<String>,
    pub issuer: Option<Certificate>,
    #[builder(default)]
    pub is_ca: bool,
    pub serial: Option<u64>,
    pub not_before: Option<OffsetDateTime>,
    pub not_after: Option<OffsetDateTime>,
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub state: Option<String>,
    #[builder(into)]
    pub location: Option<String>,
    #[builder(into)]
    pub organization: Option<String>,
    pub private_key: Option<Arc<KeyPair>>,
}

/// Subject or issuer name of a certificate.
///
/// Attributes are always laid out as CN, C, ST, L, O with absent ones skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Builder)]
pub struct DistinguishedName {
    #[builder(into)]
    pub common_name: String,
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub state: Option<String>,
    #[builder(into)]
    pub location: Option<String>,
    #[builder(into)]
    pub organization: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509 name, one attribute per RDN.
    pub fn as_x509_name(&self) -> Result<Name> {
        let mut rdns = vec![utf8_rdn(COMMON_NAME, &self.common_name)?];
        if let Some(country) = &self.country {
            let value = PrintableStringRef::new(country).map_err(|_| {
                MiniCaError::InvalidInput(format!("country is not printable: {country}"))
            })?;
            rdns.push(rdn(COUNTRY, Any::encode_from(&value)?)?);
        }
        for (oid, value) in [
            (STATE, &self.state),
            (LOCALITY, &self.location),
            (ORGANIZATION, &self.organization),
        ] {
            if let Some(value) = value {
                rdns.push(utf8_rdn(oid, value)?);
            }
        }
        Ok(RdnSequence(rdns))
    }

    /// Reads the known attributes back out of an X.509 name.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        let mut dn = DistinguishedName::default();
        for attr in x509dn.0.iter().flat_map(|rdn| rdn.0.iter()) {
            let value = Some(attribute_text(attr));
            match attr.oid {
                COMMON_NAME => dn.common_name = attribute_text(attr),
                COUNTRY => dn.country = value,
                STATE => dn.state = value,
                LOCALITY => dn.location = value,
                ORGANIZATION => dn.organization = value,
                _ => {}
            }
        }
        dn
    }
}

/// Renders a name the way OpenSSL's one-line form does, e.g. `/CN=x/C=bar`.
pub fn oneline(name: &Name) -> String {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .map(|attr| {
            let key = match attr.oid {
                COMMON_NAME => "CN".to_string(),
                COUNTRY => "C".to_string(),
                STATE => "ST".to_string(),
                LOCALITY => "L".to_string(),
                ORGANIZATION => "O".to_string(),
                oid => oid.to_string(),
            };
            format!("/{key}={}", attribute_text(attr))
        })
        .collect()
}

fn attribute_text(attr: &AttributeTypeAndValue) -> String {
    String::from_utf8_lossy(attr.value.value()).into_owned()
}

fn utf8_rdn(oid: ObjectIdentifier, value: &str) -> Result<RelativeDistinguishedName> {
    rdn(oid, Any::encode_from(&Utf8StringRef::new(value)?)?)
}

fn rdn(oid: ObjectIdentifier, value: Any) -> Result<RelativeDistinguishedName> {
    let atv = AttributeTypeAndValue { oid, value };
    Ok(RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?))
}

/// Certificate validity period, in whole seconds UTC.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    pub fn new(not_before: OffsetDateTime, not_after: OffsetDateTime) -> Result<Self> {
        let validity = Self {
            not_before: to_whole_seconds(not_before),
            not_after: to_whole_seconds(not_after),
        };
        if validity.not_after < validity.not_before {
            return Err(MiniCaError::InvalidValidity(format!(
                "not after {} precedes not before {}",
                validity.not_after, validity.not_before
            )));
        }
        Ok(validity)
    }

    /// Window of a certificate without issuer. Unset bounds default to
    /// [`DEFAULT_BACKDATE`] before and [`DEFAULT_LIFETIME`] after now.
    pub fn self_signed(
        not_before: Option<OffsetDateTime>,
        not_after: Option<OffsetDateTime>,
    ) -> Result<Self> {
        let now = OffsetDateTime::now_utc();
        Self::new(
            not_before.unwrap_or(now - DEFAULT_BACKDATE),
            not_after.unwrap_or(now + DEFAULT_LIFETIME),
        )
    }

    /// Window of a certificate signed by an issuer valid during `self`.
    ///
    /// Unset bounds are inherited; explicit ones must lie within `self`.
    pub fn within(
        &self,
        not_before: Option<OffsetDateTime>,
        not_after: Option<OffsetDateTime>,
    ) -> Result<Self> {
        // Compare before truncating so sub-second overshoots are still caught.
        let not_before = not_before.unwrap_or(self.not_before);
        let not_after = not_after.unwrap_or(self.not_after);
        if not_before < self.not_before {
            return Err(MiniCaError::NotValidBeforeIssuer);
        }
        if not_after > self.not_after {
            return Err(MiniCaError::ExpiresAfterIssuer);
        }
        Self::new(not_before, not_after)
    }

    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    pub fn to_x509_validity(&self) -> Result<x509_cert::time::Validity> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }

    pub fn from_x509_validity(validity: &x509_cert::time::Validity) -> Result<Self> {
        Ok(Self {
            not_before: from_x509_time(validity.not_before)?,
            not_after: from_x509_time(validity.not_after)?,
        })
    }
}

fn to_whole_seconds(t: OffsetDateTime) -> OffsetDateTime {
    let t = t.to_offset(UtcOffset::UTC);
    t - Duration::nanoseconds(i64::from(t.nanosecond()))
}

/// UTCTime up to 2049, GeneralizedTime afterwards (RFC 5280, 4.1.2.5).
fn to_x509_time(t: OffsetDateTime) -> Result<x509_cert::time::Time> {
    let secs = u64::try_from(t.unix_timestamp()).map_err(|_| {
        MiniCaError::InvalidValidity(format!("{t} lies before the unix epoch"))
    })?;
    let dt = DateTime::from_unix_duration(StdDuration::from_secs(secs))?;
    if dt.year() < 2050 {
        Ok(x509_cert::time::Time::UtcTime(UtcTime::from_date_time(dt)?))
    } else {
        Ok(x509_cert::time::Time::GeneralTime(
            GeneralizedTime::from_date_time(dt),
        ))
    }
}

fn from_x509_time(t: x509_cert::time::Time) -> Result<OffsetDateTime> {
    let secs = i64::try_from(t.to_unix_duration().as_secs())
        .map_err(|_| MiniCaError::InvalidValidity(format!("{t:?} is out of range")))?;
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|e| MiniCaError::InvalidValidity(e.to_string()))
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }

    pub fn from_x509(extension: &x509_cert::ext::Extension) -> Self {
        Self {
            oid: extension.extn_id,
            critical: extension.critical,
            value: extension.extn_value.as_bytes().to_vec(),
        }
    }

    pub fn to_x509(&self) -> Result<x509_cert::ext::Extension> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.clone())?,
        })
    }
}
