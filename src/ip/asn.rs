//! Autonomous System (AS) number checks.
//!
//! The hub takes a private ASN; the customer gateway takes any non-zero
//! 32-bit ASN distinct from the hub's.

use crate::config::ValidationError;
use std::ops::RangeInclusive;

/// 16-bit private ASN range
pub const PRIVATE_ASN_16: RangeInclusive<u64> = 64512..=65534;

/// 32-bit private ASN range
pub const PRIVATE_ASN_32: RangeInclusive<u64> = 4_200_000_000..=4_294_967_294;

/// Check that an ASN is usable by the hub
pub fn validate_hub_asn(asn: u64) -> Result<u32, ValidationError> {
    if !PRIVATE_ASN_16.contains(&asn) && !PRIVATE_ASN_32.contains(&asn) {
        return Err(ValidationError::InvalidAsn(format!(
            "hub ASN {} is outside the private ranges {}-{} and {}-{}",
            asn,
            PRIVATE_ASN_16.start(),
            PRIVATE_ASN_16.end(),
            PRIVATE_ASN_32.start(),
            PRIVATE_ASN_32.end()
        )));
    }
    u32::try_from(asn).map_err(|_| {
        ValidationError::InvalidAsn(format!("hub ASN {} does not fit 32 bits", asn))
    })
}

/// Check that an ASN is usable by the customer gateway
pub fn validate_customer_asn(asn: u64, hub_asn: Option<u32>) -> Result<u32, ValidationError> {
    if asn == 0 {
        return Err(ValidationError::InvalidAsn(
            "customer ASN must be non-zero".to_string(),
        ));
    }
    let asn = u32::try_from(asn).map_err(|_| {
        ValidationError::InvalidAsn(format!("customer ASN {} does not fit 32 bits", asn))
    })?;
    if hub_asn == Some(asn) {
        return Err(ValidationError::InvalidAsn(format!(
            "customer ASN {} collides with the hub ASN",
            asn
        )));
    }
    Ok(asn)
}
