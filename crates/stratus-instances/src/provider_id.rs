//! Provider id codec
//!
//! A provider id is the node's primary key towards the cloud. Two shapes
//! are in use:
//!
//! - `openstack:///<instance-id>` when provider ids are not region-qualified
//! - `openstack://<region>/<instance-id>` when they are
//!
//! Decoding accepts both, since clusters switched to regional ids later and
//! still carry nodes registered with the old shape.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::InstanceError;

/// Provider name used as the URI scheme
pub const PROVIDER_NAME: &str = "openstack";

static PROVIDER_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{}://([^/]*)/([^/]+)$", PROVIDER_NAME))
        .expect("static provider id regex is valid")
});

/// Decoded provider id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderId {
    instance_id: String,
    region: Option<String>,
}

impl ProviderId {
    /// Provider id without a region segment
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            region: None,
        }
    }

    /// Region-qualified provider id. An empty region yields the unqualified form.
    pub fn regional(instance_id: impl Into<String>, region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            instance_id: instance_id.into(),
            region: (!region.is_empty()).then_some(region),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Region segment, if the id carries one
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Whether this id may be resolved in `local_region`
    pub fn matches_region(&self, local_region: &str) -> bool {
        self.region().map_or(true, |region| region == local_region)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}://{}/{}", PROVIDER_NAME, region, self.instance_id),
            None => write!(f, "{}:///{}", PROVIDER_NAME, self.instance_id),
        }
    }
}

impl FromStr for ProviderId {
    type Err = InstanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ids written without a scheme predate the current format
        let qualified;
        let candidate = if !s.is_empty() && !s.contains("://") {
            qualified = format!("{}://{}", PROVIDER_NAME, s);
            qualified.as_str()
        } else {
            s
        };

        let caps = PROVIDER_ID
            .captures(candidate)
            .ok_or_else(|| InstanceError::MalformedProviderId {
                provider_id: s.to_string(),
            })?;

        Ok(ProviderId::regional(&caps[2], &caps[1]))
    }
}

/// Encode an instance id as a provider id.
///
/// The region is only embedded when `regional` is set. The instance id must
/// be non-empty and neither it nor an embedded region may contain `/`, or
/// the result would not decode back.
pub fn encode(instance_id: &str, region: &str, regional: bool) -> crate::Result<String> {
    let id = if regional {
        ProviderId::regional(instance_id, region)
    } else {
        ProviderId::new(instance_id)
    };

    let region_ok = id.region().map_or(true, |r| !r.contains('/'));
    if instance_id.is_empty() || instance_id.contains('/') || !region_ok {
        return Err(InstanceError::MalformedProviderId {
            provider_id: id.to_string(),
        });
    }

    Ok(id.to_string())
}

/// Decode a provider id into `(instance_id, region)`; region is empty when absent.
pub fn decode(provider_id: &str) -> crate::Result<(String, String)> {
    let parsed: ProviderId = provider_id.parse()?;
    let region = parsed.region.unwrap_or_default();
    Ok((parsed.instance_id, region))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode("abc", "RegionOne", true).unwrap(), "openstack://RegionOne/abc");
        assert_eq!(encode("abc", "RegionOne", false).unwrap(), "openstack:///abc");
        assert_eq!(encode("abc", "", false).unwrap(), "openstack:///abc");
        assert_eq!(encode("abc", "", true).unwrap(), "openstack:///abc");
    }

    #[test]
    fn test_encode_rejects_undecodable() {
        let bad = [
            ("a/b", "local", true),
            ("abc", "r/1", true),
            ("", "local", true),
            ("", "", false),
            ("a/b", "", false),
        ];
        for (id, region, regional) in bad {
            let err = encode(id, region, regional).unwrap_err();
            assert_eq!(
                err.kind(),
                ErrorKind::MalformedIdentity,
                "id {:?} region {:?}",
                id,
                region
            );
        }

        // the region is not embedded, so it is not checked
        assert_eq!(encode("abc", "r/1", false).unwrap(), "openstack:///abc");
    }

    #[test]
    fn test_decode() {
        assert_eq!(
            decode("openstack://RegionOne/abc").unwrap(),
            ("abc".to_string(), "RegionOne".to_string())
        );
        assert_eq!(
            decode("openstack:///abc").unwrap(),
            ("abc".to_string(), String::new())
        );
    }

    #[test]
    fn test_decode_without_scheme() {
        assert_eq!(
            decode("/abc").unwrap(),
            ("abc".to_string(), String::new())
        );
        assert_eq!(
            decode("RegionOne/abc").unwrap(),
            ("abc".to_string(), "RegionOne".to_string())
        );
    }

    #[test]
    fn test_decode_malformed() {
        let bad = [
            "",
            "abc",
            "openstack://",
            "openstack:///",
            "openstack://region",
            "openstack://region/a/b",
            "aws:///abc",
        ];
        for input in bad {
            let err = decode(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedIdentity, "input {:?}", input);
        }
    }

    #[test]
    fn test_provider_id_type() {
        let id: ProviderId = "openstack://local/xyz".parse().unwrap();
        assert_eq!(id.instance_id(), "xyz");
        assert_eq!(id.region(), Some("local"));
        assert!(id.matches_region("local"));
        assert!(!id.matches_region("remote"));

        let id: ProviderId = "openstack:///xyz".parse().unwrap();
        assert_eq!(id.region(), None);
        assert!(id.matches_region("anything"));
        assert_eq!(id.to_string(), "openstack:///xyz");
    }

    #[test]
    fn test_regional_empty_region_is_unqualified() {
        assert_eq!(ProviderId::regional("abc", "").to_string(), "openstack:///abc");
    }

    proptest! {
        #[test]
        fn test_round_trip_regional(id in "[^/]+", region in "[^/]*") {
            let encoded = encode(&id, &region, true).unwrap();
            prop_assert_eq!(decode(&encoded).unwrap(), (id, region));
        }

        #[test]
        fn test_round_trip_unqualified(id in "[^/]+", region in ".*") {
            let encoded = encode(&id, &region, false).unwrap();
            prop_assert_eq!(decode(&encoded).unwrap(), (id, String::new()));
        }

        #[test]
        fn test_encode_never_issues_undecodable(
            id in ".*",
            region in ".*",
            regional in any::<bool>()
        ) {
            if let Ok(encoded) = encode(&id, &region, regional) {
                prop_assert!(decode(&encoded).is_ok(), "{:?} does not decode", encoded);
            }
        }
    }
}
