//! Discord member permission bitfields.

use std::fmt;

use axum::http::HeaderMap;

use crate::error::CogbotError;
use crate::Result;

/// Header carrying the invoking member's resolved permissions, as the decimal
/// string Discord uses on the wire.
pub const PERMISSIONS_HEADER: &str = "x-member-permissions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Permissions(u64);

impl Permissions {
    pub const ADMINISTRATOR: Self = Self(1 << 3);
    pub const MANAGE_CHANNELS: Self = Self(1 << 4);
    pub const MANAGE_GUILD: Self = Self(1 << 5);
    pub const MANAGE_MESSAGES: Self = Self(1 << 13);
    pub const MANAGE_ROLES: Self = Self(1 << 28);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn parse(value: &str) -> Result<Self> {
        value
            .trim()
            .parse()
            .map(Self)
            .map_err(|_| CogbotError::InvalidInput(format!("invalid permission bitfield: {value:?}")))
    }

    /// Administrators implicitly hold every permission.
    pub fn can_manage_guild(&self) -> bool {
        self.contains(Self::ADMINISTRATOR) || self.contains(Self::MANAGE_GUILD)
    }

    /// Read [`PERMISSIONS_HEADER`]; a missing header means no permissions.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        match headers.get(PERMISSIONS_HEADER) {
            None => Ok(Self::default()),
            Some(value) => {
                let value = value.to_str().map_err(|_| {
                    CogbotError::InvalidInput("permission header is not ASCII".into())
                })?;
                Self::parse(value)
            }
        }
    }

    /// Fail with [`CogbotError::PermissionDenied`] unless the member may
    /// change guild settings.
    pub fn require_manage_guild(headers: &HeaderMap) -> Result<Self> {
        let permissions = Self::from_headers(headers)?;
        if permissions.can_manage_guild() {
            Ok(permissions)
        } else {
            Err(CogbotError::PermissionDenied(
                "Manage Server or Administrator".into(),
            ))
        }
    }
}

impl std::ops::BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_contains() {
        let perms = Permissions::MANAGE_MESSAGES | Permissions::MANAGE_ROLES;
        assert!(perms.contains(Permissions::MANAGE_ROLES));
        assert!(!perms.contains(Permissions::MANAGE_GUILD));
        assert!(!perms.can_manage_guild());
    }

    #[test]
    fn test_admin_or_manage_guild() {
        assert!(Permissions::ADMINISTRATOR.can_manage_guild());
        assert!(Permissions::MANAGE_GUILD.can_manage_guild());
        assert!(!Permissions::MANAGE_CHANNELS.can_manage_guild());
    }

    #[test]
    fn test_parse() {
        assert_eq!(Permissions::parse("8").unwrap(), Permissions::ADMINISTRATOR);
        assert_eq!(Permissions::parse(" 40 ").unwrap().bits(), 40);
        assert!(Permissions::parse("-1").is_err());
        assert!(Permissions::parse("admin").is_err());
    }

    #[test]
    fn test_require_manage_guild() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            Permissions::require_manage_guild(&headers),
            Err(CogbotError::PermissionDenied(_))
        ));

        headers.insert(PERMISSIONS_HEADER, HeaderValue::from_static("2048"));
        assert!(Permissions::require_manage_guild(&headers).is_err());

        headers.insert(PERMISSIONS_HEADER, HeaderValue::from_static("32"));
        assert!(Permissions::require_manage_guild(&headers).is_ok());
    }
}
