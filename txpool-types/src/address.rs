use crate::H160;

#[cfg(not(feature = "std"))]
use alloc::string::String;

/// Base Eth address type.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address(H160);

impl Address {
    /// Construct an address from an H160.
    #[must_use]
    pub const fn new(val: H160) -> Self {
        Self(val)
    }

    /// Get the raw H160 data.
    #[must_use]
    pub const fn raw(&self) -> H160 {
        self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Encode the address as a lowercase hex string without a `0x` prefix.
    #[must_use]
    pub fn encode(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    pub fn decode(address: &str) -> Result<Self, error::AddressError> {
        if address.len() != 40 {
            return Err(error::AddressError::IncorrectLength);
        }
        let mut result = [0u8; 20];
        hex::decode_to_slice(address, &mut result)
            .map_err(|_| error::AddressError::FailedDecodeHex)?;
        Ok(Self::new(H160(result)))
    }

    pub fn try_from_slice(raw_addr: &[u8]) -> Result<Self, error::AddressError> {
        if raw_addr.len() != 20 {
            return Err(error::AddressError::IncorrectLength);
        }
        Ok(Self::new(H160::from_slice(raw_addr)))
    }

    #[must_use]
    pub const fn from_array(array: [u8; 20]) -> Self {
        Self(H160(array))
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self::new(H160([0u8; 20]))
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = error::AddressError;

    fn try_from(raw_addr: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from_slice(raw_addr)
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::zero()
    }
}

pub mod error {
    use core::fmt;

    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum AddressError {
        FailedDecodeHex,
        IncorrectLength,
    }

    impl fmt::Display for AddressError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::FailedDecodeHex => f.write_str("address is not valid hex"),
                Self::IncorrectLength => f.write_str("address must be 20 bytes long"),
            }
        }
    }

    #[cfg(feature = "std")]
    impl std::error::Error for AddressError {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_from_slice() {
        let raw = hex::decode("096de9c2b8a5b8c22cee3289b101f6960d68e51e").unwrap();
        let addr = Address::try_from_slice(&raw).unwrap();
        assert_eq!(addr.as_bytes(), &raw[..]);
        assert_eq!(addr.encode(), "096de9c2b8a5b8c22cee3289b101f6960d68e51e");
    }

    #[test]
    fn test_address_decode() {
        let addr = Address::decode("096DE9C2B8A5B8c22cEe3289B101f6960d68E51E").unwrap();
        assert_eq!(
            addr.encode(),
            "096DE9C2B8A5B8c22cEe3289B101f6960d68E51E".to_lowercase()
        );
    }

    #[test]
    fn test_wrong_address_19() {
        let err = Address::try_from_slice(&[0u8; 19]).unwrap_err();
        assert_eq!(err, error::AddressError::IncorrectLength);
    }

    #[test]
    fn test_address_decode_bad_hex() {
        let err = Address::decode("zz6de9c2b8a5b8c22cee3289b101f6960d68e51e").unwrap_err();
        assert_eq!(err, error::AddressError::FailedDecodeHex);
    }

    #[test]
    fn test_zero_is_default() {
        assert_eq!(Address::default(), Address::zero());
        assert_eq!(Address::zero().raw(), H160([0u8; 20]));
    }
}
