use crate::error::MaskError;
use std::net::IpAddr;

/// High-bit masks for the bits left over after the whole-byte comparison.
/// Index `n - 1` keeps the top `n` bits.
const LEADING_BITS: [u8; 8] = [
	0x80, // 10000000 - 1 bit
	0xC0, // 11000000 - 2 bits
	0xE0, // 11100000 - 3 bits
	0xF0, // 11110000 - 4 bits
	0xF8, // 11111000 - 5 bits
	0xFC, // 11111100 - 6 bits
	0xFE, // 11111110 - 7 bits
	0xFF, // 11111111 - 8 bits
];

/// Compares the first `prefix_bits` bits of `address` against `mask`.
///
/// Buffers of different length, or a prefix longer than the buffer, never
/// match. A zero-length prefix matches everything.
pub fn match_cidr_bits(address: &[u8], mask: &[u8], prefix_bits: u32) -> bool {
	if address.len() != mask.len() || prefix_bits as usize > mask.len() * 8 {
		return false;
	}

	let whole = (prefix_bits / 8) as usize;
	let rest = (prefix_bits % 8) as usize;

	if address[..whole] != mask[..whole] {
		return false;
	}
	if rest > 0 {
		let keep = LEADING_BITS[rest - 1];
		if address[whole] & keep != mask[whole] & keep {
			return false;
		}
	}
	true
}

/// A binary address prefix: `prefix_bits` leading bits of `bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMask {
	bytes: Vec<u8>,
	prefix_bits: u32,
}

impl AddressMask {
	/// Builds a mask over a 4-byte (IPv4) or 16-byte (IPv6) buffer.
	pub fn new(bytes: impl Into<Vec<u8>>, prefix_bits: u32) -> Result<Self, MaskError> {
		let bytes = bytes.into();
		if bytes.len() != 4 && bytes.len() != 16 {
			return Err(MaskError::InvalidLength { len: bytes.len() });
		}
		if prefix_bits as usize > bytes.len() * 8 {
			return Err(MaskError::PrefixTooLong { bits: prefix_bits, len: bytes.len() });
		}
		Ok(Self { bytes, prefix_bits })
	}

	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	pub fn prefix_bits(&self) -> u32 {
		self.prefix_bits
	}

	/// True when `address` shares this mask's prefix.
	#[inline]
	pub fn matches(&self, address: &[u8]) -> bool {
		match_cidr_bits(address, &self.bytes, self.prefix_bits)
	}
}

/// Textual CIDR such as `10.0.0.0/8` or `2001:db8::/32`.
///
/// A bare address is a full-length prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cidr {
	mask: AddressMask,
}

impl Cidr {
	pub fn parse(input: &str) -> Result<Self, MaskError> {
		let parse_err = || MaskError::Parse { input: input.to_string() };
		let (ip, bits) = match input.trim().split_once('/') {
			Some((ip, bits)) => (ip, Some(bits.parse::<u32>().map_err(|_| parse_err())?)),
			None => (input.trim(), None),
		};
		let bytes = match ip.parse::<IpAddr>().map_err(|_| parse_err())? {
			IpAddr::V4(ip) => ip.octets().to_vec(),
			IpAddr::V6(ip) => ip.octets().to_vec(),
		};
		let bits = bits.unwrap_or(bytes.len() as u32 * 8);
		Ok(Self { mask: AddressMask::new(bytes, bits)? })
	}

	pub fn mask(&self) -> &AddressMask {
		&self.mask
	}

	/// IPv4-mapped IPv6 peers (`::ffff:a.b.c.d`) are checked as IPv4
	/// against IPv4 masks and as-is against IPv6 masks.
	pub fn contains(&self, peer: IpAddr) -> bool {
		match peer {
			IpAddr::V4(ip) => self.mask.matches(&ip.octets()),
			IpAddr::V6(ip) if self.mask.bytes.len() == 4 => match ip.to_ipv4_mapped() {
				Some(v4) => self.mask.matches(&v4.octets()),
				None => false,
			},
			IpAddr::V6(ip) => self.mask.matches(&ip.octets()),
		}
	}
}

impl std::str::FromStr for Cidr {
	type Err = MaskError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Cidr::parse(s)
	}
}

impl std::fmt::Display for Cidr {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let ip: IpAddr = match self.mask.bytes.len() {
			4 => IpAddr::from(<[u8; 4]>::try_from(&self.mask.bytes[..]).map_err(|_| std::fmt::Error)?),
			_ => IpAddr::from(<[u8; 16]>::try_from(&self.mask.bytes[..]).map_err(|_| std::fmt::Error)?),
		};
		write!(f, "{}/{}", ip, self.mask.prefix_bits)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn differences_past_the_prefix_are_ignored() {
		let base = 0xC0A8_0100u32;
		for bits in 0..=32u32 {
			// flip the first bit after the prefix, if there is one
			let other = if bits < 32 { base ^ (1 << (31 - bits)) } else { base };
			assert!(
				match_cidr_bits(&other.to_be_bytes(), &base.to_be_bytes(), bits),
				"prefix {bits} should ignore bit {bits}"
			);
		}
	}

	#[test]
	fn differences_inside_the_prefix_are_caught() {
		let base = 0x0A00_0000u32;
		for bits in 1..=32u32 {
			// flip the last bit inside the prefix
			let other = base ^ (1 << (32 - bits));
			assert!(
				!match_cidr_bits(&other.to_be_bytes(), &base.to_be_bytes(), bits),
				"prefix {bits} should compare bit {}",
				bits - 1
			);
		}
	}

	#[test]
	fn reflexive_over_the_full_length() {
		let v4 = [203, 0, 113, 7];
		let v6 = [0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x12, 0x34];
		assert!(match_cidr_bits(&v4, &v4, 32));
		assert!(match_cidr_bits(&v6, &v6, 128));
	}

	#[test]
	fn zero_prefix_matches_anything() {
		assert!(match_cidr_bits(&[1, 2, 3, 4], &[255, 255, 255, 255], 0));
		assert!(match_cidr_bits(&[0; 16], &[0xff; 16], 0));
	}

	#[test]
	fn remainder_bits_use_the_mask_side_too() {
		// 10.128.0.0/9 must not match 10.0.0.0, even though 10.0.0.0 & 0x80 == 0
		assert!(!match_cidr_bits(&[10, 0, 0, 0], &[10, 128, 0, 0], 9));
		assert!(match_cidr_bits(&[10, 200, 1, 1], &[10, 128, 0, 0], 9));
		// 3 leftover bits -> 0xE0
		assert!(match_cidr_bits(&[172, 0b1011_1111, 0, 0], &[172, 0b1010_0000, 0, 0], 11));
		assert!(!match_cidr_bits(&[172, 0b1100_0000, 0, 0], &[172, 0b1010_0000, 0, 0], 11));
	}

	#[test]
	fn bad_preconditions_never_match() {
		assert!(!match_cidr_bits(&[1, 2, 3, 4], &[1, 2, 3, 4, 5], 8));
		assert!(!match_cidr_bits(&[1, 2, 3, 4], &[1, 2, 3, 4], 33));
	}

	#[test]
	fn mask_construction_is_validated() {
		assert_eq!(AddressMask::new(vec![1, 2, 3], 8), Err(MaskError::InvalidLength { len: 3 }));
		assert_eq!(
			AddressMask::new([0u8; 4], 40),
			Err(MaskError::PrefixTooLong { bits: 40, len: 4 })
		);
		let mask = AddressMask::new([192, 168, 0, 0], 16).unwrap();
		assert!(mask.matches(&[192, 168, 44, 1]));
		assert!(!mask.matches(&[192, 169, 0, 1]));
	}

	#[test]
	fn cidr_text_forms() {
		let lan: Cidr = "192.168.0.0/16".parse().unwrap();
		assert!(lan.contains("192.168.7.9".parse().unwrap()));
		assert!(!lan.contains("10.0.0.1".parse().unwrap()));
		assert_eq!(lan.to_string(), "192.168.0.0/16");

		let host = Cidr::parse("2001:db8::1").unwrap();
		assert_eq!(host.mask().prefix_bits(), 128);
		assert!(host.contains("2001:db8::1".parse().unwrap()));

		assert!(Cidr::parse("10.0.0.0/abc").is_err());
		assert!(Cidr::parse("nope/8").is_err());
		assert!(matches!(Cidr::parse("10.0.0.0/33"), Err(MaskError::PrefixTooLong { .. })));
	}

	#[test]
	fn mapped_ipv6_peer_is_compared_as_ipv4() {
		let lan = Cidr::parse("192.168.0.0/16").unwrap();
		assert!(lan.contains("::ffff:192.168.3.4".parse().unwrap()));
		assert!(!lan.contains("2001:db8::1".parse().unwrap()));
	}

	#[test]
	fn mapped_form_mask_matches_mapped_peer() {
		let mapped = Cidr::parse("::ffff:192.0.2.0/120").unwrap();
		assert!(mapped.contains("::ffff:192.0.2.7".parse().unwrap()));
		assert!(!mapped.contains("::ffff:198.51.100.7".parse().unwrap()));
		// a plain IPv4 peer is a different family from a 16-byte mask
		assert!(!mapped.contains("192.0.2.7".parse().unwrap()));
	}
}
