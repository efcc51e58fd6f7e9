use serde::Deserialize;
use std::net::IpAddr;
use crate::addr::BindAddr;
use crate::error::SpecError;

/// Kind tags handled by the core binder. Anything else belongs to
/// other components (server links, etc.) and is left alone.
const CLIENT_KINDS: [&str; 2] = ["", "clients"];

/// Port as written in the configuration, either `6667` or `"6667"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
	Number(i64),
	Text(String),
}

impl From<u16> for PortValue {
	fn from(port: u16) -> Self {
		PortValue::Number(port as i64)
	}
}

impl PortValue {
	fn resolve(&self) -> Result<u16, SpecError> {
		let port = match self {
			PortValue::Number(n) => *n,
			PortValue::Text(text) => text.trim().parse::<i64>().map_err(|_| SpecError::InvalidPort {
				value: text.clone(),
			})?,
		};
		match u16::try_from(port) {
			Ok(p) if p != 0 => Ok(p),
			_ => Err(SpecError::PortOutOfRange { port }),
		}
	}
}

/// One `bind` entry from the configuration, unvalidated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BindEntry {
	pub port: PortValue,
	#[serde(default)]
	pub address: String,
	#[serde(default, rename = "type")]
	pub kind: String,
}

impl BindEntry {
	pub fn new(port: u16, address: impl Into<String>, kind: impl Into<String>) -> Self {
		Self {
			port: PortValue::from(port),
			address: address.into(),
			kind: kind.into(),
		}
	}

	/// True for entries the core binder is responsible for.
	pub fn is_client_kind(&self) -> bool {
		CLIENT_KINDS.contains(&self.kind.as_str())
	}
}

/// A validated request to listen on `address:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSpec {
	port: u16,
	/// `*` is collapsed to the empty string.
	address: String,
	bind_addr: BindAddr,
	kind: String,
}

impl ListenerSpec {
	pub fn port(&self) -> u16 {
		self.port
	}

	/// Normalized address text, empty for the wildcard.
	pub fn address(&self) -> &str {
		&self.address
	}

	pub fn bind_addr(&self) -> BindAddr {
		self.bind_addr
	}

	pub fn kind(&self) -> &str {
		&self.kind
	}
}

impl TryFrom<&BindEntry> for ListenerSpec {
	type Error = SpecError;

	fn try_from(entry: &BindEntry) -> Result<Self, Self::Error> {
		let port = entry.port.resolve()?;
		let address = normalize_address(&entry.address);
		let bind_addr = BindAddr::parse(&address)?;
		Ok(Self {
			port,
			address,
			bind_addr,
			kind: entry.kind.clone(),
		})
	}
}

/// `*` and surrounding whitespace collapse to the empty wildcard.
/// Literal IPs are rewritten in canonical form, so `::1` and
/// `0:0:0:0:0:0:0:1` are the same listener.
pub(crate) fn normalize_address(address: &str) -> String {
	match address.trim() {
		"*" => String::new(),
		other => other
			.parse::<IpAddr>()
			.map(|ip| ip.to_string())
			.unwrap_or_else(|_| other.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn star_collapses_to_empty() {
		let spec = ListenerSpec::try_from(&BindEntry::new(6667, "*", "")).unwrap();
		assert_eq!(spec.address(), "");
		assert_eq!(spec.bind_addr(), BindAddr::Any);
		assert_eq!(spec.port(), 6667);
	}

	#[test]
	fn literal_addresses_are_canonical() {
		let long = ListenerSpec::try_from(&BindEntry::new(6697, "0:0:0:0:0:0:0:1", "")).unwrap();
		assert_eq!(long.address(), "::1");
		let upper = ListenerSpec::try_from(&BindEntry::new(6697, "2001:DB8:0::1", "")).unwrap();
		assert_eq!(upper.address(), "2001:db8::1");
		assert_eq!(normalize_address(" 127.0.0.1 "), "127.0.0.1");
	}

	#[test]
	fn textual_ports_are_accepted() {
		let entry = BindEntry {
			port: PortValue::Text(" 7000 ".into()),
			address: "127.0.0.1".into(),
			kind: "clients".into(),
		};
		let spec = ListenerSpec::try_from(&entry).unwrap();
		assert_eq!(spec.port(), 7000);
		assert_eq!(spec.kind(), "clients");
		assert_eq!(spec.bind_addr(), BindAddr::V4([127, 0, 0, 1]));
	}

	#[test]
	fn bad_ports_are_rejected() {
		let text = BindEntry { port: PortValue::Text("ircd".into()), address: String::new(), kind: String::new() };
		assert_eq!(
			ListenerSpec::try_from(&text),
			Err(SpecError::InvalidPort { value: "ircd".into() })
		);
		for port in [0, -1, 65536] {
			let entry = BindEntry { port: PortValue::Number(port), address: String::new(), kind: String::new() };
			assert_eq!(ListenerSpec::try_from(&entry), Err(SpecError::PortOutOfRange { port }));
		}
	}

	#[test]
	fn bad_address_is_rejected() {
		assert!(matches!(
			ListenerSpec::try_from(&BindEntry::new(6667, "localhost", "")),
			Err(SpecError::InvalidAddress { .. })
		));
	}

	#[test]
	fn only_client_kinds_belong_to_the_binder() {
		assert!(BindEntry::new(6667, "", "").is_client_kind());
		assert!(BindEntry::new(6667, "", "clients").is_client_kind());
		assert!(!BindEntry::new(7000, "", "servers").is_client_kind());
		assert!(!BindEntry::new(7000, "", "Clients").is_client_kind());
	}
}
