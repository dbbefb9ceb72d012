// Copyright (c) 2025 - Cowboy AI, Inc.
//! Traffic Port and Protocol Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// IP protocol of an access grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    /// Every protocol (`-1`)
    All,
}

impl Protocol {
    /// Protocol value used in firewall rules
    pub fn as_ip_protocol(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::All => "-1",
        }
    }
}

/// Protocol plus an inclusive port range
///
/// # Examples
///
/// ```rust
/// use cim_blog_stack::domain::Port;
///
/// let http = Port::tcp(80);
/// assert!(http.is_single());
/// assert_eq!(http.to_string(), "tcp/80");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Port {
    protocol: Protocol,
    from_port: u16,
    to_port: u16,
}

impl Port {
    /// A single TCP port
    pub fn tcp(port: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            from_port: port,
            to_port: port,
        }
    }

    /// An inclusive TCP range; bounds are swapped when given backwards
    pub fn tcp_range(from_port: u16, to_port: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            from_port: from_port.min(to_port),
            to_port: from_port.max(to_port),
        }
    }

    /// A single UDP port
    pub fn udp(port: u16) -> Self {
        Self {
            protocol: Protocol::Udp,
            from_port: port,
            to_port: port,
        }
    }

    /// Every port of every protocol
    pub fn all_traffic() -> Self {
        Self {
            protocol: Protocol::All,
            from_port: 0,
            to_port: u16::MAX,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn from_port(&self) -> u16 {
        self.from_port
    }

    pub fn to_port(&self) -> u16 {
        self.to_port
    }

    /// Exactly one port of one protocol
    pub fn is_single(&self) -> bool {
        self.protocol != Protocol::All && self.from_port == self.to_port
    }

    /// Port part of a rule name (`3306`, `8000-9000`, `UDP 53`, `ALL TRAFFIC`)
    ///
    /// Distinct ports always get distinct labels; TCP is left unprefixed.
    pub fn label(&self) -> String {
        let range = if self.from_port == self.to_port {
            self.from_port.to_string()
        } else {
            format!("{}-{}", self.from_port, self.to_port)
        };
        match self.protocol {
            Protocol::All => "ALL TRAFFIC".to_string(),
            Protocol::Tcp => range,
            Protocol::Udp => format!("UDP {range}"),
        }
    }

    /// Check if this rule admits the given TCP port
    pub fn admits_tcp(&self, port: u16) -> bool {
        match self.protocol {
            Protocol::All => true,
            Protocol::Tcp => (self.from_port..=self.to_port).contains(&port),
            Protocol::Udp => false,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.protocol {
            Protocol::All => write!(f, "all traffic"),
            _ if self.from_port == self.to_port => {
                write!(f, "{}/{}", self.protocol.as_ip_protocol(), self.from_port)
            }
            _ => write!(
                f,
                "{}/{}-{}",
                self.protocol.as_ip_protocol(),
                self.from_port,
                self.to_port
            ),
        }
    }
}

/// Application protocol of a load balancer listener or target group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationProtocol {
    Http,
    Https,
}

impl ApplicationProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::Https => "HTTPS",
        }
    }

    /// Protocol implied by a port when none is given
    pub fn for_port(port: u16) -> Self {
        if port == 443 {
            Self::Https
        } else {
            Self::Http
        }
    }
}

impl fmt::Display for ApplicationProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
