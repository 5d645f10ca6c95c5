use std::fmt;

/// Priority of a data channel, carried in the DCEP open message.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcprioritytype)
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum RTCPriorityType {
    Unspecified = 0,

    VeryLow,

    #[default]
    Low,

    Medium,

    High,
}

const PRIORITY_VERY_LOW_STR: &str = "very-low";
const PRIORITY_LOW_STR: &str = "low";
const PRIORITY_MEDIUM_STR: &str = "medium";
const PRIORITY_HIGH_STR: &str = "high";

impl From<&str> for RTCPriorityType {
    fn from(raw: &str) -> Self {
        match raw {
            PRIORITY_VERY_LOW_STR => RTCPriorityType::VeryLow,
            PRIORITY_LOW_STR => RTCPriorityType::Low,
            PRIORITY_MEDIUM_STR => RTCPriorityType::Medium,
            PRIORITY_HIGH_STR => RTCPriorityType::High,
            _ => RTCPriorityType::Unspecified,
        }
    }
}

impl fmt::Display for RTCPriorityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCPriorityType::VeryLow => write!(f, "{PRIORITY_VERY_LOW_STR}"),
            RTCPriorityType::Low => write!(f, "{PRIORITY_LOW_STR}"),
            RTCPriorityType::Medium => write!(f, "{PRIORITY_MEDIUM_STR}"),
            RTCPriorityType::High => write!(f, "{PRIORITY_HIGH_STR}"),
            _ => write!(f, "{}", crate::peer_connection::configuration::UNSPECIFIED_STR),
        }
    }
}

impl RTCPriorityType {
    /// The numeric priority written into the DCEP open message.
    pub(crate) fn dcep_priority(&self) -> u16 {
        match *self {
            RTCPriorityType::VeryLow => 128,
            RTCPriorityType::Low => 256,
            RTCPriorityType::Medium => 512,
            RTCPriorityType::High => 1024,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_priority_conversions() {
        let tests = vec![
            ("very-low", RTCPriorityType::VeryLow, 128),
            ("low", RTCPriorityType::Low, 256),
            ("medium", RTCPriorityType::Medium, 512),
            ("high", RTCPriorityType::High, 1024),
        ];

        for (priority_string, expected_priority, expected_dcep) in tests {
            assert_eq!(RTCPriorityType::from(priority_string), expected_priority);
            assert_eq!(expected_priority.to_string(), priority_string);
            assert_eq!(expected_priority.dcep_priority(), expected_dcep);
        }

        assert_eq!(RTCPriorityType::default(), RTCPriorityType::Low);
    }
}
