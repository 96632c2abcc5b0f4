//! Web services exposed by the server next to ActiveSync.

use zpushsoap::SoapParameters;

/// Endpoint a SOAP request is sent to, selected through the `Cmd` query
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebService {
    /// Account-level information.
    Info,
    /// Calls scoped to this device.
    Device,
}

impl WebService {
    pub fn name(self) -> &'static str {
        match self {
            WebService::Info => "WebserviceInfo",
            WebService::Device => "WebserviceDevice",
        }
    }

    /// Parameters sent ahead of every request's own parameters.
    pub fn parameters(self, device_id: &str) -> Option<SoapParameters> {
        match self {
            WebService::Info => None,
            WebService::Device => Some(SoapParameters::new().with("devid", device_id.to_lowercase())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zpushsoap::SoapValue;

    #[test]
    fn device_service_sends_lower_case_id() {
        assert_eq!(WebService::Info.name(), "WebserviceInfo");
        assert!(WebService::Info.parameters("ABC").is_none());
        let params = WebService::Device.parameters("ABC123").unwrap();
        assert_eq!(params.get("devid"), Some(&SoapValue::from("abc123")));
    }
}
