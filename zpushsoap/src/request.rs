use xmltree::Element;

use crate::envelope::{build_request_envelope, parse_response};
use crate::error::Result;
use crate::parameters::SoapParameters;
use crate::serializer::deserialize;
use crate::shape::SoapDeserialize;

/// Suffix removed from type names when deriving request names.
const REQUEST_SUFFIX: &str = "Request";

/// Request name for the type `T`: its unqualified name without generic
/// arguments and without a trailing `Request`.
///
/// ```
/// struct GetSignaturesRequest;
/// assert_eq!(zpushsoap::request_name_of::<GetSignaturesRequest>(), "GetSignatures");
/// ```
pub fn request_name_of<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let name = base.rsplit("::").next().unwrap_or(base);
    name.strip_suffix(REQUEST_SUFFIX)
        .filter(|s| !s.is_empty())
        .unwrap_or(name)
}

/// A typed web-service call.
pub trait SoapRequest {
    type Response: SoapDeserialize;

    /// Name of the remote method. Derived from the type name unless
    /// overridden.
    fn request_name(&self) -> &'static str {
        request_name_of::<Self>()
    }

    fn parameters(&self) -> SoapParameters {
        SoapParameters::new()
    }

    /// User the call is made for, when it differs from the account user.
    fn user_name(&self) -> Option<&str> {
        None
    }

    /// Converts the `return` element into the response type.
    fn parse_response(&self, node: &Element) -> Result<Self::Response> {
        deserialize(node)
    }
}

/// Serializes `request` with the service-level defaults merged in.
pub fn encode_request<R: SoapRequest + ?Sized>(
    request: &R,
    namespace: &str,
    service_parameters: Option<&SoapParameters>,
) -> Result<String> {
    let request_parameters = request.parameters();
    let parameters = match service_parameters {
        Some(service) => SoapParameters::merge(service, &request_parameters),
        None => request_parameters,
    };
    build_request_envelope(namespace, request.request_name(), &parameters)
}

/// Parses the response document of `request`.
pub fn decode_response<R: SoapRequest + ?Sized>(request: &R, xml: &[u8]) -> Result<R::Response> {
    let node = parse_response(xml, request.request_name())?;
    request.parse_response(&node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SoapError;

    struct ListUserFoldersRequest {
        user: String,
    }

    impl SoapRequest for ListUserFoldersRequest {
        type Response = Vec<String>;

        fn user_name(&self) -> Option<&str> {
            Some(&self.user)
        }
    }

    struct Wrapper<T>(T);

    impl<T> SoapRequest for Wrapper<T> {
        type Response = bool;

        fn request_name(&self) -> &'static str {
            "Custom"
        }

        fn parameters(&self) -> SoapParameters {
            SoapParameters::new().with("store", "john")
        }
    }

    #[test]
    fn names_are_derived_from_types() {
        let request = ListUserFoldersRequest { user: "jane".into() };
        assert_eq!(request.request_name(), "ListUserFolders");
        assert_eq!(request.user_name(), Some("jane"));
        assert_eq!(request_name_of::<Wrapper<u8>>(), "Wrapper");
        assert_eq!(request_name_of::<Request>(), "Request");
    }

    struct Request;

    #[test]
    fn service_parameters_come_first() {
        let service = SoapParameters::new().with("devid", "abc");
        let xml = encode_request(&Wrapper(()), "urn:test", Some(&service)).unwrap();
        let devid = xml.find("<devid").unwrap();
        let store = xml.find("<store").unwrap();
        assert!(devid < store);
        assert!(xml.contains("<Custom>"));
    }

    #[test]
    fn decodes_typed_response() {
        let xml = br#"<Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema"><Body><ListUserFoldersResponse><return xsi:type="SOAP-ENC:Array" xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/"><item xsi:type="xsd:string">Inbox</item><item xsi:type="xsd:string">Sent</item></return></ListUserFoldersResponse></Body></Envelope>"#;
        let request = ListUserFoldersRequest { user: "jane".into() };
        assert_eq!(
            decode_response(&request, xml).unwrap(),
            vec!["Inbox".to_string(), "Sent".to_string()]
        );
        let wrong = Wrapper(());
        assert_eq!(
            decode_response(&wrong, xml),
            Err(SoapError::MissingResponse("Custom".into()))
        );
    }
}
