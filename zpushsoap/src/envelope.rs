//! Building SOAP requests and parsing their responses

use std::io::BufReader;

use tracing::{debug, trace};
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::{Result, SoapError};
use crate::parameters::SoapParameters;
use crate::serializer::serialize;
use crate::xml::{child, find_descendant, inner_text};
use crate::{XMLNS_APACHE, XMLNS_SOAP_ENC, XMLNS_SOAP_ENV, XMLNS_XSD, XMLNS_XSI};

/// Builds the request envelope:
/// `<soap:Envelope><soap:Body><RequestName>params</RequestName></soap:Body></soap:Envelope>`,
/// with `namespace` as the default namespace.
pub fn build_request_envelope(
    namespace: &str,
    request_name: &str,
    parameters: &SoapParameters,
) -> Result<String> {
    let mut request = Element::new(request_name);
    for (name, value) in parameters.iter() {
        request.children.push(XMLNode::Element(serialize(name, value)));
    }

    let mut body = Element::new("soap:Body");
    body.children.push(XMLNode::Element(request));

    let mut envelope = Element::new("soap:Envelope");
    for (attr, uri) in [
        ("xmlns:xsi", XMLNS_XSI),
        ("xmlns:xsd", XMLNS_XSD),
        ("xmlns:soap", XMLNS_SOAP_ENV),
        ("xmlns:soap-enc", XMLNS_SOAP_ENC),
        ("xmlns:ns2", XMLNS_APACHE),
        ("xmlns", namespace),
    ] {
        envelope.attributes.insert(attr.to_string(), uri.to_string());
    }
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(false);
    envelope.write_with_config(&mut buf, config)?;
    let xml = String::from_utf8(buf).map_err(|e| SoapError::Emit(e.to_string()))?;
    trace!(request = request_name, "SOAP request:\n{}", xml);
    Ok(xml)
}

/// The `Fault` held anywhere in the document, as [`SoapError::Fault`].
pub fn find_fault(root: &Element) -> Option<SoapError> {
    let fault = find_descendant(root, "Fault")?;
    let text = |name: &str| {
        child(fault, name)
            .map(|e| inner_text(e).trim().to_string())
            .filter(|s| !s.is_empty())
    };
    Some(SoapError::Fault {
        code: text("faultcode"),
        message: text("faultstring"),
    })
}

/// Fails with [`SoapError::Fault`] if the document holds a `Fault` anywhere
/// or has no `Body`.
pub fn check_fault(root: &Element) -> Result<()> {
    if let Some(fault) = find_fault(root) {
        debug!(fault = %fault, "SOAP fault");
        return Err(fault);
    }
    if find_descendant(root, "Body").is_none() {
        return Err(SoapError::Fault {
            code: None,
            message: Some("response has no SOAP Body".to_string()),
        });
    }
    Ok(())
}

/// Parses a response document and returns its `<RequestName>Response/return`
/// element, namespace prefixes ignored.
pub fn parse_response(xml: &[u8], request_name: &str) -> Result<Element> {
    let root = Element::parse(BufReader::new(xml))?;
    check_fault(&root)?;
    let response_name = format!("{request_name}Response");
    find_descendant(&root, &response_name)
        .and_then(|response| child(response, "return"))
        .cloned()
        .ok_or_else(|| SoapError::MissingResponse(request_name.to_string()))
}
