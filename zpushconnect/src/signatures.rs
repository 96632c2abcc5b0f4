//! Signatures configured on the server (`GetSignatures`).

use std::collections::BTreeMap;

use zpushsoap::{RecordReader, SoapDeserialize, SoapField, SoapRequest, SoapShape, SoapValue};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub id: String,
    pub name: String,
    pub content: String,
    pub is_html: bool,
}

static SIGNATURE_FIELDS: &[SoapField] = &[
    SoapField::new("id", String::shape),
    SoapField::new("name", String::shape),
    SoapField::new("content", String::shape),
    SoapField::new("isHTML", bool::shape),
];

impl SoapDeserialize for Signature {
    fn shape() -> SoapShape {
        SoapShape::Record(SIGNATURE_FIELDS)
    }

    fn from_soap(value: SoapValue) -> zpushsoap::Result<Self> {
        let mut record = RecordReader::new(value)?;
        Ok(Signature {
            id: record.required("id")?,
            name: record.or_default("name")?,
            content: record.or_default("content")?,
            is_html: record.or_default("isHTML")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signatures {
    /// Signatures by id.
    pub all: BTreeMap<String, Signature>,
    /// Id of the default signature for new messages.
    pub new_message: Option<String>,
    /// Id of the default signature for replies and forwards.
    pub replyforward_message: Option<String>,
    pub hash: Option<String>,
}

impl Signatures {
    pub fn for_new_message(&self) -> Option<&Signature> {
        self.new_message.as_ref().and_then(|id| self.all.get(id))
    }

    pub fn for_reply_forward(&self) -> Option<&Signature> {
        self.replyforward_message.as_ref().and_then(|id| self.all.get(id))
    }
}

static SIGNATURES_FIELDS: &[SoapField] = &[
    SoapField::new("all", <BTreeMap<String, Signature>>::shape),
    SoapField::new("new_message", String::shape),
    SoapField::new("replyforward_message", String::shape),
    SoapField::new("hash", String::shape),
];

impl SoapDeserialize for Signatures {
    fn shape() -> SoapShape {
        SoapShape::Record(SIGNATURES_FIELDS)
    }

    fn from_soap(value: SoapValue) -> zpushsoap::Result<Self> {
        let mut record = RecordReader::new(value)?;
        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
        Ok(Signatures {
            all: record.or_default("all")?,
            new_message: non_empty(record.optional("new_message")?),
            replyforward_message: non_empty(record.optional("replyforward_message")?),
            hash: non_empty(record.optional("hash")?),
        })
    }
}

/// Fetches all signatures of the account, on the info service.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetSignaturesRequest;

impl SoapRequest for GetSignaturesRequest {
    type Response = Signatures;
}

#[cfg(test)]
mod tests {
    use super::*;
    use zpushsoap::decode_response;

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/" xmlns:ns1="mail.example.com" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:ns2="http://xml.apache.org/xml-soap" xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/"><SOAP-ENV:Body><ns1:GetSignaturesResponse><return xsi:type="ns2:Map">
<item><key xsi:type="xsd:string">all</key><value xsi:type="ns2:Map">
  <item><key xsi:type="xsd:int">12</key><value xsi:type="ns2:Map">
    <item><key xsi:type="xsd:string">id</key><value xsi:type="xsd:int">12</value></item>
    <item><key xsi:type="xsd:string">name</key><value xsi:type="xsd:string">Work</value></item>
    <item><key xsi:type="xsd:string">content</key><value xsi:type="xsd:string">&lt;b&gt;John&lt;/b&gt;</value></item>
    <item><key xsi:type="xsd:string">isHTML</key><value xsi:type="xsd:boolean">true</value></item>
  </value></item>
</value></item>
<item><key xsi:type="xsd:string">new_message</key><value xsi:type="xsd:string">12</value></item>
<item><key xsi:type="xsd:string">replyforward_message</key><value xsi:nil="true"/></item>
<item><key xsi:type="xsd:string">hash</key><value xsi:type="xsd:string">5f2b</value></item>
</return></ns1:GetSignaturesResponse></SOAP-ENV:Body></SOAP-ENV:Envelope>"#;

    #[test]
    fn request_name() {
        assert_eq!(GetSignaturesRequest.request_name(), "GetSignatures");
    }

    #[test]
    fn parses_php_map() {
        let signatures = decode_response(&GetSignaturesRequest, RESPONSE.as_bytes()).unwrap();
        let work = signatures.for_new_message().unwrap();
        assert_eq!(work.id, "12");
        assert_eq!(work.name, "Work");
        assert_eq!(work.content, "<b>John</b>");
        assert!(work.is_html);
        assert_eq!(signatures.for_reply_forward(), None);
        assert_eq!(signatures.hash.as_deref(), Some("5f2b"));
    }

    #[test]
    fn empty_signature_list() {
        let xml = r#"<Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:ns2="http://xml.apache.org/xml-soap" xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/"><Body><GetSignaturesResponse><return xsi:type="ns2:Map"><item><key xsi:type="xsd:string">all</key><value xsi:type="SOAP-ENC:Array" SOAP-ENC:arrayType="xsd:anyType[0]"/></item><item><key xsi:type="xsd:string">hash</key><value xsi:type="xsd:string"></value></item></return></GetSignaturesResponse></Body></Envelope>"#;
        let signatures = decode_response(&GetSignaturesRequest, xml.as_bytes()).unwrap();
        assert!(signatures.all.is_empty());
        assert_eq!(signatures.hash, None);
        assert_eq!(signatures.new_message, None);
    }
}
