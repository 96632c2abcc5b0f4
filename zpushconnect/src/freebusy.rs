//! Availability lookups through `ResolveRecipients` and their iCalendar
//! rendering.

use chrono::{DateTime, Duration, Utc};
use tracing::trace;
use zpushwbxml::Element;

use crate::activesync::{ActiveSyncRequest, ActiveSyncResponse, check_status};
use crate::error::{ConnectError, Result};
use crate::oof::format_date;

const COMMAND: &str = "ResolveRecipients";

/// Length of the period described by one free/busy digit.
pub const SLOT_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FreeBusyType {
    Free = 0,
    Tentative = 1,
    Busy = 2,
    OutOfOffice = 3,
    NoData = 4,
}

impl FreeBusyType {
    fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            b'0' => Some(FreeBusyType::Free),
            b'1' => Some(FreeBusyType::Tentative),
            b'2' => Some(FreeBusyType::Busy),
            b'3' => Some(FreeBusyType::OutOfOffice),
            b'4' => Some(FreeBusyType::NoData),
            _ => None,
        }
    }

    /// iCalendar `FBTYPE` value.
    pub fn fbtype(self) -> &'static str {
        match self {
            FreeBusyType::Free => "FREE",
            FreeBusyType::Tentative => "BUSY-TENTATIVE",
            FreeBusyType::Busy | FreeBusyType::NoData => "BUSY",
            FreeBusyType::OutOfOffice => "BUSY-UNAVAILABLE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBusyBlock {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: FreeBusyType,
}

/// `MergedFreeBusy` value: one digit per 30 minutes from `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedFreeBusy {
    start: DateTime<Utc>,
    value: String,
}

impl MergedFreeBusy {
    /// Fails unless `value` is a non-empty string of digits `0` to `4`.
    pub fn new(start: DateTime<Utc>, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() || !value.bytes().all(|b| FreeBusyType::from_digit(b).is_some()) {
            return Err(ConnectError::response(format!("invalid free/busy data {value:?}")));
        }
        Ok(MergedFreeBusy { start, value })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.slot_time(self.value.len())
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    fn slot_time(&self, slot: usize) -> DateTime<Utc> {
        self.start + Duration::minutes(SLOT_MINUTES * slot as i64)
    }

    /// State of the period containing `time`, if covered.
    pub fn at(&self, time: DateTime<Utc>) -> Option<FreeBusyType> {
        if time < self.start {
            return None;
        }
        let slot = (time - self.start).num_minutes() / SLOT_MINUTES;
        self.value
            .as_bytes()
            .get(usize::try_from(slot).ok()?)
            .and_then(|&b| FreeBusyType::from_digit(b))
    }

    /// Maximal runs of equal state, covering the whole period.
    pub fn blocks(&self) -> FreeBusyBlocks<'_> {
        FreeBusyBlocks {
            data: self,
            position: 0,
        }
    }
}

impl<'a> IntoIterator for &'a MergedFreeBusy {
    type Item = FreeBusyBlock;
    type IntoIter = FreeBusyBlocks<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks()
    }
}

pub struct FreeBusyBlocks<'a> {
    data: &'a MergedFreeBusy,
    position: usize,
}

impl Iterator for FreeBusyBlocks<'_> {
    type Item = FreeBusyBlock;

    fn next(&mut self) -> Option<FreeBusyBlock> {
        let bytes = self.data.value.as_bytes();
        let first = *bytes.get(self.position)?;
        let start = self.position;
        let run = bytes[start..].iter().take_while(|&&b| b == first).count();
        self.position += run;
        Some(FreeBusyBlock {
            start: self.data.slot_time(start),
            end: self.data.slot_time(self.position),
            kind: FreeBusyType::from_digit(first)?,
        })
    }
}

/// Availability of one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRecipientsRequest {
    pub recipient: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl ResolveRecipientsRequest {
    pub fn new(recipient: impl Into<String>, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        ResolveRecipientsRequest {
            recipient: recipient.into(),
            start,
            end,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRecipients {
    /// Absent when the server returned no availability data.
    pub free_busy: Option<MergedFreeBusy>,
}

impl ActiveSyncRequest for ResolveRecipientsRequest {
    type Response = ResolvedRecipients;

    fn command(&self) -> &'static str {
        COMMAND
    }

    fn body(&self) -> Element {
        let mut availability =
            Element::new("Availability").child(Element::with_text("StartTime", format_date(&self.start)));
        if let Some(end) = &self.end {
            availability.push(Element::with_text("EndTime", format_date(end)));
        }
        Element::new("ResolveRecipients")
            .child(Element::with_text("To", self.recipient.clone()))
            .child(
                Element::new("Options")
                    .child(Element::with_text("MaxAmbiguousRecipients", "1"))
                    .child(availability),
            )
    }

    fn parse_response(&self, response: &ActiveSyncResponse) -> Result<ResolvedRecipients> {
        let root = response.body(COMMAND)?;
        check_status(root)?;
        let merged = root.find_descendant("MergedFreeBusy").and_then(Element::text);
        trace!(recipient = %self.recipient, free_busy = ?merged, "Free/busy response");
        Ok(ResolvedRecipients {
            free_busy: merged
                .map(|value| MergedFreeBusy::new(self.start, value))
                .transpose()?,
        })
    }
}

/// Renders `data` as a `VFREEBUSY` calendar; free periods are omitted.
pub fn render_vfreebusy(
    organizer: &str,
    url: &str,
    stamp: DateTime<Utc>,
    data: &MergedFreeBusy,
) -> String {
    let mut out = String::new();
    let mut line = |text: &str| {
        out.push_str(text);
        out.push_str("\r\n");
    };
    line("BEGIN:VCALENDAR");
    line("PRODID:-//ZPush//EN");
    line("VERSION:2.0");
    line("BEGIN:VFREEBUSY");
    line(&format!("ORGANIZER:{organizer}"));
    line(&format!("URL:{url}"));
    line(&format!("DTSTAMP:{}", format_date(&stamp)));
    line(&format!("DTSTART:{}", format_date(&data.start())));
    line(&format!("DTEND:{}", format_date(&data.end())));
    for block in data.blocks().filter(|b| b.kind != FreeBusyType::Free) {
        line(&format!(
            "FREEBUSY;FBTYPE={}:{}/{}",
            block.kind.fbtype(),
            format_date(&block.start),
            format_date(&block.end)
        ));
    }
    line("END:VFREEBUSY");
    line("END:VCALENDAR");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap()
    }

    #[test]
    fn blocks_cover_the_whole_string() {
        let data = MergedFreeBusy::new(start(), "0022013").unwrap();
        let blocks: Vec<_> = data.blocks().map(|b| (b.start, b.end, b.kind)).collect();
        assert_eq!(
            blocks,
            vec![
                (at(8, 0), at(9, 0), FreeBusyType::Free),
                (at(9, 0), at(10, 0), FreeBusyType::Busy),
                (at(10, 0), at(10, 30), FreeBusyType::Free),
                (at(10, 30), at(11, 0), FreeBusyType::Tentative),
                (at(11, 0), at(11, 30), FreeBusyType::OutOfOffice),
            ]
        );
        assert_eq!(data.end(), at(11, 30));
        assert_eq!(data.at(at(9, 45)), Some(FreeBusyType::Busy));
        assert_eq!(data.at(at(11, 30)), None);
    }

    #[test]
    fn single_slot_is_one_block() {
        let data = MergedFreeBusy::new(start(), "2").unwrap();
        assert_eq!(data.blocks().count(), 1);
        assert_eq!((&data).into_iter().next().map(|b| b.end), Some(at(8, 30)));
    }

    #[test]
    fn invalid_digits_are_rejected() {
        assert!(MergedFreeBusy::new(start(), "0125").is_err());
        assert!(MergedFreeBusy::new(start(), "").is_err());
    }

    #[test]
    fn request_body_layout() {
        let request = ResolveRecipientsRequest::new("jane@example.com", start(), Some(at(18, 0)));
        let body = request.body();
        assert_eq!(
            body.find("ResolveRecipients/To").and_then(Element::text),
            Some("jane@example.com")
        );
        assert_eq!(
            body.find("ResolveRecipients/Options/MaxAmbiguousRecipients")
                .and_then(Element::text),
            Some("1")
        );
        assert_eq!(
            body.find("ResolveRecipients/Options/Availability/EndTime")
                .and_then(Element::text),
            Some("20240304T180000Z")
        );
        let open = ResolveRecipientsRequest::new("jane@example.com", start(), None).body();
        assert!(open.find("ResolveRecipients/Options/Availability/EndTime").is_none());
    }

    #[test]
    fn parses_merged_free_busy() {
        let xml = "<ResolveRecipients><Status>1</Status><Response><To>jane@example.com</To><Status>1</Status><RecipientCount>1</RecipientCount><Recipient><Type>1</Type><Availability><Status>1</Status><MergedFreeBusy>0220</MergedFreeBusy></Availability></Recipient></Response></ResolveRecipients>";
        let response = ActiveSyncResponse {
            status: 200,
            body: Some(Element::from_xml(xml).unwrap()),
            ..Default::default()
        };
        let request = ResolveRecipientsRequest::new("jane@example.com", start(), None);
        let resolved = request.parse_response(&response).unwrap();
        assert_eq!(resolved.free_busy.map(|f| f.as_str().to_string()), Some("0220".into()));

        let empty = ActiveSyncResponse {
            status: 200,
            body: Some(Element::from_xml("<ResolveRecipients><Status>1</Status></ResolveRecipients>").unwrap()),
            ..Default::default()
        };
        assert_eq!(request.parse_response(&empty).unwrap().free_busy, None);
    }

    #[test]
    fn vfreebusy_lists_busy_blocks() {
        let data = MergedFreeBusy::new(start(), "0124").unwrap();
        let ical = render_vfreebusy("jane@example.com", "http://127.0.0.1:8080/zpush/jane@example.com", at(7, 0), &data);
        let lines: Vec<&str> = ical.split("\r\n").collect();
        assert_eq!(lines[0], "BEGIN:VCALENDAR");
        assert!(lines.contains(&"DTSTART:20240304T080000Z"));
        assert!(lines.contains(&"DTEND:20240304T100000Z"));
        assert!(lines.contains(&"FREEBUSY;FBTYPE=BUSY-TENTATIVE:20240304T083000Z/20240304T090000Z"));
        assert!(lines.contains(&"FREEBUSY;FBTYPE=BUSY:20240304T090000Z/20240304T093000Z"));
        assert!(lines.contains(&"FREEBUSY;FBTYPE=BUSY:20240304T093000Z/20240304T100000Z"));
        assert!(!ical.contains("FBTYPE=FREE"));
        assert!(ical.ends_with("END:VCALENDAR\r\n"));
    }
}
