//! CalDAV client implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use tracing::{debug, error, info};

use bk_core::CalendarConfig;

use crate::error::{CalendarError, Result};
use crate::models::CalendarEvent;
use crate::provider::CalendarProvider;

const ICAL_DATETIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// CalDAV client for calendar operations
pub struct CalDavClient {
    client: Client,
    config: CalendarConfig,
    base_url: String,
}

impl CalDavClient {
    /// Create a new CalDAV client
    pub fn new(config: CalendarConfig) -> Result<Self> {
        if config.server_url.is_empty() {
            return Err(CalendarError::Configuration(
                "CalDAV server URL is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| CalendarError::Configuration(e.to_string()))?;

        let base_url = config.server_url.trim_end_matches('/').to_string();

        info!("Calendar client initialized for: {}", base_url);

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn collection_url(&self) -> String {
        let collection = self
            .config
            .calendar_id
            .as_deref()
            .unwrap_or("bookings");
        format!("{}/{}", self.base_url, collection)
    }
}

#[async_trait]
impl CalendarProvider for CalDavClient {
    /// Fetch events within a time range using a calendar-query REPORT.
    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let url = self.collection_url();

        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<C:calendar-query xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <D:prop>
        <D:getetag/>
        <C:calendar-data/>
    </D:prop>
    <C:filter>
        <C:comp-filter name="VCALENDAR">
            <C:comp-filter name="VEVENT">
                <C:time-range start="{}" end="{}"/>
            </C:comp-filter>
        </C:comp-filter>
    </C:filter>
</C:calendar-query>"#,
            start.format(ICAL_DATETIME_FORMAT),
            end.format(ICAL_DATETIME_FORMAT)
        );

        debug!("Fetching events from: {}", url);

        let response = self
            .client
            .request(reqwest::Method::from_bytes(b"REPORT").unwrap(), &url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("Content-Type", "application/xml; charset=utf-8")
            .header("Depth", "1")
            .body(body)
            .send()
            .await
            .map_err(|e| CalendarError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("CalDAV query failed: {} - {}", status, error_text);
            return Err(CalendarError::Caldav(format!(
                "Query failed: {} - {}",
                status, error_text
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CalendarError::Http(e.to_string()))?;
        let events = parse_report_response(&text)?;

        info!("Fetched {} events", events.len());
        Ok(events)
    }

    /// Create an event with a conditional PUT.
    ///
    /// `If-None-Match: *` makes the write fail with 412 if the resource
    /// already exists, so the server stays the arbiter for concurrent
    /// writers racing on the same uid.
    async fn create_event(&self, event: CalendarEvent) -> Result<CalendarEvent> {
        let uid = event
            .uid
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let ical = event_to_ical(&event, &uid);
        let url = format!("{}/{}.ics", self.collection_url(), uid);

        debug!("Creating event: {}", event.summary);

        let response = self
            .client
            .put(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("Content-Type", "text/calendar; charset=utf-8")
            .header("If-None-Match", "*")
            .body(ical)
            .send()
            .await
            .map_err(|e| CalendarError::Connection(e.to_string()))?;

        if response.status() == reqwest::StatusCode::PRECONDITION_FAILED {
            return Err(CalendarError::Conflict(uid));
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Create event failed: {} - {}", status, error_text);
            return Err(CalendarError::Create(format!(
                "Failed to create event: {} - {}",
                status, error_text
            )));
        }

        info!("Created event: {}", uid);

        let mut created = event;
        created.uid = Some(uid);
        Ok(created)
    }
}

/// Extract events from a CalDAV multistatus REPORT response.
fn parse_report_response(response: &str) -> Result<Vec<CalendarEvent>> {
    let mut events = Vec::new();
    let mut reader = Reader::from_str(response);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut in_calendar_data = false;
    let mut calendar_data = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"calendar-data" => {
                in_calendar_data = true;
                calendar_data.clear();
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"calendar-data" => {
                in_calendar_data = false;
                if let Some(event) = parse_vevent(&calendar_data) {
                    events.push(event);
                }
            }
            Ok(Event::Text(ref e)) if in_calendar_data => {
                calendar_data.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CalendarError::XmlParse(e.to_string()));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(events)
}

/// Parse a VEVENT out of iCalendar text.
///
/// Returns None when the component lacks a usable DTSTART/DTEND pair;
/// such entries cannot block availability.
fn parse_vevent(ical: &str) -> Option<CalendarEvent> {
    let mut summary = String::new();
    let mut description = None;
    let mut start = None;
    let mut end = None;
    let mut uid = None;
    let mut attendees = Vec::new();

    for line in ical.lines() {
        let line = line.trim();
        if let Some(val) = line.strip_prefix("SUMMARY:") {
            summary = val.to_string();
        } else if let Some(val) = line.strip_prefix("DESCRIPTION:") {
            description = Some(val.to_string());
        } else if line.starts_with("DTSTART") {
            start = parse_ical_datetime(line);
        } else if line.starts_with("DTEND") {
            end = parse_ical_datetime(line);
        } else if let Some(val) = line.strip_prefix("UID:") {
            uid = Some(val.to_string());
        } else if let Some(rest) = line.strip_prefix("ATTENDEE") {
            if let Some(pos) = rest.rfind(':') {
                attendees.push(rest[pos + 1..].to_string());
            }
        }
    }

    Some(CalendarEvent {
        uid,
        summary,
        description,
        start: start?,
        end: end?,
        attendees,
    })
}

fn parse_ical_datetime(line: &str) -> Option<DateTime<Utc>> {
    let colon_pos = line.find(':')?;
    let date_str = &line[colon_pos + 1..];

    if date_str.contains('T') {
        // Date-time format: YYYYMMDDTHHMMSSZ
        chrono::NaiveDateTime::parse_from_str(date_str, "%Y%m%dT%H%M%SZ")
            .ok()
            .map(|dt| dt.and_utc())
    } else {
        // All-day value: YYYYMMDD, treated as starting at midnight UTC
        chrono::NaiveDate::parse_from_str(date_str, "%Y%m%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

fn event_to_ical(event: &CalendarEvent, uid: &str) -> String {
    let mut ical = String::new();

    ical.push_str("BEGIN:VCALENDAR\r\n");
    ical.push_str("VERSION:2.0\r\n");
    ical.push_str("PRODID:-//bk-gateway//booking//EN\r\n");
    ical.push_str("CALSCALE:GREGORIAN\r\n");
    ical.push_str("BEGIN:VEVENT\r\n");

    ical.push_str(&format!("UID:{}\r\n", uid));
    ical.push_str(&format!(
        "DTSTAMP:{}\r\n",
        Utc::now().format(ICAL_DATETIME_FORMAT)
    ));
    ical.push_str(&format!(
        "DTSTART:{}\r\n",
        event.start.format(ICAL_DATETIME_FORMAT)
    ));
    ical.push_str(&format!(
        "DTEND:{}\r\n",
        event.end.format(ICAL_DATETIME_FORMAT)
    ));
    ical.push_str(&format!("SUMMARY:{}\r\n", event.summary));

    if let Some(ref desc) = event.description {
        ical.push_str(&format!("DESCRIPTION:{}\r\n", desc.replace('\n', "\\n")));
    }

    for attendee in &event.attendees {
        ical.push_str(&format!("ATTENDEE:mailto:{}\r\n", attendee));
    }

    ical.push_str("END:VEVENT\r\n");
    ical.push_str("END:VCALENDAR\r\n");

    ical
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_ical_datetime_utc() {
        let dt = parse_ical_datetime("DTSTART:20250602T100000Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_ical_datetime_all_day() {
        let dt = parse_ical_datetime("DTSTART;VALUE=DATE:20250602").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_vevent() {
        let ical = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:abc-123\r\nSUMMARY:Kickoff\r\nDTSTART:20250602T100000Z\r\nDTEND:20250602T110000Z\r\nATTENDEE;CN=Client:mailto:client@example.com\r\nEND:VEVENT\r\nEND:VCALENDAR";
        let event = parse_vevent(ical).unwrap();
        assert_eq!(event.uid.as_deref(), Some("abc-123"));
        assert_eq!(event.summary, "Kickoff");
        assert_eq!(event.attendees, vec!["client@example.com"]);
        assert_eq!(
            event.end - event.start,
            chrono::Duration::hours(1)
        );
    }

    #[test]
    fn test_parse_vevent_without_times_is_skipped() {
        let ical = "BEGIN:VEVENT\r\nSUMMARY:No times\r\nEND:VEVENT";
        assert!(parse_vevent(ical).is_none());
    }

    #[test]
    fn test_parse_report_response() {
        let xml = r#"<?xml version="1.0"?>
<multistatus xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <response>
    <propstat>
      <prop>
        <calendar-data>BEGIN:VCALENDAR
BEGIN:VEVENT
UID:evt-1
SUMMARY:Busy
DTSTART:20250602T100000Z
DTEND:20250602T110000Z
END:VEVENT
END:VCALENDAR</calendar-data>
      </prop>
    </propstat>
  </response>
</multistatus>"#;
        let events = parse_report_response(xml).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Busy");
    }

    #[test]
    fn test_event_to_ical_round_trip_fields() {
        let event = CalendarEvent::new(
            "Booking: Ada",
            Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 2, 11, 0, 0).unwrap(),
        )
        .with_attendee("ada@example.com");

        let ical = event_to_ical(&event, "uid-1");
        assert!(ical.contains("UID:uid-1\r\n"));
        assert!(ical.contains("DTSTART:20250602T100000Z\r\n"));
        assert!(ical.contains("ATTENDEE:mailto:ada@example.com\r\n"));
    }
}
